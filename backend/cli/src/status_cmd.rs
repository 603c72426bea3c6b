//! CLI Status Command
//!
//! Asks a running server for `/api/health` and prints the report.

use anyhow::Result;
use serde_json::Value;

use crate::terminal_output::{note_error, note_success, render_pairs};

pub async fn run(base_url: &str) -> Result<()> {
    let url = format!("{}/api/health", base_url.trim_end_matches('/'));
    let response = match reqwest::get(&url).await {
        Ok(response) => response,
        Err(_) => {
            note_error(&format!("CodeDoc is not running at {base_url}"));
            return Ok(());
        }
    };

    let body: Value = response.json().await?;
    note_success(&format!("CodeDoc is running at {base_url}"));
    print!("{}", render_pairs(&health_rows(&body)));
    Ok(())
}

fn health_rows(body: &Value) -> Vec<(String, String)> {
    let Some(fields) = body.as_object() else {
        return Vec::new();
    };
    fields
        .iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (key.clone(), value)
        })
        .collect()
}
