//! `codedoc document`: document one local file with the configured provider
//! and print it as plain text or HTML.

use std::path::Path;

use anyhow::{Context, Result};
use codedoc_config::AppConfig;
use codedoc_core::SourceFile;
use codedoc_planner::{Documentation, LlmPlanner, ProviderRegistry};
use tracing::warn;

use crate::render_cmd;

pub async fn run(config: &AppConfig, file: &Path, prompt: Option<&str>, html: bool) -> Result<()> {
    let content = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let registry = ProviderRegistry::from_config(&config.provider);
    let planner = LlmPlanner::from_config(&registry, &config.provider)?;

    let source = SourceFile {
        path: file.to_path_buf(),
        relative_path: file.display().to_string(),
        content,
    };
    let reply = planner.document_file(&source, prompt, true).await?;
    let markdown = to_markdown(&source.relative_path, &reply);
    println!("{}", render_cmd::render(&markdown, !html));
    Ok(())
}

/// Structured reply to Markdown; a reply that is not the expected JSON is
/// printed as is.
fn to_markdown(title: &str, reply: &str) -> String {
    match Documentation::parse(reply) {
        Ok(docs) => {
            let body: Vec<String> = docs.iter().map(Documentation::to_markdown).collect();
            format!("# {title}\n\n{}", body.join("\n\n"))
        }
        Err(e) => {
            warn!(error = %e, "Reply is not structured documentation");
            reply.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_reply_becomes_markdown() {
        let md = to_markdown("add.js", r#"{"Description": "Adds two numbers."}"#);
        assert!(md.starts_with("# add.js\n\n"));
        assert!(md.contains("Adds two numbers."));
    }

    #[test]
    fn test_free_text_reply_passes_through() {
        assert_eq!(to_markdown("x", "just prose"), "just prose");
    }

    #[tokio::test]
    async fn test_documents_with_mock_provider() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("add.js");
        tokio::fs::write(&file, "const add = (a, b) => a + b;").await.unwrap();

        let mut config = AppConfig::default();
        config.provider.active = "mock".into();
        assert!(run(&config, &file, None, false).await.is_ok());
    }
}
