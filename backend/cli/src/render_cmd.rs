//! `codedoc render`: Markdown file to HTML or plain text.

use std::path::Path;

use anyhow::{Context, Result};
use codedoc_markdown::{CodeBlockAnalyzer, MarkdownScanner, Renderer};

pub async fn run(file: &Path, plain: bool) -> Result<()> {
    let markdown = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    println!("{}", render(&markdown, plain));
    Ok(())
}

pub fn render(markdown: &str, plain: bool) -> String {
    let nodes = MarkdownScanner::scan(markdown);
    let charts = CodeBlockAnalyzer::mermaid_charts(&nodes);
    if !charts.is_empty() {
        tracing::debug!(charts = charts.len(), "Mermaid charts found");
    }
    if plain {
        Renderer::to_plain_text(&nodes)
    } else {
        Renderer::to_html(&nodes)
    }
}
