//! Fenced block utilities
//!
//! Pulls diagram blocks out of scanned output and removes fence
//! markers from model replies that are meant to be raw SQL or JSON.

use crate::ir::RenderInstruction;

const FENCE: &str = "```";

pub struct CodeBlockAnalyzer;

impl CodeBlockAnalyzer {
    /// Extracts the source of every mermaid diagram.
    pub fn mermaid_charts(nodes: &[RenderInstruction]) -> Vec<String> {
        nodes
            .iter()
            .filter_map(|node| match node {
                RenderInstruction::MermaidBlock { chart } => Some(chart.clone()),
                _ => None,
            })
            .collect()
    }

    /// Removes every ```` ```tag ```` and bare ```` ``` ```` marker, then trims.
    ///
    /// `strip_fences("```sql\nSELECT 1\n```", &["sql"])` gives `SELECT 1`.
    pub fn strip_fences(text: &str, tags: &[&str]) -> String {
        let mut out = text.to_string();
        for tag in tags {
            out = out.replace(&format!("{FENCE}{tag}"), "");
        }
        out.replace(FENCE, "").trim().to_string()
    }

    /// Normalizes a diagram that a model returned with its own fence markers.
    pub fn clean_mermaid_chart(chart: &str) -> String {
        chart
            .replace("```mermaid\n", "")
            .replace("\n```", "")
            .replace("mermaid\n", "")
            .trim()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::MarkdownScanner;

    #[test]
    fn test_mermaid_charts_skip_code_blocks() {
        let nodes = MarkdownScanner::scan("```sql\nSELECT 1\n```\ntext\n```mermaid\ngraph LR\n```");
        assert_eq!(CodeBlockAnalyzer::mermaid_charts(&nodes), vec!["graph LR".to_string()]);
    }

    #[test]
    fn test_strip_sql_fences() {
        assert_eq!(
            CodeBlockAnalyzer::strip_fences("```sql\nSELECT * FROM users;\n```\n", &["sql"]),
            "SELECT * FROM users;"
        );
        assert_eq!(CodeBlockAnalyzer::strip_fences("  SELECT 1 ", &["sql"]), "SELECT 1");
    }

    #[test]
    fn test_strip_json_fences() {
        assert_eq!(
            CodeBlockAnalyzer::strip_fences("```json\n{\"a\": 1}\n```", &["json"]),
            "{\"a\": 1}"
        );
    }

    #[test]
    fn test_clean_mermaid_chart() {
        assert_eq!(
            CodeBlockAnalyzer::clean_mermaid_chart("```mermaid\ngraph TD\nA-->B\n```"),
            "graph TD\nA-->B"
        );
        assert_eq!(CodeBlockAnalyzer::clean_mermaid_chart("mermaid\nerDiagram"), "erDiagram");
    }
}
