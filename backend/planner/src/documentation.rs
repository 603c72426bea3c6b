//! Structured single-file documentation returned by the model.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use codedoc_markdown::CodeBlockAnalyzer;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Documentation {
    #[serde(rename = "Description", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "Functions", default)]
    pub functions: Vec<FunctionDoc>,
    #[serde(rename = "Queries", default)]
    pub queries: Vec<String>,
    #[serde(rename = "Dependencies", default)]
    pub dependencies: Vec<DependencyDoc>,
    #[serde(rename = "Improvements", default)]
    pub improvements: Vec<ImprovementDoc>,
    #[serde(rename = "Flowchart", default)]
    pub flowcharts: Vec<ChartDoc>,
    #[serde(rename = "ER Diagram", default)]
    pub er_diagrams: Vec<ChartDoc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FunctionDoc {
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Purpose", default)]
    pub purpose: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DependencyDoc {
    #[serde(rename = "Module", default)]
    pub module: String,
    #[serde(rename = "Purpose", default)]
    pub purpose: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ImprovementDoc {
    #[serde(rename = "Improvement", default)]
    pub improvement: String,
    #[serde(rename = "Details", default)]
    pub details: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChartDoc {
    #[serde(rename = "Heading", default)]
    pub heading: String,
    #[serde(rename = "Chart", default)]
    pub chart: String,
}

impl Documentation {
    /// Parse a model reply. Accepts one object or an array of objects, with or
    /// without ```` ```json ```` fences.
    pub fn parse(text: &str) -> Result<Vec<Documentation>> {
        let raw = CodeBlockAnalyzer::strip_fences(text, &["json"]);
        let value: Value = serde_json::from_str(&raw).context("Documentation is not valid JSON")?;
        match value {
            Value::Array(items) => items
                .into_iter()
                .map(|item| serde_json::from_value(item).context("Unexpected documentation entry"))
                .collect(),
            other => Ok(vec![
                serde_json::from_value(other).context("Unexpected documentation object")?
            ]),
        }
    }

    /// Markdown restricted to the constructs the line scanner understands.
    pub fn to_markdown(&self) -> String {
        let mut sections: Vec<String> = Vec::new();

        if let Some(description) = self.description.as_deref().filter(|d| !d.trim().is_empty()) {
            sections.push(format!("## Description\n\n{}", single_line(description)));
        }

        if !self.functions.is_empty() {
            let rows: Vec<[&str; 2]> = self
                .functions
                .iter()
                .map(|f| [f.name.as_str(), f.purpose.as_str()])
                .collect();
            sections.push(format!("## Functions\n\n{}", table(["Name", "Purpose"], &rows)));
        }

        if !self.queries.is_empty() {
            let blocks: Vec<String> = self
                .queries
                .iter()
                .map(|q| format!("```sql\n{}\n```", CodeBlockAnalyzer::strip_fences(q, &["sql"])))
                .collect();
            sections.push(format!("## Queries\n\n{}", blocks.join("\n\n")));
        }

        if !self.dependencies.is_empty() {
            let rows: Vec<[&str; 2]> = self
                .dependencies
                .iter()
                .map(|d| [d.module.as_str(), d.purpose.as_str()])
                .collect();
            sections.push(format!("## Dependencies\n\n{}", table(["Module", "Purpose"], &rows)));
        }

        if !self.improvements.is_empty() {
            let items: Vec<String> = self
                .improvements
                .iter()
                .map(|i| format!("- **{}**: {}", single_line(&i.improvement), single_line(&i.details)))
                .collect();
            sections.push(format!("## Improvements\n\n{}", items.join("\n")));
        }

        for (title, charts) in [("Flowchart", &self.flowcharts), ("ER Diagram", &self.er_diagrams)] {
            let charts: Vec<String> = charts
                .iter()
                .filter(|c| !c.chart.trim().is_empty())
                .map(|c| {
                    format!(
                        "### {}\n\n```mermaid\n{}\n```",
                        single_line(&c.heading),
                        CodeBlockAnalyzer::clean_mermaid_chart(&c.chart)
                    )
                })
                .collect();
            if !charts.is_empty() {
                sections.push(format!("## {title}\n\n{}", charts.join("\n\n")));
            }
        }

        sections.join("\n\n")
    }
}

fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

// Cells cannot hold `|`: every such line is a table row to the scanner.
// Empty cells are dropped by the scanner, so they get a `-`.
fn cell(text: &str) -> String {
    let text = single_line(text).replace('|', "/");
    if text.is_empty() {
        "-".to_string()
    } else {
        text
    }
}

fn table(header: [&str; 2], rows: &[[&str; 2]]) -> String {
    let mut lines = vec![
        format!("| {} | {} |", header[0], header[1]),
        "| --- | --- |".to_string(),
    ];
    lines.extend(rows.iter().map(|[a, b]| format!("| {} | {} |", cell(a), cell(b))));
    lines.join("\n")
}
