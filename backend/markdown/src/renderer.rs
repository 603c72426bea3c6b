//! Renderers for scanned Markdown
//!
//! Turns render instructions into HTML for the browser or plain text for the
//! terminal.

use crate::inline::{escape_text, strip_tags};
use crate::ir::RenderInstruction;

pub struct Renderer;

impl Renderer {
    /// Renders instructions to an HTML fragment, one element per line.
    ///
    /// Paragraphs already carry escaped markup and are inserted as is. Every
    /// other instruction holds raw text, which is escaped here as a text node.
    pub fn to_html(instructions: &[RenderInstruction]) -> String {
        let mut blocks = Vec::with_capacity(instructions.len());
        for instruction in instructions {
            let block = match instruction {
                RenderInstruction::Heading { level, text } => {
                    format!("<h{level}>{}</h{level}>", escape_text(text))
                }
                RenderInstruction::Table { header, rows } => table_html(header.as_deref(), rows),
                RenderInstruction::CodeBlock { language, code } => {
                    if language.is_empty() {
                        format!("<pre><code>{}</code></pre>", escape_text(code))
                    } else {
                        format!(
                            "<pre><code class=\"language-{}\">{}</code></pre>",
                            escape_text(language),
                            escape_text(code)
                        )
                    }
                }
                RenderInstruction::MermaidBlock { chart } => {
                    format!("<div class=\"mermaid\">{}</div>", escape_text(chart))
                }
                RenderInstruction::Blockquote { text } => {
                    format!("<blockquote>{}</blockquote>", escape_text(text))
                }
                RenderInstruction::List { ordered, items } => {
                    let tag = if *ordered { "ol" } else { "ul" };
                    let items: String = items
                        .iter()
                        .map(|item| format!("<li>{}</li>", escape_text(item)))
                        .collect();
                    format!("<{tag}>{items}</{tag}>")
                }
                RenderInstruction::HorizontalRule => "<hr />".to_string(),
                RenderInstruction::Paragraph { html } => format!("<p>{html}</p>"),
            };
            blocks.push(block);
        }
        blocks.join("\n")
    }

    /// Renders instructions to plain text, stripping all formatting.
    pub fn to_plain_text(instructions: &[RenderInstruction]) -> String {
        let mut output = String::new();
        for instruction in instructions {
            match instruction {
                RenderInstruction::Heading { text, .. } => {
                    output.push_str(text);
                    output.push('\n');
                }
                RenderInstruction::Table { header, rows } => {
                    for row in header.iter().chain(rows.iter()) {
                        output.push_str(&row.join(" | "));
                        output.push('\n');
                    }
                }
                RenderInstruction::CodeBlock { code, .. } => {
                    output.push_str(code);
                    output.push('\n');
                }
                RenderInstruction::MermaidBlock { chart } => {
                    output.push_str("Diagram:\n");
                    output.push_str(chart);
                    output.push('\n');
                }
                RenderInstruction::Blockquote { text } => {
                    output.push_str("> ");
                    output.push_str(text);
                    output.push('\n');
                }
                RenderInstruction::List { ordered, items } => {
                    for (idx, item) in items.iter().enumerate() {
                        if *ordered {
                            output.push_str(&format!("{}. {}\n", idx + 1, item));
                        } else {
                            output.push_str(&format!("- {}\n", item));
                        }
                    }
                }
                RenderInstruction::HorizontalRule => output.push_str("---\n"),
                RenderInstruction::Paragraph { html } => {
                    output.push_str(&strip_tags(html));
                    output.push('\n');
                }
            }
        }
        output
    }
}

fn table_html(header: Option<&[String]>, rows: &[Vec<String>]) -> String {
    let mut html = String::from("<table>");
    if let Some(header) = header {
        html.push_str("<thead><tr>");
        for cell in header {
            html.push_str(&format!("<th>{}</th>", escape_text(cell)));
        }
        html.push_str("</tr></thead>");
    }
    html.push_str("<tbody>");
    for row in rows {
        html.push_str("<tr>");
        for cell in row {
            html.push_str(&format!("<td>{}</td>", escape_text(cell)));
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table>");
    html
}
