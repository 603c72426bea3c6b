//! Markdown Line Scanner
//!
//! A single forward pass over the input lines. Each line is dispatched on its
//! leading pattern; multi-line constructs (tables, fenced blocks, lists)
//! consume every line they own before the cursor moves on. Nothing here can
//! fail: a line that matches no construct becomes a paragraph.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::inline;

static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#{1,6}\s").unwrap());
static HEADING_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#+\s").unwrap());
static TABLE_SEPARATOR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[-| ]+$").unwrap());
static BLOCKQUOTE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^>\s").unwrap());
static UNORDERED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[-*+]\s").unwrap());
static ORDERED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]+\.\s").unwrap());
static RULE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^---$|^\*\*\*$").unwrap());

const FENCE: &str = "```";
const MERMAID_FENCE: &str = "```mermaid";

/// Wrappers a caller may put around the whole document.
const WRAPPER_OPENERS: [&str; 4] = ["```text\n", "```markdown\n", "```text\r\n", "```markdown\r\n"];
const WRAPPER_CLOSER: &str = "\n```";

/// One structural element, ready for display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RenderInstruction {
    Heading { level: u8, text: String },
    Table { header: Option<Vec<String>>, rows: Vec<Vec<String>> },
    CodeBlock { language: String, code: String },
    MermaidBlock { chart: String },
    Blockquote { text: String },
    List { ordered: bool, items: Vec<String> },
    HorizontalRule,
    /// Escaped, inline-formatted HTML.
    Paragraph { html: String },
}

pub struct MarkdownScanner;

impl MarkdownScanner {
    /// Scans `markdown` into render instructions, in source order.
    pub fn scan(markdown: &str) -> Vec<RenderInstruction> {
        let body = strip_wrapper(markdown);
        let lines: Vec<&str> = body
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .collect();

        let mut cursor = LineCursor { lines: &lines, pos: 0 };
        let mut out = Vec::new();

        while let Some(line) = cursor.peek() {
            let instruction = if HEADING_RE.is_match(line) {
                cursor.advance();
                heading(line)
            } else if line.contains('|') {
                cursor.table()
            } else if line == MERMAID_FENCE {
                cursor.advance();
                RenderInstruction::MermaidBlock {
                    chart: cursor.fenced_body(),
                }
            } else if let Some(language) = line.strip_prefix(FENCE) {
                cursor.advance();
                RenderInstruction::CodeBlock {
                    language: language.trim().to_string(),
                    code: cursor.fenced_body(),
                }
            } else if BLOCKQUOTE_RE.is_match(line) {
                cursor.advance();
                RenderInstruction::Blockquote {
                    text: BLOCKQUOTE_RE.replace(line, "").into_owned(),
                }
            } else if UNORDERED_RE.is_match(line) {
                RenderInstruction::List {
                    ordered: false,
                    items: cursor.list_items(&UNORDERED_RE),
                }
            } else if ORDERED_RE.is_match(line) {
                RenderInstruction::List {
                    ordered: true,
                    items: cursor.list_items(&ORDERED_RE),
                }
            } else if RULE_RE.is_match(line) {
                cursor.advance();
                RenderInstruction::HorizontalRule
            } else {
                cursor.advance();
                RenderInstruction::Paragraph {
                    html: inline::format_inline(&inline::escape_html(line)),
                }
            };
            out.push(instruction);
        }

        trace!(lines = lines.len(), instructions = out.len(), "Scanned markdown");
        out
    }
}

/// Forward-only cursor over the line buffer.
struct LineCursor<'a> {
    lines: &'a [&'a str],
    pos: usize,
}

impl<'a> LineCursor<'a> {
    fn peek(&self) -> Option<&'a str> {
        self.lines.get(self.pos).copied()
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    /// Consumes contiguous `|` lines. The first row is the header when the
    /// line right after it is a dash/pipe separator, which is skipped.
    fn table(&mut self) -> RenderInstruction {
        let mut header = None;
        let mut rows = Vec::new();
        let mut first = true;

        while let Some(line) = self.peek().filter(|l| l.contains('|')) {
            let cells = split_cells(line);
            let next_is_separator = self
                .lines
                .get(self.pos + 1)
                .is_some_and(|next| TABLE_SEPARATOR_RE.is_match(next));

            if first && next_is_separator {
                header = Some(cells);
                self.pos += 2;
            } else {
                rows.push(cells);
                self.pos += 1;
            }
            first = false;
        }

        RenderInstruction::Table { header, rows }
    }

    /// Collects lines up to a bare closing fence, consuming the fence.
    /// Without a closing fence the block runs to end of input.
    fn fenced_body(&mut self) -> String {
        let mut body = Vec::new();
        while let Some(line) = self.peek() {
            self.advance();
            if line == FENCE {
                break;
            }
            body.push(line);
        }
        body.join("\n")
    }

    fn list_items(&mut self, marker: &Regex) -> Vec<String> {
        let mut items = Vec::new();
        while let Some(line) = self.peek().filter(|l| marker.is_match(l)) {
            items.push(marker.replace(line, "").into_owned());
            self.advance();
        }
        items
    }
}

fn heading(line: &str) -> RenderInstruction {
    let level = line.chars().take_while(|c| *c == '#').count() as u8;
    RenderInstruction::Heading {
        level,
        text: HEADING_PREFIX_RE.replace(line, "").into_owned(),
    }
}

/// Splits a table row on `|`, trimming cells and dropping empty ones.
fn split_cells(line: &str) -> Vec<String> {
    line.split('|')
        .map(str::trim)
        .filter(|cell| !cell.is_empty())
        .map(str::to_string)
        .collect()
}

fn strip_wrapper(input: &str) -> &str {
    let mut body = input;
    if let Some(rest) = WRAPPER_OPENERS.iter().find_map(|o| body.strip_prefix(o)) {
        body = rest;
    }
    body.strip_suffix(WRAPPER_CLOSER).unwrap_or(body)
}
