//! Inline formatting for paragraph text.

use std::sync::LazyLock;

use regex::Regex;

static ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^&(?:[a-zA-Z][a-zA-Z0-9]*|#[0-9]+|#[xX][0-9a-fA-F]+);").unwrap());
static CODE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`([^`]+)`").unwrap());
static BOLD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").unwrap());
static ITALIC_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*(.*?)\*|_(.*?)_").unwrap());
static IMAGE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"!\[(.*?)\]\((.*?)\)").unwrap());
static LINK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[(.*?)\]\((.*?)\)").unwrap());
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());

/// Escapes HTML metacharacters.
///
/// An `&` that already opens a character entity is kept as is, so text that
/// went through this function once comes out unchanged the second time.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for (idx, ch) in input.char_indices() {
        match ch {
            '&' if ENTITY_RE.is_match(&input[idx..]) => out.push('&'),
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escapes text for insertion as an HTML text node. Every `&` is escaped.
pub fn escape_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Applies inline substitutions to already-escaped text, in order:
/// code spans, bold, italic, images, links.
pub fn format_inline(escaped: &str) -> String {
    let html = CODE_RE.replace_all(escaped, "<code>${1}</code>");
    let html = BOLD_RE.replace_all(&html, "<strong>${1}</strong>");
    let html = ITALIC_RE.replace_all(&html, "<em>${1}${2}</em>");
    let html = IMAGE_RE.replace_all(&html, r#"<img src="${2}" alt="${1}" />"#);
    let html = LINK_RE.replace_all(&html, r#"<a href="${2}">${1}</a>"#);
    html.into_owned()
}

/// Drops tags and decodes the entities `escape_html` produces.
pub fn strip_tags(html: &str) -> String {
    TAG_RE
        .replace_all(html, "")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_escape_html_is_idempotent() {
        let once = escape_html("if a < b && c > d { \"ok\" }");
        assert_eq!(escape_html(&once), once);
    }

    #[test]
    fn test_escape_html_keeps_existing_entities() {
        assert_eq!(escape_html("&copy; &#169; &#xA9; & done"), "&copy; &#169; &#xA9; &amp; done");
    }

    #[test]
    fn test_escape_text_escapes_every_ampersand() {
        assert_eq!(escape_text("&amp;"), "&amp;amp;");
    }

    #[test]
    fn test_code_span() {
        assert_eq!(format_inline("run `cargo test` now"), "run <code>cargo test</code> now");
    }

    #[test]
    fn test_bold_then_italic() {
        assert_eq!(
            format_inline("**bold** and *soft* and _under_"),
            "<strong>bold</strong> and <em>soft</em> and <em>under</em>"
        );
    }

    #[test]
    fn test_image_and_link() {
        assert_eq!(
            format_inline("see ![logo](logo.png) or [docs](https://example.com)"),
            r#"see <img src="logo.png" alt="logo" /> or <a href="https://example.com">docs</a>"#
        );
    }

    #[test]
    fn test_escaped_quotes_cannot_break_attributes() {
        let html = format_inline(&escape_html(r#"[x](" onclick="alert(1))"#));
        assert!(!html.contains(r#"" onclick=""#));
    }

    #[test]
    fn test_strip_tags() {
        assert_eq!(strip_tags("<strong>a &lt; b</strong> &amp; c"), "a < b & c");
    }
}
