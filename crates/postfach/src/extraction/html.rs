//! HTML email bodies and attachments to plain text.

use once_cell::sync::Lazy;
use regex::Regex;

static SCRIPT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<script[^>]*>.*?</script>").expect("Script regex pattern is valid and should compile")
});
static STYLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<style[^>]*>.*?</style>").expect("Style regex pattern is valid and should compile"));
static BLOCK_BREAK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<\s*(?:br\s*/?|/p|/div|/tr|/li|/h[1-6])\s*>")
        .expect("Block break regex pattern is valid and should compile")
});
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("Tag regex pattern is valid and should compile"));
static INLINE_WS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t\f]+").expect("Whitespace regex pattern is valid and should compile"));
static BLANK_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*\n+").expect("Blank line regex pattern is valid and should compile"));

/// Readable text of an HTML document.
///
/// Uses `html-to-markdown-rs` when the `email` feature is on and falls back
/// to tag stripping when conversion fails or the feature is off.
pub fn html_to_text(html: &str) -> String {
    if html.trim().is_empty() {
        return String::new();
    }

    #[cfg(feature = "email")]
    {
        let without_script = SCRIPT.replace_all(html, "");
        let cleaned = STYLE.replace_all(&without_script, "");
        match html_to_markdown_rs::convert(&cleaned, None) {
            Ok(text) => return text.trim().to_string(),
            Err(e) => tracing::debug!(error = %e, "HTML conversion failed, stripping tags instead"),
        }
    }

    strip_tags(html)
}

/// Regex tag stripper: drops scripts and styles, keeps block boundaries as newlines.
pub fn strip_tags(html: &str) -> String {
    let text = SCRIPT.replace_all(html, "");
    let text = STYLE.replace_all(&text, "");
    let text = BLOCK_BREAK.replace_all(&text, "\n");
    let text = TAG.replace_all(&text, "");
    let text = decode_entities(&text);
    let text = INLINE_WS.replace_all(&text, " ");
    let text: Vec<&str> = text.lines().map(str::trim).collect();
    BLANK_RUN.replace_all(&text.join("\n"), "\n\n").trim().to_string()
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_tags_drops_script_and_style() {
        let html = "<html><head><style>p { color: red; }</style><script>alert(1)</script></head>\
                    <body><p>Hello&nbsp;there</p><p>Second &amp; last</p></body></html>";
        let text = strip_tags(html);
        assert_eq!(text, "Hello there\nSecond & last");
    }

    #[test]
    fn test_strip_tags_line_breaks() {
        assert_eq!(strip_tags("one<br>two<br/>three"), "one\ntwo\nthree");
    }

    #[test]
    fn test_html_to_text_keeps_words() {
        let text = html_to_text("<div><h1>Quarterly report</h1><p>Revenue is <b>up</b>.</p></div>");
        assert!(text.contains("Quarterly report"));
        assert!(text.contains("Revenue is"));
        assert!(text.contains("up"));
        assert!(!text.contains("<p>"));
    }

    #[test]
    fn test_empty_html() {
        assert_eq!(html_to_text("   "), "");
    }
}
