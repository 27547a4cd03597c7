//! Removes pagination and whitespace noise from recovered text.

use once_cell::sync::Lazy;
use regex::Regex;

static BLANK_LINE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*\n").expect("Blank line regex pattern is valid and should compile"));
static DIGITS_ONLY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+$").expect("Digit line regex pattern is valid and should compile"));
static PAGE_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^page\s+\d+(?:\s*(?:of|/)\s*\d+)?$").expect("Page marker regex pattern is valid and should compile")
});

/// Lines with fewer characters than this are treated as noise.
pub const MIN_LINE_CHARS: usize = 4;

/// Normalize text recovered from PDFs and raw buffers.
///
/// Runs of blank lines collapse to one, every line is trimmed, and lines that
/// are empty, only digits, standalone page markers ("Page 3", "Page 3 of 9"),
/// or shorter than [`MIN_LINE_CHARS`] are dropped.
pub fn normalize_text(text: &str) -> String {
    let collapsed = BLANK_LINE_RUN.replace_all(text, "\n\n");

    collapsed
        .lines()
        .map(str::trim)
        .filter(|line| keep_line(line))
        .collect::<Vec<_>>()
        .join("\n")
}

fn keep_line(line: &str) -> bool {
    !line.is_empty()
        && line.chars().count() >= MIN_LINE_CHARS
        && !DIGITS_ONLY.is_match(line)
        && !PAGE_MARKER.is_match(line)
}
