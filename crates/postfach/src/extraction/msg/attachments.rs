//! Attachment detection over the decoded text of a `.msg` buffer.
//!
//! Works on whatever text the buffer yields, whichever tier produced the
//! record: filename-like tokens become attachment names, and runs of
//! prose-like lines become candidate attachment content.

use crate::text::encoding::alpha_ratio;
use indexmap::{IndexMap, IndexSet};
use once_cell::sync::Lazy;
use regex::Regex;

/// Key used for detected content when no filename was found.
pub const DETECTED_CONTENT_KEY: &str = "detected_content.txt";

const RUN_MIN_LINES: usize = 5;
const RUN_MIN_CHARS: usize = 100;
const CONTENT_MAX_CHARS: usize = 1000;
const RUN_HEADER_PREFIXES: &[&str] = &["From:", "To:", "Subject:", "Date:"];

static FILENAME_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)([a-zA-Z0-9_\-\.]+\.(?:pdf|txt|docx|doc|html|htm|rtf))",
        r#"(?i)filename["\s]*=["']\s*([^"']+)"#,
        r#"(?i)name["\s]*=["']\s*([^"']+)"#,
    ]
    .iter()
    .map(|p| Regex::new(p).expect("Filename regex pattern is valid and should compile"))
    .collect()
});

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectedAttachments {
    /// Unique names in order of first appearance.
    pub filenames: Vec<String>,
    pub contents: IndexMap<String, String>,
}

impl DetectedAttachments {
    pub fn is_empty(&self) -> bool {
        self.filenames.is_empty() && self.contents.is_empty()
    }
}

pub fn detect(text: &str) -> DetectedAttachments {
    let filenames = detect_filenames(text);
    let key = filenames.first().map(String::as_str).unwrap_or(DETECTED_CONTENT_KEY);

    let runs = content_runs(text);
    let mut contents = IndexMap::new();
    if !runs.is_empty() {
        let joined: String = runs.join("\n").chars().take(CONTENT_MAX_CHARS).collect();
        contents.insert(key.to_string(), joined);
    }

    DetectedAttachments { filenames, contents }
}

fn detect_filenames(text: &str) -> Vec<String> {
    let mut found: IndexSet<String> = IndexSet::new();
    for pattern in FILENAME_PATTERNS.iter() {
        for caps in pattern.captures_iter(text) {
            if let Some(name) = caps.get(1) {
                let name = name.as_str().trim();
                if name.contains('.') && name.chars().count() > 3 {
                    found.insert(name.to_string());
                }
            }
        }
    }
    found.into_iter().collect()
}

fn is_run_line(line: &str) -> bool {
    line.chars().count() > 20
        && !RUN_HEADER_PREFIXES.iter().any(|prefix| line.starts_with(prefix))
        && alpha_ratio(line) > 0.6
}

/// Contiguous runs of prose-like lines, emitted every `RUN_MIN_LINES` lines
/// when they carry enough text.
fn content_runs(text: &str) -> Vec<String> {
    let mut runs = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.split('\n').map(str::trim) {
        if !is_run_line(line) {
            current.clear();
            continue;
        }
        current.push(line);
        if current.len() >= RUN_MIN_LINES {
            let joined = current.join("\n");
            if joined.chars().count() > RUN_MIN_CHARS {
                runs.push(joined);
            }
            current.clear();
        }
    }
    runs
}
