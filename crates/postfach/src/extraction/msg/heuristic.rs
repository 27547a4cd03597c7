//! Raw-text recovery for `.msg` buffers that could not be read structurally.

use crate::text::encoding::alpha_ratio;
use crate::types::EmailRecord;
use once_cell::sync::Lazy;
use regex::Regex;

pub const DEFAULT_SUBJECT: &str = "MSG File";
pub const UNKNOWN_SENDER: &str = "Unknown";

const MAX_BODY_LINES: usize = 50;
const MAX_READABLE_LINES: usize = 10;
const SUBJECT_CHARS: usize = 100;
const CONTENT_FALLBACK_CHARS: usize = 1000;

/// Prefixes that mark a line as header rather than body.
pub(super) const HEADER_PREFIXES: &[&str] = &["From:", "To:", "Subject:", "Date:", "Message-ID:"];

static SUBJECT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [r"(?i)Subject:\s*(.+?)[\r\n]", r"(?i)Subject[:\s]+([^\r\n]+)"]
        .iter()
        .map(|p| Regex::new(p).expect("Subject regex pattern is valid and should compile"))
        .collect()
});

static SENDER_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [r"(?i)From:\s*([^\r\n]+)", r"(?i)Sender:\s*([^\r\n]+)", r"<([^@]+@[^>]+)>"]
        .iter()
        .map(|p| Regex::new(p).expect("Sender regex pattern is valid and should compile"))
        .collect()
});

static RECIPIENT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [r"(?i)To:\s*([^\r\n]+)", r"(?i)Recipients?:\s*([^\r\n]+)"]
        .iter()
        .map(|p| Regex::new(p).expect("Recipient regex pattern is valid and should compile"))
        .collect()
});

static HEX_DUMP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-F0-9\s]+$").expect("Hex dump regex pattern is valid and should compile"));

/// Labelled values found by pattern matching over decoded text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScannedFields {
    pub subject: Option<String>,
    pub sender_email: Option<String>,
    pub sender_name: Option<String>,
    pub recipient: Option<String>,
    pub body: Option<String>,
}

fn first_capture(patterns: &[Regex], text: &str) -> Option<String> {
    patterns
        .iter()
        .find_map(|re| re.captures(text))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}

fn is_body_line(line: &str) -> bool {
    line.chars().count() > 20
        && !HEADER_PREFIXES.iter().any(|prefix| line.starts_with(prefix))
        && !HEX_DUMP.is_match(line)
        && alpha_ratio(line) > 0.5
}

/// Pattern scan: first matching pattern wins for each field.
pub fn scan(text: &str) -> ScannedFields {
    let mut fields = ScannedFields {
        subject: first_capture(&SUBJECT_PATTERNS, text),
        recipient: first_capture(&RECIPIENT_PATTERNS, text),
        ..Default::default()
    };

    if let Some(sender) = first_capture(&SENDER_PATTERNS, text) {
        if sender.contains('@') {
            fields.sender_email = Some(sender);
        } else {
            fields.sender_name = Some(sender);
        }
    }

    let body: Vec<&str> = text
        .split('\n')
        .map(str::trim)
        .filter(|line| is_body_line(line))
        .take(MAX_BODY_LINES)
        .collect();
    if !body.is_empty() {
        fields.body = Some(body.join("\n"));
    }

    fields
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Record built from decoded text alone.
///
/// With neither subject nor body found, the first readable lines stand in for
/// both. Missing fields take the `.msg` fallback defaults.
pub fn fallback_record(text: &str) -> EmailRecord {
    let mut fields = scan(text);

    if fields.subject.is_none() && fields.body.is_none() {
        let readable: Vec<&str> = text
            .split('\n')
            .map(str::trim)
            .filter(|line| line.chars().count() > 10 && alpha_ratio(line) > 0.3)
            .take(MAX_READABLE_LINES)
            .collect();
        if let Some(first) = readable.first() {
            fields.subject = Some(truncate_chars(first, SUBJECT_CHARS));
            fields.body = Some(readable.join("\n"));
        }
    }

    let mut record = EmailRecord {
        subject: fields.subject.unwrap_or_else(|| DEFAULT_SUBJECT.to_string()),
        sender: fields
            .sender_email
            .or(fields.sender_name)
            .unwrap_or_else(|| UNKNOWN_SENDER.to_string()),
        content: fields
            .body
            .unwrap_or_else(|| truncate_chars(text, CONTENT_FALLBACK_CHARS)),
        ..Default::default()
    };
    if let Some(recipient) = fields.recipient {
        record.recipient = recipient;
    }
    record
}
