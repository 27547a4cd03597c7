//! Splits normalized text into individual messages and reads their headers.
//!
//! Separators are tried from most to least specific. The first one that cuts
//! the text into at least two non-empty segments wins and no other separator
//! is consulted. Every segment after the first starts with the separator text
//! that produced it, so quoted headers stay attached to their message.

use crate::types::EmailRecord;
use once_cell::sync::Lazy;
use regex::Regex;

/// A named separator heuristic.
pub struct Separator {
    pub name: &'static str,
    regex: Regex,
    /// Pull header lines sitting directly above the match into the new segment.
    absorbs_headers: bool,
}

static SEPARATORS: Lazy<Vec<Separator>> = Lazy::new(|| {
    vec![
        Separator {
            name: "sender_header",
            regex: Regex::new(r"(?im)^[ \t>]*From:.*?@.*$").expect("Sender header regex pattern is valid and should compile"),
            absorbs_headers: true,
        },
        Separator {
            name: "original_message",
            regex: Regex::new(r"(?i)-----Original Message-----")
                .expect("Original message regex pattern is valid and should compile"),
            absorbs_headers: false,
        },
        Separator {
            name: "divider",
            regex: Regex::new(r"_{32,}").expect("Divider regex pattern is valid and should compile"),
            absorbs_headers: false,
        },
        Separator {
            name: "reply_attribution",
            regex: Regex::new(r"(?i)\bOn\b.*wrote:").expect("Reply attribution regex pattern is valid and should compile"),
            absorbs_headers: false,
        },
        Separator {
            name: "forwarded",
            regex: Regex::new(r"(?i)Begin forwarded message:").expect("Forwarded regex pattern is valid and should compile"),
            absorbs_headers: false,
        },
    ]
});

static HEADER_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[ \t>]*(?:subject|to|cc|bcc|date|sent|received)\s*:")
        .expect("Header line regex pattern is valid and should compile")
});

/// Labels checked against each lowercased line, in priority order.
const FIELD_LABELS: &[(Field, &[&str])] = &[
    (Field::Subject, &["subject:"]),
    (Field::From, &["from:"]),
    (Field::To, &["to:"]),
    (Field::Date, &["date:", "sent:", "received:"]),
    (Field::Cc, &["cc:"]),
    (Field::MessageId, &["message-id:"]),
];

#[derive(Clone, Copy)]
enum Field {
    Subject,
    From,
    To,
    Date,
    Cc,
    MessageId,
}

/// Separator names in the order they are tried.
pub fn separator_names() -> Vec<&'static str> {
    SEPARATORS.iter().map(|s| s.name).collect()
}

/// Segments of `text`, one per logical message.
///
/// Returns the whole (trimmed) text as a single segment when no separator
/// produces two or more segments, and nothing for blank input.
pub fn split_threads(text: &str) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    for separator in SEPARATORS.iter() {
        let segments = split_with(text, separator);
        if segments.len() >= 2 {
            tracing::debug!(separator = separator.name, segments = segments.len(), "Split email thread");
            return segments;
        }
    }

    vec![text.trim().to_string()]
}

fn split_with(text: &str, separator: &Separator) -> Vec<String> {
    let mut starts: Vec<usize> = Vec::new();
    let mut floor = 0;

    for found in separator.regex.find_iter(text) {
        let mut start = found.start();
        if separator.absorbs_headers {
            start = header_block_start(text, start, floor, starts.is_empty());
        }
        if starts.last().is_none_or(|&last| start > last) {
            starts.push(start);
        }
        floor = line_end(text, found.end());
    }

    if starts.is_empty() {
        return Vec::new();
    }

    let mut cuts = Vec::with_capacity(starts.len() + 2);
    cuts.push(0);
    cuts.extend(starts.iter().copied().filter(|&s| s > 0));
    cuts.push(text.len());

    cuts.windows(2)
        .map(|w| text[w[0]..w[1]].trim())
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

/// Start of the header block that ends at `pos`.
///
/// Walks upward over header-looking lines without crossing `floor`. For any
/// match but the first, a walk that reaches `floor` means those lines belong
/// to the previous message's header block, so nothing is absorbed.
fn header_block_start(text: &str, pos: usize, floor: usize, first_match: bool) -> usize {
    let mut start = pos;
    while start > floor {
        let prev_end = start - 1;
        let prev_start = text[..prev_end].rfind('\n').map(|i| i + 1).unwrap_or(0);
        if prev_start < floor || !HEADER_LINE.is_match(&text[prev_start..prev_end]) {
            return start;
        }
        start = prev_start;
    }
    if first_match { start } else { pos }
}

fn line_end(text: &str, pos: usize) -> usize {
    text[pos..].find('\n').map(|i| pos + i + 1).unwrap_or(text.len())
}

/// Read header fields out of one segment.
///
/// A line counts for the first label it contains anywhere, so quoted
/// (`> From:`) and indented headers are picked up. The value is whatever
/// follows the line's first `:`. Later lines overwrite earlier ones, which
/// leaves the innermost quoted header in place. `date`, `sent` and `received`
/// all fill the date. The segment itself becomes the content.
pub fn extract_fields(segment: &str) -> EmailRecord {
    let mut record = EmailRecord {
        content: segment.to_string(),
        ..Default::default()
    };

    for line in segment.lines() {
        let lower = line.to_lowercase();
        let Some((field, _)) = FIELD_LABELS
            .iter()
            .find(|(_, labels)| labels.iter().any(|label| lower.contains(label)))
        else {
            continue;
        };
        let Some((_, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        if value.is_empty() {
            continue;
        }

        let slot = match field {
            Field::Subject => &mut record.subject,
            Field::From => &mut record.sender,
            Field::To => &mut record.recipient,
            Field::Date => &mut record.date,
            Field::Cc => &mut record.cc,
            Field::MessageId => &mut record.message_id,
        };
        *slot = value.to_string();
    }

    record
}

/// Split and field-extract in one step.
pub fn split_into_records(text: &str) -> Vec<EmailRecord> {
    split_threads(text).iter().map(|segment| extract_fields(segment)).collect()
}
