//! Thread summaries.
//!
//! A natural-language [`Summarizer`] can be plugged in from outside. Without
//! one, or for very short threads, [`BasicSummarizer`] builds a deterministic
//! digest from the records themselves.

use crate::types::{EmailRecord, NOT_FOUND};
use crate::{PostfachError, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

/// Clean text at or below this length never goes to an external summarizer.
pub const MIN_TEXT_FOR_SUMMARIZER: usize = 100;

const PREVIEW_CHARS: usize = 300;
const ACTION_CHARS: usize = 100;
const MAX_DETAILS: usize = 5;
const MAX_PARTICIPANTS: usize = 5;
const HIGHLIGHT_CHARS: usize = 80;
const HIGHLIGHTS_PER_KIND: usize = 2;

/// Requested summary size, passed through to the summarizer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryLength {
    Short,
    #[default]
    Medium,
    Long,
}

impl SummaryLength {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Short => "short",
            Self::Medium => "medium",
            Self::Long => "long",
        }
    }
}

impl FromStr for SummaryLength {
    type Err = PostfachError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "short" => Ok(Self::Short),
            "medium" => Ok(Self::Medium),
            "long" => Ok(Self::Long),
            other => Err(PostfachError::validation(format!(
                "Unknown summary length '{}'. Expected short, medium or long",
                other
            ))),
        }
    }
}

/// Produces a summary for an ordered thread.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use postfach::summary::{Summarizer, SummaryLength};
/// use postfach::types::EmailRecord;
///
/// struct SubjectOnly;
///
/// #[async_trait]
/// impl Summarizer for SubjectOnly {
///     fn name(&self) -> &str {
///         "subject-only"
///     }
///
///     async fn summarize(&self, emails: &[EmailRecord], _length: SummaryLength) -> postfach::Result<String> {
///         Ok(emails.first().map(|e| e.subject.clone()).unwrap_or_default())
///     }
/// }
/// ```
#[async_trait]
pub trait Summarizer: Send + Sync {
    fn name(&self) -> &str;

    async fn summarize(&self, emails: &[EmailRecord], length: SummaryLength) -> Result<String>;
}

static DATE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\b\d{1,2}[/-]\d{1,2}[/-]\d{2,4}\b",
        r"\b\d{4}[/-]\d{1,2}[/-]\d{1,2}\b",
        r"(?i)\b(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]* \d{1,2},? \d{4}\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("Date regex pattern is valid and should compile"))
    .collect()
});

static AMOUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$[\d,]+(?:\.\d{2})?").expect("Amount regex pattern is valid and should compile"));

static ACTION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)(?:deadline|due|complete|finish|deliver|submit|send|review|approve|sign|meet|call|discuss|decide)[^.]*",
        r"(?i)(?:urgent|important|priority|asap|immediately|critical)[^.]*",
        r"(?i)(?:action item|to do|task|assignment|responsibility)[^.]*",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("Action regex pattern is valid and should compile"))
    .collect()
});

static DEADLINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:deadline|due|by|before)[^.]*(?:\d{1,2}[/-]\d{1,2}[/-]\d{2,4}|\b(?:monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b)",
    )
    .expect("Deadline regex pattern is valid and should compile")
});

static DECISION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:decided|agreed|concluded|determined|approved|rejected)[^.]*")
        .expect("Decision regex pattern is valid and should compile")
});

/// Deterministic summary built from the records alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicSummarizer;

impl BasicSummarizer {
    pub fn render(&self, emails: &[EmailRecord]) -> String {
        let mut parts = vec![
            "**Email Thread Summary**".to_string(),
            format!("**Number of emails:** {}", emails.len()),
        ];

        if let Some(first) = emails.first() {
            parts.push(format!("**Subject:** {}", first.subject));
            parts.push(format!(
                "**Main participants:** **{}** → **{}**",
                first.sender, first.recipient
            ));
            parts.push(format!(
                "**Content preview:** {}...",
                truncate_chars(&first.content, PREVIEW_CHARS)
            ));

            let details = important_details(&first.content);
            if !details.is_empty() {
                parts.push("**Important Details Found:**".to_string());
                parts.extend(details.into_iter().take(MAX_DETAILS));
            }
        }

        if emails.len() > 1 {
            parts.push(format!("\n**Thread contains {} related emails**", emails.len()));
            let participants: BTreeSet<&str> = emails
                .iter()
                .map(|email| email.sender.as_str())
                .filter(|sender| !sender.is_empty() && *sender != NOT_FOUND)
                .collect();
            if !participants.is_empty() {
                let listed: Vec<String> = participants
                    .iter()
                    .take(MAX_PARTICIPANTS)
                    .map(|p| format!("**{}**", p))
                    .collect();
                parts.push(format!("**All participants:** {}", listed.join(", ")));
            }

            let subjects: BTreeSet<&str> = emails
                .iter()
                .map(|email| email.subject.as_str())
                .filter(|subject| !subject.is_empty())
                .collect();
            if subjects.len() > 1 {
                parts.push(format!(
                    "**Topic evolution:** {} different subjects discussed",
                    subjects.len()
                ));
            }

            let highlights = thread_highlights(emails);
            if !highlights.is_empty() {
                parts.push("**Key Thread Highlights:**".to_string());
                parts.extend(highlights);
            }
        }

        parts.join("\n\n")
    }
}

#[async_trait]
impl Summarizer for BasicSummarizer {
    fn name(&self) -> &str {
        "basic"
    }

    async fn summarize(&self, emails: &[EmailRecord], _length: SummaryLength) -> Result<String> {
        Ok(self.render(emails))
    }
}

/// Dates (3 per pattern), `$` amounts (3) and action phrases (2 per pattern), in that order.
fn important_details(content: &str) -> Vec<String> {
    let mut details = Vec::new();
    for pattern in DATE_PATTERNS.iter() {
        details.extend(pattern.find_iter(content).take(3).map(|m| format!("**Date:** {}", m.as_str())));
    }
    details.extend(AMOUNT.find_iter(content).take(3).map(|m| format!("**Amount:** {}", m.as_str())));
    for pattern in ACTION_PATTERNS.iter() {
        details.extend(
            pattern
                .find_iter(content)
                .take(2)
                .map(|m| format!("**Action:** {}...", truncate_chars(m.as_str(), ACTION_CHARS))),
        );
    }
    details
}

/// Deadlines, then decisions, found anywhere in the thread.
fn thread_highlights(emails: &[EmailRecord]) -> Vec<String> {
    let all_content: String = emails.iter().map(|email| format!(" {}", email.content)).collect();
    let mut highlights: Vec<String> = DEADLINE
        .find_iter(&all_content)
        .take(HIGHLIGHTS_PER_KIND)
        .map(|m| format!("**Deadline:** {}...", truncate_chars(m.as_str(), HIGHLIGHT_CHARS)))
        .collect();
    highlights.extend(
        DECISION
            .find_iter(&all_content)
            .take(HIGHLIGHTS_PER_KIND)
            .map(|m| format!("**Decision:** {}...", truncate_chars(m.as_str(), HIGHLIGHT_CHARS))),
    );
    highlights
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// A generated summary and where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub text: String,
    pub length: SummaryLength,
    pub email_count: usize,
    pub raw_text_length: usize,
    /// Name of the summarizer that produced `text`.
    pub generated_by: String,
}

/// Summarize a thread.
///
/// `summarizer` is consulted only when the clean text is longer than
/// [`MIN_TEXT_FOR_SUMMARIZER`] characters. If it fails, the basic summary is
/// used instead.
pub async fn summarize(
    emails: &[EmailRecord],
    clean_text: &str,
    length: SummaryLength,
    summarizer: Option<&dyn Summarizer>,
) -> Summary {
    let raw_text_length = clean_text.chars().count();
    let basic = BasicSummarizer;

    let (text, generated_by) = match summarizer {
        Some(summarizer) if raw_text_length > MIN_TEXT_FOR_SUMMARIZER => {
            match summarizer.summarize(emails, length).await {
                Ok(text) => (text, summarizer.name().to_string()),
                Err(err) => {
                    tracing::warn!(summarizer = summarizer.name(), error = %err, "Summarizer failed, using basic summary");
                    (basic.render(emails), basic.name().to_string())
                }
            }
        }
        _ => (basic.render(emails), basic.name().to_string()),
    };

    Summary {
        text,
        length,
        email_count: emails.len(),
        raw_text_length,
        generated_by,
    }
}
