//! MAPI property streams of an Outlook compound file.
//!
//! Each top-level property lives in its own `__substg1.0_<TAG>` stream, where
//! the low 16 bits of the tag name the value type.

use crate::extraction::html::html_to_text;
use crate::text::encoding::{decode_ignoring_errors, decode_utf16le};
use crate::types::EmailRecord;
use crate::{PostfachError, Result};
use std::io::{Cursor, Read};

/// `PT_UNICODE`: UTF-16LE string.
pub const PT_UNICODE: u32 = 0x001F;
/// `PT_BINARY`: raw bytes.
pub const PT_BINARY: u32 = 0x0102;

pub const PR_SUBJECT: u32 = 0x0037_001F;
pub const PR_SENDER_NAME: u32 = 0x0C1A_001F;
pub const PR_SENDER_EMAIL: u32 = 0x0C1F_001F;
pub const PR_DISPLAY_TO: u32 = 0x0E03_001F;
pub const PR_DISPLAY_CC: u32 = 0x0E04_001F;
pub const PR_BODY: u32 = 0x1000_001F;
pub const PR_HTML: u32 = 0x1013_0102;
pub const PR_CLIENT_SUBMIT_TIME: u32 = 0x0039_001F;
pub const PR_TRANSPORT_HEADERS: u32 = 0x007D_001F;

/// Fixed-length property table every Outlook-written message carries.
pub const PROPERTIES_STREAM: &str = "/__properties_version1.0";

/// Stream path holding the property `tag`.
pub fn stream_name(tag: u32) -> String {
    format!("/__substg1.0_{:08X}", tag)
}

/// The mapped properties of one message; absent or blank streams are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MsgProperties {
    pub subject: Option<String>,
    pub sender_name: Option<String>,
    pub sender_email: Option<String>,
    pub display_to: Option<String>,
    pub display_cc: Option<String>,
    pub body: Option<String>,
    pub html_body: Option<String>,
    pub client_submit_time: Option<String>,
    pub transport_headers: Option<String>,
}

impl MsgProperties {
    /// Read every mapped property stream from a compound file buffer.
    ///
    /// Fails only when the buffer is not a compound file at all. Missing or
    /// unreadable streams leave their field empty.
    pub fn read(data: &[u8]) -> Result<Self> {
        let mut compound = cfb::CompoundFile::open(Cursor::new(data))
            .map_err(|e| PostfachError::msg_parse_with_source("not a compound document", e))?;

        let mut read = |tag: u32| -> Option<String> {
            let mut stream = compound.open_stream(stream_name(tag)).ok()?;
            let mut bytes = Vec::new();
            if let Err(e) = stream.read_to_end(&mut bytes) {
                tracing::debug!(tag, error = %e, "Property stream unreadable");
                return None;
            }
            let value = decode_property(tag, &bytes);
            let value = value.trim();
            (!value.is_empty()).then(|| value.to_string())
        };

        Ok(Self {
            subject: read(PR_SUBJECT),
            sender_name: read(PR_SENDER_NAME),
            sender_email: read(PR_SENDER_EMAIL),
            display_to: read(PR_DISPLAY_TO),
            display_cc: read(PR_DISPLAY_CC),
            body: read(PR_BODY),
            html_body: read(PR_HTML),
            client_submit_time: read(PR_CLIENT_SUBMIT_TIME),
            transport_headers: read(PR_TRANSPORT_HEADERS),
        })
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// HTML body as text when present, otherwise the plain body.
    pub fn best_content(&self) -> String {
        match (&self.html_body, &self.body) {
            (Some(html), _) => html_to_text(html),
            (None, Some(body)) => body.clone(),
            (None, None) => String::new(),
        }
    }

    /// `value` of the first `name:` line in the transport headers.
    fn transport_header(&self, name: &str) -> Option<String> {
        self.transport_headers.as_deref()?.lines().find_map(|line| {
            let (label, value) = line.split_once(':')?;
            let value = value.trim();
            (label.trim().eq_ignore_ascii_case(name) && !value.is_empty()).then(|| value.to_string())
        })
    }

    pub fn into_record(self) -> EmailRecord {
        let mut record = EmailRecord {
            content: self.best_content(),
            ..Default::default()
        };

        let date = self
            .client_submit_time
            .clone()
            .or_else(|| self.transport_header("date"));
        let message_id = self
            .transport_header("message-id")
            .map(|id| id.trim_matches(|c| c == '<' || c == '>').to_string());

        let sender = match (self.sender_name, self.sender_email) {
            (Some(name), Some(email)) if name != email => Some(format!("{} <{}>", name, email)),
            (_, Some(email)) => Some(email),
            (Some(name), None) => Some(name),
            (None, None) => None,
        };

        let fields = [
            (&mut record.subject, self.subject),
            (&mut record.sender, sender),
            (&mut record.recipient, self.display_to),
            (&mut record.cc, self.display_cc),
            (&mut record.date, date),
            (&mut record.message_id, message_id),
        ];
        for (slot, value) in fields {
            if let Some(value) = value {
                *slot = value;
            }
        }
        record
    }
}

/// Whether the buffer is a compound file laid out like a saved Outlook message:
/// a property table plus a subject or body stream.
pub fn has_message_layout(data: &[u8]) -> bool {
    let Ok(compound) = cfb::CompoundFile::open(Cursor::new(data)) else {
        return false;
    };
    compound.is_stream(PROPERTIES_STREAM)
        && [PR_SUBJECT, PR_BODY]
            .iter()
            .any(|&tag| compound.is_stream(stream_name(tag)))
}

fn decode_property(tag: u32, bytes: &[u8]) -> String {
    match tag & 0xFFFF {
        PT_UNICODE => decode_utf16le(bytes),
        PT_BINARY => decode_ignoring_errors(bytes, encoding_rs::UTF_8)
            .trim_end_matches('\0')
            .to_string(),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}
