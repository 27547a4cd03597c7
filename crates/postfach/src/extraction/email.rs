//! `.eml` (RFC 822 / MIME) parsing with `mail-parser`.
//!
//! Header fields come back RFC 2047 decoded; the date keeps its header text. The part tree is walked in
//! encounter order: container parts are skipped, text and HTML leaves become
//! the body, and leaves carrying a filename become attachments.

use super::attachment::{AttachmentExtractor, append_attachment_texts};
use super::html::html_to_text;
use crate::types::{EmailRecord, NOT_FOUND};
use crate::{PostfachError, Result};
use mail_parser::{Address, MessageParser, MessagePart, MimeHeaders, PartType};

/// Separator between multiple body parts.
pub const BODY_SEPARATOR: &str = "\n\n";

/// Parse a MIME message into one [`EmailRecord`].
pub fn parse_eml(data: &[u8], attachments: &AttachmentExtractor<'_>) -> Result<EmailRecord> {
    if data.iter().all(u8::is_ascii_whitespace) {
        return Err(PostfachError::validation("Email content is empty"));
    }

    let message = MessageParser::default()
        .parse(data)
        .ok_or_else(|| PostfachError::parsing("Failed to parse EML file: invalid email format"))?;

    let mut record = EmailRecord {
        subject: non_empty(message.subject()),
        sender: render_addresses(message.from()),
        recipient: render_addresses(message.to()),
        cc: render_addresses(message.cc()),
        date: message
            .header_raw("Date")
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .map(str::to_string)
            .or_else(|| message.date().map(|d| d.to_rfc3339()))
            .unwrap_or_else(|| NOT_FOUND.to_string()),
        message_id: non_empty(message.message_id()),
        ..Default::default()
    };

    let mut bodies: Vec<String> = Vec::new();
    for part in &message.parts {
        match classify(part) {
            PartRole::Container => {}
            PartRole::Body(text) => {
                if !text.trim().is_empty() {
                    bodies.push(text);
                }
            }
            PartRole::Attachment(filename) => {
                let content_type = content_type_of(part);
                let attachment = attachments.extract(&filename, content_type.as_deref(), part.contents());
                if let Some(text) = &attachment.extracted_text {
                    record.attachment_contents.insert(filename.clone(), text.clone());
                }
                record.attachments.push(attachment);
            }
            PartRole::Skipped => {
                tracing::debug!(content_type = ?content_type_of(part), "Skipping attachment part without a filename");
            }
        }
    }

    record.content = bodies.join(BODY_SEPARATOR);
    append_attachment_texts(&mut record);

    tracing::debug!(
        bodies = bodies.len(),
        attachments = record.attachments.len(),
        "Parsed MIME message"
    );
    Ok(record)
}

enum PartRole {
    Container,
    Body(String),
    Attachment(String),
    Skipped,
}

fn classify(part: &MessagePart<'_>) -> PartRole {
    let is_attachment = part
        .content_disposition()
        .is_some_and(|disposition| disposition.ctype().eq_ignore_ascii_case("attachment"));

    match &part.body {
        PartType::Multipart(_) => PartRole::Container,
        PartType::Text(text) if !is_attachment => PartRole::Body(text.to_string()),
        PartType::Html(html) if !is_attachment => PartRole::Body(html_to_text(html)),
        _ => match part.attachment_name() {
            Some(name) if !name.trim().is_empty() => PartRole::Attachment(name.trim().to_string()),
            _ => PartRole::Skipped,
        },
    }
}

fn content_type_of(part: &MessagePart<'_>) -> Option<String> {
    part.content_type().map(|ct| match ct.subtype() {
        Some(subtype) => format!("{}/{}", ct.ctype(), subtype).to_lowercase(),
        None => ct.ctype().to_lowercase(),
    })
}

/// `Name <addr>` or `addr`, comma-joined; [`NOT_FOUND`] when empty.
fn render_addresses(address: Option<&Address<'_>>) -> String {
    let rendered: Vec<String> = address
        .map(|list| {
            list.iter()
                .filter_map(|addr| match (addr.name(), addr.address()) {
                    (Some(name), Some(email)) if !name.trim().is_empty() => Some(format!("{} <{}>", name.trim(), email)),
                    (_, Some(email)) => Some(email.to_string()),
                    (Some(name), None) => Some(name.trim().to_string()),
                    (None, None) => None,
                })
                .collect()
        })
        .unwrap_or_default();

    if rendered.is_empty() {
        NOT_FOUND.to_string()
    } else {
        rendered.join(", ")
    }
}

fn non_empty(value: Option<&str>) -> String {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(NOT_FOUND)
        .to_string()
}
