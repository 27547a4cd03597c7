//! Outlook `.msg` parsing.
//!
//! Strategies run in order until one yields a record:
//!
//! 1. `outlook_library` (feature `msg-enhanced`): full parse through `msg_parser`.
//! 2. `structured_property_mapping`: read the fixed MAPI property streams.
//! 3. `fallback_text_extraction`: pattern scan over the decoded buffer.
//!
//! The first two only run on buffers that carry the compound file signature,
//! and the library tier additionally needs the Outlook property stream layout.
//! The last one always produces a record unless the buffer holds no printable
//! text at all. Attachment detection runs afterwards, whichever tier won.

pub mod attachments;
pub mod heuristic;
pub mod properties;

use super::attachment::{AttachmentExtractor, append_attachment_texts};
use crate::core::fallback::{FallbackChain, Strategy};
use crate::text::encoding::{DecodedText, decode_first_printable};
use crate::types::{EmailRecord, ParsingMethod};
use crate::{PostfachError, Result};
use properties::MsgProperties;

/// Compound File Binary header.
pub const MSG_SIGNATURE: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

pub const NO_READABLE_TEXT: &str = "Could not extract readable text from MSG file";

pub fn has_signature(data: &[u8]) -> bool {
    data.starts_with(&MSG_SIGNATURE)
}

/// A parsed `.msg` buffer and how it was parsed.
#[derive(Debug, Clone)]
pub struct MsgOutput {
    pub record: EmailRecord,
    pub method: ParsingMethod,
    pub tiers_attempted: Vec<String>,
    /// Characters of printable text the buffer decoded to.
    pub raw_text_length: usize,
}

pub struct MsgInput<'d> {
    pub data: &'d [u8],
    pub decoded: Option<DecodedText>,
}

impl MsgInput<'_> {
    fn is_compound(&self) -> bool {
        has_signature(self.data)
    }
}

pub struct Parsed {
    pub record: EmailRecord,
    pub method: ParsingMethod,
}

#[cfg(feature = "msg-enhanced")]
struct OutlookLibrary<'a> {
    attachments: &'a AttachmentExtractor<'a>,
}

#[cfg(feature = "msg-enhanced")]
impl<'d> Strategy<MsgInput<'d>, Parsed> for OutlookLibrary<'_> {
    fn name(&self) -> &'static str {
        ParsingMethod::OutlookLibrary.as_str()
    }

    /// The library allocates without bound on compound files that lack the
    /// Outlook stream layout, so only hand it buffers that have one.
    fn applies(&self, input: &MsgInput<'d>) -> bool {
        input.is_compound() && properties::has_message_layout(input.data)
    }

    fn attempt(&self, input: &MsgInput<'d>) -> Result<Option<Parsed>> {
        // Malformed property streams can panic inside the parser.
        let parsed = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            msg_parser::Outlook::from_slice(input.data)
        }))
        .map_err(|_| PostfachError::msg_parse("Outlook parser panicked"))?;
        let outlook = parsed.map_err(|e| PostfachError::msg_parse(format!("Outlook parser failed: {}", e)))?;

        if outlook.subject.trim().is_empty() && outlook.body.trim().is_empty() && outlook.sender.email.is_empty() {
            return Ok(None);
        }

        let mut record = EmailRecord {
            subject: or_not_found(non_blank(&outlook.subject)),
            sender: or_not_found(render_person(&outlook.sender.name, &outlook.sender.email)),
            recipient: or_not_found(render_people(outlook.to.iter().map(|p| (p.name.as_str(), p.email.as_str())))),
            cc: or_not_found(render_people(outlook.cc.iter().map(|p| (p.name.as_str(), p.email.as_str())))),
            date: or_not_found(non_blank(&outlook.headers.date)),
            message_id: or_not_found(non_blank(
                outlook.headers.message_id.trim().trim_matches(|c| c == '<' || c == '>'),
            )),
            content: outlook.body.trim().to_string(),
            ..Default::default()
        };

        for attachment in &outlook.attachments {
            let filename = [&attachment.file_name, &attachment.display_name]
                .into_iter()
                .find(|name| !name.trim().is_empty())
                .cloned()
                .unwrap_or_else(|| format!("attachment{}", attachment.extension));
            let bytes = hex::decode(&attachment.payload).unwrap_or_else(|e| {
                tracing::debug!(filename = %filename, error = %e, "Attachment payload is not valid hex");
                Vec::new()
            });
            let content_type = (!attachment.mime_tag.is_empty()).then_some(attachment.mime_tag.as_str());
            let extracted = self.attachments.extract(&filename, content_type, &bytes);
            if let Some(text) = &extracted.extracted_text {
                record.attachment_contents.insert(filename.clone(), text.clone());
            }
            record.attachments.push(extracted);
        }

        Ok(Some(Parsed {
            record,
            method: ParsingMethod::OutlookLibrary,
        }))
    }
}

#[cfg(feature = "msg-enhanced")]
fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

#[cfg(feature = "msg-enhanced")]
fn or_not_found(value: Option<String>) -> String {
    value.unwrap_or_else(|| crate::types::NOT_FOUND.to_string())
}

#[cfg(feature = "msg-enhanced")]
fn render_person(name: &str, email: &str) -> Option<String> {
    match (name.trim(), email.trim()) {
        ("", "") => None,
        (name, "") => Some(name.to_string()),
        ("", email) => Some(email.to_string()),
        (name, email) if name == email => Some(email.to_string()),
        (name, email) => Some(format!("{} <{}>", name, email)),
    }
}

#[cfg(feature = "msg-enhanced")]
fn render_people<'p>(people: impl Iterator<Item = (&'p str, &'p str)>) -> Option<String> {
    let rendered: Vec<String> = people.filter_map(|(name, email)| render_person(name, email)).collect();
    (!rendered.is_empty()).then(|| rendered.join(", "))
}

struct PropertyMapping;

impl<'d> Strategy<MsgInput<'d>, Parsed> for PropertyMapping {
    fn name(&self) -> &'static str {
        ParsingMethod::StructuredPropertyMapping.as_str()
    }

    fn applies(&self, input: &MsgInput<'d>) -> bool {
        input.is_compound()
    }

    fn attempt(&self, input: &MsgInput<'d>) -> Result<Option<Parsed>> {
        let properties = MsgProperties::read(input.data)?;
        if properties.is_empty() {
            tracing::debug!("No mapped MAPI property carried a value");
            return Ok(None);
        }
        Ok(Some(Parsed {
            record: properties.into_record(),
            method: ParsingMethod::StructuredPropertyMapping,
        }))
    }
}

struct TextFallback;

impl<'d> Strategy<MsgInput<'d>, Parsed> for TextFallback {
    fn name(&self) -> &'static str {
        ParsingMethod::FallbackTextExtraction.as_str()
    }

    fn attempt(&self, input: &MsgInput<'d>) -> Result<Option<Parsed>> {
        let decoded = input
            .decoded
            .as_ref()
            .ok_or_else(|| PostfachError::msg_parse(NO_READABLE_TEXT))?;
        tracing::debug!(encoding = decoded.encoding, "Scanning decoded .msg text");
        Ok(Some(Parsed {
            record: heuristic::fallback_record(&decoded.text),
            method: ParsingMethod::FallbackTextExtraction,
        }))
    }
}

/// Three-tier `.msg` parser.
pub struct MsgParser<'a> {
    attachments: &'a AttachmentExtractor<'a>,
}

impl<'a> MsgParser<'a> {
    pub fn new(attachments: &'a AttachmentExtractor<'a>) -> Self {
        Self { attachments }
    }

    fn chain<'d>(&self) -> FallbackChain<'a, MsgInput<'d>, Parsed> {
        let chain = FallbackChain::new();
        #[cfg(feature = "msg-enhanced")]
        let chain = chain.with(OutlookLibrary {
            attachments: self.attachments,
        });
        chain.with(PropertyMapping).with(TextFallback)
    }

    /// Strategy names in the order they are tried.
    pub fn tier_names(&self) -> Vec<&'static str> {
        self.chain().names()
    }

    pub fn parse(&self, data: &[u8]) -> Result<MsgOutput> {
        let input = MsgInput {
            data,
            decoded: decode_first_printable(data),
        };
        if !input.is_compound() {
            tracing::debug!("No compound file signature, going straight to text extraction");
        }

        let run = self.chain().run(&input)?;
        let tiers_attempted: Vec<String> = run.attempted.iter().map(|name| name.to_string()).collect();
        let Some(Parsed { mut record, method }) = run.output else {
            return Err(run
                .into_last_error()
                .unwrap_or_else(|| PostfachError::msg_parse(NO_READABLE_TEXT)));
        };

        if let Some(decoded) = &input.decoded {
            self.merge_detected(&mut record, attachments::detect(&decoded.text));
        }
        append_attachment_texts(&mut record);

        tracing::debug!(
            method = method.as_str(),
            attachments = record.attachments.len(),
            "Parsed .msg file"
        );
        Ok(MsgOutput {
            record,
            method,
            tiers_attempted,
            raw_text_length: input.decoded.as_ref().map_or(0, |d| d.text.chars().count()),
        })
    }

    fn merge_detected(&self, record: &mut EmailRecord, detected: attachments::DetectedAttachments) {
        for filename in detected.filenames {
            if !record.attachments.iter().any(|a| a.filename == filename) {
                record.attachments.push(self.attachments.detected(&filename));
            }
        }
        for (key, text) in detected.contents {
            record.attachment_contents.entry(key).or_insert(text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::properties::fixtures::msg_with_strings;
    use super::properties::{PR_BODY, PR_DISPLAY_TO, PR_SENDER_EMAIL, PR_SUBJECT};
    use super::*;
    use crate::core::config::AttachmentConfig;

    fn parse(data: &[u8]) -> Result<MsgOutput> {
        let config = AttachmentConfig::default();
        let extractor = AttachmentExtractor::new(&config);
        MsgParser::new(&extractor).parse(data)
    }

    #[test]
    fn test_signature() {
        let mut data = MSG_SIGNATURE.to_vec();
        data.extend_from_slice(b"rest");
        assert!(has_signature(&data));
        assert!(!has_signature(b"From: a@x.com"));
        assert!(!has_signature(&MSG_SIGNATURE[..4]));
    }

    #[test]
    fn test_no_signature_goes_to_text_fallback() {
        let output = parse(b"Subject: Status\nFrom: alice@example.com\nAll systems are running normally today.\n").unwrap();
        assert_eq!(output.method, ParsingMethod::FallbackTextExtraction);
        assert_eq!(output.tiers_attempted, vec!["fallback_text_extraction"]);
        assert_eq!(output.record.subject, "Status");
        assert_eq!(output.record.sender, "alice@example.com");
    }

    #[test]
    fn test_property_mapping_wins_on_compound_file() {
        let data = msg_with_strings(&[
            (PR_SUBJECT, "Invoice 42"),
            (PR_SENDER_EMAIL, "billing@example.com"),
            (PR_DISPLAY_TO, "Finance Team"),
            (PR_BODY, "Please find the invoice attached."),
        ]);
        let output = parse(&data).unwrap();
        #[cfg(not(feature = "msg-enhanced"))]
        assert_eq!(output.method, ParsingMethod::StructuredPropertyMapping);
        assert_eq!(output.record.subject, "Invoice 42");
        assert_eq!(output.record.sender, "billing@example.com");
        assert_eq!(output.record.recipient, "Finance Team");
        assert_eq!(output.record.content, "Please find the invoice attached.");
        assert!(!output.tiers_attempted.contains(&"fallback_text_extraction".to_string()));
    }

    #[test]
    fn test_empty_compound_file_falls_to_text() {
        let data = msg_with_strings(&[]);
        let output = parse(&data).unwrap();
        assert_eq!(output.method, ParsingMethod::FallbackTextExtraction);
        assert_eq!(
            output.tiers_attempted,
            vec!["structured_property_mapping", "fallback_text_extraction"]
        );
    }

    #[cfg(feature = "msg-enhanced")]
    #[test]
    fn test_outlook_library_skipped_without_message_layout() {
        use super::properties::fixtures::msg_with_property_table;

        let bare = parse(&msg_with_strings(&[])).unwrap();
        assert!(!bare.tiers_attempted.contains(&"outlook_library".to_string()));

        let no_table = parse(&msg_with_strings(&[(PR_SUBJECT, "Only a subject")])).unwrap();
        assert_eq!(no_table.method, ParsingMethod::StructuredPropertyMapping);
        assert_eq!(no_table.tiers_attempted, vec!["structured_property_mapping"]);

        let table_only = parse(&msg_with_property_table(&[])).unwrap();
        assert_eq!(table_only.method, ParsingMethod::FallbackTextExtraction);
        assert!(!table_only.tiers_attempted.contains(&"outlook_library".to_string()));
    }

    #[test]
    fn test_empty_buffer_is_msg_parse_error() {
        let err = parse(b"").unwrap_err();
        assert!(matches!(err, PostfachError::MsgParse { .. }));
        assert!(err.to_string().contains(NO_READABLE_TEXT));
    }

    #[test]
    fn test_detected_attachments_merged() {
        let output = parse(b"Subject: Files\nPlease read summary.pdf before the call tomorrow.\n").unwrap();
        let names: Vec<&str> = output.record.attachments.iter().map(|a| a.filename.as_str()).collect();
        assert_eq!(names, vec!["summary.pdf"]);
        assert_eq!(output.record.attachments[0].size, 0);
    }

    #[test]
    fn test_detected_content_appended_to_body() {
        let prose: Vec<String> = (0..5)
            .map(|i| format!("Clause {} covers the delivery terms for the project", i))
            .collect();
        let text = format!("Subject: Terms\nSee terms.pdf attached\n\n{}\n", prose.join("\n"));
        let output = parse(text.as_bytes()).unwrap();

        let appended = output.record.attachment_contents.get("terms.pdf").unwrap();
        assert!(appended.starts_with("Clause 0 covers"));
        assert!(
            output
                .record
                .content
                .contains(&format!("\n\n\n--- Attachment: terms.pdf ---\n{}", appended))
        );
    }

    #[test]
    fn test_tier_order() {
        let config = AttachmentConfig::default();
        let extractor = AttachmentExtractor::new(&config);
        let names = MsgParser::new(&extractor).tier_names();
        assert_eq!(names.last(), Some(&"fallback_text_extraction"));
        assert_eq!(names[names.len() - 2], "structured_property_mapping");
    }
}
