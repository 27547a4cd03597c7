use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::PostfachError;

/// Value used for header fields that could not be recovered.
pub const NOT_FOUND: &str = "Not found";

/// Input formats the router understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Eml,
    Msg,
    Unknown,
}

impl DocumentFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Eml => "eml",
            Self::Msg => "msg",
            Self::Unknown => "unknown",
        }
    }

    /// Dotted file extension, e.g. `.pdf`.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => ".pdf",
            Self::Eml => ".eml",
            Self::Msg => ".msg",
            Self::Unknown => "",
        }
    }
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which strategy produced the records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParsingMethod {
    PdfText,
    Ocr,
    MimeStructure,
    OutlookLibrary,
    StructuredPropertyMapping,
    FallbackTextExtraction,
}

impl ParsingMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PdfText => "pdf_text",
            Self::Ocr => "ocr",
            Self::MimeStructure => "mime_structure",
            Self::OutlookLibrary => "outlook_library",
            Self::StructuredPropertyMapping => "structured_property_mapping",
            Self::FallbackTextExtraction => "fallback_text_extraction",
        }
    }
}

/// A file carried by an email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRecord {
    pub filename: String,
    pub content_type: String,
    pub size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AttachmentRecord {
    pub fn new(filename: impl Into<String>, content_type: impl Into<String>, size: usize) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            size,
            extracted_text: None,
            error: None,
        }
    }
}

/// One logical email: normalized headers, body and attachments.
///
/// Header fields that could not be recovered hold [`NOT_FOUND`]; `content`
/// is empty rather than absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailRecord {
    pub subject: String,
    #[serde(rename = "from")]
    pub sender: String,
    #[serde(rename = "to")]
    pub recipient: String,
    pub cc: String,
    pub date: String,
    pub message_id: String,
    pub content: String,
    pub attachments: Vec<AttachmentRecord>,
    /// Extracted attachment text keyed by filename, in attachment order.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub attachment_contents: IndexMap<String, String>,
}

impl Default for EmailRecord {
    fn default() -> Self {
        Self {
            subject: NOT_FOUND.to_string(),
            sender: NOT_FOUND.to_string(),
            recipient: NOT_FOUND.to_string(),
            cc: NOT_FOUND.to_string(),
            date: NOT_FOUND.to_string(),
            message_id: NOT_FOUND.to_string(),
            content: String::new(),
            attachments: Vec::new(),
            attachment_contents: IndexMap::new(),
        }
    }
}

/// Error payload of a failed extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub kind: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

impl From<&PostfachError> for ErrorInfo {
    fn from(err: &PostfachError) -> Self {
        Self {
            kind: err.kind().to_string(),
            message: err.to_string(),
            remediation: err.remediation().map(str::to_string),
        }
    }
}

/// How the result was produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parsing_method: Option<ParsingMethod>,
    /// Every strategy tried, in order, including the one that produced output.
    pub tiers_attempted: Vec<String>,
    pub attachments_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<usize>,
    pub ocr_used: bool,
}

/// Outcome of one extraction call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
    pub emails: Vec<EmailRecord>,
    pub raw_text_length: usize,
    pub format: DocumentFormat,
    pub diagnostics: Diagnostics,
}

impl ExtractionResult {
    pub fn success(format: DocumentFormat, emails: Vec<EmailRecord>, raw_text_length: usize, diagnostics: Diagnostics) -> Self {
        Self {
            success: true,
            error: None,
            emails,
            raw_text_length,
            format,
            diagnostics,
        }
    }

    /// Error record for a fatal failure.
    pub fn failure(format: DocumentFormat, err: &PostfachError) -> Self {
        Self {
            success: false,
            error: Some(ErrorInfo::from(err)),
            emails: Vec::new(),
            raw_text_length: 0,
            format,
            diagnostics: Diagnostics::default(),
        }
    }

    pub fn email_count(&self) -> usize {
        self.emails.len()
    }

    /// Plain field/value view handed to delivery layers.
    pub fn to_value(&self) -> Value {
        let mut value = json!({
            "success": self.success,
            "email_count": self.email_count(),
            "emails": self.emails,
            "raw_text_length": self.raw_text_length,
            "format": self.format,
            "diagnostics": self.diagnostics,
        });
        if let (Some(error), Some(map)) = (&self.error, value.as_object_mut()) {
            map.insert("error".to_string(), json!(error));
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_record_defaults() {
        let record = EmailRecord::default();
        assert_eq!(record.subject, NOT_FOUND);
        assert_eq!(record.sender, NOT_FOUND);
        assert_eq!(record.recipient, NOT_FOUND);
        assert_eq!(record.content, "");
        assert!(record.attachments.is_empty());
    }

    #[test]
    fn test_email_record_serializes_from_and_to() {
        let record = EmailRecord {
            sender: "a@x.com".to_string(),
            recipient: "b@x.com".to_string(),
            ..Default::default()
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["from"], "a@x.com");
        assert_eq!(value["to"], "b@x.com");
        assert!(value.get("attachment_contents").is_none());
    }

    #[test]
    fn test_failure_mapping_contains_error() {
        let err = PostfachError::UnsupportedFormat(".zip".to_string());
        let result = ExtractionResult::failure(DocumentFormat::Unknown, &err);
        let value = result.to_value();
        assert_eq!(value["success"], false);
        assert_eq!(value["email_count"], 0);
        assert_eq!(value["format"], "unknown");
        assert_eq!(value["error"]["kind"], "unsupported_format");
    }

    #[test]
    fn test_success_mapping_has_no_error() {
        let diagnostics = Diagnostics {
            parsing_method: Some(ParsingMethod::FallbackTextExtraction),
            ..Default::default()
        };
        let result = ExtractionResult::success(DocumentFormat::Msg, vec![EmailRecord::default()], 12, diagnostics);
        let value = result.to_value();
        assert_eq!(value["success"], true);
        assert_eq!(value["email_count"], 1);
        assert_eq!(value["format"], "msg");
        assert_eq!(value["diagnostics"]["parsing_method"], "fallback_text_extraction");
        assert!(value.get("error").is_none());
    }
}
