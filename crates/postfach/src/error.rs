//! Error types for Postfach.
//!
//! All fallible operations return [`PostfachError`]. The enum follows two rules:
//!
//! - `PostfachError::Io` (from `std::io::Error`) bubbles up unchanged. Permission
//!   problems and missing mounts are real system failures and callers need to see them.
//! - Everything else carries a human readable message and, where useful, the
//!   underlying error as `#[source]`.
//!
//! Failures that only affect one page or one attachment never become a
//! `PostfachError` at the call boundary; they are absorbed and recorded on the
//! result instead (see [`crate::types::AttachmentRecord::error`]).
//!
//! # Example
//!
//! ```rust
//! use postfach::{PostfachError, Result};
//!
//! fn ensure_not_empty(bytes: &[u8]) -> Result<()> {
//!     if bytes.is_empty() {
//!         return Err(PostfachError::validation("input buffer is empty"));
//!     }
//!     Ok(())
//! }
//! # assert!(ensure_not_empty(b"").is_err());
//! ```
use thiserror::Error;

/// Result type alias using `PostfachError`.
pub type Result<T> = std::result::Result<T, PostfachError>;

/// Main error type for all Postfach operations.
///
/// # Variants
///
/// - `UnsupportedFormat` - extension not handled by the router
/// - `FileNotFound` - input path does not exist
/// - `ImageBasedPdfUnsupported` - PDF has no text layer and OCR is unavailable
/// - `AttachmentExtraction` - one attachment could not be converted to text
/// - `MsgParse` - a `.msg` buffer could not be read at all
/// - `Extraction` - catch-all for pipeline failures
/// - `Io`, `Validation`, `Parsing`, `Ocr` - ambient failures
#[derive(Debug, Error)]
pub enum PostfachError {
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("{remediation}")]
    ImageBasedPdfUnsupported { remediation: String },

    #[error("Error extracting text from {filename}: {message}")]
    AttachmentExtraction { filename: String, message: String },

    #[error("Failed to process .msg file: {message}")]
    MsgParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Extraction failed: {message}")]
    Extraction {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Parsing error: {message}")]
    Parsing {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("OCR error: {message}")]
    Ocr {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl From<serde_json::Error> for PostfachError {
    fn from(err: serde_json::Error) -> Self {
        PostfachError::Parsing {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

#[cfg(feature = "pdf")]
impl From<crate::pdf::error::PdfError> for PostfachError {
    fn from(err: crate::pdf::error::PdfError) -> Self {
        PostfachError::Parsing {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<crate::ocr::error::OcrError> for PostfachError {
    fn from(err: crate::ocr::error::OcrError) -> Self {
        match err {
            crate::ocr::error::OcrError::BackendUnavailable(_) => PostfachError::ImageBasedPdfUnsupported {
                remediation: crate::ocr::IMAGE_BASED_PDF_REMEDIATION.to_string(),
            },
            other => PostfachError::Ocr {
                message: other.to_string(),
                source: Some(Box::new(other)),
            },
        }
    }
}

macro_rules! error_constructor {
    ($name:ident, $variant:ident) => {
        pastey::paste! {
            #[doc = "Create a " $variant " error"]
            pub fn $name<S: Into<String>>(message: S) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: None,
                }
            }

            #[doc = "Create a " $variant " error with source"]
            pub fn [<$name _with_source>]<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
                message: S,
                source: E,
            ) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: Some(Box::new(source)),
                }
            }
        }
    };
}

impl PostfachError {
    error_constructor!(msg_parse, MsgParse);
    error_constructor!(extraction, Extraction);
    error_constructor!(validation, Validation);
    error_constructor!(parsing, Parsing);

    /// The image-based PDF failure with its setup instructions.
    pub fn image_based_pdf() -> Self {
        Self::ImageBasedPdfUnsupported {
            remediation: crate::ocr::IMAGE_BASED_PDF_REMEDIATION.to_string(),
        }
    }

    /// Stable, machine-readable name of the error category.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnsupportedFormat(_) => "unsupported_format",
            Self::FileNotFound(_) => "file_not_found",
            Self::ImageBasedPdfUnsupported { .. } => "image_based_pdf_unsupported",
            Self::AttachmentExtraction { .. } => "attachment_extraction_failure",
            Self::MsgParse { .. } => "msg_parse_failure",
            Self::Extraction { .. } => "generic_extraction_failure",
            Self::Io(_) => "io",
            Self::Validation { .. } => "validation",
            Self::Parsing { .. } => "parsing",
            Self::Ocr { .. } => "ocr",
        }
    }

    /// Setup guidance attached to errors the user can fix locally.
    pub fn remediation(&self) -> Option<&str> {
        match self {
            Self::ImageBasedPdfUnsupported { remediation } => Some(remediation),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: PostfachError = io_err.into();
        assert!(matches!(err, PostfachError::Io(_)));
        assert!(err.to_string().contains("IO error"));
        assert_eq!(err.kind(), "io");
    }

    #[test]
    fn test_unsupported_format_message() {
        let err = PostfachError::UnsupportedFormat(".docx".to_string());
        assert_eq!(err.to_string(), "Unsupported file format: .docx");
        assert_eq!(err.kind(), "unsupported_format");
    }

    #[test]
    fn test_msg_parse_with_source() {
        let source = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "truncated");
        let err = PostfachError::msg_parse_with_source("could not read buffer", source);
        assert_eq!(err.to_string(), "Failed to process .msg file: could not read buffer");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_extraction_error() {
        let err = PostfachError::extraction("worker pool could not start");
        assert_eq!(err.to_string(), "Extraction failed: worker pool could not start");
        assert!(std::error::Error::source(&err).is_none());
        assert_eq!(err.kind(), "generic_extraction_failure");
    }

    #[test]
    fn test_image_based_pdf_carries_remediation() {
        let err = PostfachError::image_based_pdf();
        assert!(err.to_string().contains("image-based PDF"));
        let remediation = err.remediation().unwrap();
        assert!(remediation.contains("Tesseract"));
        assert!(remediation.contains("Poppler"));
    }

    #[test]
    fn test_attachment_extraction_message() {
        let err = PostfachError::AttachmentExtraction {
            filename: "report.pdf".to_string(),
            message: "broken xref".to_string(),
        };
        assert_eq!(err.to_string(), "Error extracting text from report.pdf: broken xref");
        assert!(err.remediation().is_none());
    }

    #[test]
    fn test_backend_unavailable_becomes_image_based_pdf() {
        let err: PostfachError = crate::ocr::error::OcrError::BackendUnavailable("tesseract".to_string()).into();
        assert!(matches!(err, PostfachError::ImageBasedPdfUnsupported { .. }));
    }

    #[test]
    fn test_other_ocr_errors_stay_ocr() {
        let err: PostfachError = crate::ocr::error::OcrError::RecognitionFailed("exit status 1".to_string()).into();
        assert!(matches!(err, PostfachError::Ocr { .. }));
        assert!(err.to_string().contains("exit status 1"));
    }
}
