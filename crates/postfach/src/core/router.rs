//! Extension-based dispatch.

use crate::core::capabilities::Capabilities;
use crate::types::DocumentFormat;
use crate::{PostfachError, Result};
use std::path::Path;

pub const PDF_MIME_TYPE: &str = "application/pdf";
pub const EML_MIME_TYPE: &str = "message/rfc822";
pub const MSG_MIME_TYPE: &str = "application/vnd.ms-outlook";

/// Format for a dotted or bare extension, ignoring case.
pub fn format_for_extension(extension: &str) -> DocumentFormat {
    match extension.trim_start_matches('.').to_lowercase().as_str() {
        "pdf" => DocumentFormat::Pdf,
        "eml" => DocumentFormat::Eml,
        "msg" => DocumentFormat::Msg,
        _ => DocumentFormat::Unknown,
    }
}

impl DocumentFormat {
    pub fn mime_type(&self) -> Option<&'static str> {
        match self {
            Self::Pdf => Some(PDF_MIME_TYPE),
            Self::Eml => Some(EML_MIME_TYPE),
            Self::Msg => Some(MSG_MIME_TYPE),
            Self::Unknown => None,
        }
    }
}

/// Picks the parser for an input from its file extension.
#[derive(Debug, Clone)]
pub struct FormatRouter {
    formats: Vec<DocumentFormat>,
}

impl FormatRouter {
    pub fn new(capabilities: &Capabilities) -> Self {
        Self {
            formats: capabilities.supported_formats(),
        }
    }

    pub fn supported_formats(&self) -> &[DocumentFormat] {
        &self.formats
    }

    /// `.pdf, .eml, .msg` for the formats available here.
    pub fn supported_extensions(&self) -> String {
        self.formats
            .iter()
            .map(DocumentFormat::extension)
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn route_extension(&self, extension: &str) -> Result<DocumentFormat> {
        let format = format_for_extension(extension);
        if format != DocumentFormat::Unknown && self.formats.contains(&format) {
            return Ok(format);
        }

        let shown = match extension.trim() {
            "" => "(none)".to_string(),
            ext if ext.starts_with('.') => ext.to_lowercase(),
            ext => format!(".{}", ext.to_lowercase()),
        };
        Err(PostfachError::UnsupportedFormat(format!(
            "{}. Supported formats: {}",
            shown,
            self.supported_extensions()
        )))
    }

    pub fn route(&self, path: impl AsRef<Path>) -> Result<DocumentFormat> {
        let extension = path
            .as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        self.route_extension(extension)
    }

    pub fn is_supported_file(&self, path: impl AsRef<Path>) -> bool {
        self.route(path).is_ok()
    }
}
