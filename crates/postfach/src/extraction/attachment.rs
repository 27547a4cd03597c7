//! Text extraction from email attachments.
//!
//! Selection is by file extension. `.txt`, `.html`/`.htm` and `.pdf` have an
//! extractor; `.doc`, `.docx` and `.rtf` are recognized as attachments but
//! produce no text. A failing attachment never fails its email: the cause is
//! recorded on the [`AttachmentRecord`] instead.

use super::html::html_to_text;
use crate::PostfachError;
use crate::Result;
use crate::core::config::AttachmentConfig;
use crate::core::fallback::{FallbackChain, Strategy};
use crate::types::{AttachmentRecord, EmailRecord};
use std::path::Path;

#[cfg(feature = "pdf")]
use crate::pdf::PdfExtractor;
#[cfg(feature = "pdf")]
use std::io::Write;

/// Extensions treated as document attachments.
pub const EXTRACTABLE_EXTENSIONS: &[&str] = &[".pdf", ".txt", ".doc", ".docx", ".rtf", ".html", ".htm"];

const OCTET_STREAM: &str = "application/octet-stream";

/// Lowercased, dotted extension of `filename`, empty when there is none.
pub fn extension_of(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_lowercase()))
        .unwrap_or_default()
}

pub fn is_extractable(filename: &str) -> bool {
    EXTRACTABLE_EXTENSIONS.contains(&extension_of(filename).as_str())
}

/// Content type guessed from the filename.
pub fn guess_content_type(filename: &str) -> String {
    mime_guess::from_path(filename).first_or_octet_stream().essence_str().to_string()
}

/// One attachment as handed to the strategies.
pub struct Payload<'p> {
    pub filename: &'p str,
    pub extension: String,
    pub data: &'p [u8],
}

struct PlainText;

impl<'p> Strategy<Payload<'p>, String> for PlainText {
    fn name(&self) -> &'static str {
        "txt"
    }

    fn applies(&self, payload: &Payload<'p>) -> bool {
        payload.extension == ".txt"
    }

    fn attempt(&self, payload: &Payload<'p>) -> Result<Option<String>> {
        Ok(Some(String::from_utf8_lossy(payload.data).into_owned()))
    }
}

struct Html;

impl<'p> Strategy<Payload<'p>, String> for Html {
    fn name(&self) -> &'static str {
        "html"
    }

    fn applies(&self, payload: &Payload<'p>) -> bool {
        matches!(payload.extension.as_str(), ".html" | ".htm")
    }

    fn attempt(&self, payload: &Payload<'p>) -> Result<Option<String>> {
        Ok(Some(html_to_text(&String::from_utf8_lossy(payload.data))))
    }
}

#[cfg(feature = "pdf")]
struct Pdf<'a> {
    extractor: &'a PdfExtractor,
}

#[cfg(feature = "pdf")]
impl<'p> Strategy<Payload<'p>, String> for Pdf<'_> {
    fn name(&self) -> &'static str {
        "pdf"
    }

    fn applies(&self, payload: &Payload<'p>) -> bool {
        payload.extension == ".pdf"
    }

    fn attempt(&self, payload: &Payload<'p>) -> Result<Option<String>> {
        // Removed when `file` drops, on every path out of this function.
        let mut file = tempfile::Builder::new().prefix("postfach-").suffix(".pdf").tempfile()?;
        file.write_all(payload.data)?;
        file.flush()?;

        let pdf = self.extractor.extract_path(file.path())?;
        if pdf.is_blank() {
            return Err(pdf.into_error());
        }
        Ok(Some(pdf.text))
    }
}

/// Converts attachment bytes into an [`AttachmentRecord`].
pub struct AttachmentExtractor<'a> {
    config: &'a AttachmentConfig,
    #[cfg(feature = "pdf")]
    pdf: Option<&'a PdfExtractor>,
}

impl<'a> AttachmentExtractor<'a> {
    pub fn new(config: &'a AttachmentConfig) -> Self {
        Self {
            config,
            #[cfg(feature = "pdf")]
            pdf: None,
        }
    }

    /// PDF attachments are recursed into `extractor`; without one they yield no text.
    #[cfg(feature = "pdf")]
    pub fn with_pdf(mut self, extractor: &'a PdfExtractor) -> Self {
        self.pdf = Some(extractor);
        self
    }

    fn chain<'p>(&self) -> FallbackChain<'a, Payload<'p>, String> {
        #[allow(unused_mut)]
        let mut chain = FallbackChain::new().with(PlainText).with(Html);
        #[cfg(feature = "pdf")]
        if let Some(extractor) = self.pdf {
            chain.push(Box::new(Pdf { extractor }));
        }
        chain
    }

    /// Record for one attachment, with extracted text when the type is supported.
    ///
    /// `content_type` is the declared type; when absent it is guessed from the filename.
    pub fn extract(&self, filename: &str, content_type: Option<&str>, data: &[u8]) -> AttachmentRecord {
        let content_type = content_type
            .filter(|ct| !ct.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| guess_content_type(filename));
        let mut record = AttachmentRecord::new(filename, content_type, data.len());

        if !self.config.extract_text || !is_extractable(filename) {
            return record;
        }
        if data.len() > self.config.max_attachment_bytes {
            tracing::warn!(
                filename,
                size = data.len(),
                limit = self.config.max_attachment_bytes,
                "Attachment exceeds size limit, not extracting text"
            );
            return record;
        }

        let payload = Payload {
            filename,
            extension: extension_of(filename),
            data,
        };

        match self.chain().run(&payload) {
            Ok(run) if run.output.is_some() => {
                record.extracted_text = run.output;
            }
            Ok(run) => {
                if let Some(err) = run.into_last_error() {
                    record.error = Some(error_note(payload.filename, &err));
                }
            }
            Err(err) => {
                record.error = Some(error_note(payload.filename, &err));
            }
        }

        if let Some(error) = &record.error {
            tracing::warn!(filename, error = %error, "Attachment extraction failed");
        }
        record
    }

    /// Record for an attachment that was detected but whose bytes are not available.
    pub fn detected(&self, filename: &str) -> AttachmentRecord {
        AttachmentRecord::new(filename, OCTET_STREAM, 0)
    }
}

/// `"[Error extracting text from <filename>: <cause>]"`.
fn error_note(filename: &str, err: &PostfachError) -> String {
    let failure = PostfachError::AttachmentExtraction {
        filename: filename.to_string(),
        message: err.to_string(),
    };
    format!("[{}]", failure)
}

/// Append each non-empty entry of `attachment_contents` to the record content
/// as a `--- Attachment: <filename> ---` section.
pub fn append_attachment_texts(record: &mut EmailRecord) {
    let sections: Vec<String> = record
        .attachment_contents
        .iter()
        .filter(|(_, text)| !text.is_empty())
        .map(|(filename, text)| format!("\n--- Attachment: {} ---\n{}", filename, text))
        .collect();
    if sections.is_empty() {
        return;
    }
    record.content.push_str("\n\n");
    record.content.push_str(&sections.join("\n"));
}
