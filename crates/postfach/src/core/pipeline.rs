//! The synchronous extraction pipeline.
//!
//! [`Extractor`] owns the configuration and the once-resolved capability
//! set. Every call routes the input by extension, runs the matching parser,
//! and for PDFs normalizes and splits the recovered text into records.

use crate::core::capabilities::{Capabilities, SystemToolDiscovery};
use crate::core::config::ExtractorConfig;
use crate::core::io::{file_name_of, read_file_sync, validate_file_exists};
use crate::core::pool::{HARD_WORKER_CEILING, WorkerPool};
use crate::core::router::{FormatRouter, format_for_extension};
use crate::extraction::{AttachmentExtractor, MsgParser};
use crate::types::{Diagnostics, DocumentFormat, ExtractionResult};
use crate::{PostfachError, Result};
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use std::path::Path;

#[cfg(feature = "pdf")]
use crate::ocr::OcrStage;
#[cfg(feature = "pdf")]
use crate::pdf::PdfExtractor;
#[cfg(feature = "pdf")]
use crate::text::{extract_fields, normalize_text, split_into_records};
#[cfg(feature = "pdf")]
use crate::types::ParsingMethod;

/// Entry point for extracting email records from files and buffers.
///
/// Cheap to share behind an `Arc`; the worker count may be changed between
/// calls from any thread.
///
/// # Example
///
/// ```rust,no_run
/// use postfach::Extractor;
///
/// # fn example() -> postfach::Result<()> {
/// let extractor = Extractor::default();
/// let result = extractor.extract_path("thread.msg")?;
/// for email in &result.emails {
///     println!("{}: {}", email.sender, email.subject);
/// }
/// # Ok(())
/// # }
/// ```
pub struct Extractor {
    config: RwLock<ExtractorConfig>,
    capabilities: OnceCell<Capabilities>,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(ExtractorConfig::default())
    }
}

impl Extractor {
    pub fn new(mut config: ExtractorConfig) -> Self {
        config.max_workers = config.max_workers.clamp(1, HARD_WORKER_CEILING);
        Self {
            config: RwLock::new(config),
            capabilities: OnceCell::new(),
        }
    }

    /// Use a fixed capability set instead of probing the system.
    pub fn with_capabilities(config: ExtractorConfig, capabilities: Capabilities) -> Self {
        let extractor = Self::new(config);
        // Freshly created cell, cannot already be set.
        let _ = extractor.capabilities.set(capabilities);
        extractor
    }

    /// Configuration from `postfach.toml` found by walking up from the
    /// current directory, or the defaults.
    pub fn from_discovered_config() -> Result<Self> {
        Ok(Self::new(ExtractorConfig::discover()?.unwrap_or_default()))
    }

    /// Snapshot of the current configuration.
    pub fn config(&self) -> ExtractorConfig {
        self.config.read().clone()
    }

    /// Change the requested worker count, capped at the hard ceiling.
    pub fn set_max_workers(&self, workers: usize) {
        let capped = workers.clamp(1, HARD_WORKER_CEILING);
        if capped != workers {
            tracing::debug!(requested = workers, capped, "Worker count adjusted to pool limits");
        }
        self.config.write().max_workers = capped;
    }

    pub fn max_workers(&self) -> usize {
        self.config.read().max_workers
    }

    /// Tools and formats, resolved on first use.
    pub fn capabilities(&self) -> &Capabilities {
        self.capabilities.get_or_init(|| {
            let config = self.config.read();
            Capabilities::resolve(&SystemToolDiscovery::from_config(&config.ocr))
        })
    }

    pub fn router(&self) -> FormatRouter {
        FormatRouter::new(self.capabilities())
    }

    pub fn supported_formats(&self) -> Vec<DocumentFormat> {
        self.capabilities().supported_formats()
    }

    pub fn is_supported_file(&self, path: impl AsRef<Path>) -> bool {
        self.router().is_supported_file(path)
    }

    /// Tools or features that would enable more extraction paths.
    pub fn missing_dependencies(&self) -> Vec<String> {
        self.capabilities().missing_dependencies()
    }

    /// Extract a file from disk.
    pub fn extract_path(&self, path: impl AsRef<Path>) -> Result<ExtractionResult> {
        let path = path.as_ref();
        validate_file_exists(path)?;
        let format = self.router().route(path)?;
        let bytes = read_file_sync(path)?;
        tracing::debug!(path = %path.display(), format = %format, size = bytes.len(), "Extracting file");
        self.extract_routed(&bytes, format)
    }

    /// Extract an in-memory buffer; `filename` only selects the format.
    pub fn extract_bytes(&self, bytes: &[u8], filename: &str) -> Result<ExtractionResult> {
        let format = self.router().route(filename)?;
        self.extract_routed(bytes, format)
    }

    /// Like [`Self::extract_path`], with failures folded into an error record.
    pub fn extract_path_record(&self, path: impl AsRef<Path>) -> ExtractionResult {
        let path = path.as_ref();
        self.extract_path(path)
            .unwrap_or_else(|err| failure_record(&file_name_of(path), &err))
    }

    /// Like [`Self::extract_bytes`], with failures folded into an error record.
    pub fn extract_bytes_record(&self, bytes: &[u8], filename: &str) -> ExtractionResult {
        self.extract_bytes(bytes, filename)
            .unwrap_or_else(|err| failure_record(filename, &err))
    }

    fn extract_routed(&self, bytes: &[u8], format: DocumentFormat) -> Result<ExtractionResult> {
        let config = self.config();
        let pool = WorkerPool::new(config.max_workers, config.extraction_timeout());

        #[cfg(feature = "pdf")]
        let pdf = PdfExtractor::new(
            pool.clone(),
            OcrStage::from_capabilities(self.capabilities(), &config.ocr, pool.clone()),
            config.ocr.enabled,
        );

        #[allow(unused_mut)]
        let mut attachments = AttachmentExtractor::new(&config.attachments);
        #[cfg(feature = "pdf")]
        {
            attachments = attachments.with_pdf(&pdf);
        }

        match format {
            #[cfg(feature = "pdf")]
            DocumentFormat::Pdf => extract_pdf(&pdf, bytes, &config),
            #[cfg(feature = "email")]
            DocumentFormat::Eml => {
                let record = crate::extraction::parse_eml(bytes, &attachments)?;
                let diagnostics = Diagnostics {
                    parsing_method: Some(crate::types::ParsingMethod::MimeStructure),
                    tiers_attempted: vec![crate::types::ParsingMethod::MimeStructure.as_str().to_string()],
                    attachments_count: record.attachments.len(),
                    ..Default::default()
                };
                let raw_text_length = String::from_utf8_lossy(bytes).chars().count();
                Ok(ExtractionResult::success(
                    DocumentFormat::Eml,
                    vec![record],
                    raw_text_length,
                    diagnostics,
                ))
            }
            DocumentFormat::Msg => {
                let output = MsgParser::new(&attachments).parse(bytes)?;
                let diagnostics = Diagnostics {
                    parsing_method: Some(output.method),
                    tiers_attempted: output.tiers_attempted,
                    attachments_count: output.record.attachments.len(),
                    ..Default::default()
                };
                Ok(ExtractionResult::success(
                    DocumentFormat::Msg,
                    vec![output.record],
                    output.raw_text_length,
                    diagnostics,
                ))
            }
            other => Err(PostfachError::UnsupportedFormat(format!(
                "{}. Supported formats: {}",
                other.extension(),
                self.router().supported_extensions()
            ))),
        }
    }
}

#[cfg(feature = "pdf")]
fn extract_pdf(pdf: &PdfExtractor, bytes: &[u8], config: &ExtractorConfig) -> Result<ExtractionResult> {
    let extracted = pdf.extract(bytes)?;
    if extracted.is_blank() {
        return Err(extracted.into_error());
    }

    let raw_text_length = extracted.text.chars().count();
    let text = if config.normalize_text {
        normalize_text(&extracted.text)
    } else {
        extracted.text.trim().to_string()
    };
    let emails = if config.split_threads {
        split_into_records(&text)
    } else if text.is_empty() {
        Vec::new()
    } else {
        vec![extract_fields(&text)]
    };

    let diagnostics = Diagnostics {
        parsing_method: extracted.method,
        tiers_attempted: extracted.attempted.iter().map(|name| name.to_string()).collect(),
        attachments_count: 0,
        pages: extracted.pages,
        ocr_used: extracted.method == Some(ParsingMethod::Ocr),
    };
    tracing::debug!(emails = emails.len(), raw_text_length, "Split PDF text into records");
    Ok(ExtractionResult::success(DocumentFormat::Pdf, emails, raw_text_length, diagnostics))
}

pub(crate) fn failure_record(filename: &str, err: &PostfachError) -> ExtractionResult {
    let extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default();
    tracing::warn!(filename, error = %err, kind = err.kind(), "Extraction failed");
    ExtractionResult::failure(format_for_extension(extension), err)
}
