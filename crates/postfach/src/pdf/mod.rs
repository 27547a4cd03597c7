//! PDF text extraction with OCR escalation.
//!
//! The text layer is read page-parallel through `lopdf`. When the whole
//! document comes back blank it is retried once through OCR. Both steps are
//! strategies on one [`FallbackChain`]; when neither yields text the caller
//! gets an empty string plus the errors seen along the way.

pub mod error;
pub mod extractor;
pub mod source;

pub use error::PdfError;
pub use extractor::{PageText, PdfPageExtractor};
pub use source::{LopdfSource, PageSource};

use crate::core::fallback::{FallbackChain, Strategy};
use crate::core::pool::WorkerPool;
use crate::ocr::OcrStage;
use crate::types::ParsingMethod;
use crate::{PostfachError, Result};
use std::path::Path;
use std::sync::Arc;

pub const TEXT_LAYER_STRATEGY: &str = "pdf_text";
pub const OCR_STRATEGY: &str = "ocr";

/// Text recovered from a PDF, or an empty string and the reasons why not.
#[derive(Debug)]
pub struct PdfText {
    pub text: String,
    pub pages: Option<usize>,
    pub method: Option<ParsingMethod>,
    pub attempted: Vec<&'static str>,
    pub errors: Vec<(&'static str, PostfachError)>,
}

impl PdfText {
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Error raised by the text-layer strategy (unreadable or corrupt PDF).
    pub fn text_layer_error(&self) -> Option<&PostfachError> {
        self.errors
            .iter()
            .find(|(name, _)| *name == TEXT_LAYER_STRATEGY)
            .map(|(_, err)| err)
    }

    /// Fatal error for a PDF that yielded no text: the text-layer failure if
    /// the document could not be read, otherwise the image-based PDF error.
    pub fn into_error(self) -> PostfachError {
        match self.errors.into_iter().find(|(name, _)| *name == TEXT_LAYER_STRATEGY) {
            Some((_, err)) => PostfachError::extraction_with_source(format!("Error processing PDF: {}", err), err),
            None => PostfachError::image_based_pdf(),
        }
    }
}

struct Recovered {
    text: String,
    pages: Option<usize>,
    method: ParsingMethod,
}

struct TextLayer<'a> {
    pool: &'a WorkerPool,
}

impl Strategy<[u8], Recovered> for TextLayer<'_> {
    fn name(&self) -> &'static str {
        TEXT_LAYER_STRATEGY
    }

    fn attempt(&self, bytes: &[u8]) -> Result<Option<Recovered>> {
        let source = LopdfSource::from_bytes(bytes)?;
        let page_text = PdfPageExtractor::new(self.pool.clone()).extract(Arc::new(source))?;
        if page_text.is_blank() {
            tracing::debug!(pages = page_text.pages, "PDF text layer is blank");
            return Ok(None);
        }
        Ok(Some(Recovered {
            text: page_text.text,
            pages: Some(page_text.pages),
            method: ParsingMethod::PdfText,
        }))
    }
}

struct Ocr<'a> {
    stage: &'a OcrStage,
    enabled: bool,
}

impl Strategy<[u8], Recovered> for Ocr<'_> {
    fn name(&self) -> &'static str {
        OCR_STRATEGY
    }

    fn applies(&self, _bytes: &[u8]) -> bool {
        self.enabled
    }

    fn attempt(&self, bytes: &[u8]) -> Result<Option<Recovered>> {
        let text = self.stage.recognize_pdf(bytes)?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(Recovered {
            text,
            pages: None,
            method: ParsingMethod::Ocr,
        }))
    }
}

/// Text layer first, OCR second.
pub struct PdfExtractor {
    pool: WorkerPool,
    ocr: OcrStage,
    ocr_enabled: bool,
}

impl PdfExtractor {
    pub fn new(pool: WorkerPool, ocr: OcrStage, ocr_enabled: bool) -> Self {
        Self { pool, ocr, ocr_enabled }
    }

    /// Read a PDF from disk and extract it.
    pub fn extract_path(&self, path: &Path) -> Result<PdfText> {
        let bytes = std::fs::read(path)?;
        self.extract(&bytes)
    }

    pub fn extract(&self, bytes: &[u8]) -> Result<PdfText> {
        let chain = FallbackChain::new().with(TextLayer { pool: &self.pool }).with(Ocr {
            stage: &self.ocr,
            enabled: self.ocr_enabled,
        });

        let run = chain.run(bytes)?;
        let (text, pages, method) = match run.output {
            Some(recovered) => (recovered.text, recovered.pages, Some(recovered.method)),
            None => (String::new(), None, None),
        };

        Ok(PdfText {
            text,
            pages,
            method,
            attempted: run.attempted,
            errors: run.errors,
        })
    }
}
