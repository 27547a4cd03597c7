use super::backend::{OcrBackend, TesseractCli};
use super::error::OcrError;
use super::rasterizer::{PageRasterizer, Pdftoppm};
use crate::core::capabilities::Capabilities;
use crate::core::config::OcrConfig;
use crate::core::pool::{TaskOutcome, WorkerPool};
use std::io::Write;
use std::sync::Arc;

/// Rasterize a PDF, then recognize each page image on the worker pool.
pub struct OcrStage {
    backend: Option<Arc<dyn OcrBackend>>,
    rasterizer: Option<Arc<dyn PageRasterizer>>,
    language: String,
    dpi: u32,
    pool: WorkerPool,
}

impl OcrStage {
    pub fn new(
        backend: Option<Arc<dyn OcrBackend>>,
        rasterizer: Option<Arc<dyn PageRasterizer>>,
        config: &OcrConfig,
        pool: WorkerPool,
    ) -> Self {
        Self {
            backend,
            rasterizer,
            language: config.language.clone(),
            dpi: config.dpi,
            pool,
        }
    }

    /// Wire up tesseract and pdftoppm from resolved capabilities.
    pub fn from_capabilities(caps: &Capabilities, config: &OcrConfig, pool: WorkerPool) -> Self {
        let backend = caps
            .tesseract
            .as_ref()
            .map(|path| Arc::new(TesseractCli::new(path)) as Arc<dyn OcrBackend>);
        let rasterizer = caps
            .pdftoppm
            .as_ref()
            .map(|path| Arc::new(Pdftoppm::new(path)) as Arc<dyn PageRasterizer>);
        Self::new(backend, rasterizer, config, pool)
    }

    pub fn is_available(&self) -> bool {
        self.backend.is_some() && self.rasterizer.is_some()
    }

    /// Recognized text of every page, joined in page order.
    ///
    /// Fails with [`OcrError::BackendUnavailable`] when either tool is
    /// missing. Pages that fail to recognize contribute an empty string.
    pub fn recognize_pdf(&self, pdf_bytes: &[u8]) -> Result<String, OcrError> {
        let backend = self
            .backend
            .clone()
            .ok_or_else(|| OcrError::BackendUnavailable("tesseract".to_string()))?;
        let rasterizer = self
            .rasterizer
            .as_ref()
            .ok_or_else(|| OcrError::BackendUnavailable("pdftoppm".to_string()))?;

        // Both the PDF copy and the page images are removed when `workdir` drops.
        let workdir = tempfile::tempdir().map_err(|e| OcrError::IOError(e.to_string()))?;
        let pdf_path = workdir.path().join("input.pdf");
        let mut file = std::fs::File::create(&pdf_path).map_err(|e| OcrError::IOError(e.to_string()))?;
        file.write_all(pdf_bytes).map_err(|e| OcrError::IOError(e.to_string()))?;
        drop(file);

        let images = rasterizer.rasterize(&pdf_path, workdir.path(), self.dpi)?;
        tracing::debug!(pages = images.len(), backend = backend.name(), "Running OCR");

        let images = Arc::new(images);
        let language = self.language.clone();
        let worker_images = Arc::clone(&images);
        let outcomes = self
            .pool
            .run_indexed(images.len(), move |index| {
                backend.recognize(&worker_images[index], &language)
            })
            .map_err(|e| OcrError::RecognitionFailed(e.to_string()))?;

        let mut text = String::new();
        for (index, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                TaskOutcome::Done(page) => text.push_str(&page),
                TaskOutcome::Failed(e) => tracing::warn!(page = index + 1, error = %e, "OCR failed for page"),
                TaskOutcome::TimedOut => tracing::warn!(page = index + 1, "OCR missed the deadline"),
            }
            text.push('\n');
        }

        Ok(text)
    }
}
