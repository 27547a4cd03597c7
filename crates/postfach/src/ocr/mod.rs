//! OCR for PDFs without a text layer.
//!
//! Pages are rasterized with `pdftoppm` and recognized with `tesseract`, both
//! resolved once through [`crate::core::capabilities`]. Either side can be
//! swapped through the [`PageRasterizer`] and [`OcrBackend`] traits.

pub mod backend;
pub mod error;
pub mod rasterizer;
pub mod stage;

pub use backend::{OcrBackend, TesseractCli};
pub use error::OcrError;
pub use rasterizer::{PageRasterizer, Pdftoppm};
pub use stage::OcrStage;

/// Message returned for scanned PDFs when OCR cannot run.
pub const IMAGE_BASED_PDF_REMEDIATION: &str = "Could not extract text from PDF. This appears to be an \
image-based PDF (scanned document). To process this type of PDF, you would need to:\n\n\
1. Install Tesseract OCR: https://github.com/tesseract-ocr/tesseract\n\
2. Install Poppler (provides pdftoppm): https://poppler.freedesktop.org/\n\
3. Add both to your system PATH, or set ocr.tesseract_path and ocr.pdftoppm_path in postfach.toml\n\n\
Alternatively, try converting your PDF to a text-based PDF or save your emails as text instead of scanning them.";
