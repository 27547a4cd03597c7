//! Postfach - email extraction from PDF exports, MIME messages and Outlook files
//!
//! Postfach turns `.pdf` email exports, `.eml` MIME messages and Outlook `.msg`
//! files into an ordered list of [`EmailRecord`]s with normalized headers,
//! bodies and attachment text.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use postfach::Extractor;
//!
//! # fn main() -> postfach::Result<()> {
//! let extractor = Extractor::default();
//! let result = extractor.extract_path("thread.pdf")?;
//! for email in &result.emails {
//!     println!("{} -> {}: {}", email.sender, email.recipient, email.subject);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - **Core Module** (`core`): routing, the pipeline, fallback chains, worker pool, config
//! - **Extraction** (`extraction`): `.eml`, `.msg`, HTML and attachment parsers
//! - **PDF** (`pdf`): page-parallel text layer extraction
//! - **OCR** (`ocr`): pdftoppm + tesseract for scanned PDFs
//! - **Text** (`text`): normalization, thread splitting, legacy encodings
//! - **Summary** (`summary`): pluggable summarizer with a deterministic fallback
//!
//! # Features
//!
//! - `pdf`, `email` (default): PDF and `.eml` support
//! - `msg-enhanced`: Outlook library tier for `.msg` files
//! - `tokio-runtime` (default): async and batch entry points

#![deny(unsafe_code)]

pub mod core;
pub mod error;
pub mod extraction;
pub mod ocr;
#[cfg(feature = "pdf")]
pub mod pdf;
pub mod summary;
pub mod text;
pub mod types;

pub use error::{PostfachError, Result};
pub use types::*;

pub use core::config::ExtractorConfig;
pub use core::pipeline::Extractor;

#[cfg(feature = "tokio-runtime")]
pub use core::extractor::{
    batch_extract_file, batch_extract_file_sync, extract_bytes, extract_bytes_sync, extract_file, extract_file_sync,
};

pub use summary::{BasicSummarizer, Summarizer, SummaryLength, summarize};
