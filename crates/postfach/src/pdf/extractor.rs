//! Page-parallel text extraction.
//!
//! One task per page on the bounded pool; a page that fails or stalls
//! contributes an empty string and never takes its siblings down.

use super::source::PageSource;
use crate::Result;
use crate::core::pool::{TaskOutcome, WorkerPool};
use std::sync::Arc;

/// Text of a whole document plus per-page bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageText {
    pub text: String,
    pub pages: usize,
    /// Zero-based indices of pages that failed or missed the deadline.
    pub failed_pages: Vec<usize>,
}

impl PageText {
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

pub struct PdfPageExtractor {
    pool: WorkerPool,
}

impl PdfPageExtractor {
    pub fn new(pool: WorkerPool) -> Self {
        Self { pool }
    }

    /// Extract every page and join them in page order, one `"\n"` after each page.
    ///
    /// Single-page documents are read on the calling thread.
    pub fn extract(&self, source: Arc<dyn PageSource>) -> Result<PageText> {
        let pages = source.page_count();
        tracing::debug!(pages, workers = self.pool.workers(), "Extracting PDF text");

        let texts: Vec<(usize, Option<String>)> = if pages <= 1 {
            (0..pages)
                .map(|index| match source.page_text(index) {
                    Ok(text) => (index, Some(text)),
                    Err(e) => {
                        tracing::warn!(page = index + 1, error = %e, "Page text extraction failed");
                        (index, None)
                    }
                })
                .collect()
        } else {
            let worker_source = Arc::clone(&source);
            self.pool
                .run_indexed(pages, move |index| worker_source.page_text(index))?
                .into_iter()
                .enumerate()
                .map(|(index, outcome)| match outcome {
                    TaskOutcome::Done(text) => (index, Some(text)),
                    TaskOutcome::Failed(e) => {
                        tracing::warn!(page = index + 1, error = %e, "Page text extraction failed");
                        (index, None)
                    }
                    TaskOutcome::TimedOut => {
                        tracing::warn!(page = index + 1, "Page text extraction missed the deadline");
                        (index, None)
                    }
                })
                .collect()
        };

        Ok(join_pages(pages, texts))
    }
}

fn join_pages(pages: usize, texts: Vec<(usize, Option<String>)>) -> PageText {
    let mut result = PageText {
        pages,
        ..Default::default()
    };
    for (index, text) in texts {
        match text {
            Some(text) => result.text.push_str(&text),
            None => result.failed_pages.push(index),
        }
        result.text.push('\n');
    }
    result
}
