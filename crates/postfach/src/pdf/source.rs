//! Page-addressable access to a PDF's text layer.

use super::error::{PdfError, Result};
use lopdf::Document;

/// A document whose pages can be read independently and concurrently.
pub trait PageSource: Send + Sync {
    fn page_count(&self) -> usize;

    /// Text of the page at zero-based `index`.
    fn page_text(&self, index: usize) -> Result<String>;
}

/// [`PageSource`] backed by an in-memory `lopdf` document.
pub struct LopdfSource {
    document: Document,
    page_numbers: Vec<u32>,
}

impl LopdfSource {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let document = Document::load_mem(bytes)?;
        // get_pages is keyed by 1-based page number, already sorted
        let page_numbers: Vec<u32> = document.get_pages().keys().copied().collect();
        Ok(Self { document, page_numbers })
    }
}

impl PageSource for LopdfSource {
    fn page_count(&self) -> usize {
        self.page_numbers.len()
    }

    fn page_text(&self, index: usize) -> Result<String> {
        let page_number = *self.page_numbers.get(index).ok_or(PdfError::PageNotFound(index + 1))?;
        self.document
            .extract_text(&[page_number])
            .map_err(|e| PdfError::TextExtractionFailed(format!("page {}: {}", page_number, e)))
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::pdf_with_pages;
    use super::*;

    #[test]
    fn test_reads_page_count_and_text() {
        let bytes = pdf_with_pages(&["first page words", "second page words"]);
        let source = LopdfSource::from_bytes(&bytes).unwrap();
        assert_eq!(source.page_count(), 2);
        assert!(source.page_text(0).unwrap().contains("first page words"));
        assert!(source.page_text(1).unwrap().contains("second page words"));
    }

    #[test]
    fn test_out_of_range_page() {
        let bytes = pdf_with_pages(&["only page"]);
        let source = LopdfSource::from_bytes(&bytes).unwrap();
        assert!(matches!(source.page_text(3), Err(PdfError::PageNotFound(4))));
    }

    #[test]
    fn test_garbage_is_invalid_pdf() {
        assert!(LopdfSource::from_bytes(b"definitely not a pdf").is_err());
    }
}
