use std::fmt;

/// Errors raised by the OCR stage.
#[derive(Debug, Clone)]
pub enum OcrError {
    /// No recognizer or no rasterizer could be resolved.
    BackendUnavailable(String),
    RasterizationFailed(String),
    RecognitionFailed(String),
    IOError(String),
}

impl fmt::Display for OcrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BackendUnavailable(tool) => write!(f, "OCR backend unavailable: {}", tool),
            Self::RasterizationFailed(msg) => write!(f, "Page rasterization failed: {}", msg),
            Self::RecognitionFailed(msg) => write!(f, "Text recognition failed: {}", msg),
            Self::IOError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for OcrError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            OcrError::BackendUnavailable("tesseract".to_string()).to_string(),
            "OCR backend unavailable: tesseract"
        );
        assert_eq!(OcrError::IOError("disk full".to_string()).to_string(), "I/O error: disk full");
        assert_eq!(
            OcrError::RasterizationFailed("pdftoppm exited with 99".to_string()).to_string(),
            "Page rasterization failed: pdftoppm exited with 99"
        );
    }
}
