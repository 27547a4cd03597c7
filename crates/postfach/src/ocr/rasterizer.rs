//! PDF page rasterization.

use super::error::OcrError;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Turns every page of a PDF file into an image file inside `out_dir`.
pub trait PageRasterizer: Send + Sync {
    /// Image paths in page order.
    fn rasterize(&self, pdf: &Path, out_dir: &Path, dpi: u32) -> Result<Vec<PathBuf>, OcrError>;
}

/// Poppler's `pdftoppm`.
#[derive(Debug, Clone)]
pub struct Pdftoppm {
    binary: PathBuf,
}

impl Pdftoppm {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self { binary: binary.into() }
    }
}

impl PageRasterizer for Pdftoppm {
    fn rasterize(&self, pdf: &Path, out_dir: &Path, dpi: u32) -> Result<Vec<PathBuf>, OcrError> {
        let prefix = out_dir.join("page");
        let output = Command::new(&self.binary)
            .arg("-r")
            .arg(dpi.to_string())
            .arg("-png")
            .arg(pdf)
            .arg(&prefix)
            .output()
            .map_err(|e| OcrError::IOError(format!("failed to run {}: {}", self.binary.display(), e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::RasterizationFailed(format!(
                "pdftoppm exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        collect_page_images(out_dir)
    }
}

/// `page-1.png`, `page-02.png`, ... sorted by page number, not lexically.
pub(crate) fn collect_page_images(dir: &Path) -> Result<Vec<PathBuf>, OcrError> {
    let entries = std::fs::read_dir(dir).map_err(|e| OcrError::IOError(e.to_string()))?;

    let mut pages: Vec<(u32, PathBuf)> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter_map(|path| page_number(&path).map(|n| (n, path)))
        .collect();
    pages.sort_by_key(|(n, _)| *n);

    Ok(pages.into_iter().map(|(_, path)| path).collect())
}

fn page_number(path: &Path) -> Option<u32> {
    if path.extension()?.to_str()? != "png" {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    stem.strip_prefix("page-")?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_collect_sorts_numerically() {
        let dir = tempdir().unwrap();
        for name in ["page-10.png", "page-2.png", "page-1.png", "notes.txt", "page-x.png"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }

        let pages = collect_page_images(dir.path()).unwrap();
        let names: Vec<String> = pages
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["page-1.png", "page-2.png", "page-10.png"]);
    }

    #[test]
    fn test_missing_binary_is_io_error() {
        let dir = tempdir().unwrap();
        let rasterizer = Pdftoppm::new("/nonexistent/postfach/pdftoppm");
        let err = rasterizer.rasterize(Path::new("in.pdf"), dir.path(), 150).unwrap_err();
        assert!(matches!(err, OcrError::IOError(_)));
    }
}
