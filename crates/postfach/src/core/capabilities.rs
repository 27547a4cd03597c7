//! One-time resolution of optional tools and compiled-in format support.
//!
//! External binaries are looked up once through a [`ToolDiscovery`] provider
//! and frozen into a read-only [`Capabilities`] value. Extraction code only
//! reads that value; it never searches the filesystem itself.

use crate::core::config::OcrConfig;
use crate::types::DocumentFormat;
use std::path::{Path, PathBuf};

pub const TESSERACT: &str = "tesseract";
pub const PDFTOPPM: &str = "pdftoppm";

/// Install locations checked after `PATH`.
const KNOWN_TOOL_DIRS: &[&str] = &[
    "/usr/bin",
    "/usr/local/bin",
    "/opt/homebrew/bin",
    "/opt/local/bin",
    r"C:\Program Files\Tesseract-OCR",
    r"C:\Program Files (x86)\Tesseract-OCR",
    r"C:\Program Files\poppler\Library\bin",
    r"C:\poppler\Library\bin",
];

/// Finds external executables.
pub trait ToolDiscovery: Send + Sync {
    fn locate(&self, tool: &str) -> Option<PathBuf>;
}

/// Configured path first, then `PATH`, then well-known install directories.
#[derive(Debug, Clone, Default)]
pub struct SystemToolDiscovery {
    tesseract_override: Option<PathBuf>,
    pdftoppm_override: Option<PathBuf>,
}

impl SystemToolDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &OcrConfig) -> Self {
        Self {
            tesseract_override: config.tesseract_path.clone(),
            pdftoppm_override: config.pdftoppm_path.clone(),
        }
    }

    fn search_dirs(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = std::env::var_os("PATH")
            .map(|path| std::env::split_paths(&path).collect())
            .unwrap_or_default();
        dirs.extend(KNOWN_TOOL_DIRS.iter().map(PathBuf::from));
        dirs
    }
}

impl ToolDiscovery for SystemToolDiscovery {
    fn locate(&self, tool: &str) -> Option<PathBuf> {
        let configured = match tool {
            TESSERACT => self.tesseract_override.as_ref(),
            PDFTOPPM => self.pdftoppm_override.as_ref(),
            _ => None,
        };
        if let Some(path) = configured {
            if path.is_file() {
                return Some(path.clone());
            }
            tracing::warn!(tool, path = %path.display(), "Configured tool path does not exist, searching instead");
        }

        let found = self.search_dirs().into_iter().find_map(|dir| executable_in(&dir, tool));
        match &found {
            Some(path) => tracing::debug!(tool, path = %path.display(), "Resolved external tool"),
            None => tracing::debug!(tool, "External tool not found"),
        }
        found
    }
}

fn executable_in(dir: &Path, tool: &str) -> Option<PathBuf> {
    let candidate = dir.join(tool);
    if candidate.is_file() {
        return Some(candidate);
    }
    let exe = dir.join(format!("{}.exe", tool));
    exe.is_file().then_some(exe)
}

/// Fixed answers, for tests and embedders that manage tools themselves.
#[derive(Debug, Clone, Default)]
pub struct StaticToolDiscovery {
    pub tesseract: Option<PathBuf>,
    pub pdftoppm: Option<PathBuf>,
}

impl ToolDiscovery for StaticToolDiscovery {
    fn locate(&self, tool: &str) -> Option<PathBuf> {
        match tool {
            TESSERACT => self.tesseract.clone(),
            PDFTOPPM => self.pdftoppm.clone(),
            _ => None,
        }
    }
}

/// Read-only capability set computed once per extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capabilities {
    pub pdf: bool,
    pub email: bool,
    /// Outlook library strategy compiled in for `.msg` files.
    pub msg_enhanced: bool,
    pub tesseract: Option<PathBuf>,
    pub pdftoppm: Option<PathBuf>,
}

impl Capabilities {
    pub fn resolve(discovery: &dyn ToolDiscovery) -> Self {
        let caps = Self {
            pdf: cfg!(feature = "pdf"),
            email: cfg!(feature = "email"),
            msg_enhanced: cfg!(feature = "msg-enhanced"),
            tesseract: discovery.locate(TESSERACT),
            pdftoppm: discovery.locate(PDFTOPPM),
        };
        tracing::info!(
            pdf = caps.pdf,
            email = caps.email,
            msg_enhanced = caps.msg_enhanced,
            ocr = caps.ocr_available(),
            "Resolved extraction capabilities"
        );
        caps
    }

    /// Compiled-in formats only, no external tools.
    pub fn without_tools() -> Self {
        Self::resolve(&StaticToolDiscovery::default())
    }

    /// OCR needs both a rasterizer and a recognizer.
    pub fn ocr_available(&self) -> bool {
        self.tesseract.is_some() && self.pdftoppm.is_some()
    }

    /// Formats the router can currently dispatch. `.msg` is always available.
    pub fn supported_formats(&self) -> Vec<DocumentFormat> {
        let mut formats = Vec::with_capacity(3);
        if self.pdf {
            formats.push(DocumentFormat::Pdf);
        }
        if self.email {
            formats.push(DocumentFormat::Eml);
        }
        formats.push(DocumentFormat::Msg);
        formats
    }

    /// Human-readable list of tools that would unlock more functionality.
    pub fn missing_dependencies(&self) -> Vec<String> {
        let mut missing = Vec::new();
        if self.tesseract.is_none() {
            missing.push("tesseract (OCR for scanned PDFs)".to_string());
        }
        if self.pdftoppm.is_none() {
            missing.push("pdftoppm from Poppler (page rasterization for OCR)".to_string());
        }
        if !self.msg_enhanced {
            missing.push("msg-enhanced feature (Outlook library parsing for .msg)".to_string());
        }
        missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_static_discovery_without_tools() {
        let caps = Capabilities::without_tools();
        assert!(!caps.ocr_available());
        assert!(caps.supported_formats().contains(&DocumentFormat::Msg));
        assert_eq!(caps.missing_dependencies().iter().filter(|m| m.contains("tesseract")).count(), 1);
    }

    #[test]
    fn test_ocr_requires_both_tools() {
        let discovery = StaticToolDiscovery {
            tesseract: Some(PathBuf::from("/usr/bin/tesseract")),
            pdftoppm: None,
        };
        let caps = Capabilities::resolve(&discovery);
        assert!(!caps.ocr_available());

        let discovery = StaticToolDiscovery {
            tesseract: Some(PathBuf::from("/usr/bin/tesseract")),
            pdftoppm: Some(PathBuf::from("/usr/bin/pdftoppm")),
        };
        assert!(Capabilities::resolve(&discovery).ocr_available());
    }

    #[test]
    fn test_configured_path_wins() {
        let dir = tempdir().unwrap();
        let fake = dir.path().join("my-tesseract");
        std::fs::write(&fake, b"#!/bin/sh\n").unwrap();

        let config = OcrConfig {
            tesseract_path: Some(fake.clone()),
            ..Default::default()
        };
        let discovery = SystemToolDiscovery::from_config(&config);
        assert_eq!(discovery.locate(TESSERACT), Some(fake));
    }

    #[test]
    fn test_executable_in_checks_directory() {
        let dir = tempdir().unwrap();
        assert!(executable_in(dir.path(), "pdftoppm").is_none());
        std::fs::write(dir.path().join("pdftoppm"), b"").unwrap();
        assert_eq!(executable_in(dir.path(), "pdftoppm"), Some(dir.path().join("pdftoppm")));
    }

    #[cfg(all(feature = "pdf", feature = "email"))]
    #[test]
    fn test_supported_formats_with_default_features() {
        let caps = Capabilities::without_tools();
        assert_eq!(
            caps.supported_formats(),
            vec![DocumentFormat::Pdf, DocumentFormat::Eml, DocumentFormat::Msg]
        );
    }
}
