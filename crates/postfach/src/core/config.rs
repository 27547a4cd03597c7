//! Configuration loading and management.
//!
//! [`ExtractorConfig`] can be built in code, loaded from TOML, YAML or JSON, or
//! discovered by walking up from the current directory looking for `postfach.toml`.

use crate::core::pool::HARD_WORKER_CEILING;
use crate::{PostfachError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main extractor configuration.
///
/// # Example
///
/// ```rust
/// use postfach::core::config::ExtractorConfig;
///
/// let config = ExtractorConfig::default();
/// assert!(config.normalize_text);
///
/// // let config = ExtractorConfig::from_toml_file("postfach.toml")?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Requested worker count. Capped at the CPU count and at 8.
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Upper bound on the page/OCR join, in seconds
    #[serde(default = "default_timeout_secs")]
    pub extraction_timeout_secs: u64,

    /// Drop pagination noise before thread splitting
    #[serde(default = "default_true")]
    pub normalize_text: bool,

    /// Split recovered PDF text into one record per message
    #[serde(default = "default_true")]
    pub split_threads: bool,

    #[serde(default)]
    pub ocr: OcrConfig,

    #[serde(default)]
    pub attachments: AttachmentConfig,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            extraction_timeout_secs: default_timeout_secs(),
            normalize_text: true,
            split_threads: true,
            ocr: OcrConfig::default(),
            attachments: AttachmentConfig::default(),
        }
    }
}

/// OCR configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    /// Retry text-less PDFs through OCR
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Tesseract language code (e.g., "eng", "deu")
    #[serde(default = "default_eng")]
    pub language: String,

    /// Rasterization resolution handed to pdftoppm
    #[serde(default = "default_dpi")]
    pub dpi: u32,

    /// Explicit tesseract binary; skips discovery when set
    #[serde(default)]
    pub tesseract_path: Option<PathBuf>,

    /// Explicit pdftoppm binary; skips discovery when set
    #[serde(default)]
    pub pdftoppm_path: Option<PathBuf>,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            language: default_eng(),
            dpi: default_dpi(),
            tesseract_path: None,
            pdftoppm_path: None,
        }
    }
}

/// Attachment handling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentConfig {
    /// Convert supported attachments to text
    #[serde(default = "default_true")]
    pub extract_text: bool,

    /// Attachments larger than this are recorded but not converted
    #[serde(default = "default_max_attachment_bytes")]
    pub max_attachment_bytes: usize,
}

impl Default for AttachmentConfig {
    fn default() -> Self {
        Self {
            extract_text: true,
            max_attachment_bytes: default_max_attachment_bytes(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_eng() -> String {
    "eng".to_string()
}
fn default_max_workers() -> usize {
    HARD_WORKER_CEILING
}
fn default_timeout_secs() -> u64 {
    300
}
fn default_dpi() -> u32 {
    300
}
fn default_max_attachment_bytes() -> usize {
    50 * 1024 * 1024
}

impl ExtractorConfig {
    /// Deadline for joining page and OCR tasks.
    pub fn extraction_timeout(&self) -> Duration {
        Duration::from_secs(self.extraction_timeout_secs)
    }

    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;
        toml::from_str(&content)
            .map_err(|e| PostfachError::validation(format!("Invalid TOML in {}: {}", path.as_ref().display(), e)))
    }

    /// Load configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;
        serde_yaml_ng::from_str(&content)
            .map_err(|e| PostfachError::validation(format!("Invalid YAML in {}: {}", path.as_ref().display(), e)))
    }

    /// Load configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;
        serde_json::from_str(&content)
            .map_err(|e| PostfachError::validation(format!("Invalid JSON in {}: {}", path.as_ref().display(), e)))
    }

    /// Load by file extension (`.toml`, `.yaml`/`.yml`, `.json`).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_file(path),
            Some("yaml") | Some("yml") => Self::from_yaml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(PostfachError::validation(format!(
                "Unsupported config file format: {}. Use .toml, .yaml or .json",
                path.display()
            ))),
        }
    }

    /// Walk up from the current directory looking for `postfach.toml`.
    pub fn discover() -> Result<Option<Self>> {
        let current = std::env::current_dir().map_err(PostfachError::Io)?;
        Self::discover_from(&current)
    }

    pub(crate) fn discover_from(start: &Path) -> Result<Option<Self>> {
        let mut current = start.to_path_buf();

        loop {
            let candidate = current.join("postfach.toml");
            if candidate.exists() {
                return Ok(Some(Self::from_toml_file(candidate)?));
            }

            if let Some(parent) = current.parent() {
                current = parent.to_path_buf();
            } else {
                break;
            }
        }

        Ok(None)
    }
}

fn read_config(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| PostfachError::validation(format!("Failed to read config file {}: {}", path.display(), e)))
}
