//! File I/O helpers.

use crate::{PostfachError, Result};
use std::path::Path;

/// `FileNotFound` when `path` does not exist.
pub fn validate_file_exists(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(PostfachError::FileNotFound(path.display().to_string()));
    }
    Ok(())
}

/// Read a file synchronously. I/O errors bubble up unchanged.
pub fn read_file_sync(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    std::fs::read(path.as_ref()).map_err(PostfachError::Io)
}

/// Read a file asynchronously. I/O errors bubble up unchanged.
#[cfg(feature = "tokio-runtime")]
pub async fn read_file_async(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    tokio::fs::read(path.as_ref()).await.map_err(PostfachError::Io)
}

/// Final path component, used to pick the format.
pub fn file_name_of(path: impl AsRef<Path>) -> String {
    path.as_ref()
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
