//! Async entry points.
//!
//! The pipeline itself is synchronous and CPU bound, so every async call runs
//! it on the blocking pool. The `_sync` wrappers drive the async functions on
//! one shared runtime.
//!
//! # Functions
//!
//! - [`extract_file`] - Extract one file
//! - [`extract_bytes`] - Extract one in-memory buffer
//! - [`batch_extract_file`] - Extract many files concurrently, results in input order

use crate::core::io::{file_name_of, read_file_async, validate_file_exists};
use crate::core::pipeline::{Extractor, failure_record};
use crate::types::ExtractionResult;
use crate::{PostfachError, Result};
use once_cell::sync::Lazy;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Global Tokio runtime for the synchronous wrappers.
///
/// Created on first use. Runtime creation only fails when the process is out
/// of threads or memory, and then nothing else would work either.
static GLOBAL_RUNTIME: Lazy<tokio::runtime::Runtime> = Lazy::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to create global Tokio runtime - system may be out of resources")
});

fn join_error(err: tokio::task::JoinError) -> PostfachError {
    PostfachError::extraction_with_source(format!("Extraction task failed: {}", err), err)
}

/// Extract a file without blocking the async executor.
///
/// The file is read with async I/O; parsing runs on the blocking pool.
pub async fn extract_file(extractor: &Arc<Extractor>, path: impl AsRef<Path>) -> Result<ExtractionResult> {
    let path = path.as_ref();
    validate_file_exists(path)?;
    extractor.router().route(path)?;
    let bytes = read_file_async(path).await?;
    extract_bytes(extractor, bytes, &file_name_of(path)).await
}

/// Extract an owned buffer without blocking the async executor.
pub async fn extract_bytes(extractor: &Arc<Extractor>, bytes: Vec<u8>, filename: &str) -> Result<ExtractionResult> {
    let filename = filename.to_string();
    let extractor = Arc::clone(extractor);
    tokio::task::spawn_blocking(move || extractor.extract_bytes(&bytes, &filename))
        .await
        .map_err(join_error)?
}

/// Extract many files, at most `max_workers` at a time.
///
/// Per-file failures come back as error records in their slot. IO errors
/// fail the whole batch.
pub async fn batch_extract_file(extractor: &Arc<Extractor>, paths: Vec<impl AsRef<Path>>) -> Result<Vec<ExtractionResult>> {
    use tokio::sync::Semaphore;
    use tokio::task::JoinSet;

    if paths.is_empty() {
        return Ok(vec![]);
    }

    let semaphore = Arc::new(Semaphore::new(extractor.max_workers()));
    let mut tasks = JoinSet::new();

    for (index, path) in paths.into_iter().enumerate() {
        let path: PathBuf = path.as_ref().to_path_buf();
        let extractor = Arc::clone(extractor);
        let semaphore = Arc::clone(&semaphore);

        tasks.spawn(async move {
            let result = match semaphore.acquire_owned().await {
                Ok(_permit) => extract_file(&extractor, &path).await,
                Err(err) => Err(PostfachError::extraction_with_source("Batch semaphore closed", err)),
            };
            (index, path, result)
        });
    }

    let mut results: Vec<Option<ExtractionResult>> = vec![None; tasks.len()];

    while let Some(task_result) = tasks.join_next().await {
        match task_result {
            Ok((index, _, Ok(result))) => {
                results[index] = Some(result);
            }
            Ok((index, path, Err(err))) => {
                if matches!(err, PostfachError::Io(_)) {
                    return Err(err);
                }
                results[index] = Some(failure_record(&file_name_of(&path), &err));
            }
            Err(join_err) => {
                return Err(join_error(join_err));
            }
        }
    }

    #[allow(clippy::unwrap_used)]
    Ok(results.into_iter().map(|r| r.unwrap()).collect())
}

/// Synchronous wrapper for [`extract_file`].
pub fn extract_file_sync(extractor: &Arc<Extractor>, path: impl AsRef<Path>) -> Result<ExtractionResult> {
    GLOBAL_RUNTIME.block_on(extract_file(extractor, path))
}

/// Synchronous wrapper for [`extract_bytes`].
pub fn extract_bytes_sync(extractor: &Arc<Extractor>, bytes: Vec<u8>, filename: &str) -> Result<ExtractionResult> {
    GLOBAL_RUNTIME.block_on(extract_bytes(extractor, bytes, filename))
}

/// Synchronous wrapper for [`batch_extract_file`].
pub fn batch_extract_file_sync(extractor: &Arc<Extractor>, paths: Vec<impl AsRef<Path>>) -> Result<Vec<ExtractionResult>> {
    GLOBAL_RUNTIME.block_on(batch_extract_file(extractor, paths))
}
