//! Error types for the reflow-text library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ReflowError`]: **Fatal**: the call cannot proceed at all (null
//!   input, bad configuration, every file in a batch failed). Returned as
//!   `Err(ReflowError)` from the top-level functions.
//!
//! * [`FileError`]: **Non-fatal**: one file of a batch could not be read
//!   or written while the others are fine. Stored inside
//!   [`crate::output::FileResult`] so callers can inspect partial success
//!   rather than losing the whole batch to one bad file.
//!
//! The text pipeline itself is total: the only error it raises is
//! [`ReflowError::InvalidInput`] for a missing text.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the reflow-text library.
#[derive(Debug, Error)]
pub enum ReflowError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// No text was supplied.
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists but reading it failed.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed, or a batch was started with no files.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Batch errors ──────────────────────────────────────────────────────
    /// Every file of a batch failed; there is nothing to return.
    #[error("All {total} files failed.\nFirst error: {first_error}")]
    AllFilesFailed { total: usize, first_error: String },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error (e.g. a worker task panicked).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ReflowError {
    /// Convert into the per-file form stored in batch results.
    pub fn into_file_error(self, index: usize) -> FileError {
        match self {
            ReflowError::FileNotFound { path } => FileError::NotFound { index, path },
            ReflowError::PermissionDenied { path } => FileError::PermissionDenied { index, path },
            ReflowError::ReadFailed { path, source } => FileError::ReadFailed {
                index,
                path,
                detail: source.to_string(),
            },
            ReflowError::OutputWriteFailed { path, source } => FileError::WriteFailed {
                index,
                path,
                detail: source.to_string(),
            },
            other => FileError::Failed {
                index,
                detail: other.to_string(),
            },
        }
    }
}

/// A non-fatal error for a single file in a batch.
///
/// The batch continues unless ALL files fail. `index` is the 0-based
/// position of the file in the caller's list.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum FileError {
    #[error("File {index}: '{path}' not found")]
    NotFound { index: usize, path: PathBuf },

    #[error("File {index}: permission denied reading '{path}'")]
    PermissionDenied { index: usize, path: PathBuf },

    #[error("File {index}: failed to read '{path}': {detail}")]
    ReadFailed {
        index: usize,
        path: PathBuf,
        detail: String,
    },

    #[error("File {index}: failed to write '{path}': {detail}")]
    WriteFailed {
        index: usize,
        path: PathBuf,
        detail: String,
    },

    #[error("File {index}: {detail}")]
    Failed { index: usize, detail: String },
}

impl FileError {
    /// 0-based position of the failed file in the batch.
    pub fn index(&self) -> usize {
        match self {
            FileError::NotFound { index, .. }
            | FileError::PermissionDenied { index, .. }
            | FileError::ReadFailed { index, .. }
            | FileError::WriteFailed { index, .. }
            | FileError::Failed { index, .. } => *index,
        }
    }
}
