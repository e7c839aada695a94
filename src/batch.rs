//! File-level entry points: one file, or many files concurrently.
//!
//! Cleaning is CPU-bound, so each file runs on a tokio blocking worker and
//! `buffer_unordered` bounds how many run at once. A file that cannot be
//! read or written becomes a [`FileError`] inside its [`FileResult`]; the
//! batch only fails as a whole when no file succeeded.
//!
//! Use [`crate::stream::clean_files_stream`] instead to receive results as
//! files complete.

use crate::clean::process;
use crate::config::{BatchConfig, CleanOptions};
use crate::error::ReflowError;
use crate::output::{BatchOutput, BatchStats, CleanOutput, FileResult};
use futures::stream::{self, StreamExt};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Clean one file and return the result without writing anything.
///
/// The file is decoded as UTF-8, replacing invalid sequences.
///
/// # Errors
/// - [`ReflowError::FileNotFound`] / [`ReflowError::PermissionDenied`] /
///   [`ReflowError::ReadFailed`] when the file cannot be read
pub async fn clean_file(
    path: impl AsRef<Path>,
    options: &CleanOptions,
) -> Result<CleanOutput, ReflowError> {
    let path = path.as_ref().to_path_buf();
    let options = *options;
    run_blocking(move || clean_path(&path, None, &options).map(|(_, out)| out)).await
}

/// Clean `input` and write the result to `output`.
///
/// Uses atomic write (temp file in the target directory + rename) so a
/// crash never leaves a half-written file behind.
pub async fn clean_to_file(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    options: &CleanOptions,
) -> Result<CleanOutput, ReflowError> {
    let input = input.as_ref().to_path_buf();
    let output = output.as_ref().to_path_buf();
    let options = *options;
    run_blocking(move || clean_path(&input, Some(&output), &options).map(|(_, out)| out)).await
}

/// Clean many files concurrently.
///
/// Results come back in input order regardless of completion order.
///
/// # Errors
/// - [`ReflowError::InvalidConfig`] for an empty path list
/// - [`ReflowError::AllFilesFailed`] when no file could be cleaned
pub async fn clean_files<P: AsRef<Path>>(
    paths: &[P],
    config: &BatchConfig,
) -> Result<BatchOutput, ReflowError> {
    let started = Instant::now();
    let total = paths.len();
    if total == 0 {
        return Err(ReflowError::InvalidConfig("no input files given".into()));
    }
    info!(
        "Cleaning {} files (concurrency {})",
        total, config.concurrency
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total);
    }

    let mut files: Vec<FileResult> = stream::iter(paths.iter().enumerate().map(|(index, p)| {
        clean_one(index, total, p.as_ref().to_path_buf(), config.clone())
    }))
    .buffer_unordered(config.concurrency)
    .collect()
    .await;
    files.sort_by_key(|f| f.index);

    let stats = batch_stats(&files, started);

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(total, stats.succeeded);
    }

    if stats.succeeded == 0 {
        let first_error = files
            .iter()
            .find_map(|f| f.error.as_ref())
            .map(|e| e.to_string())
            .unwrap_or_else(|| "Unknown error".to_string());
        return Err(ReflowError::AllFilesFailed { total, first_error });
    }

    info!(
        "Batch complete: {}/{} files, {}ms total",
        stats.succeeded, total, stats.duration_ms
    );

    Ok(BatchOutput { files, stats })
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Clean one file of a batch, reporting progress. Never fails: errors are
/// stored in the result.
pub(crate) async fn clean_one(
    index: usize,
    total: usize,
    input: PathBuf,
    config: BatchConfig,
) -> FileResult {
    let started = Instant::now();
    if let Some(ref cb) = config.progress_callback {
        cb.on_file_start(index, total, &input);
    }

    let output = config
        .write_output
        .then(|| config.output_path_for(&input));
    let result = {
        let input = input.clone();
        let output = output.clone();
        let options = config.options;
        run_blocking(move || clean_path(&input, output.as_deref(), &options)).await
    };
    let duration_ms = started.elapsed().as_millis() as u64;

    match result {
        Ok((chars_in, out)) => {
            let chars_out = out.text.chars().count();
            debug!(
                "Cleaned {} ({} → {} chars, score {}) in {}ms",
                input.display(),
                chars_in,
                chars_out,
                out.report.score,
                duration_ms
            );
            if let Some(ref cb) = config.progress_callback {
                cb.on_file_complete(index, total, chars_out);
            }
            FileResult {
                index,
                input,
                output,
                chars_in,
                text: out.text,
                report: Some(out.report),
                duration_ms,
                error: None,
            }
        }
        Err(e) => {
            warn!("Failed to clean {}: {}", input.display(), e);
            let error = e.into_file_error(index);
            if let Some(ref cb) = config.progress_callback {
                cb.on_file_error(index, total, &error.to_string());
            }
            FileResult {
                index,
                input,
                output: None,
                chars_in: 0,
                text: String::new(),
                report: None,
                duration_ms,
                error: Some(error),
            }
        }
    }
}

fn batch_stats(files: &[FileResult], started: Instant) -> BatchStats {
    let ok: Vec<&FileResult> = files.iter().filter(|f| f.error.is_none()).collect();
    let scores: Vec<f64> = ok
        .iter()
        .filter_map(|f| f.report.as_ref().map(|r| r.score))
        .collect();
    let mean_score = if scores.is_empty() {
        0.0
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    };
    BatchStats {
        total_files: files.len(),
        succeeded: ok.len(),
        failed: files.len() - ok.len(),
        chars_in: ok.iter().map(|f| f.chars_in).sum(),
        chars_out: ok.iter().map(|f| f.text.chars().count()).sum(),
        mean_score,
        duration_ms: started.elapsed().as_millis() as u64,
    }
}

/// Run CPU-bound work on the blocking pool.
async fn run_blocking<T, F>(work: F) -> Result<T, ReflowError>
where
    F: FnOnce() -> Result<T, ReflowError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ReflowError::Internal(format!("worker task failed: {e}")))?
}

/// Read, clean and optionally write one file. Returns the input's character
/// count alongside the output.
fn clean_path(
    input: &Path,
    output: Option<&Path>,
    options: &CleanOptions,
) -> Result<(usize, CleanOutput), ReflowError> {
    let text = read_text(input)?;
    let out = process(text.as_str(), options)?;
    if let Some(path) = output {
        write_atomic(path, &with_final_newline(&out.text))?;
    }
    Ok((text.chars().count(), out))
}

/// Read a file as UTF-8, replacing invalid sequences.
pub(crate) fn read_text(path: &Path) -> Result<String, ReflowError> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) => Err(match e.kind() {
            ErrorKind::NotFound => ReflowError::FileNotFound {
                path: path.to_path_buf(),
            },
            ErrorKind::PermissionDenied => ReflowError::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => ReflowError::ReadFailed {
                path: path.to_path_buf(),
                source: e,
            },
        }),
    }
}

/// Write via a temp file in the target directory, then rename over `path`.
pub(crate) fn write_atomic(path: &Path, contents: &str) -> Result<(), ReflowError> {
    let write_err = |source: std::io::Error| ReflowError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(write_err)?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(write_err)?;
    tmp.write_all(contents.as_bytes()).map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

fn with_final_newline(text: &str) -> String {
    if text.is_empty() || text.ends_with('\n') {
        text.to_string()
    } else {
        format!("{text}\n")
    }
}
