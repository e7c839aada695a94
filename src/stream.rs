//! Streaming batch API: emit file results as they complete.
//!
//! Unlike the eager [`crate::batch::clean_files`], which returns only after
//! every file finishes, [`clean_files_stream`] yields each file's result as
//! soon as it is ready. Results arrive in completion order; sort by
//! [`FileResult::index`] if order matters.

use crate::batch::clean_one;
use crate::config::BatchConfig;
use crate::error::{FileError, ReflowError};
use crate::output::FileResult;
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::pin::Pin;
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of file results.
pub type FileStream = Pin<Box<dyn Stream<Item = Result<FileResult, FileError>> + Send>>;

/// Clean many files, streaming results as they are ready.
///
/// `on_batch_complete` is not called: the caller decides when the stream
/// is done.
///
/// # Returns
/// - `Ok(FileStream)`: a stream of `Result<FileResult, FileError>`
/// - `Err(ReflowError::InvalidConfig)`: empty path list
///
/// # Example
/// ```rust,no_run
/// use reflow_text::{clean_files_stream, BatchConfig};
/// use futures::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = BatchConfig::builder().write_output(false).build()?;
/// let mut stream = clean_files_stream(&["a.md", "b.md"], &config)?;
/// while let Some(file) = stream.next().await {
///     match file {
///         Ok(f) => println!("{}: {}", f.input.display(), f.text),
///         Err(e) => eprintln!("Error: {e}"),
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub fn clean_files_stream<P: AsRef<Path>>(
    paths: &[P],
    config: &BatchConfig,
) -> Result<FileStream, ReflowError> {
    let paths: Vec<PathBuf> = paths.iter().map(|p| p.as_ref().to_path_buf()).collect();
    let total = paths.len();
    if total == 0 {
        return Err(ReflowError::InvalidConfig("no input files given".into()));
    }
    info!("Starting streaming batch: {} files", total);

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total);
    }

    let config = config.clone();
    let concurrency = config.concurrency;
    let s = stream::iter(paths.into_iter().enumerate().map(move |(index, path)| {
        let cfg = config.clone();
        async move {
            let mut result = clean_one(index, total, path, cfg).await;
            match result.error.take() {
                None => Ok(result),
                Some(err) => Err(err),
            }
        }
    }))
    .buffer_unordered(concurrency);

    Ok(Box::pin(s))
}
