//! Configuration types for text cleaning.
//!
//! [`CleanOptions`] selects which pipeline stages run; [`BatchConfig`] adds
//! the knobs of the file-level driver (concurrency, output placement,
//! progress reporting). Both are built through consuming builders so callers
//! only set what they care about and rely on documented defaults for the
//! rest.

use crate::error::ReflowError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Options for one cleaning call. Each flag toggles exactly one stage.
///
/// # Example
/// ```rust
/// use reflow_text::CleanOptions;
///
/// let options = CleanOptions::builder()
///     .keep_lines(true)
///     .remove_emoji(true)
///     .build();
/// assert!(options.indent_paragraphs);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanOptions {
    /// Skip Markdown stripping. Default: false.
    pub keep_markdown: bool,

    /// Skip paragraph merging; line breaks survive exactly. Default: false.
    pub keep_lines: bool,

    /// Delete emoji and pictographs. Default: false.
    pub remove_emoji: bool,

    /// Indent paragraphs with two U+3000 spaces. Default: true.
    pub indent_paragraphs: bool,
}

impl Default for CleanOptions {
    fn default() -> Self {
        Self {
            keep_markdown: false,
            keep_lines: false,
            remove_emoji: false,
            indent_paragraphs: true,
        }
    }
}

impl CleanOptions {
    /// Create a new builder starting from the defaults.
    pub fn builder() -> CleanOptionsBuilder {
        CleanOptionsBuilder {
            options: Self::default(),
        }
    }
}

/// Builder for [`CleanOptions`].
#[derive(Debug)]
pub struct CleanOptionsBuilder {
    options: CleanOptions,
}

impl CleanOptionsBuilder {
    pub fn keep_markdown(mut self, v: bool) -> Self {
        self.options.keep_markdown = v;
        self
    }

    pub fn keep_lines(mut self, v: bool) -> Self {
        self.options.keep_lines = v;
        self
    }

    pub fn remove_emoji(mut self, v: bool) -> Self {
        self.options.remove_emoji = v;
        self
    }

    pub fn indent_paragraphs(mut self, v: bool) -> Self {
        self.options.indent_paragraphs = v;
        self
    }

    /// Every combination of flags is valid, so building cannot fail.
    pub fn build(self) -> CleanOptions {
        self.options
    }
}

/// Configuration for cleaning many files.
///
/// Built via [`BatchConfig::builder()`] or using [`BatchConfig::default()`].
///
/// # Example
/// ```rust
/// use reflow_text::{BatchConfig, CleanOptions};
///
/// let config = BatchConfig::builder()
///     .options(CleanOptions::builder().keep_lines(true).build())
///     .concurrency(8)
///     .output_dir("cleaned")
///     .build()
///     .unwrap();
/// assert_eq!(config.concurrency, 8);
/// ```
#[derive(Clone)]
pub struct BatchConfig {
    /// Stage selection applied to every file.
    pub options: CleanOptions,

    /// Files cleaned at once. Default: 4.
    ///
    /// Cleaning is CPU-bound and each file runs on a blocking worker, so
    /// values far above the core count only add scheduling overhead.
    pub concurrency: usize,

    /// Directory receiving cleaned files, named like their inputs.
    /// If None, results are written next to each input with [`Self::suffix`].
    pub output_dir: Option<PathBuf>,

    /// Inserted before the extension of sibling output files. Default: ".clean".
    ///
    /// `notes.md` becomes `notes.clean.md`.
    pub suffix: String,

    /// Write results to disk. Default: true. When false, cleaned text is only
    /// returned in memory.
    pub write_output: bool,

    /// Optional per-file progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            options: CleanOptions::default(),
            concurrency: 4,
            output_dir: None,
            suffix: ".clean".to_string(),
            write_output: true,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for BatchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchConfig")
            .field("options", &self.options)
            .field("concurrency", &self.concurrency)
            .field("output_dir", &self.output_dir)
            .field("suffix", &self.suffix)
            .field("write_output", &self.write_output)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn BatchProgressCallback>"),
            )
            .finish()
    }
}

impl BatchConfig {
    /// Create a new builder for `BatchConfig`.
    pub fn builder() -> BatchConfigBuilder {
        BatchConfigBuilder {
            config: Self::default(),
        }
    }

    /// Where the cleaned version of `input` is written.
    pub fn output_path_for(&self, input: &std::path::Path) -> PathBuf {
        let file_name = input
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "output.txt".into());
        if let Some(dir) = &self.output_dir {
            return dir.join(file_name);
        }
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());
        let name = match input.extension() {
            Some(ext) => format!("{stem}{}.{}", self.suffix, ext.to_string_lossy()),
            None => format!("{stem}{}", self.suffix),
        };
        input.with_file_name(name)
    }
}

/// Builder for [`BatchConfig`].
#[derive(Debug)]
pub struct BatchConfigBuilder {
    config: BatchConfig,
}

impl BatchConfigBuilder {
    pub fn options(mut self, options: CleanOptions) -> Self {
        self.config.options = options;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n;
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = Some(dir.into());
        self
    }

    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.config.suffix = suffix.into();
        self
    }

    pub fn write_output(mut self, v: bool) -> Self {
        self.config.write_output = v;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<BatchConfig, ReflowError> {
        let c = &self.config;
        if c.concurrency == 0 {
            return Err(ReflowError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        if c.write_output && c.output_dir.is_none() && c.suffix.is_empty() {
            return Err(ReflowError::InvalidConfig(
                "An empty suffix without an output directory would overwrite the inputs".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_clean_options_defaults() {
        let o = CleanOptions::default();
        assert!(!o.keep_markdown);
        assert!(!o.keep_lines);
        assert!(!o.remove_emoji);
        assert!(o.indent_paragraphs);
    }

    #[test]
    fn test_clean_options_serde_fills_defaults() {
        let o: CleanOptions = serde_json::from_str(r#"{"keep_lines": true}"#).unwrap();
        assert!(o.keep_lines);
        assert!(o.indent_paragraphs);
    }

    #[test]
    fn test_batch_config_rejects_zero_concurrency() {
        let err = BatchConfig::builder().concurrency(0).build().unwrap_err();
        assert!(matches!(err, ReflowError::InvalidConfig(_)));
    }

    #[test]
    fn test_batch_config_rejects_overwriting_inputs() {
        assert!(BatchConfig::builder().suffix("").build().is_err());
        assert!(BatchConfig::builder()
            .suffix("")
            .output_dir("out")
            .build()
            .is_ok());
        assert!(BatchConfig::builder()
            .suffix("")
            .write_output(false)
            .build()
            .is_ok());
    }

    #[test]
    fn test_output_path_for() {
        let config = BatchConfig::default();
        assert_eq!(
            config.output_path_for(Path::new("docs/notes.md")),
            PathBuf::from("docs/notes.clean.md")
        );
        assert_eq!(
            config.output_path_for(Path::new("README")),
            PathBuf::from("README.clean")
        );

        let config = BatchConfig::builder().output_dir("out").build().unwrap();
        assert_eq!(
            config.output_path_for(Path::new("docs/notes.md")),
            PathBuf::from("out/notes.md")
        );
    }
}
