//! # reflow-text
//!
//! Normalize LLM-generated text into clean prose ready to paste into a
//! document.
//!
//! ## Why this crate?
//!
//! Chat models answer in Markdown, stutter tokens under load, mix half- and
//! full-width punctuation, forget the space between Chinese and English and
//! break lines in the middle of sentences. Pasted into a report, all of that
//! is noise. This crate removes it with a fixed sequence of small, pure
//! stages that leave code untouched and only repair the shape of tables,
//! then scores how much noise was removed and how much remains.
//!
//! ## Pipeline Overview
//!
//! ```text
//! text
//!  │
//!  ├─ 0. Input        line endings, invisible characters, full-width ASCII
//!  ├─ 1. Markdown     strip headings, emphasis, links; normalize list markers
//!  ├─ 2. Duplicates   collapse stuttered tokens and punctuation runs
//!  ├─ 3. Punctuation  width follows the surrounding script
//!  ├─ 4. Spacing      CJK ↔ Latin spacing, collapse and trim whitespace
//!  ├─ 5. Paragraphs   join broken lines, collapse blank lines
//!  ├─ 6. Indentation  two ideographic spaces per paragraph
//!  └─ 7. Emoji        optional removal, then re-run 2–6
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use reflow_text::{process, CleanOptions};
//!
//! let out = process("## 结论\n\n**Rust**很快!!", &CleanOptions::default()).unwrap();
//! println!("{}", out.text);
//! eprintln!("score {} ({})", out.report.score, out.report.status);
//! ```
//!
//! Files are cleaned on tokio's blocking pool:
//!
//! ```rust,no_run
//! use reflow_text::{clean_files, BatchConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = BatchConfig::builder().output_dir("cleaned").build()?;
//!     let batch = clean_files(&["a.md", "b.md"], &config).await?;
//!     eprintln!("{}/{} files, mean score {:.1}",
//!         batch.stats.succeeded, batch.stats.total_files, batch.stats.mean_score);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `reflow` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! reflow-text = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod batch;
pub mod clean;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod score;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use batch::{clean_file, clean_files, clean_to_file};
pub use clean::{clean, process};
pub use config::{BatchConfig, BatchConfigBuilder, CleanOptions, CleanOptionsBuilder};
pub use error::{FileError, ReflowError};
pub use output::{BatchOutput, BatchStats, CleanOutput, FileResult, NoiseCounts, ScoreReport, Status};
pub use pipeline::Stage;
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
pub use score::{measure, score};
pub use stream::{clean_files_stream, FileStream};
