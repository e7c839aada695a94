//! In-memory cleaning entry points.
//!
//! These are pure and synchronous: no I/O, no shared state. For files use
//! [`crate::batch`].

use crate::config::CleanOptions;
use crate::error::ReflowError;
use crate::output::CleanOutput;
use crate::pipeline;
use crate::score::score;
use tracing::debug;

fn require_text<'a>(text: impl Into<Option<&'a str>>) -> Result<&'a str, ReflowError> {
    text.into().ok_or_else(|| ReflowError::InvalidInput {
        reason: "no text supplied (null)".to_string(),
    })
}

/// Clean `text` with the stages `options` enable.
///
/// `text` accepts `&str` or `Option<&str>`; `None` stands for a missing
/// input and is the only failure.
///
/// # Example
/// ```rust
/// use reflow_text::{clean, CleanOptions};
///
/// let out = clean("支持Python3.11", &CleanOptions::default()).unwrap();
/// assert_eq!(out, "支持 Python 3.11");
/// ```
pub fn clean<'a>(
    text: impl Into<Option<&'a str>>,
    options: &CleanOptions,
) -> Result<String, ReflowError> {
    let text = require_text(text)?;
    let cleaned = pipeline::run(text, options);
    debug!(
        chars_in = text.chars().count(),
        chars_out = cleaned.chars().count(),
        "cleaned text"
    );
    Ok(cleaned)
}

/// Clean `text` and score the result against the original.
///
/// # Example
/// ```rust
/// use reflow_text::{process, CleanOptions, Status};
///
/// let out = process("## 标题\n**重点**内容", &CleanOptions::default()).unwrap();
/// assert!(!out.text.contains("**"));
/// assert_eq!(out.report.status, Status::DeliveryReady);
/// ```
pub fn process<'a>(
    text: impl Into<Option<&'a str>>,
    options: &CleanOptions,
) -> Result<CleanOutput, ReflowError> {
    let text = require_text(text)?;
    let cleaned = clean(text, options)?;
    let report = score(text, &cleaned);
    Ok(CleanOutput {
        text: cleaned,
        report,
    })
}
