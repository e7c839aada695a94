//! Result types returned by the cleaning entry points.

use crate::error::FileError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Cleaned text plus its quality report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanOutput {
    pub text: String,
    pub report: ScoreReport,
}

/// Readiness bucket derived from the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    /// Score below 40.
    Draft,
    /// Score in `[40, 75)`.
    Improved,
    /// Score of 75 or more.
    DeliveryReady,
}

impl Status {
    pub const IMPROVED_THRESHOLD: f64 = 40.0;
    pub const DELIVERY_THRESHOLD: f64 = 75.0;

    pub fn from_score(score: f64) -> Self {
        if score >= Self::DELIVERY_THRESHOLD {
            Status::DeliveryReady
        } else if score >= Self::IMPROVED_THRESHOLD {
            Status::Improved
        } else {
            Status::Draft
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Status::Draft => "draft",
            Status::Improved => "improved",
            Status::DeliveryReady => "delivery-ready",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-category noise signals measured in one text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoiseCounts {
    /// Markdown markers that stripping would remove or rewrite.
    pub markdown_markers: usize,
    /// Repeated tokens that would collapse.
    pub duplicate_tokens: usize,
    /// Runs of repeated punctuation.
    pub punctuation_runs: usize,
    /// Marks whose width disagrees with the surrounding script.
    pub punctuation_width: usize,
    /// Missing, doubled or misplaced spaces.
    pub spacing: usize,
    /// Line breaks that interrupt a sentence.
    pub broken_line_breaks: usize,
}

impl NoiseCounts {
    /// Markdown markers weigh double: removing one can expose up to two
    /// other defects (a spacing gap and a broken break), and the weighting
    /// keeps the score from dropping when a marker is stripped.
    pub fn weighted_total(&self) -> usize {
        2 * self.markdown_markers
            + self.duplicate_tokens
            + self.punctuation_runs
            + self.punctuation_width
            + self.spacing
            + self.broken_line_breaks
    }

    /// Category-wise `self - after`, floored at zero.
    pub fn saturating_sub(&self, after: &NoiseCounts) -> NoiseCounts {
        NoiseCounts {
            markdown_markers: self.markdown_markers.saturating_sub(after.markdown_markers),
            duplicate_tokens: self.duplicate_tokens.saturating_sub(after.duplicate_tokens),
            punctuation_runs: self.punctuation_runs.saturating_sub(after.punctuation_runs),
            punctuation_width: self.punctuation_width.saturating_sub(after.punctuation_width),
            spacing: self.spacing.saturating_sub(after.spacing),
            broken_line_breaks: self.broken_line_breaks.saturating_sub(after.broken_line_breaks),
        }
    }
}

/// Diagnostic quality report for one cleaning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    /// 0–100, one decimal.
    pub score: f64,
    pub status: Status,
    /// What was fixed, in pipeline order.
    pub notes: Vec<String>,
    /// What still looks wrong.
    pub warnings: Vec<String>,
    /// Signals removed, per category.
    pub removed: NoiseCounts,
    /// Signals left in the cleaned text, per category.
    pub remaining: NoiseCounts,
}

/// Outcome of cleaning one file in a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileResult {
    /// 0-based position in the caller's list.
    pub index: usize,
    pub input: PathBuf,
    /// Where the cleaned text was written, if the batch writes output.
    pub output: Option<PathBuf>,
    /// Characters read from `input`.
    pub chars_in: usize,
    /// Cleaned text (empty when `error` is set).
    pub text: String,
    pub report: Option<ScoreReport>,
    pub duration_ms: u64,
    pub error: Option<FileError>,
}

/// Aggregate numbers for a batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchStats {
    pub total_files: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub chars_in: usize,
    pub chars_out: usize,
    /// Mean score over the files that succeeded.
    pub mean_score: f64,
    pub duration_ms: u64,
}

/// Every file's result, in input order, plus aggregate stats.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOutput {
    pub files: Vec<FileResult>,
    pub stats: BatchStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_thresholds() {
        assert_eq!(Status::from_score(0.0), Status::Draft);
        assert_eq!(Status::from_score(39.9), Status::Draft);
        assert_eq!(Status::from_score(40.0), Status::Improved);
        assert_eq!(Status::from_score(74.9), Status::Improved);
        assert_eq!(Status::from_score(75.0), Status::DeliveryReady);
        assert_eq!(Status::from_score(100.0), Status::DeliveryReady);
    }

    #[test]
    fn test_weighted_total() {
        let counts = NoiseCounts {
            markdown_markers: 2,
            spacing: 3,
            ..Default::default()
        };
        assert_eq!(counts.weighted_total(), 7);
    }

    #[test]
    fn test_status_serializes_kebab_case() {
        let json = serde_json::to_string(&Status::DeliveryReady).unwrap();
        assert_eq!(json, "\"delivery-ready\"");
    }
}
