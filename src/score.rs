//! Quality scorer: how much noise did cleaning remove, and how much is left?
//!
//! Noise is measured with the same detectors the stages use, so a category
//! the pipeline fixed completely measures zero in the cleaned text. The
//! score rewards the weighted reduction and subtracts a small penalty for
//! residual noise relative to the text length.

use crate::output::{NoiseCounts, ScoreReport, Status};
use crate::pipeline::blocks::{classify_lines, LineKind};
use crate::pipeline::{input, markdown, noise, paragraphs, punctuation, spacing};

/// Characters of original text per penalty unit.
const CHARS_PER_UNIT: usize = 200;
/// Largest penalty residual noise can cost.
const MAX_PENALTY: f64 = 25.0;
/// Penalty per residual signal per unit.
const PENALTY_PER_SIGNAL: f64 = 5.0;

/// Count noise signals in `text`.
pub fn measure(text: &str) -> NoiseCounts {
    let canonical = input::canonicalize(text);
    let (_, stats) = noise::collapse(&canonical);
    NoiseCounts {
        markdown_markers: markdown::count_markers(&canonical),
        duplicate_tokens: stats.duplicates,
        punctuation_runs: stats.runs,
        punctuation_width: punctuation::unify(&canonical).1,
        spacing: spacing::normalize(&canonical).1,
        broken_line_breaks: paragraphs::count_broken_breaks(&canonical),
    }
}

/// Score a cleaning of `original` into `cleaned`. Never fails.
pub fn score(original: &str, cleaned: &str) -> ScoreReport {
    let before = measure(original);
    let remaining = measure(cleaned);
    let removed = before.saturating_sub(&remaining);

    if original.trim().is_empty() {
        return ScoreReport {
            score: 0.0,
            status: Status::Draft,
            notes: Vec::new(),
            warnings: vec!["input is empty".to_string()],
            removed,
            remaining,
        };
    }

    let b = before.weighted_total();
    let a = remaining.weighted_total();
    let reduction = if b == 0 {
        1.0
    } else {
        b.saturating_sub(a) as f64 / b as f64
    };
    let units = (original.chars().count() / CHARS_PER_UNIT).max(1);
    let penalty = (PENALTY_PER_SIGNAL * a as f64 / units as f64).min(MAX_PENALTY);
    let raw = (100.0 * reduction - penalty).clamp(0.0, 100.0);
    let score = (raw * 10.0).round() / 10.0;

    let mut warnings = Vec::new();
    if a > 0 {
        warnings.push(plural(a, "noise signal remains", "noise signals remain"));
    }
    let mixed = mixed_punctuation_lines(cleaned);
    if mixed > 0 {
        warnings.push(plural(
            mixed,
            "line mixes CJK and ASCII punctuation",
            "lines mix CJK and ASCII punctuation",
        ));
    }

    ScoreReport {
        score,
        status: Status::from_score(score),
        notes: notes(&removed),
        warnings,
        removed,
        remaining,
    }
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

fn notes(removed: &NoiseCounts) -> Vec<String> {
    [
        (removed.markdown_markers, "stripped", "Markdown marker", "Markdown markers"),
        (removed.duplicate_tokens, "removed", "duplicate token", "duplicate tokens"),
        (removed.punctuation_runs, "collapsed", "punctuation run", "punctuation runs"),
        (removed.punctuation_width, "unified", "punctuation mark", "punctuation marks"),
        (removed.spacing, "fixed", "spacing issue", "spacing issues"),
        (removed.broken_line_breaks, "merged", "broken line break", "broken line breaks"),
    ]
    .into_iter()
    .filter(|(n, ..)| *n > 0)
    .map(|(n, verb, one, many)| format!("{verb} {}", plural(n, one, many)))
    .collect()
}

fn is_cjk_punct(c: char) -> bool {
    matches!(c, '，' | '。' | '！' | '？' | '；' | '：' | '、')
}

/// ASCII punctuation used as prose punctuation, not inside `3.11`,
/// `std::fmt` or an ellipsis.
fn is_prose_ascii_punct(chars: &[char], i: usize) -> bool {
    if !matches!(chars[i], ',' | '.' | '!' | '?' | ';' | ':') {
        return false;
    }
    let prev = i.checked_sub(1).map(|p| chars[p]);
    let next = chars.get(i + 1).copied();
    let inside_word = prev.is_some_and(|c| c.is_ascii_alphanumeric() || c == chars[i])
        && next.is_some_and(|c| c.is_ascii_alphanumeric() || c == chars[i]);
    let in_run = prev == Some(chars[i]) || next == Some(chars[i]);
    !(inside_word || in_run)
}

/// Prose lines that use both CJK and ASCII punctuation.
fn mixed_punctuation_lines(text: &str) -> usize {
    let lines: Vec<&str> = text.split('\n').collect();
    let kinds = classify_lines(&lines);
    lines
        .iter()
        .zip(&kinds)
        .filter(|(_, kind)| **kind == LineKind::Prose)
        .filter(|(line, _)| {
            let chars: Vec<char> = line.chars().collect();
            let has_cjk = chars.iter().any(|c| is_cjk_punct(*c));
            let has_ascii = (0..chars.len()).any(|i| is_prose_ascii_punct(&chars, i));
            has_cjk && has_ascii
        })
        .count()
}
