//! Stage 4: spacing normalization.
//!
//! One space at every CJK ↔ Latin/digit boundary, no space next to
//! full-width punctuation, single spaces elsewhere. Leading indentation is
//! kept as-is; trailing whitespace goes.

use super::blocks::{classify_lines, code_spans, list_marker_len, LineKind};
use super::script::{is_cjk, is_latin_or_digit, space_allowed};

/// Normalize spacing on every prose line and empty every whitespace-only
/// line. Returns the text and the number of edits made.
pub fn normalize(text: &str) -> (String, usize) {
    let lines: Vec<&str> = text.split('\n').collect();
    let kinds = classify_lines(&lines);
    let mut edits = 0;
    let out: Vec<String> = lines
        .iter()
        .zip(&kinds)
        .map(|(line, kind)| match kind {
            LineKind::Prose => {
                let (rewritten, n) = normalize_line(line);
                edits += n;
                rewritten
            }
            LineKind::Blank => {
                edits += usize::from(!line.is_empty());
                String::new()
            }
            LineKind::Code | LineKind::Table => (*line).to_string(),
        })
        .collect();
    (out.join("\n"), edits)
}

fn normalize_line(line: &str) -> (String, usize) {
    let body = line.trim_start();
    let lead = &line[..line.len() - body.len()];
    let trimmed = body.trim_end();
    let mut edits = usize::from(trimmed.len() != body.len());
    let (marker, rest) = trimmed.split_at(list_marker_len(trimmed));

    let mut out = String::with_capacity(line.len() + 8);
    out.push_str(lead);
    out.push_str(marker);
    for (is_code, span) in code_spans(rest) {
        if is_code {
            out.push_str(span);
        } else {
            let (normalized, n) = normalize_span(span);
            edits += n;
            out.push_str(&normalized);
        }
    }
    (out, edits)
}

fn normalize_span(span: &str) -> (String, usize) {
    let mut edits = 0;

    // Collapse blank runs to a single ASCII space.
    let mut collapsed: Vec<char> = Vec::with_capacity(span.len());
    for c in span.chars() {
        if matches!(c, ' ' | '\t' | '\u{3000}' | '\u{00A0}') {
            if collapsed.last() == Some(&' ') {
                edits += 1;
                continue;
            }
            if c != ' ' {
                edits += 1;
            }
            collapsed.push(' ');
        } else {
            collapsed.push(c);
        }
    }

    // Drop spaces that touch full-width punctuation or precede ASCII
    // sentence punctuation.
    let mut kept: Vec<char> = Vec::with_capacity(collapsed.len());
    for (k, &c) in collapsed.iter().enumerate() {
        if c == ' ' {
            if let (Some(&before), Some(&after)) = (kept.last(), collapsed.get(k + 1)) {
                if !space_allowed(before, after) {
                    edits += 1;
                    continue;
                }
            }
        }
        kept.push(c);
    }

    let touching = touches_cjk(&kept);
    let mut out = String::with_capacity(kept.len() * 3);
    for (k, &c) in kept.iter().enumerate() {
        out.push(c);
        let Some(&next) = kept.get(k + 1) else {
            continue;
        };
        let script_boundary =
            (is_cjk(c) && is_latin_or_digit(next)) || (is_latin_or_digit(c) && is_cjk(next));
        let letter_digit = touching[k]
            && touching[k + 1]
            && ((c.is_ascii_alphabetic() && next.is_ascii_digit())
                || (c.is_ascii_digit() && next.is_ascii_alphabetic()));
        if script_boundary || letter_digit {
            out.push(' ');
            edits += 1;
        }
    }
    (out, edits)
}

/// Marks every char that belongs to an ASCII alphanumeric run directly
/// adjacent to a CJK character.
fn touches_cjk(chars: &[char]) -> Vec<bool> {
    let mut marks = vec![false; chars.len()];
    let mut i = 0;
    while i < chars.len() {
        if !chars[i].is_ascii_alphanumeric() {
            i += 1;
            continue;
        }
        let start = i;
        while i < chars.len() && chars[i].is_ascii_alphanumeric() {
            i += 1;
        }
        let left = start > 0 && is_cjk(chars[start - 1]);
        let right = i < chars.len() && is_cjk(chars[i]);
        if left || right {
            marks[start..i].iter_mut().for_each(|m| *m = true);
        }
    }
    marks
}
