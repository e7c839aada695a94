//! Stage 1: Markdown stripping.
//!
//! LLM answers are written in Markdown even when the reader wants plain
//! prose. This stage removes the markup and keeps the text it decorates.
//! Rules run per paragraph (a run of non-blank prose lines) so emphasis can
//! span a soft line break but never a blank line, and they repeat until the
//! paragraph stops changing so nested markup (`**[label](url)**`) unwraps
//! completely.
//!
//! Every rule either removes characters or keeps a capture, and no rule
//! removes a `\n`, so a paragraph keeps its line count. The caller relies on
//! that to map stripped lines back to their positions.
//!
//! Marker separators accept U+3000 and U+00A0 as well as spaces and tabs:
//! spacing later folds both into a plain space, and a marker that only
//! appears after that would be stripped by the next run.

use super::blocks::{classify_lines, normalize_tables, prose_runs, LineKind};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Fixed-point cap; real nesting never gets close.
const MAX_PASSES: usize = 16;

static RE_QUOTE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]*>[ \t]?").unwrap());

static RE_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]{0,3}#{1,6}(?:[ \t\x{3000}\x{A0}]+|$)").unwrap());

/// A heading, possibly behind blockquote markers.
static RE_HEADING_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[ \t]*>[ \t]?)*[ \t]{0,3}#{1,6}(?:[ \t\x{3000}\x{A0}]+|$)").unwrap()
});

static RE_BULLET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^([ \t]*)[-*+•·●▪◦‣⁃][ \t\x{3000}\x{A0}]+").unwrap());

static RE_ORDERED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^([ \t]*)(?:[(（](\d{1,3})[)）]|(\d{1,3})[)、])[ \t\x{3000}\x{A0}]*").unwrap()
});

static RE_IMAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"!\[[^\]\n]*\]\([^)\n]*\)").unwrap());

static RE_LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\]\n]+)\]\([^)\n]*\)").unwrap());

static RE_AUTOLINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<((?:https?|ftp)://[^>\s]+)>").unwrap());

/// Like emphasis, a code span may cross a soft break inside its paragraph.
static RE_INLINE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`]+)`").unwrap());

static RE_BOLD_STAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*\*([^*\s](?:[^*]*[^*\s])?)\*\*").unwrap());

static RE_BOLD_UNDERSCORE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"__([^_\s](?:[^_]*[^_\s])?)__").unwrap());

static RE_STRIKE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"~~([^~\s](?:[^~]*[^~\s])?)~~").unwrap());

static RE_ITALIC_STAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*([^*\s](?:[^*]*[^*\s])?)\*").unwrap());

static RE_ITALIC_UNDERSCORE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_([^_\s](?:[^_]*[^_\s])?)_").unwrap());

/// Strip Markdown from every prose paragraph and repair broken tables.
///
/// Returns the stripped text and the number of markers removed or rewritten
/// (a repaired table counts once). With `keep_lines == false` a stripped
/// heading is fenced by blank lines so paragraph merging keeps it on its
/// own, and a table missing its header separator gets one.
pub fn strip(text: &str, keep_lines: bool) -> (String, usize) {
    let (text, mut count) = normalize_tables(text, !keep_lines);
    let lines: Vec<&str> = text.split('\n').collect();
    let kinds = classify_lines(&lines);
    let mut out: Vec<String> = lines.iter().map(|l| (*l).to_string()).collect();
    let mut headings = vec![false; lines.len()];

    // Thematic breaks go first: `* * *` would otherwise read as a bullet.
    for (i, kind) in kinds.iter().enumerate() {
        if *kind != LineKind::Prose {
            continue;
        }
        if is_thematic_break(lines[i]) {
            out[i].clear();
            count += 1;
        } else if RE_HEADING_LINE.is_match(lines[i]) {
            headings[i] = true;
        }
    }

    let kinds: Vec<LineKind> = kinds
        .iter()
        .zip(&out)
        .map(|(kind, line)| match kind {
            LineKind::Prose if line.trim().is_empty() => LineKind::Blank,
            other => *other,
        })
        .collect();

    for run in prose_runs(&kinds) {
        let block = out[run.clone()].join("\n");
        let stripped = strip_paragraph(&block, &mut count);
        for (slot, line) in out[run].iter_mut().zip(stripped.split('\n')) {
            *slot = line.to_string();
        }
    }

    if !keep_lines {
        out = separate_headings(out, &headings);
    }
    (out.join("\n"), count)
}

/// Number of Markdown markers `strip` would remove from `text`.
pub fn count_markers(text: &str) -> usize {
    strip(text, true).1
}

fn strip_paragraph(block: &str, count: &mut usize) -> String {
    let mut current = block.to_string();
    for _ in 0..MAX_PASSES {
        let next = strip_once(&current, count);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

fn strip_once(block: &str, count: &mut usize) -> String {
    let s = replace_counted(&RE_QUOTE, block, count, |_| String::new());
    let s = replace_counted(&RE_HEADING, &s, count, |_| String::new());
    let s = blank_thematic_breaks(&s, count);
    let s = replace_counted(&RE_BULLET, &s, count, |caps| format!("{}• ", &caps[1]));
    let s = replace_counted(&RE_ORDERED, &s, count, |caps| {
        let number = caps.get(2).or_else(|| caps.get(3)).map_or("", |m| m.as_str());
        format!("{}{}. ", &caps[1], number)
    });
    let s = replace_counted(&RE_IMAGE, &s, count, |_| String::new());
    let s = replace_counted(&RE_LINK, &s, count, |caps| caps[1].to_string());
    let s = replace_counted(&RE_AUTOLINK, &s, count, |caps| caps[1].to_string());
    let s = replace_counted(&RE_INLINE_CODE, &s, count, |caps| caps[1].to_string());
    let s = replace_counted(&RE_BOLD_STAR, &s, count, |caps| caps[1].to_string());
    let s = replace_guarded(&RE_BOLD_UNDERSCORE, &s, '_', count);
    let s = replace_counted(&RE_STRIKE, &s, count, |caps| caps[1].to_string());
    let s = replace_guarded(&RE_ITALIC_STAR, &s, '*', count);
    replace_guarded(&RE_ITALIC_UNDERSCORE, &s, '_', count)
}

/// Replace every match, counting the ones that actually change the text.
fn replace_counted<F>(re: &Regex, text: &str, count: &mut usize, mut rep: F) -> String
where
    F: FnMut(&Captures<'_>) -> String,
{
    re.replace_all(text, |caps: &Captures<'_>| {
        let out = rep(caps);
        if out != caps[0] {
            *count += 1;
        }
        out
    })
    .into_owned()
}

/// Unwrap an emphasis pair only when neither outer neighbour is an ASCII
/// letter, digit or the delimiter itself (`2*3*4`, `snake_case`).
fn replace_guarded(re: &Regex, text: &str, delim: char, count: &mut usize) -> String {
    let blocked = |c: Option<char>| c.is_some_and(|c| c.is_ascii_alphanumeric() || c == delim);
    re.replace_all(text, |caps: &Captures<'_>| {
        let Some(whole) = caps.get(0) else {
            return String::new();
        };
        let before = text[..whole.start()].chars().next_back();
        let after = text[whole.end()..].chars().next();
        if blocked(before) || blocked(after) {
            whole.as_str().to_string()
        } else {
            *count += 1;
            caps[1].to_string()
        }
    })
    .into_owned()
}

/// `---`, `***`, `___` and their spaced variants.
fn is_thematic_break(line: &str) -> bool {
    let t = line.trim();
    let Some(first) = t.chars().next() else {
        return false;
    };
    matches!(first, '-' | '*' | '_')
        && t.chars().filter(|c| *c == first).count() >= 3
        && t.chars().all(|c| c == first || matches!(c, ' ' | '\t' | '\u{3000}'))
}

fn blank_thematic_breaks(block: &str, count: &mut usize) -> String {
    block
        .split('\n')
        .map(|line| {
            if is_thematic_break(line) {
                *count += 1;
                ""
            } else {
                line
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn separate_headings(lines: Vec<String>, headings: &[bool]) -> Vec<String> {
    let mut result: Vec<String> = Vec::with_capacity(lines.len() + 4);
    for (i, line) in lines.iter().enumerate() {
        let heading = headings[i] && !line.trim().is_empty();
        if heading && result.last().is_some_and(|prev| !prev.trim().is_empty()) {
            result.push(String::new());
        }
        result.push(line.clone());
        if heading && lines.get(i + 1).is_some_and(|next| !next.trim().is_empty()) {
            result.push(String::new());
        }
    }
    result
}
