//! Stage 5: paragraph merging.
//!
//! Chat UIs and copy-paste wrap long sentences at arbitrary points. A line
//! break is treated as erroneous when the line before it does not end a
//! sentence and neither side is blank or structural; such breaks are joined.
//! Blank-line runs collapse to one blank line, and the text loses its leading
//! and trailing blank lines, so paragraph boundaries in the output are
//! unambiguous.

use super::blocks::{classify_lines, is_structural, LineKind};
use super::script::{is_emoji, joiner};

/// Merge erroneous line breaks. Returns the text and the number of breaks
/// joined.
pub fn merge(text: &str) -> (String, usize) {
    let lines: Vec<&str> = text.split('\n').collect();
    let kinds = classify_lines(&lines);
    // (line, is_code): blank lines inside code are content, not separators.
    let mut out: Vec<(String, bool)> = Vec::with_capacity(lines.len());
    let mut buffer: Option<String> = None;
    let mut joins = 0;

    for (line, kind) in lines.iter().zip(&kinds) {
        match kind {
            LineKind::Prose if !is_structural(line) => match buffer.as_mut() {
                Some(buf) if !ends_sentence(buf) => {
                    join_into(buf, line);
                    joins += 1;
                }
                _ => {
                    flush(&mut buffer, &mut out);
                    buffer = Some((*line).to_string());
                }
            },
            LineKind::Blank => {
                flush(&mut buffer, &mut out);
                if out.last().is_some_and(|(l, code)| *code || !l.is_empty()) {
                    out.push((String::new(), false));
                }
            }
            _ => {
                flush(&mut buffer, &mut out);
                out.push(((*line).to_string(), *kind == LineKind::Code));
            }
        }
    }
    flush(&mut buffer, &mut out);
    while out.last().is_some_and(|(l, code)| !*code && l.is_empty()) {
        out.pop();
    }

    let text = out
        .into_iter()
        .map(|(line, _)| line)
        .collect::<Vec<_>>()
        .join("\n");
    (text, joins)
}

/// Number of erroneous line breaks in `text`.
pub fn count_broken_breaks(text: &str) -> usize {
    merge(text).1
}

fn flush(buffer: &mut Option<String>, out: &mut Vec<(String, bool)>) {
    if let Some(line) = buffer.take() {
        out.push((line, false));
    }
}

fn join_into(buf: &mut String, next: &str) {
    let head = buf.trim_end().len();
    buf.truncate(head);
    let next = next.trim();
    if let (Some(a), Some(b)) = (buf.chars().next_back(), next.chars().next()) {
        buf.push_str(joiner(a, b));
    }
    buf.push_str(next);
}

fn is_closing(c: char) -> bool {
    matches!(
        c,
        '"' | '\'' | '”' | '’' | '）' | ')' | ']' | '】' | '」' | '』' | '》' | '〉'
    )
}

/// Whether `line` ends a sentence, looking past closing quotes, brackets and
/// emoji.
pub fn ends_sentence(line: &str) -> bool {
    line.chars()
        .rev()
        .find(|c| !c.is_whitespace() && !is_closing(*c) && !is_emoji(*c))
        .is_some_and(|c| matches!(c, '。' | '！' | '？' | '.' | '!' | '?'))
}
