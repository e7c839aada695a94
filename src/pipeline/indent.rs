//! Stage 6: paragraph indentation with two ideographic spaces.

use super::blocks::{classify_lines, has_structural_marker, LineKind};

/// Two U+3000 IDEOGRAPHIC SPACE characters.
pub const PARAGRAPH_INDENT: &str = "\u{3000}\u{3000}";

/// Indent the first line of each paragraph.
///
/// With `per_line` every prose line is its own paragraph (lines have been
/// merged already); otherwise a paragraph is a run of prose lines between
/// blank, code or table lines. Text with fewer than two paragraphs is
/// returned unchanged, and a line that already starts with whitespace or a
/// structural marker is never indented.
pub fn indent(text: &str, per_line: bool) -> String {
    let lines: Vec<&str> = text.split('\n').collect();
    let starts = paragraph_starts(&lines, per_line);
    if starts.len() < 2 {
        return text.to_string();
    }

    let mut out: Vec<String> = lines.iter().map(|l| (*l).to_string()).collect();
    for i in starts {
        if should_indent(lines[i]) {
            out[i] = format!("{PARAGRAPH_INDENT}{}", lines[i]);
        }
    }
    out.join("\n")
}

/// Undo [`indent`]: drop the indent from each paragraph start, along with
/// blanks that follow it. [`indent`] never puts an indent before a blank, so
/// those blanks are left over from deleted text (an emoji that opened the
/// paragraph, say). Whitespace-only lines lose a leading indent too.
pub fn outdent(text: &str, per_line: bool) -> String {
    let lines: Vec<&str> = text.split('\n').collect();
    let kinds = classify_lines(&lines);
    let mut out: Vec<String> = lines.iter().map(|l| (*l).to_string()).collect();
    let starts = paragraph_starts(&lines, per_line);
    let blanks = (0..lines.len()).filter(|&i| kinds[i] == LineKind::Blank);
    for i in starts.into_iter().chain(blanks) {
        if let Some(rest) = lines[i].strip_prefix(PARAGRAPH_INDENT) {
            out[i] = rest.trim_start().to_string();
        }
    }
    out.join("\n")
}

/// Indices of the prose lines that open a paragraph.
fn paragraph_starts(lines: &[&str], per_line: bool) -> Vec<usize> {
    let kinds = classify_lines(lines);
    (0..lines.len())
        .filter(|&i| {
            kinds[i] == LineKind::Prose
                && (per_line || i == 0 || kinds[i - 1] != LineKind::Prose)
        })
        .collect()
}

fn should_indent(line: &str) -> bool {
    !line.starts_with(char::is_whitespace) && !has_structural_marker(line)
}
