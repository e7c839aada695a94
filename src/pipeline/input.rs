//! Input canonicalization, run before any stage.
//!
//! LLM output pasted from a browser or a chat client carries Windows line
//! endings, zero-width characters and full-width Latin letters. Folding them
//! here means no later stage needs to know about them.

use super::blocks::{classify_lines, fenced_lines, LineKind};

/// Zero-width space/joiners, word joiner, BOM and soft hyphen.
fn is_invisible(c: char) -> bool {
    matches!(
        c,
        '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{2060}' | '\u{FEFF}' | '\u{00AD}'
    )
}

/// Full-width ASCII letters and digits fold to their ASCII forms.
fn fold_fullwidth(c: char) -> char {
    match c {
        '\u{FF10}'..='\u{FF19}' | '\u{FF21}'..='\u{FF3A}' | '\u{FF41}'..='\u{FF5A}' => {
            char::from_u32(c as u32 - 0xFEE0).unwrap_or(c)
        }
        _ => c,
    }
}

/// Split into logical lines. CRLF, lone CR and LF each end a line; every
/// line is returned with its terminator (empty for the last line).
fn split_lines(input: &str) -> Vec<(&str, &str)> {
    let bytes = input.as_bytes();
    let mut lines = Vec::new();
    let (mut start, mut i) = (0, 0);
    while i < bytes.len() {
        let end = match bytes[i] {
            b'\r' if bytes.get(i + 1) == Some(&b'\n') => i + 2,
            b'\r' | b'\n' => i + 1,
            _ => {
                i += 1;
                continue;
            }
        };
        lines.push((&input[start..i], &input[i..end]));
        start = end;
        i = end;
    }
    lines.push((&input[start..], ""));
    lines
}

/// Canonicalize raw text.
///
/// Every line break becomes LF except CRLF between two lines of one fenced
/// block, which is code and keeps its bytes. Line counts are unchanged:
/// CRLF is one break. Code lines skip the character folding.
pub fn canonicalize(input: &str) -> String {
    let split = split_lines(input);
    let lines: Vec<&str> = split.iter().map(|(line, _)| *line).collect();
    let fenced = fenced_lines(&lines);
    let kinds = classify_lines(&lines);

    let mut out = String::with_capacity(input.len());
    for (i, (line, terminator)) in split.iter().enumerate() {
        if kinds[i] == LineKind::Code {
            out.push_str(line);
        } else {
            out.extend(line.chars().filter(|c| !is_invisible(*c)).map(fold_fullwidth));
        }
        if terminator.is_empty() {
            continue;
        }
        let in_block = fenced[i] && fenced.get(i + 1).copied().unwrap_or(false);
        out.push_str(if in_block && *terminator == "\r\n" {
            *terminator
        } else {
            "\n"
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_endings() {
        assert_eq!(canonicalize("a\r\nb\rc"), "a\nb\nc");
        assert_eq!(canonicalize("a\r\n\r\nb\n"), "a\n\nb\n");
    }

    #[test]
    fn test_fenced_crlf_kept() {
        let block = "```\r\nx = 1\r\n\r\ny = 2\r\n```";
        assert_eq!(canonicalize(block), block);
        assert_eq!(
            canonicalize("a\r\n```\r\nx\r\n```\r\nb"),
            "a\n```\r\nx\r\n```\nb"
        );
        // Lone CR inside a block still breaks the line.
        assert_eq!(canonicalize("```\rx\r```"), "```\nx\n```");
    }

    #[test]
    fn test_line_count_kept() {
        let input = "a\r\n```\r\nx\r\n```\rb\nc";
        assert_eq!(canonicalize(input).matches('\n').count(), 5);
    }

    #[test]
    fn test_invisible_removed() {
        assert_eq!(canonicalize("he\u{200B}llo\u{FEFF}"), "hello");
        assert_eq!(canonicalize("soft\u{00AD}hyphen"), "softhyphen");
    }

    #[test]
    fn test_fullwidth_alnum_folded() {
        assert_eq!(canonicalize("ＡＢＣ１２３ｘ"), "ABC123x");
        // Full-width punctuation is left for the punctuation stage.
        assert_eq!(canonicalize("你好，世界"), "你好，世界");
    }

    #[test]
    fn test_code_untouched() {
        let input = "```\nzero\u{200B}width ＡＢ\n```";
        assert_eq!(canonicalize(input), input);
    }
}
