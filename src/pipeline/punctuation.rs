//! Stage 3: punctuation unification.
//!
//! Models switch between ASCII and full-width punctuation mid-sentence. The
//! rule is local: a mark takes the width of the script around it. Neighbours
//! are the nearest non-whitespace characters, looking across single line
//! breaks inside a paragraph, so a comma at the end of a soft-wrapped line
//! still sees the CJK word on the next line.
//!
//! Decisions are made on the unmodified paragraph and applied together. A
//! mark's neighbours are never punctuation-sensitive, so converting one mark
//! cannot change the decision for another.

use super::blocks::{classify_lines, code_spans, prose_runs, protected_prefix_len};
use super::script::{is_cjk, is_latin_or_digit};

/// Unify punctuation width in every prose paragraph.
///
/// Returns the rewritten text and the number of marks (or parenthesis
/// pairs) converted.
pub fn unify(text: &str) -> (String, usize) {
    let lines: Vec<&str> = text.split('\n').collect();
    let kinds = classify_lines(&lines);
    let mut out: Vec<String> = lines.iter().map(|l| (*l).to_string()).collect();
    let mut total = 0;
    for run in prose_runs(&kinds) {
        let (chars, protected) = paragraph_chars(&lines[run.clone()]);
        let (rewritten, n) = unify_paragraph(&chars, &protected);
        total += n;
        for (slot, line) in out[run].iter_mut().zip(rewritten.split('\n')) {
            *slot = line.to_string();
        }
    }
    (out.join("\n"), total)
}

/// Flatten a paragraph into chars plus a parallel "do not rewrite" mask
/// covering list-marker prefixes and inline code.
fn paragraph_chars(lines: &[&str]) -> (Vec<char>, Vec<bool>) {
    let mut chars = Vec::new();
    let mut protected = Vec::new();
    for (n, line) in lines.iter().enumerate() {
        if n > 0 {
            chars.push('\n');
            protected.push(false);
        }
        let (prefix, body) = line.split_at(protected_prefix_len(line));
        for c in prefix.chars() {
            chars.push(c);
            protected.push(true);
        }
        for (is_code, span) in code_spans(body) {
            for c in span.chars() {
                chars.push(c);
                protected.push(is_code);
            }
        }
    }
    (chars, protected)
}

fn unify_paragraph(chars: &[char], protected: &[bool]) -> (String, usize) {
    let mut replaced: Vec<Option<char>> = vec![None; chars.len()];
    let mut space_after = vec![false; chars.len()];
    let mut count = unify_parens(chars, protected, &mut replaced);

    for i in 0..chars.len() {
        if protected[i] || replaced[i].is_some() {
            continue;
        }
        if let Some(wide) = to_fullwidth(chars[i]) {
            if should_widen(chars, i) {
                replaced[i] = Some(wide);
                count += 1;
            }
        } else if let Some(narrow) = to_ascii(chars[i]) {
            if should_narrow(chars, i) {
                replaced[i] = Some(narrow);
                space_after[i] = chars.get(i + 1).is_some_and(|c| c.is_alphanumeric());
                count += 1;
            }
        }
    }

    let mut out = String::with_capacity(chars.len() * 3);
    for (i, c) in chars.iter().enumerate() {
        out.push(replaced[i].unwrap_or(*c));
        if space_after[i] {
            out.push(' ');
        }
    }
    (out, count)
}

fn to_fullwidth(c: char) -> Option<char> {
    match c {
        ',' => Some('，'),
        '.' => Some('。'),
        ':' => Some('：'),
        ';' => Some('；'),
        '?' => Some('？'),
        '!' => Some('！'),
        _ => None,
    }
}

fn to_ascii(c: char) -> Option<char> {
    match c {
        '，' => Some(','),
        '。' => Some('.'),
        '：' => Some(':'),
        '；' => Some(';'),
        '？' => Some('?'),
        '！' => Some('!'),
        _ => None,
    }
}

fn prev_neighbor(chars: &[char], i: usize) -> Option<char> {
    chars[..i].iter().rev().copied().find(|c| !c.is_whitespace())
}

fn next_neighbor(chars: &[char], i: usize) -> Option<char> {
    chars[i + 1..].iter().copied().find(|c| !c.is_whitespace())
}

fn should_widen(chars: &[char], i: usize) -> bool {
    let prev = prev_neighbor(chars, i);
    let next = next_neighbor(chars, i);
    if !(prev.is_some_and(is_cjk) || next.is_some_and(is_cjk)) {
        return false;
    }
    if chars[i] == '.' {
        // 3.11, v2.0, file.rs and ellipses keep their dots.
        let follows = chars.get(i + 1).copied();
        if follows.is_some_and(|c| c.is_ascii_alphanumeric() || c == '.') {
            return false;
        }
        if i > 0 && chars[i - 1] == '.' {
            return false;
        }
    }
    true
}

/// A full-width mark goes ASCII only inside Latin text. At the end of a
/// paragraph there is no right-hand neighbour, so the rest of the sentence
/// decides: `我用的是Python。` keeps its `。`.
fn should_narrow(chars: &[char], i: usize) -> bool {
    prev_neighbor(chars, i).is_some_and(is_latin_or_digit)
        && match next_neighbor(chars, i) {
            Some(next) => is_latin_or_digit(next),
            None => !sentence_has_cjk(chars, i),
        }
}

/// Whether the sentence ending at `i` contains CJK. The sentence starts
/// after the previous sentence-ending mark, or at the paragraph start. An
/// ASCII mark ends a sentence only before whitespace, so `3.11` does not.
fn sentence_has_cjk(chars: &[char], i: usize) -> bool {
    let ends_sentence = |j: usize| match chars[j] {
        '。' | '！' | '？' => true,
        '.' | '!' | '?' => chars.get(j + 1).is_some_and(|c| c.is_whitespace()),
        _ => false,
    };
    (0..i)
        .rev()
        .take_while(|&j| !ends_sentence(j))
        .any(|j| is_cjk(chars[j]))
}

/// Innermost parenthesis pairs on one line. Returns the number of pairs
/// converted.
fn unify_parens(chars: &[char], protected: &[bool], replaced: &mut [Option<char>]) -> usize {
    let mut count = 0;
    let mut open: Option<usize> = None;
    for i in 0..chars.len() {
        if protected[i] {
            continue;
        }
        match chars[i] {
            '\n' => open = None,
            '(' | '（' => open = Some(i),
            ')' | '）' => {
                let Some(o) = open.take() else {
                    continue;
                };
                let ascii = chars[o] == '(';
                if ascii != (chars[i] == ')') {
                    continue;
                }
                let inner = &chars[o + 1..i];
                let has_cjk = inner.iter().any(|c| is_cjk(*c));
                if ascii && has_cjk {
                    replaced[o] = Some('（');
                    replaced[i] = Some('）');
                    count += 1;
                } else if !ascii
                    && !has_cjk
                    && inner.iter().any(|c| is_latin_or_digit(*c))
                    && !prev_neighbor(chars, o).is_some_and(is_cjk)
                    && !next_neighbor(chars, i).is_some_and(is_cjk)
                {
                    replaced[o] = Some('(');
                    replaced[i] = Some(')');
                    count += 1;
                }
            }
            _ => {}
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unified(text: &str) -> String {
        unify(text).0
    }

    #[test]
    fn test_ascii_to_fullwidth_next_to_cjk() {
        assert_eq!(unified("你好,世界"), "你好，世界");
        assert_eq!(unified("真的吗?"), "真的吗？");
        assert_eq!(unify("你好,世界!").1, 2);
    }

    #[test]
    fn test_dots_exempt() {
        assert_eq!(unified("版本3.11发布"), "版本3.11发布");
        assert_eq!(unified("等等...然后"), "等等...然后");
        assert_eq!(unified("见main.rs文件"), "见main.rs文件");
    }

    #[test]
    fn test_fullwidth_to_ascii_in_latin() {
        assert_eq!(unified("Hello，world！"), "Hello, world!");
        assert_eq!(unified("中文，English"), "中文，English");
    }

    #[test]
    fn test_sentence_end_after_latin_in_cjk_sentence() {
        assert_eq!(unified("我用的是Python。"), "我用的是Python。");
        assert_eq!(unified("共计100元。总数是50。"), "共计100元。总数是50。");
        assert_eq!(unified("Version 3。"), "Version 3.");
        assert_eq!(unified("中文。Done！"), "中文。Done!");
        assert_eq!(unified("版本是3.11。"), "版本是3.11。");
    }

    #[test]
    fn test_time_between_digits_untouched() {
        assert_eq!(unified("12:30开始"), "12:30开始");
    }

    #[test]
    fn test_parentheses() {
        assert_eq!(unified("使用(中文)说明"), "使用（中文）说明");
        assert_eq!(unified("结果（OK）"), "结果（OK）");
        assert_eq!(unified("Result（OK）"), "Result(OK)");
    }

    #[test]
    fn test_neighbours_cross_soft_breaks() {
        assert_eq!(unified("第一行,\n第二行"), "第一行，\n第二行");
        assert_eq!(unified("第一行,\n\nnext"), "第一行，\n\nnext");
    }

    #[test]
    fn test_markers_and_code_protected() {
        assert_eq!(unified("1. 中文"), "1. 中文");
        assert_eq!(unified("`a,b`中文"), "`a,b`中文");
    }

    #[test]
    fn test_stable_on_second_pass() {
        for input in ["你好,世界", "Hello，world！", "使用(中文)说明", "Result（OK）"] {
            let once = unified(input);
            assert_eq!(unified(&once), once, "input: {input}");
        }
    }
}
