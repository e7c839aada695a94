//! Stage 2: duplicate-noise collapse.
//!
//! Streaming generation sometimes stutters: a heading comes out as
//! `标题：标题：内容`, an enumeration repeats one word three times, or a
//! sentence ends in `!!!` or `。。`. This stage folds those repeats back to a
//! single occurrence. It is exact and case-sensitive and only looks at
//! adjacent repeats, so ordinary prose that happens to reuse a word is never
//! touched.

use super::blocks::{code_spans, map_prose_lines, protected_prefix_len};
use super::script::{classify, Script};

/// What the stage collapsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoiseStats {
    /// Token repeats removed.
    pub duplicates: usize,
    /// Punctuation runs collapsed.
    pub runs: usize,
}

/// Collapse repeated tokens and punctuation runs on every prose line.
pub fn collapse(text: &str) -> (String, NoiseStats) {
    let mut stats = NoiseStats::default();
    let (out, _) = map_prose_lines(text, |line| {
        let split = protected_prefix_len(line);
        let (prefix, body) = line.split_at(split);
        let mut rewritten = String::with_capacity(line.len());
        rewritten.push_str(prefix);
        for (is_code, span) in code_spans(body) {
            if is_code {
                rewritten.push_str(span);
                continue;
            }
            let chars: Vec<char> = span.chars().collect();
            let (chars, duplicates) = collapse_duplicates(&chars);
            let (chars, runs) = collapse_punct_runs(&chars);
            stats.duplicates += duplicates;
            stats.runs += runs;
            rewritten.extend(chars);
        }
        (rewritten, 0)
    });
    (out, stats)
}

// ── Tokens ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenClass {
    Cjk,
    Alnum,
}

fn token_class(c: char) -> Option<TokenClass> {
    if c.is_ascii_alphanumeric() {
        Some(TokenClass::Alnum)
    } else if classify(c) == Script::Cjk {
        Some(TokenClass::Cjk)
    } else {
        None
    }
}

/// End of the token starting at `start`, if a token starts there.
///
/// A token is a maximal run of one class, at least two characters long and
/// not made of digits only.
fn token_at(chars: &[char], start: usize) -> Option<usize> {
    let class = token_class(*chars.get(start)?)?;
    if start > 0 && token_class(chars[start - 1]) == Some(class) {
        return None;
    }
    let mut end = start + 1;
    while end < chars.len() && token_class(chars[end]) == Some(class) {
        end += 1;
    }
    let token = &chars[start..end];
    if token.len() < 2 || token.iter().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(end)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DelimiterClass {
    Colon,
    Comma,
}

fn delimiter_class(c: char) -> Option<DelimiterClass> {
    match c {
        ':' | '：' => Some(DelimiterClass::Colon),
        '、' | ',' | '，' | ';' | '；' => Some(DelimiterClass::Comma),
        _ => None,
    }
}

fn skip_blanks(chars: &[char], mut i: usize) -> usize {
    while i < chars.len() && matches!(chars[i], ' ' | '\t') {
        i += 1;
    }
    i
}

/// Delimiter (with surrounding blanks) at `i`: its class and the index after it.
fn delimiter_at(chars: &[char], i: usize) -> Option<(DelimiterClass, usize)> {
    let at = skip_blanks(chars, i);
    let class = delimiter_class(*chars.get(at)?)?;
    Some((class, skip_blanks(chars, at + 1)))
}

fn collapse_duplicates(chars: &[char]) -> (Vec<char>, usize) {
    let mut out = Vec::with_capacity(chars.len());
    let mut removed = 0;
    let mut i = 0;
    while i < chars.len() {
        let Some(token_end) = token_at(chars, i) else {
            out.push(chars[i]);
            i += 1;
            continue;
        };
        let token = &chars[i..token_end];
        let mut occurrences = 1;
        let mut end = token_end;
        let mut class = None;
        while let Some((delim, next)) = delimiter_at(chars, end) {
            if class.is_some_and(|c| c != delim) {
                break;
            }
            match token_at(chars, next) {
                Some(next_end) if &chars[next..next_end] == token => {
                    class = Some(delim);
                    occurrences += 1;
                    end = next_end;
                }
                _ => break,
            }
        }
        // `X：X：rest` folds at two; a bare `X: X is` is ordinary prose.
        let collapses = match class {
            Some(_) if occurrences >= 3 => true,
            Some(DelimiterClass::Colon) if occurrences == 2 => {
                delimiter_at(chars, end).is_some_and(|(c, _)| c == DelimiterClass::Colon)
            }
            _ => false,
        };
        out.extend_from_slice(token);
        if collapses {
            removed += occurrences - 1;
            i = end;
        } else {
            i = token_end;
        }
    }
    (out, removed)
}

// ── Punctuation runs ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunClass {
    Comma,
    Enumeration,
    Exclamation,
    Question,
    Semicolon,
    Colon,
    Period,
}

fn run_class(c: char) -> Option<RunClass> {
    match c {
        ',' | '，' => Some(RunClass::Comma),
        '、' => Some(RunClass::Enumeration),
        '!' | '！' => Some(RunClass::Exclamation),
        '?' | '？' => Some(RunClass::Question),
        ';' | '；' => Some(RunClass::Semicolon),
        ':' | '：' => Some(RunClass::Colon),
        '.' | '。' => Some(RunClass::Period),
        _ => None,
    }
}

fn collapse_punct_runs(chars: &[char]) -> (Vec<char>, usize) {
    let mut out = Vec::with_capacity(chars.len());
    let mut collapsed = 0;
    let mut i = 0;
    while i < chars.len() {
        let Some(class) = run_class(chars[i]) else {
            out.push(chars[i]);
            i += 1;
            continue;
        };
        let mut last = i;
        while last + 1 < chars.len() && run_class(chars[last + 1]) == Some(class) {
            last += 1;
        }
        if chars[i..=last].iter().all(|c| *c == '.') {
            last = spaced_dots_end(chars, last);
        }
        let members: Vec<char> = chars[i..=last]
            .iter()
            .copied()
            .filter(|c| !matches!(c, ' ' | '\t'))
            .collect();
        if members.len() < 2 || is_path_separator(chars, i, last) {
            out.extend_from_slice(&chars[i..=last]);
            i = last + 1;
            continue;
        }
        let replacement: Vec<char> = match class {
            RunClass::Period if members.iter().all(|c| *c == '.') => vec!['.'; 3],
            RunClass::Period => vec!['。'],
            _ => vec![members[0]],
        };
        if replacement.as_slice() != &chars[i..=last] {
            collapsed += 1;
        }
        out.extend(replacement);
        i = last + 1;
    }
    (out, collapsed)
}

/// End of a spaced ellipsis (`. . .`) whose first dots end at `last`.
///
/// Blanks may separate ASCII dots, but only when the run is not glued to a
/// following word: in `end. .NET` the second dot belongs to `.NET`.
fn spaced_dots_end(chars: &[char], last: usize) -> usize {
    let mut end = last;
    loop {
        let next = skip_blanks(chars, end + 1);
        if next == end + 1 || chars.get(next) != Some(&'.') {
            break;
        }
        end = next;
        while chars.get(end + 1) == Some(&'.') {
            end += 1;
        }
    }
    if chars.get(end + 1).is_some_and(|c| c.is_alphanumeric()) {
        last
    } else {
        end
    }
}

/// `std::fmt` and friends: exactly `::` between ASCII alphanumerics.
fn is_path_separator(chars: &[char], start: usize, last: usize) -> bool {
    last == start + 1
        && chars[start] == ':'
        && chars[last] == ':'
        && start > 0
        && chars[start - 1].is_ascii_alphanumeric()
        && chars.get(last + 1).is_some_and(|c| c.is_ascii_alphanumeric())
}
