//! Line structure shared by every stage.
//!
//! Stages never see "a string" in the abstract: they see lines, and each line
//! is prose, blank, code or a table row. Code and table lines pass through
//! every stage untouched, so the classification has to be recomputed from the
//! current text at the start of each stage.
//!
//! Code is either fenced or *code-like*: models often paste a statement such
//! as `x = foo()` or `import os` without a fence, and rewriting its
//! punctuation or joining it to the next line would break it.

use super::script::{is_cjk, is_fullwidth_punct};
use once_cell::sync::Lazy;
use regex::Regex;

/// Class of a single line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Prose,
    Blank,
    /// Fence line, a line inside a fenced block, or a code-like line.
    Code,
    /// GFM table row.
    Table,
}

/// A fence line opens or closes a fenced code block.
pub fn is_fence(line: &str) -> bool {
    line.trim_start().starts_with("```")
}

/// Returns `true` if the line looks like a GFM table row.
pub fn is_table_row(line: &str) -> bool {
    let t = line.trim();
    t.starts_with('|') && t.ends_with('|') && t.len() > 2
}

/// Fence lines and the lines between them. An unclosed fence runs to the
/// end of the text.
pub fn fenced_lines(lines: &[&str]) -> Vec<bool> {
    let mut in_fence = false;
    lines
        .iter()
        .map(|line| {
            if is_fence(line) {
                in_fence = !in_fence;
                true
            } else {
                in_fence
            }
        })
        .collect()
}

/// Classify each line.
pub fn classify_lines(lines: &[&str]) -> Vec<LineKind> {
    let mut kinds: Vec<LineKind> = lines
        .iter()
        .zip(fenced_lines(lines))
        .map(|(line, fenced)| {
            if fenced {
                LineKind::Code
            } else if line.trim().is_empty() {
                LineKind::Blank
            } else if is_table_row(line) {
                LineKind::Table
            } else if looks_like_code(line) {
                LineKind::Code
            } else {
                LineKind::Prose
            }
        })
        .collect();
    promote_weak_code(lines, &mut kinds);
    kinds
}

/// Apply `f` to every prose line, leaving the rest byte-identical.
///
/// Returns the rebuilt text and the sum of the counts `f` reported.
pub fn map_prose_lines<F>(text: &str, mut f: F) -> (String, usize)
where
    F: FnMut(&str) -> (String, usize),
{
    let lines: Vec<&str> = text.split('\n').collect();
    let kinds = classify_lines(&lines);
    let mut total = 0;
    let out: Vec<String> = lines
        .iter()
        .zip(&kinds)
        .map(|(line, kind)| {
            if *kind == LineKind::Prose {
                let (rewritten, n) = f(line);
                total += n;
                rewritten
            } else {
                (*line).to_string()
            }
        })
        .collect();
    (out.join("\n"), total)
}

/// Maximal runs of consecutive prose lines, as half-open index ranges.
pub fn prose_runs(kinds: &[LineKind]) -> Vec<std::ops::Range<usize>> {
    runs_of(kinds, LineKind::Prose)
}

/// Maximal runs of consecutive table rows.
pub fn table_runs(kinds: &[LineKind]) -> Vec<std::ops::Range<usize>> {
    runs_of(kinds, LineKind::Table)
}

fn runs_of(kinds: &[LineKind], wanted: LineKind) -> Vec<std::ops::Range<usize>> {
    let mut runs = Vec::new();
    let mut start = None;
    for (i, kind) in kinds.iter().enumerate() {
        match (*kind == wanted, start) {
            (true, None) => start = Some(i),
            (true, Some(_)) => {}
            (false, Some(s)) => {
                runs.push(s..i);
                start = None;
            }
            (false, None) => {}
        }
    }
    if let Some(s) = start {
        runs.push(s..kinds.len());
    }
    runs
}

/// Split a line into `(is_code, segment)` pieces on inline code spans.
///
/// A backtick without a partner is ordinary text.
pub fn code_spans(s: &str) -> Vec<(bool, &str)> {
    let mut out = Vec::new();
    let mut rest = s;
    while let Some(open) = rest.find('`') {
        let Some(len) = rest[open + 1..].find('`') else {
            break;
        };
        let close = open + 1 + len;
        if open > 0 {
            out.push((false, &rest[..open]));
        }
        out.push((true, &rest[open..=close]));
        rest = &rest[close + 1..];
    }
    if !rest.is_empty() {
        out.push((false, rest));
    }
    out
}

// ── List markers ─────────────────────────────────────────────────────────────

static RE_LIST_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:[-*+•·●▪◦‣⁃][ \t\x{3000}\x{A0}]+|\d{1,3}[.)][ \t\x{3000}\x{A0}]+|\d{1,3}、[ \t]*|[(（]\d{1,3}[)）][ \t]*|[一二三四五六七八九十]{1,3}、[ \t]*)",
    )
    .unwrap()
});

static RE_STRUCTURAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:[-*+•·●▪◦‣⁃](?:\s|$)|\d{1,3}[.)](?:\s|$)|\d{1,3}、|[(（]\d{1,3}[)）]|[一二三四五六七八九十]{1,3}、|#{1,6}(?:\s|$)|>)",
    )
    .unwrap()
});

/// Byte length of the list marker (bullet or ordinal plus its trailing
/// blanks) at the start of `body`. `body` must already be left-trimmed.
pub fn list_marker_len(body: &str) -> usize {
    RE_LIST_MARKER.find(body).map_or(0, |m| m.end())
}

/// Byte length of leading whitespace plus any list marker.
///
/// Stages that rewrite characters leave this prefix alone.
pub fn protected_prefix_len(line: &str) -> usize {
    let body = line.trim_start();
    let lead = line.len() - body.len();
    lead + list_marker_len(body)
}

/// Whether the line opens with a structural marker: bullet, ordinal, heading
/// or blockquote. Leading whitespace is ignored.
pub fn has_structural_marker(line: &str) -> bool {
    RE_STRUCTURAL.is_match(line.trim_start())
}

/// Lines that never take part in paragraph merging.
pub fn is_structural(line: &str) -> bool {
    has_structural_marker(line)
        || line.starts_with('\t')
        || line.starts_with("    ")
        || is_table_row(line)
        || is_fence(line)
}

// ── Code-like lines ──────────────────────────────────────────────────────────

/// Statements that only occur in code. Matched against the trimmed line.
static RE_CODE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^(?:",
        r"from\s+[A-Za-z_][\w.]*\s+import\s+\S.*",
        r"|import\s+[A-Za-z_][\w.]*(?:\s+as\s+\w+)?;?",
        r"|(?:def|class)\s+[A-Za-z_]\w*\s*[(:].*",
        r"|(?:else|try|finally):",
        r"|except\b[^:]*:",
        r"|for\s+[\w, ]+\s+in\s+\S.*:",
        r"|(?:if|elif|while)\s+\S.*(?:==|!=|<=|>=|\(|\[).*:",
        r"|(?:return|yield|raise)(?:\s.*[^.!?\s])?",
        r"|(?:break|continue|pass);?",
        r"|[A-Za-z_][\w.]*(?:\[[^\]]*\])?\s*(?:[-+*/]?=|:=)\s*[^=\s].*",
        r"|[A-Za-z_][\w.]*\(.*\);?",
        r"|@[A-Za-z_][\w.]*(?:\(.*\))?",
        r"|.*[{;]",
        r"|[}\])]+[;,]?",
        r")$"
    ))
    .unwrap()
});

/// CJK text or full-width punctuation marks a line as prose.
fn has_cjk_text(line: &str) -> bool {
    line.chars().any(|c| is_cjk(c) || is_fullwidth_punct(c))
}

/// A line that reads as a code statement on its own.
pub fn looks_like_code(line: &str) -> bool {
    let t = line.trim();
    !t.is_empty() && !has_cjk_text(t) && !has_structural_marker(t) && RE_CODE_LINE.is_match(t)
}

/// Indented or `#`-prefixed lines are code only next to other code.
fn is_weak_code(line: &str) -> bool {
    let indented = line.starts_with('\t') || line.starts_with("    ");
    (indented || line.trim_start().starts_with('#')) && !has_cjk_text(line)
}

/// Turn weak lines into code when a code line is adjacent, directly or
/// across one blank line. Repeats so a run of indented lines joins the code
/// above it.
fn promote_weak_code(lines: &[&str], kinds: &mut [LineKind]) {
    let weak: Vec<usize> = (0..lines.len())
        .filter(|&i| kinds[i] == LineKind::Prose && is_weak_code(lines[i]))
        .collect();
    let mut changed = !weak.is_empty();
    while changed {
        changed = false;
        for &i in &weak {
            if kinds[i] != LineKind::Code && near_code(kinds, i) {
                kinds[i] = LineKind::Code;
                changed = true;
            }
        }
    }
}

fn near_code(kinds: &[LineKind], i: usize) -> bool {
    let is = |j: Option<usize>, kind: LineKind| j.and_then(|j| kinds.get(j)) == Some(&kind);
    is(i.checked_sub(1), LineKind::Code)
        || is(Some(i + 1), LineKind::Code)
        || (is(i.checked_sub(1), LineKind::Blank) && is(i.checked_sub(2), LineKind::Code))
        || (is(Some(i + 1), LineKind::Blank) && is(Some(i + 2), LineKind::Code))
}

// ── Tables ───────────────────────────────────────────────────────────────────

static RE_SEPARATOR_CELL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^:?-+:?$").unwrap());

/// Trimmed cells of a table row. An escaped `\|` does not split.
pub fn table_cells(line: &str) -> Vec<String> {
    let t = line.trim();
    let t = t.strip_prefix('|').unwrap_or(t);
    let t = t.strip_suffix('|').unwrap_or(t);
    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut escaped = false;
    for c in t.chars() {
        if c == '|' && !escaped {
            cells.push(cell.trim().to_string());
            cell.clear();
        } else {
            cell.push(c);
        }
        escaped = c == '\\' && !escaped;
    }
    cells.push(cell.trim().to_string());
    cells
}

/// `|---|:--:|` and friends.
pub fn is_separator_row(line: &str) -> bool {
    is_table_row(line)
        && table_cells(line)
            .iter()
            .all(|cell| RE_SEPARATOR_CELL.is_match(cell))
}

fn format_row(cells: &[String], columns: usize) -> String {
    let padded: Vec<&str> = (0..columns)
        .map(|i| cells.get(i).map_or("", String::as_str))
        .collect();
    format!("| {} |", padded.join(" | "))
}

fn format_separator(alignment: &[String], columns: usize) -> String {
    let cells: Vec<String> = (0..columns)
        .map(|i| alignment.get(i).cloned().unwrap_or_else(|| "---".to_string()))
        .collect();
    format!("| {} |", cells.join(" | "))
}

/// Repair one block of consecutive table rows.
///
/// Ragged rows are padded with empty cells. With `insert_separator` the block
/// ends up with exactly one header separator, right after its first row
/// (a lone row stays a lone row); without it the number of lines never
/// changes. Returns `None` when the block is already well-formed, so a
/// well-formed table keeps its exact bytes.
pub fn normalize_table(rows: &[&str], insert_separator: bool) -> Option<Vec<String>> {
    let cells: Vec<Vec<String>> = rows.iter().map(|row| table_cells(row)).collect();
    let separator: Vec<bool> = rows.iter().map(|row| is_separator_row(row)).collect();
    let columns = cells.iter().map(Vec::len).max()?;
    let separators = separator.iter().filter(|s| **s).count();
    if separators == rows.len() {
        return None;
    }

    let uniform = cells.iter().all(|row| row.len() == columns);
    let header_ok =
        !insert_separator || rows.len() < 2 || (separators == 1 && separator[1]);
    if uniform && header_ok {
        return None;
    }

    if !insert_separator {
        return Some(
            cells
                .iter()
                .zip(&separator)
                .map(|(row, sep)| {
                    if *sep {
                        format_separator(row, columns)
                    } else {
                        format_row(row, columns)
                    }
                })
                .collect(),
        );
    }

    let alignment: &[String] = match separator.iter().position(|s| *s) {
        Some(i) => &cells[i],
        None => &[],
    };
    let data: Vec<&Vec<String>> = cells
        .iter()
        .zip(&separator)
        .filter(|(_, sep)| !**sep)
        .map(|(row, _)| row)
        .collect();
    let mut out = Vec::with_capacity(data.len() + 1);
    for (i, row) in data.iter().enumerate() {
        out.push(format_row(row, columns));
        if i == 0 && (data.len() >= 2 || separators > 0) {
            out.push(format_separator(alignment, columns));
        }
    }
    Some(out)
}

/// Repair every table block in `text`. Returns the text and the number of
/// blocks rewritten.
pub fn normalize_tables(text: &str, insert_separator: bool) -> (String, usize) {
    let lines: Vec<&str> = text.split('\n').collect();
    let kinds = classify_lines(&lines);
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut repaired = 0;
    let mut next = 0;
    for run in table_runs(&kinds) {
        out.extend(lines[next..run.start].iter().map(|l| (*l).to_string()));
        match normalize_table(&lines[run.clone()], insert_separator) {
            Some(rows) => {
                repaired += 1;
                out.extend(rows);
            }
            None => out.extend(lines[run.clone()].iter().map(|l| (*l).to_string())),
        }
        next = run.end;
    }
    out.extend(lines[next..].iter().map(|l| (*l).to_string()));
    (out.join("\n"), repaired)
}
