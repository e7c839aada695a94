//! Pipeline stages for LLM-output normalization.
//!
//! Each submodule implements exactly one transformation step as a pure
//! `&str → String` function. Keeping stages separate makes each
//! independently testable; [`Stage`] fixes their order and maps options to
//! the stages they enable.
//!
//! ## Data Flow
//!
//! ```text
//! raw ──▶ input ──▶ markdown ──▶ noise ──▶ punctuation ──▶ spacing
//!                                                            │
//!            cleaned ◀── emoji ◀── indent ◀── paragraphs ◀──┘
//! ```
//!
//! 0. [`input`]      : line endings, invisible characters, full-width ASCII
//! 1. [`markdown`]   : strip markup, normalize list markers
//! 2. [`noise`]      : collapse stuttered tokens and punctuation runs
//! 3. [`punctuation`]: punctuation width follows the surrounding script
//! 4. [`spacing`]    : CJK ↔ Latin spacing, blank collapse, trailing trim
//! 5. [`paragraphs`] : join erroneous line breaks, collapse blank lines
//! 6. [`indent`]     : two ideographic spaces before each paragraph
//! 7. [`emoji`]      : drop emoji, then re-run 1–6 over what is left
//!
//! Stages 1–4 are line rules and run as a group until the text stops
//! changing; merging re-applies them whenever it joined lines. Together this
//! makes `run(run(x)) == run(x)`.
//!
//! Shared helpers: [`script`] classifies characters, [`blocks`] classifies
//! lines (prose, blank, code, table) and finds list markers.

pub mod blocks;
pub mod emoji;
pub mod indent;
pub mod input;
pub mod markdown;
pub mod noise;
pub mod paragraphs;
pub mod punctuation;
pub mod script;
pub mod spacing;

use crate::config::CleanOptions;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// One transformation step. [`Stage::ALL`] is the fixed pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Markdown,
    Duplicates,
    Punctuation,
    Spacing,
    Paragraphs,
    Indentation,
    Emoji,
}

impl Stage {
    pub const ALL: [Stage; 7] = [
        Stage::Markdown,
        Stage::Duplicates,
        Stage::Punctuation,
        Stage::Spacing,
        Stage::Paragraphs,
        Stage::Indentation,
        Stage::Emoji,
    ];

    /// Line-level rules. Each can expose work for another (stripping
    /// backticks puts CJK next to Latin, for one), so they are re-applied as
    /// a group until the text settles.
    const LINE_RULES: [Stage; 4] = [
        Stage::Markdown,
        Stage::Duplicates,
        Stage::Punctuation,
        Stage::Spacing,
    ];

    /// Layout stages, applied once to settled text.
    const LAYOUT: [Stage; 3] = [Stage::Paragraphs, Stage::Indentation, Stage::Emoji];

    /// Re-run after emoji removal deleted something.
    const AFTER_EMOJI: [Stage; 2] = [Stage::Paragraphs, Stage::Indentation];

    pub fn name(self) -> &'static str {
        match self {
            Stage::Markdown => "markdown",
            Stage::Duplicates => "duplicates",
            Stage::Punctuation => "punctuation",
            Stage::Spacing => "spacing",
            Stage::Paragraphs => "paragraphs",
            Stage::Indentation => "indentation",
            Stage::Emoji => "emoji",
        }
    }

    /// Whether `options` include this stage. Each option toggles exactly one.
    pub fn is_enabled(self, options: &CleanOptions) -> bool {
        match self {
            Stage::Markdown => !options.keep_markdown,
            Stage::Paragraphs => !options.keep_lines,
            Stage::Indentation => options.indent_paragraphs,
            Stage::Emoji => options.remove_emoji,
            Stage::Duplicates | Stage::Punctuation | Stage::Spacing => true,
        }
    }

    /// Apply this stage to `text`, ignoring whether it is enabled.
    pub fn apply(self, text: &str, options: &CleanOptions) -> String {
        match self {
            Stage::Markdown => markdown::strip(text, options.keep_lines).0,
            Stage::Duplicates => noise::collapse(text).0,
            Stage::Punctuation => punctuation::unify(text).0,
            Stage::Spacing => spacing::normalize(text).0,
            Stage::Paragraphs => {
                // Joined lines and dropped blank lines both change what the
                // line rules see, so merge and settle until neither acts.
                let mut current = text.to_string();
                for pass in 0..MAX_PASSES {
                    let (merged, _) = paragraphs::merge(&current);
                    if merged == current {
                        break;
                    }
                    debug!(pass, "merging changed the text, settling again");
                    current = settle(merged, options);
                }
                current
            }
            Stage::Indentation => indent::indent(text, !options.keep_lines),
            Stage::Emoji => {
                let (stripped, removed) = emoji::strip(text);
                if removed == 0 {
                    return stripped;
                }
                // Indentation is recomputed from scratch: a paragraph that
                // was only an emoji must not leave its sibling indented.
                let stripped = if Stage::Indentation.is_enabled(options) {
                    indent::outdent(&stripped, !options.keep_lines)
                } else {
                    stripped
                };
                let settled = settle(stripped, options);
                run_stages(&settled, &Stage::AFTER_EMOJI, options)
            }
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Upper bound on settle and merge rounds; real text settles in two.
const MAX_PASSES: usize = 8;

/// Run the full pipeline: canonicalize, then every enabled stage in order.
pub fn run(text: &str, options: &CleanOptions) -> String {
    let canonical = input::canonicalize(text);
    let settled = settle(canonical, options);
    run_stages(&settled, &Stage::LAYOUT, options)
}

/// Apply the enabled line rules until the text stops changing.
fn settle(text: String, options: &CleanOptions) -> String {
    let mut current = text;
    for pass in 0..MAX_PASSES {
        let next = run_stages(&current, &Stage::LINE_RULES, options);
        if next == current {
            break;
        }
        debug!(pass, "line rules changed the text, applying again");
        current = next;
    }
    current
}

fn run_stages(text: &str, stages: &[Stage], options: &CleanOptions) -> String {
    stages
        .iter()
        .filter(|stage| stage.is_enabled(options))
        .fold(text.to_string(), |current, stage| {
            let next = stage.apply(&current, options);
            debug!(
                stage = stage.name(),
                before = current.len(),
                after = next.len(),
                "stage applied"
            );
            next
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order() {
        let names: Vec<&str> = Stage::ALL.iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            vec![
                "markdown",
                "duplicates",
                "punctuation",
                "spacing",
                "paragraphs",
                "indentation",
                "emoji"
            ]
        );
    }

    #[test]
    fn test_options_toggle_one_stage_each() {
        let defaults = CleanOptions::default();
        let enabled: Vec<Stage> = Stage::ALL
            .into_iter()
            .filter(|s| s.is_enabled(&defaults))
            .collect();
        assert_eq!(enabled.len(), 6);
        assert!(!enabled.contains(&Stage::Emoji));

        let opts = CleanOptions::builder()
            .keep_markdown(true)
            .keep_lines(true)
            .indent_paragraphs(false)
            .build();
        assert!(!Stage::Markdown.is_enabled(&opts));
        assert!(!Stage::Paragraphs.is_enabled(&opts));
        assert!(!Stage::Indentation.is_enabled(&opts));
        assert!(Stage::Spacing.is_enabled(&opts));
    }

    #[test]
    fn test_run_defaults() {
        assert_eq!(run("支持Python3.11", &CleanOptions::default()), "支持 Python 3.11");
    }

    #[test]
    fn test_merge_reruns_noise_rules() {
        let opts = CleanOptions::builder().indent_paragraphs(false).build();
        assert_eq!(run("标题：\n标题：内容", &opts), "标题：内容");
    }

    #[test]
    fn test_emoji_removal_leaves_no_double_space() {
        let opts = CleanOptions::builder()
            .remove_emoji(true)
            .indent_paragraphs(false)
            .build();
        assert_eq!(run("好 🎉 的", &opts), "好 的");
        assert_eq!(run("Great 🚀 news", &opts), "Great news");
    }

    #[test]
    fn test_emoji_paragraph_does_not_leave_indent() {
        let opts = CleanOptions::builder().remove_emoji(true).build();
        assert_eq!(run("🎉\n\n正文。", &opts), "正文。");
        assert_eq!(run("🎉 第一段。\n\n第二段。", &opts), "　　第一段。\n\n　　第二段。");

        let kept = CleanOptions::builder()
            .remove_emoji(true)
            .keep_lines(true)
            .build();
        assert_eq!(run("🎉\n\n正文。", &kept), "\n\n正文。");
    }

    #[test]
    fn test_inline_code_across_lines_is_stable() {
        let opts = CleanOptions::default();
        let once = run("运行 `cargo\nbuild` 即可", &opts);
        assert_eq!(once, "运行 cargo build 即可");
        assert_eq!(run(&once, &opts), once);
    }

    #[test]
    fn test_ideographic_space_bullet_is_stable() {
        let opts = CleanOptions::default();
        let once = run("*\u{3000}标题", &opts);
        assert_eq!(once, "• 标题");
        assert_eq!(run(&once, &opts), once);
    }
}
