//! Property tests over arbitrary text.

use proptest::prelude::*;
use reflow_text::{clean, process, CleanOptions};

fn options() -> impl Strategy<Value = CleanOptions> {
    (any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>()).prop_map(
        |(keep_markdown, keep_lines, remove_emoji, indent_paragraphs)| {
            CleanOptions::builder()
                .keep_markdown(keep_markdown)
                .keep_lines(keep_lines)
                .remove_emoji(remove_emoji)
                .indent_paragraphs(indent_paragraphs)
                .build()
        },
    )
}

/// Text shaped like model output: CJK, Latin, digits, Markdown, punctuation.
fn noisy_text() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            Just("标题"),
            Just("内容"),
            Just("Rust"),
            Just("3.11"),
            Just("**"),
            Just("## "),
            Just("- "),
            Just("> "),
            Just("`"),
            Just("```"),
            Just("|"),
            Just(","),
            Just("，"),
            Just("!!"),
            Just("。"),
            Just(":"),
            Just(" "),
            Just("\n"),
            Just("\n\n"),
            Just("🎉"),
            Just("\u{3000}"),
            Just("（"),
            Just("）"),
            Just("_"),
            Just("*"),
            Just("、"),
            Just("\t"),
            Just("[x](u)"),
        ],
        0..40,
    )
    .prop_map(|parts| parts.concat())
}

/// Line breaks as the pipeline counts them: CRLF is one break.
fn line_breaks(text: &str) -> usize {
    text.replace("\r\n", "\n").matches(['\r', '\n']).count()
}

proptest! {
    #[test]
    fn test_total_on_any_text(text in "(?s:.){0,200}", opts in options()) {
        prop_assert!(clean(text.as_str(), &opts).is_ok());
    }

    #[test]
    fn test_keep_lines_preserves_newlines(text in "(?s:.){0,200}", opts in options()) {
        let opts = CleanOptions { keep_lines: true, ..opts };
        let out = clean(text.as_str(), &opts).unwrap();
        prop_assert_eq!(out.matches('\n').count(), line_breaks(&text));
    }

    #[test]
    fn test_keep_lines_preserves_newlines_on_noisy_text(text in noisy_text(), opts in options()) {
        let opts = CleanOptions { keep_lines: true, ..opts };
        let out = clean(text.as_str(), &opts).unwrap();
        prop_assert_eq!(out.matches('\n').count(), line_breaks(&text));
    }

    #[test]
    fn test_idempotent_on_noisy_text(text in noisy_text(), opts in options()) {
        let once = clean(text.as_str(), &opts).unwrap();
        let twice = clean(once.as_str(), &opts).unwrap();
        prop_assert_eq!(twice, once);
    }

    #[test]
    fn test_score_always_in_range(text in noisy_text(), opts in options()) {
        let report = process(text.as_str(), &opts).unwrap().report;
        prop_assert!((0.0..=100.0).contains(&report.score));
    }

    #[test]
    fn test_merged_output_has_no_edge_blank_lines(text in noisy_text()) {
        let opts = CleanOptions::builder().indent_paragraphs(false).build();
        let out = clean(text.as_str(), &opts).unwrap();
        prop_assert!(!out.contains("\n\n\n") || out.contains("```"));
        prop_assert!(!out.starts_with('\n'));
    }
}
