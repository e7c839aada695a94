//! Script classification shared by the punctuation, spacing and merging stages.
//!
//! Every adjacency decision in the pipeline goes through [`classify`], so the
//! punctuation rules and the spacing rules agree on what counts as CJK, what
//! counts as Latin, and where a space may sit.

/// Coarse script class of a single character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Script {
    /// Han ideographs (incl. extensions and compatibility forms), kana, Hangul.
    Cjk,
    /// ASCII letters and the Latin-1 / Latin Extended-A/B letters.
    Latin,
    /// ASCII digits.
    Digit,
    /// ASCII punctuation, CJK punctuation, full-width punctuation, general punctuation.
    Punctuation,
    /// Everything else: whitespace, symbols, emoji.
    Other,
}

/// Classify one character.
pub fn classify(c: char) -> Script {
    if is_cjk(c) {
        Script::Cjk
    } else if c.is_ascii_digit() {
        Script::Digit
    } else if is_latin_letter(c) {
        Script::Latin
    } else if is_punctuation(c) {
        Script::Punctuation
    } else {
        Script::Other
    }
}

pub fn is_cjk(c: char) -> bool {
    matches!(
        c as u32,
        0x3400..=0x4DBF
            | 0x4E00..=0x9FFF
            | 0xF900..=0xFAFF
            | 0x20000..=0x2FA1F
            | 0x3040..=0x309F
            | 0x30A0..=0x30FF
            | 0x31F0..=0x31FF
            | 0x1100..=0x11FF
            | 0x3130..=0x318F
            | 0xAC00..=0xD7AF
            | 0x3005
            | 0x3007
    )
}

fn is_latin_letter(c: char) -> bool {
    c.is_ascii_alphabetic() || (matches!(c as u32, 0x00C0..=0x024F) && c.is_alphabetic())
}

fn is_punctuation(c: char) -> bool {
    c.is_ascii_punctuation()
        || matches!(
            c as u32,
            0x3001..=0x303F
                | 0xFF01..=0xFF0F
                | 0xFF1A..=0xFF20
                | 0xFF3B..=0xFF40
                | 0xFF5B..=0xFF65
                | 0x2010..=0x2027
                | 0x2030..=0x205E
                | 0x00A1..=0x00BF
        )
}

/// Latin letter or ASCII digit: the side of a CJK boundary that gets a space.
pub fn is_latin_or_digit(c: char) -> bool {
    matches!(classify(c), Script::Latin | Script::Digit)
}

/// Full-width CJK punctuation that never takes a neighbouring space.
///
/// Curly quotes and `…` are shared with Latin typography and are not listed.
pub fn is_fullwidth_punct(c: char) -> bool {
    matches!(
        c,
        '，' | '。'
            | '、'
            | '；'
            | '：'
            | '？'
            | '！'
            | '（'
            | '）'
            | '【'
            | '】'
            | '《'
            | '》'
            | '「'
            | '」'
            | '『'
            | '』'
            | '〈'
            | '〉'
            | '〔'
            | '〕'
    )
}

/// Whether a single space may separate `before` and `after`.
///
/// Spacing normalization removes any space for which this is false, and
/// paragraph merging joins lines without a space in the same cases, so both
/// stages converge on the same text.
pub fn space_allowed(before: char, after: char) -> bool {
    !(is_fullwidth_punct(before)
        || is_fullwidth_punct(after)
        || matches!(after, ',' | '.' | ';' | ':' | '!' | '?'))
}

/// Separator used when two lines are joined into one.
pub fn joiner(before: char, after: char) -> &'static str {
    if !space_allowed(before, after) || (is_cjk(before) && is_cjk(after)) {
        ""
    } else {
        " "
    }
}

/// Emoji and pictographs removed by the emoji stage.
///
/// Ranges: regional indicators (flags), Misc Symbols and Pictographs through
/// Transport and Map, Supplemental Symbols and Pictographs, Symbols and
/// Pictographs Extended-A, Misc Symbols, Dingbats, `⭐` and `⭕`, plus the
/// presentation selector U+FE0F and the keycap combiner U+20E3.
pub fn is_emoji(c: char) -> bool {
    matches!(
        c as u32,
        0x1F1E6..=0x1F1FF
            | 0x1F300..=0x1F6FF
            | 0x1F900..=0x1F9FF
            | 0x1FA70..=0x1FAFF
            | 0x2600..=0x26FF
            | 0x2700..=0x27BF
            | 0x2B50
            | 0x2B55
            | 0xFE0F
            | 0x20E3
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_scripts() {
        assert_eq!(classify('中'), Script::Cjk);
        assert_eq!(classify('か'), Script::Cjk);
        assert_eq!(classify('한'), Script::Cjk);
        assert_eq!(classify('a'), Script::Latin);
        assert_eq!(classify('é'), Script::Latin);
        assert_eq!(classify('7'), Script::Digit);
        assert_eq!(classify(','), Script::Punctuation);
        assert_eq!(classify('，'), Script::Punctuation);
        assert_eq!(classify('—'), Script::Punctuation);
        assert_eq!(classify(' '), Script::Other);
        assert_eq!(classify('😀'), Script::Other);
    }

    #[test]
    fn test_space_allowed() {
        assert!(space_allowed('a', 'b'));
        assert!(space_allowed('中', 'a'));
        assert!(!space_allowed('，', 'a'));
        assert!(!space_allowed('a', '（'));
        assert!(!space_allowed('a', ','));
    }

    #[test]
    fn test_joiner() {
        assert_eq!(joiner('中', '文'), "");
        assert_eq!(joiner('中', 'a'), " ");
        assert_eq!(joiner('a', 'b'), " ");
        assert_eq!(joiner('，', 'a'), "");
    }

    #[test]
    fn test_emoji_ranges() {
        assert!(is_emoji('😀'));
        assert!(is_emoji('🇨'));
        assert!(is_emoji('✅'));
        assert!(is_emoji('\u{FE0F}'));
        assert!(!is_emoji('中'));
        assert!(!is_emoji('•'));
    }
}
