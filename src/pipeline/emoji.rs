//! Stage 7: emoji removal.

use super::blocks::map_prose_lines;
use super::script::is_emoji;

/// Delete emoji from prose lines. Returns the text and the number of
/// characters removed.
pub fn strip(text: &str) -> (String, usize) {
    map_prose_lines(text, |line| {
        let mut removed = 0;
        let kept: String = line
            .chars()
            .filter(|c| {
                let drop = is_emoji(*c);
                removed += usize::from(drop);
                !drop
            })
            .collect();
        (kept, removed)
    })
}
