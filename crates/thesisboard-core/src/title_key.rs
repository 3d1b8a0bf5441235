//! Title key normalisation for timeline event deduplication.
//!
//! Generated headlines for the same event rarely match byte for byte: the
//! model varies capitalisation, quote style, dashes, and trailing punctuation
//! between runs. Keys collapse those differences so that
//! `"SEC Drops Appeal — Case Closed"` and `"sec drops appeal: case closed!"`
//! dedupe against each other.
//!
//! # Algorithm
//!
//! 1. Lowercase (Unicode-aware).
//! 2. Keep alphanumeric characters only. Whitespace and punctuation are dropped.
//! 3. Truncate to [`TITLE_KEY_LEN`] characters, so a long title that the model
//!    later extends with a trailing clause still matches.

/// Maximum key length in characters.
pub const TITLE_KEY_LEN: usize = 60;

/// Normalise an event title into its dedup key.
///
/// Input: `"Fed Cuts Rates by 25bp"`
/// Output: `"fedcutsratesby25bp"`
pub fn title_key(title: &str) -> String {
    title
        .chars()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_alphanumeric())
        .take(TITLE_KEY_LEN)
        .collect()
}
