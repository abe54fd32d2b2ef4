//! Word splitter for `NormalizedText`.
//!
//! First half of the English analyzer: lemmas and stopword flags are layered
//! on top by [`EnglishAnalyzer`](super::EnglishAnalyzer). Normalized text has
//! single spaces between words and none at either end, so splitting is a
//! `memchr` scan for `b' '` and every token borrows from the input.
//!
//! Feeding text that breaks that contract panics in debug builds.

use memchr::memchr_iter;

/// Splits normalized text into `(word, position)` pairs.
///
/// ```
/// use finclass_core::analyzer::Tokenizer;
///
/// let mut words = Vec::new();
/// Tokenizer::new().tokenize("late fee charged", |text, pos| words.push((text, pos)));
///
/// assert_eq!(words, vec![("late", 0), ("fee", 1), ("charged", 2)]);
/// ```
#[derive(Debug, Default, Copy, Clone)]
pub struct Tokenizer;

impl Tokenizer {
    /// Creates a tokenizer.
    #[inline]
    pub const fn new() -> Self {
        Self
    }

    /// Calls `emit` for each word of `normalized`, left to right.
    ///
    /// Positions count from zero and stop at `u32::MAX`.
    #[inline]
    pub fn tokenize<'n, F>(&self, normalized: &'n str, mut emit: F)
    where
        F: FnMut(&'n str, u32),
    {
        debug_assert!(
            !normalized.starts_with(' ') && !normalized.ends_with(' '),
            "tokenizer: input has leading or trailing spaces"
        );
        debug_assert!(
            !normalized.contains("  "),
            "tokenizer: input has consecutive spaces"
        );

        let mut start = 0usize;
        let mut position = 0u32;
        let ends = memchr_iter(b' ', normalized.as_bytes()).chain(Some(normalized.len()));
        for end in ends {
            // Space is ASCII, so both ends are char boundaries.
            let word = &normalized[start..end];
            start = end + 1;
            if word.is_empty() {
                continue;
            }
            emit(word, position);
            match position.checked_add(1) {
                Some(next) => position = next,
                None => return,
            }
        }
    }
}
