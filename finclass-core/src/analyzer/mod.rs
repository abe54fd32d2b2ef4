//! Text analysis pipeline.
//!
//! This module provides the text processing components:
//! - **Normalizer**: Cleans raw complaint text into `NormalizedText`
//! - **Tokenizer**: Splits normalized text into surface words
//! - **Lemmatizer**: Maps inflected words to their base form
//! - **Stopwords**: Fixed function-word lists
//! - **Analyzer**: Combines the above into [`Token`]s behind [`LexicalAnalyzer`]

use std::borrow::Cow;

pub mod english;
pub mod lemmatizer;
pub mod normalizer;
pub mod stopwords;
pub mod tokenizer;

pub use english::EnglishAnalyzer;
pub use lemmatizer::RuleLemmatizer;
pub use normalizer::{NormalizerConfig, TextNormalizer};
pub use stopwords::{StopwordSet, StopwordSource};
pub use tokenizer::Tokenizer;

/// One analyzed word of a normalized text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'n> {
    /// The word as it appears in the normalized text.
    pub surface: &'n str,
    /// Dictionary base form of `surface`.
    pub lemma: Cow<'n, str>,
    /// `surface` is a function word.
    pub is_stopword: bool,
    /// `surface` consists only of punctuation.
    pub is_punctuation: bool,
    /// Zero-based word position.
    pub position: u32,
}

impl<'n> Token<'n> {
    /// A token whose lemma is its surface form, with both flags cleared.
    pub fn plain(surface: &'n str, position: u32) -> Self {
        Self {
            surface,
            lemma: Cow::Borrowed(surface),
            is_stopword: false,
            is_punctuation: false,
            position,
        }
    }
}

/// Turns normalized text into an ordered token stream.
///
/// Implementations must be deterministic: the same input always yields the
/// same tokens, in input order. The analyzer is passed to the pipeline
/// explicitly, so tests can substitute their own.
pub trait LexicalAnalyzer: Send + Sync {
    /// Identity recorded in normalization profiles.
    fn name(&self) -> &str;

    /// Emits the tokens of `normalized`, left to right.
    fn analyze<'n>(&self, normalized: &'n str, emit: &mut dyn FnMut(Token<'n>));

    /// Collects the tokens of `normalized`.
    fn tokens<'n>(&self, normalized: &'n str) -> Vec<Token<'n>> {
        let mut out = Vec::new();
        self.analyze(normalized, &mut |token| out.push(token));
        out
    }
}

/// Returns `true` if `word` is non-empty and entirely ASCII punctuation.
#[inline]
pub fn is_punctuation(word: &str) -> bool {
    !word.is_empty() && word.bytes().all(|b| b.is_ascii_punctuation())
}
