//! The shipped English analyzer.

use super::{
    is_punctuation, LexicalAnalyzer, RuleLemmatizer, StopwordSet, StopwordSource, Token, Tokenizer,
};

/// Name under which profiles refer to [`EnglishAnalyzer`].
pub const ENGLISH_ANALYZER: &str = "english";

/// Space tokenizer, rule lemmatizer and stopword flags.
///
/// ```
/// use finclass_core::analyzer::{EnglishAnalyzer, LexicalAnalyzer};
///
/// let analyzer = EnglishAnalyzer::default();
/// let tokens = analyzer.tokens("they keep ignoring me");
///
/// assert_eq!(tokens[2].lemma, "ignore");
/// assert!(tokens[0].is_stopword);
/// assert!(!tokens[2].is_stopword);
/// ```
#[derive(Debug, Clone)]
pub struct EnglishAnalyzer {
    tokenizer: Tokenizer,
    lemmatizer: RuleLemmatizer,
    stopwords: StopwordSet,
}

impl Default for EnglishAnalyzer {
    fn default() -> Self {
        Self::with_source(StopwordSource::default())
    }
}

impl EnglishAnalyzer {
    /// Creates an analyzer flagging words of `stopwords`.
    pub fn new(stopwords: StopwordSet) -> Self {
        Self {
            tokenizer: Tokenizer::new(),
            lemmatizer: RuleLemmatizer::new(),
            stopwords,
        }
    }

    /// Creates an analyzer with the stopwords of `source`.
    pub fn with_source(source: StopwordSource) -> Self {
        Self::new(StopwordSet::from_source(source))
    }
}

impl LexicalAnalyzer for EnglishAnalyzer {
    fn name(&self) -> &str {
        ENGLISH_ANALYZER
    }

    fn analyze<'n>(&self, normalized: &'n str, emit: &mut dyn FnMut(Token<'n>)) {
        self.tokenizer.tokenize(normalized, |surface, position| {
            emit(Token {
                surface,
                lemma: self.lemmatizer.lemmatize(surface),
                is_stopword: self.stopwords.is_stopword(surface),
                is_punctuation: is_punctuation(surface),
                position,
            });
        });
    }
}
