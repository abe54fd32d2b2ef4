//! Token filtering.
//!
//! Drops tokens that carry no category signal and keeps the lemmas of the
//! rest, in their original order.

use std::borrow::Cow;

use rustc_hash::FxHashSet;

use crate::analyzer::Token;
use crate::profile::NormalizationProfile;

/// Fragments the source dataset leaves behind: contraction halves, filler
/// verbs and template field names.
pub const DEFAULT_BLACKLIST: &[&str] = &[
    "ve",
    "don",
    "ll",
    "assist",
    "issue",
    "have",
    "having",
    "has",
    "had",
    "productpurchase",
    "productpurchased",
    "productprice",
    "productcost",
    "productid",
    "errormessage",
    "inplist",
    "threadinfo",
    "faqhelp",
    "faq",
];

/// Default minimum surface length, in characters.
pub const DEFAULT_MIN_TOKEN_LEN: usize = 2;

/// Keeps tokens that are not stopwords, not punctuation, long enough and not
/// blacklisted by surface or lemma.
#[derive(Debug, Clone)]
pub struct TokenFilter {
    min_token_len: usize,
    blacklist: FxHashSet<String>,
}

impl Default for TokenFilter {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_TOKEN_LEN, DEFAULT_BLACKLIST.iter().copied())
    }
}

impl TokenFilter {
    /// Creates a filter. Blacklist entries are lowercased.
    pub fn new<I, S>(min_token_len: usize, blacklist: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            min_token_len,
            blacklist: blacklist
                .into_iter()
                .map(|w| w.as_ref().to_lowercase())
                .collect(),
        }
    }

    /// Creates the filter a profile describes.
    pub fn from_profile(profile: &NormalizationProfile) -> Self {
        Self::new(profile.min_token_len, &profile.blacklist)
    }

    /// Minimum surface length in characters.
    #[inline(always)]
    pub fn min_token_len(&self) -> usize {
        self.min_token_len
    }

    /// Returns `true` if `word` is blacklisted.
    #[inline]
    pub fn is_blacklisted(&self, word: &str) -> bool {
        self.blacklist.contains(word)
    }

    /// Returns `true` if `token` survives.
    #[inline]
    pub fn accepts(&self, token: &Token<'_>) -> bool {
        !token.is_stopword
            && !token.is_punctuation
            && token.surface.chars().count() >= self.min_token_len
            && !self.is_blacklisted(token.surface)
            && !self.is_blacklisted(&token.lemma)
    }

    /// Lemmas of the surviving tokens, in input order.
    pub fn filter<'n, I>(&self, tokens: I) -> Vec<Cow<'n, str>>
    where
        I: IntoIterator<Item = Token<'n>>,
    {
        tokens
            .into_iter()
            .filter(|token| self.accepts(token))
            .map(|token| token.lemma)
            .collect()
    }
}
