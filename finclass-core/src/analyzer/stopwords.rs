//! Stopword lists.
//!
//! Two fixed English sources are available. The reference list is embedded in
//! the crate so its contents change only with a release; the ISO list comes
//! from the `stop-words` crate. Either way the resolved words feed the profile
//! fingerprint, so a list change is caught when artifacts load.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use stop_words::{get, LANGUAGE};

const REFERENCE_EN: &str = include_str!("../../data/stopwords_en.txt");

/// Where a [`StopwordSet`] takes its words from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StopwordSource {
    /// Embedded spaCy-compatible English function-word list.
    #[default]
    #[serde(rename = "reference-en")]
    ReferenceEn,
    /// stopwords-iso English list shipped by the `stop-words` crate.
    #[serde(rename = "iso-en")]
    IsoEn,
}

impl StopwordSource {
    /// Stable identifier used in profiles and fingerprints.
    pub const fn id(self) -> &'static str {
        match self {
            StopwordSource::ReferenceEn => "reference-en",
            StopwordSource::IsoEn => "iso-en",
        }
    }
}

/// A set of lowercase stopwords.
#[derive(Debug, Clone, Default)]
pub struct StopwordSet {
    words: FxHashSet<String>,
}

impl StopwordSet {
    /// Loads the words of `source`.
    pub fn from_source(source: StopwordSource) -> Self {
        let words = match source {
            StopwordSource::ReferenceEn => REFERENCE_EN
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(str::to_lowercase)
                .collect(),
            StopwordSource::IsoEn => get(LANGUAGE::English)
                .iter()
                .map(|s| s.to_lowercase())
                .collect(),
        };
        Self { words }
    }

    /// Create a stopword set from a custom list.
    pub fn from_list(words: &[&str]) -> Self {
        Self {
            words: words.iter().map(|w| w.to_lowercase()).collect(),
        }
    }

    /// Check if a word is a stopword. Input is expected lowercase.
    #[inline]
    pub fn is_stopword(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    /// Number of stopwords.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Check if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// All words in byte order, for fingerprinting and display.
    pub fn sorted(&self) -> Vec<&str> {
        let mut words: Vec<&str> = self.words.iter().map(String::as_str).collect();
        words.sort_unstable();
        words
    }
}
