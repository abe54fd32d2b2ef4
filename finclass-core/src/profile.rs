//! Normalization profiles.
//!
//! A profile names every switch that shapes canonical text. Artifacts are
//! fitted on text produced under one profile, so the profile travels with
//! them and is identified by a SHA-256 fingerprint of its canonical
//! rendering:
//!
//! ```text
//! name=cfpb-lemma
//! version=1
//! normalizer.mask_char=x
//! ...
//! normalizer=norm-en/1
//! lemmatizer=rule-en/1
//! ...
//! stopwords=a,about,above,...
//! ```
//!
//! The rendering includes the resolved stopword list and the rule-set ids
//! of the normalizer and the lemmatizer, so editing any of them changes the
//! fingerprint even when no profile field does.

use std::fmt;
use std::fmt::Write as _;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::analyzer::english::ENGLISH_ANALYZER;
use crate::analyzer::{lemmatizer, normalizer};
use crate::analyzer::{NormalizerConfig, StopwordSet, StopwordSource};
use crate::error::InvalidPin;
use crate::filter::{DEFAULT_BLACKLIST, DEFAULT_MIN_TOKEN_LEN};

/// Name of the default profile.
pub const DEFAULT_PROFILE_NAME: &str = "cfpb-lemma";

/// Default minimum canonical text length, in characters.
pub const DEFAULT_MIN_CANONICAL_LEN: usize = 2;

/// Named, versioned configuration of the whole normalization pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizationProfile {
    /// Profile name.
    pub name: String,
    /// Revision of `name`; bump on any behavioral change.
    pub version: u32,
    /// Normalizer switches.
    pub normalizer: NormalizerConfig,
    /// Lexical analyzer identity.
    pub analyzer: String,
    /// Stopword list the analyzer flags.
    pub stopwords: StopwordSource,
    /// Minimum token surface length in characters.
    pub min_token_len: usize,
    /// Surfaces and lemmas always dropped.
    pub blacklist: Vec<String>,
    /// Canonical texts shorter than this are rejected.
    pub min_canonical_len: usize,
}

impl Default for NormalizationProfile {
    fn default() -> Self {
        Self {
            name: DEFAULT_PROFILE_NAME.to_string(),
            version: 1,
            normalizer: NormalizerConfig::default(),
            analyzer: ENGLISH_ANALYZER.to_string(),
            stopwords: StopwordSource::default(),
            min_token_len: DEFAULT_MIN_TOKEN_LEN,
            blacklist: DEFAULT_BLACKLIST.iter().map(|w| w.to_string()).collect(),
            min_canonical_len: DEFAULT_MIN_CANONICAL_LEN,
        }
    }
}

impl NormalizationProfile {
    /// `name@version`.
    pub fn id(&self) -> String {
        format!("{}@{}", self.name, self.version)
    }

    /// Sets the minimum token length.
    pub fn with_min_token_len(mut self, len: usize) -> Self {
        self.min_token_len = len;
        self
    }

    /// Sets the stopword source.
    pub fn with_stopwords(mut self, source: StopwordSource) -> Self {
        self.stopwords = source;
        self
    }

    /// Sets the normalizer switches.
    pub fn with_normalizer(mut self, config: NormalizerConfig) -> Self {
        self.normalizer = config;
        self
    }

    /// Canonical line rendering hashed by [`fingerprint`](Self::fingerprint).
    ///
    /// Sets (blacklist, stopwords) are lowercased, sorted and deduplicated so
    /// that listing order does not matter.
    pub fn render(&self) -> String {
        let n = &self.normalizer;
        let mut blacklist: Vec<String> = self.blacklist.iter().map(|w| w.to_lowercase()).collect();
        blacklist.sort_unstable();
        blacklist.dedup();
        let stopwords = StopwordSet::from_source(self.stopwords);

        let mut out = String::with_capacity(4096);
        // Writing into a String cannot fail.
        let _ = writeln!(out, "name={}", self.name);
        let _ = writeln!(out, "version={}", self.version);
        let _ = writeln!(out, "normalizer.mask_char={}", n.mask_char);
        let _ = writeln!(out, "normalizer.min_mask_run={}", n.min_mask_run.max(2));
        let _ = writeln!(out, "normalizer.strip_urls={}", n.strip_urls);
        let _ = writeln!(out, "normalizer.strip_html={}", n.strip_html);
        let _ = writeln!(out, "normalizer.fold_diacritics={}", n.fold_diacritics);
        let placeholders: Vec<String> = n
            .placeholders
            .iter()
            .map(|p| p.to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();
        let _ = writeln!(out, "normalizer.placeholders={}", placeholders.join(","));
        let _ = writeln!(out, "analyzer={}", self.analyzer);
        let _ = writeln!(out, "normalizer={}", normalizer::RULESET_ID);
        let _ = writeln!(out, "lemmatizer={}", lemmatizer::RULESET_ID);
        let _ = writeln!(out, "stopwords.source={}", self.stopwords.id());
        let _ = writeln!(out, "stopwords={}", stopwords.sorted().join(","));
        let _ = writeln!(out, "min_token_len={}", self.min_token_len);
        let _ = writeln!(out, "blacklist={}", blacklist.join(","));
        let _ = writeln!(out, "min_canonical_len={}", self.min_canonical_len);
        out
    }

    /// Lowercase hex SHA-256 of [`render`](Self::render).
    pub fn fingerprint(&self) -> String {
        hex::encode(Sha256::digest(self.render().as_bytes()))
    }
}

/// Required profile: a name, optionally with an exact version.
///
/// ```
/// use finclass_core::profile::{NormalizationProfile, ProfilePin};
///
/// let pin: ProfilePin = "cfpb-lemma@1".parse().unwrap();
/// assert!(pin.matches(&NormalizationProfile::default()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfilePin {
    /// Required name.
    pub name: String,
    /// Required version, any if `None`.
    pub version: Option<u32>,
}

impl ProfilePin {
    /// Returns `true` if `profile` satisfies the pin.
    pub fn matches(&self, profile: &NormalizationProfile) -> bool {
        profile.name == self.name && self.version.is_none_or(|v| v == profile.version)
    }
}

impl FromStr for ProfilePin {
    type Err = InvalidPin;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidPin(s.to_string());
        let (name, version) = match s.split_once('@') {
            Some((name, version)) => (name, Some(version.parse().map_err(|_| invalid())?)),
            None => (s, None),
        };
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(invalid());
        }
        Ok(Self {
            name: name.to_string(),
            version,
        })
    }
}

impl fmt::Display for ProfilePin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.version {
            Some(v) => write!(f, "{}@{}", self.name, v),
            None => f.write_str(&self.name),
        }
    }
}
