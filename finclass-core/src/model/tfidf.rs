//! TF-IDF vectorizer reader.
//!
//! Reproduces the transform of a fitted scikit-learn `TfidfVectorizer`:
//!
//! 1. tokens are matches of `\b\w\w+\b` (single characters never count)
//! 2. word n-grams for every `n` in `ngram_range`, joined by one space
//! 3. raw counts, or `1 + ln(count)` with `sublinear_tf`
//! 4. multiplied by the stored idf
//! 5. scaled to unit l2 or l1 norm, or left as is
//!
//! Terms missing from the vocabulary are ignored.

use std::sync::LazyLock;

use regex::Regex;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::{FeatureVector, Vectorizer};

static TOKEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("TOKEN_PATTERN: invalid pattern"));

/// Row normalization applied after idf weighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    /// Unit sum of absolute values.
    L1,
    /// Unit euclidean length.
    L2,
}

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

fn default_norm() -> Option<Norm> {
    Some(Norm::L2)
}

/// On-disk form of a fitted vectorizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfidfArtifact {
    /// Term to feature index.
    pub vocabulary: FxHashMap<String, u32>,
    /// Inverse document frequency per feature index.
    pub idf: Vec<f64>,
    /// Inclusive `(min_n, max_n)`.
    #[serde(default = "default_ngram_range")]
    pub ngram_range: (usize, usize),
    /// Replace counts with `1 + ln(count)`.
    #[serde(default)]
    pub sublinear_tf: bool,
    /// `null` disables normalization.
    #[serde(default = "default_norm")]
    pub norm: Option<Norm>,
}

/// Evaluates a fitted TF-IDF artifact.
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    vocabulary: FxHashMap<String, u32>,
    idf: Vec<f64>,
    ngram_range: (usize, usize),
    sublinear_tf: bool,
    norm: Option<Norm>,
}

impl TfidfVectorizer {
    /// Validates an artifact.
    ///
    /// # Errors
    ///
    /// Returns a description of the first structural problem found.
    pub fn from_artifact(artifact: TfidfArtifact) -> Result<Self, String> {
        let TfidfArtifact {
            vocabulary,
            idf,
            ngram_range,
            sublinear_tf,
            norm,
        } = artifact;

        let n = vocabulary.len();
        if n == 0 {
            return Err("vocabulary is empty".to_string());
        }
        if idf.len() != n {
            return Err(format!(
                "idf has {} entries for a vocabulary of {n} terms",
                idf.len()
            ));
        }
        let mut seen = vec![false; n];
        for (term, &index) in &vocabulary {
            match seen.get_mut(index as usize) {
                Some(slot) if !*slot => *slot = true,
                _ => {
                    return Err(format!(
                        "vocabulary indices are not dense 0..{n} (term {term:?} has index {index})"
                    ))
                }
            }
        }
        if let Some(bad) = idf.iter().position(|v| !v.is_finite() || *v < 0.0) {
            return Err(format!("idf[{bad}] is not a finite non-negative number"));
        }
        let (lo, hi) = ngram_range;
        if lo == 0 || lo > hi {
            return Err(format!("invalid ngram_range ({lo}, {hi})"));
        }

        Ok(Self {
            vocabulary,
            idf,
            ngram_range,
            sublinear_tf,
            norm,
        })
    }

    fn count_terms(&self, canonical: &str) -> FxHashMap<u32, f64> {
        let words: SmallVec<[&str; 32]> = TOKEN_PATTERN
            .find_iter(canonical)
            .map(|m| m.as_str())
            .collect();

        let mut counts = FxHashMap::default();
        let mut gram = String::with_capacity(64);
        let (lo, hi) = self.ngram_range;

        for n in lo..=hi.min(words.len()) {
            for window in words.windows(n) {
                gram.clear();
                for (k, word) in window.iter().enumerate() {
                    if k > 0 {
                        gram.push(' ');
                    }
                    gram.push_str(word);
                }
                if let Some(&index) = self.vocabulary.get(gram.as_str()) {
                    *counts.entry(index).or_insert(0.0) += 1.0;
                }
            }
        }
        counts
    }
}

impl Vectorizer for TfidfVectorizer {
    #[inline(always)]
    fn dimension(&self) -> usize {
        self.idf.len()
    }

    fn transform(&self, canonical: &str) -> FeatureVector {
        let mut entries: Vec<(u32, f64)> = self
            .count_terms(canonical)
            .into_iter()
            .map(|(index, count)| {
                let tf = if self.sublinear_tf {
                    1.0 + count.ln()
                } else {
                    count
                };
                (index, tf * self.idf[index as usize])
            })
            .filter(|&(_, v)| v != 0.0)
            .collect();
        entries.sort_unstable_by_key(|&(index, _)| index);

        let scale = match self.norm {
            Some(Norm::L2) => entries.iter().map(|&(_, v)| v * v).sum::<f64>().sqrt(),
            Some(Norm::L1) => entries.iter().map(|&(_, v)| v.abs()).sum::<f64>(),
            None => 1.0,
        };
        if scale > 0.0 && scale != 1.0 {
            for entry in &mut entries {
                entry.1 /= scale;
            }
        }

        FeatureVector::from_entries(self.dimension(), entries)
    }
}
