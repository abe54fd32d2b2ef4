//! Model interfaces and artifact readers.
//!
//! The pipeline only sees two narrow traits:
//! - [`Vectorizer`]: canonical text to a fixed-dimension [`FeatureVector`]
//! - [`Classifier`]: feature vector to one probability per class
//!
//! Concrete readers evaluate frozen artifacts exported by the training side:
//! [`TfidfVectorizer`], [`ForestClassifier`] and [`LinearClassifier`].
//! [`ModelStore`] loads and cross-checks them as a [`ModelBundle`].

use finclass_types::CategoryLabel;
use rustc_hash::FxHashSet;

pub mod forest;
pub mod linear;
pub mod store;
pub mod tfidf;

pub use forest::ForestClassifier;
pub use linear::LinearClassifier;
pub use store::{ClassifierArtifact, Manifest, ModelBundle, ModelStore, FORMAT_VERSION};
pub use tfidf::{Norm, TfidfVectorizer};

/// Sparse feature vector of a fixed dimension.
///
/// Entries are `(index, value)` pairs sorted by index, without duplicates.
/// Absent indices are zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureVector {
    dim: usize,
    entries: Vec<(u32, f64)>,
}

impl FeatureVector {
    /// All-zero vector.
    pub fn zeros(dim: usize) -> Self {
        Self {
            dim,
            entries: Vec::new(),
        }
    }

    /// Builds a vector from unordered entries. Duplicate indices are summed
    /// and explicit zeros dropped.
    ///
    /// # Panics
    ///
    /// Panics if an index is out of range.
    pub fn from_entries(dim: usize, mut entries: Vec<(u32, f64)>) -> Self {
        assert!(
            entries.iter().all(|&(i, _)| (i as usize) < dim),
            "feature index out of range"
        );
        entries.sort_unstable_by_key(|&(i, _)| i);
        let mut merged: Vec<(u32, f64)> = Vec::with_capacity(entries.len());
        for (i, v) in entries {
            match merged.last_mut() {
                Some(last) if last.0 == i => last.1 += v,
                _ => merged.push((i, v)),
            }
        }
        merged.retain(|&(_, v)| v != 0.0);
        Self {
            dim,
            entries: merged,
        }
    }

    /// Number of features.
    #[inline(always)]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Non-zero entries, sorted by index.
    #[inline(always)]
    pub fn entries(&self) -> &[(u32, f64)] {
        &self.entries
    }

    /// Number of non-zero entries.
    #[inline(always)]
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if every feature is zero.
    #[inline(always)]
    pub fn is_zero(&self) -> bool {
        self.entries.is_empty()
    }

    /// Value at `index`.
    pub fn get(&self, index: usize) -> f64 {
        self.entries
            .binary_search_by_key(&index, |&(i, _)| i as usize)
            .map_or(0.0, |pos| self.entries[pos].1)
    }

    /// Dot product with a dense row of the same dimension.
    pub fn dot(&self, dense: &[f64]) -> f64 {
        debug_assert_eq!(dense.len(), self.dim, "dimension mismatch");
        self.entries
            .iter()
            .map(|&(i, v)| v * dense.get(i as usize).copied().unwrap_or(0.0))
            .sum()
    }
}

/// Maps canonical text to features.
pub trait Vectorizer: Send + Sync {
    /// Feature dimension (vocabulary size).
    fn dimension(&self) -> usize;

    /// Features of `canonical`. Unknown terms contribute nothing.
    fn transform(&self, canonical: &str) -> FeatureVector;
}

/// Maps features to a probability per class.
pub trait Classifier: Send + Sync {
    /// Ordered class list; probabilities align with it.
    fn classes(&self) -> &[CategoryLabel];

    /// Feature dimension the classifier was fitted on.
    fn n_features(&self) -> usize;

    /// One probability per class, each in `[0, 1]`, summing to one.
    fn predict_proba(&self, features: &FeatureVector) -> Vec<f64>;
}

/// Index of the largest probability; the first one on ties.
pub fn argmax(probabilities: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &p) in probabilities.iter().enumerate() {
        match best {
            Some((_, b)) if p <= b => {}
            _ => best = Some((i, p)),
        }
    }
    best.map(|(i, _)| i)
}

/// Checks a class list is non-empty and free of duplicates.
pub(crate) fn check_classes(classes: &[CategoryLabel]) -> Result<(), String> {
    if classes.is_empty() {
        return Err("class list is empty".to_string());
    }
    let mut seen = FxHashSet::default();
    for label in classes {
        if !seen.insert(label.as_str()) {
            return Err(format!("class {label:?} listed twice"));
        }
    }
    Ok(())
}
