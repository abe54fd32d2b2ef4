//! Core types for the finclass complaint classifier.
//!
//! This crate holds the plain data types shared between the pipeline core
//! and its front ends. Keeping them separate ensures:
//!
//! - **Stable boundary**: the presentation surface depends on these types
//!   only, never on the normalization or model internals
//! - **Cross-crate compatibility**: core and CLI serialize the same shapes
//! - **Clean boundaries**: no circular dependencies between crates

#![warn(missing_docs)]

use core::cmp::Ordering;
use core::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of one category in the classifier's class list.
///
/// Labels are always read from a loaded classifier artifact, so the set of
/// categories can change without rebuilding the crate.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryLabel(String);

impl CategoryLabel {
    /// Creates a label from any string-like value.
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// Returns the label text.
    #[inline(always)]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CategoryLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CategoryLabel {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for CategoryLabel {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Tolerance used when checking that a distribution sums to one.
pub const PROBABILITY_TOLERANCE: f64 = 1e-6;

/// Per-class probabilities, aligned with the classifier's class list.
///
/// One entry per class, in class-list order. Built by the inference
/// pipeline from a classifier's output; never renormalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceDistribution {
    entries: Vec<(CategoryLabel, f64)>,
}

impl ConfidenceDistribution {
    /// Pairs each class with its probability.
    ///
    /// # Panics
    ///
    /// Panics if `classes` and `probabilities` differ in length.
    pub fn new(classes: &[CategoryLabel], probabilities: &[f64]) -> Self {
        assert_eq!(
            classes.len(),
            probabilities.len(),
            "one probability per class"
        );
        Self {
            entries: classes
                .iter()
                .cloned()
                .zip(probabilities.iter().copied())
                .collect(),
        }
    }

    /// Returns the entries in class-list order.
    #[inline(always)]
    pub fn entries(&self) -> &[(CategoryLabel, f64)] {
        &self.entries
    }

    /// Number of classes.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the distribution has no classes.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Probability assigned to `label`, if it is one of the classes.
    pub fn get(&self, label: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(l, _)| l.as_str() == label)
            .map(|&(_, p)| p)
    }

    /// Sum of all probabilities.
    pub fn total(&self) -> f64 {
        self.entries.iter().map(|&(_, p)| p).sum()
    }

    /// Checks that every probability lies in `[0, 1]` and the total is one
    /// within [`PROBABILITY_TOLERANCE`].
    pub fn is_well_formed(&self) -> bool {
        !self.entries.is_empty()
            && self
                .entries
                .iter()
                .all(|&(_, p)| p.is_finite() && (0.0..=1.0).contains(&p))
            && (self.total() - 1.0).abs() <= PROBABILITY_TOLERANCE
    }
}

/// One ranked entry of a distribution.
///
/// Ordering is a total order: higher probability first, then label
/// ascending, so ties never depend on input order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedCategory {
    /// Category identifier
    pub label: CategoryLabel,
    /// Probability in `[0, 1]`
    pub probability: f64,
}

impl RankedCategory {
    /// Creates a ranked entry.
    #[inline(always)]
    pub fn new(label: CategoryLabel, probability: f64) -> Self {
        Self { label, probability }
    }
}

impl PartialEq for RankedCategory {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for RankedCategory {}

impl PartialOrd for RankedCategory {
    #[inline(always)]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RankedCategory {
    /// `Less` means "ranked earlier".
    #[inline(always)]
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .probability
            .total_cmp(&self.probability)
            .then_with(|| self.label.cmp(&other.label))
    }
}

impl fmt::Display for RankedCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:.3}", self.label, self.probability)
    }
}

/// Intermediate text forms of one request, kept for display and debugging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prepared {
    /// Input exactly as received.
    pub raw: String,
    /// Output of the normalizer.
    pub normalized: String,
    /// Space-joined lemmas of the surviving tokens.
    pub canonical: String,
}

/// Result of a successful classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// Arg-max class.
    pub label: CategoryLabel,
    /// Full distribution sorted by [`RankedCategory`] order.
    pub ranked: Vec<RankedCategory>,
    /// How the model "read" the input.
    pub prepared: Prepared,
}

impl Classification {
    /// Probability of the predicted label.
    pub fn confidence(&self) -> f64 {
        self.ranked
            .iter()
            .find(|r| r.label == self.label)
            .map_or(0.0, |r| r.probability)
    }
}
