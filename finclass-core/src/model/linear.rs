//! Linear model reader: softmax over `W·x + b`.
//!
//! A binary model may store a single coefficient row, as scikit-learn's
//! logistic regression does; it then scores the second class and the
//! probabilities come from the logistic function.

use finclass_types::CategoryLabel;
use serde::{Deserialize, Serialize};

use super::{check_classes, Classifier, FeatureVector};

/// On-disk form of a linear model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearArtifact {
    /// Ordered class list.
    pub classes: Vec<CategoryLabel>,
    /// One row per class (or a single row for two classes).
    pub coef: Vec<Vec<f64>>,
    /// One bias per row.
    pub intercept: Vec<f64>,
}

/// Multinomial (or binary) logistic model.
#[derive(Debug, Clone)]
pub struct LinearClassifier {
    classes: Vec<CategoryLabel>,
    coef: Vec<Vec<f64>>,
    intercept: Vec<f64>,
    n_features: usize,
}

impl LinearClassifier {
    /// Validates an artifact.
    ///
    /// # Errors
    ///
    /// Returns a description of the first structural problem found.
    pub fn from_artifact(artifact: LinearArtifact) -> Result<Self, String> {
        let LinearArtifact {
            classes,
            coef,
            intercept,
        } = artifact;
        check_classes(&classes)?;

        let binary = classes.len() == 2 && coef.len() == 1;
        if !binary && coef.len() != classes.len() {
            return Err(format!(
                "{} coefficient rows for {} classes",
                coef.len(),
                classes.len()
            ));
        }
        if intercept.len() != coef.len() {
            return Err(format!(
                "{} intercepts for {} coefficient rows",
                intercept.len(),
                coef.len()
            ));
        }
        let n_features = coef.first().map_or(0, Vec::len);
        if coef.iter().any(|row| row.len() != n_features) {
            return Err("coefficient rows differ in length".to_string());
        }
        if coef.iter().flatten().chain(&intercept).any(|v| !v.is_finite()) {
            return Err("weights must be finite".to_string());
        }

        Ok(Self {
            classes,
            coef,
            intercept,
            n_features,
        })
    }

    /// Raw scores `W·x + b`, one per coefficient row.
    pub fn decision_function(&self, features: &FeatureVector) -> Vec<f64> {
        self.coef
            .iter()
            .zip(&self.intercept)
            .map(|(row, b)| features.dot(row) + b)
            .collect()
    }
}

impl Classifier for LinearClassifier {
    #[inline(always)]
    fn classes(&self) -> &[CategoryLabel] {
        &self.classes
    }

    #[inline(always)]
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_proba(&self, features: &FeatureVector) -> Vec<f64> {
        let scores = self.decision_function(features);
        if let [z] = scores.as_slice() {
            let p = 1.0 / (1.0 + (-z).exp());
            return vec![1.0 - p, p];
        }
        softmax(&scores)
    }
}

/// Numerically stable softmax.
pub fn softmax(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}
