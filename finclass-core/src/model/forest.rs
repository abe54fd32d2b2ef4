//! Decision-tree ensemble reader.
//!
//! Trees use the scikit-learn array layout: node `i` is a leaf when
//! `left[i] == -1`, otherwise it sends a sample left when
//! `x[feature[i]] <= threshold[i]`. Features are cast to `f32` before the
//! comparison, as scikit-learn does when it predicts. The forest's output is
//! the mean over trees of each leaf's class counts, normalized to sum to one.

use finclass_types::CategoryLabel;
use serde::{Deserialize, Serialize};

use super::{check_classes, Classifier, FeatureVector};

/// Marker in `left`/`right` for "no child".
pub const LEAF: i64 = -1;

/// On-disk form of one tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeArtifact {
    /// Split feature per node (ignored at leaves).
    pub feature: Vec<i64>,
    /// Split threshold per node (ignored at leaves).
    pub threshold: Vec<f64>,
    /// Left child per node, [`LEAF`] at leaves.
    pub left: Vec<i64>,
    /// Right child per node, [`LEAF`] at leaves.
    pub right: Vec<i64>,
    /// Class counts (or weights) per node.
    pub value: Vec<Vec<f64>>,
}

/// On-disk form of a forest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestArtifact {
    /// Ordered class list.
    pub classes: Vec<CategoryLabel>,
    /// Feature dimension the forest was fitted on.
    pub n_features: usize,
    /// Member trees.
    pub trees: Vec<TreeArtifact>,
}

#[derive(Debug, Clone)]
enum Node {
    Split {
        feature: u32,
        threshold: f64,
        left: u32,
        right: u32,
    },
    Leaf(Box<[f64]>),
}

/// One validated tree. Leaf distributions are stored normalized.
#[derive(Debug, Clone)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

impl DecisionTree {
    fn from_artifact(
        tree: TreeArtifact,
        n_classes: usize,
        n_features: usize,
    ) -> Result<Self, String> {
        let n = tree.left.len();
        if n == 0 {
            return Err("tree has no nodes".to_string());
        }
        if [tree.feature.len(), tree.threshold.len(), tree.right.len(), tree.value.len()]
            .iter()
            .any(|&len| len != n)
        {
            return Err("node arrays differ in length".to_string());
        }

        let mut nodes = Vec::with_capacity(n);
        for i in 0..n {
            let (left, right) = (tree.left[i], tree.right[i]);
            if left == LEAF {
                if right != LEAF {
                    return Err(format!("node {i} has a right child but no left child"));
                }
                nodes.push(Node::Leaf(leaf_distribution(&tree.value[i], n_classes).map_err(
                    |reason| format!("leaf {i}: {reason}"),
                )?));
                continue;
            }

            // Children always follow their parent, which rules out cycles.
            let child = |c: i64| -> Result<u32, String> {
                if c > i as i64 && (c as usize) < n {
                    Ok(c as u32)
                } else {
                    Err(format!("node {i} has invalid child {c}"))
                }
            };
            let feature = tree.feature[i];
            if feature < 0 || feature as usize >= n_features {
                return Err(format!("node {i} splits on feature {feature} of {n_features}"));
            }
            let threshold = tree.threshold[i];
            if threshold.is_nan() {
                return Err(format!("node {i} has a NaN threshold"));
            }
            nodes.push(Node::Split {
                feature: feature as u32,
                threshold,
                left: child(left)?,
                right: child(right)?,
            });
        }
        Ok(Self { nodes })
    }

    /// Normalized class distribution of the leaf `features` falls into.
    pub fn leaf(&self, features: &FeatureVector) -> &[f64] {
        let mut i = 0usize;
        loop {
            match &self.nodes[i] {
                Node::Leaf(distribution) => return distribution,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let x = f64::from(features.get(*feature as usize) as f32);
                    let next = if x <= *threshold { *left } else { *right };
                    i = next as usize;
                }
            }
        }
    }
}

fn leaf_distribution(value: &[f64], n_classes: usize) -> Result<Box<[f64]>, String> {
    if value.len() != n_classes {
        return Err(format!(
            "has {} class values for {n_classes} classes",
            value.len()
        ));
    }
    if value.iter().any(|v| !v.is_finite() || *v < 0.0) {
        return Err("class values must be finite and non-negative".to_string());
    }
    let total: f64 = value.iter().sum();
    if total <= 0.0 {
        return Err("class values sum to zero".to_string());
    }
    Ok(value.iter().map(|v| v / total).collect())
}

/// Averaging tree ensemble (random forest, extra trees, single tree).
#[derive(Debug, Clone)]
pub struct ForestClassifier {
    classes: Vec<CategoryLabel>,
    n_features: usize,
    trees: Vec<DecisionTree>,
}

impl ForestClassifier {
    /// Validates an artifact.
    ///
    /// # Errors
    ///
    /// Returns a description of the first structural problem found.
    pub fn from_artifact(artifact: ForestArtifact) -> Result<Self, String> {
        check_classes(&artifact.classes)?;
        if artifact.trees.is_empty() {
            return Err("forest has no trees".to_string());
        }
        let n_classes = artifact.classes.len();
        let trees = artifact
            .trees
            .into_iter()
            .enumerate()
            .map(|(t, tree)| {
                DecisionTree::from_artifact(tree, n_classes, artifact.n_features)
                    .map_err(|reason| format!("tree {t}: {reason}"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            classes: artifact.classes,
            n_features: artifact.n_features,
            trees,
        })
    }
}

impl Classifier for ForestClassifier {
    #[inline(always)]
    fn classes(&self) -> &[CategoryLabel] {
        &self.classes
    }

    #[inline(always)]
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_proba(&self, features: &FeatureVector) -> Vec<f64> {
        let mut sum = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            for (acc, p) in sum.iter_mut().zip(tree.leaf(features)) {
                *acc += p;
            }
        }
        let n = self.trees.len() as f64;
        sum.iter_mut().for_each(|p| *p /= n);
        sum
    }
}
