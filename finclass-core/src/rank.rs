//! Result ranking.

use finclass_types::{ConfidenceDistribution, RankedCategory};

/// Sorts a distribution by probability descending, ties by label ascending.
///
/// ```
/// use finclass_core::rank::rank;
/// use finclass_types::{CategoryLabel, ConfidenceDistribution};
///
/// let classes: Vec<CategoryLabel> = vec!["b".into(), "a".into(), "c".into()];
/// let ranked = rank(&ConfidenceDistribution::new(&classes, &[0.4, 0.4, 0.2]));
///
/// let order: Vec<&str> = ranked.iter().map(|r| r.label.as_str()).collect();
/// assert_eq!(order, ["a", "b", "c"]);
/// ```
pub fn rank(distribution: &ConfidenceDistribution) -> Vec<RankedCategory> {
    let mut ranked: Vec<RankedCategory> = distribution
        .entries()
        .iter()
        .map(|(label, p)| RankedCategory::new(label.clone(), *p))
        .collect();
    ranked.sort();
    ranked
}

/// The `k` best entries of [`rank`].
pub fn top_k(distribution: &ConfidenceDistribution, k: usize) -> Vec<RankedCategory> {
    let mut ranked = rank(distribution);
    ranked.truncate(k);
    ranked
}
