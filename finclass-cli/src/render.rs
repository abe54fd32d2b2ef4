//! Output formatting.

use std::fmt::Write as _;

use finclass_types::{CategoryLabel, Classification, Prepared, RankedCategory};
use serde::Serialize;

const BAR_WIDTH: usize = 30;

/// JSON document printed by `classify --json`.
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    /// Predicted label.
    pub label: &'a CategoryLabel,
    /// Probability of `label`.
    pub confidence: f64,
    /// Every class, best first.
    pub ranked: &'a [RankedCategory],
    /// Intermediate text forms, with `--show-canonical`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prepared: Option<&'a Prepared>,
}

impl<'a> Report<'a> {
    /// Report of `result`.
    pub fn new(result: &'a Classification, show_canonical: bool) -> Self {
        Self {
            label: &result.label,
            confidence: result.confidence(),
            ranked: &result.ranked,
            prepared: show_canonical.then_some(&result.prepared),
        }
    }
}

/// `p` as a bar of `width` cells.
pub fn bar(p: f64, width: usize) -> String {
    let filled = ((p.clamp(0.0, 1.0) * width as f64).round() as usize).min(width);
    let mut out = String::with_capacity(width * 3);
    out.extend(std::iter::repeat_n('█', filled));
    out.extend(std::iter::repeat_n('·', width - filled));
    out
}

/// Text rendering of `result`.
pub fn text(result: &Classification, show_canonical: bool) -> String {
    let mut out = String::new();
    let width = result
        .ranked
        .iter()
        .map(|r| r.label.as_str().len())
        .max()
        .unwrap_or(0);

    // Writing into a String cannot fail.
    let _ = writeln!(out, "{} ({:.1}%)", result.label, result.confidence() * 100.0);
    let _ = writeln!(out);
    for entry in &result.ranked {
        let _ = writeln!(
            out,
            "  {:<width$}  {}  {:>5.1}%",
            entry.label.as_str(),
            bar(entry.probability, BAR_WIDTH),
            entry.probability * 100.0,
        );
    }
    if show_canonical {
        let _ = writeln!(out);
        let _ = writeln!(out, "normalized: {}", result.prepared.normalized);
        let _ = writeln!(out, "canonical:  {}", result.prepared.canonical);
    }
    out
}
