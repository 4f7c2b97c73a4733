//! Binary classification scores over match counts.
//!
//! A zero denominator is an error, never a `NaN`.

use crate::errors::{GeomCompareError, Result};

fn ratio(numerator: f64, denominator: f64, metric: &'static str) -> Result<f64> {
    if denominator == 0.0 {
        return Err(GeomCompareError::DivisionByZero { metric });
    }
    Ok(numerator / denominator)
}

/// `tp / (tp + missed)`
pub fn recall(true_positives: u64, missed: u64) -> Result<f64> {
    let tp = true_positives as f64;
    ratio(tp, tp + missed as f64, "recall")
}

/// `tp / (tp + fp)`
pub fn precision(true_positives: u64, false_positives: u64) -> Result<f64> {
    let tp = true_positives as f64;
    ratio(tp, tp + false_positives as f64, "precision")
}

/// `tp / (tp + (missed + fp) / 2)`
pub fn f1(true_positives: u64, false_positives: u64, missed: u64) -> Result<f64> {
    let tp = true_positives as f64;
    let errors = (missed as f64 + false_positives as f64) / 2.0;
    ratio(tp, tp + errors, "f1")
}

/// Outcome of matching predicted geometries against a reference.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MatchCounts {
    pub true_positives: u64,
    pub false_positives: u64,
    /// Reference geometries with no match (false negatives).
    pub missed: u64,
}

impl MatchCounts {
    pub fn new(true_positives: u64, false_positives: u64, missed: u64) -> Self {
        Self {
            true_positives,
            false_positives,
            missed,
        }
    }

    pub fn recall(&self) -> Result<f64> {
        recall(self.true_positives, self.missed)
    }

    pub fn precision(&self) -> Result<f64> {
        precision(self.true_positives, self.false_positives)
    }

    pub fn f1(&self) -> Result<f64> {
        f1(self.true_positives, self.false_positives, self.missed)
    }
}
