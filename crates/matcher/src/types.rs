//! Matching data types and errors.

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Options for a single matching run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchOptions {
    /// Global similarity floor; cells below it are ineligible.
    pub abs_cutoff: f64,
    /// Enforce each pair's per-row thresholds: cell `(i, j)` is eligible
    /// only when `sim[i][j] >= max(left_threshold[i], right_threshold[j])`.
    pub require_thresholds: bool,
}

impl MatchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_abs_cutoff(mut self, abs_cutoff: f64) -> Self {
        self.abs_cutoff = abs_cutoff;
        self
    }

    pub fn with_require_thresholds(mut self, require_thresholds: bool) -> Self {
        self.require_thresholds = require_thresholds;
        self
    }

    pub fn validate(&self) -> Result<(), MatchError> {
        if !(0.0..=1.0).contains(&self.abs_cutoff) || self.abs_cutoff.is_nan() {
            return Err(MatchError::InvalidCutoff {
                cutoff: self.abs_cutoff,
            });
        }
        Ok(())
    }
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            abs_cutoff: 0.0,
            require_thresholds: true,
        }
    }
}

/// Dense pairwise similarity scores between two embedded datasets, with the
/// per-row thresholds carried along for the matcher.
///
/// Pure data: row index is the dataset-1 row, column index the dataset-2
/// row. The matching itself is a free operation over this type.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    scores: Array2<f64>,
    left_thresholds: Vec<f64>,
    right_thresholds: Vec<f64>,
    checksum: String,
}

impl SimilarityMatrix {
    /// Assemble a matrix from parts, validating shapes.
    pub fn from_parts(
        scores: Array2<f64>,
        left_thresholds: Vec<f64>,
        right_thresholds: Vec<f64>,
        checksum: impl Into<String>,
    ) -> Result<Self, MatchError> {
        let (rows, cols) = scores.dim();
        if left_thresholds.len() != rows || right_thresholds.len() != cols {
            return Err(MatchError::ShapeMismatch {
                rows,
                cols,
                left: left_thresholds.len(),
                right: right_thresholds.len(),
            });
        }
        Ok(Self {
            scores,
            left_thresholds,
            right_thresholds,
            checksum: checksum.into(),
        })
    }

    /// `(n1, n2)` dimensions.
    pub fn dims(&self) -> (usize, usize) {
        self.scores.dim()
    }

    /// Similarity of pair `(i, j)`.
    pub fn score(&self, i: usize, j: usize) -> f64 {
        self.scores[[i, j]]
    }

    pub fn as_array(&self) -> &Array2<f64> {
        &self.scores
    }

    pub fn left_thresholds(&self) -> &[f64] {
        &self.left_thresholds
    }

    pub fn right_thresholds(&self) -> &[f64] {
        &self.right_thresholds
    }

    /// Checksum of the embedder both datasets were produced with.
    pub fn checksum(&self) -> &str {
        &self.checksum
    }
}

/// One-to-one matching between two datasets.
///
/// `left` is strictly ascending; `right` holds the assigned dataset-2 row
/// for each entry, each appearing at most once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Matching {
    left: Vec<usize>,
    right: Vec<usize>,
}

impl Matching {
    pub(crate) fn new(left: Vec<usize>, right: Vec<usize>) -> Self {
        debug_assert_eq!(left.len(), right.len());
        debug_assert!(left.windows(2).all(|w| w[0] < w[1]));
        Self { left, right }
    }

    /// Number of matched pairs.
    pub fn len(&self) -> usize {
        self.left.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    /// Matched dataset-1 rows, ascending.
    pub fn left(&self) -> &[usize] {
        &self.left
    }

    /// Matched dataset-2 rows, aligned with [`left`](Self::left).
    pub fn right(&self) -> &[usize] {
        &self.right
    }

    /// Iterate matched `(left_row, right_row)` pairs.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.left.iter().copied().zip(self.right.iter().copied())
    }
}

/// Errors produced by the comparison and matching layer.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MatchError {
    /// The datasets were embedded with different embedders.
    #[error("embedder checksum mismatch: {left} vs {right}")]
    ConfigMismatch { left: String, right: String },

    /// Matching requires at least one row on each side.
    #[error("{side} dataset is empty; nothing to match")]
    EmptyInput { side: &'static str },

    /// The absolute cutoff must lie in `[0, 1]`.
    #[error("abs_cutoff must be within [0, 1] (got {cutoff})")]
    InvalidCutoff { cutoff: f64 },

    /// Threshold vectors do not match the score matrix shape.
    #[error("matrix is {rows}x{cols} but thresholds are {left}/{right}")]
    ShapeMismatch {
        rows: usize,
        cols: usize,
        left: usize,
        right: usize,
    },

    /// The private index range must cover both datasets.
    #[error("assumed size {size_assumed} is smaller than a dataset of {rows} rows")]
    SizeAssumedTooSmall { size_assumed: usize, rows: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_enforce_thresholds() {
        let opts = MatchOptions::default();
        assert_eq!(opts.abs_cutoff, 0.0);
        assert!(opts.require_thresholds);
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn out_of_range_cutoff_rejected() {
        for cutoff in [-0.5, 1.5, f64::NAN] {
            let opts = MatchOptions::new().with_abs_cutoff(cutoff);
            assert!(
                matches!(opts.validate(), Err(MatchError::InvalidCutoff { .. })),
                "cutoff {cutoff} should be rejected"
            );
        }
    }

    #[test]
    fn from_parts_checks_threshold_lengths() {
        let scores = Array2::<f64>::zeros((2, 3));
        let err =
            SimilarityMatrix::from_parts(scores, vec![0.0; 2], vec![0.0; 2], "c").unwrap_err();
        assert!(matches!(
            err,
            MatchError::ShapeMismatch {
                rows: 2,
                cols: 3,
                left: 2,
                right: 2
            }
        ));
    }

    #[test]
    fn matching_accessors() {
        let matching = Matching::new(vec![0, 1, 2], vec![0, 2, 1]);
        assert_eq!(matching.len(), 3);
        assert_eq!(matching.left(), &[0, 1, 2]);
        assert_eq!(matching.right(), &[0, 2, 1]);
        let pairs: Vec<_> = matching.pairs().collect();
        assert_eq!(pairs, vec![(0, 0), (1, 2), (2, 1)]);
    }
}
