//! One-to-one matching over a similarity matrix.
//!
//! Eligibility first: a cell must clear the absolute cutoff, the pair's
//! per-row thresholds when enforced, and must be strictly positive (an
//! all-zero record can never be matched). The assignment step then runs the
//! rectangular Hungarian solver over negated similarities, with ineligible
//! cells carried as a large constant penalty; pairs the solver was forced to
//! place on penalty cells are filler and are dropped from the result.

use ndarray::Array2;
use rand::Rng;

use crate::hungarian;
use crate::types::{MatchError, MatchOptions, Matching, SimilarityMatrix};

/// Penalty cost for ineligible cells. Large enough that the solver only
/// lands on one when an assignment is structurally unavoidable.
const INELIGIBLE_COST: f64 = 1e6;

fn eligible(sim: &SimilarityMatrix, opts: &MatchOptions, i: usize, j: usize) -> bool {
    let score = sim.score(i, j);
    if score <= 0.0 || score < opts.abs_cutoff {
        return false;
    }
    if opts.require_thresholds {
        let bar = sim.left_thresholds()[i].max(sim.right_thresholds()[j]);
        if score < bar {
            return false;
        }
    }
    true
}

/// Compute the best one-to-one matching for a similarity matrix.
///
/// Deterministic for identical input; equal-weight alternatives resolve
/// toward the smaller left index, then the smaller right index. An empty
/// result is valid; [`MatchError::EmptyInput`] only flags a dataset with no
/// rows at all.
pub fn matching(sim: &SimilarityMatrix, opts: &MatchOptions) -> Result<Matching, MatchError> {
    opts.validate()?;
    let (n1, n2) = sim.dims();
    if n1 == 0 {
        return Err(MatchError::EmptyInput { side: "left" });
    }
    if n2 == 0 {
        return Err(MatchError::EmptyInput { side: "right" });
    }

    let cell_cost = |i: usize, j: usize| {
        if eligible(sim, opts, i, j) {
            1.0 - sim.score(i, j)
        } else {
            INELIGIBLE_COST
        }
    };

    // The solver wants nr <= nc; transpose the cost matrix when dataset 1
    // is the larger side and map assignments back.
    let mut pairs: Vec<(usize, usize)> = if n1 <= n2 {
        let cost = Array2::from_shape_fn((n1, n2), |(i, j)| cell_cost(i, j));
        hungarian::solve(&cost)
            .into_iter()
            .enumerate()
            .collect()
    } else {
        let cost = Array2::from_shape_fn((n2, n1), |(j, i)| cell_cost(i, j));
        hungarian::solve(&cost)
            .into_iter()
            .enumerate()
            .map(|(j, i)| (i, j))
            .collect()
    };

    pairs.retain(|&(i, j)| eligible(sim, opts, i, j));
    pairs.sort_unstable();

    let (left, right) = pairs.into_iter().unzip();
    Ok(Matching::new(left, right))
}

impl SimilarityMatrix {
    /// Convenience wrapper around [`matching`].
    pub fn matching(&self, opts: &MatchOptions) -> Result<Matching, MatchError> {
        matching(self, opts)
    }
}

/// Assign an anonymous shared index to both datasets.
///
/// Matched rows receive the same index value on both sides; unmatched rows
/// receive distinct values drawn from the same fixed range
/// `[size_assumed, 3 * size_assumed)`, so the outputs reveal nothing about
/// which rows found a partner. Requires unique one-to-one matches, which
/// [`Matching`] guarantees.
pub fn assign_private_index<R: Rng + ?Sized>(
    n_left: usize,
    n_right: usize,
    matching: &Matching,
    size_assumed: usize,
    rng: &mut R,
) -> Result<(Vec<u64>, Vec<u64>), MatchError> {
    let rows = n_left.max(n_right);
    if size_assumed < rows {
        return Err(MatchError::SizeAssumedTooSmall { size_assumed, rows });
    }

    let inner = matching.len();
    let outer = n_left + n_right - inner;
    let draw = rand::seq::index::sample(rng, 2 * size_assumed, outer);
    let value = |slot: usize| (size_assumed + draw.index(slot)) as u64;

    let mut left_out = vec![u64::MAX; n_left];
    let mut right_out = vec![u64::MAX; n_right];
    for (slot, (i, j)) in matching.pairs().enumerate() {
        left_out[i] = value(slot);
        right_out[j] = value(slot);
    }

    let mut slot = inner;
    for cell in left_out.iter_mut().filter(|c| **c == u64::MAX) {
        *cell = value(slot);
        slot += 1;
    }
    for cell in right_out.iter_mut().filter(|c| **c == u64::MAX) {
        *cell = value(slot);
        slot += 1;
    }

    Ok((left_out, right_out))
}

/// Quality of a matching against known ground-truth identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchQuality {
    /// Matched pairs whose identifiers agree.
    pub true_positives: usize,
    /// Matched pairs whose identifiers differ.
    pub false_positives: usize,
    /// True pairs that exist at all: left identifiers present in the right
    /// dataset (identifiers are assumed unique per dataset).
    pub attainable: usize,
}

impl MatchQuality {
    pub fn precision(&self) -> f64 {
        let matched = self.true_positives + self.false_positives;
        if matched == 0 {
            0.0
        } else {
            self.true_positives as f64 / matched as f64
        }
    }

    pub fn recall(&self) -> f64 {
        if self.attainable == 0 {
            0.0
        } else {
            self.true_positives as f64 / self.attainable as f64
        }
    }
}

/// Count true and false positives of a matching given per-row identifiers.
pub fn match_quality<I: Eq + std::hash::Hash>(
    truth_left: &[I],
    truth_right: &[I],
    matching: &Matching,
) -> MatchQuality {
    let right_ids: std::collections::HashSet<&I> = truth_right.iter().collect();
    let attainable = truth_left.iter().filter(|id| right_ids.contains(id)).count();

    let true_positives = matching
        .pairs()
        .filter(|&(i, j)| truth_left[i] == truth_right[j])
        .count();

    MatchQuality {
        true_positives,
        false_positives: matching.len() - true_positives,
        attainable,
    }
}
