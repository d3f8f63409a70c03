//! Norm and per-row threshold derivation.
//!
//! The threshold of a row is a quantile of its similarity to the *other*
//! rows of its own dataset: if a record resembles a same-dataset neighbor
//! more than any cross-dataset candidate, that candidate cannot be trusted
//! as a unique match. The default quantile of 1.0 takes the maximum.
//!
//! This is the O(N²) hot loop of embedding; rows are independent, so it is
//! parallelized with rayon when the config asks for it. The parallel and
//! sequential paths produce identical numbers.

use rayon::prelude::*;

use crate::record::EmbeddedRecord;
use crate::scm::{identity_norm, similarity, ScmMatrix};

/// Fill in each record's SCM self-norm.
pub(crate) fn compute_norms(records: &mut [EmbeddedRecord], scm: Option<&ScmMatrix>, parallel: bool) {
    let norm_of = |record: &EmbeddedRecord| match scm {
        None => identity_norm(&record.indices),
        Some(scm) => scm.self_norm(&record.indices),
    };
    if parallel {
        records.par_iter_mut().for_each(|r| r.norm = norm_of(r));
    } else {
        for r in records.iter_mut() {
            r.norm = norm_of(r);
        }
    }
}

/// Nearest-rank quantile over an ascending-sorted slice; `q = 1` is the max.
pub(crate) fn quantile_nearest_rank(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = ((sorted.len() - 1) as f64 * q).ceil() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

fn row_threshold(
    i: usize,
    records: &[EmbeddedRecord],
    scm: Option<&ScmMatrix>,
    quantile: f64,
    sample_cap: Option<usize>,
) -> f64 {
    let record = &records[i];
    if record.is_empty() || records.len() < 2 {
        return 0.0;
    }

    let total = records.len() - 1;
    // Deterministic evenly-strided subsample when a cap is set.
    let stride = match sample_cap {
        Some(cap) if cap < total => total.div_ceil(cap),
        _ => 1,
    };

    let mut scores: Vec<f64> = (0..records.len())
        .filter(|&j| j != i)
        .step_by(stride)
        .map(|j| {
            let other = &records[j];
            similarity(&record.indices, record.norm, &other.indices, other.norm, scm)
        })
        .collect();
    scores.sort_unstable_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    quantile_nearest_rank(&scores, quantile)
}

/// Fill in per-row thresholds from the dataset's self-similarity
/// distribution. Norms must already be computed.
pub(crate) fn compute_thresholds(
    records: &mut [EmbeddedRecord],
    scm: Option<&ScmMatrix>,
    quantile: f64,
    sample_cap: Option<usize>,
    parallel: bool,
) {
    let snapshot: &[EmbeddedRecord] = records;
    let thresholds: Vec<f64> = if parallel {
        (0..snapshot.len())
            .into_par_iter()
            .map(|i| row_threshold(i, snapshot, scm, quantile, sample_cap))
            .collect()
    } else {
        (0..snapshot.len())
            .map(|i| row_threshold(i, snapshot, scm, quantile, sample_cap))
            .collect()
    };
    for (record, threshold) in records.iter_mut().zip(thresholds) {
        record.threshold = threshold;
    }
}
