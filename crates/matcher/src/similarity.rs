//! Pairwise similarity scoring between two embedded datasets.

use ndarray::Array2;
use rayon::prelude::*;

use embedder::{similarity, EmbeddedDataset, Embedder};

use crate::types::{MatchError, SimilarityMatrix};

/// Score every dataset-1 row against every dataset-2 row.
///
/// Both datasets must have been produced by `embedder`; checksum equality is
/// verified before any scoring happens and a mismatch fails with
/// [`MatchError::ConfigMismatch`]. Empty records contribute zero rows or
/// columns rather than NaN. Scoring is parallel across dataset-1 rows when
/// the embedder config enables it, with bit-identical results.
pub fn compare(
    embedder: &Embedder,
    left: &EmbeddedDataset,
    right: &EmbeddedDataset,
) -> Result<SimilarityMatrix, MatchError> {
    if left.checksum != right.checksum {
        return Err(MatchError::ConfigMismatch {
            left: left.checksum.clone(),
            right: right.checksum.clone(),
        });
    }
    if left.checksum != embedder.checksum() {
        return Err(MatchError::ConfigMismatch {
            left: embedder.checksum().to_string(),
            right: left.checksum.clone(),
        });
    }

    let (n1, n2) = (left.len(), right.len());
    let scm = embedder.scm();

    let scores = if n1 == 0 || n2 == 0 {
        Array2::zeros((n1, n2))
    } else {
        let score_row = |i: usize, out: &mut [f64]| {
            let a = &left.records[i];
            for (j, b) in right.records.iter().enumerate() {
                out[j] = similarity(&a.indices, a.norm, &b.indices, b.norm, scm);
            }
        };
        let mut flat = vec![0.0f64; n1 * n2];
        if embedder.config().use_parallel {
            flat.par_chunks_mut(n2)
                .enumerate()
                .for_each(|(i, chunk)| score_row(i, chunk));
        } else {
            for (i, chunk) in flat.chunks_mut(n2).enumerate() {
                score_row(i, chunk);
            }
        }
        Array2::from_shape_vec((n1, n2), flat).expect("flat buffer matches dims")
    };

    SimilarityMatrix::from_parts(
        scores,
        left.iter().map(|r| r.threshold).collect(),
        right.iter().map(|r| r.threshold).collect(),
        left.checksum.clone(),
    )
}
