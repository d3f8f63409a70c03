//! Similarity scoring and one-to-one matching for embedded datasets.
//!
//! Given two [`EmbeddedDataset`](embedder::EmbeddedDataset)s produced by the
//! same embedder, [`compare`] builds the dense pairwise Soft-Cosine
//! similarity matrix, and [`matching`] turns that matrix into a one-to-one
//! assignment via the rectangular Hungarian algorithm, honoring the
//! per-row acceptance thresholds and an optional absolute cutoff.
//!
//! ## What you need to know
//!
//! - `compare` refuses datasets whose embedder checksums differ; that gate
//!   runs before any scoring.
//! - Matching over eligible cells only: a cell below the cutoff or the
//!   pair's thresholds is impossible, not merely expensive. Filler
//!   assignments the solver is forced into are dropped from the result.
//! - The Hungarian step is inherently sequential; only scoring
//!   parallelizes.
//!
//! Two helpers round out the matching outputs: [`assign_private_index`]
//! gives both parties an anonymized join key that leaks nothing about match
//! status, and [`match_quality`] scores a matching against known
//! ground-truth identifiers.

mod engine;
mod hungarian;
mod similarity;
mod types;

pub use crate::engine::{assign_private_index, match_quality, matching, MatchQuality};
pub use crate::similarity::compare;
pub use crate::types::{MatchError, MatchOptions, Matching, SimilarityMatrix};
