//! Feature extraction for record linkage.
//!
//! This crate turns raw field values into *shingles*: short labeled tokens
//! (character n-grams, date components, phonetic codes) that downstream
//! layers hash into Bloom filter embeddings. Every shingle carries a field
//! label so that identical tokens from unrelated columns never collide.
//!
//! ## What you need to know
//!
//! - Extractors are pure functions of `(value, label)`. No I/O, no
//!   randomness: same input = same bag of shingles.
//! - Missing or empty input produces an *empty* bag, never an error. Records
//!   with empty bags embed to empty filters and simply score zero downstream.
//! - The [`FeatureFactory`] maps caller-chosen type names to concrete
//!   extractors; a [`ColumnSpec`] maps dataset columns onto those names.
//!   Both are serde-friendly so they can travel inside the embedder blob.
//!
//! ## Quick example
//!
//! ```
//! use features::{FeatureExtractor, NAME_LABEL};
//!
//! let extractor = FeatureExtractor::name();
//! let bag = extractor.extract(Some("Laura Ochoa"), "first_name").unwrap();
//!
//! assert!(bag.iter().all(|s| s.label == NAME_LABEL));
//! assert!(bag.iter().any(|s| s.token == "la"));
//! ```

pub mod error;
pub mod extractors;
pub mod factory;
pub mod normalize;
pub mod phonetic;
pub mod shingle;

pub use crate::error::FeatureError;
pub use crate::extractors::{
    FeatureExtractor, DOB_DAY_LABEL, DOB_MONTH_LABEL, DOB_YEAR_LABEL, NAME_LABEL, SEX_LABEL,
};
pub use crate::factory::{ColumnSpec, FeatureFactory};
pub use crate::phonetic::double_metaphone;
pub use crate::shingle::{FeatureBag, Shingle};
