//! Bloom filter embedding for privacy-preserving record linkage.
//!
//! This crate turns tabular records into fixed-width Bloom filter
//! signatures that can be compared without exchanging the underlying
//! values. Given a [`Table`] and a column specification, the [`Embedder`]:
//!
//! 1. extracts each configured column into labeled shingles,
//! 2. double-hashes every shingle into `k` bit positions of an `m`-wide
//!    filter (SHA-256, with an optional shared salt),
//! 3. computes each record's Soft-Cosine self-norm, and
//! 4. optionally derives a per-row acceptance threshold from the record's
//!    similarity to the rest of its own dataset.
//!
//! The result is an [`EmbeddedDataset`] that round-trips through a
//! JSON-lines wire format; the embedder itself round-trips through a
//! compressed, versioned blob that both parties load before embedding.
//!
//! ## Quick example
//!
//! ```
//! use embedder::{DataTable, Embedder, EmbedderConfig};
//! use features::{ColumnSpec, FeatureFactory};
//!
//! let table = DataTable::from_rows(
//!     vec!["first", "last"],
//!     vec![
//!         vec![Some("Laura".into()), Some("Ochoa".into())],
//!         vec![Some("Mark".into()), Some("Speer".into())],
//!     ],
//! )
//! .unwrap();
//!
//! let embedder = Embedder::new(EmbedderConfig::default(), FeatureFactory::standard()).unwrap();
//! let colspec = vec![
//!     ColumnSpec::new("first", "name"),
//!     ColumnSpec::new("last", "name"),
//! ];
//!
//! let dataset = embedder.embed(&table, &colspec, true).unwrap();
//! assert_eq!(dataset.len(), 2);
//! assert!(dataset.records[0].norm > 0.0);
//! ```

pub mod blob;
pub mod bloom;
pub mod config;
pub mod error;
pub mod record;
pub mod scm;
pub mod table;
mod embedder;
mod thresholds;

pub use crate::blob::{BLOB_MAGIC, BLOB_VERSION};
pub use crate::bloom::{bag_indices, shingle_digests, shingle_positions};
pub use crate::config::{EmbedderConfig, CONFIG_VERSION};
pub use crate::embedder::{Embedder, TrainOptions};
pub use crate::error::{EmbedderError, SerializationError};
pub use crate::record::{EmbeddedDataset, EmbeddedRecord, DATASET_FORMAT_VERSION};
pub use crate::scm::{identity_norm, intersection_size, similarity, ScmMatrix};
pub use crate::table::{DataTable, Table};
