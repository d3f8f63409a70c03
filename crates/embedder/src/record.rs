//! Embedded record and dataset types, plus the row-oriented wire format.
//!
//! A dataset serializes as JSON lines: a header object carrying the format
//! version, the filter size, and the embedder checksum, followed by one
//! object per record. The per-record structure is the contract; file
//! framing is the caller's business.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::SerializationError;

/// Wire format version for serialized datasets.
pub const DATASET_FORMAT_VERSION: u32 = 1;

/// One embedded row: the sparse Bloom signature plus its SCM self-norm and
/// match-acceptance threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedRecord {
    /// Sorted, deduplicated set bit positions, each `< m`.
    pub indices: Vec<u32>,
    /// SCM self-norm `sqrt(vᵀSv)`; zero iff `indices` is empty.
    pub norm: f64,
    /// Minimum acceptable cross-dataset similarity for this row, in `[0, 1]`.
    pub threshold: f64,
    /// Extracted shingle strings per column, retained only when the embedder
    /// was configured for debugging.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<BTreeMap<String, Vec<String>>>,
}

impl EmbeddedRecord {
    /// A record whose feature bag was empty embeds to nothing and scores
    /// zero against every counterparty.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Ordered collection of embedded records sharing one embedder.
///
/// Row position is the identity the matcher reports, so order must be
/// preserved end to end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedDataset {
    /// Records in input-table order.
    pub records: Vec<EmbeddedRecord>,
    /// Bloom filter width the records were embedded into.
    pub filter_size: usize,
    /// Checksum of the producing embedder; `compare` refuses datasets whose
    /// checksums differ.
    pub checksum: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct DatasetHeader {
    version: u32,
    m: usize,
    checksum: String,
}

impl EmbeddedDataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EmbeddedRecord> {
        self.records.iter()
    }

    /// Serialize as JSON lines: header first, one record per line after.
    pub fn to_jsonl(&self) -> Result<String, SerializationError> {
        let header = DatasetHeader {
            version: DATASET_FORMAT_VERSION,
            m: self.filter_size,
            checksum: self.checksum.clone(),
        };
        let mut out = serde_json::to_string(&header).map_err(|source| SerializationError::Json {
            line: 1,
            source,
        })?;
        out.push('\n');
        for (i, record) in self.records.iter().enumerate() {
            let line =
                serde_json::to_string(record).map_err(|source| SerializationError::Json {
                    line: i + 2,
                    source,
                })?;
            out.push_str(&line);
            out.push('\n');
        }
        Ok(out)
    }

    /// Parse the JSON-lines form produced by [`to_jsonl`](Self::to_jsonl).
    ///
    /// Indices are re-normalized to sorted/deduplicated order and validated
    /// against the header's filter size.
    pub fn from_jsonl(input: &str) -> Result<Self, SerializationError> {
        let mut lines = input.lines().enumerate().filter(|(_, l)| !l.trim().is_empty());

        let (_, header_line) = lines.next().ok_or(SerializationError::Header)?;
        let header: DatasetHeader =
            serde_json::from_str(header_line).map_err(|_| SerializationError::Header)?;
        if header.version != DATASET_FORMAT_VERSION {
            return Err(SerializationError::UnsupportedVersion {
                found: header.version,
                expected: DATASET_FORMAT_VERSION,
            });
        }

        let mut records = Vec::new();
        for (idx, line) in lines {
            let mut record: EmbeddedRecord =
                serde_json::from_str(line).map_err(|source| SerializationError::Json {
                    line: idx + 1,
                    source,
                })?;
            record.indices.sort_unstable();
            record.indices.dedup();
            if let Some(&last) = record.indices.last() {
                if last as usize >= header.m {
                    return Err(SerializationError::IndexOutOfRange {
                        index: last,
                        m: header.m,
                    });
                }
            }
            records.push(record);
        }

        Ok(Self {
            records,
            filter_size: header.m,
            checksum: header.checksum,
        })
    }
}
