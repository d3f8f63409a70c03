//! Error types for the embedding layer.

use features::FeatureError;
use thiserror::Error;

/// Errors produced while configuring or running the embedder.
#[derive(Debug, Error)]
pub enum EmbedderError {
    #[error("invalid config: filter size must be >= 1 (got {m})")]
    InvalidConfigSize { m: usize },

    #[error("invalid config: num_hashes must be >= 1 (got {k})")]
    InvalidConfigHashes { k: u32 },

    #[error("invalid config version {version}; expected >= 1")]
    InvalidConfigVersion { version: u32 },

    #[error("invalid config: threshold quantile must be within [0, 1] (got {quantile})")]
    InvalidConfigQuantile { quantile: f64 },

    #[error("invalid config: self-similarity sample cap must be >= 1 when set")]
    InvalidConfigSampleCap,

    #[error("similarity matrix is {rows}x{cols}; expected {expected}x{expected}")]
    ScmShape {
        rows: usize,
        cols: usize,
        expected: usize,
    },

    #[error("similarity matrix is not symmetric at ({row}, {col})")]
    ScmNotSymmetric { row: usize, col: usize },

    #[error("table row {row} has {found} cells; expected {expected}")]
    TableShape {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("training datasets must pair up row for row (left {left}, right {right})")]
    TrainLengthMismatch { left: usize, right: usize },

    #[error("training learning rate must be in (0, 1] (got {rate})")]
    TrainBadLearningRate { rate: f32 },

    #[error("training epsilon must be non-negative (got {eps})")]
    TrainBadEpsilon { eps: f32 },

    #[error("feature extraction failed: {0}")]
    Feature(#[from] FeatureError),

    #[error("serialization failed: {0}")]
    Serialization(#[from] SerializationError),
}

/// Errors produced while moving datasets or embedder blobs across the wire.
#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed JSON on line {line}: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("missing or malformed dataset header line")]
    Header,

    #[error("dataset format version {found} is not supported (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("bit index {index} out of range for filter size {m}")]
    IndexOutOfRange { index: u32, m: usize },

    #[error("embedder blob is missing its magic prefix")]
    BadMagic,

    #[error("embedder blob version {found} is not supported (expected {expected})")]
    UnsupportedBlobVersion { found: u16, expected: u16 },

    #[error("embedder blob payload is corrupt: {0}")]
    Payload(String),
}
