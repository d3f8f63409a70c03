//! Configuration for the Bloom embedding layer.
//!
//! Both linkage parties must construct their embedder from the *same*
//! configuration (usually by exchanging the serialized blob); the checksum
//! derived from it is what `compare` uses to reject mismatched datasets.

use serde::{Deserialize, Serialize};

use crate::error::EmbedderError;

/// Configuration schema version for [`EmbedderConfig`].
pub const CONFIG_VERSION: u32 = 1;

/// Parameters of the Bloom filter embedding space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedderConfig {
    /// Configuration schema version. Any change that can alter embeddings
    /// must bump this so stale datasets are rejected rather than silently
    /// compared.
    pub version: u32,
    /// Bloom filter width `m`. A power of two keeps the double-hash modulo
    /// well distributed but is not required.
    pub filter_size: usize,
    /// Number of hash positions `k` set per shingle.
    pub num_hashes: u32,
    /// Optional cryptographic salt prepended to every hashed shingle. Both
    /// parties must agree on it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salt: Option<String>,
    /// Quantile of the self-similarity distribution used as each row's
    /// match-acceptance threshold. `1.0` (the default) takes the maximum:
    /// no same-dataset row may out-score the accepted match.
    pub threshold_quantile: f64,
    /// Cap on the number of same-dataset rows sampled per threshold. `None`
    /// compares against all `N - 1` others; a cap subsamples them with a
    /// deterministic stride.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_sample_cap: Option<usize>,
    /// Keep the extracted shingle strings on each record for inspection.
    /// Off by default: retained features reveal the raw tokens.
    pub retain_features: bool,
    /// Parallelize embedding, threshold derivation, and comparison across
    /// rows. Results are identical to the sequential path.
    pub use_parallel: bool,
}

impl EmbedderConfig {
    /// Create a configuration with the stock parameters (`m = 1024`,
    /// `k = 2`, maximum-threshold).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the Bloom filter width `m`.
    pub fn with_filter_size(mut self, filter_size: usize) -> Self {
        self.filter_size = filter_size;
        self
    }

    /// Set the number of hash positions `k` per shingle.
    pub fn with_num_hashes(mut self, num_hashes: u32) -> Self {
        self.num_hashes = num_hashes;
        self
    }

    /// Set the shared hashing salt.
    pub fn with_salt(mut self, salt: impl Into<String>) -> Self {
        self.salt = Some(salt.into());
        self
    }

    /// Set the self-similarity quantile used for thresholds.
    pub fn with_threshold_quantile(mut self, quantile: f64) -> Self {
        self.threshold_quantile = quantile;
        self
    }

    /// Cap the self-comparison set used for threshold derivation.
    pub fn with_self_sample_cap(mut self, cap: usize) -> Self {
        self.self_sample_cap = Some(cap);
        self
    }

    /// Retain extracted feature strings on embedded records.
    pub fn with_retain_features(mut self, retain: bool) -> Self {
        self.retain_features = retain;
        self
    }

    /// Enable or disable row-parallel execution.
    pub fn with_parallel(mut self, use_parallel: bool) -> Self {
        self.use_parallel = use_parallel;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), EmbedderError> {
        if self.version < 1 {
            return Err(EmbedderError::InvalidConfigVersion {
                version: self.version,
            });
        }
        if self.filter_size < 1 {
            return Err(EmbedderError::InvalidConfigSize {
                m: self.filter_size,
            });
        }
        if self.num_hashes < 1 {
            return Err(EmbedderError::InvalidConfigHashes { k: self.num_hashes });
        }
        if !(0.0..=1.0).contains(&self.threshold_quantile) || self.threshold_quantile.is_nan() {
            return Err(EmbedderError::InvalidConfigQuantile {
                quantile: self.threshold_quantile,
            });
        }
        if self.self_sample_cap == Some(0) {
            return Err(EmbedderError::InvalidConfigSampleCap);
        }
        Ok(())
    }
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            filter_size: 1024,
            num_hashes: 2,
            salt: None,
            threshold_quantile: 1.0,
            self_sample_cap: None,
            retain_features: false,
            use_parallel: false,
        }
    }
}
