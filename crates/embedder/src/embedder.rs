//! The embedder: configuration, feature factory, and embedding space.
//!
//! An [`Embedder`] value is what the two linkage parties must share. Its
//! checksum covers the config, the feature factory, and the SCM matrix, and
//! is stamped onto every dataset it embeds; the comparison layer refuses
//! datasets whose checksums differ.

use std::collections::BTreeMap;

use ndarray::Array2;
use rayon::prelude::*;
use sha2::{Digest, Sha256};

use features::{ColumnSpec, FeatureBag, FeatureError, FeatureFactory};

use crate::bloom::bag_indices;
use crate::config::EmbedderConfig;
use crate::error::EmbedderError;
use crate::record::{EmbeddedDataset, EmbeddedRecord};
use crate::scm::{jumble, joint_frequency, nearest_positive_semi_definite, ScmMatrix};
use crate::table::Table;
use crate::thresholds::{compute_norms, compute_thresholds};

/// Options for fitting the SCM matrix from pre-matched datasets.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainOptions {
    /// Accumulate onto the existing frequency tables instead of starting
    /// over, so training can run over several matched batches.
    pub update: bool,
    /// Scaling factor dampening each batch's contribution, in `(0, 1]`.
    pub learning_rate: f32,
    /// Additive constant keeping log-frequencies finite.
    pub eps: f32,
    /// Seed for the deterministic non-match jumble.
    pub seed: u64,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            update: true,
            learning_rate: 1.0,
            eps: 0.01,
            seed: 0xB100_F17E_B100_F17E,
        }
    }
}

/// Bloom filter embedder shared by both linkage parties.
#[derive(Debug)]
pub struct Embedder {
    config: EmbedderConfig,
    factory: FeatureFactory,
    scm: Option<ScmMatrix>,
    freq_matched: Option<Array2<f32>>,
    freq_unmatched: Option<Array2<f32>>,
    checksum: String,
}

impl Embedder {
    /// Build an embedder with the implied identity SCM matrix; comparisons
    /// are plain cosine over Bloom signatures.
    pub fn new(config: EmbedderConfig, factory: FeatureFactory) -> Result<Self, EmbedderError> {
        config.validate()?;
        let checksum = compute_checksum(&config, &factory, None);
        Ok(Self {
            config,
            factory,
            scm: None,
            freq_matched: None,
            freq_unmatched: None,
            checksum,
        })
    }

    /// Build an embedder around an explicit SCM matrix.
    pub fn with_scm(
        config: EmbedderConfig,
        factory: FeatureFactory,
        scm: ScmMatrix,
    ) -> Result<Self, EmbedderError> {
        config.validate()?;
        if scm.size() != config.filter_size {
            return Err(EmbedderError::ScmShape {
                rows: scm.size(),
                cols: scm.size(),
                expected: config.filter_size,
            });
        }
        let checksum = compute_checksum(&config, &factory, Some(&scm));
        Ok(Self {
            config,
            factory,
            scm: Some(scm),
            freq_matched: None,
            freq_unmatched: None,
            checksum,
        })
    }

    pub fn config(&self) -> &EmbedderConfig {
        &self.config
    }

    pub fn factory(&self) -> &FeatureFactory {
        &self.factory
    }

    /// The SCM matrix, when one is loaded or trained; `None` means identity.
    pub fn scm(&self) -> Option<&ScmMatrix> {
        self.scm.as_ref()
    }

    /// Hex digest identifying this embedding space.
    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    /// Extract the aggregate feature bag for one table row.
    pub fn extract_row<T: Table + ?Sized>(
        &self,
        table: &T,
        colspec: &[ColumnSpec],
        row: usize,
    ) -> Result<FeatureBag, EmbedderError> {
        let mut bag = FeatureBag::new();
        for spec in colspec {
            let extractor = self.factory.get(&spec.feature_type)?;
            let value = table.value(row, &spec.column);
            bag.extend(extractor.extract(value, spec.effective_label())?);
        }
        Ok(bag)
    }

    /// Embed every table row into the Bloom space.
    ///
    /// Norms are always computed; thresholds only when requested, since the
    /// threshold pass is the O(N²) part. Rows with empty feature bags embed
    /// to empty signatures rather than failing.
    pub fn embed<T>(
        &self,
        table: &T,
        colspec: &[ColumnSpec],
        update_thresholds: bool,
    ) -> Result<EmbeddedDataset, EmbedderError>
    where
        T: Table + Sync + ?Sized,
    {
        // Resolve every extractor up front so an unknown feature type fails
        // before any row work happens.
        let resolved: Vec<(&ColumnSpec, &features::FeatureExtractor)> = colspec
            .iter()
            .map(|spec| Ok((spec, self.factory.get(&spec.feature_type)?)))
            .collect::<Result<_, FeatureError>>()?;

        let embed_row = |row: usize| -> Result<EmbeddedRecord, EmbedderError> {
            let mut bag = FeatureBag::new();
            let mut retained = if self.config.retain_features {
                Some(BTreeMap::new())
            } else {
                None
            };
            for (spec, extractor) in &resolved {
                let value = table.value(row, &spec.column);
                let shingles = extractor.extract(value, spec.effective_label())?;
                if let Some(map) = retained.as_mut() {
                    map.entry(spec.column.clone())
                        .or_insert_with(Vec::new)
                        .extend(shingles.iter().map(|s| s.render()));
                }
                bag.extend(shingles);
            }
            let indices = bag_indices(
                &bag,
                self.config.salt.as_deref(),
                self.config.filter_size,
                self.config.num_hashes,
            );
            Ok(EmbeddedRecord {
                indices,
                norm: 0.0,
                threshold: 0.0,
                features: retained,
            })
        };

        let mut records: Vec<EmbeddedRecord> = if self.config.use_parallel {
            (0..table.len())
                .into_par_iter()
                .map(embed_row)
                .collect::<Result<_, _>>()?
        } else {
            (0..table.len()).map(embed_row).collect::<Result<_, _>>()?
        };

        compute_norms(&mut records, self.scm.as_ref(), self.config.use_parallel);
        if update_thresholds {
            compute_thresholds(
                &mut records,
                self.scm.as_ref(),
                self.config.threshold_quantile,
                self.config.self_sample_cap,
                self.config.use_parallel,
            );
        }

        Ok(EmbeddedDataset {
            records,
            filter_size: self.config.filter_size,
            checksum: self.checksum.clone(),
        })
    }

    /// Fit the SCM matrix from two datasets of known matches in row order.
    ///
    /// Index co-occurrence frequencies of the true pairing are contrasted
    /// against a jumbled pairing; the log-ratio, projected onto the positive
    /// semi-definite cone, becomes the new SCM matrix. Existing norms and
    /// thresholds on previously embedded datasets are stale after this call
    /// and the checksum changes accordingly.
    pub fn train(
        &mut self,
        left: &EmbeddedDataset,
        right: &EmbeddedDataset,
        opts: &TrainOptions,
    ) -> Result<(), EmbedderError> {
        if left.len() != right.len() {
            return Err(EmbedderError::TrainLengthMismatch {
                left: left.len(),
                right: right.len(),
            });
        }
        if !(opts.learning_rate > 0.0 && opts.learning_rate <= 1.0) {
            return Err(EmbedderError::TrainBadLearningRate {
                rate: opts.learning_rate,
            });
        }
        if opts.eps < 0.0 {
            return Err(EmbedderError::TrainBadEpsilon { eps: opts.eps });
        }

        let m = self.config.filter_size;
        let x: Vec<Vec<u32>> = left.iter().map(|r| r.indices.clone()).collect();
        let y: Vec<Vec<u32>> = right.iter().map(|r| r.indices.clone()).collect();
        let y_jumbled = jumble(&y, opts.seed);

        let matched = joint_frequency(&x, &y, m) * opts.learning_rate;
        let unmatched = joint_frequency(&x, &y_jumbled, m) * opts.learning_rate;

        match (&mut self.freq_matched, &mut self.freq_unmatched) {
            (Some(fm), Some(fu)) if opts.update => {
                *fm += &matched;
                *fu += &unmatched;
            }
            _ => {
                self.freq_matched = Some(Array2::eye(m) + &matched);
                self.freq_unmatched = Some(Array2::eye(m) + &unmatched);
            }
        }

        let fm = self.freq_matched.as_ref().expect("set above");
        let fu = self.freq_unmatched.as_ref().expect("set above");
        let eps = opts.eps as f64;
        let log_ratio = Array2::from_shape_fn((m, m), |(i, j)| {
            (fm[[i, j]] as f64 + eps).ln() - (fu[[i, j]] as f64 + eps).ln()
        });

        let psd = nearest_positive_semi_definite(&log_ratio, 1e-6);
        let scm = ScmMatrix::from_matrix(psd.mapv(|v| v as f32), m)?;
        self.checksum = compute_checksum(&self.config, &self.factory, Some(&scm));
        self.scm = Some(scm);
        Ok(())
    }
}

/// SHA-256 digest over the embedding-space identity: the semantic config
/// fields, the factory, and the SCM matrix. Execution preferences such as
/// `use_parallel` and `retain_features` are deliberately excluded; they do
/// not change what the embeddings mean.
fn compute_checksum(
    config: &EmbedderConfig,
    factory: &FeatureFactory,
    scm: Option<&ScmMatrix>,
) -> String {
    #[derive(serde::Serialize)]
    struct Identity<'a> {
        version: u32,
        filter_size: usize,
        num_hashes: u32,
        salt: Option<&'a str>,
        threshold_quantile: f64,
        self_sample_cap: Option<usize>,
    }

    let identity = Identity {
        version: config.version,
        filter_size: config.filter_size,
        num_hashes: config.num_hashes,
        salt: config.salt.as_deref(),
        threshold_quantile: config.threshold_quantile,
        self_sample_cap: config.self_sample_cap,
    };

    let mut hasher = Sha256::new();
    let identity_json = serde_json::to_vec(&identity).expect("config serializes");
    hasher.update(&identity_json);
    hasher.update([0u8]);
    let factory_json = serde_json::to_vec(factory).expect("factory serializes");
    hasher.update(&factory_json);
    hasher.update([0u8]);
    if let Some(scm) = scm {
        for value in scm.as_array().iter() {
            hasher.update(value.to_le_bytes());
        }
    }
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}
