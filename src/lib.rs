//! Workspace umbrella crate for Bloom filter record linkage.
//!
//! `bloomlink` re-exports the feature extraction, embedding, and matching
//! layers so applications can drive the full linkage flow through a single
//! dependency. The pipeline helpers [`embed_table`], [`compare_datasets`],
//! [`match_datasets`], and [`link`] orchestrate the stages end-to-end,
//! while the member crates stay usable on their own for callers that only
//! need one layer.
//!
//! ## Quick start
//!
//! Both parties construct (or load from the exchanged blob) the same
//! [`Embedder`], embed their own table, and one of them compares and
//! matches the two embedded datasets:
//!
//! ```
//! use bloomlink::{
//!     link, ColumnSpec, DataTable, Embedder, EmbedderConfig, FeatureFactory, MatchOptions,
//! };
//!
//! # fn demo() -> Result<(), bloomlink::LinkageError> {
//! let embedder = Embedder::new(EmbedderConfig::default(), FeatureFactory::standard())?;
//!
//! let band = DataTable::from_rows(
//!     vec!["first", "last"],
//!     vec![
//!         vec![Some("Laura".into()), Some("Ochoa".into())],
//!         vec![Some("Mark".into()), Some("Speer".into())],
//!     ],
//! )?;
//! let roster = DataTable::from_rows(
//!     vec!["full_name"],
//!     vec![
//!         vec![Some("Marc Spear".into())],
//!         vec![Some("Laura Lee Ochoa".into())],
//!     ],
//! )?;
//!
//! let colspec_band = vec![
//!     ColumnSpec::new("first", "name"),
//!     ColumnSpec::new("last", "name"),
//! ];
//! let colspec_roster = vec![ColumnSpec::new("full_name", "name")];
//!
//! let outcome = link(
//!     &embedder,
//!     &band,
//!     &colspec_band,
//!     &roster,
//!     &colspec_roster,
//!     &MatchOptions::default(),
//! )?;
//! assert_eq!(outcome.matching.left(), &[0, 1]);
//! assert_eq!(outcome.matching.right(), &[1, 0]);
//! # Ok(())
//! # }
//! # demo().unwrap();
//! ```
//!
//! ## Observability
//!
//! The core writes no logs on its own. Deployments that want telemetry
//! install a [`LinkageMetrics`] recorder via [`set_linkage_metrics`] and/or
//! a [`LinkageEventLogger`] via [`set_linkage_logger`]; the pipeline
//! helpers then report per-stage latency, row counts, and outcomes.
//! [`KeyValueLogger`] is a ready-made logger that writes escaped
//! `key="value"` lines to any writer.
//!
//! ## Errors
//!
//! Failures from any layer converge on [`LinkageError`], which preserves
//! the source error so callers can match on the stage that failed without
//! depending on the individual workspace crates.

pub use embedder::{
    bag_indices, identity_norm, intersection_size, shingle_digests, shingle_positions,
    similarity, DataTable, EmbeddedDataset, EmbeddedRecord, Embedder, EmbedderConfig,
    EmbedderError, ScmMatrix, SerializationError, Table, TrainOptions, BLOB_MAGIC,
    BLOB_VERSION, CONFIG_VERSION, DATASET_FORMAT_VERSION,
};
pub use features::{
    double_metaphone, ColumnSpec, FeatureBag, FeatureError, FeatureExtractor, FeatureFactory,
    Shingle, DOB_DAY_LABEL, DOB_MONTH_LABEL, DOB_YEAR_LABEL, NAME_LABEL, SEX_LABEL,
};
pub use matcher::{
    assign_private_index, compare, match_quality, matching, MatchError, MatchOptions,
    MatchQuality, Matching, SimilarityMatrix,
};

use std::error::Error;
use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, OnceLock, RwLock};
use std::time::{Duration, Instant};

use chrono::{SecondsFormat, Utc};

/// Errors that can occur while running the linkage pipeline.
#[derive(Debug)]
pub enum LinkageError {
    Feature(FeatureError),
    Embedder(EmbedderError),
    Match(MatchError),
}

impl fmt::Display for LinkageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkageError::Feature(err) => write!(f, "feature extraction failure: {err}"),
            LinkageError::Embedder(err) => write!(f, "embedding failure: {err}"),
            LinkageError::Match(err) => write!(f, "matching failure: {err}"),
        }
    }
}

impl Error for LinkageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            LinkageError::Feature(err) => Some(err),
            LinkageError::Embedder(err) => Some(err),
            LinkageError::Match(err) => Some(err),
        }
    }
}

impl From<FeatureError> for LinkageError {
    fn from(value: FeatureError) -> Self {
        LinkageError::Feature(value)
    }
}

impl From<EmbedderError> for LinkageError {
    fn from(value: EmbedderError) -> Self {
        LinkageError::Embedder(value)
    }
}

impl From<MatchError> for LinkageError {
    fn from(value: MatchError) -> Self {
        LinkageError::Match(value)
    }
}

/// Pipeline stage captured in observability events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkageStage {
    Embed,
    Compare,
    Match,
}

impl fmt::Display for LinkageStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LinkageStage::Embed => "embed",
            LinkageStage::Compare => "compare",
            LinkageStage::Match => "match",
        };
        f.write_str(name)
    }
}

/// Outcome of a pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkageEventStatus {
    Success,
    Failure,
}

impl fmt::Display for LinkageEventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LinkageEventStatus::Success => "success",
            LinkageEventStatus::Failure => "failure",
        };
        f.write_str(label)
    }
}

/// Structured observation describing the outcome of a pipeline stage.
#[derive(Debug, Clone)]
pub struct LinkageEvent {
    pub stage: LinkageStage,
    pub status: LinkageEventStatus,
    pub latency: Duration,
    /// Rows processed: table rows for embed, matrix cells for compare,
    /// matched pairs for match.
    pub rows: usize,
    pub error: Option<String>,
}

impl LinkageEvent {
    fn format_key_values(&self, include_timestamp: bool) -> String {
        let mut parts = Vec::new();
        if include_timestamp {
            let ts = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
            parts.push(format!("timestamp=\"{ts}\""));
        }
        let stage = self.stage;
        parts.push(format!("stage={stage}"));
        let status = self.status;
        parts.push(format!("status={status}"));
        let latency_us = self.latency.as_micros();
        parts.push(format!("latency_us={latency_us}"));
        let rows = self.rows;
        parts.push(format!("rows={rows}"));
        if let Some(error) = &self.error {
            let error = escape_kv(error);
            parts.push(format!("error=\"{error}\""));
        }
        parts.join(" ")
    }
}

fn escape_kv(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
}

/// Metrics observer for pipeline stages.
pub trait LinkageMetrics: Send + Sync {
    fn record_embed(&self, latency: Duration, rows: usize, ok: bool);
    fn record_compare(&self, latency: Duration, cells: usize, ok: bool);
    fn record_match(&self, latency: Duration, pairs: usize, ok: bool);
}

/// Hook for emitting structured events per pipeline stage.
pub trait LinkageEventLogger: Send + Sync {
    fn log(&self, event: &LinkageEvent);
}

/// Simple key-value logger that writes structured events to any writer.
pub struct KeyValueLogger {
    writer: Arc<Mutex<Box<dyn Write + Send>>>,
    include_timestamp: bool,
}

impl KeyValueLogger {
    /// Create a logger that writes to stdout.
    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    /// Create a logger backed by the provided writer.
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Arc::new(Mutex::new(writer)),
            include_timestamp: true,
        }
    }

    /// Toggle timestamp emission for the structured log line.
    pub fn with_timestamps(mut self, include_timestamp: bool) -> Self {
        self.include_timestamp = include_timestamp;
        self
    }
}

impl LinkageEventLogger for KeyValueLogger {
    fn log(&self, event: &LinkageEvent) {
        if let Ok(mut writer) = self.writer.lock() {
            let line = event.format_key_values(self.include_timestamp);
            let _ = writeln!(writer, "{line}");
        }
    }
}

/// Install or clear the global linkage metrics recorder.
pub fn set_linkage_metrics(recorder: Option<Arc<dyn LinkageMetrics>>) {
    let lock = metrics_lock();
    let mut guard = lock.write().expect("linkage metrics lock poisoned");
    *guard = recorder;
}

fn metrics_lock() -> &'static RwLock<Option<Arc<dyn LinkageMetrics>>> {
    static METRICS: OnceLock<RwLock<Option<Arc<dyn LinkageMetrics>>>> = OnceLock::new();
    METRICS.get_or_init(|| RwLock::new(None))
}

fn metrics_recorder() -> Option<Arc<dyn LinkageMetrics>> {
    let guard = metrics_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}

/// Install or clear the structured linkage event logger.
pub fn set_linkage_logger(logger: Option<Arc<dyn LinkageEventLogger>>) {
    let lock = logger_lock();
    let mut guard = lock.write().expect("linkage logger lock poisoned");
    *guard = logger;
}

fn logger_lock() -> &'static RwLock<Option<Arc<dyn LinkageEventLogger>>> {
    static LOGGER: OnceLock<RwLock<Option<Arc<dyn LinkageEventLogger>>>> = OnceLock::new();
    LOGGER.get_or_init(|| RwLock::new(None))
}

fn linkage_logger() -> Option<Arc<dyn LinkageEventLogger>> {
    let guard = logger_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}

struct StageSpan {
    recorder: Option<Arc<dyn LinkageMetrics>>,
    logger: Option<Arc<dyn LinkageEventLogger>>,
    stage: LinkageStage,
    start: Instant,
}

impl StageSpan {
    fn start(stage: LinkageStage) -> Option<Self> {
        let recorder = metrics_recorder();
        let logger = linkage_logger();
        if recorder.is_none() && logger.is_none() {
            return None;
        }
        Some(Self {
            recorder,
            logger,
            stage,
            start: Instant::now(),
        })
    }

    fn finish(self, rows: usize, error: Option<String>) {
        let latency = self.start.elapsed();
        let ok = error.is_none();
        if let Some(logger) = self.logger.as_ref() {
            let status = if ok {
                LinkageEventStatus::Success
            } else {
                LinkageEventStatus::Failure
            };
            logger.log(&LinkageEvent {
                stage: self.stage,
                status,
                latency,
                rows,
                error,
            });
        }
        if let Some(recorder) = self.recorder {
            match self.stage {
                LinkageStage::Embed => recorder.record_embed(latency, rows, ok),
                LinkageStage::Compare => recorder.record_compare(latency, rows, ok),
                LinkageStage::Match => recorder.record_match(latency, rows, ok),
            }
        }
    }
}

fn observe<T, F>(stage: LinkageStage, rows_of: fn(&T) -> usize, run: F) -> Result<T, LinkageError>
where
    F: FnOnce() -> Result<T, LinkageError>,
{
    let span = StageSpan::start(stage);
    let result = run();
    if let Some(span) = span {
        match &result {
            Ok(value) => span.finish(rows_of(value), None),
            Err(err) => span.finish(0, Some(err.to_string())),
        }
    }
    result
}

/// Embed a table with per-stage observability.
///
/// Thresholds are computed by default here: the pipeline helpers assume a
/// full linkage run where thresholds gate the matching.
pub fn embed_table<T>(
    embedder: &Embedder,
    table: &T,
    colspec: &[ColumnSpec],
    update_thresholds: bool,
) -> Result<EmbeddedDataset, LinkageError>
where
    T: Table + Sync + ?Sized,
{
    observe(LinkageStage::Embed, EmbeddedDataset::len, || {
        Ok(embedder.embed(table, colspec, update_thresholds)?)
    })
}

/// Compare two embedded datasets with per-stage observability.
pub fn compare_datasets(
    embedder: &Embedder,
    left: &EmbeddedDataset,
    right: &EmbeddedDataset,
) -> Result<SimilarityMatrix, LinkageError> {
    observe(
        LinkageStage::Compare,
        |sim: &SimilarityMatrix| {
            let (n1, n2) = sim.dims();
            n1 * n2
        },
        || Ok(compare(embedder, left, right)?),
    )
}

/// Match a similarity matrix with per-stage observability.
pub fn match_datasets(
    sim: &SimilarityMatrix,
    opts: &MatchOptions,
) -> Result<Matching, LinkageError> {
    observe(LinkageStage::Match, Matching::len, || {
        Ok(matching(sim, opts)?)
    })
}

/// Everything a full linkage run produces.
#[derive(Debug, Clone)]
pub struct LinkageOutcome {
    pub left: EmbeddedDataset,
    pub right: EmbeddedDataset,
    pub similarities: SimilarityMatrix,
    pub matching: Matching,
}

/// Run the whole flow: embed both tables (with thresholds), compare, match.
pub fn link<T, U>(
    embedder: &Embedder,
    left_table: &T,
    left_colspec: &[ColumnSpec],
    right_table: &U,
    right_colspec: &[ColumnSpec],
    opts: &MatchOptions,
) -> Result<LinkageOutcome, LinkageError>
where
    T: Table + Sync + ?Sized,
    U: Table + Sync + ?Sized,
{
    let left = embed_table(embedder, left_table, left_colspec, true)?;
    let right = embed_table(embedder, right_table, right_colspec, true)?;
    let similarities = compare_datasets(embedder, &left, &right)?;
    let matching = match_datasets(&similarities, opts)?;
    Ok(LinkageOutcome {
        left,
        right,
        similarities,
        matching,
    })
}
