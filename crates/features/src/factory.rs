//! Feature factory and column specification.
//!
//! The factory is the registry both parties must agree on: it maps
//! user-chosen type names (`"name"`, `"dob"`, ...) to concrete extractors
//! and is serialized verbatim into the embedder blob. Column specs are
//! per-dataset and map dataset columns onto those type names; columns
//! without a column-spec entry contribute nothing to the embedding.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::FeatureError;
use crate::extractors::FeatureExtractor;

/// Registry of named feature extractors.
///
/// Backed by an ordered map so serialization, and therefore the embedder
/// checksum, is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureFactory {
    entries: BTreeMap<String, FeatureExtractor>,
}

impl FeatureFactory {
    /// Empty factory.
    pub fn new() -> Self {
        Self::default()
    }

    /// The catalogue the linkage toolkit is designed around: person names,
    /// dates of birth, sex, and the two miscellaneous extractors.
    pub fn standard() -> Self {
        Self::new()
            .with_extractor("name", FeatureExtractor::name())
            .with_extractor("dob", FeatureExtractor::date_of_birth())
            .with_extractor("sex", FeatureExtractor::Sex)
            .with_extractor("misc", FeatureExtractor::Tokens)
            .with_extractor("misc_shingled", FeatureExtractor::shingled())
    }

    /// Register an extractor under a type name, replacing any previous entry.
    pub fn register(&mut self, name: impl Into<String>, extractor: FeatureExtractor) {
        self.entries.insert(name.into(), extractor);
    }

    /// Builder-style [`register`](Self::register).
    pub fn with_extractor(mut self, name: impl Into<String>, extractor: FeatureExtractor) -> Self {
        self.register(name, extractor);
        self
    }

    /// Look up an extractor by type name.
    pub fn get(&self, name: &str) -> Result<&FeatureExtractor, FeatureError> {
        self.entries
            .get(name)
            .ok_or_else(|| FeatureError::UnknownFeatureType {
                name: name.to_string(),
                available: self.names().collect::<Vec<_>>().join(", "),
            })
    }

    /// Registered type names in deterministic order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Binding of one dataset column to a feature type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Column name in the caller's table.
    pub column: String,
    /// Feature type name resolved through the factory.
    pub feature_type: String,
    /// Label override for the labeled extractors; defaults to the column
    /// name. This is what lets `instrument` and `main_instrument` columns
    /// land in the same label space.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl ColumnSpec {
    pub fn new(column: impl Into<String>, feature_type: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            feature_type: feature_type.into(),
            label: None,
        }
    }

    /// Override the label used for this column's shingles.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// The effective label: the override when present, the column otherwise.
    pub fn effective_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_type_lists_available_names() {
        let factory = FeatureFactory::standard();
        let err = factory.get("postcode").unwrap_err();
        match err {
            FeatureError::UnknownFeatureType { name, available } => {
                assert_eq!(name, "postcode");
                assert!(available.contains("dob"));
                assert!(available.contains("name"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn register_replaces_existing_entry() {
        let mut factory = FeatureFactory::new();
        factory.register("n", FeatureExtractor::name());
        factory.register("n", FeatureExtractor::Sex);
        assert_eq!(factory.len(), 1);
        assert_eq!(factory.get("n").unwrap(), &FeatureExtractor::Sex);
    }

    #[test]
    fn factory_serde_roundtrip() {
        let factory = FeatureFactory::standard();
        let json = serde_json::to_string(&factory).unwrap();
        let back: FeatureFactory = serde_json::from_str(&json).unwrap();
        assert_eq!(factory, back);
    }

    #[test]
    fn factory_serialization_is_order_stable() {
        let a = FeatureFactory::new()
            .with_extractor("a", FeatureExtractor::Sex)
            .with_extractor("b", FeatureExtractor::Tokens);
        let b = FeatureFactory::new()
            .with_extractor("b", FeatureExtractor::Tokens)
            .with_extractor("a", FeatureExtractor::Sex);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn column_spec_label_defaults_to_column() {
        let spec = ColumnSpec::new("instrument", "misc_shingled");
        assert_eq!(spec.effective_label(), "instrument");

        let spec = spec.with_label("instrument_any");
        assert_eq!(spec.effective_label(), "instrument_any");
    }

    #[test]
    fn column_spec_serde_roundtrip() {
        let spec = ColumnSpec::new("main_instrument", "misc_shingled").with_label("instrument");
        let json = serde_json::to_string(&spec).unwrap();
        let back: ColumnSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(spec, back);
    }
}
