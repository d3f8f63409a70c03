//! Error types for the feature extraction layer.

use thiserror::Error;

/// Errors produced while resolving or running feature extractors.
///
/// Extractors themselves degrade to empty bags on missing or malformed
/// input; errors are reserved for configuration problems and values that
/// cannot be read as text at all.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FeatureError {
    /// A column specification names a type the factory does not know.
    #[error("unknown feature type `{name}` (registered: {available})")]
    UnknownFeatureType { name: String, available: String },

    /// A cell value could not be coerced to text.
    #[error("column `{column}` holds a value that cannot be read as text: {found}")]
    InvalidFieldValue { column: String, found: String },
}
