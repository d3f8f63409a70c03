//! Shingle and feature bag types.

use serde::{Deserialize, Serialize};

/// A single labeled feature token.
///
/// Equality is exact on both fields. The label namespaces the token so that
/// `("bass", "instrument")` and `("bass", "voice")` hash to unrelated Bloom
/// filter positions.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Shingle {
    /// Field label, constant per extractor or supplied by the column spec.
    pub label: String,
    /// Token text: an n-gram, a normalized token, or a derived code.
    pub token: String,
}

impl Shingle {
    pub fn new(label: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            token: token.into(),
        }
    }

    /// Render as `label<token>`, the form used in debug feature dumps.
    pub fn render(&self) -> String {
        format!("{}<{}>", self.label, self.token)
    }
}

/// Ordered sequence of shingles for one record.
///
/// Duplicates are preserved; the embedder dedupes at the bit-index level.
pub type FeatureBag = Vec<Shingle>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shingles_with_different_labels_are_distinct() {
        let a = Shingle::new("instrument", "bass");
        let b = Shingle::new("voice", "bass");
        assert_ne!(a, b);
    }

    #[test]
    fn render_uses_label_markup() {
        let s = Shingle::new("sex", "f");
        assert_eq!(s.render(), "sex<f>");
    }

    #[test]
    fn shingle_serde_roundtrip() {
        let s = Shingle::new("dob-y", "1987");
        let json = serde_json::to_string(&s).unwrap();
        let back: Shingle = serde_json::from_str(&json).unwrap();
        assert_eq!(s, back);
    }
}
