//! Concrete feature extractors.
//!
//! Extractors are tagged enum variants so that a feature factory can travel
//! inside the serialized embedder blob and be reconstructed identically on
//! the other party's side. Each variant is a pure function of
//! `(value, label)`; missing or unparseable input degrades to an empty bag.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::FeatureError;
use crate::normalize::{fold_text, push_char_ngrams, push_skip_grams, split_words_wrapped};
use crate::phonetic::double_metaphone;
use crate::shingle::{FeatureBag, Shingle};

/// Label shared by every name column, so first/last/full-name columns match
/// each other across datasets.
pub const NAME_LABEL: &str = "name";
/// Label for sex/gender shingles.
pub const SEX_LABEL: &str = "sex";
/// Label for the year component of a date of birth.
pub const DOB_YEAR_LABEL: &str = "dob-y";
/// Label for the month component of a date of birth.
pub const DOB_MONTH_LABEL: &str = "dob-m";
/// Label for the day component of a date of birth.
pub const DOB_DAY_LABEL: &str = "dob-d";

fn default_ngram_lengths() -> Vec<usize> {
    vec![2, 3]
}

fn default_true() -> bool {
    true
}

/// A single feature extractor, selected per column through the factory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeatureExtractor {
    /// Person names: character n-grams plus phonetic codes, always under
    /// [`NAME_LABEL`].
    Name {
        #[serde(default = "default_ngram_lengths")]
        ngram_lengths: Vec<usize>,
        #[serde(default)]
        use_skip_grams: bool,
        #[serde(default = "default_true")]
        use_metaphone: bool,
    },
    /// Dates of birth: one labeled shingle per component present.
    DateOfBirth {
        #[serde(default = "default_true")]
        day_first: bool,
        #[serde(default)]
        year_first: bool,
    },
    /// Sex/gender: a single lowercase initial under [`SEX_LABEL`].
    Sex,
    /// Whole-token categorical features under the column label.
    Tokens,
    /// Character n-grams under the column label, for free-text columns that
    /// should fuzzily match across datasets.
    Shingled {
        #[serde(default = "default_ngram_lengths")]
        ngram_lengths: Vec<usize>,
        #[serde(default)]
        use_skip_grams: bool,
    },
}

impl FeatureExtractor {
    /// Name extractor with default n-gram lengths and metaphone enabled.
    pub fn name() -> Self {
        Self::Name {
            ngram_lengths: default_ngram_lengths(),
            use_skip_grams: false,
            use_metaphone: true,
        }
    }

    /// Date-of-birth extractor with day-first parsing.
    pub fn date_of_birth() -> Self {
        Self::DateOfBirth {
            day_first: true,
            year_first: false,
        }
    }

    /// Shingled extractor with default n-gram lengths.
    pub fn shingled() -> Self {
        Self::Shingled {
            ngram_lengths: default_ngram_lengths(),
            use_skip_grams: false,
        }
    }

    /// Run the extractor over one field value.
    ///
    /// `label` is the resolved column label. The name, date, and sex
    /// variants deliberately ignore it and emit their fixed labels so those
    /// features stay comparable regardless of column naming.
    pub fn extract(&self, value: Option<&str>, label: &str) -> Result<FeatureBag, FeatureError> {
        let Some(raw) = value else {
            return Ok(Vec::new());
        };
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }

        let mut bag = Vec::new();
        match self {
            FeatureExtractor::Name {
                ngram_lengths,
                use_skip_grams,
                use_metaphone,
            } => {
                let folded = fold_text(trimmed);
                let words = split_words_wrapped(&folded);
                let mut grams = Vec::new();
                push_char_ngrams(&words, ngram_lengths, &mut grams);
                if *use_skip_grams {
                    push_skip_grams(&words, &mut grams);
                }
                for gram in grams {
                    bag.push(Shingle::new(NAME_LABEL, gram));
                }
                if *use_metaphone {
                    for word in folded.split_whitespace() {
                        let (primary, alternate) = double_metaphone(word);
                        if !primary.is_empty() {
                            bag.push(Shingle::new(NAME_LABEL, primary));
                        }
                        if let Some(code) = alternate {
                            bag.push(Shingle::new(NAME_LABEL, code));
                        }
                    }
                }
            }
            FeatureExtractor::DateOfBirth {
                day_first,
                year_first,
            } => {
                if let Some(parts) = parse_date_parts(trimmed, *day_first, *year_first) {
                    if let Some(year) = parts.year {
                        bag.push(Shingle::new(DOB_YEAR_LABEL, format!("{year:04}")));
                    }
                    if let Some(month) = parts.month {
                        bag.push(Shingle::new(DOB_MONTH_LABEL, format!("{month:02}")));
                    }
                    if let Some(day) = parts.day {
                        bag.push(Shingle::new(DOB_DAY_LABEL, format!("{day:02}")));
                    }
                }
            }
            FeatureExtractor::Sex => {
                if let Some(initial) = trimmed.chars().find(|c| c.is_alphabetic()) {
                    let lower: String = initial.to_lowercase().collect();
                    bag.push(Shingle::new(SEX_LABEL, lower));
                }
            }
            FeatureExtractor::Tokens => {
                for token in fold_text(trimmed).split_whitespace() {
                    bag.push(Shingle::new(label, token));
                }
            }
            FeatureExtractor::Shingled {
                ngram_lengths,
                use_skip_grams,
            } => {
                let folded = fold_text(trimmed);
                let words = split_words_wrapped(&folded);
                let mut grams = Vec::new();
                push_char_ngrams(&words, ngram_lengths, &mut grams);
                if *use_skip_grams {
                    push_skip_grams(&words, &mut grams);
                }
                for gram in grams {
                    bag.push(Shingle::new(label, gram));
                }
            }
        }

        Ok(bag)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DateParts {
    year: Option<i32>,
    month: Option<u32>,
    day: Option<u32>,
}

/// Two-digit years pivot at 30: `..=30` maps into the 2000s.
fn expand_year(part: u32) -> i32 {
    if part <= 30 {
        2000 + part as i32
    } else if part < 100 {
        1900 + part as i32
    } else {
        part as i32
    }
}

fn numeric_parts(value: &str) -> Option<Vec<(u32, usize)>> {
    let mut parts = Vec::new();
    for segment in value.split(|c: char| c.is_whitespace() || matches!(c, '-' | '/' | '.')) {
        if segment.is_empty() {
            continue;
        }
        let number: u32 = segment.parse().ok()?;
        parts.push((number, segment.len()));
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts)
    }
}

fn valid_month(m: u32) -> bool {
    (1..=12).contains(&m)
}

/// Parse a date string into its available components.
///
/// Accepts `YYYYMMDD`, separated triples with a configurable day-first or
/// year-first preference, partial `year-month` and bare-year forms. Calendar
/// validity of full dates is checked with `chrono`; an impossible day/month
/// combination is retried with the components swapped before giving up.
fn parse_date_parts(value: &str, day_first: bool, year_first: bool) -> Option<DateParts> {
    let parts = numeric_parts(value)?;

    match parts.as_slice() {
        [(packed, 8)] => {
            let year = (packed / 10_000) as i32;
            let month = packed / 100 % 100;
            let day = packed % 100;
            NaiveDate::from_ymd_opt(year, month, day)?;
            Some(DateParts {
                year: Some(year),
                month: Some(month),
                day: Some(day),
            })
        }
        [(year, 4)] => Some(DateParts {
            year: Some(*year as i32),
            month: None,
            day: None,
        }),
        [(a, a_len), (b, b_len)] => {
            let (year, month) = if *a_len == 4 {
                (*a as i32, *b)
            } else if *b_len == 4 {
                (*b as i32, *a)
            } else {
                return None;
            };
            Some(DateParts {
                year: Some(year),
                month: valid_month(month).then_some(month),
                day: None,
            })
        }
        [(a, a_len), (b, _), (c, c_len)] => {
            // A four-digit component pins the year; otherwise the caller's
            // year-first preference decides, with a two-digit pivot.
            let (year, month, day) = if *a_len == 4 {
                (*a as i32, *b, *c)
            } else if *c_len == 4 {
                if day_first {
                    (*c as i32, *b, *a)
                } else {
                    (*c as i32, *a, *b)
                }
            } else if year_first {
                (expand_year(*a), *b, *c)
            } else if day_first {
                (expand_year(*c), *b, *a)
            } else {
                (expand_year(*c), *a, *b)
            };
            // Retry with month/day swapped when the preferred reading is not
            // a real calendar date.
            for (m, d) in [(month, day), (day, month)] {
                if NaiveDate::from_ymd_opt(year, m, d).is_some() {
                    return Some(DateParts {
                        year: Some(year),
                        month: Some(m),
                        day: Some(d),
                    });
                }
            }
            None
        }
        _ => None,
    }
}
