//! Text normalization and shingling helpers.
//!
//! All extractors that work on free text funnel through the same
//! normalization: Unicode decomposition with combining marks stripped,
//! lowercasing, and word splitting at common punctuation. Words are wrapped
//! in underscores before n-gramming so that word boundaries survive into the
//! shingle set (`"dave"` yields `_d`, `da`, `av`, `ve`, `e_`, ...).

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Lowercase and strip diacritics (NFKD, combining marks removed).
///
/// Deterministic across platforms; `"José"` folds to `"jose"`.
pub fn fold_text(value: &str) -> String {
    value
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Split folded text into underscore-wrapped words.
///
/// Splits at any run of whitespace, `+`, `-`, `_`, `,`, or `.` and wraps
/// each surviving word as `_word_`. Empty segments are dropped.
pub fn split_words_wrapped(value: &str) -> Vec<String> {
    value
        .split(|c: char| c.is_whitespace() || matches!(c, '+' | '-' | '_' | ',' | '.'))
        .filter(|w| !w.is_empty())
        .map(|w| format!("_{w}_"))
        .collect()
}

/// Emit character n-grams of every requested length over wrapped words.
///
/// The degenerate gram consisting of a single underscore is skipped, as is
/// any length longer than the word itself.
pub fn push_char_ngrams(words: &[String], lengths: &[usize], out: &mut Vec<String>) {
    for &n in lengths {
        if n == 0 {
            continue;
        }
        for word in words {
            let chars: Vec<char> = word.chars().collect();
            if chars.len() < n {
                continue;
            }
            for window in chars.windows(n) {
                if n == 1 && window[0] == '_' {
                    continue;
                }
                out.push(window.iter().collect());
            }
        }
    }
}

/// Emit skip 2-grams (`chars[i] + chars[i + 2]`) over wrapped words.
pub fn push_skip_grams(words: &[String], out: &mut Vec<String>) {
    for word in words {
        let chars: Vec<char> = word.chars().collect();
        for i in 0..chars.len().saturating_sub(2) {
            out.push([chars[i], chars[i + 2]].iter().collect());
        }
    }
}
