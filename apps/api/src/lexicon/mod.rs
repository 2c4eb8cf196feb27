//! Lexicon: the word source the placement engine draws from.
//!
//! The engine only ever asks one question: "which words have this letter
//! (optionally at these positions) and a length in this range?". Anything
//! answering it can be plugged in behind `Arc<dyn Lexicon>`.

use std::ops::RangeInclusive;

use thiserror::Error;

pub mod index;

pub use index::WordIndex;

#[derive(Debug, Error)]
pub enum LexiconError {
    #[error("lexicon backend failed: {0}")]
    Backend(String),
}

/// A single lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexiconQuery {
    /// Letter the word must contain; `None` matches any word.
    pub letter: Option<char>,
    /// Zero-based positions where `letter` may sit; `None` means anywhere.
    pub positions: Option<RangeInclusive<usize>>,
    /// Allowed word lengths in characters.
    pub lengths: RangeInclusive<usize>,
}

impl LexiconQuery {
    pub fn containing(letter: char, lengths: RangeInclusive<usize>) -> Self {
        Self {
            letter: Some(letter),
            positions: None,
            lengths,
        }
    }
}

/// Trims and lower-cases a raw entry. Returns `None` for anything that is
/// empty or contains a non-alphabetic character.
pub fn normalize(raw: &str) -> Option<String> {
    let word = raw.trim().to_lowercase();
    if word.is_empty() || !word.chars().all(char::is_alphabetic) {
        return None;
    }
    Some(word)
}

/// Word lookup used by the placement engine.
///
/// Implementations must be side-effect free from the caller's point of view.
/// Results are ordered by placement preference.
pub trait Lexicon: Send + Sync {
    fn find(&self, query: &LexiconQuery) -> Result<Vec<String>, LexiconError>;

    /// Character count of the longest word this lexicon can return.
    fn longest_word(&self) -> usize;
}
