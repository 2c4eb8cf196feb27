//! In-memory word index keyed by (position, letter) and by length.
//!
//! Words are kept in preference order (longest first, then load order), and
//! every posting list is built in that order, so query results come out
//! already ranked.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::info;

use crate::lexicon::{normalize, Lexicon, LexiconError, LexiconQuery};

const BUILTIN_WORDS: &str = include_str!("words.txt");

#[derive(Debug, Clone)]
pub struct WordIndex {
    words: Vec<String>,
    by_letter: HashMap<(usize, char), Vec<u32>>,
    by_length: BTreeMap<usize, Vec<u32>>,
    longest: usize,
}

impl WordIndex {
    /// Builds an index from raw entries. Unusable entries and duplicates are dropped.
    pub fn from_words<I, S>(raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut words: Vec<String> = raw
            .into_iter()
            .filter_map(|w| normalize(w.as_ref()))
            .filter(|w| seen.insert(w.clone()))
            .collect();
        // stable: equal lengths keep load order
        words.sort_by_key(|w| std::cmp::Reverse(w.chars().count()));

        let mut by_letter: HashMap<(usize, char), Vec<u32>> = HashMap::new();
        let mut by_length: BTreeMap<usize, Vec<u32>> = BTreeMap::new();
        let mut longest = 0;

        for (id, word) in words.iter().enumerate() {
            let id = id as u32;
            let mut length = 0;
            for (position, letter) in word.chars().enumerate() {
                by_letter.entry((position, letter)).or_default().push(id);
                length += 1;
            }
            by_length.entry(length).or_default().push(id);
            longest = longest.max(length);
        }

        Self {
            words,
            by_letter,
            by_length,
            longest,
        }
    }

    /// The word list compiled into the binary.
    pub fn builtin() -> Self {
        Self::from_words(BUILTIN_WORDS.lines())
    }

    /// Loads a UTF-8 file with one word per line.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read lexicon file {}", path.display()))?;
        let index = Self::from_words(text.lines());
        if index.is_empty() {
            bail!("Lexicon file {} contains no usable words", path.display());
        }
        info!(
            "Loaded {} words from {} (longest {})",
            index.len(),
            path.display(),
            index.longest
        );
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    fn matching_ids(&self, query: &LexiconQuery) -> Vec<u32> {
        if query.lengths.is_empty() {
            return Vec::new();
        }
        let Some(letter) = query.letter else {
            return self
                .by_length
                .range(query.lengths.clone())
                .flat_map(|(_, ids)| ids.iter().copied())
                .collect();
        };

        if self.longest == 0 {
            return Vec::new();
        }
        let positions = query.positions.clone().unwrap_or(0..=self.longest - 1);
        let last = (*positions.end()).min(self.longest - 1);

        (*positions.start()..=last)
            .filter_map(|p| self.by_letter.get(&(p, letter)))
            .flat_map(|ids| ids.iter().copied())
            .collect()
    }
}

impl Lexicon for WordIndex {
    fn find(&self, query: &LexiconQuery) -> Result<Vec<String>, LexiconError> {
        let mut ids = self.matching_ids(query);
        ids.sort_unstable();
        ids.dedup();

        Ok(ids
            .into_iter()
            .map(|id| &self.words[id as usize])
            .filter(|w| query.lengths.contains(&w.chars().count()))
            .cloned()
            .collect())
    }

    fn longest_word(&self) -> usize {
        self.longest
    }
}
