//! Placement engine: seeds a puzzle and grows it greedily from the frontier.
//!
//! Flow per candidate: ask the lexicon for words holding the candidate's
//! letter → for each word (in lexicon order) try every offset that lines the
//! letter up with the candidate cell → commit the first legal placement.
//! A candidate with no legal placement is closed for good.

use std::collections::HashSet;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::AppError;
use crate::lexicon::{normalize, Lexicon, LexiconQuery};
use crate::puzzle::frontier::{Candidate, CandidateStatus, Frontier};
use crate::puzzle::grid::{Coord, Direction, Grid, Placement, WordId};

/// Rectangular region of the plane, inclusive on all sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl Bounds {
    pub fn validate(&self, max_span: u32) -> Result<(), AppError> {
        if self.x0 > self.x1 || self.y0 > self.y1 {
            return Err(AppError::InvalidInput(format!(
                "bounds must satisfy x0 <= x1 and y0 <= y1, got ({}, {})..({}, {})",
                self.x0, self.y0, self.x1, self.y1
            )));
        }
        let width = self.x1.abs_diff(self.x0);
        let height = self.y1.abs_diff(self.y0);
        if width > max_span || height > max_span {
            return Err(AppError::InvalidInput(format!(
                "bounds span {width}x{height} exceeds the limit of {max_span} cells per side"
            )));
        }
        Ok(())
    }

    /// The same rectangle pushed out by `margin` cells on every side.
    pub fn grown(&self, margin: i32) -> Bounds {
        Bounds {
            x0: self.x0.saturating_sub(margin),
            y0: self.y0.saturating_sub(margin),
            x1: self.x1.saturating_add(margin),
            y1: self.y1.saturating_add(margin),
        }
    }

    pub fn contains(&self, at: Coord) -> bool {
        (self.x0..=self.x1).contains(&at.x) && (self.y0..=self.y1).contains(&at.y)
    }
}

/// One session's puzzle: the grid, its frontier and the words already used.
#[derive(Debug, Clone)]
pub struct Puzzle {
    grid: Grid,
    frontier: Frontier,
    used: HashSet<String>,
    lengths: RangeInclusive<usize>,
}

impl Puzzle {
    /// Places `seed` horizontally at the origin and opens a vertical
    /// candidate on each of its letters.
    ///
    /// `lengths` bounds every word the engine later asks the lexicon for.
    pub fn seeded(seed: &str, lengths: RangeInclusive<usize>) -> Result<Self, AppError> {
        let word = normalize(seed).ok_or_else(|| {
            AppError::InvalidInput(format!(
                "seed must be a single alphabetic word, got {seed:?}"
            ))
        })?;

        let mut puzzle = Puzzle {
            grid: Grid::new(),
            frontier: Frontier::new(),
            used: HashSet::new(),
            lengths,
        };
        puzzle.place(&word, Coord::new(0, 0), Direction::Horizontal);
        Ok(puzzle)
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn words(&self) -> &[Placement] {
        self.grid.words()
    }

    pub fn word_count(&self) -> usize {
        self.grid.word_count()
    }

    /// Unresolved candidates in creation order.
    pub fn open_candidates(&self) -> Vec<Candidate> {
        self.frontier.open().copied().collect()
    }

    /// Grows the puzzle until it holds `target` words or the frontier runs dry.
    /// Returns how many words were added; falling short is not an error.
    pub fn fill_to_count(
        &mut self,
        lexicon: &dyn Lexicon,
        target: usize,
    ) -> Result<usize, AppError> {
        self.fill(lexicon, |_| true, Some(target))
    }

    /// Works through every open candidate within one word-length of `bounds`,
    /// including candidates opened along the way, and returns the new words.
    pub fn expand(
        &mut self,
        lexicon: &dyn Lexicon,
        bounds: Bounds,
    ) -> Result<&[Placement], AppError> {
        let margin = (*self.lengths.end()).min(lexicon.longest_word());
        let region = bounds.grown(margin as i32);
        let before = self.word_count();

        self.fill(lexicon, |c| region.contains(c.cell()), None)?;

        Ok(&self.grid.words()[before..])
    }

    fn fill(
        &mut self,
        lexicon: &dyn Lexicon,
        accept: impl Fn(&Candidate) -> bool,
        target: Option<usize>,
    ) -> Result<usize, AppError> {
        let start = self.word_count();
        let mut cursor = 0;

        while target.map_or(true, |t| self.word_count() < t) {
            let Some(index) = self.frontier.next_open(cursor, &accept) else {
                break;
            };
            cursor = index + 1;

            if !self.attempt(index, lexicon)? {
                self.frontier.close(index, CandidateStatus::Exhausted);
            }
        }

        debug_assert!(
            self.grid.audit().is_empty(),
            "grid invariants broken: {:?}",
            self.grid.audit()
        );

        let added = self.word_count() - start;
        debug!(
            added,
            total = self.word_count(),
            open = self.frontier.open_count(),
            "Fill finished"
        );
        Ok(added)
    }

    /// Tries to hang a word on one candidate. `Ok(false)` means nothing fits.
    fn attempt(&mut self, index: usize, lexicon: &dyn Lexicon) -> Result<bool, AppError> {
        let candidate = self.frontier.get(index);
        let query = LexiconQuery::containing(candidate.letter, self.lengths.clone());

        for word in lexicon.find(&query)? {
            if self.used.contains(&word) {
                continue;
            }
            let letters: Vec<char> = word.chars().collect();

            for (offset, _) in letters
                .iter()
                .enumerate()
                .filter(|(_, l)| **l == candidate.letter)
            {
                let anchor = candidate
                    .cell()
                    .offset(candidate.direction, -(offset as i32));
                if self.grid.can_place(&letters, anchor, candidate.direction) {
                    self.frontier.close(index, CandidateStatus::Placed);
                    self.place(&word, anchor, candidate.direction);
                    return Ok(true);
                }
            }
        }

        debug!(
            x = candidate.x,
            y = candidate.y,
            letter = %candidate.letter,
            "No word fits candidate"
        );
        Ok(false)
    }

    /// Commits a word, closes candidates on the cells it crossed and opens new
    /// ones on the cells it added.
    fn place(&mut self, word: &str, anchor: Coord, direction: Direction) -> WordId {
        let crossings: Vec<Coord> = (0..word.chars().count())
            .map(|i| anchor.offset(direction, i as i32))
            .filter(|&at| self.grid.occupied(at).is_some())
            .collect();

        let id = self.grid.commit(word, anchor, direction);
        self.used.insert(word.to_string());

        for &at in &crossings {
            self.frontier.resolve_cell(at);
        }

        let across = direction.perpendicular();
        let fresh: Vec<Candidate> = self.grid.words()[id]
            .cells()
            .filter(|(at, _)| !crossings.contains(at))
            .map(|(at, letter)| Candidate {
                x: at.x,
                y: at.y,
                letter,
                direction: across,
            })
            .collect();
        for candidate in fresh {
            self.frontier.push(candidate);
        }

        debug!(
            id,
            word,
            x = anchor.x,
            y = anchor.y,
            ?direction,
            frontier = self.frontier.len(),
            "Placed word"
        );
        id
    }
}
