//! Intersection candidates: open letter cells where a perpendicular word may attach.
//!
//! Stored as an arena in creation order. Entries are never removed, only
//! re-labelled, so an attempted candidate is remembered and never retried.

use std::collections::HashMap;

use serde::Serialize;

use crate::puzzle::grid::{Coord, Direction};

/// A letter cell of a placed word plus the direction a new word would run through it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub x: i32,
    pub y: i32,
    pub letter: char,
    pub direction: Direction,
}

impl Candidate {
    pub fn cell(&self) -> Coord {
        Coord::new(self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateStatus {
    Open,
    /// A word was placed through this cell.
    Placed,
    /// Every lexicon suggestion was tried and none fit.
    Exhausted,
    /// The cell became an intersection through some other placement.
    Resolved,
}

#[derive(Debug, Clone, Default)]
pub struct Frontier {
    entries: Vec<(Candidate, CandidateStatus)>,
    by_cell: HashMap<Coord, Vec<usize>>,
    /// Every entry before this index is known to be closed.
    first_open: usize,
    open: usize,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a candidate. A second candidate for the same cell and direction
    /// is ignored; returns whether it was added.
    pub fn push(&mut self, candidate: Candidate) -> bool {
        let slots = self.by_cell.entry(candidate.cell()).or_default();
        if slots
            .iter()
            .any(|&i| self.entries[i].0.direction == candidate.direction)
        {
            return false;
        }
        slots.push(self.entries.len());
        self.entries.push((candidate, CandidateStatus::Open));
        self.open += 1;
        true
    }

    pub fn get(&self, index: usize) -> Candidate {
        self.entries[index].0
    }

    /// Closes an open candidate. Closed candidates stay closed.
    pub fn close(&mut self, index: usize, status: CandidateStatus) {
        debug_assert_ne!(status, CandidateStatus::Open);
        let entry = &mut self.entries[index];
        if entry.1 != CandidateStatus::Open {
            return;
        }
        entry.1 = status;
        self.open -= 1;

        while self
            .entries
            .get(self.first_open)
            .is_some_and(|(_, s)| *s != CandidateStatus::Open)
        {
            self.first_open += 1;
        }
    }

    /// Closes every open candidate at `cell`; returns how many were closed.
    pub fn resolve_cell(&mut self, cell: Coord) -> usize {
        let Some(slots) = self.by_cell.get(&cell).cloned() else {
            return 0;
        };
        let mut closed = 0;
        for index in slots {
            if self.entries[index].1 == CandidateStatus::Open {
                self.close(index, CandidateStatus::Resolved);
                closed += 1;
            }
        }
        closed
    }

    /// Earliest open candidate at or after `from` that satisfies `accept`.
    pub fn next_open(&self, from: usize, accept: impl Fn(&Candidate) -> bool) -> Option<usize> {
        let start = from.max(self.first_open);
        self.entries
            .iter()
            .enumerate()
            .skip(start)
            .find(|(_, (candidate, status))| {
                *status == CandidateStatus::Open && accept(candidate)
            })
            .map(|(index, _)| index)
    }

    /// Open candidates in creation order.
    pub fn open(&self) -> impl Iterator<Item = &Candidate> + '_ {
        self.entries
            .iter()
            .skip(self.first_open)
            .filter(|(_, status)| *status == CandidateStatus::Open)
            .map(|(candidate, _)| candidate)
    }

    pub fn open_count(&self) -> usize {
        self.open
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
