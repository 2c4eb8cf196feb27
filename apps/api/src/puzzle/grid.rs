//! Sparse letter grid: the single source of truth for what a session has placed.
//!
//! The plane is unbounded, so cells live in a hash map keyed by a packed
//! `(x, y)` pair instead of a preallocated array. Words are append-only: once
//! committed, a word and the letters it wrote never change.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Index of a word in placement order. The seed word is always `0`.
pub type WordId = usize;

/// Axis a word runs along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Horizontal,
    Vertical,
}

impl Direction {
    pub fn perpendicular(self) -> Direction {
        match self {
            Direction::Horizontal => Direction::Vertical,
            Direction::Vertical => Direction::Horizontal,
        }
    }

    /// Unit step along this axis.
    pub fn step(self) -> (i32, i32) {
        match self {
            Direction::Horizontal => (1, 0),
            Direction::Vertical => (0, 1),
        }
    }
}

/// Integer coordinate on the infinite plane. `y` grows downwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Moves `n` cells along `direction` (negative `n` moves backwards).
    pub fn offset(self, direction: Direction, n: i32) -> Coord {
        let (dx, dy) = direction.step();
        Coord {
            x: self.x + dx * n,
            y: self.y + dy * n,
        }
    }

    fn key(self) -> u64 {
        ((self.x as u32 as u64) << 32) | self.y as u32 as u64
    }
}

/// One occupied cell: its letter plus every word running through it.
#[derive(Debug, Clone)]
pub struct Cell {
    pub letter: char,
    pub words: Vec<WordId>,
}

impl Cell {
    pub fn is_intersection(&self) -> bool {
        self.words.len() > 1
    }
}

/// A committed word. Serialises as `{word, x, y, direction}`.
#[derive(Debug, Clone, Serialize)]
pub struct Placement {
    #[serde(skip)]
    pub id: WordId,
    pub word: String,
    pub x: i32,
    pub y: i32,
    pub direction: Direction,
    #[serde(skip)]
    letters: Vec<char>,
}

impl Placement {
    pub fn anchor(&self) -> Coord {
        Coord::new(self.x, self.y)
    }

    pub fn letters(&self) -> &[char] {
        &self.letters
    }

    /// Every cell this word covers, paired with the letter it puts there.
    pub fn cells(&self) -> impl Iterator<Item = (Coord, char)> + '_ {
        let anchor = self.anchor();
        self.letters
            .iter()
            .enumerate()
            .map(move |(i, &letter)| (anchor.offset(self.direction, i as i32), letter))
    }
}

/// A broken grid invariant, reported by [`Grid::audit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// Two words disagree about the letter in a cell.
    LetterConflict { at: Coord, words: Vec<WordId> },
    /// The cell just before or just after a word is occupied.
    Extended { word: WordId, at: Coord },
    /// A cell owned only by this word has an occupied perpendicular neighbour.
    Adjacent { word: WordId, at: Coord },
}

#[derive(Debug, Clone, Default)]
pub struct Grid {
    cells: HashMap<u64, Cell>,
    words: Vec<Placement>,
}

impl Grid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn occupied(&self, at: Coord) -> Option<&Cell> {
        self.cells.get(&at.key())
    }

    pub fn words(&self) -> &[Placement] {
        &self.words
    }

    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    /// Checks whether `letters` can be written starting at `anchor` along `direction`.
    ///
    /// Each cell is judged on its own:
    /// - an occupied cell must already hold the same letter, and must belong
    ///   only to words running across `direction` (no parallel overlap);
    /// - an empty cell must also have empty neighbours on both perpendicular sides.
    ///
    /// The cells just before and just after the word must be empty, and at
    /// least one cell must be new.
    pub fn can_place(&self, letters: &[char], anchor: Coord, direction: Direction) -> bool {
        if letters.is_empty() {
            return false;
        }

        let before = anchor.offset(direction, -1);
        let after = anchor.offset(direction, letters.len() as i32);
        if self.occupied(before).is_some() || self.occupied(after).is_some() {
            return false;
        }

        let across = direction.perpendicular();
        let mut fresh = 0;

        for (i, &letter) in letters.iter().enumerate() {
            let at = anchor.offset(direction, i as i32);
            match self.occupied(at) {
                Some(cell) => {
                    if cell.letter != letter {
                        return false;
                    }
                    if cell
                        .words
                        .iter()
                        .any(|&id| self.words[id].direction == direction)
                    {
                        return false;
                    }
                }
                None => {
                    if self.occupied(at.offset(across, -1)).is_some()
                        || self.occupied(at.offset(across, 1)).is_some()
                    {
                        return false;
                    }
                    fresh += 1;
                }
            }
        }

        fresh > 0
    }

    /// Writes every cell of the word and assigns it the next id.
    ///
    /// Callers must have checked [`Grid::can_place`] first (the seed word on an
    /// empty grid is the one exception); commit never fails part-way.
    pub fn commit(&mut self, word: &str, anchor: Coord, direction: Direction) -> WordId {
        let id = self.words.len();
        let letters: Vec<char> = word.chars().collect();

        for (i, &letter) in letters.iter().enumerate() {
            let at = anchor.offset(direction, i as i32);
            self.cells
                .entry(at.key())
                .or_insert_with(|| Cell {
                    letter,
                    words: Vec::with_capacity(2),
                })
                .words
                .push(id);
        }

        self.words.push(Placement {
            id,
            word: word.to_string(),
            x: anchor.x,
            y: anchor.y,
            direction,
            letters,
        });
        id
    }

    /// Re-checks the no-conflict, no-extension and no-adjacency invariants
    /// over every placed word.
    pub fn audit(&self) -> Vec<Violation> {
        let mut violations = Vec::new();

        for word in &self.words {
            let direction = word.direction;
            let across = direction.perpendicular();

            for end in [
                word.anchor().offset(direction, -1),
                word.anchor().offset(direction, word.letters().len() as i32),
            ] {
                if self.occupied(end).is_some() {
                    violations.push(Violation::Extended { word: word.id, at: end });
                }
            }

            for (at, letter) in word.cells() {
                let Some(cell) = self.occupied(at) else {
                    continue;
                };
                if cell.letter != letter {
                    violations.push(Violation::LetterConflict {
                        at,
                        words: cell.words.clone(),
                    });
                }
                if cell.is_intersection() {
                    continue;
                }
                for side in [at.offset(across, -1), at.offset(across, 1)] {
                    if self.occupied(side).is_some() {
                        violations.push(Violation::Adjacent { word: word.id, at: side });
                    }
                }
            }
        }

        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(word: &str) -> Vec<char> {
        word.chars().collect()
    }

    fn seeded(seed: &str) -> Grid {
        let mut grid = Grid::new();
        grid.commit(seed, Coord::new(0, 0), Direction::Horizontal);
        grid
    }

    #[test]
    fn test_commit_writes_letters_and_owners() {
        let mut grid = seeded("кот");
        let id = grid.commit("ток", Coord::new(2, 0), Direction::Vertical);

        assert_eq!(id, 1);
        assert_eq!(grid.occupied(Coord::new(1, 0)).unwrap().letter, 'о');
        let crossing = grid.occupied(Coord::new(2, 0)).unwrap();
        assert_eq!(crossing.letter, 'т');
        assert_eq!(crossing.words, vec![0, 1]);
        assert!(crossing.is_intersection());
        assert!(grid.occupied(Coord::new(3, 0)).is_none());
        assert_eq!(grid.word_count(), 2);
    }

    #[test]
    fn test_negative_coordinates_do_not_collide() {
        let mut grid = Grid::new();
        grid.commit("да", Coord::new(-1, -1), Direction::Horizontal);
        assert_eq!(grid.occupied(Coord::new(-1, -1)).unwrap().letter, 'д');
        assert_eq!(grid.occupied(Coord::new(0, -1)).unwrap().letter, 'а');
        assert!(grid.occupied(Coord::new(1, -1)).is_none());
        assert!(grid.occupied(Coord::new(-1, 0)).is_none());
    }

    #[test]
    fn test_crossing_with_matching_letter_is_allowed() {
        let grid = seeded("кот");
        // "рот" crossing at (1, 0) with 'о'
        assert!(grid.can_place(&chars("рот"), Coord::new(1, -1), Direction::Vertical));
    }

    #[test]
    fn test_crossing_with_conflicting_letter_is_rejected() {
        let grid = seeded("кот");
        assert!(!grid.can_place(&chars("рак"), Coord::new(1, -1), Direction::Vertical));
    }

    #[test]
    fn test_word_touching_the_end_is_rejected() {
        let grid = seeded("кот");
        // would read "котик" along row 0
        assert!(!grid.can_place(&chars("ик"), Coord::new(3, 0), Direction::Horizontal));
        // vertical word ending right above the seed's first letter
        assert!(!grid.can_place(&chars("да"), Coord::new(0, -2), Direction::Vertical));
    }

    #[test]
    fn test_parallel_neighbour_is_rejected() {
        let grid = seeded("кот");
        assert!(!grid.can_place(&chars("сом"), Coord::new(0, 1), Direction::Horizontal));
    }

    #[test]
    fn test_perpendicular_word_beside_a_letter_is_rejected() {
        let mut grid = seeded("кот");
        grid.commit("ток", Coord::new(2, 0), Direction::Vertical);
        // vertical word in column 3 would sit right beside "ток"
        assert!(!grid.can_place(&chars("мак"), Coord::new(3, 1), Direction::Vertical));
        // horizontal word running into column 1 right under the seed
        assert!(!grid.can_place(&chars("сок"), Coord::new(0, 1), Direction::Horizontal));
    }

    #[test]
    fn test_parallel_overlap_is_rejected() {
        let mut grid = Grid::new();
        grid.commit("кот", Coord::new(0, 0), Direction::Horizontal);
        assert!(!grid.can_place(&chars("кот"), Coord::new(0, 0), Direction::Horizontal));
    }

    #[test]
    fn test_placement_without_new_cells_is_rejected() {
        let grid = seeded("кот");
        assert!(!grid.can_place(&chars("о"), Coord::new(1, 0), Direction::Vertical));
        assert!(!grid.can_place(&[], Coord::new(5, 5), Direction::Vertical));
    }

    #[test]
    fn test_audit_is_clean_for_valid_layout() {
        let mut grid = seeded("кот");
        assert!(grid.can_place(&chars("ток"), Coord::new(2, 0), Direction::Vertical));
        grid.commit("ток", Coord::new(2, 0), Direction::Vertical);
        assert!(grid.audit().is_empty());
    }

    #[test]
    fn test_audit_reports_forced_violations() {
        let mut grid = seeded("кот");
        grid.commit("сом", Coord::new(0, 1), Direction::Horizontal);
        grid.commit("ик", Coord::new(3, 0), Direction::Horizontal);

        let violations = grid.audit();
        assert!(violations
            .iter()
            .any(|v| matches!(v, Violation::Adjacent { word: 0, .. })));
        assert!(violations
            .iter()
            .any(|v| matches!(v, Violation::Extended { word: 0, .. })));
    }

    #[test]
    fn test_placement_serializes_public_fields_only() {
        let grid = seeded("кот");
        let json = serde_json::to_value(&grid.words()[0]).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"word": "кот", "x": 0, "y": 0, "direction": "horizontal"})
        );
    }
}
