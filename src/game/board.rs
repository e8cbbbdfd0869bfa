//! The shared word board.
//!
//! One `Board` exists per server and every session holds an `Arc` to it.
//! Placements and renders each take the grid lock for their whole duration,
//! so a placement is validated and committed atomically: the candidate grid
//! is built on a copy and only swapped in once every check has passed.

use crate::game::dictionary::Dictionary;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, trace};

/// Longest word that can be placed
pub const WORD_LIMIT: usize = 26;

/// Placement orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Left to right along a row
    Across,
    /// Top to bottom along a column
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Across => f.write_str("across"),
            Direction::Down => f.write_str("down"),
        }
    }
}

type Cell = Option<char>;

/// Fixed-size grid of lowercase letters
#[derive(Debug)]
pub struct Board {
    rows: usize,
    cols: usize,
    cells: Mutex<Vec<Cell>>,
    dictionary: Dictionary,
}

impl Board {
    /// Empty `rows` x `cols` board checked against `dictionary`
    pub fn new(rows: usize, cols: usize, dictionary: Dictionary) -> Self {
        Self {
            rows,
            cols,
            cells: Mutex::new(vec![None; rows * cols]),
            dictionary,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Place `word` rightward from `(row, col)`
    pub fn place_across(&self, row: usize, col: usize, word: &str) -> bool {
        self.place(row, col, word, Direction::Across)
    }

    /// Place `word` downward from `(row, col)`
    pub fn place_down(&self, row: usize, col: usize, word: &str) -> bool {
        self.place(row, col, word, Direction::Down)
    }

    /// All-or-nothing placement. Returns whether the board changed hands to the candidate.
    pub fn place(&self, row: usize, col: usize, word: &str, direction: Direction) -> bool {
        let len = word.chars().count();
        if !(1..=WORD_LIMIT).contains(&len) {
            debug!(len, "Rejected placement: word length out of range");
            return false;
        }

        if !word.chars().all(char::is_lowercase) {
            debug!(%word, "Rejected placement: word is not all lowercase letters");
            return false;
        }

        let in_bounds = match direction {
            Direction::Across => row < self.rows && col.saturating_add(len) <= self.cols,
            Direction::Down => col < self.cols && row.saturating_add(len) <= self.rows,
        };
        if !in_bounds {
            debug!(row, col, len, %direction, "Rejected placement: off the board");
            return false;
        }

        let mut grid = self.lock();
        let mut candidate = grid.clone();

        for (i, letter) in word.chars().enumerate() {
            let (r, c) = match direction {
                Direction::Across => (row, col + i),
                Direction::Down => (row + i, col),
            };
            let cell = &mut candidate[r * self.cols + c];
            match *cell {
                Some(existing) if existing != letter => {
                    debug!(row = r, col = c, "Rejected placement: conflicts with existing letter");
                    return false;
                }
                _ => *cell = Some(letter),
            }
        }

        if self.dictionary.is_enabled() && !self.runs_are_words(&candidate) {
            debug!(%word, "Rejected placement: board would contain an unknown word");
            return false;
        }

        *grid = candidate;
        trace!(row, col, %word, %direction, "Placed word");
        true
    }

    /// Bordered text rendering, one `\n`-terminated line per row plus borders
    pub fn render(&self) -> String {
        let grid = self.lock();
        let border = format!("+{}+\n", "-".repeat(self.cols));

        let mut out = String::with_capacity((self.rows + 2) * (self.cols + 3));
        out.push_str(&border);
        for row in grid.chunks(self.cols.max(1)).take(self.rows) {
            out.push('|');
            out.extend(row.iter().map(|cell| cell.unwrap_or(' ')));
            out.push_str("|\n");
        }
        if self.cols == 0 {
            // no cells to chunk; still one framed line per row
            for _ in 0..self.rows {
                out.push_str("||\n");
            }
        }
        out.push_str(&border);
        out
    }

    /// Letter at `(row, col)`, if any
    pub fn cell(&self, row: usize, col: usize) -> Option<char> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.lock()[row * self.cols + col]
    }

    /// Every maximal run of two or more letters, across rows then down columns, is a word
    fn runs_are_words(&self, cells: &[Cell]) -> bool {
        let rows_ok = (0..self.rows).all(|r| {
            self.line_is_valid((0..self.cols).map(|c| cells[r * self.cols + c]))
        });
        rows_ok
            && (0..self.cols).all(|c| {
                self.line_is_valid((0..self.rows).map(|r| cells[r * self.cols + c]))
            })
    }

    fn line_is_valid(&self, line: impl Iterator<Item = Cell>) -> bool {
        let mut run = String::new();
        for cell in line.chain(std::iter::once(None)) {
            match cell {
                Some(letter) => run.push(letter),
                None => {
                    if run.chars().nth(1).is_some() && !self.dictionary.is_valid(&run) {
                        trace!(%run, "Run is not a dictionary word");
                        return false;
                    }
                    run.clear();
                }
            }
        }
        true
    }

    // A panic while holding the lock cannot leave a torn grid: the live grid is
    // only ever replaced wholesale, so a poisoned lock is still consistent.
    fn lock(&self) -> MutexGuard<'_, Vec<Cell>> {
        self.cells.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
