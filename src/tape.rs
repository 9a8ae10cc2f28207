//! The fixed-size tape the engine reads from and writes to.

use crate::types::{EngineError, BLANK_SYMBOL};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A fixed window of cells addressed by a zero-based index.
///
/// Every cell that has not been written holds `BLANK_SYMBOL`. The window never grows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tape {
    cells: Vec<char>,
}

impl Tape {
    /// Creates a tape of `window` blank cells.
    pub fn new(window: usize) -> Self {
        Self {
            cells: vec![BLANK_SYMBOL; window],
        }
    }

    /// Creates a tape with `input` centered in the window.
    ///
    /// The input starts at `window / 2 - len / 2`, where `len` counts characters.
    ///
    /// # Returns
    ///
    /// * `Ok((tape, start))` with the index of the first input cell.
    /// * `Err(EngineError::EmptyTapeWindow)` if `window` is zero.
    /// * `Err(EngineError::InputTooLong)` if the input does not fit the window.
    /// * `Err(EngineError::ReservedBlank)` if the input contains the blank symbol.
    pub fn load(window: usize, input: &str) -> Result<(Self, usize), EngineError> {
        if window == 0 {
            return Err(EngineError::EmptyTapeWindow);
        }

        let symbols: Vec<char> = input.chars().collect();

        if let Some(position) = symbols.iter().position(|&c| c == BLANK_SYMBOL) {
            return Err(EngineError::ReservedBlank { position });
        }

        let start = Self::start_offset(window, symbols.len()).ok_or(EngineError::InputTooLong {
            len: symbols.len(),
            window,
        })?;

        let mut tape = Self::new(window);
        tape.cells[start..start + symbols.len()].copy_from_slice(&symbols);

        Ok((tape, start))
    }

    /// Computes where an input of `len` symbols begins, or `None` if it would not fit.
    fn start_offset(window: usize, len: usize) -> Option<usize> {
        let start = (window / 2).checked_sub(len / 2)?;
        (start + len <= window).then_some(start)
    }

    /// Returns the symbol at `index`, or `None` outside the window.
    pub fn read(&self, index: usize) -> Option<char> {
        self.cells.get(index).copied()
    }

    /// Writes `symbol` at `index`. Returns `false` and leaves the tape untouched outside the window.
    pub fn write(&mut self, index: usize, symbol: char) -> bool {
        match self.cells.get_mut(index) {
            Some(cell) => {
                *cell = symbol;
                true
            }
            None => false,
        }
    }

    /// Returns the index reached by moving `offset` cells from `head`, if it is inside the window.
    pub fn shift(&self, head: usize, offset: isize) -> Option<usize> {
        head.checked_add_signed(offset)
            .filter(|&index| index < self.cells.len())
    }

    pub fn cells(&self) -> &[char] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Returns the written part of the tape, with leading and trailing blanks trimmed.
    ///
    /// Blanks between written cells are kept.
    ///
    /// | _ | 1 | _ | 0 | _ |
    ///
    /// yields `"1_0"`.
    pub fn contents(&self) -> String {
        let first = self.cells.iter().position(|&c| c != BLANK_SYMBOL);
        let last = self.cells.iter().rposition(|&c| c != BLANK_SYMBOL);

        match (first, last) {
            (Some(first), Some(last)) => self.cells[first..=last].iter().collect(),
            _ => String::new(),
        }
    }
}

impl fmt::Display for Tape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.cells.iter().try_for_each(|c| write!(f, "{}", c))
    }
}
