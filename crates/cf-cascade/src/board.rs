//! Board generation and gravity collapse/refill

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::GridSpec;
use crate::error::{ConfigError, InvariantViolation};
use crate::symbols::{SymbolId, SymbolSet};
use crate::weights::WeightTable;

/// Row-major grid of symbols.
///
/// A cell is `None` only transiently, between clearing a cluster and the
/// collapse that follows it within one resolution step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawBoard")]
pub struct Board {
    grid: GridSpec,
    cells: Vec<Option<SymbolId>>,
}

/// Unchecked wire form of [`Board`]
#[derive(Deserialize)]
struct RawBoard {
    grid: GridSpec,
    cells: Vec<Option<SymbolId>>,
}

impl TryFrom<RawBoard> for Board {
    type Error = InvariantViolation;

    fn try_from(raw: RawBoard) -> Result<Self, Self::Error> {
        Self::from_cells(raw.grid, raw.cells)
    }
}

impl Board {
    /// Build a full board from row-major symbols
    pub fn from_symbols(grid: GridSpec, symbols: Vec<SymbolId>) -> Result<Self, InvariantViolation> {
        Self::from_cells(grid, symbols.into_iter().map(Some).collect())
    }

    /// Build from raw cells (empty cells allowed)
    pub fn from_cells(grid: GridSpec, cells: Vec<Option<SymbolId>>) -> Result<Self, InvariantViolation> {
        let expected = grid.total_positions();
        if cells.len() != expected {
            return Err(InvariantViolation::BoardSize {
                expected,
                actual: cells.len(),
            });
        }
        Ok(Self { grid, cells })
    }

    /// Deal a fresh board.
    ///
    /// Cells are filled row by row. Once `scatter_cap` scatters are on the
    /// board, a scatter draw is redrawn with the scatter weight treated as 0
    /// for that cell only.
    pub fn generate<R: Rng + ?Sized>(
        grid: GridSpec,
        weights: &WeightTable,
        scatter: SymbolId,
        scatter_cap: usize,
        rng: &mut R,
    ) -> Result<Self, ConfigError> {
        let total = grid.total_positions();
        let mut cells = Vec::with_capacity(total);
        let mut scatters = 0usize;

        for _ in 0..total {
            let mut pick = weights.sample(rng)?;
            if pick == scatter {
                if scatters >= scatter_cap {
                    pick = weights.sample_excluding(rng, Some(scatter))?;
                } else {
                    scatters += 1;
                }
            }
            cells.push(Some(pick));
        }

        Ok(Self { grid, cells })
    }

    pub fn grid(&self) -> GridSpec {
        self.grid
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[Option<SymbolId>] {
        &self.cells
    }

    /// Symbol at a row-major index (`None` if empty or out of range)
    pub fn get(&self, index: usize) -> Option<SymbolId> {
        self.cells.get(index).copied().flatten()
    }

    pub fn get_at(&self, row: usize, col: usize) -> Option<SymbolId> {
        self.get(self.grid.index(row, col))
    }

    /// Mark a cell empty
    pub fn clear(&mut self, index: usize) -> Result<(), InvariantViolation> {
        let len = self.cells.len();
        let cell = self
            .cells
            .get_mut(index)
            .ok_or(InvariantViolation::CellIndex { index, len })?;
        *cell = None;
        Ok(())
    }

    pub fn empty_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_none()).count()
    }

    /// Number of cells holding `symbol`
    pub fn count_symbol(&self, symbol: SymbolId) -> usize {
        self.cells.iter().filter(|c| **c == Some(symbol)).count()
    }

    /// Scatter count on the board
    pub fn count_scatter(&self, symbols: &SymbolSet) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|&&id| symbols.is_scatter(id))
            .count()
    }

    /// Board must match the configured dimensions
    pub fn check_grid(&self, grid: GridSpec) -> Result<(), InvariantViolation> {
        let expected = grid.total_positions();
        if self.grid != grid || self.cells.len() != expected {
            return Err(InvariantViolation::BoardSize {
                expected,
                actual: self.cells.len(),
            });
        }
        Ok(())
    }

    /// No empty cells (required between completed rounds)
    pub fn check_complete(&self) -> Result<(), InvariantViolation> {
        match self.cells.iter().position(Option::is_none) {
            Some(index) => Err(InvariantViolation::EmptyCell(index)),
            None => Ok(()),
        }
    }

    /// Gravity collapse followed by refill.
    ///
    /// Each column is compacted downward keeping the vertical order of its
    /// surviving symbols, then the vacated top cells are filled top-down from
    /// `weights`. The scatter deal cap does not apply here.
    pub fn collapse<R: Rng + ?Sized>(
        &mut self,
        weights: &WeightTable,
        rng: &mut R,
    ) -> Result<(), ConfigError> {
        let rows = self.grid.rows as usize;
        let cols = self.grid.cols as usize;
        let mut column = Vec::with_capacity(rows);

        for col in 0..cols {
            // Survivors, bottom to top
            column.clear();
            column.extend(
                (0..rows)
                    .rev()
                    .filter_map(|row| self.cells[self.grid.index(row, col)]),
            );

            let survivors = column.len();
            for (offset, symbol) in column.iter().enumerate() {
                let row = rows - 1 - offset;
                self.cells[self.grid.index(row, col)] = Some(*symbol);
            }

            let vacated = rows - survivors;
            for row in 0..vacated {
                self.cells[self.grid.index(row, col)] = Some(weights.sample(rng)?);
            }
        }

        Ok(())
    }

    /// Multi-line rendering using symbol short keys
    pub fn render(&self, symbols: &SymbolSet) -> String {
        let cols = self.grid.cols as usize;
        self.cells
            .chunks(cols.max(1))
            .map(|row| {
                row.iter()
                    .map(|cell| match cell.and_then(|id| symbols.get(id)) {
                        Some(symbol) => symbol.name.as_str(),
                        None => ".",
                    })
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cols = self.grid.cols as usize;
        for (i, cell) in self.cells.iter().enumerate() {
            match cell {
                Some(id) => write!(f, "{id:>3}")?,
                None => write!(f, "  .")?,
            }
            if (i + 1) % cols.max(1) == 0 {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}
