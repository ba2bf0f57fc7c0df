//! Cluster detection
//!
//! A cluster is a maximal 4-connected region of one non-scatter symbol with at
//! least `min_size` cells. Every cell is visited once, so a pass is O(R·C) and
//! clusters from one pass never share a cell.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::symbols::{SymbolId, SymbolSet};

/// A winning group of identical symbols
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    /// Non-scatter symbol shared by every cell
    pub symbol: SymbolId,
    /// Row-major cell indices, in discovery order
    pub cells: Vec<usize>,
}

impl Cluster {
    pub fn size(&self) -> usize {
        self.cells.len()
    }
}

/// Find every cluster of at least `min_size` cells
pub fn find_clusters(board: &Board, symbols: &SymbolSet, min_size: usize) -> Vec<Cluster> {
    let grid = board.grid();
    let mut seen = vec![false; board.len()];
    let mut queue = VecDeque::new();
    let mut clusters = Vec::new();

    for start in 0..board.len() {
        if seen[start] {
            continue;
        }
        let Some(symbol) = board.get(start) else {
            continue;
        };
        if symbols.is_scatter(symbol) {
            continue;
        }

        seen[start] = true;
        queue.push_back(start);
        let mut cells = Vec::new();

        while let Some(index) = queue.pop_front() {
            cells.push(index);
            for neighbor in grid.neighbors(index) {
                if !seen[neighbor] && board.get(neighbor) == Some(symbol) {
                    seen[neighbor] = true;
                    queue.push_back(neighbor);
                }
            }
        }

        if cells.len() >= min_size {
            clusters.push(Cluster { symbol, cells });
        }
    }

    clusters
}
