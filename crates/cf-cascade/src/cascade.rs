//! Cascade controller
//!
//! One step: detect → pay (from a pre-growth snapshot) → grow + clear → collapse.
//! Steps repeat until detection finds nothing, at which point the board is
//! STABLE and the spin is over. No depth limit is imposed.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::cluster::{Cluster, find_clusters};
use crate::config::GridSpec;
use crate::error::EngineResult;
use crate::multiplier::MultiplierLayer;
use crate::paytable::{PayTable, average_multiplier};
use crate::symbols::SymbolId;
use crate::weights::WeightTable;

/// Cascade controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadeState {
    Resolving,
    Stable,
}

/// Payout of one cluster within a step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterWin {
    pub symbol: SymbolId,
    pub cells: Vec<usize>,
    /// Unit from the paytable
    pub unit: f64,
    /// Floor of the pre-growth mean multiplier, at least 1
    pub avg_multiplier: u32,
    pub win: f64,
}

impl ClusterWin {
    pub fn size(&self) -> usize {
        self.cells.len()
    }
}

/// Result of one resolution step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub clusters: Vec<ClusterWin>,
    pub win: f64,
    pub state: CascadeState,
}

impl StepOutcome {
    fn stable() -> Self {
        Self {
            clusters: Vec::new(),
            win: 0.0,
            state: CascadeState::Stable,
        }
    }

    pub fn clusters_found(&self) -> bool {
        !self.clusters.is_empty()
    }
}

/// Result of a full cascade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CascadeOutcome {
    /// Winning steps only (the final, empty detection is not recorded)
    pub steps: Vec<StepOutcome>,
    pub total_win: f64,
}

impl CascadeOutcome {
    pub fn depth(&self) -> usize {
        self.steps.len()
    }
}

/// Borrowed view of the rules needed to resolve a board
#[derive(Debug, Clone, Copy)]
pub struct CascadeResolver<'a> {
    grid: GridSpec,
    paytable: &'a PayTable,
    weights: &'a WeightTable,
    bet: f64,
}

impl<'a> CascadeResolver<'a> {
    pub fn new(grid: GridSpec, paytable: &'a PayTable, weights: &'a WeightTable, bet: f64) -> Self {
        Self {
            grid,
            paytable,
            weights,
            bet,
        }
    }

    /// Clusters on `board` under the configured rules
    pub fn find_clusters(&self, board: &Board) -> Vec<Cluster> {
        find_clusters(
            board,
            self.paytable.symbols(),
            self.paytable.min_cluster_size(),
        )
    }

    /// Run one resolution step.
    ///
    /// With no clusters, the board and layer are left untouched and the
    /// outcome is STABLE.
    pub fn resolve_step<R: Rng + ?Sized>(
        &self,
        board: &mut Board,
        layer: &mut MultiplierLayer,
        rng: &mut R,
    ) -> EngineResult<StepOutcome> {
        board.check_grid(self.grid)?;
        layer.check_len(self.grid.total_positions())?;

        let clusters = self.find_clusters(board);
        if clusters.is_empty() {
            return Ok(StepOutcome::stable());
        }

        // Pay every cluster from the same snapshot before any growth
        let mut wins = Vec::with_capacity(clusters.len());
        for cluster in clusters {
            let snapshot = cluster
                .cells
                .iter()
                .map(|&i| layer.value_at(i))
                .collect::<Result<Vec<_>, _>>()?;
            let avg_multiplier = average_multiplier(&snapshot);
            let unit = self.paytable.unit(&cluster)?;
            let win = self.paytable.payout(&cluster, avg_multiplier, self.bet)?;
            wins.push(ClusterWin {
                symbol: cluster.symbol,
                cells: cluster.cells,
                unit,
                avg_multiplier,
                win,
            });
        }

        for cell in wins.iter().flat_map(|w| w.cells.iter().copied()) {
            layer.grow(cell)?;
            board.clear(cell)?;
        }

        board.collapse(self.weights, rng)?;

        let win = wins.iter().map(|w| w.win).sum();
        log::debug!(
            "Cascade step: {} clusters, win {win:.2}, peak multiplier {}",
            wins.len(),
            layer.peak()
        );

        Ok(StepOutcome {
            clusters: wins,
            win,
            state: CascadeState::Resolving,
        })
    }

    /// Resolve until STABLE, summing every step's win
    pub fn run_cascade<R: Rng + ?Sized>(
        &self,
        board: &mut Board,
        layer: &mut MultiplierLayer,
        rng: &mut R,
    ) -> EngineResult<CascadeOutcome> {
        let mut steps = Vec::new();
        let mut total_win = 0.0;

        loop {
            let step = self.resolve_step(board, layer, rng)?;
            if step.state == CascadeState::Stable {
                break;
            }
            total_win += step.win;
            steps.push(step);
        }

        board.check_complete()?;
        Ok(CascadeOutcome { steps, total_win })
    }
}
