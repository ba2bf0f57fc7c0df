//! Spin result

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::bonus::{BonusMode, BonusTransition};
use crate::cascade::StepOutcome;

/// Complete outcome of one spin, for presentation layers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpinResult {
    /// Spin ID
    pub spin_id: String,
    /// Bet amount
    pub bet: f64,
    /// Mode the spin was played in
    pub mode: BonusMode,
    /// Board as dealt
    pub initial_board: Board,
    /// Terminal (STABLE) board
    pub final_board: Board,
    /// Winning cascade steps, in order
    pub steps: Vec<StepOutcome>,
    /// Sum of every step's win
    pub total_win: f64,
    /// Win-to-bet ratio
    pub win_ratio: f64,
    /// Scatters on the terminal board
    pub scatter_count: usize,
    /// Bonus state change caused by this spin
    pub bonus: BonusTransition,
    /// Bonus spins left after this spin
    pub spins_remaining: u32,
    /// Amount credited to the balance by this spin
    pub settled: f64,
    /// Balance after debit and settlement
    pub balance: f64,
    /// Active multiplier layer after the cascade
    pub multipliers: Vec<u32>,
}

impl SpinResult {
    pub fn is_win(&self) -> bool {
        self.total_win > 0.0
    }

    pub fn is_bonus_spin(&self) -> bool {
        self.mode == BonusMode::BonusActive
    }

    /// Number of winning cascade steps
    pub fn cascade_depth(&self) -> usize {
        self.steps.len()
    }

    /// Total clusters paid across all steps
    pub fn cluster_count(&self) -> usize {
        self.steps.iter().map(|s| s.clusters.len()).sum()
    }

    pub fn triggered_bonus(&self) -> bool {
        matches!(self.bonus, BonusTransition::Entered { .. })
    }
}
