//! Bonus state machine
//!
//! ```text
//!            entry award > 0
//!   BASE ─────────────────────────▶ BONUS_ACTIVE ──┐ retrigger: += award
//!    ▲    (bonus layer reset,            │         │ then -= 1 per spin
//!    │     spin win settled now)         │◀────────┘
//!    └───────────────────────────────────┘
//!        spins_remaining hits 0 (bonus winnings settled, bonus layer reset)
//! ```
//!
//! The machine runs once per completed spin, on the terminal board's scatter
//! count.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::multiplier::MultiplierLayer;

/// One row of a scatter award table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwardTier {
    /// Scatters needed
    pub min_scatter: usize,
    /// Bonus spins granted
    pub spins: u32,
}

impl AwardTier {
    pub fn new(min_scatter: usize, spins: u32) -> Self {
        Self { min_scatter, spins }
    }
}

/// Scatter count → spins; the highest threshold met wins
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScatterAwardTable {
    tiers: Vec<AwardTier>,
}

impl ScatterAwardTable {
    pub fn new(tiers: Vec<AwardTier>) -> Result<Self, ConfigError> {
        let table = Self { tiers };
        table.validate()?;
        Ok(table)
    }

    /// 3→10, 4→12, 5→15, 6→20, 7→30
    pub fn candy() -> Self {
        Self {
            tiers: vec![
                AwardTier::new(3, 10),
                AwardTier::new(4, 12),
                AwardTier::new(5, 15),
                AwardTier::new(6, 20),
                AwardTier::new(7, 30),
            ],
        }
    }

    pub fn tiers(&self) -> &[AwardTier] {
        &self.tiers
    }

    /// Spins awarded for `scatter_count` (0 below the smallest threshold)
    pub fn award(&self, scatter_count: usize) -> u32 {
        self.tiers
            .iter()
            .filter(|tier| tier.min_scatter <= scatter_count)
            .max_by_key(|tier| tier.min_scatter)
            .map_or(0, |tier| tier.spins)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tiers.iter().any(|t| t.min_scatter == 0) {
            return Err(ConfigError::InvalidAwardTable("thresholds must be at least 1"));
        }
        for (i, tier) in self.tiers.iter().enumerate() {
            if self.tiers[..i].iter().any(|t| t.min_scatter == tier.min_scatter) {
                return Err(ConfigError::InvalidAwardTable("duplicate threshold"));
            }
        }
        Ok(())
    }
}

/// Bonus mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BonusMode {
    #[default]
    Base,
    BonusActive,
}

/// Bonus runtime state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BonusState {
    pub mode: BonusMode,
    /// Nonzero only while the bonus is active
    pub spins_remaining: u32,
    /// Spins granted in the current sequence (entry + retriggers)
    pub spins_awarded: u32,
    /// Bonus spins completed in the current sequence
    pub spins_played: u32,
    /// Winnings held until bonus exit
    pub accumulated_win: f64,
}

impl BonusState {
    pub fn is_active(&self) -> bool {
        self.mode == BonusMode::BonusActive
    }
}

/// What the machine did for one completed spin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BonusTransition {
    /// Base spin, no award
    None,
    /// Bonus entered with `spins` spins
    Entered { spins: u32 },
    /// Bonus spin that retriggered
    Retriggered { added: u32, remaining: u32 },
    /// Bonus spin without retrigger, bonus continues
    Continued { remaining: u32 },
    /// Last bonus spin played; `total_win` settled
    Exited { total_win: f64 },
}

/// Transition plus the amount to credit to the balance now
#[derive(Debug, Clone, PartialEq)]
pub struct BonusOutcome {
    pub transition: BonusTransition,
    pub settled: f64,
}

/// Drives BASE ⇄ BONUS_ACTIVE
#[derive(Debug, Clone)]
pub struct BonusMachine {
    state: BonusState,
    entry: ScatterAwardTable,
    retrigger: ScatterAwardTable,
}

impl BonusMachine {
    pub fn new(entry: ScatterAwardTable, retrigger: ScatterAwardTable) -> Self {
        Self {
            state: BonusState::default(),
            entry,
            retrigger,
        }
    }

    pub fn state(&self) -> &BonusState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    pub fn spins_remaining(&self) -> u32 {
        self.state.spins_remaining
    }

    /// Feed the result of a completed spin.
    ///
    /// In BASE the spin win is settled immediately, whether or not the bonus is
    /// entered. In BONUS_ACTIVE the retrigger award is added before the spin
    /// is decremented, and winnings are held until exit.
    pub fn on_spin_complete(
        &mut self,
        scatter_count: usize,
        spin_win: f64,
        bonus_layer: &mut MultiplierLayer,
    ) -> BonusOutcome {
        match self.state.mode {
            BonusMode::Base => {
                let award = self.entry.award(scatter_count);
                let transition = if award > 0 {
                    bonus_layer.reset();
                    self.state = BonusState {
                        mode: BonusMode::BonusActive,
                        spins_remaining: award,
                        spins_awarded: award,
                        spins_played: 0,
                        accumulated_win: 0.0,
                    };
                    log::info!("Bonus entered: {award} spins ({scatter_count} scatters)");
                    BonusTransition::Entered { spins: award }
                } else {
                    BonusTransition::None
                };
                BonusOutcome {
                    transition,
                    settled: spin_win,
                }
            }
            BonusMode::BonusActive => {
                self.state.accumulated_win += spin_win;
                self.state.spins_played += 1;

                let added = self.retrigger.award(scatter_count);
                if added > 0 {
                    self.state.spins_remaining = self.state.spins_remaining.saturating_add(added);
                    self.state.spins_awarded = self.state.spins_awarded.saturating_add(added);
                    log::info!("Bonus retriggered: +{added} spins ({scatter_count} scatters)");
                }
                self.state.spins_remaining = self.state.spins_remaining.saturating_sub(1);

                if self.state.spins_remaining == 0 {
                    let total_win = self.state.accumulated_win;
                    log::info!(
                        "Bonus finished after {} spins, paying {total_win:.2}",
                        self.state.spins_played
                    );
                    bonus_layer.reset();
                    self.state = BonusState::default();
                    return BonusOutcome {
                        transition: BonusTransition::Exited { total_win },
                        settled: total_win,
                    };
                }

                let remaining = self.state.spins_remaining;
                let transition = if added > 0 {
                    BonusTransition::Retriggered { added, remaining }
                } else {
                    BonusTransition::Continued { remaining }
                };
                BonusOutcome {
                    transition,
                    settled: 0.0,
                }
            }
        }
    }

    /// Drop back to BASE without settling (session reset)
    pub fn reset(&mut self) {
        self.state = BonusState::default();
    }
}
