//! Per-cell multiplier layers and their growth policies
//!
//! Two independent layers exist per session: a round-scoped one, reset at the
//! start of every base spin, and a bonus-scoped one, reset only on bonus entry
//! and exit. Clearing and refilling a board cell never touches its multiplier.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, InvariantViolation};

/// Rule mapping a cell's current multiplier to its next value after a hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthPolicy {
    /// `m + 1`
    Increment,
    /// `max(2, m * 2)`
    Double,
}

impl GrowthPolicy {
    /// Uncapped next value (saturating)
    pub fn apply(self, current: u32) -> u32 {
        match self {
            Self::Increment => current.saturating_add(1),
            Self::Double => current.saturating_mul(2).max(2),
        }
    }
}

/// Growth policy plus its cap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Growth {
    pub policy: GrowthPolicy,
    /// Highest value a cell can reach
    pub cap: u32,
}

impl Growth {
    pub fn new(policy: GrowthPolicy, cap: u32) -> Self {
        Self { policy, cap }
    }

    pub fn increment(cap: u32) -> Self {
        Self::new(GrowthPolicy::Increment, cap)
    }

    pub fn doubling(cap: u32) -> Self {
        Self::new(GrowthPolicy::Double, cap)
    }

    /// `min(cap, policy(current))`, never below `current`
    pub fn next(&self, current: u32) -> u32 {
        self.policy.apply(current).min(self.cap).max(current)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cap == 0 {
            return Err(ConfigError::InvalidGrowth("cap must be at least 1"));
        }
        Ok(())
    }
}

impl Default for Growth {
    fn default() -> Self {
        Self::increment(128)
    }
}

/// One multiplier per grid cell, each in `1..=cap`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiplierLayer {
    values: Vec<u32>,
    growth: Growth,
}

impl MultiplierLayer {
    /// All-1 layer for `len` cells
    pub fn new(len: usize, growth: Growth) -> Self {
        Self {
            values: vec![1; len],
            growth,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn growth(&self) -> Growth {
        self.growth
    }

    pub fn values(&self) -> &[u32] {
        &self.values
    }

    pub fn value_at(&self, index: usize) -> Result<u32, InvariantViolation> {
        self.values
            .get(index)
            .copied()
            .ok_or(InvariantViolation::LayerIndex {
                index,
                len: self.values.len(),
            })
    }

    /// Apply the growth policy to one cell, returning the new value
    pub fn grow(&mut self, index: usize) -> Result<u32, InvariantViolation> {
        let len = self.values.len();
        let growth = self.growth;
        let cell = self
            .values
            .get_mut(index)
            .ok_or(InvariantViolation::LayerIndex { index, len })?;
        *cell = growth.next(*cell);
        Ok(*cell)
    }

    /// All cells back to 1
    pub fn reset(&mut self) {
        self.values.fill(1);
    }

    /// Largest multiplier currently on the layer
    pub fn peak(&self) -> u32 {
        self.values.iter().copied().max().unwrap_or(1)
    }

    pub fn is_pristine(&self) -> bool {
        self.values.iter().all(|&v| v == 1)
    }

    pub fn check_len(&self, expected: usize) -> Result<(), InvariantViolation> {
        if self.values.len() != expected {
            return Err(InvariantViolation::LayerSize {
                expected,
                actual: self.values.len(),
            });
        }
        Ok(())
    }
}
