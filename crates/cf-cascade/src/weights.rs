//! Weighted symbol sampler
//!
//! A `WeightTable` maps every symbol to a non-negative integer weight. It is
//! validated on construction (and on deserialization), so sampling only fails
//! when a caller excludes the last symbol with a nonzero weight.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::symbols::{SymbolId, SymbolSet};

/// Lower/upper clamp for the weight tuning target
const TUNE_MIN: f64 = 0.7;
const TUNE_MAX: f64 = 1.4;

/// Discrete symbol distribution used for both the initial deal and refill
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<SymbolId, i64>", into = "BTreeMap<SymbolId, i64>")]
pub struct WeightTable {
    weights: BTreeMap<SymbolId, i64>,
}

impl WeightTable {
    /// Build a validated table
    pub fn new(entries: impl IntoIterator<Item = (SymbolId, i64)>) -> Result<Self, ConfigError> {
        let weights: BTreeMap<SymbolId, i64> = entries.into_iter().collect();
        if let Some((&symbol, &weight)) = weights.iter().find(|(_, w)| **w < 0) {
            return Err(ConfigError::NegativeWeight { symbol, weight });
        }
        if weights.values().sum::<i64>() <= 0 {
            return Err(ConfigError::DegenerateWeights);
        }
        Ok(Self { weights })
    }

    /// Default candy weights (R18 O18 Y18 G16 B14 P12 S3)
    pub fn candy() -> Self {
        Self {
            weights: BTreeMap::from([
                (1, 18),
                (2, 18),
                (3, 18),
                (4, 16),
                (5, 14),
                (6, 12),
                (7, 3),
            ]),
        }
    }

    /// Weight of a symbol (0 when absent)
    pub fn weight(&self, symbol: SymbolId) -> i64 {
        self.weights.get(&symbol).copied().unwrap_or(0)
    }

    pub fn total(&self) -> i64 {
        self.weights.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, i64)> + '_ {
        self.weights.iter().map(|(&id, &w)| (id, w))
    }

    /// Copy of this table with one weight replaced
    pub fn with_weight(&self, symbol: SymbolId, weight: i64) -> Result<Self, ConfigError> {
        let mut weights = self.weights.clone();
        weights.insert(symbol, weight);
        Self::new(weights)
    }

    /// Draw one symbol proportionally to its weight
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<SymbolId, ConfigError> {
        self.sample_excluding(rng, None)
    }

    /// Draw with `excluded` treated as weight 0 for this draw only
    pub fn sample_excluding<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        excluded: Option<SymbolId>,
    ) -> Result<SymbolId, ConfigError> {
        let live = || {
            self.weights
                .iter()
                .filter(move |(id, _)| Some(**id) != excluded)
                .map(|(&id, &w)| (id, u64::try_from(w).unwrap_or(0)))
        };

        let total: u64 = live().map(|(_, w)| w).sum();
        if total == 0 {
            return Err(ConfigError::DegenerateWeights);
        }

        let mut roll = rng.random_range(0..total);
        for (id, w) in live() {
            if roll < w {
                return Ok(id);
            }
            roll -= w;
        }
        Err(ConfigError::DegenerateWeights)
    }

    /// Every weighted symbol must exist in the symbol set
    pub fn check_symbols(&self, symbols: &SymbolSet) -> Result<(), ConfigError> {
        match self.weights.keys().find(|id| symbols.get(**id).is_none()) {
            Some(&id) => Err(ConfigError::UnknownSymbol(id)),
            None => Ok(()),
        }
    }

    /// Operator tuning: scale regular weights by `target` and the scatter by its inverse.
    ///
    /// `target` is clamped to [0.7, 1.4]; every resulting weight is at least 1.
    /// A non-finite target is rejected.
    pub fn nudged(&self, scatter: SymbolId, target: f64) -> Result<Self, ConfigError> {
        if !target.is_finite() {
            return Err(ConfigError::InvalidTuneTarget(target));
        }
        let t = target.clamp(TUNE_MIN, TUNE_MAX);
        let weights = self
            .weights
            .iter()
            .map(|(&id, &w)| {
                let scaled = if id == scatter { w as f64 / t } else { w as f64 * t };
                (id, (scaled.round() as i64).max(1))
            })
            .collect();
        Ok(Self { weights })
    }
}

impl Default for WeightTable {
    fn default() -> Self {
        Self::candy()
    }
}

impl TryFrom<BTreeMap<SymbolId, i64>> for WeightTable {
    type Error = ConfigError;

    fn try_from(weights: BTreeMap<SymbolId, i64>) -> Result<Self, Self::Error> {
        Self::new(weights)
    }
}

impl From<WeightTable> for BTreeMap<SymbolId, i64> {
    fn from(table: WeightTable) -> Self {
        table.weights
    }
}
