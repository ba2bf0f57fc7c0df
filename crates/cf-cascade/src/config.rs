//! Engine configuration
//!
//! Everything here is constructed once and reused across spins. Configs can be
//! loaded from JSON or YAML; loading always runs [`EngineConfig::validate`].

use serde::{Deserialize, Serialize};

use crate::bonus::ScatterAwardTable;
use crate::error::ConfigError;
use crate::multiplier::Growth;
use crate::paytable::PayoutScheme;
use crate::symbols::SymbolSet;
use crate::weights::WeightTable;

/// Minimum cluster size used by every shipped preset
pub const DEFAULT_MIN_CLUSTER_SIZE: usize = 5;

/// Scatters allowed on the initial deal before further scatter draws are redrawn
pub const DEFAULT_SCATTER_DEAL_CAP: usize = 2;

/// Grid specification (rows × columns), row-major, row 0 on top
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSpec {
    /// Number of rows
    pub rows: u8,
    /// Number of columns
    pub cols: u8,
}

impl GridSpec {
    pub fn new(rows: u8, cols: u8) -> Self {
        Self { rows, cols }
    }

    /// Standard 7×7
    pub fn square_7x7() -> Self {
        Self::new(7, 7)
    }

    /// Total grid positions
    pub fn total_positions(&self) -> usize {
        self.rows as usize * self.cols as usize
    }

    /// Row-major index of (row, col)
    pub fn index(&self, row: usize, col: usize) -> usize {
        row * self.cols as usize + col
    }

    /// (row, col) of a row-major index
    pub fn position(&self, index: usize) -> (usize, usize) {
        let cols = self.cols as usize;
        (index / cols, index % cols)
    }

    /// 4-connected neighbours (up, down, left, right) of a cell
    pub fn neighbors(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        let (row, col) = self.position(index);
        let rows = self.rows as usize;
        let cols = self.cols as usize;
        let up = (row > 0).then(|| self.index(row - 1, col));
        let down = (row + 1 < rows).then(|| self.index(row + 1, col));
        let left = (col > 0).then(|| self.index(row, col - 1));
        let right = (col + 1 < cols).then(|| self.index(row, col + 1));
        [up, down, left, right].into_iter().flatten()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rows == 0 {
            return Err(ConfigError::InvalidGrid("rows must be at least 1"));
        }
        if self.cols == 0 {
            return Err(ConfigError::InvalidGrid("cols must be at least 1"));
        }
        Ok(())
    }
}

impl Default for GridSpec {
    fn default() -> Self {
        Self::square_7x7()
    }
}

fn default_min_cluster_size() -> usize {
    DEFAULT_MIN_CLUSTER_SIZE
}

fn default_scatter_deal_cap() -> usize {
    DEFAULT_SCATTER_DEAL_CAP
}

/// Complete engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Grid dimensions
    #[serde(default)]
    pub grid: GridSpec,
    /// Smallest component emitted as a cluster
    #[serde(default = "default_min_cluster_size")]
    pub min_cluster_size: usize,
    /// Scatter soft cap on the initial deal (not applied to refill)
    #[serde(default = "default_scatter_deal_cap")]
    pub scatter_deal_cap: usize,
    /// Symbol set (exactly one scatter is used for bonus counting)
    pub symbols: SymbolSet,
    /// Distribution for deal and refill
    pub weights: WeightTable,
    /// Payout table variant
    pub payout: PayoutScheme,
    /// Growth of the round-scoped multiplier layer
    pub round_growth: Growth,
    /// Growth of the bonus-scoped multiplier layer
    pub bonus_growth: Growth,
    /// Bonus entry awards (used outside the bonus)
    pub entry_awards: ScatterAwardTable,
    /// Retrigger awards (used during the bonus)
    pub retrigger_awards: ScatterAwardTable,
}

impl EngineConfig {
    /// Candy 7×7: continuous payout, +1 growth capped at 128
    pub fn candy_7x7() -> Self {
        Self {
            grid: GridSpec::square_7x7(),
            min_cluster_size: DEFAULT_MIN_CLUSTER_SIZE,
            scatter_deal_cap: DEFAULT_SCATTER_DEAL_CAP,
            symbols: SymbolSet::candy(),
            weights: WeightTable::candy(),
            payout: PayoutScheme::Continuous,
            round_growth: Growth::increment(128),
            bonus_growth: Growth::increment(128),
            entry_awards: ScatterAwardTable::candy(),
            retrigger_awards: ScatterAwardTable::candy(),
        }
    }

    /// Candy 7×7 with a threshold ladder and doubling cells (no effective cap)
    pub fn ladder_7x7() -> Self {
        Self {
            payout: PayoutScheme::candy_ladder(),
            round_growth: Growth::doubling(u32::MAX),
            bonus_growth: Growth::doubling(u32::MAX),
            ..Self::candy_7x7()
        }
    }

    /// Check the whole configuration surface
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.grid.validate()?;
        if self.min_cluster_size == 0 {
            return Err(ConfigError::InvalidGrid("min_cluster_size must be at least 1"));
        }
        self.symbols.validate()?;
        self.weights.check_symbols(&self.symbols)?;
        self.payout
            .validate(&self.symbols, &self.weights, self.min_cluster_size)?;
        self.round_growth.validate()?;
        self.bonus_growth.validate()?;
        self.entry_awards.validate()?;
        self.retrigger_awards.validate()?;
        Ok(())
    }

    /// Parse and validate a JSON config
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a YAML config
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_yml::from_str(yaml).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Export as pretty JSON
    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::candy_7x7()
    }
}
