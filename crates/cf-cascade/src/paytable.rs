//! Paytable and cluster payout calculation

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cluster::Cluster;
use crate::error::{ConfigError, EngineResult, InvariantViolation};
use crate::symbols::{SymbolId, SymbolSet};
use crate::weights::WeightTable;

/// How a (symbol, cluster size) pair maps to a payout unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PayoutScheme {
    /// `base(symbol) × size`
    Continuous,
    /// Ascending size thresholds; the unit is that of the greatest threshold
    /// not exceeding the cluster size (0 below the first threshold)
    Ladder {
        thresholds: Vec<usize>,
        units: BTreeMap<SymbolId, Vec<f64>>,
    },
}

impl PayoutScheme {
    /// Candy ladder: 5 / 8 / 12 / 15 / 20+ cells
    pub fn candy_ladder() -> Self {
        Self::Ladder {
            thresholds: vec![5, 8, 12, 15, 20],
            units: BTreeMap::from([
                (1, vec![2.0, 4.0, 10.0, 25.0, 60.0]),
                (2, vec![1.5, 3.0, 8.0, 20.0, 50.0]),
                (3, vec![1.0, 2.5, 6.0, 15.0, 40.0]),
                (4, vec![1.5, 3.5, 9.0, 22.0, 55.0]),
                (5, vec![2.5, 5.0, 12.0, 30.0, 75.0]),
                (6, vec![3.0, 6.0, 15.0, 40.0, 100.0]),
            ]),
        }
    }

    /// Unit value for a cluster of `size` cells of `symbol`
    pub fn unit(&self, symbols: &SymbolSet, symbol: SymbolId, size: usize) -> Result<f64, ConfigError> {
        match self {
            Self::Continuous => Ok(symbols.base_value(symbol)? * size as f64),
            Self::Ladder { thresholds, units } => {
                let Some(step) = thresholds.iter().rposition(|&t| t <= size) else {
                    return Ok(0.0);
                };
                units
                    .get(&symbol)
                    .and_then(|row| row.get(step))
                    .copied()
                    .ok_or(ConfigError::MissingPayout {
                        symbol,
                        threshold: thresholds[step],
                    })
            }
        }
    }

    /// Continuous: every regular base must be finite and non-negative.
    ///
    /// Ladder: every reachable (symbol, threshold) pair must have a unit, where
    /// reachable means a regular symbol with a positive weight.
    pub fn validate(
        &self,
        symbols: &SymbolSet,
        weights: &WeightTable,
        min_cluster_size: usize,
    ) -> Result<(), ConfigError> {
        let Self::Ladder { thresholds, units } = self else {
            for symbol in symbols.symbols.iter().filter(|s| !s.is_scatter()) {
                if !symbol.base.is_finite() || symbol.base < 0.0 {
                    return Err(ConfigError::InvalidBase {
                        symbol: symbol.id,
                        base: symbol.base,
                    });
                }
            }
            return Ok(());
        };

        if thresholds.is_empty() {
            return Err(ConfigError::InvalidLadder("no thresholds"));
        }
        if thresholds.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ConfigError::InvalidLadder("thresholds must be strictly ascending"));
        }
        if thresholds[0] > min_cluster_size {
            return Err(ConfigError::InvalidLadder(
                "first threshold exceeds the minimum cluster size",
            ));
        }
        if units.values().flatten().any(|u| !u.is_finite() || *u < 0.0) {
            return Err(ConfigError::InvalidLadder("units must be finite and non-negative"));
        }

        for symbol in symbols.regular_ids() {
            if weights.weight(symbol) <= 0 {
                continue;
            }
            let have = units.get(&symbol).map_or(0, Vec::len);
            if let Some(&threshold) = thresholds.get(have) {
                return Err(ConfigError::MissingPayout { symbol, threshold });
            }
        }
        Ok(())
    }
}

impl Default for PayoutScheme {
    fn default() -> Self {
        Self::Continuous
    }
}

/// `floor(mean)` of pre-growth multipliers, never below 1
pub fn average_multiplier(values: &[u32]) -> u32 {
    if values.is_empty() {
        return 1;
    }
    let sum: u64 = values.iter().map(|&v| u64::from(v)).sum();
    let mean = sum / values.len() as u64;
    u32::try_from(mean).unwrap_or(u32::MAX).max(1)
}

/// Symbol set + payout scheme + minimum cluster size
#[derive(Debug, Clone)]
pub struct PayTable {
    symbols: SymbolSet,
    scheme: PayoutScheme,
    min_cluster_size: usize,
}

impl PayTable {
    pub fn new(symbols: SymbolSet, scheme: PayoutScheme, min_cluster_size: usize) -> Self {
        Self {
            symbols,
            scheme,
            min_cluster_size,
        }
    }

    /// Create a paytable from an engine config
    pub fn from_config(config: &crate::config::EngineConfig) -> Self {
        Self::new(
            config.symbols.clone(),
            config.payout.clone(),
            config.min_cluster_size,
        )
    }

    pub fn symbols(&self) -> &SymbolSet {
        &self.symbols
    }

    pub fn scheme(&self) -> &PayoutScheme {
        &self.scheme
    }

    pub fn min_cluster_size(&self) -> usize {
        self.min_cluster_size
    }

    /// Unit value for a cluster
    pub fn unit(&self, cluster: &Cluster) -> EngineResult<f64> {
        if cluster.size() < self.min_cluster_size {
            return Err(InvariantViolation::ClusterTooSmall {
                size: cluster.size(),
                min: self.min_cluster_size,
            }
            .into());
        }
        Ok(self.scheme.unit(&self.symbols, cluster.symbol, cluster.size())?)
    }

    /// `unit × avg_multiplier × bet`
    pub fn payout(&self, cluster: &Cluster, avg_multiplier: u32, bet: f64) -> EngineResult<f64> {
        Ok(self.unit(cluster)? * f64::from(avg_multiplier) * bet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;

    fn cluster(symbol: SymbolId, size: usize) -> Cluster {
        Cluster {
            symbol,
            cells: (0..size).collect(),
        }
    }

    #[test]
    fn test_average_multiplier_floors() {
        assert_eq!(average_multiplier(&[1, 1, 1, 1, 5]), 1); // mean 1.8
        assert_eq!(average_multiplier(&[2, 2, 3, 3, 3]), 2); // mean 2.6
        assert_eq!(average_multiplier(&[4, 4, 4, 4, 4]), 4);
        assert_eq!(average_multiplier(&[]), 1);
    }

    #[test]
    fn test_continuous_payout() {
        let table = PayTable::new(SymbolSet::candy(), PayoutScheme::Continuous, 5);
        // R base 1.2 × 5 cells × avg 2 × bet 0.5
        let win = table.payout(&cluster(1, 5), 2, 0.5).unwrap();
        assert!((win - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_ladder_picks_greatest_threshold() {
        let scheme = PayoutScheme::candy_ladder();
        let symbols = SymbolSet::candy();
        assert!((scheme.unit(&symbols, 1, 5).unwrap() - 2.0).abs() < 1e-9);
        assert!((scheme.unit(&symbols, 1, 7).unwrap() - 2.0).abs() < 1e-9);
        assert!((scheme.unit(&symbols, 1, 8).unwrap() - 4.0).abs() < 1e-9);
        assert!((scheme.unit(&symbols, 1, 49).unwrap() - 60.0).abs() < 1e-9);
        assert_eq!(scheme.unit(&symbols, 1, 4).unwrap(), 0.0);
    }

    #[test]
    fn test_ladder_missing_entry() {
        let scheme = PayoutScheme::Ladder {
            thresholds: vec![5, 10],
            units: BTreeMap::from([(1, vec![2.0])]),
        };
        let symbols = SymbolSet::candy();
        assert_eq!(
            scheme.unit(&symbols, 1, 12),
            Err(ConfigError::MissingPayout { symbol: 1, threshold: 10 })
        );
        assert_eq!(
            scheme.validate(&symbols, &WeightTable::candy(), 5),
            Err(ConfigError::MissingPayout { symbol: 1, threshold: 10 })
        );

        // Symbol 2 unreachable when its weight is zero
        let weights = WeightTable::new([(1, 5), (7, 1)]).unwrap();
        let scheme = PayoutScheme::Ladder {
            thresholds: vec![5],
            units: BTreeMap::from([(1, vec![2.0])]),
        };
        assert!(scheme.validate(&symbols, &weights, 5).is_ok());
    }

    #[test]
    fn test_continuous_rejects_bad_base() {
        let weights = WeightTable::candy();
        assert!(PayoutScheme::Continuous.validate(&SymbolSet::candy(), &weights, 5).is_ok());

        for base in [f64::NAN, -1.0, f64::INFINITY] {
            let mut symbols = SymbolSet::candy();
            symbols.symbols[2].base = base;
            assert!(matches!(
                PayoutScheme::Continuous.validate(&symbols, &weights, 5),
                Err(ConfigError::InvalidBase { symbol: 3, .. })
            ));
        }
    }

    #[test]
    fn test_ladder_shape_validation() {
        let symbols = SymbolSet::candy();
        let weights = WeightTable::candy();
        let descending = PayoutScheme::Ladder {
            thresholds: vec![8, 5],
            units: BTreeMap::new(),
        };
        assert!(matches!(
            descending.validate(&symbols, &weights, 5),
            Err(ConfigError::InvalidLadder(_))
        ));
        let too_high = PayoutScheme::Ladder {
            thresholds: vec![6],
            units: BTreeMap::new(),
        };
        assert!(matches!(
            too_high.validate(&symbols, &weights, 5),
            Err(ConfigError::InvalidLadder(_))
        ));
    }

    #[test]
    fn test_cluster_below_minimum_is_invariant_violation() {
        let table = PayTable::new(SymbolSet::candy(), PayoutScheme::Continuous, 5);
        assert_eq!(
            table.payout(&cluster(1, 4), 1, 1.0),
            Err(EngineError::Invariant(InvariantViolation::ClusterTooSmall {
                size: 4,
                min: 5
            }))
        );
    }
}
