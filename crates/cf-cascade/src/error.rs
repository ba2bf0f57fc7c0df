//! Error types for the cascade engine

use thiserror::Error;

use crate::symbols::SymbolId;

/// Configuration problems, surfaced to the operator before any balance mutation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Degenerate weight distribution: total weight is zero")]
    DegenerateWeights,

    #[error("Negative weight {weight} for symbol {symbol}")]
    NegativeWeight { symbol: SymbolId, weight: i64 },

    #[error("Unknown symbol id: {0}")]
    UnknownSymbol(SymbolId),

    #[error("Duplicate symbol id: {0}")]
    DuplicateSymbol(SymbolId),

    #[error("Symbol set has no scatter symbol")]
    MissingScatter,

    #[error("Symbol set has {0} scatter symbols, expected exactly one")]
    MultipleScatters(usize),

    #[error("Invalid base value {base} for symbol {symbol}")]
    InvalidBase { symbol: SymbolId, base: f64 },

    #[error("Invalid weight tuning target: {0}")]
    InvalidTuneTarget(f64),

    #[error("Payout table has no entry for symbol {symbol} at threshold {threshold}")]
    MissingPayout { symbol: SymbolId, threshold: usize },

    #[error("Invalid payout ladder: {0}")]
    InvalidLadder(&'static str),

    #[error("Invalid grid: {0}")]
    InvalidGrid(&'static str),

    #[error("Invalid growth policy: {0}")]
    InvalidGrowth(&'static str),

    #[error("Invalid scatter award table: {0}")]
    InvalidAwardTable(&'static str),

    #[error("Config parse error: {0}")]
    Parse(String),
}

/// Internal contract breaches (programmer errors, never user-facing)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("Board has {actual} cells, expected {expected}")]
    BoardSize { expected: usize, actual: usize },

    #[error("Cluster of size {size} is below the minimum of {min}")]
    ClusterTooSmall { size: usize, min: usize },

    #[error("Cell index {index} out of range (board has {len} cells)")]
    CellIndex { index: usize, len: usize },

    #[error("Multiplier index {index} out of range (layer has {len} cells)")]
    LayerIndex { index: usize, len: usize },

    #[error("Multiplier layer has {actual} cells, expected {expected}")]
    LayerSize { expected: usize, actual: usize },

    #[error("Cell {0} is empty outside a resolution step")]
    EmptyCell(usize),
}

/// Errors raised by the session surface
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error("Insufficient balance {balance:.2} for bet {bet:.2}")]
    InsufficientBalance { balance: f64, bet: f64 },

    #[error("Invalid bet: {0}")]
    InvalidBet(f64),

    #[error("A spin is already in progress")]
    SpinInProgress,
}

/// Engine error type
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Invariant(#[from] InvariantViolation),

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Result type alias
pub type EngineResult<T> = Result<T, EngineError>;
