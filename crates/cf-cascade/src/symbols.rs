//! Symbol definitions

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Symbol identifier as stored in board cells
pub type SymbolId = u32;

/// Symbol type classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum SymbolType {
    /// Regular paying symbol, forms clusters
    Regular = 0,
    /// Scatter - never clusters, counted on the terminal board for bonus awards
    Scatter = 1,
}

/// A symbol definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    /// Unique symbol ID
    pub id: SymbolId,
    /// Short key (e.g., "R", "S")
    pub name: String,
    /// Display label for presentation layers
    #[serde(default)]
    pub label: String,
    /// Symbol type
    pub symbol_type: SymbolType,
    /// Payout base value (used by the continuous payout scheme)
    pub base: f64,
}

impl Symbol {
    /// Create a regular symbol
    pub fn regular(id: SymbolId, name: impl Into<String>, label: impl Into<String>, base: f64) -> Self {
        Self {
            id,
            name: name.into(),
            label: label.into(),
            symbol_type: SymbolType::Regular,
            base,
        }
    }

    /// Create a scatter symbol
    pub fn scatter(id: SymbolId, name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            label: label.into(),
            symbol_type: SymbolType::Scatter,
            base: 0.0,
        }
    }

    pub fn is_scatter(&self) -> bool {
        self.symbol_type == SymbolType::Scatter
    }
}

/// The fixed symbol set of a game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolSet {
    pub symbols: Vec<Symbol>,
}

impl SymbolSet {
    pub fn new(symbols: Vec<Symbol>) -> Self {
        Self { symbols }
    }

    /// Candy theme: six fruits plus the candy scatter
    pub fn candy() -> Self {
        Self::new(vec![
            Symbol::regular(1, "R", "🍓", 1.2),
            Symbol::regular(2, "O", "🍊", 1.1),
            Symbol::regular(3, "Y", "🍋", 1.0),
            Symbol::regular(4, "G", "🍏", 1.15),
            Symbol::regular(5, "B", "🫐", 1.25),
            Symbol::regular(6, "P", "🍇", 1.3),
            Symbol::scatter(7, "S", "🍬S"),
        ])
    }

    /// Get symbol by ID
    pub fn get(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.iter().find(|s| s.id == id)
    }

    /// Get symbol by short key
    pub fn by_name(&self, name: &str) -> Option<&Symbol> {
        self.symbols.iter().find(|s| s.name == name)
    }

    /// Get all regular symbol IDs
    pub fn regular_ids(&self) -> Vec<SymbolId> {
        self.symbols
            .iter()
            .filter(|s| s.symbol_type == SymbolType::Regular)
            .map(|s| s.id)
            .collect()
    }

    /// Get scatter symbol ID
    pub fn scatter_id(&self) -> Option<SymbolId> {
        self.symbols.iter().find(|s| s.is_scatter()).map(|s| s.id)
    }

    pub fn is_scatter(&self, id: SymbolId) -> bool {
        self.get(id).is_some_and(Symbol::is_scatter)
    }

    /// Base value of a symbol, or an error for ids outside the set
    pub fn base_value(&self, id: SymbolId) -> Result<f64, ConfigError> {
        self.get(id)
            .map(|s| s.base)
            .ok_or(ConfigError::UnknownSymbol(id))
    }

    /// Exactly one scatter, unique ids
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.symbols.iter().filter(|s| s.is_scatter()).count() {
            0 => return Err(ConfigError::MissingScatter),
            1 => {}
            n => return Err(ConfigError::MultipleScatters(n)),
        }
        for (i, symbol) in self.symbols.iter().enumerate() {
            if self.symbols[..i].iter().any(|s| s.id == symbol.id) {
                return Err(ConfigError::DuplicateSymbol(symbol.id));
            }
        }
        Ok(())
    }
}

impl Default for SymbolSet {
    fn default() -> Self {
        Self::candy()
    }
}
