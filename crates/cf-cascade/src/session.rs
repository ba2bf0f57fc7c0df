//! Game session — owns all per-player state and drives spins
//!
//! A session holds the board, both multiplier layers, the bonus machine, the
//! balance and the RNG. `spin` runs a whole round synchronously: deal, cascade
//! to STABLE, bonus bookkeeping, settlement. A spin that fails does not touch
//! the balance, the layers or the bonus state.

use std::sync::Arc;

use parking_lot::Mutex;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::bonus::{BonusMachine, BonusMode, BonusState, BonusTransition};
use crate::cascade::CascadeResolver;
use crate::config::EngineConfig;
use crate::error::{ConfigError, EngineResult, SessionError};
use crate::multiplier::MultiplierLayer;
use crate::paytable::PayTable;
use crate::spin::SpinResult;
use crate::symbols::SymbolId;
use crate::weights::WeightTable;

/// Session statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub total_spins: u64,
    pub bonus_spins: u64,
    pub total_bet: f64,
    pub total_win: f64,
    pub wins: u64,
    pub losses: u64,
    pub bonus_entries: u64,
    pub retriggers: u64,
    pub cascade_steps: u64,
    pub longest_cascade: usize,
    pub max_win_ratio: f64,
    pub peak_multiplier: u32,
}

impl SessionStats {
    /// Calculate RTP
    pub fn rtp(&self) -> f64 {
        if self.total_bet > 0.0 {
            (self.total_win / self.total_bet) * 100.0
        } else {
            0.0
        }
    }

    /// Calculate hit rate
    pub fn hit_rate(&self) -> f64 {
        if self.total_spins > 0 {
            (self.wins as f64 / self.total_spins as f64) * 100.0
        } else {
            0.0
        }
    }

    fn record(&mut self, result: &SpinResult) {
        self.total_spins += 1;
        if result.is_bonus_spin() {
            self.bonus_spins += 1;
        } else {
            self.total_bet += result.bet;
        }
        self.total_win += result.total_win;

        if result.is_win() {
            self.wins += 1;
        } else {
            self.losses += 1;
        }

        match result.bonus {
            BonusTransition::Entered { .. } => self.bonus_entries += 1,
            BonusTransition::Retriggered { .. } => self.retriggers += 1,
            _ => {}
        }

        self.cascade_steps += result.cascade_depth() as u64;
        self.longest_cascade = self.longest_cascade.max(result.cascade_depth());
        self.max_win_ratio = self.max_win_ratio.max(result.win_ratio);
        let peak = result.multipliers.iter().copied().max().unwrap_or(1);
        self.peak_multiplier = self.peak_multiplier.max(peak);
    }
}

/// One player's game state
pub struct GameSession {
    config: EngineConfig,
    paytable: PayTable,
    /// Active distribution (operator-tunable, starts at `config.weights`)
    weights: WeightTable,
    scatter: SymbolId,
    rng: StdRng,
    board: Board,
    round_layer: MultiplierLayer,
    bonus_layer: MultiplierLayer,
    bonus: BonusMachine,
    balance: f64,
    spin_count: u64,
    stats: SessionStats,
}

impl GameSession {
    /// Create a session seeded from the OS
    pub fn new(config: EngineConfig, balance: f64) -> Result<Self, ConfigError> {
        Self::with_rng(config, balance, StdRng::from_os_rng())
    }

    /// Create a reproducible session
    pub fn with_seed(config: EngineConfig, balance: f64, seed: u64) -> Result<Self, ConfigError> {
        Self::with_rng(config, balance, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: EngineConfig, balance: f64, mut rng: StdRng) -> Result<Self, ConfigError> {
        config.validate()?;
        let scatter = config
            .symbols
            .scatter_id()
            .ok_or(ConfigError::MissingScatter)?;
        let cells = config.grid.total_positions();
        let board = Board::generate(
            config.grid,
            &config.weights,
            scatter,
            config.scatter_deal_cap,
            &mut rng,
        )?;

        Ok(Self {
            paytable: PayTable::from_config(&config),
            weights: config.weights.clone(),
            round_layer: MultiplierLayer::new(cells, config.round_growth),
            bonus_layer: MultiplierLayer::new(cells, config.bonus_growth),
            bonus: BonusMachine::new(config.entry_awards.clone(), config.retrigger_awards.clone()),
            scatter,
            rng,
            board,
            balance,
            spin_count: 0,
            stats: SessionStats::default(),
            config,
        })
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // SPIN EXECUTION
    // ═══════════════════════════════════════════════════════════════════════════

    /// Deal a fresh board and resolve it
    pub fn spin(&mut self, bet: f64) -> EngineResult<SpinResult> {
        self.check_bet(bet)?;
        let board = Board::generate(
            self.config.grid,
            &self.weights,
            self.scatter,
            self.config.scatter_deal_cap,
            &mut self.rng,
        )?;
        self.play(board, bet)
    }

    /// Resolve a caller-supplied deal through the same pipeline
    pub fn spin_forced(&mut self, board: Board, bet: f64) -> EngineResult<SpinResult> {
        self.check_bet(bet)?;
        board.check_grid(self.config.grid)?;
        board.check_complete()?;
        self.play(board, bet)
    }

    fn check_bet(&self, bet: f64) -> Result<(), SessionError> {
        if !bet.is_finite() || bet <= 0.0 {
            return Err(SessionError::InvalidBet(bet));
        }
        if !self.bonus.is_active() && self.balance < bet {
            log::warn!(
                "Spin refused: balance {:.2} below bet {bet:.2}",
                self.balance
            );
            return Err(SessionError::InsufficientBalance {
                balance: self.balance,
                bet,
            });
        }
        Ok(())
    }

    fn play(&mut self, initial: Board, bet: f64) -> EngineResult<SpinResult> {
        let mode = self.bonus.state().mode;
        let in_bonus = mode == BonusMode::BonusActive;

        // Work on copies; nothing is committed unless the cascade succeeds
        let mut layer = if in_bonus {
            self.bonus_layer.clone()
        } else {
            let mut fresh = self.round_layer.clone();
            fresh.reset();
            fresh
        };
        let mut board = initial.clone();

        let resolver =
            CascadeResolver::new(self.config.grid, &self.paytable, &self.weights, bet);
        let cascade = resolver.run_cascade(&mut board, &mut layer, &mut self.rng)?;

        self.spin_count += 1;
        let multipliers = layer.values().to_vec();
        if in_bonus {
            self.bonus_layer = layer;
        } else {
            self.balance -= bet;
            self.round_layer = layer;
        }

        let scatter_count = board.count_scatter(self.paytable.symbols());
        let outcome =
            self.bonus
                .on_spin_complete(scatter_count, cascade.total_win, &mut self.bonus_layer);
        self.balance += outcome.settled;

        log::debug!(
            "spin-{:06}: {} steps, win {:.2}, {scatter_count} scatters, {:?}",
            self.spin_count,
            cascade.depth(),
            cascade.total_win,
            outcome.transition
        );

        let result = SpinResult {
            spin_id: format!("spin-{:06}", self.spin_count),
            bet,
            mode,
            initial_board: initial,
            final_board: board.clone(),
            steps: cascade.steps,
            total_win: cascade.total_win,
            win_ratio: cascade.total_win / bet,
            scatter_count,
            bonus: outcome.transition,
            spins_remaining: self.bonus.spins_remaining(),
            settled: outcome.settled,
            balance: self.balance,
            multipliers,
        };

        self.board = board;
        self.stats.record(&result);
        Ok(result)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // BOARD / MULTIPLIERS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Deal a new board without playing it; clears the round layer
    pub fn new_board(&mut self) -> Result<&Board, ConfigError> {
        self.board = Board::generate(
            self.config.grid,
            &self.weights,
            self.scatter,
            self.config.scatter_deal_cap,
            &mut self.rng,
        )?;
        self.round_layer.reset();
        Ok(&self.board)
    }

    /// Reset both multiplier layers to all-1
    pub fn reset_multipliers(&mut self) {
        self.round_layer.reset();
        self.bonus_layer.reset();
    }

    /// Last terminal board (or the initial deal)
    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn round_layer(&self) -> &MultiplierLayer {
        &self.round_layer
    }

    pub fn bonus_layer(&self) -> &MultiplierLayer {
        &self.bonus_layer
    }

    /// Layer the next spin will use
    pub fn active_layer(&self) -> &MultiplierLayer {
        if self.bonus.is_active() {
            &self.bonus_layer
        } else {
            &self.round_layer
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // CONFIGURATION
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn weights(&self) -> &WeightTable {
        &self.weights
    }

    /// Install an explicit weight table for deal and refill
    pub fn set_weights(&mut self, weights: WeightTable) -> Result<(), ConfigError> {
        weights.check_symbols(self.paytable.symbols())?;
        self.config.payout.validate(
            self.paytable.symbols(),
            &weights,
            self.config.min_cluster_size,
        )?;
        self.weights = weights;
        Ok(())
    }

    /// Derive weights from the configured base table (see [`WeightTable::nudged`])
    pub fn tune_weights(&mut self, target: f64) -> Result<(), ConfigError> {
        let tuned = self.config.weights.nudged(self.scatter, target)?;
        self.set_weights(tuned)
    }

    /// Seed RNG for reproducible results
    pub fn seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// Export config as JSON
    pub fn export_config(&self) -> Result<String, ConfigError> {
        self.config.to_json()
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // BALANCE / STATE
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn balance(&self) -> f64 {
        self.balance
    }

    /// Add funds (negative amounts are ignored)
    pub fn deposit(&mut self, amount: f64) {
        if amount.is_finite() && amount > 0.0 {
            self.balance += amount;
        }
    }

    pub fn bonus_state(&self) -> &BonusState {
        self.bonus.state()
    }

    pub fn in_bonus(&self) -> bool {
        self.bonus.is_active()
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = SessionStats::default();
        self.spin_count = 0;
    }
}

/// Thread-safe session handle.
///
/// A round runs to STABLE under the lock, so spins on one session never
/// overlap; `try_spin` reports a running round instead of waiting for it.
#[derive(Clone)]
pub struct SharedSession {
    inner: Arc<Mutex<GameSession>>,
}

impl SharedSession {
    pub fn new(session: GameSession) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    /// Spin, waiting for any running round to finish
    pub fn spin(&self, bet: f64) -> EngineResult<SpinResult> {
        self.inner.lock().spin(bet)
    }

    /// Spin only if no round is in progress
    pub fn try_spin(&self, bet: f64) -> EngineResult<SpinResult> {
        let mut session = self
            .inner
            .try_lock()
            .ok_or(SessionError::SpinInProgress)?;
        session.spin(bet)
    }

    /// Run `f` with exclusive access to the session
    pub fn with<T>(&self, f: impl FnOnce(&mut GameSession) -> T) -> T {
        f(&mut self.inner.lock())
    }
}
