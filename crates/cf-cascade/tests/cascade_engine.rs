//! Cascade Engine Test Suite
//!
//! End-to-end behaviour through the public API:
//! - Cluster detection invariants on random boards
//! - Gravity collapse postconditions
//! - Pre-growth payout snapshot and multiplier monotonicity
//! - Bonus entry, retrigger, exit and settlement
//! - Session mutual exclusion

use std::collections::HashSet;
use std::thread;

use cf_cascade::{
    Board, BonusMode, BonusTransition, CascadeResolver, CascadeState, EngineConfig, EngineError,
    GameSession, GridSpec, Growth, MultiplierLayer, PayTable, PayoutScheme, ScatterAwardTable,
    SessionError, SharedSession, SymbolId, SymbolSet, WeightTable, average_multiplier,
    find_clusters,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// ═══════════════════════════════════════════════════════════════════════════════
// TEST FIXTURES
// ═══════════════════════════════════════════════════════════════════════════════

const R: SymbolId = 1;
const SCATTER: SymbolId = 7;

/// 7×7 symbols without any cluster: horizontal and vertical neighbours differ
fn quiet() -> Vec<SymbolId> {
    let palette = [2, 3, 4, 5, 6];
    (0..49)
        .map(|i| {
            let (r, c) = (i / 7, i % 7);
            palette[(r + 2 * c) % 5]
        })
        .collect()
}

fn quiet_board() -> Board {
    Board::from_symbols(GridSpec::square_7x7(), quiet()).unwrap()
}

/// Quiet board with exactly one cluster: five R cells across the top row
fn red_row_board() -> Board {
    let mut cells = quiet();
    cells[..5].fill(R);
    Board::from_symbols(GridSpec::square_7x7(), cells).unwrap()
}

/// Ladder payout with +1 growth, refilling with scatters only
fn scripted_session(balance: f64) -> GameSession {
    let config = EngineConfig {
        round_growth: Growth::increment(128),
        bonus_growth: Growth::increment(128),
        ..EngineConfig::ladder_7x7()
    };
    let mut session = GameSession::with_seed(config, balance, 42).unwrap();
    session
        .set_weights(WeightTable::new([(SCATTER, 1)]).unwrap())
        .unwrap();
    session
}

fn assert_close(a: f64, b: f64) {
    assert!((a - b).abs() < 1e-9, "{a} != {b}");
}

// ═══════════════════════════════════════════════════════════════════════════════
// CLUSTERS AND COLLAPSE
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_clusters_are_disjoint_single_symbol_and_large_enough() {
    let config = EngineConfig::candy_7x7();
    let mut rng = StdRng::seed_from_u64(2024);

    for _ in 0..300 {
        let board =
            Board::generate(config.grid, &config.weights, SCATTER, 2, &mut rng).unwrap();
        let clusters = find_clusters(&board, &config.symbols, config.min_cluster_size);

        let mut seen = HashSet::new();
        for cluster in &clusters {
            assert!(cluster.size() >= 5);
            assert_ne!(cluster.symbol, SCATTER);
            for &cell in &cluster.cells {
                assert_eq!(board.get(cell), Some(cluster.symbol));
                assert!(seen.insert(cell), "cell {cell} in two clusters");
            }
        }
    }
}

#[test]
fn test_deal_respects_scatter_cap() {
    let weights = WeightTable::new([(R, 1), (SCATTER, 5)]).unwrap();
    let mut rng = StdRng::seed_from_u64(8);
    for _ in 0..50 {
        let board = Board::generate(GridSpec::square_7x7(), &weights, SCATTER, 2, &mut rng).unwrap();
        assert!(board.count_symbol(SCATTER) <= 2);
        assert!(board.check_complete().is_ok());
    }
}

#[test]
fn test_collapse_fills_board_and_keeps_column_order() {
    let grid = GridSpec::square_7x7();
    let weights = WeightTable::candy();
    let mut rng = StdRng::seed_from_u64(77);

    for _ in 0..100 {
        // Unique tags so survivors can be traced
        let cells: Vec<Option<SymbolId>> = (0..49u32)
            .map(|i| (rng.random_range(0..4) != 0).then_some(1000 + i))
            .collect();
        let mut board = Board::from_cells(grid, cells.clone()).unwrap();
        board.collapse(&weights, &mut rng).unwrap();

        assert_eq!(board.empty_count(), 0);
        for col in 0..7 {
            let before: Vec<SymbolId> = (0..7)
                .filter_map(|row| cells[grid.index(row, col)])
                .collect();
            let after: Vec<SymbolId> = (0..7)
                .filter_map(|row| board.get_at(row, col))
                .filter(|&id| id >= 1000)
                .collect();
            assert_eq!(before, after);
            // Survivors sit at the bottom
            let top = 7 - before.len();
            assert!((top..7).all(|row| board.get_at(row, col).is_some_and(|id| id >= 1000)));
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// RESOLUTION STEPS
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_step_without_clusters_changes_nothing() {
    let config = EngineConfig::candy_7x7();
    let paytable = PayTable::from_config(&config);
    let resolver = CascadeResolver::new(config.grid, &paytable, &config.weights, 1.0);

    let mut board = quiet_board();
    let mut layer = MultiplierLayer::new(49, config.round_growth);
    layer.grow(10).unwrap();
    let before = (board.clone(), layer.clone());

    let step = resolver
        .resolve_step(&mut board, &mut layer, &mut StdRng::seed_from_u64(0))
        .unwrap();
    assert!(!step.clusters_found());
    assert_eq!(step.state, CascadeState::Stable);
    assert_eq!((board, layer), before);
}

#[test]
fn test_single_cluster_end_to_end() {
    let grid = GridSpec::square_7x7();
    let paytable = PayTable::new(SymbolSet::candy(), PayoutScheme::candy_ladder(), 5);
    let refill = WeightTable::new([(SCATTER, 1)]).unwrap();
    let resolver = CascadeResolver::new(grid, &paytable, &refill, 1.0);
    let mut rng = StdRng::seed_from_u64(5);

    let mut board = red_row_board();
    let mut layer = MultiplierLayer::new(49, Growth::increment(128));

    let first = resolver.resolve_step(&mut board, &mut layer, &mut rng).unwrap();
    assert_eq!(first.clusters.len(), 1);
    assert_eq!(first.clusters[0].avg_multiplier, 1);
    assert_close(first.clusters[0].unit, 2.0);
    assert_close(first.win, 2.0);
    assert_eq!(board.empty_count(), 0);
    for cell in 0..49 {
        let expected = if cell < 5 { 2 } else { 1 };
        assert_eq!(layer.value_at(cell).unwrap(), expected);
    }
    assert!((0..5).all(|c| board.get(c) == Some(SCATTER)));

    let second = resolver.resolve_step(&mut board, &mut layer, &mut rng).unwrap();
    assert!(!second.clusters_found());
    assert_eq!(second.state, CascadeState::Stable);
}

#[test]
fn test_average_multiplier_uses_floor_of_pre_growth_values() {
    assert_eq!(average_multiplier(&[1, 1, 1, 1, 5]), 1);

    let grid = GridSpec::square_7x7();
    let paytable = PayTable::new(SymbolSet::candy(), PayoutScheme::candy_ladder(), 5);
    let refill = WeightTable::new([(SCATTER, 1)]).unwrap();
    let resolver = CascadeResolver::new(grid, &paytable, &refill, 1.0);

    let mut board = red_row_board();
    let mut layer = MultiplierLayer::new(49, Growth::increment(128));
    for _ in 0..4 {
        layer.grow(2).unwrap();
    }

    let step = resolver
        .resolve_step(&mut board, &mut layer, &mut StdRng::seed_from_u64(1))
        .unwrap();
    assert_eq!(step.clusters[0].avg_multiplier, 1);
    assert_close(step.win, 2.0);
    assert_eq!(layer.value_at(2).unwrap(), 6);
}

#[test]
fn test_multipliers_monotonic_and_capped() {
    let weights = WeightTable::new([(1, 3), (2, 3), (3, 3), (SCATTER, 1)]).unwrap();
    let paytable = PayTable::new(SymbolSet::candy(), PayoutScheme::Continuous, 5);
    let grid = GridSpec::square_7x7();
    let resolver = CascadeResolver::new(grid, &paytable, &weights, 1.0);

    for (seed, growth) in [(1, Growth::increment(3)), (2, Growth::doubling(8))] {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut layer = MultiplierLayer::new(49, growth);

        for _ in 0..200 {
            let mut board = Board::generate(grid, &weights, SCATTER, 2, &mut rng).unwrap();
            for _ in 0..10_000 {
                let before = layer.values().to_vec();
                let step = resolver.resolve_step(&mut board, &mut layer, &mut rng).unwrap();
                for (old, new) in before.iter().zip(layer.values()) {
                    assert!(new >= old);
                    assert!(*new <= growth.cap);
                }
                if step.state == CascadeState::Stable {
                    break;
                }
            }
        }
        assert_eq!(layer.peak(), growth.cap);
    }
}

#[test]
fn test_entry_table_lookup() {
    let table = ScatterAwardTable::candy();
    assert_eq!(table.award(2), 0);
    assert_eq!(table.award(3), 10);
    assert_eq!(table.award(7), 30);
}

// ═══════════════════════════════════════════════════════════════════════════════
// SESSION AND BONUS
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_base_spin_settles_and_round_layer_resets() {
    let mut session = scripted_session(100.0);

    let result = session.spin_forced(red_row_board(), 1.0).unwrap();
    assert_close(result.total_win, 2.0);
    assert_eq!(result.cascade_depth(), 1);
    assert_eq!(result.scatter_count, 5);
    assert_eq!(&result.multipliers[..6], &[2, 2, 2, 2, 2, 1]);
    assert_eq!(result.bonus, BonusTransition::Entered { spins: 15 });
    assert_close(result.settled, 2.0);
    assert_close(session.balance(), 101.0);
    assert_eq!(session.round_layer().peak(), 2);
    assert!(session.bonus_layer().is_pristine());
}

#[test]
fn test_bonus_sequence_persists_layer_and_settles_at_exit() {
    let mut session = scripted_session(100.0);

    // Entry: 3 scatters, nothing pays
    let mut cells = quiet();
    for i in [10, 20, 30] {
        cells[i] = SCATTER;
    }
    let entry = session
        .spin_forced(Board::from_symbols(GridSpec::square_7x7(), cells).unwrap(), 1.0)
        .unwrap();
    assert_eq!(entry.bonus, BonusTransition::Entered { spins: 10 });
    assert_close(session.balance(), 99.0);
    assert!(session.in_bonus());

    // First bonus spin: cluster pays at ×1 and five scatters retrigger
    let first = session.spin_forced(red_row_board(), 1.0).unwrap();
    assert_eq!(first.mode, BonusMode::BonusActive);
    assert_close(first.total_win, 2.0);
    assert_eq!(
        first.bonus,
        BonusTransition::Retriggered { added: 15, remaining: 24 }
    );
    assert_close(first.settled, 0.0);
    assert_close(session.balance(), 99.0);

    // Bonus layer carries over: same cells now pay at ×2
    let second = session.spin_forced(red_row_board(), 1.0).unwrap();
    assert_eq!(second.steps[0].clusters[0].avg_multiplier, 2);
    assert_close(second.total_win, 4.0);
    assert_eq!(session.bonus_layer().peak(), 3);
    assert!(session.round_layer().is_pristine());
    let mut remaining = session.bonus_state().spins_remaining;
    assert_eq!(remaining, 38);

    // Bonus spins are free, whatever the balance
    while remaining > 1 {
        let spin = session.spin_forced(quiet_board(), 1000.0).unwrap();
        remaining -= 1;
        assert_eq!(spin.bonus, BonusTransition::Continued { remaining });
    }

    let last = session.spin_forced(quiet_board(), 1.0).unwrap();
    assert_eq!(last.bonus, BonusTransition::Exited { total_win: 6.0 });
    assert_close(last.settled, 6.0);
    assert_close(session.balance(), 105.0);
    assert!(!session.in_bonus());
    assert!(session.bonus_layer().is_pristine());

    let stats = session.stats();
    assert_eq!(stats.bonus_entries, 1);
    assert_eq!(stats.retriggers, 2);
    assert_eq!(stats.total_spins, 41);
    assert_close(stats.total_bet, 1.0);
}

#[test]
fn test_bonus_entry_resets_layer_after_previous_bonus() {
    let mut session = scripted_session(100.0);
    session.spin_forced(red_row_board(), 1.0).unwrap(); // enter, 15 spins
    session.spin_forced(red_row_board(), 1.0).unwrap(); // grows bonus layer, retriggers
    assert_eq!(session.bonus_layer().peak(), 2);

    while session.in_bonus() {
        session.spin_forced(quiet_board(), 1.0).unwrap();
    }
    assert!(session.bonus_layer().is_pristine());

    let reentry = session.spin_forced(red_row_board(), 1.0).unwrap();
    assert!(reentry.triggered_bonus());
    assert!(session.bonus_layer().is_pristine());
}

#[test]
fn test_failed_spin_leaves_session_untouched() {
    let mut session = scripted_session(10.0);
    let wrong = Board::from_symbols(GridSpec::new(3, 3), vec![1; 9]).unwrap();
    assert!(matches!(
        session.spin_forced(wrong, 1.0),
        Err(EngineError::Invariant(_))
    ));

    // Only scatters left to draw, and the deal cap forbids a third one
    assert!(matches!(session.spin(1.0), Err(EngineError::Config(_))));

    assert_close(session.balance(), 10.0);
    assert_eq!(session.stats().total_spins, 0);
    assert!(!session.in_bonus());
}

#[test]
fn test_config_files_load() {
    let config = EngineConfig::ladder_7x7();
    let json = config.to_json().unwrap();
    assert_eq!(EngineConfig::from_json(&json).unwrap(), config);

    let broken = json.replace("\"cap\": 4294967295", "\"cap\": 0");
    assert!(EngineConfig::from_json(&broken).is_err());
}

// ═══════════════════════════════════════════════════════════════════════════════
// SHARED SESSION
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_shared_session_serializes_spins() {
    let session = GameSession::with_seed(EngineConfig::default(), 10_000.0, 99).unwrap();
    let shared = SharedSession::new(session);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let shared = shared.clone();
            thread::spawn(move || {
                for _ in 0..10 {
                    shared.spin(1.0).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(shared.with(|s| s.stats().total_spins), 40);
}

#[test]
fn test_try_spin_rejects_running_round() {
    let shared = SharedSession::new(scripted_session(10.0));
    let contender = shared.clone();
    let result = shared.with(|_| contender.try_spin(1.0));
    assert_eq!(
        result.map(|_| ()),
        Err(EngineError::Session(SessionError::SpinInProgress))
    );
}
