//! ClusterForge headless simulator
//!
//! Usage:
//!   cf-sim run --spins 100000 --seed 7    - Batch spins, print session stats
//!   cf-sim spin --seed 7                  - Play one spin, print every board
//!   cf-sim config --preset ladder         - Print a preset as JSON

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use cf_cascade::{EngineConfig, EngineError, GameSession, SessionError};
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "cf-sim", about = "ClusterForge cascade simulator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a batch of spins and print session statistics
    Run {
        #[command(flatten)]
        session: SessionArgs,
        /// Number of spins
        #[arg(short = 'n', long, default_value_t = 10_000)]
        spins: u64,
    },
    /// Play a single spin and print each cascade step
    Spin {
        #[command(flatten)]
        session: SessionArgs,
    },
    /// Print a configuration as JSON
    Config {
        #[arg(long, value_enum, default_value_t = Preset::Candy)]
        preset: Preset,
    },
}

#[derive(Args)]
struct SessionArgs {
    /// Config file (.json, .yaml or .yml); overrides --preset
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Built-in preset
    #[arg(long, value_enum, default_value_t = Preset::Candy)]
    preset: Preset,
    /// RNG seed
    #[arg(short, long)]
    seed: Option<u64>,
    /// Bet per base spin
    #[arg(short, long, default_value_t = 1.0)]
    bet: f64,
    /// Starting balance
    #[arg(long, default_value_t = 1_000_000.0)]
    balance: f64,
    /// Weight tuning target (0.7 - 1.4)
    #[arg(long)]
    rtp_target: Option<f64>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Preset {
    /// Continuous payout, +1 growth capped at 128
    Candy,
    /// Threshold ladder, doubling growth
    Ladder,
}

impl Preset {
    fn config(self) -> EngineConfig {
        match self {
            Self::Candy => EngineConfig::candy_7x7(),
            Self::Ladder => EngineConfig::ladder_7x7(),
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { session, spins } => run_batch(&session, spins),
        Commands::Spin { session } => run_single(&session),
        Commands::Config { preset } => {
            let json = preset.config().to_json()?;
            println!("{json}");
            Ok(())
        }
    }
}

fn load_config(path: &Path) -> Result<EngineConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => EngineConfig::from_json(&text)?,
        Some("yaml" | "yml") => EngineConfig::from_yaml(&text)?,
        _ => bail!("Unsupported config format: {}", path.display()),
    };
    Ok(config)
}

fn build_session(args: &SessionArgs) -> Result<GameSession> {
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => args.preset.config(),
    };

    let mut session = match args.seed {
        Some(seed) => GameSession::with_seed(config, args.balance, seed)?,
        None => GameSession::new(config, args.balance)?,
    };
    if let Some(target) = args.rtp_target {
        session.tune_weights(target)?;
        log::info!("Weights tuned for target {target:.2}");
    }
    Ok(session)
}

fn run_batch(args: &SessionArgs, spins: u64) -> Result<()> {
    let mut session = build_session(args)?;
    log::info!("Running {spins} spins at bet {:.2}", args.bet);

    for _ in 0..spins {
        match session.spin(args.bet) {
            Ok(_) => {}
            Err(EngineError::Session(SessionError::InsufficientBalance { balance, .. })) => {
                log::warn!("Stopping early: balance {balance:.2}");
                break;
            }
            Err(e) => return Err(e).context("Spin failed"),
        }
    }

    // Let a running bonus finish so its winnings are settled
    while session.in_bonus() {
        session.spin(args.bet).context("Bonus spin failed")?;
    }

    let stats = session.stats();
    println!("{}", serde_json::to_string_pretty(stats)?);
    println!("RTP: {:.2}%  hit rate: {:.2}%", stats.rtp(), stats.hit_rate());
    println!("Balance: {:.2}", session.balance());
    Ok(())
}

fn run_single(args: &SessionArgs) -> Result<()> {
    let mut session = build_session(args)?;
    let symbols = session.config().symbols.clone();
    let result = session.spin(args.bet)?;

    println!("{} ({:?})", result.spin_id, result.mode);
    println!("{}\n", result.initial_board.render(&symbols));
    for (i, step) in result.steps.iter().enumerate() {
        println!(
            "step {}: {} clusters, win {:.2}",
            i + 1,
            step.clusters.len(),
            step.win
        );
        for cluster in &step.clusters {
            let name = symbols.get(cluster.symbol).map_or("?", |s| s.name.as_str());
            println!(
                "  {name} x{} @ avg {} -> {:.2}",
                cluster.size(),
                cluster.avg_multiplier,
                cluster.win
            );
        }
    }
    println!("\n{}\n", result.final_board.render(&symbols));
    println!(
        "total win {:.2}, {} scatters, bonus {:?}, balance {:.2}",
        result.total_win, result.scatter_count, result.bonus, result.balance
    );
    Ok(())
}
