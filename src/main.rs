use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use swiss_pairing::config::AppConfig;
use swiss_pairing::models::{
    apply_round, EdgePair, GameResult, Player, RoundPairing, RoundResults, TournamentSnapshot,
};
use swiss_pairing::pairing::{find_connected_components, PairingEngine, RoundOutcome};
use swiss_pairing::storage::jsonl::JsonlWriter;
use swiss_pairing::storage::{
    load_json, FileStore, HistoryConsumer, SnapshotProvider, StorageConfig,
};

#[derive(Parser)]
#[command(name = "swiss-pairing")]
#[command(about = "Swiss-system tournament pairing engine")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: String,

    /// Data directory path (overrides the config file)
    #[arg(long)]
    data_dir: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pair one round from a snapshot file
    Pair {
        /// JSON snapshot: {"round": N, "players": [...]}
        #[arg(long)]
        snapshot: PathBuf,

        /// Pair this round instead of the snapshot's
        #[arg(long)]
        round: Option<u32>,

        /// Append the pairing to this JSONL file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Print the outcome as JSON instead of a board list
        #[arg(long)]
        json: bool,
    },

    /// Print the connected components of a JSON edge list
    Components {
        /// JSON array of vertex pairs, e.g. [[{"player":1},"bye"]]
        #[arg(long)]
        edges: PathBuf,
    },

    /// Run a self-contained tournament with a fixed result rule
    Simulate {
        /// Number of players
        #[arg(long, default_value = "10")]
        players: u32,

        /// Number of rounds
        #[arg(long, default_value = "5")]
        rounds: u32,

        /// Persist snapshots and journals under this tournament id
        #[arg(long)]
        tournament: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    let config = load_config(&cli.config)?;
    let data_dir = cli
        .data_dir
        .map(PathBuf::from)
        .unwrap_or_else(|| config.data_dir.clone());

    match cli.command {
        Commands::Pair {
            snapshot,
            round,
            output,
            json,
        } => {
            let snapshot: TournamentSnapshot = load_json(&snapshot)
                .with_context(|| format!("Failed to load snapshot {:?}", snapshot))?;
            let round = round.unwrap_or(snapshot.round);

            let engine = PairingEngine::new(config.pairing.clone());
            let outcome = engine.pair_round(&snapshot.players, round)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                print_outcome(&outcome);
            }

            if let (Some(path), RoundOutcome::Paired(pairing)) = (output, &outcome) {
                JsonlWriter::new(path.clone()).append(pairing)?;
                info!("Appended round {} pairing to {:?}", pairing.round, path);
            }
        }

        Commands::Components { edges } => {
            let edges: Vec<EdgePair> = load_json(&edges)
                .with_context(|| format!("Failed to load edge list {:?}", edges))?;
            let components = find_connected_components(&edges)?;

            println!("{} component(s)", components.len());
            for (i, component) in components.iter().enumerate() {
                let members: Vec<String> = component.iter().map(|v| v.to_string()).collect();
                println!("  {:>3}: {}", i + 1, members.join(" "));
            }
        }

        Commands::Simulate {
            players,
            rounds,
            tournament,
        } => {
            let mut pairing_config = config.pairing.clone();
            pairing_config.total_rounds = pairing_config.total_rounds.or(Some(rounds));
            let engine = PairingEngine::new(pairing_config);

            let field: Vec<Player> = (1..=players).map(Player::new).collect();
            let mut store = match tournament {
                Some(id) => {
                    let store = FileStore::open(
                        &StorageConfig::new(data_dir),
                        &id,
                        config.pairing.bye_points,
                    )?;
                    store.init(field.clone())?;
                    Some(store)
                }
                None => None,
            };

            let mut current = field;
            for round in 1..=rounds {
                let outcome = engine.pair_round(&current, round)?;
                println!("Round {}", round);
                print_outcome(&outcome);

                let RoundOutcome::Paired(pairing) = outcome else {
                    warn!("Simulation stopped before round {}", round);
                    break;
                };
                let results = simulated_results(&pairing);

                current = match store.as_mut() {
                    Some(store) => {
                        store.append_pairing(&pairing)?;
                        store.record_round(&pairing, &results)?.players
                    }
                    None => apply_round(&current, &pairing, &results, config.pairing.bye_points)?,
                };
            }

            if let Some(store) = &store {
                if let Some(last) = store.latest_round()? {
                    info!("Final standings stored as round {} snapshot", last);
                    current = store.snapshot(last)?.players;
                }
            }
            print_standings(&current);
        }
    }

    Ok(())
}

/// Load the config file, falling back to defaults when it does not exist.
fn load_config(path: &str) -> Result<AppConfig> {
    let path = PathBuf::from(path);
    if !path.exists() {
        info!("No config file at {:?}, using defaults", path);
        return Ok(AppConfig::default());
    }
    AppConfig::from_file(&path).with_context(|| format!("Failed to load config {:?}", path))
}

/// Deterministic results: the lower pairing number wins, every third board is drawn.
fn simulated_results(pairing: &RoundPairing) -> RoundResults {
    pairing
        .games
        .iter()
        .map(|game| {
            let result = if game.board % 3 == 0 {
                GameResult::Draw
            } else if game.white < game.black {
                GameResult::WhiteWins
            } else {
                GameResult::BlackWins
            };
            (game.board, result)
        })
        .collect()
}

fn print_outcome(outcome: &RoundOutcome) {
    match outcome {
        RoundOutcome::Paired(pairing) => {
            for game in &pairing.games {
                println!("  Board {:>3}: #{:<4} - #{}", game.board, game.white, game.black);
            }
            if let Some(pn) = pairing.bye {
                println!("  Bye:       #{}", pn);
            }
        }
        RoundOutcome::Infeasible(report) => {
            println!("  {}", report.summary());
            for component in &report.components {
                let members: Vec<String> = component.iter().map(|v| v.to_string()).collect();
                println!("    component: {}", members.join(" "));
            }
        }
    }
}

fn print_standings(players: &[Player]) {
    let mut ranked: Vec<&Player> = players.iter().collect();
    ranked.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then(a.pairing_number.cmp(&b.pairing_number))
    });

    println!("Standings");
    for (i, p) in ranked.iter().enumerate() {
        println!(
            "  {:>3}. #{:<4} {:>4}  colour {:+}  byes {}",
            i + 1,
            p.pairing_number,
            p.score,
            p.colour_index,
            p.bye_count
        );
    }
}
