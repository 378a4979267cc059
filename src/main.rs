//! Thread Tutor - Entry Point
//!
//! `serve` runs the HTTP/WebSocket server, `run` drives one session headless
//! and prints its snapshots, `concepts` dumps the catalog.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;

use thread_tutor::catalog::ConceptCatalog;
use thread_tutor::core::config::ServerConfig;
use thread_tutor::core::error::Result;
use thread_tutor::core::types::{seeded_rng, ConceptId, Tick};
use thread_tutor::entity::ThreadState;
use thread_tutor::server;
use thread_tutor::simulation::{Session, Snapshot};

/// Thread Tutor - watch simulated threads run, block, wait and deadlock
#[derive(Parser, Debug)]
#[command(name = "thread-tutor")]
#[command(about = "Stream simulated thread lifecycles to a browser for multithreading lessons")]
struct Cli {
    /// TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP/WebSocket server (default)
    Serve(ServeArgs),
    /// Run one simulation without a timer and print every snapshot
    Run(RunArgs),
    /// Print the concept catalog as JSON
    Concepts,
}

#[derive(clap::Args, Debug, Default)]
struct ServeArgs {
    /// Listen address, e.g. 0.0.0.0:5000
    #[arg(long)]
    listen: Option<std::net::SocketAddr>,

    /// Milliseconds between ticks
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Base seed for reproducible sessions
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    /// Concept id to simulate
    #[arg(long)]
    concept: i64,

    /// Roster size (defaults to the configured default)
    #[arg(long)]
    threads: Option<u32>,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Stop after this many ticks even if threads are still alive
    #[arg(long, default_value_t = 500)]
    max_ticks: Tick,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Json)]
    format: Format,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Format {
    Json,
    Text,
}

/// Final line of a headless run
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RunSummary {
    concept_id: ConceptId,
    policy: String,
    threads: usize,
    ticks: Tick,
    complete: bool,
    deadlocked: bool,
    seed: u64,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ServerConfig::load(cli.config.as_deref())?;
    config.apply_env()?;

    // Logs go to stderr so `run --format json` stays machine readable
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_filter.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command.unwrap_or(Command::Serve(ServeArgs::default())) {
        Command::Serve(args) => run_server(config, args),
        Command::Run(args) => run_headless(&config, args),
        Command::Concepts => {
            let catalog = server::load_catalog(&config)?;
            println!("{}", serde_json::to_string_pretty(&catalog.list())?);
            Ok(())
        }
    }
}

fn run_server(mut config: ServerConfig, args: ServeArgs) -> Result<()> {
    if let Some(listen) = args.listen {
        config.listen_addr = listen;
    }
    if let Some(tick_ms) = args.tick_ms {
        config.tick_interval_ms = tick_ms;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    config.validate()?;

    let catalog = server::load_catalog(&config)?;
    tracing::info!(
        concepts = catalog.len(),
        tick_ms = config.tick_interval_ms,
        "Thread tutor starting..."
    );

    let rt = Runtime::new()?;
    rt.block_on(server::serve(&config, Arc::new(catalog)))
}

fn run_headless(config: &ServerConfig, args: RunArgs) -> Result<()> {
    let catalog = server::load_catalog(config)?;
    let concept_id = ConceptId(args.concept);
    let concept = catalog.get(concept_id);
    if concept.is_none() {
        tracing::warn!(%concept_id, "Concept not found - using default transition policy");
    }

    let seed = args.seed.or(config.seed).unwrap_or_else(rand::random);
    let threads = args
        .threads
        .filter(|n| *n > 0)
        .unwrap_or(config.default_threads)
        .min(config.max_threads) as usize;

    let mut session = Session::new(Some(concept_id), concept.as_ref(), threads, seeded_rng(seed));
    let mut last = session.snapshot();

    while session.is_running() && session.tick() < args.max_ticks {
        if let Some(snapshot) = session.step() {
            print_snapshot(&snapshot, args.format)?;
            last = snapshot;
        }
    }

    let summary = RunSummary {
        concept_id,
        policy: session.policy_kind().to_string(),
        threads,
        ticks: session.tick(),
        complete: session.is_complete(),
        deadlocked: last.is_deadlocked(),
        seed,
    };

    match args.format {
        Format::Json => println!("{}", serde_json::to_string(&summary)?),
        Format::Text => {
            println!();
            println!(
                "=== {} | {} threads | {} ticks | complete: {} | deadlocked: {} | seed {} ===",
                summary.policy,
                summary.threads,
                summary.ticks,
                summary.complete,
                summary.deadlocked,
                summary.seed
            );
        }
    }
    Ok(())
}

fn print_snapshot(snapshot: &Snapshot, format: Format) -> Result<()> {
    match format {
        Format::Json => println!("{}", serde_json::to_string(snapshot)?),
        Format::Text => {
            println!("--- Tick {} ---", snapshot.tick);
            for thread in &snapshot.threads {
                let role = thread
                    .role()
                    .map(|r| format!(" [{:?}]", r))
                    .unwrap_or_default();
                println!(
                    "  {:<10} {:<10} {:>5.1}%{}",
                    thread.name(),
                    state_label(thread.state()),
                    thread.progress(),
                    role
                );
            }
            if snapshot.is_deadlocked() {
                println!("  !! deadlock: every thread is BLOCKED");
            }
        }
    }
    Ok(())
}

fn state_label(state: ThreadState) -> &'static str {
    match state {
        ThreadState::New => "NEW",
        ThreadState::Runnable => "RUNNABLE",
        ThreadState::Blocked => "BLOCKED",
        ThreadState::Waiting => "WAITING",
        ThreadState::Terminated => "TERMINATED",
    }
}
