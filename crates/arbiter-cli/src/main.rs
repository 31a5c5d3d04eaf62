//! Arbiter CLI - runs deadlock avoidance and recovery scenarios

use anyhow::Context;
use arbiter_core::{Arbiter, ArbiterConfig, RequestMode};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "arbiter")]
#[command(about = "Arbiter - Banker's algorithm and wait-for graph deadlock simulator")]
struct Cli {
    /// JSON configuration file (defaults apply when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Run one of the canonical scenarios and print the resulting state.
    ///
    /// Each scenario fixes its own resource capacities; the configured
    /// capacities are replaced, everything else in the config applies.
    Scenario {
        /// Which scenario to run
        #[arg(value_enum)]
        name: Scenario,
    },
    /// Build a deadlock, wait for the monitor to report it, then recover.
    ///
    /// Runs on two single-unit resources regardless of configured capacities.
    Watch {
        /// Victim to terminate once the deadlock is reported
        #[arg(short, long, default_value = "P1")]
        victim: String,

        /// Give up after this many seconds without an alert
        #[arg(short, long, default_value_t = 30)]
        timeout: u64,
    },
    /// Print the effective configuration
    Config,
}

#[derive(Clone, Copy, ValueEnum)]
enum Scenario {
    /// Classic five-process safe state
    Safe,
    /// Two processes in mutual hold-and-wait
    Deadlock,
    /// A queued request granted on release
    Retry,
    /// Deadlock broken by terminating a process
    Recovery,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Some(Commands::Scenario { name }) => run_scenario(config, name)?,
        Some(Commands::Watch { victim, timeout }) => watch(config, &victim, timeout).await?,
        Some(Commands::Config) => println!("{}", serde_json::to_string_pretty(&config)?),
        None => {
            println!("Arbiter v{} - Use --help for commands", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> anyhow::Result<ArbiterConfig> {
    let Some(path) = path else {
        return Ok(ArbiterConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config = ArbiterConfig::from_json(&raw)
        .with_context(|| format!("loading config {}", path.display()))?;
    info!("Loaded config from {}", path.display());
    Ok(config)
}

/// Replaces the configured capacities with the ones a scenario is built on.
fn with_capacities(mut config: ArbiterConfig, capacities: &[u32]) -> ArbiterConfig {
    if config.ledger.capacities != capacities {
        info!(
            configured = ?config.ledger.capacities,
            used = ?capacities,
            "Scenario overrides configured capacities"
        );
        config.ledger.capacities = capacities.to_vec();
    }
    config
}

/// Two processes, two single-unit resources, each holding what the other wants.
fn mutual_wait(config: ArbiterConfig) -> anyhow::Result<Arbiter> {
    let arbiter = Arbiter::new(with_capacities(config, &[1, 1]))?;
    arbiter.create_process("P0", &[1, 1], 0)?;
    arbiter.create_process("P1", &[1, 1], 0)?;
    let steps: [(&str, [u32; 2]); 4] = [("P0", [1, 0]), ("P1", [0, 1]), ("P0", [0, 1]), ("P1", [1, 0])];
    for (pid, request) in steps {
        let outcome = arbiter.request_with_mode(pid, &request, RequestMode::Immediate)?;
        println!("{pid} requests {request:?}: {outcome:?}");
    }
    Ok(arbiter)
}

fn run_scenario(config: ArbiterConfig, scenario: Scenario) -> anyhow::Result<()> {
    match scenario {
        Scenario::Safe => {
            let arbiter = Arbiter::new(with_capacities(config, &[10, 5, 7]))?;
            let setup: [(&str, [u32; 3], [u32; 3]); 5] = [
                ("P0", [7, 5, 3], [0, 1, 0]),
                ("P1", [3, 2, 2], [2, 0, 0]),
                ("P2", [9, 0, 2], [3, 0, 2]),
                ("P3", [2, 2, 2], [2, 1, 1]),
                ("P4", [4, 3, 3], [0, 0, 2]),
            ];
            for (pid, maximum, allocation) in setup {
                arbiter.create_process(pid, &maximum, 0)?;
                arbiter.request(pid, &allocation)?;
            }
            let report = arbiter.safety();
            println!("safe: {}, order: {:?}", report.safe, report.order);
            println!("{}", serde_json::to_string_pretty(&arbiter.snapshot())?);
        }
        Scenario::Deadlock => {
            let arbiter = mutual_wait(config)?;
            let report = arbiter.wait_for_graph()?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Scenario::Retry => {
            let arbiter = Arbiter::new(with_capacities(config, &[1]))?;
            arbiter.create_process("P0", &[1], 0)?;
            arbiter.create_process("P1", &[1], 0)?;
            println!("P0 requests [1]: {:?}", arbiter.request("P0", &[1])?);
            println!("P1 requests [1]: {:?}", arbiter.request("P1", &[1])?);
            let granted = arbiter.release("P0", &[1])?;
            println!("P0 releases [1], granted from queue: {granted:?}");
            println!("{}", serde_json::to_string_pretty(&arbiter.snapshot())?);
        }
        Scenario::Recovery => {
            let arbiter = mutual_wait(config)?;
            println!("deadlocked: {}", arbiter.wait_for_graph()?.is_deadlocked());
            arbiter.terminate("P1")?;
            println!("after terminating P1: {}", arbiter.wait_for_graph()?.is_deadlocked());
        }
    }
    Ok(())
}

async fn watch(config: ArbiterConfig, victim: &str, timeout: u64) -> anyhow::Result<()> {
    let mut arbiter = mutual_wait(config)?;
    let mut alerts = arbiter.start_monitor()?;

    let alert = tokio::time::timeout(Duration::from_secs(timeout), alerts.recv())
        .await
        .context("no deadlock reported before timeout")?
        .context("monitor stopped unexpectedly")?;
    for cycle in &alert.cycles {
        println!("Deadlock detected: {:?}", cycle.pids());
    }

    arbiter.terminate(victim)?;
    println!(
        "Terminated {victim}; deadlocked: {}",
        arbiter.wait_for_graph()?.is_deadlocked()
    );

    arbiter.stop_monitor().await?;
    Ok(())
}
