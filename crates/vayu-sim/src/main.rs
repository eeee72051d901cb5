use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use vayu_ai::{AiClient, AiConfig, OfflineModel};
use vayu_core::{Engine, EngineConfig};
use vayu_sim::{load_catalog, run_scenario, run_simulator, SimulatorConfig};

/// Vayu lifecycle simulator
#[derive(Debug, Parser)]
#[command(name = "vayu-sim", version, about = "Vayu intervention lifecycle simulator")]
struct Cli {
    /// Catalog file (.json, .yaml, .yml); the built-in demo catalog otherwise
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Engine configuration (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Drive random operations and check invariants after each one
    Simulate {
        /// Random seed for reproducibility
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Number of operations to simulate
        #[arg(long, default_value_t = 10_000)]
        operations: u64,

        /// Stop simulation on first violation
        #[arg(long)]
        stop_on_violation: bool,
    },
    /// Run the propose, approve, execute, close walkthrough
    Scenario {
        /// AI configuration (TOML)
        #[arg(long)]
        ai_config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let catalog = Arc::new(load_catalog(cli.catalog.as_deref()).context("loading catalog")?);
    let engine_config = match &cli.config {
        Some(path) => EngineConfig::load(path).context("loading engine config")?,
        None => EngineConfig::default(),
    };

    match cli.command {
        Command::Simulate {
            seed,
            operations,
            stop_on_violation,
        } => {
            println!("Running Vayu Simulator...");
            println!("Operations: {operations}");
            println!("Seed: {seed}");
            println!();

            let config = SimulatorConfig {
                seed,
                total_operations: operations,
                stop_on_first_violation: stop_on_violation,
                engine: engine_config,
                ..SimulatorConfig::default()
            };
            let report = run_simulator(config, catalog).context("setting up simulation")?;

            println!("{}", report.generate_text());

            std::process::exit(if report.passed() { 0 } else { 1 });
        }
        Command::Scenario { ai_config, json } => {
            let ai_config = match ai_config {
                Some(path) => AiConfig::load(path).context("loading AI config")?,
                None => AiConfig::default(),
            };
            let engine = Engine::new(engine_config, catalog);
            let client = AiClient::new(Arc::new(OfflineModel), ai_config);

            let report = run_scenario(&engine, &client, chrono::Utc::now()).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{report}");
            }
        }
    }

    Ok(())
}
