//! Land Registry Node
//!
//! Replays a scenario against an in-memory land registry and prints the
//! resulting report as JSON. Committed events are logged as they are
//! delivered.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use land_registry::prelude::*;
use land_registry_node::scenario::{replay, Scenario};
use land_registry_node::telemetry::init_tracing;

/// Land title ledger host.
#[derive(Parser, Debug)]
#[command(name = "land-registry-node")]
#[command(version = land_registry::VERSION)]
#[command(about = "Replay land registry scenarios against an in-memory ledger")]
struct Args {
    /// Emit JSON formatted logs (overrides LR_JSON_LOGS)
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a scenario file
    Replay {
        /// Path to the scenario JSON
        path: PathBuf,

        /// Account whose incoming payments fail (repeatable)
        #[arg(long = "reject", value_name = "NAME")]
        reject: Vec<String>,

        /// Pretty-print the report
        #[arg(long)]
        pretty: bool,

        /// Exit with an error if any step failed
        #[arg(long)]
        strict: bool,
    },
    /// Replay the built-in walk-through
    Demo {
        /// Pretty-print the report
        #[arg(long)]
        pretty: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ServiceConfig::from_env();
    config.json_logs |= args.json_logs;
    init_tracing(&config)?;

    let (scenario, pretty, strict) = match args.command {
        Command::Replay {
            path,
            reject,
            pretty,
            strict,
        } => {
            let mut scenario = Scenario::load(&path)?;
            scenario.reject.extend(reject);
            (scenario, pretty, strict)
        }
        Command::Demo { pretty } => (Scenario::demo(), pretty, false),
    };

    info!(
        steps = scenario.steps.len(),
        version = land_registry::VERSION,
        "Replaying scenario"
    );
    let service = create_in_memory_service_with_events(config, Arc::new(TracingEventSink));
    let report = replay(&service, &scenario).await;

    let output = if pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{output}");

    let failed = report.outcomes.iter().filter(|o| !o.is_ok()).count();
    info!(failed, parcels = report.parcels.len(), "Replay finished");
    if strict && failed > 0 {
        bail!("{failed} step(s) failed");
    }
    Ok(())
}
