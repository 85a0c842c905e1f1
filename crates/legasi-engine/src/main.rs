//! Legasi scenario simulator
//!
//! ```text
//! legasi-sim [config.toml] scenario.json
//! ```
//!
//! Replays the scenario on a manual clock and prints the final state as JSON.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use legasi_engine::{EngineConfig, Scenario, ScenarioRunner, ENGINE_VERSION};

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    info!("Starting Legasi simulator v{}", ENGINE_VERSION);

    let args: Vec<PathBuf> = std::env::args_os().skip(1).map(PathBuf::from).collect();
    let (config_path, scenario_path) = match args.as_slice() {
        [scenario] => (None, scenario),
        [config, scenario] => (Some(config.as_path()), scenario),
        _ => bail!("usage: legasi-sim [config.toml] scenario.json"),
    };

    // Load configuration
    let config = EngineConfig::load(config_path)?;
    info!(
        collaterals = config.collateral.len(),
        borrowables = config.borrowable.len(),
        max_price_age_secs = config.risk.max_price_age_secs,
        "Loaded configuration"
    );

    let raw = std::fs::read_to_string(scenario_path)
        .with_context(|| format!("failed to read {}", scenario_path.display()))?;
    let scenario: Scenario = serde_json::from_str(&raw).context("invalid scenario")?;

    let runner = ScenarioRunner::new(config, scenario.start_time)?;
    let report = runner.run(&scenario);

    println!("{}", serde_json::to_string_pretty(&report)?);

    let failures = report.failures().count();
    if failures > 0 {
        info!(failures, "Scenario finished with failed steps");
    }
    Ok(())
}
