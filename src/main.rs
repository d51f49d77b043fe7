use anyhow::{Context, Result};
use clap::Parser;
use orchard_claimer::cli::Cli;
use orchard_claimer::config::{AppConfig, LoggingConfig};
use orchard_claimer::contracts::CLAIM_DISTRIBUTIONS_SIGNATURE;
use orchard_claimer::runner::{self, RunOutcome};
use std::fmt::Write;
use std::path::Path;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load_from(&cli.config_dir).with_context(|| {
        format!("failed to load config from {}", cli.config_dir.display())
    })?;
    init_logging(&config.logging);

    info!("Claims creation now running for chain {}", cli.chain_id);

    let outcome = runner::run(&config, &cli)
        .await
        .inspect_err(|e| error!("Claim run failed: {}", e))
        .with_context(|| format!("claim run for {} on chain {}", cli.account, cli.chain_id))?;

    print!("{}", render_outcome(&outcome, &cli.output)?);
    Ok(())
}

/// Stdout report for a finished run
fn render_outcome(outcome: &RunOutcome, output: &Path) -> Result<String> {
    let mut out = String::new();
    match outcome {
        RunOutcome::NoPendingClaims => {
            writeln!(out, "No pending claims! Nothing to submit.")?;
        }
        RunOutcome::Claims {
            orchard,
            arguments,
            calldata,
        } => {
            writeln!(out, "Pending claims written to {}", output.display())?;
            writeln!(out, "Merkle Orchard address: {}", orchard)?;
            writeln!(out, "Method to call: {}", CLAIM_DISTRIBUTIONS_SIGNATURE)?;
            writeln!(out, "Calldata: {}", calldata)?;
            let json = serde_json::to_string_pretty(arguments)
                .context("failed to serialize claim arguments")?;
            writeln!(out, "Arguments: {}", json)?;
        }
    }
    Ok(out)
}

fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("{},orchard_claimer=debug", logging.level))
    });

    // Logs go to stderr so stdout carries only the claim payload
    if logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .init();
    }
}
