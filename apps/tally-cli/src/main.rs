//! # Tally Scenario Runner
//!
//! Prices a cart scenario and prints the totals report as JSON.
//!
//! ## Usage
//! ```bash
//! # Default configuration
//! cargo run -p tally-cli -- apps/tally-cli/scenarios/stacking.toml
//!
//! # Custom configuration
//! cargo run -p tally-cli -- scenario.toml --config tally.toml
//!
//! # Verbose engine tracing
//! RUST_LOG=tally_core=trace cargo run -p tally-cli -- scenario.toml
//! ```

mod config;
mod error;
mod scenario;

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::HostConfig;
use crate::error::{CliError, CliResult};
use crate::scenario::Scenario;

const USAGE: &str = "Usage: tally-cli <scenario.toml> [--config <config.toml>]";

/// Parsed command line.
#[derive(Debug, PartialEq)]
struct Args {
    scenario: PathBuf,
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    init_tracing();

    let args: Vec<String> = env::args().skip(1).collect();
    let args = match parse_args(&args) {
        Ok(Some(args)) => args,
        Ok(None) => {
            println!("Tally cart totals");
            println!();
            println!("{}", USAGE);
            println!();
            println!("Options:");
            println!("  -c, --config <PATH>  Config file (default: $TALLY_CONFIG)");
            println!("  -h, --help           Show this help message");
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(e.exit_code());
        }
    };

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Scenario failed");
            eprintln!("error: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

fn run(args: Args) -> CliResult<()> {
    let config = HostConfig::load(args.config)?;
    info!(
        removal_floor = %config.cart.removal_floor,
        rounding_decimals = config.cart.rounding_decimals,
        "Configuration loaded"
    );

    let cart = Scenario::from_file(&args.scenario)?.into_cart(config.cart)?;
    let totals = cart.perform_totals()?;
    let report = totals.to_report()?;

    info!(
        total = %report.total,
        savings = %report.savings,
        promotions = report.promotions.len(),
        "Totals computed"
    );

    let json = if config.output.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{}", json);

    Ok(())
}

/// Returns `None` when help was requested.
fn parse_args(args: &[String]) -> CliResult<Option<Args>> {
    let mut scenario = None;
    let mut config = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                let path = args
                    .get(i + 1)
                    .ok_or_else(|| CliError::Usage(format!("--config needs a path\n{}", USAGE)))?;
                config = Some(PathBuf::from(path));
                i += 1;
            }
            "--help" | "-h" => return Ok(None),
            other if other.starts_with('-') => {
                return Err(CliError::Usage(format!("Unknown option: {}\n{}", other, USAGE)));
            }
            other => {
                if scenario.is_some() {
                    return Err(CliError::Usage(format!("Only one scenario allowed\n{}", USAGE)));
                }
                scenario = Some(PathBuf::from(other));
            }
        }
        i += 1;
    }

    let scenario = scenario.ok_or_else(|| CliError::Usage(USAGE.to_string()))?;
    Ok(Some(Args { scenario, config }))
}

/// Installs the stderr subscriber so stdout stays pure JSON.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=tally_core=trace` - Per-promotion engine steps
/// - Default: warnings, plus info from the CLI
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,tally_cli=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
