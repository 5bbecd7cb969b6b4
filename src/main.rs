use std::env;
use std::process;

use anyhow::{anyhow, Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use log::{info, warn, LevelFilter};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

use diag_collector::cli::Args;
use diag_collector::collectors::host::HostEnvironment;
use diag_collector::config::{load_config, CollectorConfig};
use diag_collector::constants::ENV_LOG_LEVEL;
use diag_collector::harness;
use diag_collector::privileges;

fn main() -> Result<()> {
    // Parse arguments
    let args = parse_args();

    // Initialize logging
    initialize_logging()?;

    info!("Starting diagnostic collection for '{}'", args.identifier);

    // Load configuration
    let config = load_config().context("Failed to load configuration")?;

    // Check privileges
    check_privileges()?;

    let result = run_collection(&args, &config)?;

    if result.all_succeeded() {
        info!("Collection complete: {} files", result.collected.len());
    } else {
        warn!(
            "Collection complete: {} files, {} failed collections",
            result.collected.len(),
            result.failures.len()
        );
    }

    Ok(())
}

/// Parse arguments, exiting with status 1 on invalid input.
///
/// `--help` and `--version` keep clap's own exit handling.
fn parse_args() -> Args {
    match Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            let _ = e.print();
            process::exit(1);
        }
    }
}

/// Initialize logging with the level named by `DIAG_COLLECTOR_LOG`
fn initialize_logging() -> Result<()> {
    let log_level = env::var(ENV_LOG_LEVEL)
        .ok()
        .and_then(|level| level.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Info);

    TermLogger::init(
        log_level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    ).context("Failed to initialize logger")?;
    Ok(())
}

fn check_privileges() -> Result<()> {
    if !privileges::is_elevated() {
        return Err(anyhow!(
            "Root privileges required. {}",
            privileges::get_elevation_instructions()
        ));
    }

    privileges::log_privilege_state();
    Ok(())
}

/// Run the collection and echo its summary to the terminal
fn run_collection(args: &Args, config: &CollectorConfig) -> Result<harness::RunResult> {
    let host = HostEnvironment::current();
    let result = harness::execute(&args.identifier, config, &host)?;

    println!("{}", result.summary_text);

    if let Some((path, size)) = &result.archive {
        println!("Archive: {} ({} bytes)", path.display(), size);
    }

    Ok(result)
}
