mod batch;
mod cli;
mod config;
mod data;
mod error;
mod logging;
mod output;

use crate::cli::Cli;
use crate::error::Result;
use clap::Parser;
use tracing::{debug, info};

fn main() {
    if let Err(e) = run_app() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run_app() -> Result<()> {
    let cli = Cli::parse();
    logging::setup_logging(cli.verbose, cli.quiet, cli.log_file.clone())?;

    info!("crossfeed v{} starting up", env!("CARGO_PKG_VERSION"));
    debug!("full CLI arguments parsed: {:?}", &cli);

    let config = config::resolve(cli)?;
    let summary = batch::run(&config)?;

    // per-community failures are visible in the log and the status columns,
    // never in the exit code
    info!(
        scored = summary.scored,
        failed = summary.failed,
        rows = summary.rows,
        output = %config.output_path.display(),
        "run complete"
    );
    Ok(())
}
