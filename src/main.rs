mod cli;
mod monitor;
mod utils;

use clap::Parser;
use cli::Cli;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn init_logging(verbose: u8) -> anyhow::Result<()> {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    // RUST_LOG wins when set; -v only moves the default
    let filter = match std::env::var("RUST_LOG") {
        Ok(directives) if !directives.is_empty() => EnvFilter::try_new(directives)?,
        _ => EnvFilter::try_new(level)?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))?;
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose) {
        eprintln!("Error: cannot set up logging: {}", e);
        std::process::exit(1);
    }
    debug!(?cli, "parsed arguments");

    if let Err(e) = monitor::run_monitor(&cli.monitor_config()) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
