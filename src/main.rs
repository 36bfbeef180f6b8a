//! Command line front end for the gaze estimation geometry pipeline.

use anyhow::Result;
use clap::Parser;
use gaze_estimation::cli::{run, Cli};
use log::debug;

fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logger
    if cli.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    debug!("Running {:?}", cli.command);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run(&cli, &mut out)?;

    Ok(())
}
