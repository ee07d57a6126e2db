//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `dane_check` library that handles:
//! - Command-line argument parsing
//! - Logger initialization
//! - Printing the status line and exiting with the plugin exit code
//!
//! Setup failures are reported as `UNKNOWN`, like any other failure to decide.
//!
//! All core functionality is implemented in the library crate.

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use std::process;

use dane_check::config::{usage_error_message, Opt};
use dane_check::initialization::init_logger_with;
use dane_check::{run, Config, Verdict};

fn finish(verdict: &Verdict) -> ! {
    println!("{verdict}");
    process::exit(verdict.exit_code());
}

fn init_logging(config: &Config) -> Result<()> {
    init_logger_with(config.log_level.into(), config.log_format)
        .context("Failed to initialize logger")?;
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let opt = match Opt::try_parse() {
        Ok(opt) => opt,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => finish(&Verdict::unknown(usage_error_message(&e))),
    };
    let config: Config = opt.into();

    if let Err(e) = init_logging(&config) {
        finish(&Verdict::unknown(format!("{e:#}")));
    }

    let verdict = run(&config).await;
    finish(&verdict);
}
