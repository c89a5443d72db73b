//! passcc CLI
//!
//! Drop-in `cc` replacement: `CC=passcc make`. The command line belongs to
//! clang, so the driver defines no flags of its own; it is configured
//! through `PASSCC_CONFIG` and the other `PASSCC_*` variables instead.
//!
//! Stdout is left to the tools. Logs go to stderr, filtered by `PASSCC_LOG`.

use passcc::{DriverConfig, DriverError, LOG_ENV, ProcessInvoker, USAGE};
use std::env;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    let argv: Vec<String> = env::args().skip(1).collect();

    if argv.is_empty() {
        println!("{}", USAGE);
        return;
    }

    init_logging();

    if let Err(e) = drive(&argv) {
        if !e.is_reported_by_tool() {
            eprintln!("passcc: error: {}", e);
        }
        process::exit(e.exit_code());
    }
}

fn drive(argv: &[String]) -> Result<(), DriverError> {
    let config = DriverConfig::load()?;
    passcc::run(argv, &config, ProcessInvoker)?;
    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
