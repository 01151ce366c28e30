//! selector-migrate CLI
//!
//! Commands:
//!   migrate          - Move one selector to its replacement
//!   connectors       - Move connected props of every exported getter
//!   store-dispatch   - Point slice actions at the store facade
//!   relocate-import  - Import a name from another module
//!   accessors        - Generate hook and getter accessors
//!   schema           - Print the migrate.yaml schema

mod cli;

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("selector_migrate=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    init_tracing();

    let result = cli::run(cli::Cli::parse());

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(1)
        }
    }
}
