//! CLI command implementations
//!
//! - `migrate`: selector migration and the connector sweep
//! - `store`: store action passes and import relocation
//! - `selectors`: accessor generation
//! - `config`: schema output
//! - `util`: shared loading and reporting helpers

pub mod config;
pub mod migrate;
pub mod selectors;
pub mod store;
pub mod util;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use config::cmd_schema;
pub use migrate::{cmd_connectors, cmd_migrate};
pub use selectors::cmd_accessors;
pub use store::{cmd_relocate_import, cmd_store_dispatch};

#[derive(Parser)]
#[command(
    name = "selector-migrate",
    about = "Migrate redux selectors to hook-based store accessors",
    version
)]
pub struct Cli {
    /// Config file (defaults to ./migrate.yaml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// tsconfig defining the working set, overrides the config file
    #[arg(long, global = true)]
    pub tsconfig: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Move one selector to its replacement across the project
    Migrate {
        /// Selector being retired
        #[arg(long)]
        old: String,
        /// Replacement getter
        #[arg(long)]
        new: String,
        /// Module the replacement is imported from
        #[arg(long)]
        module: String,
        /// Save once after the last pass instead of after every pass
        #[arg(long)]
        transaction: bool,
        /// Run the type checker after formatting
        #[arg(long)]
        check: bool,
        /// Commit the touched files
        #[arg(long)]
        commit: bool,
    },
    /// Move connected props of every exported getter onto the store HOC
    Connectors {
        /// Module the getters are imported from (defaults to store.module)
        #[arg(long)]
        module: Option<String>,
    },
    /// Point slice actions at the store facade
    StoreDispatch,
    /// Import a name from another module across the project
    RelocateImport {
        #[arg(long)]
        name: String,
        /// Module the name should be imported from
        #[arg(long)]
        source: String,
    },
    /// Generate hook and getter accessors for a selector
    Accessors {
        #[arg(long)]
        selector: String,
    },
    /// Print the JSON schema of migrate.yaml
    Schema,
}

/// Dispatch a parsed command line.
pub fn run(cli: Cli) -> selector_migrate::Result<()> {
    let global = util::GlobalArgs {
        config: cli.config,
        tsconfig: cli.tsconfig,
    };
    match cli.command {
        Command::Migrate {
            old,
            new,
            module,
            transaction,
            check,
            commit,
        } => cmd_migrate(
            &global,
            migrate::MigrateArgs {
                old,
                new,
                module,
                transaction,
                check,
                commit,
            },
        ),
        Command::Connectors { module } => cmd_connectors(&global, module),
        Command::StoreDispatch => cmd_store_dispatch(&global),
        Command::RelocateImport { name, source } => cmd_relocate_import(&global, &name, &source),
        Command::Accessors { selector } => cmd_accessors(&global, &selector),
        Command::Schema => cmd_schema(),
    }
}
