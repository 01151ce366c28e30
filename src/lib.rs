// Production-quality lints
#![warn(
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
// Deny truly dangerous patterns
#![deny(clippy::mem_forget)]
// Allow common patterns in library code
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! # selector-migrate
//!
//! Codemod passes that move a TypeScript/JavaScript codebase off redux-style
//! selectors and onto hook-based store accessors.
//!
//! ## Core Concept
//!
//! A **pass** pairs one pattern matcher with one rewrite action. The
//! [`Pipeline`] runs an ordered list of passes over a [`Project`] loaded from
//! a `tsconfig.json`, one full traversal per pass, and then:
//!
//! - normalizes the imports of every touched file
//! - persists the touched files (once at the end in transaction mode)
//! - runs the external formatter over exactly the touched files
//! - optionally type checks and commits them
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use selector_migrate::{migrate, MigrateConfig, MigrationParams, Project, ProcessToolchain, RunOptions};
//!
//! let config = MigrateConfig::discover(None, std::path::Path::new("."))?;
//! let mut project = Project::load(&config.tsconfig)?;
//! let tools = ProcessToolchain::from_config(&config);
//!
//! let params = MigrationParams::new("getCustomerDealer", "getCustomerDealer", "@acme/customer");
//! let report = migrate(&mut project, &tools, &params, &config, RunOptions::for_migration(&params))?;
//! println!("{} rewrites in {} files", report.rewrites(), report.touched.len());
//! ```
//!
//! ## Rewrites
//!
//! | Before | After |
//! |--------|-------|
//! | `getFoo(state)` | `getFoo()` |
//! | `useSelector(getFoo)` | `useFoo()` |
//! | `useOnceFromReduxState(getFoo)` | `useOnce(useFoo())` |
//! | `yield select(getFoo)` | `yield getFoo()` |
//! | `connect(s => ({ foo: getFoo() }))` | `connector(withZustandStore({ foo: useFoo }, C))` |
//! | `store.dispatch(slice.actions.x(a))` | `Facade.actions.x(a)` |
//!
//! Matching compares raw source text: aliased imports and equivalent but
//! differently spelled expressions are not recognized.

// Core types
pub mod config;
pub mod error;
pub mod project;
pub mod syntax;
pub mod tsconfig;
pub mod util;

// Matching and rewriting
pub mod imports;
pub mod matchers;
pub mod passes;
pub mod rewrite;

// Running
pub mod pipeline;
pub mod selectors;
pub mod tools;

pub use config::{MigrateConfig, MigrationParams, SelectorsConfig, StoreConfig, ToolCommand};
pub use error::{Error, Result};
pub use passes::{
    connector_passes, migration_passes, store_passes, ImportTarget, Pass, RelocateImport,
};
pub use pipeline::{commit_message, migrate, PassReport, Pipeline, RunOptions, RunReport, Stage};
pub use project::Project;
pub use selectors::{exported_getters, generate_accessors, Accessors, Getter};
pub use syntax::{Dialect, Edit, SourceFile};
pub use tools::{ProcessToolchain, Toolchain};

/// Version of selector-migrate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
