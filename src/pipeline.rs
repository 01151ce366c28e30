//! Pipeline driver
//!
//! Runs an ordered list of passes over a [`Project`]: each pass traverses
//! every file once, touched files get their imports normalized and are
//! persisted, then the external formatter, type checker and git run over the
//! touched-file set.
//!
//! ```text
//! Unloaded -> Loaded -> Pass(1..n) -> Persisted -> Formatted [-> Checked -> Committed]
//! ```
//!
//! A run that touches nothing stops after the last pass. Errors abort the
//! remaining steps; passes already persisted stay on disk.

use crate::config::{MigrateConfig, MigrationParams};
use crate::error::{Error, Result};
use crate::imports::normalize_imports;
use crate::passes::{migration_passes, Pass};
use crate::project::Project;
use crate::tools::Toolchain;
use indexmap::IndexSet;
use std::path::PathBuf;

/// Where a run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Unloaded,
    Loaded,
    /// Number of passes completed
    Pass(usize),
    Persisted,
    Formatted,
    Checked,
    Committed,
}

/// What happens after the passes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Defer every flush to one save after the last pass
    pub transaction: bool,
    /// Run the type checker after formatting
    pub typecheck: bool,
    /// Commit touched files after a successful type check
    pub commit: bool,
    /// Message used for the commit and the manual-review prompt
    pub commit_message: String,
}

impl RunOptions {
    /// Options for one selector migration
    pub fn for_migration(params: &MigrationParams) -> Self {
        Self {
            transaction: params.transaction,
            typecheck: false,
            commit: false,
            commit_message: commit_message(&params.old_name, &params.new_name),
        }
    }
}

/// Outcome of one pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassReport {
    pub name: String,
    /// Rewrites applied across all files
    pub rewrites: usize,
    pub touched: Vec<PathBuf>,
}

/// Outcome of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub passes: Vec<PassReport>,
    /// Every file touched by any pass, in first-touch order
    pub touched: IndexSet<PathBuf>,
    pub stage: Stage,
}

impl RunReport {
    pub fn rewrites(&self) -> usize {
        self.passes.iter().map(|p| p.rewrites).sum()
    }

    pub fn formatted(&self) -> bool {
        self.stage >= Stage::Formatted
    }

    pub fn committed(&self) -> bool {
        self.stage == Stage::Committed
    }
}

/// `Customer lib migration: move <old> selectors to <new>`
pub fn commit_message(old_name: &str, new_name: &str) -> String {
    format!(
        "Customer lib migration: move {} selectors to {}",
        old_name, new_name
    )
}

/// Drives passes over a loaded project
pub struct Pipeline<'a> {
    project: &'a mut Project,
    tools: &'a dyn Toolchain,
    options: RunOptions,
}

impl<'a> Pipeline<'a> {
    pub fn new(project: &'a mut Project, tools: &'a dyn Toolchain, options: RunOptions) -> Self {
        Self {
            project,
            tools,
            options,
        }
    }

    /// Run one pass over every file. Touched files get their imports
    /// normalized; outside transaction mode the pass is saved in one batch
    /// once every file has been visited.
    pub fn run_pass(&mut self, pass: &dyn Pass) -> Result<PassReport> {
        tracing::info!("Running {}...", pass.name());
        let target = pass.import_target();
        let mut report = PassReport {
            name: pass.name().to_string(),
            rewrites: 0,
            touched: Vec::new(),
        };

        for file in self.project.files_mut() {
            let applied = pass.apply(file)?;
            if applied == 0 {
                continue;
            }
            report.rewrites += applied;
            report.touched.push(file.path().to_path_buf());

            if let Some(target) = &target {
                normalize_imports(file, &target.old_name, &target.imported, &target.module)?;
            }
        }

        if !self.options.transaction && !report.touched.is_empty() {
            self.project.save()?;
        }

        if report.touched.is_empty() {
            tracing::info!("{}: no occurrences found", pass.name());
        } else {
            tracing::info!(
                "{}: {} rewrites in {} files",
                pass.name(),
                report.rewrites,
                report.touched.len()
            );
        }
        Ok(report)
    }

    /// Run the passes in order, then persist, format, check and commit.
    pub fn run(mut self, passes: &[Box<dyn Pass>]) -> Result<RunReport> {
        let mut report = RunReport {
            passes: Vec::with_capacity(passes.len()),
            touched: IndexSet::new(),
            stage: Stage::Loaded,
        };

        for (idx, pass) in passes.iter().enumerate() {
            let pass_report = self.run_pass(pass.as_ref())?;
            report.touched.extend(pass_report.touched.iter().cloned());
            report.passes.push(pass_report);
            report.stage = Stage::Pass(idx + 1);
        }

        if report.touched.is_empty() {
            tracing::info!("No occurrences found, nothing to persist");
            return Ok(report);
        }

        if self.options.transaction {
            self.project.save()?;
        }
        report.stage = Stage::Persisted;

        let touched: Vec<PathBuf> = report.touched.iter().cloned().collect();
        self.tools.format(&touched)?;
        report.stage = Stage::Formatted;

        if self.options.typecheck {
            if !self.tools.typecheck()? {
                return Err(Error::TypeCheck {
                    commit_message: self.options.commit_message.clone(),
                });
            }
            report.stage = Stage::Checked;
        }

        if self.options.commit {
            let changes = self.tools.describe_changes()?;
            tracing::info!("Changes:\n{}", changes.trim_end());
            self.tools.commit(&touched, &self.options.commit_message)?;
            report.stage = Stage::Committed;
        }

        Ok(report)
    }
}

/// Migrate one selector across the project: validate the names, then run
/// every migration pass.
pub fn migrate(
    project: &mut Project,
    tools: &dyn Toolchain,
    params: &MigrationParams,
    config: &MigrateConfig,
    options: RunOptions,
) -> Result<RunReport> {
    params.validate()?;
    tracing::info!(
        "Migrating {} to {} from {}",
        params.old_name,
        params.new_name,
        params.module_specifier
    );
    let passes = migration_passes(params, config);
    Pipeline::new(project, tools, options).run(&passes)
}
