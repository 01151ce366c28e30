//! External collaborators: formatter, type checker and git
//!
//! The pipeline only talks to them through [`Toolchain`], so tests swap in a
//! recording implementation.

use crate::config::{MigrateConfig, ToolCommand};
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

/// Blocking external tools the pipeline calls after persisting
pub trait Toolchain {
    /// Format exactly `files`.
    fn format(&self, files: &[PathBuf]) -> Result<()>;

    /// Type check the project. `Ok(false)` means the check ran and failed.
    fn typecheck(&self) -> Result<bool>;

    /// Short description of pending changes (`git status --porcelain`).
    fn describe_changes(&self) -> Result<String>;

    /// Stage `files` and commit them with `message`.
    fn commit(&self, files: &[PathBuf], message: &str) -> Result<()>;
}

/// Runs the configured commands as subprocesses in the working directory
#[derive(Debug, Clone)]
pub struct ProcessToolchain {
    workdir: PathBuf,
    formatter: ToolCommand,
    typecheck: ToolCommand,
}

impl ProcessToolchain {
    pub fn new(workdir: impl Into<PathBuf>, formatter: ToolCommand, typecheck: ToolCommand) -> Self {
        Self {
            workdir: workdir.into(),
            formatter,
            typecheck,
        }
    }

    pub fn from_config(config: &MigrateConfig) -> Self {
        Self::new(
            config.workdir.clone(),
            config.formatter.clone(),
            config.typecheck.clone(),
        )
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn run(&self, program: &str, args: &[String]) -> Result<Output> {
        tracing::debug!(program, ?args, "Running");
        Command::new(program)
            .args(args)
            .current_dir(&self.workdir)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| Error::Tool {
                tool: program.to_string(),
                message: format!("Failed to spawn: {}", e),
            })
    }

    fn run_checked(&self, program: &str, args: &[String]) -> Result<Output> {
        let output = self.run(program, args)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Tool {
                tool: program.to_string(),
                message: format!("{} {}: {}", output.status, args.join(" "), stderr.trim()),
            });
        }
        Ok(output)
    }
}

impl Toolchain for ProcessToolchain {
    fn format(&self, files: &[PathBuf]) -> Result<()> {
        tracing::info!("Formatting: {}", self.formatter.display(files));
        self.run_checked(&self.formatter.program, &self.formatter.args_for(files))?;
        Ok(())
    }

    fn typecheck(&self) -> Result<bool> {
        tracing::info!("Type checking: {}", self.typecheck.display(&[]));
        let output = self.run(&self.typecheck.program, &self.typecheck.args_for(&[]))?;
        if !output.status.success() {
            tracing::warn!(
                "Type check failed:\n{}",
                String::from_utf8_lossy(&output.stdout).trim_end()
            );
        }
        Ok(output.status.success())
    }

    fn describe_changes(&self) -> Result<String> {
        let output = self.run_checked("git", &["status".to_string(), "--porcelain".to_string()])?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn commit(&self, files: &[PathBuf], message: &str) -> Result<()> {
        let mut add = vec!["add".to_string(), "--".to_string()];
        add.extend(files.iter().map(|f| f.display().to_string()));
        self.run_checked("git", &add)?;
        self.run_checked(
            "git",
            &["commit".to_string(), "-m".to_string(), message.to_string()],
        )?;
        tracing::info!("Committed: {}", message);
        Ok(())
    }
}
