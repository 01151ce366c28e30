//! CLI utility helpers

use selector_migrate::{Error, MigrateConfig, Project, RunReport, Result};
use std::path::PathBuf;

/// Options shared by every command
#[derive(Debug, Default)]
pub struct GlobalArgs {
    pub config: Option<PathBuf>,
    pub tsconfig: Option<PathBuf>,
}

/// Load the config, applying command line overrides.
pub fn load_config(global: &GlobalArgs) -> Result<MigrateConfig> {
    let cwd = std::env::current_dir().map_err(Error::Io)?;
    let mut config = MigrateConfig::discover(global.config.as_deref(), &cwd)?;
    if let Some(tsconfig) = &global.tsconfig {
        config.tsconfig = tsconfig.clone();
    }
    Ok(config)
}

/// Load the project working set named by the config.
pub fn load_project(config: &MigrateConfig) -> Result<Project> {
    Project::load(&config.tsconfig)
}

/// Print a run summary.
pub fn print_report(report: &RunReport) {
    for pass in &report.passes {
        if pass.touched.is_empty() {
            continue;
        }
        println!(
            "  {}: {} rewrites in {} files",
            pass.name,
            pass.rewrites,
            pass.touched.len()
        );
    }

    if report.touched.is_empty() {
        println!("No occurrences found. No updates made");
        return;
    }
    for path in &report.touched {
        println!("  {}", path.display());
    }
    println!(
        "✓ {} rewrites in {} files{}{}",
        report.rewrites(),
        report.touched.len(),
        if report.formatted() { ", formatted" } else { "" },
        if report.committed() { ", committed" } else { "" }
    );
}
