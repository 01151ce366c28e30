//! Selector migration commands

use super::util::{load_config, load_project, print_report, GlobalArgs};
use selector_migrate::*;

/// Arguments of `migrate`
#[derive(Debug)]
pub struct MigrateArgs {
    pub old: String,
    pub new: String,
    pub module: String,
    pub transaction: bool,
    pub check: bool,
    pub commit: bool,
}

pub fn cmd_migrate(global: &GlobalArgs, args: MigrateArgs) -> Result<()> {
    let params =
        MigrationParams::new(&args.old, &args.new, &args.module).with_transaction(args.transaction);
    // Fail on bad names before loading anything.
    params.validate()?;

    let config = load_config(global)?;
    let mut project = load_project(&config)?;
    let tools = ProcessToolchain::from_config(&config);

    let options = RunOptions {
        typecheck: args.check,
        commit: args.commit,
        ..RunOptions::for_migration(&params)
    };
    let report = migrate(&mut project, &tools, &params, &config, options)?;
    print_report(&report);
    Ok(())
}

pub fn cmd_connectors(global: &GlobalArgs, module: Option<String>) -> Result<()> {
    let config = load_config(global)?;
    let dir = config
        .selectors
        .dir
        .clone()
        .ok_or_else(|| Error::Config("selectors.dir is not set".into()))?;
    let module = module.unwrap_or_else(|| config.store.module.clone());

    let getters: Vec<String> = exported_getters(&dir)?
        .into_iter()
        .map(|g| g.name)
        .collect();
    if getters.is_empty() {
        println!("No exported getters found in {}", dir.display());
        return Ok(());
    }
    for getter in &getters {
        println!("Updating connector for getter: {}", getter);
    }

    let mut project = load_project(&config)?;
    let tools = ProcessToolchain::from_config(&config);
    let passes = connector_passes(&getters, &module, &config);
    let report = Pipeline::new(&mut project, &tools, RunOptions::default()).run(&passes)?;
    print_report(&report);
    Ok(())
}
