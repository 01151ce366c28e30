//! Store action and import commands

use super::util::{load_config, load_project, print_report, GlobalArgs};
use selector_migrate::*;

pub fn cmd_store_dispatch(global: &GlobalArgs) -> Result<()> {
    let config = load_config(global)?;
    let mut project = load_project(&config)?;
    let tools = ProcessToolchain::from_config(&config);

    let passes = store_passes(&config);
    let report = Pipeline::new(&mut project, &tools, RunOptions::default()).run(&passes)?;
    print_report(&report);
    Ok(())
}

pub fn cmd_relocate_import(global: &GlobalArgs, name: &str, source: &str) -> Result<()> {
    if !util::is_identifier(name) {
        return Err(Error::Config(format!("'{}' is not an identifier", name)));
    }
    let config = load_config(global)?;
    let mut project = load_project(&config)?;
    let tools = ProcessToolchain::from_config(&config);

    let passes: Vec<Box<dyn Pass>> = vec![Box::new(RelocateImport {
        name: name.to_string(),
        module: source.to_string(),
    })];
    let report = Pipeline::new(&mut project, &tools, RunOptions::default()).run(&passes)?;
    print_report(&report);
    Ok(())
}
