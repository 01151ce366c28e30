//! Accessor generation command

use super::util::{load_config, GlobalArgs};
use selector_migrate::*;

pub fn cmd_accessors(global: &GlobalArgs, selector: &str) -> Result<()> {
    let config = load_config(global)?;
    let added = generate_accessors(&config, selector)?;

    println!("{}", added.file.display());
    println!("+ {}", added.hook);
    println!("+ {}", added.getter);
    println!("✓ Exported from {}", added.index.display());
    Ok(())
}
