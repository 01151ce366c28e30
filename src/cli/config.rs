//! Config schema command

use selector_migrate::*;

pub fn cmd_schema() -> Result<()> {
    print_schema::<MigrateConfig>()
}

fn print_schema<T: schemars::JsonSchema>() -> Result<()> {
    let schema = schemars::schema_for!(T);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
