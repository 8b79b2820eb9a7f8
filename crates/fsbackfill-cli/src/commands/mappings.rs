//! Lists the registered collection mappings

use clap::Args;
use fsbackfill_core::{BfError, Registry};
use std::fmt::Write as _;
use std::process::ExitCode;

#[derive(Debug, Args)]
pub struct MappingsArgs {
    /// Show only this collection
    #[arg(long)]
    pub collection: Option<String>,
}

pub fn execute(args: MappingsArgs) -> anyhow::Result<ExitCode> {
    let registry = Registry::standard().map_err(BfError::from)?;
    if let Some(name) = &args.collection {
        if registry.get(name).is_none() {
            anyhow::bail!("no mapping registered for collection {name}");
        }
    }
    print!("{}", render_mappings(&registry, args.collection.as_deref()));
    Ok(ExitCode::SUCCESS)
}

pub fn render_mappings(registry: &Registry, only: Option<&str>) -> String {
    let mut out = String::new();
    for mapping in registry
        .iter()
        .filter(|m| only.map_or(true, |name| m.collection() == name))
    {
        let table = mapping.table();
        let _ = writeln!(
            out,
            "{} -> {} (conflict: {})",
            mapping.collection(),
            table.name,
            table.conflict_column
        );
        for column in &table.columns {
            let _ = writeln!(out, "  {:<20} {}", column.name, column.ty);
        }
    }
    out
}
