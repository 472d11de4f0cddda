use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args as ClapArgs;

use drivefs_core::MemoryStore;

use crate::session::StoreOptions;

#[derive(ClapArgs, Clone)]
pub struct Args {
    /// Snapshot file to create (default: --store / DRIVEFS_STORE)
    pub path: Option<PathBuf>,

    /// Overwrite an existing snapshot
    #[arg(long)]
    pub force: bool,
}

pub fn execute(options: &StoreOptions, args: &Args) -> Result<()> {
    let Some(path) = args.path.as_ref().or(options.store.as_ref()) else {
        bail!("No snapshot path given. Pass a path or --store");
    };
    if path.exists() && !args.force {
        bail!("Store already exists: {} (use --force to overwrite)", path.display());
    }

    MemoryStore::new()
        .save_json(path)
        .with_context(|| format!("Failed to create store: {}", path.display()))?;

    println!("Created new store at: {}", path.display());
    Ok(())
}
