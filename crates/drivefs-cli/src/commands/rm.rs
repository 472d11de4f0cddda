use anyhow::{Result, bail};
use clap::Args as ClapArgs;
use tracing::instrument;

use drivefs_core::{DriveError, OpContext};

use super::try_lookup;
use crate::session::{Session, normalize_path};

#[derive(ClapArgs)]
pub struct Args {
    /// Path to remove
    pub path: String,

    /// Remove folders and their contents recursively
    #[arg(short, long)]
    pub recursive: bool,

    /// Move to the trash instead of deleting
    #[arg(short, long)]
    pub trash: bool,

    /// Ignore nonexistent paths
    #[arg(short, long)]
    pub force: bool,
}

#[instrument(level = "info", name = "cmd::rm", skip_all, fields(path = %args.path, recursive = args.recursive))]
pub fn execute(session: &Session, args: &Args) -> Result<()> {
    let path = normalize_path(&args.path);

    let Some(node) = try_lookup(session, &path)? else {
        if args.force {
            return Ok(());
        }
        return Err(DriveError::not_found(OpContext::new().with_path(&path)).into());
    };
    if &node.id == session.root() {
        bail!("Refusing to remove the root folder");
    }

    if node.is_container() && args.recursive {
        session.fs().remove_all(&node.id, args.trash)?;
    } else {
        session.fs().remove(&node.id, args.trash)?;
    }
    session.save()
}
