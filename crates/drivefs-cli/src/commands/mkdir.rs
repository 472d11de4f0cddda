use anyhow::Result;
use clap::Args as ClapArgs;
use tracing::instrument;

use drivefs_core::{DriveError, OpContext};

use super::{parent_and_name, try_lookup};
use crate::session::{Session, normalize_path};

#[derive(ClapArgs)]
pub struct Args {
    /// Folder path to create
    pub path: String,

    /// Create parent folders as needed; an existing folder is not an error
    #[arg(short, long)]
    pub parents: bool,
}

#[instrument(level = "info", name = "cmd::mkdir", skip_all, fields(path = %args.path, parents = args.parents))]
pub fn execute(session: &Session, args: &Args) -> Result<()> {
    let path = normalize_path(&args.path);

    if args.parents {
        session.fs().mkdir_all(session.root(), &path)?;
    } else {
        // The store accepts duplicate names; refuse them here like mkdir(1)
        if let Some(existing) = try_lookup(session, &path)? {
            return Err(DriveError::already_exists(existing.name, 1, OpContext::new().with_path(&path)).into());
        }
        let (parent, name) = parent_and_name(session, &path)?;
        session.fs().mkdir(&parent.id, &name)?;
    }
    session.save()
}
