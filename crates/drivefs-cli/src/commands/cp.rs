use anyhow::{Result, bail};
use clap::Args as ClapArgs;
use tracing::{info, instrument};

use drivefs_core::{DriveError, OpContext};

use super::{lookup, parent_and_name, try_lookup};
use crate::session::{Session, normalize_path};

#[derive(ClapArgs)]
pub struct Args {
    /// Source path
    pub source: String,

    /// Destination folder, or new path
    pub dest: String,

    /// Copy folders and their contents
    #[arg(short, long)]
    pub recursive: bool,
}

#[instrument(level = "info", name = "cmd::cp", skip_all, fields(source = %args.source, dest = %args.dest))]
pub fn execute(session: &Session, args: &Args) -> Result<()> {
    let fs = session.fs();
    let source = lookup(session, &args.source)?;
    if source.is_container() && !args.recursive {
        bail!("{} is a folder (use -r to copy it)", args.source);
    }
    let dest = normalize_path(&args.dest);

    let (parent, name) = match try_lookup(session, &dest)? {
        Some(folder) if folder.is_container() => (folder, source.name.clone()),
        Some(existing) => {
            return Err(DriveError::already_exists(existing.name, 1, OpContext::new().with_path(&dest)).into());
        }
        None => parent_and_name(session, &dest)?,
    };

    let copy = if source.is_container() {
        fs.copy_tree(&source.id, &parent.id, &name)?
    } else {
        fs.copy(&source.id, &parent.id, &name)?
    };
    info!(id = %copy.id, "Copied");
    session.save()
}
