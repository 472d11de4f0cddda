use anyhow::Result;
use clap::Args as ClapArgs;
use tracing::instrument;

use drivefs_core::{DriveError, OpContext};

use super::{lookup, parent_and_name, try_lookup};
use crate::session::{Session, normalize_path};

#[derive(ClapArgs)]
pub struct Args {
    /// Source path
    pub source: String,

    /// Destination folder, or new path
    pub dest: String,
}

#[instrument(level = "info", name = "cmd::mv", skip_all, fields(source = %args.source, dest = %args.dest))]
pub fn execute(session: &Session, args: &Args) -> Result<()> {
    let fs = session.fs();
    let source = lookup(session, &args.source)?;
    let dest = normalize_path(&args.dest);

    match try_lookup(session, &dest)? {
        Some(folder) if folder.is_container() => {
            fs.move_to(&source.id, &folder.id)?;
        }
        Some(existing) => {
            return Err(DriveError::already_exists(existing.name, 1, OpContext::new().with_path(&dest)).into());
        }
        None => {
            let (parent, name) = parent_and_name(session, &dest)?;
            if source.parents != [parent.id.clone()] {
                fs.move_to(&source.id, &parent.id)?;
            }
            if name != source.name {
                fs.rename(&source.id, &name)?;
            }
        }
    }
    session.save()
}
