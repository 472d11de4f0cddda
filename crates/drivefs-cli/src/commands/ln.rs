use anyhow::Result;
use clap::Args as ClapArgs;
use tracing::instrument;

use super::{lookup, parent_and_name};
use crate::session::Session;

#[derive(ClapArgs)]
pub struct Args {
    /// Node the shortcut points at
    pub target: String,

    /// Path of the new shortcut
    pub link: String,
}

#[instrument(level = "info", name = "cmd::ln", skip_all, fields(target = %args.target, link = %args.link))]
pub fn execute(session: &Session, args: &Args) -> Result<()> {
    let target = lookup(session, &args.target)?;
    let (parent, name) = parent_and_name(session, &args.link)?;
    session.fs().shortcut(&parent.id, &name, &target.id)?;
    session.save()
}
