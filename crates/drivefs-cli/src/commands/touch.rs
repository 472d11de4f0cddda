use anyhow::Result;
use clap::Args as ClapArgs;
use tracing::instrument;

use super::{parent_and_name, try_lookup};
use crate::session::Session;

#[derive(ClapArgs)]
pub struct Args {
    /// File path to create
    pub path: String,
}

#[instrument(level = "info", name = "cmd::touch", skip_all, fields(path = %args.path))]
pub fn execute(session: &Session, args: &Args) -> Result<()> {
    if try_lookup(session, &args.path)?.is_some() {
        return Ok(());
    }
    let (parent, name) = parent_and_name(session, &args.path)?;
    session.fs().create(&parent.id, &name)?;
    session.save()
}
