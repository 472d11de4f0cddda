use anyhow::Result;
use clap::Args as ClapArgs;
use tracing::instrument;

use drivefs_core::NodeId;

use crate::session::Session;

#[derive(ClapArgs)]
pub struct Args {
    /// Node ID
    pub id: String,
}

#[instrument(level = "info", name = "cmd::resolve", skip_all, fields(id = %args.id))]
pub fn execute(session: &Session, args: &Args) -> Result<()> {
    let path = session.fs().resolve_path(&NodeId::from(args.id.as_str()))?;
    println!("{path}");
    Ok(())
}
