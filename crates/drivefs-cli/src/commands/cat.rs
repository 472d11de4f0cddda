use std::io::{self, Write};

use anyhow::Result;
use clap::Args as ClapArgs;
use tracing::instrument;

use crate::session::{Session, normalize_path};

#[derive(ClapArgs)]
pub struct Args {
    /// File path
    pub file: String,
}

#[instrument(level = "info", name = "cmd::cat", skip_all, fields(file = %args.file))]
pub fn execute(session: &Session, args: &Args) -> Result<()> {
    let path = normalize_path(&args.file);
    let content = session.fs().read_file_at(session.root(), &path)?;
    io::stdout().write_all(&content)?;
    Ok(())
}
