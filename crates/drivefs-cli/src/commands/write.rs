use std::io::{self, Read};

use anyhow::{Context, Result};
use clap::Args as ClapArgs;
use tracing::instrument;

use super::{parent_and_name, try_lookup};
use crate::session::Session;

#[derive(ClapArgs)]
pub struct Args {
    /// File path (created if missing)
    pub path: String,

    /// Append to existing content instead of replacing it
    #[arg(short, long)]
    pub append: bool,
}

#[instrument(level = "info", name = "cmd::write", skip_all, fields(path = %args.path, append = args.append))]
pub fn execute(session: &Session, args: &Args) -> Result<()> {
    let mut input = Vec::new();
    io::stdin().read_to_end(&mut input).context("Failed to read stdin")?;

    let fs = session.fs();
    let node = match try_lookup(session, &args.path)? {
        Some(node) => node,
        None => {
            let (parent, name) = parent_and_name(session, &args.path)?;
            fs.create(&parent.id, &name)?
        }
    };

    let content = if args.append {
        let mut existing = fs.read_file(&node.id)?;
        existing.extend_from_slice(&input);
        existing
    } else {
        input
    };
    fs.write_file(&node.id, &content)?;
    session.save()
}
