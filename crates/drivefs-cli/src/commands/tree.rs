use anyhow::Result;
use clap::Args as ClapArgs;
use tracing::instrument;

use drivefs_core::{DriveError, DrivePath, NodeId, NodeRef};

use super::lookup;
use crate::output::decorated_name;
use crate::session::{Session, normalize_path};

#[derive(ClapArgs)]
pub struct Args {
    /// Starting path (default: root)
    #[arg(default_value = "/")]
    pub path: String,

    /// Maximum depth to display
    #[arg(short = 'd', long)]
    pub max_depth: Option<usize>,

    /// Print one path per line in walk order instead of a drawing
    #[arg(long)]
    pub flat: bool,
}

#[instrument(level = "info", name = "cmd::tree", skip_all, fields(path = %args.path))]
pub fn execute(session: &Session, args: &Args) -> Result<()> {
    let normalized = normalize_path(&args.path);
    let start = lookup(session, &normalized)?;

    if args.flat {
        return print_flat(session, &start.id, args.max_depth);
    }

    let name = if normalized == "/" { "." } else { normalized.as_str() };
    println!("{name}");
    if start.is_traversable() {
        print_tree_recursive(session, &start.id, "", 0, args.max_depth)?;
    }
    Ok(())
}

fn print_flat(session: &Session, start: &NodeId, max_depth: Option<usize>) -> Result<()> {
    session.fs().walk(start, |path: &DrivePath, node: &NodeRef| {
        if max_depth.is_none_or(|max| path.depth() <= max) {
            let marker = if node.is_container() && !path.is_root() { "/" } else { "" };
            println!("{path}{marker}");
        }
        Ok::<(), DriveError>(())
    })?;
    Ok(())
}

fn print_tree_recursive(
    session: &Session,
    id: &NodeId,
    prefix: &str,
    depth: usize,
    max_depth: Option<usize>,
) -> Result<()> {
    if let Some(max) = max_depth
        && depth >= max
    {
        return Ok(());
    }

    let children = session.fs().read_dir(id)?;
    let total = children.len();

    for (i, child) in children.iter().enumerate() {
        let is_last = i + 1 == total;
        let connector = if is_last { "└── " } else { "├── " };
        println!("{prefix}{connector}{}", decorated_name(child));

        if child.is_traversable() {
            let new_prefix = if is_last {
                format!("{prefix}    ")
            } else {
                format!("{prefix}│   ")
            };
            print_tree_recursive(session, &child.id, &new_prefix, depth + 1, max_depth)?;
        }
    }

    Ok(())
}
