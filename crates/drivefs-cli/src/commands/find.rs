use anyhow::Result;
use clap::Args as ClapArgs;
use tracing::instrument;

use drivefs_core::{DriveError, OpContext};

use super::ls::EntryInfo;
use crate::output::{create_table, format_kind, format_node_size};
use crate::session::{Session, normalize_path};

#[derive(ClapArgs)]
pub struct Args {
    /// Path to resolve
    pub path: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Print only the IDs, one per line
    #[arg(long, conflicts_with = "json")]
    pub ids: bool,
}

/// Every node the path reaches. Duplicate names along the way multiply
/// the results; no match exits with the not-found code.
#[instrument(level = "info", name = "cmd::find", skip_all, fields(path = %args.path))]
pub fn execute(session: &Session, args: &Args) -> Result<()> {
    let path = normalize_path(&args.path);
    let found = session.fs().find_by_path(session.root(), &path)?;
    if found.is_empty() {
        return Err(DriveError::not_found(OpContext::new().with_path(&path)).into());
    }

    if args.json {
        let entries: Vec<EntryInfo> = found.iter().map(EntryInfo::from).collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else if args.ids {
        for node in &found {
            println!("{}", node.id);
        }
    } else {
        let mut table = create_table();
        table.set_header(vec!["ID", "Type", "Size", "Parents"]);
        for node in &found {
            let parents: Vec<String> = node.parents.iter().map(ToString::to_string).collect();
            table.add_row(vec![
                node.id.to_string(),
                format_kind(&node.kind).to_string(),
                format_node_size(node),
                parents.join(", "),
            ]);
        }
        println!("{table}");
    }
    Ok(())
}
