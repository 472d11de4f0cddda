//! List command - list folder contents.
//!
//! # Examples
//!
//! ```bash
//! # List the root folder
//! drivefs ls
//!
//! # List with details
//! drivefs ls -l /documents
//!
//! # Output as JSON for scripting
//! drivefs ls --json / | jq '.entries[].name'
//! ```

use anyhow::Result;
use chrono::SecondsFormat;
use clap::Args as ClapArgs;
use serde::Serialize;
use tracing::instrument;

use drivefs_core::NodeRef;

use super::lookup;
use crate::output::{create_table, decorated_name, format_kind, format_node_size};
use crate::session::{Session, normalize_path};

#[derive(ClapArgs, Clone)]
pub struct Args {
    /// Folder path (default: root)
    #[arg(default_value = "/")]
    pub path: String,

    /// Show detailed information
    #[arg(short, long)]
    pub long: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// One entry per line (script-friendly)
    #[arg(short = '1')]
    pub one_per_line: bool,
}

/// JSON output format for ls command
#[derive(Serialize)]
struct LsOutput {
    path: String,
    entries: Vec<EntryInfo>,
}

#[derive(Serialize)]
pub(crate) struct EntryInfo {
    id: String,
    name: String,
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    modified: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    target: Option<String>,
}

impl From<&NodeRef> for EntryInfo {
    fn from(node: &NodeRef) -> Self {
        Self {
            id: node.id.to_string(),
            name: node.name.clone(),
            kind: node.kind.label(),
            size: node.is_directly_readable().then_some(node.size),
            modified: node.modified.map(|m| m.to_rfc3339_opts(SecondsFormat::Secs, true)),
            target: node.shortcut_target().map(ToString::to_string),
        }
    }
}

#[instrument(level = "info", name = "cmd::ls", skip_all, fields(path = %args.path))]
pub fn execute(session: &Session, args: &Args) -> Result<()> {
    let path = normalize_path(&args.path);
    let node = lookup(session, &path)?;

    let entries = if node.is_container() {
        // Drain the cursor in chunks, the way a directory reader would
        let dir = session.fs().open_dir(&node.id)?;
        let mut entries = Vec::with_capacity(dir.remaining());
        loop {
            let chunk = dir.read_entries(64);
            if chunk.is_empty() {
                break;
            }
            entries.extend(chunk);
        }
        entries
    } else {
        vec![node]
    };

    if args.json {
        let output = LsOutput {
            path,
            entries: entries.iter().map(EntryInfo::from).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if args.long {
        print_long_format(&entries);
    } else {
        print_short_format(&entries, args.one_per_line);
    }

    Ok(())
}

fn print_long_format(entries: &[NodeRef]) {
    let mut table = create_table();
    table.set_header(vec!["Type", "Size", "Modified", "ID", "Name"]);
    for node in entries {
        table.add_row(vec![
            format_kind(&node.kind).to_string(),
            format_node_size(node),
            node.modified
                .map_or_else(|| "-".to_string(), |m| m.format("%Y-%m-%d %H:%M").to_string()),
            node.id.to_string(),
            decorated_name(node),
        ]);
    }
    println!("{table}");
}

fn print_short_format(entries: &[NodeRef], one_per_line: bool) {
    let names: Vec<String> = entries.iter().map(decorated_name).collect();
    if names.is_empty() {
        return;
    }
    if one_per_line || names.len() > 10 {
        for name in names {
            println!("{name}");
        }
    } else {
        println!("{}", names.join("  "));
    }
}
