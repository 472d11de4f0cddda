//! Info command - show metadata of one node.
//!
//! # Examples
//!
//! ```bash
//! drivefs info /reports/q1.pdf
//!
//! # Look a node up by ID instead of path
//! drivefs info --id 1a2b3c
//! ```

use anyhow::Result;
use chrono::SecondsFormat;
use clap::Args as ClapArgs;
use serde::Serialize;
use tracing::instrument;

use drivefs_core::NodeId;

use super::lookup;
use crate::output::{create_table, format_node_size};
use crate::session::Session;

#[derive(ClapArgs, Clone)]
pub struct Args {
    /// Path, or node ID with --id
    pub target: String,

    /// Treat TARGET as a node ID
    #[arg(long)]
    pub id: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// JSON output format for info command
#[derive(Serialize)]
struct NodeInfo {
    id: String,
    name: String,
    #[serde(rename = "type")]
    kind: &'static str,
    type_tag: String,
    size: u64,
    modified: Option<String>,
    parents: Vec<String>,
    /// `None` when the node has no single path (several parents, orphaned)
    path: Option<String>,
    link: Option<String>,
}

#[instrument(level = "info", name = "cmd::info", skip_all, fields(target = %args.target))]
pub fn execute(session: &Session, args: &Args) -> Result<()> {
    let node = if args.id {
        session.fs().info(&NodeId::from(args.target.as_str()))?
    } else {
        lookup(session, &args.target)?
    };
    let path = session
        .fs()
        .resolve_path(&node.id)
        .inspect_err(|e| tracing::debug!(error = %e, "Node has no unique path"))
        .ok()
        .map(|p| p.to_string());

    if args.json {
        let info = NodeInfo {
            id: node.id.to_string(),
            name: node.name.clone(),
            kind: node.kind.label(),
            type_tag: node.type_tag.clone(),
            size: node.size,
            modified: node.modified.map(|m| m.to_rfc3339_opts(SecondsFormat::Secs, true)),
            parents: node.parents.iter().map(ToString::to_string).collect(),
            path,
            link: node.web_view_link.clone(),
        };
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        let parents: Vec<String> = node.parents.iter().map(ToString::to_string).collect();
        let mut table = create_table();
        table.set_header(vec!["Property", "Value"]);
        table.add_row(vec!["ID", node.id.as_str()]);
        table.add_row(vec!["Name", node.name.as_str()]);
        table.add_row(vec!["Type", node.kind.label()]);
        table.add_row(vec!["Type Tag", node.type_tag.as_str()]);
        table.add_row(vec!["Size".to_string(), format_node_size(&node)]);
        table.add_row(vec![
            "Modified".to_string(),
            node.modified.map_or_else(|| "-".to_string(), |m| m.to_rfc3339_opts(SecondsFormat::Secs, true)),
        ]);
        table.add_row(vec!["Parents".to_string(), parents.join(", ")]);
        table.add_row(vec!["Path".to_string(), path.unwrap_or_else(|| "-".to_string())]);
        if let Some(link) = &node.web_view_link {
            table.add_row(vec!["Link", link.as_str()]);
        }
        println!("{table}");
    }

    Ok(())
}
