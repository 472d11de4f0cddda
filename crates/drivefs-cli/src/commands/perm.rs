//! Perm command - inspect and reconcile sharing entries.
//!
//! # Examples
//!
//! ```bash
//! drivefs perm list /shared
//! drivefs perm set /shared group:eng@example.com writer
//! drivefs perm set /shared domain:example.com reader --discoverable
//! drivefs perm del /shared anyone
//! ```

use anyhow::Result;
use clap::{Args as ClapArgs, Subcommand};
use tracing::instrument;

use drivefs_core::{AccessEntry, Grantee, PermissionRequest, Role};

use super::lookup;
use crate::output::create_table;
use crate::session::Session;

#[derive(ClapArgs)]
pub struct Args {
    #[command(subcommand)]
    pub command: PermCommand,
}

#[derive(Subcommand)]
pub enum PermCommand {
    /// List the entries of a node
    List {
        path: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Grant a role, updating existing entries of the same grantee
    Set {
        path: String,

        /// user:EMAIL, group:EMAIL, domain:DOMAIN or anyone
        grantee: Grantee,

        /// reader, commenter, writer, fileOrganizer, organizer or owner
        role: Role,

        /// Let the grantee find the node through search (domain and anyone)
        #[arg(long)]
        discoverable: bool,
    },

    /// Revoke every entry of a grantee
    Del {
        path: String,

        /// user:EMAIL, group:EMAIL, domain:DOMAIN or anyone
        grantee: Grantee,
    },
}

#[instrument(level = "info", name = "cmd::perm", skip_all)]
pub fn execute(session: &Session, args: &Args) -> Result<()> {
    let fs = session.fs();
    match &args.command {
        PermCommand::List { path, json } => {
            let node = lookup(session, path)?;
            let entries = fs.perm_list(&node.id)?;
            print_entries(&entries, *json)
        }
        PermCommand::Set {
            path,
            grantee,
            role,
            discoverable,
        } => {
            let node = lookup(session, path)?;
            let request = PermissionRequest {
                grantee: grantee.clone(),
                role: *role,
                discoverable: *discoverable,
            };
            let entries = fs.perm_set(&node.id, &request)?;
            session.save()?;
            print_entries(&entries, false)
        }
        PermCommand::Del { path, grantee } => {
            let node = lookup(session, path)?;
            let entries = fs.perm_del(&node.id, grantee)?;
            session.save()?;
            print_entries(&entries, false)
        }
    }
}

fn print_entries(entries: &[AccessEntry], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(entries)?);
        return Ok(());
    }
    if entries.is_empty() {
        println!("No permissions");
        return Ok(());
    }
    let mut table = create_table();
    table.set_header(vec!["Grantee", "Role", "Discoverable", "ID"]);
    for entry in entries {
        table.add_row(vec![
            entry.grantee.to_string(),
            entry.role.to_string(),
            if entry.discoverable { "yes" } else { "no" }.to_string(),
            entry.id.clone(),
        ]);
    }
    println!("{table}");
    Ok(())
}
