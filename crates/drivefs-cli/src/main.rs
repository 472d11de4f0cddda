#![deny(unsafe_code)]

mod commands;
mod config;
mod exit_code;
mod output;
mod session;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use drivefs_core::store::SnapshotError;
use drivefs_core::{DriveError, ErrorKind};

use crate::commands::{cat, cp, find, info, init, ln, ls, mkdir, mv, perm, resolve, rm, touch, tree, write};
use crate::session::{Session, StoreOptions};

/// Command-line interface for path-addressed remote object graphs
#[derive(Parser)]
#[command(name = "drivefs")]
#[command(author, version)]
#[command(propagate_version = true)]
#[command(after_help = "EXAMPLES:
    # Create a store snapshot and point the CLI at it
    drivefs init ~/drive.json
    export DRIVEFS_STORE=~/drive.json

    # Build a folder chain and upload a file
    drivefs mkdir -p /projects/2024
    echo hello | drivefs write /projects/2024/notes.txt

    # Show every node a path reaches (duplicates included)
    drivefs find /projects/2024

    # Share a folder
    drivefs perm set /projects user:ana@example.com writer
")]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Config file (default: ~/.config/drivefs/config.toml)
    #[arg(long, env = "DRIVEFS_CONFIG", value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Store snapshot file
    #[arg(long, env = "DRIVEFS_STORE", value_name = "FILE", global = true)]
    store: Option<PathBuf>,

    /// ID of the folder absolute paths start from
    #[arg(long, value_name = "ID", global = true)]
    root: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

impl From<&Cli> for StoreOptions {
    fn from(cli: &Cli) -> Self {
        Self {
            config: cli.config.clone(),
            store: cli.store.clone(),
            root: cli.root.clone(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    // ============ Lookup ============

    /// List folder contents
    Ls(ls::Args),

    /// Show a folder tree
    Tree(tree::Args),

    /// Show every node a path resolves to
    Find(find::Args),

    /// Show metadata of the node at a path
    Info(info::Args),

    /// Print the path of a node ID
    Resolve(resolve::Args),

    /// Print file contents
    Cat(cat::Args),

    // ============ Mutation ============

    /// Create a folder
    Mkdir(mkdir::Args),

    /// Create an empty file
    Touch(touch::Args),

    /// Write stdin to a file
    Write(write::Args),

    /// Create a shortcut
    Ln(ln::Args),

    /// Remove a file or folder
    Rm(rm::Args),

    /// Move or rename a node
    Mv(mv::Args),

    /// Copy a node
    Cp(cp::Args),

    /// Inspect or change sharing permissions
    Perm(perm::Args),

    // ============ Standalone ============

    /// Create an empty store snapshot
    Init(init::Args),
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::from(exit_code::SUCCESS),
        Err(e) => {
            let code = categorize_error(&e);

            // Only print error if not quiet mode (quiet is parsed separately for this)
            let args: Vec<String> = std::env::args().collect();
            let is_quiet = args.iter().any(|a| a == "-q" || a == "--quiet");

            if !is_quiet {
                eprintln!("Error: {e:#}");
            }

            ExitCode::from(code)
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    if !cli.quiet {
        setup_tracing(cli.verbose);
    }

    let options = StoreOptions::from(&cli);

    match cli.command {
        Commands::Init(args) => init::execute(&options, &args),

        Commands::Ls(args) => execute_store_command(&options, &args, ls::execute),
        Commands::Tree(args) => execute_store_command(&options, &args, tree::execute),
        Commands::Find(args) => execute_store_command(&options, &args, find::execute),
        Commands::Info(args) => execute_store_command(&options, &args, info::execute),
        Commands::Resolve(args) => execute_store_command(&options, &args, resolve::execute),
        Commands::Cat(args) => execute_store_command(&options, &args, cat::execute),
        Commands::Mkdir(args) => execute_store_command(&options, &args, mkdir::execute),
        Commands::Touch(args) => execute_store_command(&options, &args, touch::execute),
        Commands::Write(args) => execute_store_command(&options, &args, write::execute),
        Commands::Ln(args) => execute_store_command(&options, &args, ln::execute),
        Commands::Rm(args) => execute_store_command(&options, &args, rm::execute),
        Commands::Mv(args) => execute_store_command(&options, &args, mv::execute),
        Commands::Cp(args) => execute_store_command(&options, &args, cp::execute),
        Commands::Perm(args) => execute_store_command(&options, &args, perm::execute),
    }
}

/// Execute a command against the configured store snapshot
fn execute_store_command<T, F>(options: &StoreOptions, args: &T, f: F) -> Result<()>
where
    F: FnOnce(&Session, &T) -> Result<()>,
{
    let session = Session::open(options)?;
    f(&session, args)
}

/// Set up tracing/logging based on verbosity level
fn setup_tracing(verbose: u8) {
    let filter = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with_writer(io::stderr)
        .init();
}

/// Categorize an error into an exit code using typed error downcasting
fn categorize_error(e: &anyhow::Error) -> u8 {
    for cause in e.chain() {
        if let Some(drive_err) = cause.downcast_ref::<DriveError>() {
            return match drive_err.kind() {
                ErrorKind::InvalidPath => exit_code::USAGE_ERROR,
                ErrorKind::NotFound => exit_code::NOT_FOUND,
                ErrorKind::AlreadyExists
                | ErrorKind::MultiParentsNotSupported
                | ErrorKind::NotReadable
                | ErrorKind::NotRemovable => exit_code::CONFLICT,
                ErrorKind::RemoteError => exit_code::REMOTE_ERROR,
                ErrorKind::IoError => exit_code::IO_ERROR,
            };
        }

        if let Some(snapshot_err) = cause.downcast_ref::<SnapshotError>() {
            return match snapshot_err {
                SnapshotError::Io { source, .. } if source.kind() == io::ErrorKind::NotFound => exit_code::NOT_FOUND,
                SnapshotError::Io { .. } => exit_code::IO_ERROR,
                SnapshotError::Json { .. } => exit_code::GENERAL_ERROR,
            };
        }

        if cause.downcast_ref::<io::Error>().is_some() {
            return exit_code::IO_ERROR;
        }
    }

    exit_code::GENERAL_ERROR
}

#[cfg(test)]
mod tests {
    use super::*;
    use drivefs_core::OpContext;

    #[test]
    fn test_categorize_drive_errors() {
        let err = anyhow::Error::new(DriveError::not_found(OpContext::new().with_path("/x")));
        assert_eq!(categorize_error(&err), exit_code::NOT_FOUND);

        let err = anyhow::Error::new(DriveError::already_exists("b", 2, OpContext::new()))
            .context("Failed to create /a/b/c");
        assert_eq!(categorize_error(&err), exit_code::CONFLICT);

        let err = anyhow::Error::new(DriveError::invalid_path("x", "empty path segment"));
        assert_eq!(categorize_error(&err), exit_code::USAGE_ERROR);
    }

    #[test]
    fn test_categorize_other_errors() {
        let err = anyhow::anyhow!("something odd");
        assert_eq!(categorize_error(&err), exit_code::GENERAL_ERROR);

        let err = anyhow::Error::new(io::Error::other("disk gone")).context("writing output");
        assert_eq!(categorize_error(&err), exit_code::IO_ERROR);
    }

    #[test]
    fn test_cli_parses() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
