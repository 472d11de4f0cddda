//! The store snapshot a command operates on.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{debug, instrument};

use drivefs_core::{DriveFs, MemoryStore, NodeId};

use crate::config::CliConfig;

/// Global options shared by every store command.
#[derive(Debug, Clone, Default)]
pub struct StoreOptions {
    pub config: Option<PathBuf>,
    pub store: Option<PathBuf>,
    pub root: Option<String>,
}

/// A loaded snapshot and the filesystem view over it.
pub struct Session {
    fs: DriveFs<MemoryStore>,
    store_path: PathBuf,
}

impl Session {
    /// Load configuration and the snapshot. `--store`/`DRIVEFS_STORE` wins
    /// over the config file; `--root` wins over `core.root_id`.
    #[instrument(level = "debug", skip_all)]
    pub fn open(options: &StoreOptions) -> Result<Self> {
        let mut config = CliConfig::load(options.config.as_deref())?;
        if let Some(root) = &options.root {
            config.core.root_id = NodeId::from(root.as_str());
        }

        let store_path = options.store.clone().or(config.store).ok_or_else(|| {
            anyhow::anyhow!("No store snapshot given. Pass --store, set DRIVEFS_STORE, or run 'drivefs init'")
        })?;
        let store = MemoryStore::load_json(&store_path)
            .with_context(|| format!("Failed to open store: {}", store_path.display()))?
            .with_type_tags(config.core.type_tags.clone());
        debug!(store = %store_path.display(), root = %config.core.root_id, "Opened store");

        Ok(Self {
            fs: DriveFs::with_config(store, config.core),
            store_path,
        })
    }

    pub fn fs(&self) -> &DriveFs<MemoryStore> {
        &self.fs
    }

    /// Root that absolute paths start from.
    pub fn root(&self) -> &NodeId {
        self.fs.root_id()
    }

    /// Write the snapshot back after a mutation.
    pub fn save(&self) -> Result<()> {
        self.fs
            .store()
            .save_json(&self.store_path)
            .with_context(|| format!("Failed to save store: {}", self.store_path.display()))?;
        debug!(store = %self.store_path.display(), "Saved store");
        Ok(())
    }
}

/// Normalize a path to ensure it starts with `/`.
/// This makes paths like `docs/a.txt` work the same as `/docs/a.txt`.
pub fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}
