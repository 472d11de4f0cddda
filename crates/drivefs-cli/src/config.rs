//! Configuration file support for the drivefs CLI.
//!
//! Configuration is stored at `~/.config/drivefs/config.toml` (XDG standard)
//! or the platform equivalent. `DRIVEFS_CONFIG_DIR` replaces the directory,
//! and `--config` names a file directly.
//!
//! # Example configuration
//!
//! ```toml
//! store = "/home/user/drive.json"
//!
//! [core]
//! root_id = "root"
//! page_size = 50
//! max_depth = 64
//!
//! [core.type_tags]
//! folder = "application/vnd.google-apps.folder"
//! ```
//!
//! Every key is optional. Command-line flags override file values.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use drivefs_core::DriveFsConfig;

const CONFIG_DIR_ENV: &str = "DRIVEFS_CONFIG_DIR";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct CliConfig {
    /// Snapshot file holding the store
    pub store: Option<PathBuf>,

    /// Settings handed to the core library
    #[serde(default)]
    pub core: DriveFsConfig,
}

impl CliConfig {
    /// Load `explicit` if given (it must exist), else the default file if
    /// present, else an empty configuration.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let path = config_path()?;
                if !path.exists() {
                    tracing::debug!(path = %path.display(), "No config file, using defaults");
                    return Ok(Self::default());
                }
                path
            }
        };

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: CliConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }
}

/// Get the path to the configuration file.
pub fn config_path() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV) {
        return Ok(PathBuf::from(dir).join("config.toml"));
    }
    let base_dirs =
        directories::BaseDirs::new().ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
    Ok(base_dirs.config_dir().join("drivefs").join("config.toml"))
}
