//! Configuration for rummage.
//!
//! Configuration is loaded from `~/.config/rummage/config.toml`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::directory::DEFAULT_SEARCH_LIMIT;
use crate::host::{Host, TrustLevel};
use crate::storage::FsStore;
use crate::vfs::{Filesystem, LocalFs};

/// Host and search defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RummageConfig {
    /// Directory that relative entity paths resolve against.
    #[serde(default = "default_project_root")]
    pub project_root: PathBuf,

    /// What the host may do.
    #[serde(default)]
    pub trust: TrustLevel,

    /// Default budget for `find` searches.
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,

    /// Where the key-value store keeps its files, relative to
    /// `project_root` unless absolute.
    #[serde(default = "default_save_dir")]
    pub save_dir: PathBuf,
}

fn default_project_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_search_limit() -> usize {
    DEFAULT_SEARCH_LIMIT
}

fn default_save_dir() -> PathBuf {
    PathBuf::from("save")
}

impl Default for RummageConfig {
    fn default() -> Self {
        Self {
            project_root: default_project_root(),
            trust: TrustLevel::default(),
            search_limit: default_search_limit(),
            save_dir: default_save_dir(),
        }
    }
}

impl RummageConfig {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, returns default configuration.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Get the default config file path.
    pub fn config_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("", "", "rummage")
            .context("Could not determine config directory")?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// `save_dir` resolved against `project_root`.
    pub fn save_path(&self) -> PathBuf {
        if self.save_dir.is_absolute() {
            self.save_dir.clone()
        } else {
            self.project_root.join(&self.save_dir)
        }
    }

    /// A file-backed key-value store under [`save_path`](Self::save_path).
    pub fn save_store(&self) -> FsStore {
        let save_path = self.save_path();
        let fs: Arc<dyn Filesystem> = Arc::new(LocalFs::new(save_path));
        FsStore::new(fs, ".")
    }
}

impl Host {
    /// A host over the real filesystem as described by `config`.
    pub fn from_config(config: &RummageConfig) -> Self {
        let root = config.project_root.clone();
        let fs = if config.trust == TrustLevel::Local {
            LocalFs::new(root.clone())
        } else {
            LocalFs::read_only(root.clone())
        };
        Host::new(fs, config.trust, root)
    }
}
