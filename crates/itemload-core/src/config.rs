use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::fetch::FetchOptions;

/// Item limit used when neither the config file nor the CLI sets one.
pub const DEFAULT_ITEM_LIMIT: usize = 100;

/// Global configuration loaded from `~/.config/itemload/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Maximum number of items a successful load may return.
    pub item_limit: usize,
    /// Connect timeout in seconds (None = no timeout).
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,
    /// Whole-transfer timeout in seconds (None = no timeout).
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Redirect hops to follow (None = built-in default of 10).
    #[serde(default)]
    pub max_redirections: Option<u32>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            item_limit: DEFAULT_ITEM_LIMIT,
            connect_timeout_secs: None,
            timeout_secs: None,
            max_redirections: None,
        }
    }
}

impl LoaderConfig {
    /// Serialize as written to `config.toml`.
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn fetch_options(&self) -> FetchOptions {
        let defaults = FetchOptions::default();
        FetchOptions {
            connect_timeout: self.connect_timeout_secs.map(Duration::from_secs),
            timeout: self.timeout_secs.map(Duration::from_secs),
            max_redirections: self.max_redirections.or(defaults.max_redirections),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("itemload")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<LoaderConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = LoaderConfig::default();
        let toml = default_cfg.to_toml_string()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

/// Load configuration from an explicit file.
pub fn load_from_path(path: &Path) -> Result<LoaderConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let cfg: LoaderConfig =
        toml::from_str(&data).with_context(|| format!("parsing config {}", path.display()))?;
    Ok(cfg)
}
