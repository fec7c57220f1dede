use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::http::{DEFAULT_PORT, DEFAULT_USER_AGENT};

/// Global configuration loaded from `~/.config/getter/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetterConfig {
    /// Worker threads per download; also the number of chunks planned when
    /// the server honors byte ranges.
    pub worker_count: usize,
    /// Port used when a URL does not name one.
    pub port: u16,
    /// `User-Agent` sent with every range GET.
    pub user_agent: String,
    /// Connect deadline per request, in seconds.
    pub connect_timeout_secs: u64,
    /// Deadline for each socket read/write, in seconds. Bounds how long a dead
    /// peer can stall one worker.
    pub io_timeout_secs: u64,
    /// Optional capacity of the worker → collector result queue (None = one
    /// slot per worker).
    #[serde(default)]
    pub result_queue_capacity: Option<usize>,
}

impl Default for GetterConfig {
    fn default() -> Self {
        Self {
            worker_count: 4,
            port: DEFAULT_PORT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            connect_timeout_secs: 15,
            io_timeout_secs: 60,
            result_queue_capacity: None,
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("getter")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<GetterConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = GetterConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: GetterConfig = toml::from_str(&data)?;
    Ok(cfg)
}
