use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Image fetcher parameters (`[fetch]` section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Number of requests in flight at once. None = available parallelism of the host.
    pub concurrency: Option<usize>,
    /// Connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Read timeout in seconds: the request fails once no byte has arrived for this long.
    pub read_timeout_secs: u64,
    /// Optional cap on the whole transfer in seconds. None = no cap.
    pub max_transfer_secs: Option<u64>,
    /// Match "image" in Content-Type with exact case instead of ignoring case.
    pub content_type_case_sensitive: bool,
    /// Extension of saved files, without the dot.
    pub file_extension: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            concurrency: None,
            connect_timeout_secs: 10,
            read_timeout_secs: 10,
            max_transfer_secs: None,
            content_type_case_sensitive: false,
            file_extension: "jpg".to_string(),
        }
    }
}

impl FetchConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    pub fn max_transfer(&self) -> Option<Duration> {
        self.max_transfer_secs.map(Duration::from_secs)
    }
}

/// Subset parameters (`[subset]` section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SubsetConfig {
    /// Percentage of records kept after shuffling.
    pub percentage: f64,
    /// Shuffle seed; the same seed always selects the same records.
    pub seed: u64,
}

impl Default for SubsetConfig {
    fn default() -> Self {
        Self {
            percentage: 10.0,
            seed: 42,
        }
    }
}

/// Global configuration loaded from `~/.config/coyo/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoyoConfig {
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub subset: SubsetConfig,
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("coyo")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<CoyoConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = CoyoConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: CoyoConfig = toml::from_str(&data)?;
    Ok(cfg)
}
