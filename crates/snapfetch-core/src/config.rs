use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Default Jenkins location under which the nightly data-load jobs live.
pub const DEFAULT_JENKINS_JOB_ROOT: &str =
    "http://sandbox.jenkins.cloudera.com/view/Impala/view/Build/job";

fn default_jenkins_job_root() -> String {
    DEFAULT_JENKINS_JOB_ROOT.to_string()
}

fn default_connect_timeout_secs() -> u64 {
    15
}

fn default_fetch_timeout_secs() -> u64 {
    3600
}

/// Global configuration loaded from `~/.config/snapfetch/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapfetchConfig {
    /// Base URL under which CI jobs live; the job name is appended to it.
    #[serde(default = "default_jenkins_job_root")]
    pub jenkins_job_root: String,
    /// When true, query the job's JSON API for the last stable build number.
    /// When false, downstream filenames and URLs use an empty build identifier.
    #[serde(default)]
    pub resolve_build: bool,
    /// Connect timeout for HTTP requests, in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Hard wall-clock cap on a single artifact fetch, in seconds.
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

impl Default for SnapfetchConfig {
    fn default() -> Self {
        Self {
            jenkins_job_root: default_jenkins_job_root(),
            resolve_build: false,
            connect_timeout_secs: default_connect_timeout_secs(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("snapfetch")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<SnapfetchConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = SnapfetchConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: SnapfetchConfig = toml::from_str(&data)?;
    Ok(cfg)
}
