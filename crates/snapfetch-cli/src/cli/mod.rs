//! CLI for the snapfetch snapshot fetcher.
//!
//! One flow, flags only: resolve the job from the environment and config,
//! then fetch the warehouse snapshot archive and the metastore dump.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use snapfetch_core::config;
use snapfetch_core::fetcher::CurlFetcher;
use snapfetch_core::jenkins::{self, JenkinsClient};
use snapfetch_core::snapshot::{self, SnapshotConfig};
use snapfetch_core::version::CdhVersion;

/// Download the latest metastore and warehouse snapshots from the nightly data-load build.
#[derive(Debug, Parser)]
#[command(name = "snapfetch")]
#[command(about = "Fetch the latest nightly test-warehouse and metastore snapshots", long_about = None)]
pub struct Cli {
    /// Directory to download the warehouse snapshot to. Default is the current directory.
    #[arg(long, default_value = "./", value_name = "DIR")]
    pub warehouse_snapshot_dir: PathBuf,

    /// Directory to download the metastore snapshot to. Default is the current directory.
    #[arg(long, default_value = "./", value_name = "DIR")]
    pub metastore_snapshot_dir: PathBuf,

    /// Clean all snapshots except the latest. Default is off.
    #[arg(long)]
    pub clean: bool,

    /// Jenkins job to download the snapshot from, overriding the per-version default.
    #[arg(long, value_name = "NAME")]
    pub jenkins_job_name: Option<String>,
}

impl Cli {
    pub fn run_from_args() -> Result<()> {
        Self::parse().run()
    }

    pub fn run(&self) -> Result<()> {
        // Validate the version selector before anything else; loading the
        // tool config below may already create a default config file.
        let version = CdhVersion::from_env()?;

        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        let job_url = jenkins::job_url(
            &cfg.jenkins_job_root,
            version,
            self.jenkins_job_name.as_deref(),
        );
        let last_stable = if cfg.resolve_build {
            JenkinsClient::from_config(&cfg).last_stable_build_num(&job_url)?
        } else {
            String::new()
        };
        tracing::info!("last stable build was {}", last_stable);

        let fetcher = CurlFetcher::from_config(&cfg);

        let warehouse =
            SnapshotConfig::new(&self.warehouse_snapshot_dir, &job_url, &last_stable)?;
        snapshot::download_warehouse_snapshot(&warehouse, version, self.clean, &fetcher);

        let metastore =
            SnapshotConfig::new(&self.metastore_snapshot_dir, &job_url, &last_stable)?;
        snapshot::download_metastore_snapshot(&metastore, version, &fetcher);

        Ok(())
    }
}
