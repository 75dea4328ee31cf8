//! Snapshot download operations.
//!
//! Two artifacts come out of a nightly data-load run: the warehouse snapshot
//! archive (a fixed cloud-storage object) and the metastore dump (an artifact
//! of the Jenkins job, named by version and build number). Both land in local
//! directories with skip-if-present semantics; a failed fetch is logged and
//! tolerated, never fatal.

use anyhow::{Context, Result};
use regex::Regex;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::fetcher::{ArtifactFetcher, FetchOutcome};
use crate::version::CdhVersion;

/// Fixed cloud-storage object holding the current warehouse snapshot archive.
pub const WAREHOUSE_SNAPSHOT_URL: &str =
    "https://s3-us-west-1.amazonaws.com/cdh5-snapshots/public-snapshot.tar.gz";

/// Warehouse archives as named by the nightly jobs, for stale-file cleanup.
const WAREHOUSE_SNAPSHOT_PATTERN: &str = r"^test-warehouse-cdh[4-5]-[0-9]+-SNAPSHOT\.tar\.gz$";

const METASTORE_DUMP_PREFIX: &str = "hive_impala_";
const METASTORE_DUMP_EXT: &str = ".txt";

/// Per-operation download configuration: destination directory, the CI job
/// the artifacts belong to, and the build identifier. Built fresh before each
/// download operation and read-only afterwards.
#[derive(Debug, Clone)]
pub struct SnapshotConfig {
    /// Absolute destination directory.
    pub snapshot_dir: PathBuf,
    /// URL of the CI job the artifacts belong to.
    pub job_url: String,
    /// Build identifier; empty when build resolution is disabled.
    pub last_stable: String,
}

impl SnapshotConfig {
    /// Builds a config with `snapshot_dir` made absolute against the current
    /// working directory. The directory does not need to exist yet.
    pub fn new(snapshot_dir: &Path, job_url: &str, last_stable: &str) -> Result<Self> {
        Ok(Self {
            snapshot_dir: absolutize(snapshot_dir)?,
            job_url: job_url.to_string(),
            last_stable: last_stable.to_string(),
        })
    }
}

/// Warehouse archive name for a given version and build.
pub fn warehouse_snapshot_filename(version: CdhVersion, build: &str) -> String {
    format!("test-warehouse-cdh{}-{}-SNAPSHOT.tar.gz", version, build)
}

/// Metastore dump name for a given version and build.
pub fn metastore_dump_filename(version: CdhVersion, build: &str) -> String {
    format!("hive_impala_dump_cdh{}-{}.txt", version, build)
}

/// Downloads the warehouse snapshot archive into `config.snapshot_dir`.
///
/// With `clean` set, archives from other builds are removed first. The fetch
/// is skipped when the archive is already present.
pub fn download_warehouse_snapshot(
    config: &SnapshotConfig,
    version: CdhVersion,
    clean: bool,
    fetcher: &dyn ArtifactFetcher,
) {
    if clean {
        if let Err(err) = remove_stale_warehouse_snapshots(config, version) {
            tracing::warn!("failed to clean old warehouse snapshots: {:#}", err);
        }
    }
    fetch_if_absent_logged(fetcher, &config.snapshot_dir, WAREHOUSE_SNAPSHOT_URL);
}

/// Downloads the metastore dump for the job's last stable build into
/// `config.snapshot_dir`, deleting previously downloaded dumps first.
pub fn download_metastore_snapshot(
    config: &SnapshotConfig,
    version: CdhVersion,
    fetcher: &dyn ArtifactFetcher,
) {
    if let Err(err) = remove_metastore_dumps(&config.snapshot_dir) {
        tracing::warn!("failed to clean old metastore dumps: {:#}", err);
    }
    let file_name = metastore_dump_filename(version, &config.last_stable);
    let url = format!("{}/lastStableBuild/artifact/{}", config.job_url, file_name);
    fetch_if_absent_logged(fetcher, &config.snapshot_dir, &url);
}

/// Fetch with skip-if-present semantics; failures are logged, not surfaced.
/// Downstream setup treats a missing snapshot as its own failure, so a bad
/// fetch must not abort the remaining downloads.
fn fetch_if_absent_logged(fetcher: &dyn ArtifactFetcher, dest_dir: &Path, url: &str) {
    tracing::info!("downloading snapshot from {} to {}", url, dest_dir.display());
    match fetcher.fetch_if_absent(dest_dir, url) {
        Ok(FetchOutcome::Downloaded(path)) => {
            tracing::info!("downloaded {}", path.display());
        }
        Ok(FetchOutcome::AlreadyPresent(path)) => {
            tracing::info!("{} already present, skipping download", path.display());
        }
        Err(err) => {
            tracing::warn!("failed to fetch {}: {:#}", url, err);
        }
    }
}

/// Removes warehouse archives that differ from the one about to be fetched.
/// Best-effort; the caller downgrades failure to a warning.
fn remove_stale_warehouse_snapshots(config: &SnapshotConfig, version: CdhVersion) -> Result<()> {
    if !config.snapshot_dir.is_dir() {
        return Ok(());
    }
    let keep = warehouse_snapshot_filename(version, &config.last_stable);
    let pattern =
        Regex::new(WAREHOUSE_SNAPSHOT_PATTERN).context("bad warehouse snapshot pattern")?;
    for entry in fs::read_dir(&config.snapshot_dir)? {
        let entry = entry?;
        let name = entry.file_name();
        if let Some(name) = name.to_str() {
            if pattern.is_match(name) && name != keep {
                tracing::info!("removing older snapshot: {}", name);
                if let Err(err) = fs::remove_file(entry.path()) {
                    tracing::warn!("failed to remove {}: {}", name, err);
                }
            }
        }
    }
    Ok(())
}

/// Removes all previously downloaded metastore dumps (`hive_impala_*.txt`).
/// Best-effort; a directory that does not exist yet is fine.
fn remove_metastore_dumps(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        return Ok(());
    }
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        if let Some(name) = name.to_str() {
            if name.starts_with(METASTORE_DUMP_PREFIX) && name.ends_with(METASTORE_DUMP_EXT) {
                tracing::info!("removing old metastore dump: {}", name);
                if let Err(err) = fs::remove_file(entry.path()) {
                    tracing::warn!("failed to remove {}: {}", name, err);
                }
            }
        }
    }
    Ok(())
}

/// Make `path` absolute against the current working directory without
/// requiring it to exist. `.` components are dropped.
fn absolutize(path: &Path) -> Result<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .context("cannot determine current directory")?
            .join(path)
    };
    Ok(joined
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect())
}
