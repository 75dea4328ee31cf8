//! Artifact fetching with skip-if-present semantics.
//!
//! The snapshot operations only depend on the `ArtifactFetcher` trait, so
//! tests can swap in a fake with no network or real downloads. The production
//! implementation streams the body to a `.part` file and renames it into
//! place once the transfer succeeded.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::SnapfetchConfig;
use crate::filename::filename_from_url;

/// Temporary file suffix used before the final rename.
const TEMP_SUFFIX: &str = ".part";

/// Outcome of a fetch-if-absent operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The file was downloaded to this path.
    Downloaded(PathBuf),
    /// A same-named file already existed; nothing was fetched.
    AlreadyPresent(PathBuf),
}

/// Capability to fetch a URL into a directory, skipping the download when a
/// same-named file is already there.
pub trait ArtifactFetcher {
    fn fetch_if_absent(&self, dest_dir: &Path, url: &str) -> Result<FetchOutcome>;
}

/// Curl-backed fetcher used by the CLI.
#[derive(Debug, Clone)]
pub struct CurlFetcher {
    connect_timeout: Duration,
    timeout: Duration,
}

impl CurlFetcher {
    pub fn new(connect_timeout: Duration, timeout: Duration) -> Self {
        Self {
            connect_timeout,
            timeout,
        }
    }

    pub fn from_config(cfg: &SnapfetchConfig) -> Self {
        Self::new(
            Duration::from_secs(cfg.connect_timeout_secs),
            Duration::from_secs(cfg.fetch_timeout_secs),
        )
    }

    /// Streams `url` to `part_path`. The caller renames on success and
    /// removes the partial file on failure.
    fn download_to(&self, url: &str, part_path: &Path) -> Result<()> {
        let mut file = File::create(part_path)
            .with_context(|| format!("failed to create {}", part_path.display()))?;
        let mut io_error: Option<std::io::Error> = None;

        let mut easy = curl::easy::Easy::new();
        easy.url(url).context("invalid URL")?;
        easy.follow_location(true)?;
        easy.connect_timeout(self.connect_timeout)?;
        // Abort if throughput drops below 1 KiB/s for 60s; the hard timeout
        // only catches transfers that are completely stuck.
        easy.low_speed_limit(1024)?;
        easy.low_speed_time(Duration::from_secs(60))?;
        easy.timeout(self.timeout)?;

        let perform_result = {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| match file.write_all(data) {
                Ok(()) => Ok(data.len()),
                Err(e) => {
                    io_error = Some(e);
                    Ok(0)
                }
            })?;
            transfer.perform()
        };

        if let Err(e) = perform_result {
            if e.is_write_error() {
                if let Some(io_err) = io_error.take() {
                    return Err(io_err)
                        .with_context(|| format!("failed writing {}", part_path.display()));
                }
            }
            return Err(e).with_context(|| format!("GET {} failed", url));
        }

        let code = easy.response_code().context("no response code")?;
        if !(200..300).contains(&code) {
            anyhow::bail!("GET {} returned HTTP {}", url, code);
        }

        Ok(())
    }
}

impl ArtifactFetcher for CurlFetcher {
    fn fetch_if_absent(&self, dest_dir: &Path, url: &str) -> Result<FetchOutcome> {
        let file_name = filename_from_url(url)
            .with_context(|| format!("cannot derive a filename from {}", url))?;
        let dest_path = dest_dir.join(&file_name);

        // The no-clobber contract: a same-named file means nothing to do.
        if dest_path.exists() {
            return Ok(FetchOutcome::AlreadyPresent(dest_path));
        }

        fs::create_dir_all(dest_dir)
            .with_context(|| format!("failed to create {}", dest_dir.display()))?;

        let part_path = dest_dir.join(format!("{}{}", file_name, TEMP_SUFFIX));
        if let Err(err) = self.download_to(url, &part_path) {
            let _ = fs::remove_file(&part_path);
            return Err(err);
        }

        fs::rename(&part_path, &dest_path).with_context(|| {
            format!(
                "failed to move {} to {}",
                part_path.display(),
                dest_path.display()
            )
        })?;

        Ok(FetchOutcome::Downloaded(dest_path))
    }
}
