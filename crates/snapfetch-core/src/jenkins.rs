//! Jenkins job lookup and last-stable-build resolution.
//!
//! Maps a platform version to its nightly data-load job, builds the job URL,
//! and (when enabled via config) asks the job's JSON API which build is the
//! most recent stable one.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

use crate::config::SnapfetchConfig;
use crate::version::CdhVersion;

const JOB_NAME_CDH4: &str = "impala-master-64bit-nightly-full-data-load";
const JOB_NAME_CDH5: &str = "impala-CDH5-nightly-data-load";

/// Status responses are small; no need for the long artifact-fetch timeout.
const API_TIMEOUT_SECS: u64 = 30;

/// Name of the nightly job that produced the snapshots for `version`.
pub fn job_name_for(version: CdhVersion) -> &'static str {
    match version {
        CdhVersion::V4 => JOB_NAME_CDH4,
        CdhVersion::V5 => JOB_NAME_CDH5,
    }
}

/// Full URL of the job to pull artifacts from.
///
/// An explicit `override_name` wins verbatim over the per-version default.
/// A trailing slash on `job_root` is tolerated.
pub fn job_url(job_root: &str, version: CdhVersion, override_name: Option<&str>) -> String {
    let name = override_name.unwrap_or_else(|| job_name_for(version));
    format!("{}/{}", job_root.trim_end_matches('/'), name)
}

/// Job status endpoint payload, reduced to the one field read here.
#[derive(Debug, Deserialize)]
struct JobStatus {
    #[serde(rename = "lastStableBuild")]
    last_stable_build: Option<BuildRef>,
}

#[derive(Debug, Deserialize)]
struct BuildRef {
    number: u64,
}

/// Client for the Jenkins JSON API.
#[derive(Debug, Clone)]
pub struct JenkinsClient {
    connect_timeout: Duration,
    timeout: Duration,
}

impl JenkinsClient {
    pub fn new(connect_timeout: Duration, timeout: Duration) -> Self {
        Self {
            connect_timeout,
            timeout,
        }
    }

    pub fn from_config(cfg: &SnapfetchConfig) -> Self {
        Self::new(
            Duration::from_secs(cfg.connect_timeout_secs),
            Duration::from_secs(API_TIMEOUT_SECS),
        )
    }

    /// Fetch `<job_url>/api/json` and extract the last stable build number.
    ///
    /// Fails when the endpoint is unreachable, returns a non-2xx status, the
    /// body is not valid JSON, or the job reports no stable build.
    pub fn last_stable_build_num(&self, job_url: &str) -> Result<String> {
        let url = format!("{}/api/json", job_url);
        tracing::info!("getting latest snapshot version from: {}", url);
        let body = self.get(&url)?;
        let status: JobStatus =
            serde_json::from_slice(&body).context("malformed job status response")?;
        let build = status.last_stable_build.context("no stable build found")?;
        Ok(build.number.to_string())
    }

    fn get(&self, url: &str) -> Result<Vec<u8>> {
        let mut body: Vec<u8> = Vec::new();

        let mut easy = curl::easy::Easy::new();
        easy.url(url).context("invalid URL")?;
        easy.follow_location(true)?;
        easy.connect_timeout(self.connect_timeout)?;
        easy.timeout(self.timeout)?;

        {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer
                .perform()
                .with_context(|| format!("GET {} failed", url))?;
        }

        let code = easy.response_code().context("no response code")?;
        if code < 200 || code >= 300 {
            anyhow::bail!("GET {} returned HTTP {}", url, code);
        }

        Ok(body)
    }
}
