//! End-to-end snapshot flow with a recording fake fetcher: verifies the
//! target URLs, destination directories, and cleanup behavior, no network.

use anyhow::Result;
use snapfetch_core::config::DEFAULT_JENKINS_JOB_ROOT;
use snapfetch_core::fetcher::{ArtifactFetcher, FetchOutcome};
use snapfetch_core::jenkins;
use snapfetch_core::snapshot::{self, SnapshotConfig, WAREHOUSE_SNAPSHOT_URL};
use snapfetch_core::version::CdhVersion;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::tempdir;

/// Fake fetcher: records every call and pretends the download succeeded.
#[derive(Default)]
struct RecordingFetcher {
    calls: Mutex<Vec<(PathBuf, String)>>,
}

impl ArtifactFetcher for RecordingFetcher {
    fn fetch_if_absent(&self, dest_dir: &Path, url: &str) -> Result<FetchOutcome> {
        self.calls
            .lock()
            .unwrap()
            .push((dest_dir.to_path_buf(), url.to_string()));
        Ok(FetchOutcome::Downloaded(dest_dir.join("fake")))
    }
}

#[test]
fn cdh5_default_flow_hits_the_expected_urls() {
    let warehouse_dir = tempdir().unwrap();
    let metastore_dir = tempdir().unwrap();

    // Pre-existing dumps must be cleaned before the metastore fetch.
    let old_dump = metastore_dir.path().join("hive_impala_dump_cdh5-99.txt");
    let keeper = metastore_dir.path().join("schema.sql");
    std::fs::write(&old_dump, b"old").unwrap();
    std::fs::write(&keeper, b"keep").unwrap();

    let job_url = jenkins::job_url(DEFAULT_JENKINS_JOB_ROOT, CdhVersion::V5, None);
    let fetcher = RecordingFetcher::default();

    let warehouse = SnapshotConfig::new(warehouse_dir.path(), &job_url, "").unwrap();
    snapshot::download_warehouse_snapshot(&warehouse, CdhVersion::V5, false, &fetcher);

    let metastore = SnapshotConfig::new(metastore_dir.path(), &job_url, "").unwrap();
    snapshot::download_metastore_snapshot(&metastore, CdhVersion::V5, &fetcher);

    let calls = fetcher.calls.lock().unwrap();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].0, warehouse_dir.path());
    assert_eq!(calls[0].1, WAREHOUSE_SNAPSHOT_URL);
    assert_eq!(calls[1].0, metastore_dir.path());
    assert_eq!(
        calls[1].1,
        "http://sandbox.jenkins.cloudera.com/view/Impala/view/Build/job/\
         impala-CDH5-nightly-data-load/lastStableBuild/artifact/hive_impala_dump_cdh5-.txt"
    );

    assert!(!old_dump.exists(), "old dump should have been removed");
    assert!(keeper.exists(), "unrelated files must survive the cleanup");
}

#[test]
fn job_name_override_flows_into_the_artifact_url() {
    let dir = tempdir().unwrap();
    let fetcher = RecordingFetcher::default();

    let job_url = jenkins::job_url(
        DEFAULT_JENKINS_JOB_ROOT,
        CdhVersion::V4,
        Some("my-private-data-load"),
    );
    let cfg = SnapshotConfig::new(dir.path(), &job_url, "57").unwrap();
    snapshot::download_metastore_snapshot(&cfg, CdhVersion::V4, &fetcher);

    let calls = fetcher.calls.lock().unwrap();
    assert_eq!(
        calls[0].1,
        "http://sandbox.jenkins.cloudera.com/view/Impala/view/Build/job/\
         my-private-data-load/lastStableBuild/artifact/hive_impala_dump_cdh4-57.txt"
    );
}

#[test]
fn resolved_build_number_lands_in_the_dump_name() {
    let dir = tempdir().unwrap();
    let fetcher = RecordingFetcher::default();

    let cfg =
        SnapshotConfig::new(dir.path(), "http://jenkins.example/job/data-load", "123").unwrap();
    snapshot::download_metastore_snapshot(&cfg, CdhVersion::V5, &fetcher);

    let calls = fetcher.calls.lock().unwrap();
    assert_eq!(
        calls[0].1,
        "http://jenkins.example/job/data-load/lastStableBuild/artifact/hive_impala_dump_cdh5-123.txt"
    );
}

#[test]
fn clean_flag_removes_stale_warehouse_archives() {
    let dir = tempdir().unwrap();
    let stale = dir.path().join("test-warehouse-cdh5-7-SNAPSHOT.tar.gz");
    std::fs::write(&stale, b"old").unwrap();

    let fetcher = RecordingFetcher::default();
    let cfg = SnapshotConfig::new(dir.path(), "http://j/job/x", "").unwrap();
    snapshot::download_warehouse_snapshot(&cfg, CdhVersion::V5, true, &fetcher);

    assert!(!stale.exists());
    assert_eq!(fetcher.calls.lock().unwrap().len(), 1);
}

#[test]
fn without_clean_stale_archives_survive() {
    let dir = tempdir().unwrap();
    let stale = dir.path().join("test-warehouse-cdh5-7-SNAPSHOT.tar.gz");
    std::fs::write(&stale, b"old").unwrap();

    let fetcher = RecordingFetcher::default();
    let cfg = SnapshotConfig::new(dir.path(), "http://j/job/x", "").unwrap();
    snapshot::download_warehouse_snapshot(&cfg, CdhVersion::V5, false, &fetcher);

    assert!(stale.exists());
}

/// Fetcher that always fails, to pin down the tolerant contract: a failed
/// fetch is logged, not propagated.
struct FailingFetcher;

impl ArtifactFetcher for FailingFetcher {
    fn fetch_if_absent(&self, _dest_dir: &Path, _url: &str) -> Result<FetchOutcome> {
        anyhow::bail!("connection refused")
    }
}

#[test]
fn fetch_failures_do_not_abort_the_flow() {
    let dir = tempdir().unwrap();
    let cfg = SnapshotConfig::new(dir.path(), "http://j/job/x", "").unwrap();

    snapshot::download_warehouse_snapshot(&cfg, CdhVersion::V5, false, &FailingFetcher);
    snapshot::download_metastore_snapshot(&cfg, CdhVersion::V5, &FailingFetcher);
}
