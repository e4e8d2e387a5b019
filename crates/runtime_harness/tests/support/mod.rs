#![allow(dead_code)]

pub mod cloud;

use std::io::Write;
use std::path::{Path, PathBuf};

use runtime_harness::config::resolve_path;
use runtime_harness::retry::ManualClock;
use runtime_harness::{CloudServices, HarnessConfig};
use tempfile::NamedTempFile;

use cloud::FakeCloud;

/// A stand-in deployment zip on disk.
pub fn artifact() -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp artifact");
    file.write_all(b"PK\x03\x04bootstrap")
        .expect("write temp artifact");
    file
}

pub fn config_for(artifact: &NamedTempFile) -> HarnessConfig {
    HarnessConfig::default().with_artifact_path(artifact.path())
}

/// Workspace root; cargo runs integration tests from the package directory.
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../..")
}

/// Live-run config from `RUNTIME_HARNESS_ARTIFACT` and `RUNTIME_HARNESS_REGION`.
pub fn live_config(root: &Path) -> HarnessConfig {
    live_config_from(
        root,
        std::env::var("RUNTIME_HARNESS_ARTIFACT").ok(),
        std::env::var("RUNTIME_HARNESS_REGION").ok(),
    )
}

pub fn live_config_from(
    root: &Path,
    artifact: Option<String>,
    region: Option<String>,
) -> HarnessConfig {
    let mut config = HarnessConfig::default();
    if let Some(artifact) = artifact {
        config = config.with_artifact_path(artifact);
    }
    if let Some(region) = region {
        config = config.with_region(region);
    }
    config.resolved_against(root)
}

/// Where `RUNTIME_HARNESS_REPORT` asks for the run report, if anywhere.
pub fn live_report_path(root: &Path) -> Option<PathBuf> {
    std::env::var("RUNTIME_HARNESS_REPORT")
        .ok()
        .map(|path| resolve_path(root, Path::new(&path)))
}

pub fn services<'a>(cloud: &'a FakeCloud, clock: &'a ManualClock) -> CloudServices<'a> {
    CloudServices {
        identity: cloud,
        storage: cloud,
        functions: cloud,
        clock,
    }
}
