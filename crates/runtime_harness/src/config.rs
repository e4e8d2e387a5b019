use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::contract::{
    DEFAULT_ARTIFACT_PATH, DEFAULT_REGION, DEFAULT_RUNTIME, DEPLOYMENT_ZIP_KEY,
    EXECUTION_ROLE_DESCRIPTION, EXECUTION_ROLE_NAME, FUNCTION_MEMORY_SIZE, FUNCTION_NAME,
    INITIAL_ENTRY_POINT, LAMBDA_ASSUME_ROLE_POLICY, TEST_BUCKET_PREFIX,
};
use crate::retry::RetryPolicy;

/// Names and limits for one harness run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarnessConfig {
    pub region: String,
    pub role_name: String,
    pub role_description: String,
    pub trust_policy: String,
    pub bucket_prefix: String,
    pub function_name: String,
    pub artifact_key: String,
    pub artifact_path: PathBuf,
    pub memory_size: i32,
    pub runtime: String,
    pub initial_entry_point: String,
    pub create_retry: RetryPolicy,
    pub readiness_wait: RetryPolicy,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            role_name: EXECUTION_ROLE_NAME.to_string(),
            role_description: EXECUTION_ROLE_DESCRIPTION.to_string(),
            trust_policy: LAMBDA_ASSUME_ROLE_POLICY.to_string(),
            bucket_prefix: TEST_BUCKET_PREFIX.to_string(),
            function_name: FUNCTION_NAME.to_string(),
            artifact_key: DEPLOYMENT_ZIP_KEY.to_string(),
            artifact_path: PathBuf::from(DEFAULT_ARTIFACT_PATH),
            memory_size: FUNCTION_MEMORY_SIZE,
            runtime: DEFAULT_RUNTIME.to_string(),
            initial_entry_point: INITIAL_ENTRY_POINT.to_string(),
            create_retry: RetryPolicy::role_propagation(),
            readiness_wait: RetryPolicy::function_readiness(),
        }
    }
}

impl HarnessConfig {
    pub fn with_artifact_path(mut self, artifact_path: impl Into<PathBuf>) -> Self {
        self.artifact_path = artifact_path.into();
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Anchors a relative artifact path at `root` instead of the process
    /// working directory.
    pub fn resolved_against(mut self, root: &Path) -> Self {
        self.artifact_path = resolve_path(root, &self.artifact_path);
        self
    }

    pub fn owns_bucket(&self, bucket: &str) -> bool {
        bucket.starts_with(&self.bucket_prefix)
    }
}

/// `path` unchanged when absolute, otherwise joined onto `root`.
pub fn resolve_path(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}
