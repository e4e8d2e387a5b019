use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::contract::Expectation;

/// Machine-readable summary of one harness run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarnessReport {
    pub run_id: String,
    pub bucket_name: String,
    pub function_name: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// `None` when the run stopped before the role step finished.
    pub role_already_existed: Option<bool>,
    pub scenarios: Vec<ScenarioRecord>,
    pub cleanup: Option<CleanupSummary>,
    pub error: Option<String>,
}

impl HarnessReport {
    pub fn new(run_id: &str, bucket_name: &str, function_name: &str) -> Self {
        Self {
            run_id: run_id.to_string(),
            bucket_name: bucket_name.to_string(),
            function_name: function_name.to_string(),
            started_at: Utc::now(),
            finished_at: None,
            role_already_existed: None,
            scenarios: Vec::new(),
            cleanup: None,
            error: None,
        }
    }

    pub fn passed(&self) -> bool {
        self.error.is_none() && self.scenarios.iter().all(|record| record.passed)
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioRecord {
    pub entry_point: String,
    pub expected: Expectation,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

/// What the cleanup pass removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupSummary {
    pub function_deleted: bool,
    pub buckets_deleted: Vec<String>,
    pub role_deleted: bool,
}
