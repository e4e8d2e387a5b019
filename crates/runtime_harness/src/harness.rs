use tracing::{error, info, warn};
use uuid::Uuid;

use crate::adapters::CloudServices;
use crate::cleanup::Cleanup;
use crate::config::HarnessConfig;
use crate::contract::{bucket_name, Scenario};
use crate::error::HarnessError;
use crate::provisioner::Provisioner;
use crate::report::HarnessReport;
use crate::scenarios::ScenarioRunner;

/// A failed run together with everything recorded before and during cleanup.
#[derive(Debug)]
pub struct HarnessFailure {
    pub error: HarnessError,
    pub report: Box<HarnessReport>,
}

impl std::fmt::Display for HarnessFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "run {} failed: {}", self.report.run_id, self.error)
    }
}

impl std::error::Error for HarnessFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

pub struct Harness<'a> {
    services: CloudServices<'a>,
    config: HarnessConfig,
}

impl<'a> Harness<'a> {
    pub fn new(services: CloudServices<'a>, config: HarnessConfig) -> Self {
        Self { services, config }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Provisions, runs `scenarios` in order, then cleans up.
    ///
    /// Cleanup runs on every exit path. When both the run and cleanup fail,
    /// the run's error is returned and the cleanup error is logged and kept
    /// in the report.
    pub fn run(&self, scenarios: &[Scenario]) -> Result<HarnessReport, HarnessFailure> {
        let run_id = Uuid::new_v4().to_string();
        self.run_with_id(&run_id, scenarios)
    }

    pub fn run_with_id(
        &self,
        run_id: &str,
        scenarios: &[Scenario],
    ) -> Result<HarnessReport, HarnessFailure> {
        let bucket = bucket_name(&self.config.bucket_prefix, run_id);
        let mut report = HarnessReport::new(run_id, &bucket, &self.config.function_name);
        info!(run_id, bucket = %bucket, scenarios = scenarios.len(), "starting harness run");

        let mut provisioner = Provisioner::new(self.services, &self.config, &bucket);
        let outcome = provisioner.prepare().and_then(|_| {
            ScenarioRunner::new(self.services, &self.config)
                .run_all(scenarios, &mut report.scenarios)
        });

        report.role_already_existed = provisioner.role().map(|role| role.already_existed);
        let cleanup =
            Cleanup::new(self.services, &self.config).cleanup(report.role_already_existed);
        report.finish();

        let failure = match (outcome, cleanup) {
            (Ok(()), Ok(summary)) => {
                report.cleanup = Some(summary);
                info!(run_id, "harness run passed");
                return Ok(report);
            }
            (Err(run_error), Ok(summary)) => {
                report.cleanup = Some(summary);
                run_error
            }
            (Ok(()), Err(cleanup_error)) => cleanup_error,
            (Err(run_error), Err(cleanup_error)) => {
                warn!(run_id, error = %cleanup_error, "cleanup failed after run failure");
                report.error = Some(format!("{run_error}; {cleanup_error}"));
                error!(run_id, error = %run_error, "harness run failed");
                return Err(HarnessFailure {
                    error: run_error,
                    report: Box::new(report),
                });
            }
        };

        error!(run_id, error = %failure, "harness run failed");
        report.error = Some(failure.to_string());
        Err(HarnessFailure {
            error: failure,
            report: Box::new(report),
        })
    }
}
