use tracing::{info, warn};

use crate::adapters::CloudServices;
use crate::config::HarnessConfig;
use crate::error::{HarnessError, ServiceError};
use crate::report::CleanupSummary;

/// Best-effort teardown of everything a run may have created.
///
/// Safe to run any number of times, including when nothing was provisioned.
pub struct Cleanup<'a> {
    services: CloudServices<'a>,
    config: &'a HarnessConfig,
}

impl<'a> Cleanup<'a> {
    pub fn new(services: CloudServices<'a>, config: &'a HarnessConfig) -> Self {
        Self { services, config }
    }

    /// Deletes the function, every bucket carrying the test prefix, and the
    /// execution role unless it pre-existed or its ownership is unknown.
    ///
    /// Missing resources are skipped. Role deletion failures are logged and
    /// swallowed. Any other failure is collected and reported once every
    /// step has been attempted.
    pub fn cleanup(
        &self,
        role_already_existed: Option<bool>,
    ) -> Result<CleanupSummary, HarnessError> {
        let mut summary = CleanupSummary::default();
        let mut failures = Vec::new();

        match self.delete_function() {
            Ok(deleted) => summary.function_deleted = deleted,
            Err(error) => failures.push(error),
        }

        match self.services.storage.list_buckets() {
            Ok(buckets) => {
                for bucket in buckets
                    .into_iter()
                    .filter(|bucket| self.config.owns_bucket(bucket))
                {
                    match self.delete_bucket(&bucket) {
                        Ok(true) => summary.buckets_deleted.push(bucket),
                        Ok(false) => {}
                        Err(error) => failures.push(error),
                    }
                }
            }
            Err(error) => failures.push(error),
        }

        if role_already_existed == Some(false) {
            summary.role_deleted = self.delete_role();
        }

        if failures.is_empty() {
            Ok(summary)
        } else {
            Err(HarnessError::Cleanup(failures))
        }
    }

    fn delete_function(&self) -> Result<bool, ServiceError> {
        let name = &self.config.function_name;
        match self.services.functions.delete_function(name) {
            Ok(()) => {
                info!(function = %name, "deleted function");
                Ok(true)
            }
            Err(error) if error.is_not_found() => Ok(false),
            Err(error) => Err(error),
        }
    }

    fn delete_bucket(&self, bucket: &str) -> Result<bool, ServiceError> {
        let storage = self.services.storage;
        match storage.delete_object(bucket, &self.config.artifact_key) {
            Ok(()) => {}
            Err(error) if error.is_not_found() => return Ok(false),
            Err(error) => return Err(error),
        }
        match storage.delete_bucket(bucket) {
            Ok(()) => {
                info!(bucket = %bucket, "deleted bucket");
                Ok(true)
            }
            Err(error) if error.is_not_found() => Ok(false),
            Err(error) => Err(error),
        }
    }

    fn delete_role(&self) -> bool {
        let name = &self.config.role_name;
        match self.services.identity.delete_role(name) {
            Ok(()) => {
                info!(role = %name, "deleted execution role");
                true
            }
            Err(error) => {
                warn!(role = %name, error = %error, "failed to delete execution role");
                false
            }
        }
    }
}
