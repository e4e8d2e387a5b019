use tracing::{debug, info};

use crate::adapters::CloudServices;
use crate::config::HarnessConfig;
use crate::contract::{ExecutionRole, FunctionDefinition, FunctionStatus};
use crate::error::{HarnessError, ServiceError};
use crate::retry::{retry_within, Attempt, RetryPolicy};

/// Brings up the role, bucket, artifact, and function for one run.
pub struct Provisioner<'a> {
    services: CloudServices<'a>,
    config: &'a HarnessConfig,
    bucket_name: &'a str,
    role: Option<ExecutionRole>,
}

impl<'a> Provisioner<'a> {
    pub fn new(
        services: CloudServices<'a>,
        config: &'a HarnessConfig,
        bucket_name: &'a str,
    ) -> Self {
        Self {
            services,
            config,
            bucket_name,
            role: None,
        }
    }

    /// Provisions every resource in order.
    ///
    /// Returns whether the execution role was already present. Ownership is
    /// recorded as soon as the role step finishes, so [`Self::role`] stays
    /// meaningful for cleanup when a later step fails.
    pub fn prepare(&mut self) -> Result<bool, HarnessError> {
        let artifact = &self.config.artifact_path;
        if !artifact.is_file() {
            return Err(HarnessError::MissingArtifact(artifact.clone()));
        }

        let role = self.ensure_role()?;
        let already_existed = role.already_existed;
        let role_arn = role.arn.clone();

        self.ensure_bucket_with_artifact()?;
        self.deploy_function(&role_arn)?;
        Ok(already_existed)
    }

    pub fn role(&self) -> Option<&ExecutionRole> {
        self.role.as_ref()
    }

    fn ensure_role(&mut self) -> Result<&ExecutionRole, HarnessError> {
        let config = self.config;
        let role = match self.services.identity.get_role(&config.role_name)? {
            Some(arn) => {
                info!(role = %config.role_name, "reusing existing execution role");
                ExecutionRole {
                    name: config.role_name.clone(),
                    arn,
                    already_existed: true,
                }
            }
            None => {
                let arn = self.services.identity.create_role(
                    &config.role_name,
                    &config.role_description,
                    &config.trust_policy,
                )?;
                info!(role = %config.role_name, arn = %arn, "created execution role");
                ExecutionRole {
                    name: config.role_name.clone(),
                    arn,
                    already_existed: false,
                }
            }
        };
        Ok(self.role.insert(role))
    }

    fn ensure_bucket_with_artifact(&self) -> Result<(), HarnessError> {
        let storage = self.services.storage;
        let exists = storage
            .list_buckets()?
            .iter()
            .any(|bucket| bucket == self.bucket_name);
        if exists {
            debug!(bucket = %self.bucket_name, "artifact bucket already exists");
        } else {
            storage.create_bucket(self.bucket_name)?;
            info!(bucket = %self.bucket_name, "created artifact bucket");
        }

        storage.put_object(
            self.bucket_name,
            &self.config.artifact_key,
            &self.config.artifact_path,
        )?;
        info!(
            bucket = %self.bucket_name,
            key = %self.config.artifact_key,
            artifact = %self.config.artifact_path.display(),
            "uploaded deployment artifact"
        );
        Ok(())
    }

    fn deploy_function(&self, role_arn: &str) -> Result<(), HarnessError> {
        let config = self.config;
        let functions = self.services.functions;

        match functions.delete_function(&config.function_name) {
            Ok(()) => info!(function = %config.function_name, "deleted leftover function"),
            Err(error) if error.is_not_found() => {}
            Err(error) => return Err(error.into()),
        }

        let definition = FunctionDefinition {
            name: config.function_name.clone(),
            bucket: self.bucket_name.to_string(),
            key: config.artifact_key.clone(),
            role_arn: role_arn.to_string(),
            entry_point: config.initial_entry_point.clone(),
            memory_size: config.memory_size,
            runtime: config.runtime.clone(),
        };

        let action = format!("create Lambda function {}", config.function_name);
        retry_within(self.services.clock, &config.create_retry, &action, || {
            match functions.create_function(&definition) {
                Ok(()) => Ok(Attempt::Done(())),
                Err(ServiceError::RoleNotPropagated(reason)) => Ok(Attempt::Retry(reason)),
                Err(error) => Err(error.into()),
            }
        })?;
        info!(function = %config.function_name, runtime = %config.runtime, "created function");

        wait_until_ready(
            self.services,
            &config.readiness_wait,
            &config.function_name,
            "creation",
        )
    }
}

/// Polls until the function accepts invocations after a create or update.
pub fn wait_until_ready(
    services: CloudServices<'_>,
    policy: &RetryPolicy,
    function_name: &str,
    after: &str,
) -> Result<(), HarnessError> {
    let action = format!("wait for Lambda function {function_name} to become ready after {after}");
    retry_within(services.clock, policy, &action, || {
        match services.functions.function_status(function_name)? {
            FunctionStatus::Ready => Ok(Attempt::Done(())),
            FunctionStatus::Pending => {
                debug!(function = %function_name, "function not ready yet");
                Ok(Attempt::Retry("function update in progress".to_string()))
            }
            FunctionStatus::Failed(reason) => Err(ServiceError::request(
                "GetFunctionConfiguration",
                format!("function {function_name} failed to become ready: {reason}"),
            )
            .into()),
        }
    })
}
