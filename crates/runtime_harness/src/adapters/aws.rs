use std::future::Future;
use std::path::Path;

use aws_sdk_iam::error::DisplayErrorContext;
use aws_sdk_lambda::primitives::Blob;
use aws_sdk_lambda::types::{FunctionCode, LastUpdateStatus, Runtime, State};
use aws_sdk_s3::error::ProvideErrorMetadata;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};

use crate::adapters::{FunctionApi, IdentityApi, StorageApi};
use crate::contract::{
    FunctionDefinition, FunctionStatus, InvocationResult, ROLE_NOT_PROPAGATED_MESSAGE,
};
use crate::error::ServiceError;

/// S3 reports a missing bucket with this message on some paths that carry no
/// `NoSuchBucket` code.
const MISSING_BUCKET_MESSAGE: &str = "The specified bucket does not exist";

/// Region whose buckets must be created without a location constraint.
const DEFAULT_BUCKET_REGION: &str = "us-east-1";

/// Drives an SDK future from the synchronous adapter traits.
///
/// Must be called from inside a multi-threaded tokio runtime.
fn block_on<F: Future>(future: F) -> F::Output {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}

fn describe<E: std::error::Error + 'static>(error: &E) -> String {
    DisplayErrorContext(error).to_string()
}

#[derive(Debug, Clone)]
pub struct IamIdentity {
    client: aws_sdk_iam::Client,
}

impl IamIdentity {
    pub fn new(client: aws_sdk_iam::Client) -> Self {
        Self { client }
    }
}

impl IdentityApi for IamIdentity {
    fn get_role(&self, name: &str) -> Result<Option<String>, ServiceError> {
        match block_on(self.client.get_role().role_name(name).send()) {
            Ok(output) => Ok(output.role().map(|role| role.arn().to_string())),
            Err(error)
                if error
                    .as_service_error()
                    .is_some_and(|service| service.is_no_such_entity_exception()) =>
            {
                Ok(None)
            }
            Err(error) => Err(ServiceError::request("GetRole", describe(&error))),
        }
    }

    fn create_role(
        &self,
        name: &str,
        description: &str,
        trust_policy: &str,
    ) -> Result<String, ServiceError> {
        let output = block_on(
            self.client
                .create_role()
                .role_name(name)
                .description(description)
                .assume_role_policy_document(trust_policy)
                .send(),
        )
        .map_err(|error| ServiceError::request("CreateRole", describe(&error)))?;

        output
            .role()
            .map(|role| role.arn().to_string())
            .ok_or_else(|| ServiceError::request("CreateRole", "response carried no role"))
    }

    fn delete_role(&self, name: &str) -> Result<(), ServiceError> {
        match block_on(self.client.delete_role().role_name(name).send()) {
            Ok(_) => Ok(()),
            Err(error)
                if error
                    .as_service_error()
                    .is_some_and(|service| service.is_no_such_entity_exception()) =>
            {
                Err(ServiceError::not_found("role", name))
            }
            Err(error) => Err(ServiceError::request("DeleteRole", describe(&error))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct S3Storage {
    client: aws_sdk_s3::Client,
    region: String,
}

impl S3Storage {
    pub fn new(client: aws_sdk_s3::Client, region: impl Into<String>) -> Self {
        Self {
            client,
            region: region.into(),
        }
    }

    fn bucket_configuration(&self) -> Option<CreateBucketConfiguration> {
        if self.region == DEFAULT_BUCKET_REGION {
            return None;
        }
        Some(
            CreateBucketConfiguration::builder()
                .location_constraint(BucketLocationConstraint::from(self.region.as_str()))
                .build(),
        )
    }
}

fn is_missing_bucket<E: ProvideErrorMetadata>(error: &E) -> bool {
    error.code() == Some("NoSuchBucket")
        || error
            .message()
            .is_some_and(|message| message.contains(MISSING_BUCKET_MESSAGE))
}

impl StorageApi for S3Storage {
    fn list_buckets(&self) -> Result<Vec<String>, ServiceError> {
        let output = block_on(self.client.list_buckets().send())
            .map_err(|error| ServiceError::request("ListBuckets", describe(&error)))?;
        Ok(output
            .buckets()
            .iter()
            .filter_map(|bucket| bucket.name().map(str::to_string))
            .collect())
    }

    fn create_bucket(&self, name: &str) -> Result<(), ServiceError> {
        block_on(
            self.client
                .create_bucket()
                .bucket(name)
                .set_create_bucket_configuration(self.bucket_configuration())
                .send(),
        )
        .map(|_| ())
        .map_err(|error| ServiceError::request("CreateBucket", describe(&error)))
    }

    fn put_object(&self, bucket: &str, key: &str, file: &Path) -> Result<(), ServiceError> {
        block_on(async {
            let body = ByteStream::from_path(file).await.map_err(|error| {
                ServiceError::request(
                    "PutObject",
                    format!("failed to read {}: {error}", file.display()),
                )
            })?;
            self.client
                .put_object()
                .bucket(bucket)
                .key(key)
                .body(body)
                .send()
                .await
                .map(|_| ())
                .map_err(|error| ServiceError::request("PutObject", describe(&error)))
        })
    }

    fn delete_object(&self, bucket: &str, key: &str) -> Result<(), ServiceError> {
        match block_on(self.client.delete_object().bucket(bucket).key(key).send()) {
            Ok(_) => Ok(()),
            Err(error) if error.as_service_error().is_some_and(is_missing_bucket) => {
                Err(ServiceError::not_found("bucket", bucket))
            }
            Err(error) => Err(ServiceError::request("DeleteObject", describe(&error))),
        }
    }

    fn delete_bucket(&self, name: &str) -> Result<(), ServiceError> {
        match block_on(self.client.delete_bucket().bucket(name).send()) {
            Ok(_) => Ok(()),
            Err(error) if error.as_service_error().is_some_and(is_missing_bucket) => {
                Err(ServiceError::not_found("bucket", name))
            }
            Err(error) => Err(ServiceError::request("DeleteBucket", describe(&error))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LambdaFunctions {
    client: aws_sdk_lambda::Client,
}

impl LambdaFunctions {
    pub fn new(client: aws_sdk_lambda::Client) -> Self {
        Self { client }
    }
}

impl FunctionApi for LambdaFunctions {
    fn create_function(&self, definition: &FunctionDefinition) -> Result<(), ServiceError> {
        let code = FunctionCode::builder()
            .s3_bucket(&definition.bucket)
            .s3_key(&definition.key)
            .build();
        let request = self
            .client
            .create_function()
            .function_name(&definition.name)
            .runtime(Runtime::from(definition.runtime.as_str()))
            .role(&definition.role_arn)
            .handler(&definition.entry_point)
            .memory_size(definition.memory_size)
            .code(code);

        match block_on(request.send()) {
            Ok(_) => Ok(()),
            Err(error) => {
                let service = error.as_service_error();
                let role_not_ready = service.is_some_and(|service| {
                    service.is_invalid_parameter_value_exception()
                        && service.message() == Some(ROLE_NOT_PROPAGATED_MESSAGE)
                });
                if role_not_ready {
                    Err(ServiceError::RoleNotPropagated(
                        ROLE_NOT_PROPAGATED_MESSAGE.to_string(),
                    ))
                } else {
                    Err(ServiceError::request("CreateFunction", describe(&error)))
                }
            }
        }
    }

    fn delete_function(&self, name: &str) -> Result<(), ServiceError> {
        match block_on(self.client.delete_function().function_name(name).send()) {
            Ok(_) => Ok(()),
            Err(error)
                if error
                    .as_service_error()
                    .is_some_and(|service| service.is_resource_not_found_exception()) =>
            {
                Err(ServiceError::not_found("function", name))
            }
            Err(error) => Err(ServiceError::request("DeleteFunction", describe(&error))),
        }
    }

    fn update_entry_point(&self, name: &str, entry_point: &str) -> Result<(), ServiceError> {
        block_on(
            self.client
                .update_function_configuration()
                .function_name(name)
                .handler(entry_point)
                .send(),
        )
        .map(|_| ())
        .map_err(|error| ServiceError::request("UpdateFunctionConfiguration", describe(&error)))
    }

    fn function_status(&self, name: &str) -> Result<FunctionStatus, ServiceError> {
        let output = match block_on(
            self.client
                .get_function_configuration()
                .function_name(name)
                .send(),
        ) {
            Ok(output) => output,
            Err(error)
                if error
                    .as_service_error()
                    .is_some_and(|service| service.is_resource_not_found_exception()) =>
            {
                return Err(ServiceError::not_found("function", name));
            }
            Err(error) => {
                return Err(ServiceError::request(
                    "GetFunctionConfiguration",
                    describe(&error),
                ))
            }
        };

        let reason = || {
            output
                .last_update_status_reason()
                .or(output.state_reason())
                .unwrap_or("no reason given")
                .to_string()
        };
        let status = match (output.state(), output.last_update_status()) {
            (Some(State::Failed), _) | (_, Some(LastUpdateStatus::Failed)) => {
                FunctionStatus::Failed(reason())
            }
            (Some(State::Active), None | Some(LastUpdateStatus::Successful)) => {
                FunctionStatus::Ready
            }
            _ => FunctionStatus::Pending,
        };
        Ok(status)
    }

    fn invoke(&self, name: &str, payload: &[u8]) -> Result<InvocationResult, ServiceError> {
        let output = block_on(
            self.client
                .invoke()
                .function_name(name)
                .payload(Blob::new(payload))
                .send(),
        )
        .map_err(|error| ServiceError::request("Invoke", describe(&error)))?;

        Ok(InvocationResult {
            status_code: output.status_code(),
            function_error: output.function_error().map(str::to_string),
            payload: output
                .payload()
                .map(|blob| blob.as_ref().to_vec())
                .unwrap_or_default(),
        })
    }
}
