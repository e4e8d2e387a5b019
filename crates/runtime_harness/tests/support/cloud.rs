use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use bootstrap_wrapper::handlers::entry_points::{
    EntryPointFunction, ENTRY_POINT_ENV, LAMBDA_ENVIRONMENT_VARIABLES,
};
use bootstrap_wrapper::handlers::https::HttpsClient;
use bootstrap_wrapper::{HandlerWrapper, JsonSerializer};
use lambda_runtime::Context;
use runtime_harness::adapters::{FunctionApi, IdentityApi, StorageApi};
use runtime_harness::contract::{
    ErrorPayload, FunctionDefinition, FunctionStatus, InvocationResult,
    ROLE_NOT_PROPAGATED_MESSAGE,
};
use runtime_harness::ServiceError;
use serde_json::Value;

/// Largest synchronous response the platform returns.
pub const MAX_RESPONSE_BYTES: usize = 6_291_556;

#[derive(Debug, Clone)]
pub struct DeployedFunction {
    pub definition: FunctionDefinition,
    pub entry_point: String,
}

#[derive(Default)]
struct CloudState {
    roles: BTreeMap<String, String>,
    buckets: BTreeMap<String, BTreeMap<String, Vec<u8>>>,
    function: Option<DeployedFunction>,
    role_propagation_failures: usize,
    pending_polls: usize,
    pending_remaining: usize,
    failing: BTreeSet<&'static str>,
    https_unreachable: bool,
    calls: Vec<String>,
}

/// In-memory IAM, S3, and Lambda.
///
/// Invocations run the real entry-point function through the real JSON
/// serializer and wrap failures in the platform's error envelope.
#[derive(Default)]
pub struct FakeCloud {
    state: Mutex<CloudState>,
}

impl FakeCloud {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_role(self, name: &str) -> Self {
        self.state()
            .roles
            .insert(name.to_string(), role_arn(name));
        self
    }

    pub fn with_bucket(self, name: &str, objects: &[&str]) -> Self {
        let contents = objects
            .iter()
            .map(|key| (key.to_string(), b"stale".to_vec()))
            .collect();
        self.state().buckets.insert(name.to_string(), contents);
        self
    }

    /// Fails the next `count` creates as if the role had not propagated.
    pub fn with_role_propagation_failures(self, count: usize) -> Self {
        self.state().role_propagation_failures = count;
        self
    }

    /// Reports `Pending` this many times after every create or update.
    pub fn with_pending_polls(self, count: usize) -> Self {
        self.state().pending_polls = count;
        self
    }

    /// Changes the pending count applied to later creates and updates.
    pub fn set_pending_polls(&self, count: usize) {
        self.state().pending_polls = count;
    }

    /// Makes outbound HTTPS from the function fail.
    pub fn with_https_unreachable(self) -> Self {
        self.state().https_unreachable = true;
        self
    }

    /// Makes every call to `operation` fail with a request error.
    pub fn failing(self, operation: &'static str) -> Self {
        self.state().failing.insert(operation);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    pub fn count_calls(&self, operation: &str) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|call| call.split(' ').next() == Some(operation))
            .count()
    }

    pub fn has_role(&self, name: &str) -> bool {
        self.state().roles.contains_key(name)
    }

    pub fn bucket_names(&self) -> Vec<String> {
        self.state().buckets.keys().cloned().collect()
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.state()
            .buckets
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .cloned()
    }

    pub fn function(&self) -> Option<DeployedFunction> {
        self.state().function.clone()
    }

    fn state(&self) -> MutexGuard<'_, CloudState> {
        self.state.lock().expect("poisoned mutex")
    }

    fn call(&self, operation: &'static str, target: &str) -> Result<MutexGuard<'_, CloudState>, ServiceError> {
        let mut state = self.state();
        state.calls.push(format!("{operation} {target}"));
        if state.failing.contains(operation) {
            return Err(ServiceError::request(operation, "injected failure"));
        }
        Ok(state)
    }
}

pub fn role_arn(name: &str) -> String {
    format!("arn:aws:iam::123456789012:role/{name}")
}

fn platform_environment(function: &DeployedFunction) -> BTreeMap<String, String> {
    let mut environment: BTreeMap<String, String> = LAMBDA_ENVIRONMENT_VARIABLES
        .into_iter()
        .map(|name| (name.to_string(), "set".to_string()))
        .collect();
    environment.insert(ENTRY_POINT_ENV.to_string(), function.entry_point.clone());
    environment.insert(
        "AWS_LAMBDA_FUNCTION_NAME".to_string(),
        function.definition.name.clone(),
    );
    environment.insert(
        "AWS_LAMBDA_FUNCTION_MEMORY_SIZE".to_string(),
        function.definition.memory_size.to_string(),
    );
    environment.insert("TZ".to_string(), ":UTC".to_string());
    environment
}

fn error_envelope(error_type: &str, error_message: &str) -> Vec<u8> {
    serde_json::to_vec(&ErrorPayload {
        error_type: error_type.to_string(),
        error_message: error_message.to_string(),
    })
    .expect("error payload serializes")
}

/// Outbound HTTPS as seen from inside the sandbox.
struct SandboxHttps {
    reachable: bool,
}

impl HttpsClient for SandboxHttps {
    fn get_status(&self, _url: &str) -> Result<u16, String> {
        if self.reachable {
            Ok(200)
        } else {
            Err("connection timed out".to_string())
        }
    }
}

/// Context the runtime loop would build from the invocation headers.
fn invocation_context(function: &DeployedFunction) -> Context {
    let config = lambda_runtime::Config {
        function_name: function.definition.name.clone(),
        memory: function.definition.memory_size,
        version: "$LATEST".to_string(),
        ..Default::default()
    };

    let mut context = Context::default();
    context.request_id = uuid::Uuid::new_v4().to_string();
    context.invoked_function_arn = format!(
        "arn:aws:lambda:us-west-2:123456789012:function:{}",
        function.definition.name
    );
    context.deadline = u64::try_from(chrono::Utc::now().timestamp_millis() + 3_000)
        .expect("deadline is after the epoch");
    context.env_config = Arc::new(config);
    context
}

fn execute(function: &DeployedFunction, payload: &[u8], https_reachable: bool) -> InvocationResult {
    let unhandled = |body: Vec<u8>| InvocationResult {
        status_code: 200,
        function_error: Some("Unhandled".to_string()),
        payload: body,
    };

    let event: Value = match serde_json::from_slice(payload) {
        Ok(event) => event,
        Err(error) => {
            return unhandled(error_envelope("Runtime.InvalidPayload", &error.to_string()))
        }
    };

    let handler = EntryPointFunction::new(
        function.entry_point.clone(),
        platform_environment(function),
    )
    .with_https_client(Arc::new(SandboxHttps {
        reachable: https_reachable,
    }));
    let wrapper = HandlerWrapper::new(Arc::new(handler), JsonSerializer);
    match wrapper.invoke(event, &invocation_context(function)) {
        Ok(response) => {
            let body = serde_json::to_vec(&response).expect("response serializes");
            if body.len() > MAX_RESPONSE_BYTES {
                let message = format!(
                    "Response payload size ({} bytes) exceeded maximum allowed payload size ({MAX_RESPONSE_BYTES} bytes).",
                    body.len()
                );
                unhandled(error_envelope("Function.ResponseSizeTooLarge", &message))
            } else {
                InvocationResult {
                    status_code: 200,
                    function_error: None,
                    payload: body,
                }
            }
        }
        Err(error) => unhandled(error_envelope(error.error_type(), &error.error_message())),
    }
}

impl IdentityApi for FakeCloud {
    fn get_role(&self, name: &str) -> Result<Option<String>, ServiceError> {
        let state = self.call("GetRole", name)?;
        Ok(state.roles.get(name).cloned())
    }

    fn create_role(
        &self,
        name: &str,
        _description: &str,
        trust_policy: &str,
    ) -> Result<String, ServiceError> {
        let mut state = self.call("CreateRole", name)?;
        serde_json::from_str::<Value>(trust_policy)
            .map_err(|error| ServiceError::request("CreateRole", error.to_string()))?;
        if state.roles.contains_key(name) {
            return Err(ServiceError::request("CreateRole", "EntityAlreadyExists"));
        }
        let arn = role_arn(name);
        state.roles.insert(name.to_string(), arn.clone());
        Ok(arn)
    }

    fn delete_role(&self, name: &str) -> Result<(), ServiceError> {
        let mut state = self.call("DeleteRole", name)?;
        match state.roles.remove(name) {
            Some(_) => Ok(()),
            None => Err(ServiceError::not_found("role", name)),
        }
    }
}

impl StorageApi for FakeCloud {
    fn list_buckets(&self) -> Result<Vec<String>, ServiceError> {
        let state = self.call("ListBuckets", "")?;
        Ok(state.buckets.keys().cloned().collect())
    }

    fn create_bucket(&self, name: &str) -> Result<(), ServiceError> {
        let mut state = self.call("CreateBucket", name)?;
        if state.buckets.contains_key(name) {
            return Err(ServiceError::request("CreateBucket", "BucketAlreadyOwnedByYou"));
        }
        state.buckets.insert(name.to_string(), BTreeMap::new());
        Ok(())
    }

    fn put_object(&self, bucket: &str, key: &str, file: &Path) -> Result<(), ServiceError> {
        let mut state = self.call("PutObject", bucket)?;
        let body = std::fs::read(file)
            .map_err(|error| ServiceError::request("PutObject", error.to_string()))?;
        let objects = state
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| ServiceError::not_found("bucket", bucket))?;
        objects.insert(key.to_string(), body);
        Ok(())
    }

    fn delete_object(&self, bucket: &str, key: &str) -> Result<(), ServiceError> {
        let mut state = self.call("DeleteObject", bucket)?;
        let objects = state
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| ServiceError::not_found("bucket", bucket))?;
        objects.remove(key);
        Ok(())
    }

    fn delete_bucket(&self, name: &str) -> Result<(), ServiceError> {
        let mut state = self.call("DeleteBucket", name)?;
        let empty = match state.buckets.get(name) {
            None => return Err(ServiceError::not_found("bucket", name)),
            Some(objects) => objects.is_empty(),
        };
        if !empty {
            return Err(ServiceError::request("DeleteBucket", "BucketNotEmpty"));
        }
        state.buckets.remove(name);
        Ok(())
    }
}

impl FunctionApi for FakeCloud {
    fn create_function(&self, definition: &FunctionDefinition) -> Result<(), ServiceError> {
        let mut state = self.call("CreateFunction", &definition.name)?;
        if state.role_propagation_failures > 0 {
            state.role_propagation_failures -= 1;
            return Err(ServiceError::RoleNotPropagated(
                ROLE_NOT_PROPAGATED_MESSAGE.to_string(),
            ));
        }
        if !state.roles.values().any(|arn| arn == &definition.role_arn) {
            return Err(ServiceError::request("CreateFunction", "role does not exist"));
        }
        let has_code = state
            .buckets
            .get(&definition.bucket)
            .is_some_and(|objects| objects.contains_key(&definition.key));
        if !has_code {
            return Err(ServiceError::request("CreateFunction", "code not found"));
        }
        if state.function.is_some() {
            return Err(ServiceError::request(
                "CreateFunction",
                "ResourceConflictException",
            ));
        }
        state.function = Some(DeployedFunction {
            definition: definition.clone(),
            entry_point: definition.entry_point.clone(),
        });
        state.pending_remaining = state.pending_polls;
        Ok(())
    }

    fn delete_function(&self, name: &str) -> Result<(), ServiceError> {
        let mut state = self.call("DeleteFunction", name)?;
        match state.function.take() {
            Some(_) => Ok(()),
            None => Err(ServiceError::not_found("function", name)),
        }
    }

    fn update_entry_point(&self, name: &str, entry_point: &str) -> Result<(), ServiceError> {
        let mut state = self.call("UpdateFunctionConfiguration", entry_point)?;
        let function = state
            .function
            .as_mut()
            .ok_or_else(|| ServiceError::not_found("function", name))?;
        function.entry_point = entry_point.to_string();
        state.pending_remaining = state.pending_polls;
        Ok(())
    }

    fn function_status(&self, name: &str) -> Result<FunctionStatus, ServiceError> {
        let mut state = self.call("GetFunctionConfiguration", name)?;
        if state.function.is_none() {
            return Err(ServiceError::not_found("function", name));
        }
        if state.pending_remaining > 0 {
            state.pending_remaining -= 1;
            return Ok(FunctionStatus::Pending);
        }
        Ok(FunctionStatus::Ready)
    }

    fn invoke(&self, name: &str, payload: &[u8]) -> Result<InvocationResult, ServiceError> {
        let (function, https_reachable) = {
            let state = self.call("Invoke", name)?;
            let function = state
                .function
                .clone()
                .ok_or_else(|| ServiceError::not_found("function", name))?;
            (function, !state.https_unreachable)
        };
        Ok(execute(&function, payload, https_reachable))
    }
}
