use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const EXECUTION_ROLE_NAME: &str = "runtimesupporttestingrole";
pub const EXECUTION_ROLE_DESCRIPTION: &str = "Test role for CustomRuntimeTests.";
pub const TEST_BUCKET_PREFIX: &str = "runtimesupporttesting-";
pub const FUNCTION_NAME: &str = "CustomRuntimeFunctionTest";
pub const DEPLOYMENT_ZIP_KEY: &str = "CustomRuntimeFunctionTest.zip";
pub const DEFAULT_ARTIFACT_PATH: &str = "dist/CustomRuntimeFunctionTest.zip";
pub const DEFAULT_REGION: &str = "us-west-2";
pub const DEFAULT_RUNTIME: &str = "provided.al2023";
pub const FUNCTION_MEMORY_SIZE: i32 = 512;
pub const INITIAL_ENTRY_POINT: &str = "PingAsync";

/// Message Lambda returns while a freshly created role is still propagating.
pub const ROLE_NOT_PROPAGATED_MESSAGE: &str =
    "The role defined for the function cannot be assumed by Lambda.";

/// HTTP status of a successful synchronous invoke.
pub const INVOKE_SUCCESS_STATUS: i32 = 200;

pub const LAMBDA_ASSUME_ROLE_POLICY: &str = r#"{
  "Version": "2012-10-17",
  "Statement": [
    {
      "Sid": "",
      "Effect": "Allow",
      "Principal": {
        "Service": "lambda.amazonaws.com"
      },
      "Action": "sts:AssumeRole"
    }
  ]
}"#;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRole {
    pub name: String,
    pub arn: String,
    pub already_existed: bool,
}

/// Everything needed to create the function under test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDefinition {
    pub name: String,
    pub bucket: String,
    pub key: String,
    pub role_arn: String,
    pub entry_point: String,
    pub memory_size: i32,
    pub runtime: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FunctionStatus {
    Ready,
    Pending,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationResult {
    pub status_code: i32,
    /// Set when the handler failed even though the invoke call succeeded.
    pub function_error: Option<String>,
    pub payload: Vec<u8>,
}

/// Body of a function-level error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub error_type: String,
    pub error_message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Expectation {
    Success {
        response: String,
    },
    Failure {
        error_type: String,
        error_message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub entry_point: String,
    pub input: Value,
    pub expected: Expectation,
}

impl Scenario {
    pub fn success(
        entry_point: impl Into<String>,
        input: impl Into<Value>,
        response: impl Into<String>,
    ) -> Self {
        Self {
            entry_point: entry_point.into(),
            input: input.into(),
            expected: Expectation::Success {
                response: response.into(),
            },
        }
    }

    pub fn failure(
        entry_point: impl Into<String>,
        input: impl Into<Value>,
        error_type: impl Into<String>,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            entry_point: entry_point.into(),
            input: input.into(),
            expected: Expectation::Failure {
                error_type: error_type.into(),
                error_message: error_message.into(),
            },
        }
    }

    /// The JSON-encoded input sent as the invoke payload.
    pub fn payload(&self) -> Vec<u8> {
        self.input.to_string().into_bytes()
    }
}

/// The fixed matrix run against the deployed artifact, in order.
pub fn default_scenarios() -> Vec<Scenario> {
    vec![
        Scenario::success("ToUpperAsync", "message", "ToUpperAsync-MESSAGE"),
        Scenario::success("PingAsync", "ping", "PingAsync-pong"),
        Scenario::success("HttpsWorksAsync", "", "HttpsWorksAsync-SUCCESS"),
        Scenario::success(
            "HandlerEnvVarAsync",
            "",
            "HandlerEnvVarAsync-HandlerEnvVarAsync",
        ),
        Scenario::failure(
            "AggregateExceptionUnwrappedAsync",
            "",
            "Exception",
            "Exception thrown from an async handler.",
        ),
        Scenario::failure(
            "AggregateExceptionUnwrapped",
            "",
            "Exception",
            "Exception thrown from a synchronous handler.",
        ),
        Scenario::failure(
            "AggregateExceptionNotUnwrappedAsync",
            "",
            "AggregateException",
            "AggregateException thrown from an async handler.",
        ),
        Scenario::failure(
            "AggregateExceptionNotUnwrapped",
            "",
            "AggregateException",
            "AggregateException thrown from a synchronous handler.",
        ),
        Scenario::failure(
            "TooLargeResponseBodyAsync",
            "",
            "Function.ResponseSizeTooLarge",
            "Response payload size (7340060 bytes) exceeded maximum allowed payload size (6291556 bytes).",
        ),
        Scenario::success("LambdaEnvironmentAsync", "", "LambdaEnvironmentAsync-SUCCESS"),
        Scenario::success("LambdaContextBasicAsync", "", "LambdaContextBasicAsync-SUCCESS"),
        Scenario::success("GetPidAsync", "", "GetPidAsync-SUCCESS"),
        Scenario::success("GetTimezoneNameAsync", "", "GetTimezoneNameAsync-UTC"),
    ]
}

/// Per-run bucket name: the fixed prefix plus the run id.
pub fn bucket_name(prefix: &str, run_id: &str) -> String {
    format!("{prefix}{run_id}")
}
