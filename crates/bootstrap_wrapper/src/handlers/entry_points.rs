use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use lambda_runtime::Context;

use crate::error::FunctionError;
use crate::handler::CustomHandler;
use crate::handlers::https::{check_https, HttpsClient, ReqwestHttps, HTTPS_CHECK_URL};

/// Environment variable carrying the configured entry point.
pub const ENTRY_POINT_ENV: &str = "_HANDLER";

/// Variables the Lambda platform sets for every custom runtime process.
pub const LAMBDA_ENVIRONMENT_VARIABLES: [&str; 8] = [
    "_HANDLER",
    "AWS_LAMBDA_FUNCTION_NAME",
    "AWS_LAMBDA_FUNCTION_VERSION",
    "AWS_LAMBDA_FUNCTION_MEMORY_SIZE",
    "AWS_LAMBDA_LOG_GROUP_NAME",
    "AWS_LAMBDA_LOG_STREAM_NAME",
    "AWS_LAMBDA_RUNTIME_API",
    "LAMBDA_TASK_ROOT",
];

/// Padding appended by `TooLargeResponseBodyAsync`; with the entry point
/// prefix and JSON quotes the response is 7_340_060 bytes.
pub const OVERSIZED_RESPONSE_PADDING: usize = 7 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryPoint {
    ToUpper,
    Ping,
    HttpsWorks,
    HandlerEnvVar,
    AggregateExceptionUnwrappedAsync,
    AggregateExceptionUnwrapped,
    AggregateExceptionNotUnwrappedAsync,
    AggregateExceptionNotUnwrapped,
    TooLargeResponseBody,
    LambdaEnvironment,
    LambdaContextBasic,
    GetPid,
    GetTimezoneName,
}

impl EntryPoint {
    pub const ALL: [EntryPoint; 13] = [
        Self::ToUpper,
        Self::Ping,
        Self::HttpsWorks,
        Self::HandlerEnvVar,
        Self::AggregateExceptionUnwrappedAsync,
        Self::AggregateExceptionUnwrapped,
        Self::AggregateExceptionNotUnwrappedAsync,
        Self::AggregateExceptionNotUnwrapped,
        Self::TooLargeResponseBody,
        Self::LambdaEnvironment,
        Self::LambdaContextBasic,
        Self::GetPid,
        Self::GetTimezoneName,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ToUpper => "ToUpperAsync",
            Self::Ping => "PingAsync",
            Self::HttpsWorks => "HttpsWorksAsync",
            Self::HandlerEnvVar => "HandlerEnvVarAsync",
            Self::AggregateExceptionUnwrappedAsync => "AggregateExceptionUnwrappedAsync",
            Self::AggregateExceptionUnwrapped => "AggregateExceptionUnwrapped",
            Self::AggregateExceptionNotUnwrappedAsync => "AggregateExceptionNotUnwrappedAsync",
            Self::AggregateExceptionNotUnwrapped => "AggregateExceptionNotUnwrapped",
            Self::TooLargeResponseBody => "TooLargeResponseBodyAsync",
            Self::LambdaEnvironment => "LambdaEnvironmentAsync",
            Self::LambdaContextBasic => "LambdaContextBasicAsync",
            Self::GetPid => "GetPidAsync",
            Self::GetTimezoneName => "GetTimezoneNameAsync",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|entry| entry.as_str() == name)
    }
}

/// Test function whose behaviour is chosen by the configured entry point.
#[derive(Clone)]
pub struct EntryPointFunction {
    entry_point: String,
    environment: BTreeMap<String, String>,
    https: Arc<dyn HttpsClient>,
}

impl fmt::Debug for EntryPointFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryPointFunction")
            .field("entry_point", &self.entry_point)
            .field("environment", &self.environment)
            .finish_non_exhaustive()
    }
}

impl EntryPointFunction {
    pub fn new(entry_point: impl Into<String>, environment: BTreeMap<String, String>) -> Self {
        Self {
            entry_point: entry_point.into(),
            environment,
            https: Arc::new(ReqwestHttps),
        }
    }

    /// Replaces the client used by `HttpsWorksAsync`.
    pub fn with_https_client(mut self, https: Arc<dyn HttpsClient>) -> Self {
        self.https = https;
        self
    }

    /// Snapshot of the process environment, as set up by the platform.
    pub fn from_process_env() -> Self {
        let environment: BTreeMap<String, String> = std::env::vars().collect();
        let entry_point = environment
            .get(ENTRY_POINT_ENV)
            .cloned()
            .unwrap_or_default();
        Self::new(entry_point, environment)
    }

    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    fn respond(
        &self,
        entry: EntryPoint,
        input: &str,
        context: Option<&Context>,
    ) -> Result<String, FunctionError> {
        match entry {
            EntryPoint::ToUpper => Ok(input.to_uppercase()),
            EntryPoint::Ping if input == "ping" => Ok("pong".to_string()),
            EntryPoint::Ping => Err(FunctionError::new(
                "Exception",
                format!("Expected input: ping but received: {input}"),
            )),
            EntryPoint::HttpsWorks => check_https(self.https.as_ref(), HTTPS_CHECK_URL)
                .map(|()| "SUCCESS".to_string())
                .map_err(|message| FunctionError::new("Exception", message)),
            EntryPoint::HandlerEnvVar => Ok(self.variable(ENTRY_POINT_ENV).to_string()),
            EntryPoint::AggregateExceptionUnwrappedAsync => Err(FunctionError::new(
                "Exception",
                "Exception thrown from an async handler.",
            )),
            EntryPoint::AggregateExceptionUnwrapped => Err(FunctionError::new(
                "Exception",
                "Exception thrown from a synchronous handler.",
            )),
            EntryPoint::AggregateExceptionNotUnwrappedAsync => Err(FunctionError::new(
                "AggregateException",
                "AggregateException thrown from an async handler.",
            )),
            EntryPoint::AggregateExceptionNotUnwrapped => Err(FunctionError::new(
                "AggregateException",
                "AggregateException thrown from a synchronous handler.",
            )),
            EntryPoint::TooLargeResponseBody => Ok("A".repeat(OVERSIZED_RESPONSE_PADDING)),
            EntryPoint::LambdaEnvironment => {
                let missing: Vec<&str> = LAMBDA_ENVIRONMENT_VARIABLES
                    .into_iter()
                    .filter(|name| self.variable(name).is_empty())
                    .collect();
                if missing.is_empty() {
                    Ok("SUCCESS".to_string())
                } else {
                    Err(FunctionError::new(
                        "Exception",
                        format!("Missing environment variables: {}", missing.join(", ")),
                    ))
                }
            }
            EntryPoint::LambdaContextBasic => match context {
                Some(context) => check_context(context).map(|()| "SUCCESS".to_string()),
                None => Err(FunctionError::new(
                    "Exception",
                    "Lambda context is not available to a one-argument handler",
                )),
            },
            EntryPoint::GetPid if std::process::id() != 0 => Ok("SUCCESS".to_string()),
            EntryPoint::GetPid => Err(FunctionError::new("Exception", "process id is 0")),
            EntryPoint::GetTimezoneName => Ok(self
                .variable("TZ")
                .trim_start_matches(':')
                .to_string()),
        }
    }

    fn variable(&self, name: &str) -> &str {
        self.environment.get(name).map(String::as_str).unwrap_or("")
    }

    fn dispatch(
        &self,
        input: Option<String>,
        context: Option<&Context>,
    ) -> Result<Option<String>, FunctionError> {
        let Some(entry) = EntryPoint::parse(&self.entry_point) else {
            return Err(FunctionError::new(
                "EntryPointNotFound",
                format!("Unknown entry point: {}", self.entry_point),
            ));
        };
        let body = self.respond(entry, input.as_deref().unwrap_or(""), context)?;
        Ok(Some(format!("{}-{body}", entry.as_str())))
    }
}

/// Every field the runtime loop fills in from the invocation headers and the
/// function configuration must be present.
fn check_context(context: &Context) -> Result<(), FunctionError> {
    let mut missing = Vec::new();
    if context.request_id.is_empty() {
        missing.push("request_id");
    }
    if context.invoked_function_arn.is_empty() {
        missing.push("invoked_function_arn");
    }
    if context.deadline == 0 {
        missing.push("deadline");
    }
    if context.env_config.function_name.is_empty() {
        missing.push("function_name");
    }
    if context.env_config.memory <= 0 {
        missing.push("memory");
    }
    if missing.is_empty() {
        Ok(())
    } else {
        Err(FunctionError::new(
            "Exception",
            format!("Lambda context is missing: {}", missing.join(", ")),
        ))
    }
}

impl CustomHandler for EntryPointFunction {
    fn custom_handler(&self, input: Option<String>) -> Result<Option<String>, FunctionError> {
        self.dispatch(input, None)
    }

    fn base_handler(
        &self,
        input: Option<String>,
        context: &Context,
    ) -> Result<Option<String>, FunctionError> {
        self.dispatch(input, Some(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn platform_environment(entry_point: &str) -> BTreeMap<String, String> {
        let mut environment: BTreeMap<String, String> = LAMBDA_ENVIRONMENT_VARIABLES
            .into_iter()
            .map(|name| (name.to_string(), "set".to_string()))
            .collect();
        environment.insert(ENTRY_POINT_ENV.to_string(), entry_point.to_string());
        environment.insert("TZ".to_string(), ":UTC".to_string());
        environment
    }

    struct Reachable(u16);

    impl HttpsClient for Reachable {
        fn get_status(&self, _url: &str) -> Result<u16, String> {
            Ok(self.0)
        }
    }

    fn function(entry_point: &str) -> EntryPointFunction {
        EntryPointFunction::new(entry_point, platform_environment(entry_point))
            .with_https_client(Arc::new(Reachable(200)))
    }

    fn call(entry_point: &str, input: &str) -> Result<Option<String>, FunctionError> {
        function(entry_point).custom_handler(Some(input.to_string()))
    }

    fn invocation_context() -> Context {
        let config = lambda_runtime::Config {
            function_name: "CustomRuntimeFunctionTest".to_string(),
            memory: 512,
            ..Default::default()
        };

        let mut context = Context::default();
        context.request_id = "8476a536-e9f4-11e8-9739-2dfe598c3fcd".to_string();
        context.invoked_function_arn =
            "arn:aws:lambda:us-west-2:123456789012:function:CustomRuntimeFunctionTest".to_string();
        context.deadline = 1_700_000_030_000;
        context.env_config = Arc::new(config);
        context
    }

    #[test]
    fn entry_point_names_round_trip() {
        for entry in EntryPoint::ALL {
            assert_eq!(EntryPoint::parse(entry.as_str()), Some(entry));
        }
        assert_eq!(EntryPoint::parse("pingasync"), None);
    }

    #[test]
    fn success_entry_points_prefix_their_name() {
        assert_eq!(
            call("ToUpperAsync", "message").expect("to upper succeeds"),
            Some("ToUpperAsync-MESSAGE".to_string())
        );
        assert_eq!(
            call("PingAsync", "ping").expect("ping succeeds"),
            Some("PingAsync-pong".to_string())
        );
        assert_eq!(
            call("HandlerEnvVarAsync", "").expect("handler env var succeeds"),
            Some("HandlerEnvVarAsync-HandlerEnvVarAsync".to_string())
        );
        assert_eq!(
            call("LambdaEnvironmentAsync", "").expect("environment is complete"),
            Some("LambdaEnvironmentAsync-SUCCESS".to_string())
        );
        assert_eq!(
            call("GetTimezoneNameAsync", "").expect("timezone resolves"),
            Some("GetTimezoneNameAsync-UTC".to_string())
        );
    }

    #[test]
    fn exception_entry_points_raise_fixed_errors() {
        let error = call("AggregateExceptionUnwrappedAsync", "").expect_err("must fail");
        assert_eq!(
            error,
            FunctionError::new("Exception", "Exception thrown from an async handler.")
        );

        let error = call("AggregateExceptionNotUnwrapped", "").expect_err("must fail");
        assert_eq!(
            error,
            FunctionError::new(
                "AggregateException",
                "AggregateException thrown from a synchronous handler."
            )
        );
    }

    #[test]
    fn oversized_response_is_7340060_bytes_once_encoded() {
        let response = call("TooLargeResponseBodyAsync", "")
            .expect("handler itself succeeds")
            .expect("response present");
        let encoded = serde_json::to_vec(&response).expect("string serializes");
        assert_eq!(encoded.len(), 7_340_060);
    }

    #[test]
    fn https_entry_point_reports_reachability() {
        assert_eq!(
            call("HttpsWorksAsync", "").expect("endpoint reachable"),
            Some("HttpsWorksAsync-SUCCESS".to_string())
        );

        let error = function("HttpsWorksAsync")
            .with_https_client(Arc::new(Reachable(500)))
            .custom_handler(None)
            .expect_err("server error fails");
        assert_eq!(error.error_type, "Exception");
        assert!(error.error_message.contains("returned status 500"));
    }

    #[test]
    fn context_entry_point_reads_the_invocation_context() {
        let response = function("LambdaContextBasicAsync")
            .base_handler(Some(String::new()), &invocation_context())
            .expect("context is populated");
        assert_eq!(response, Some("LambdaContextBasicAsync-SUCCESS".to_string()));
    }

    #[test]
    fn context_entry_point_names_missing_fields() {
        let error = function("LambdaContextBasicAsync")
            .base_handler(None, &Context::default())
            .expect_err("default context is empty");
        assert_eq!(
            error.error_message,
            "Lambda context is missing: request_id, invoked_function_arn, deadline, function_name, memory"
        );

        let error = call("LambdaContextBasicAsync", "").expect_err("no context");
        assert_eq!(error.error_type, "Exception");
    }

    #[test]
    fn ping_rejects_other_input() {
        let error = call("PingAsync", "pong").expect_err("only ping is accepted");
        assert_eq!(error.error_type, "Exception");
    }

    #[test]
    fn missing_platform_variables_are_reported() {
        let function = EntryPointFunction::new("LambdaEnvironmentAsync", BTreeMap::new());
        let error = function
            .custom_handler(None)
            .expect_err("empty environment fails");
        assert!(error.error_message.contains("AWS_LAMBDA_RUNTIME_API"));
    }

    #[test]
    fn unknown_entry_point_is_an_error() {
        let error = call("DoesNotExist", "").expect_err("unknown entry point");
        assert_eq!(error.error_type, "EntryPointNotFound");
    }
}
