use serde_json::Value;
use tracing::{info, warn};

use crate::adapters::CloudServices;
use crate::config::HarnessConfig;
use crate::contract::{
    ErrorPayload, Expectation, InvocationResult, Scenario, INVOKE_SUCCESS_STATUS,
};
use crate::error::HarnessError;
use crate::provisioner::wait_until_ready;
use crate::report::ScenarioRecord;

/// Drives scenarios against the deployed function.
pub struct ScenarioRunner<'a> {
    services: CloudServices<'a>,
    config: &'a HarnessConfig,
}

impl<'a> ScenarioRunner<'a> {
    pub fn new(services: CloudServices<'a>, config: &'a HarnessConfig) -> Self {
        Self { services, config }
    }

    /// Points the function at the scenario's entry point, invokes it once,
    /// and checks the outcome.
    pub fn run_scenario(&self, scenario: &Scenario) -> Result<(), HarnessError> {
        let name = &self.config.function_name;
        self.services
            .functions
            .update_entry_point(name, &scenario.entry_point)?;
        let after = format!("switching to entry point {}", scenario.entry_point);
        wait_until_ready(self.services, &self.config.readiness_wait, name, &after)?;

        let result = self.services.functions.invoke(name, &scenario.payload())?;
        check_outcome(scenario, &result)
    }

    /// Runs scenarios in order, stopping at the first failure.
    ///
    /// Every scenario attempted is appended to `records`, including the one
    /// that failed.
    pub fn run_all(
        &self,
        scenarios: &[Scenario],
        records: &mut Vec<ScenarioRecord>,
    ) -> Result<(), HarnessError> {
        for scenario in scenarios {
            let outcome = self.run_scenario(scenario);
            records.push(ScenarioRecord {
                entry_point: scenario.entry_point.clone(),
                expected: scenario.expected.clone(),
                passed: outcome.is_ok(),
                failure: outcome.as_ref().err().map(ToString::to_string),
            });
            match outcome {
                Ok(()) => info!(entry_point = %scenario.entry_point, "scenario passed"),
                Err(error) => {
                    warn!(entry_point = %scenario.entry_point, error = %error, "scenario failed");
                    return Err(error);
                }
            }
        }
        Ok(())
    }
}

/// Exact-match check of an invocation result against a scenario.
pub fn check_outcome(scenario: &Scenario, result: &InvocationResult) -> Result<(), HarnessError> {
    let entry_point = scenario.entry_point.as_str();
    if result.status_code != INVOKE_SUCCESS_STATUS {
        return Err(HarnessError::assertion(
            entry_point,
            format!(
                "expected status {INVOKE_SUCCESS_STATUS}, got {}",
                result.status_code
            ),
        ));
    }

    match &scenario.expected {
        Expectation::Success { response } => {
            if let Some(function_error) = &result.function_error {
                return Err(HarnessError::assertion(
                    entry_point,
                    format!(
                        "expected success, got function error {function_error}: {}",
                        String::from_utf8_lossy(&result.payload)
                    ),
                ));
            }
            let actual: Value = serde_json::from_slice(&result.payload).map_err(|error| {
                HarnessError::assertion(entry_point, format!("response is not JSON: {error}"))
            })?;
            match actual.as_str() {
                Some(actual) if actual == response.as_str() => Ok(()),
                _ => Err(HarnessError::assertion(
                    entry_point,
                    format!("expected response {response:?}, got {actual}"),
                )),
            }
        }
        Expectation::Failure {
            error_type,
            error_message,
        } => {
            if result.function_error.is_none() {
                return Err(HarnessError::assertion(
                    entry_point,
                    format!(
                        "expected {error_type} failure, got success: {}",
                        String::from_utf8_lossy(&result.payload)
                    ),
                ));
            }
            let actual: ErrorPayload = serde_json::from_slice(&result.payload).map_err(|error| {
                HarnessError::assertion(entry_point, format!("error body is malformed: {error}"))
            })?;
            if &actual.error_type != error_type {
                return Err(HarnessError::assertion(
                    entry_point,
                    format!(
                        "expected error type {error_type:?}, got {:?}",
                        actual.error_type
                    ),
                ));
            }
            if &actual.error_message != error_message {
                return Err(HarnessError::assertion(
                    entry_point,
                    format!(
                        "expected error message {error_message:?}, got {:?}",
                        actual.error_message
                    ),
                ));
            }
            Ok(())
        }
    }
}
