//! Live validation of the custom runtime wrapper.
//!
//! One run provisions an execution role, a bucket holding the deployment
//! artifact and the function under test, drives the scenario matrix against
//! that single function, and always tears everything down afterwards.
//! Cloud access goes through the traits in `adapters`, so every step runs
//! against in-memory fakes in tests.

pub mod adapters;
pub mod cleanup;
pub mod config;
pub mod contract;
pub mod error;
pub mod harness;
pub mod provisioner;
pub mod report;
pub mod retry;
pub mod scenarios;

pub use adapters::CloudServices;
pub use config::HarnessConfig;
pub use error::{HarnessError, ServiceError};
pub use harness::{Harness, HarnessFailure};
