//! Service boundaries the harness drives, plus their AWS implementations.

pub mod aws;
pub mod functions;
pub mod identity;
pub mod storage;

use crate::retry::Clock;

pub use functions::FunctionApi;
pub use identity::IdentityApi;
pub use storage::StorageApi;

/// The services one run talks to.
#[derive(Clone, Copy)]
pub struct CloudServices<'a> {
    pub identity: &'a dyn IdentityApi,
    pub storage: &'a dyn StorageApi,
    pub functions: &'a dyn FunctionApi,
    pub clock: &'a dyn Clock,
}
