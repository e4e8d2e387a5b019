use crate::contract::{FunctionDefinition, FunctionStatus, InvocationResult};
use crate::error::ServiceError;

pub trait FunctionApi {
    /// Fails with `RoleNotPropagated` while the execution role cannot be
    /// assumed yet.
    fn create_function(&self, definition: &FunctionDefinition) -> Result<(), ServiceError>;

    fn delete_function(&self, name: &str) -> Result<(), ServiceError>;

    fn update_entry_point(&self, name: &str, entry_point: &str) -> Result<(), ServiceError>;

    fn function_status(&self, name: &str) -> Result<FunctionStatus, ServiceError>;

    /// Synchronous invoke with a JSON payload.
    fn invoke(&self, name: &str, payload: &[u8]) -> Result<InvocationResult, ServiceError>;
}
