use crate::error::FunctionError;
use crate::handler::CustomHandler;

/// Returns its input unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoFunction;

impl CustomHandler for EchoFunction {
    fn custom_handler(&self, input: Option<String>) -> Result<Option<String>, FunctionError> {
        Ok(input)
    }
}
