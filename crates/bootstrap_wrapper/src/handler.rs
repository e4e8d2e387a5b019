use std::sync::Arc;

use lambda_runtime::Context;
use serde_json::Value;

use crate::error::{FunctionError, InvocationError};
use crate::serializer::{JsonSerializer, PayloadSerializer};

pub const HANDLER_NAME: &str = "Handler";

/// A synchronous string transform run for every invocation.
///
/// `None` stands for a JSON `null` payload. Whatever the transform returns as
/// an error is reported to the platform as-is.
pub trait CustomHandler: Send + Sync + 'static {
    fn custom_handler(&self, input: Option<String>) -> Result<Option<String>, FunctionError>;

    /// Two-argument form called by the runtime loop. The context is ignored.
    fn base_handler(
        &self,
        input: Option<String>,
        _context: &Context,
    ) -> Result<Option<String>, FunctionError> {
        self.custom_handler(input)
    }
}

impl<F> CustomHandler for F
where
    F: Fn(Option<String>) -> Result<Option<String>, FunctionError> + Send + Sync + 'static,
{
    fn custom_handler(&self, input: Option<String>) -> Result<Option<String>, FunctionError> {
        self(input)
    }
}

/// Binds a handler to the serializer used for its payloads.
#[derive(Debug)]
pub struct HandlerWrapper<H, S = JsonSerializer> {
    handler: Arc<H>,
    serializer: S,
}

impl<H, S> HandlerWrapper<H, S>
where
    H: CustomHandler,
    S: PayloadSerializer,
{
    pub fn new(handler: Arc<H>, serializer: S) -> Self {
        Self {
            handler,
            serializer,
        }
    }

    pub fn invoke(&self, payload: Value, context: &Context) -> Result<Value, InvocationError> {
        let input = self.serializer.decode(payload)?;
        let response = self.handler.base_handler(input, context)?;
        Ok(self.serializer.encode(response))
    }
}
