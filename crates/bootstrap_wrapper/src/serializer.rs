use serde_json::Value;

use crate::error::SerializationError;

/// Converts between the invocation payload and the handler's string form.
pub trait PayloadSerializer: Send + Sync {
    fn decode(&self, payload: Value) -> Result<Option<String>, SerializationError>;

    fn encode(&self, response: Option<String>) -> Value;
}

/// JSON on both sides: the payload must be a JSON string (or null), and the
/// returned string is emitted as a JSON string literal.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl PayloadSerializer for JsonSerializer {
    fn decode(&self, payload: Value) -> Result<Option<String>, SerializationError> {
        serde_json::from_value(payload).map_err(SerializationError::InvalidPayload)
    }

    fn encode(&self, response: Option<String>) -> Value {
        response.map(Value::String).unwrap_or(Value::Null)
    }
}
