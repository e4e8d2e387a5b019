use lambda_runtime::Diagnostic;
use thiserror::Error;

/// Error type reported when the invocation payload cannot be decoded.
pub const SERIALIZATION_ERROR_TYPE: &str = "JsonSerializerException";

/// Failure raised by a handler.
///
/// The platform reports `error_type` and `error_message` verbatim as the
/// `errorType` and `errorMessage` fields of the invocation response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{error_type}: {error_message}")]
pub struct FunctionError {
    pub error_type: String,
    pub error_message: String,
}

impl FunctionError {
    pub fn new(error_type: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            error_type: error_type.into(),
            error_message: error_message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("invocation payload must be a JSON string or null: {0}")]
    InvalidPayload(#[source] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum InvocationError {
    #[error(transparent)]
    Function(#[from] FunctionError),
    #[error(transparent)]
    Serialization(#[from] SerializationError),
}

impl InvocationError {
    pub fn error_type(&self) -> &str {
        match self {
            Self::Function(error) => &error.error_type,
            Self::Serialization(_) => SERIALIZATION_ERROR_TYPE,
        }
    }

    pub fn error_message(&self) -> String {
        match self {
            Self::Function(error) => error.error_message.clone(),
            Self::Serialization(error) => error.to_string(),
        }
    }
}

impl From<InvocationError> for Diagnostic {
    fn from(error: InvocationError) -> Self {
        Diagnostic {
            error_type: error.error_type().into(),
            error_message: error.error_message().into(),
        }
    }
}
