//! Adapts a plain string-in/string-out handler to the Lambda custom runtime.
//!
//! A `CustomHandler` only transforms strings. `HandlerWrapper` binds it to a
//! payload serializer, and `BootstrapWrapper` owns the runtime loop that polls
//! the invocation API and feeds each event through that wrapper.

pub mod bootstrap;
pub mod error;
pub mod handler;
pub mod handlers;
pub mod serializer;
pub mod telemetry;
pub mod wrapper;

pub use bootstrap::{Bootstrap, LambdaBootstrap};
pub use error::{FunctionError, InvocationError, SerializationError};
pub use handler::{CustomHandler, HandlerWrapper, HANDLER_NAME};
pub use serializer::{JsonSerializer, PayloadSerializer};
pub use wrapper::BootstrapWrapper;
