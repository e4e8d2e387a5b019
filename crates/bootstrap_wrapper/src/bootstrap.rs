use std::future::Future;
use std::sync::Arc;

use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;

use crate::handler::{CustomHandler, HandlerWrapper};
use crate::serializer::PayloadSerializer;

/// The poll/invoke/respond loop that drives a wrapped handler.
///
/// `run` returns only when the loop stops, which for the Lambda runtime means
/// an unrecoverable transport failure.
pub trait Bootstrap: Clone {
    fn run<H, S>(self, handler: HandlerWrapper<H, S>) -> impl Future<Output = Result<(), Error>>
    where
        H: CustomHandler,
        S: PayloadSerializer + 'static;
}

/// Runs the handler against the Lambda runtime API through `lambda_runtime`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LambdaBootstrap;

impl Bootstrap for LambdaBootstrap {
    fn run<H, S>(self, handler: HandlerWrapper<H, S>) -> impl Future<Output = Result<(), Error>>
    where
        H: CustomHandler,
        S: PayloadSerializer + 'static,
    {
        let handler = Arc::new(handler);
        async move {
            lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
                let handler = Arc::clone(&handler);
                async move {
                    let (payload, context) = event.into_parts();
                    handler.invoke(payload, &context)
                }
            }))
            .await
        }
    }
}
