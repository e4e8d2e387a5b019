use std::sync::Arc;
use std::thread;

use lambda_runtime::Error;
use tracing::{error, info};

use crate::bootstrap::{Bootstrap, LambdaBootstrap};
use crate::error::FunctionError;
use crate::handler::{CustomHandler, HandlerWrapper, HANDLER_NAME};
use crate::serializer::JsonSerializer;

const BACKGROUND_THREAD_NAME: &str = "bootstrap-wrapper";

/// Owns a handler and runs it under a bootstrap loop.
///
/// Every call to `run` builds a fresh `HandlerWrapper` and bootstrap loop and
/// drops both when the loop stops, whether it stopped cleanly or not.
#[derive(Debug)]
pub struct BootstrapWrapper<H, B = LambdaBootstrap> {
    handler: Arc<H>,
    bootstrap: B,
}

impl<H: CustomHandler> BootstrapWrapper<H> {
    pub fn new(handler: H) -> Self {
        Self::with_bootstrap(handler, LambdaBootstrap)
    }
}

impl<H, B> BootstrapWrapper<H, B>
where
    H: CustomHandler,
    B: Bootstrap,
{
    pub fn with_bootstrap(handler: H, bootstrap: B) -> Self {
        Self {
            handler: Arc::new(handler),
            bootstrap,
        }
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// One-argument form of the handler, without any runtime involved.
    pub fn invoke(&self, input: Option<String>) -> Result<Option<String>, FunctionError> {
        self.handler.custom_handler(input)
    }

    /// Runs the bootstrap loop until it stops.
    pub async fn run(&self) -> Result<(), Error> {
        let handler_wrapper = HandlerWrapper::new(Arc::clone(&self.handler), JsonSerializer);
        let bootstrap = self.bootstrap.clone();

        info!(handler = HANDLER_NAME, "bootstrap loop starting");
        let result = bootstrap.run(handler_wrapper).await;
        match &result {
            Ok(()) => info!(handler = HANDLER_NAME, "bootstrap loop stopped"),
            Err(error) => error!(handler = HANDLER_NAME, error = %error, "bootstrap loop failed"),
        }
        result
    }

    /// Runs the bootstrap loop on a background thread and returns at once.
    ///
    /// Failures are logged on that thread and never reach the caller.
    pub fn start(self)
    where
        B: Send + 'static,
    {
        let spawned = thread::Builder::new()
            .name(BACKGROUND_THREAD_NAME.to_string())
            .spawn(move || {
                let runtime = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(runtime) => runtime,
                    Err(error) => {
                        error!(error = %error, "failed to build runtime for background bootstrap");
                        return;
                    }
                };
                // `run` already logged the outcome.
                let _ = runtime.block_on(self.run());
            });

        if let Err(error) = spawned {
            error!(error = %error, "failed to spawn background bootstrap thread");
        }
    }
}
