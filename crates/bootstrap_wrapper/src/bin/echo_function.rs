use bootstrap_wrapper::handlers::echo::EchoFunction;
use bootstrap_wrapper::telemetry::init_tracing;
use bootstrap_wrapper::BootstrapWrapper;
use lambda_runtime::Error;

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();
    BootstrapWrapper::new(EchoFunction).run().await
}
