use bootstrap_wrapper::handlers::entry_points::EntryPointFunction;
use bootstrap_wrapper::telemetry::init_tracing;
use bootstrap_wrapper::BootstrapWrapper;
use lambda_runtime::Error;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    let function = EntryPointFunction::from_process_env();
    info!(entry_point = function.entry_point(), "custom runtime function starting");

    BootstrapWrapper::new(function).run().await
}
