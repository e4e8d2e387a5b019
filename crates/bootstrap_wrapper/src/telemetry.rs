use tracing_subscriber::EnvFilter;

/// Installs the log subscriber used inside the Lambda execution environment.
///
/// CloudWatch stamps every line, so no timestamp or colour codes are written.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // A subscriber may already be installed by an embedding binary.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false)
        .without_time()
        .try_init();
}
