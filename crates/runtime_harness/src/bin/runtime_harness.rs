use std::path::{Path, PathBuf};
use std::process::ExitCode;

use aws_sdk_s3::config::Region;
use clap::{Parser, ValueEnum};
use runtime_harness::adapters::aws::{IamIdentity, LambdaFunctions, S3Storage};
use runtime_harness::contract::{
    default_scenarios, DEFAULT_ARTIFACT_PATH, DEFAULT_REGION, DEFAULT_RUNTIME, FUNCTION_NAME,
};
use runtime_harness::report::HarnessReport;
use runtime_harness::retry::SystemClock;
use runtime_harness::{CloudServices, Harness, HarnessConfig};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(about = "Deploy the custom runtime test function and validate it end to end")]
struct Cli {
    /// Zip holding the `bootstrap` executable.
    #[arg(long, env = "RUNTIME_HARNESS_ARTIFACT", default_value = DEFAULT_ARTIFACT_PATH)]
    artifact: PathBuf,
    #[arg(long, env = "RUNTIME_HARNESS_REGION", default_value = DEFAULT_REGION)]
    region: String,
    #[arg(long, env = "RUNTIME_HARNESS_FUNCTION_NAME", default_value = FUNCTION_NAME)]
    function_name: String,
    #[arg(long, env = "RUNTIME_HARNESS_RUNTIME", default_value = DEFAULT_RUNTIME)]
    runtime: String,
    /// Write the JSON run report here.
    #[arg(long, env = "RUNTIME_HARNESS_REPORT")]
    report: Option<PathBuf>,
    #[arg(long, env = "RUNTIME_HARNESS_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let _ = match format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    };
}

fn write_report(path: &Path, report: &HarnessReport) -> Result<(), String> {
    let body = serde_json::to_vec_pretty(report)
        .map_err(|error| format!("failed to serialize report: {error}"))?;
    std::fs::write(path, body)
        .map_err(|error| format!("failed to write report to {}: {error}", path.display()))
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let mut config = HarnessConfig::default()
        .with_artifact_path(&cli.artifact)
        .with_region(&cli.region);
    config.function_name = cli.function_name;
    config.runtime = cli.runtime;

    let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new(config.region.clone()))
        .load()
        .await;
    let identity = IamIdentity::new(aws_sdk_iam::Client::new(&aws_config));
    let storage = S3Storage::new(aws_sdk_s3::Client::new(&aws_config), &config.region);
    let functions = LambdaFunctions::new(aws_sdk_lambda::Client::new(&aws_config));
    let clock = SystemClock;
    let services = CloudServices {
        identity: &identity,
        storage: &storage,
        functions: &functions,
        clock: &clock,
    };

    let harness = Harness::new(services, config);
    let (report, code) = match harness.run(&default_scenarios()) {
        Ok(report) => {
            info!(run_id = %report.run_id, scenarios = report.scenarios.len(), "all scenarios passed");
            (report, ExitCode::SUCCESS)
        }
        Err(failure) => {
            error!(error = %failure, "harness failed");
            (*failure.report, ExitCode::FAILURE)
        }
    };

    if let Some(path) = &cli.report {
        if let Err(message) = write_report(path, &report) {
            error!("{message}");
            return ExitCode::FAILURE;
        }
        info!(path = %path.display(), "wrote run report");
    }
    code
}
