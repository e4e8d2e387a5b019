use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{exit, Command};

use clap::{Parser, Subcommand, ValueEnum};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const ARTIFACT_BINARY: &str = "custom_runtime_function";
const ARTIFACT_PACKAGE: &str = "bootstrap_wrapper";
const DEFAULT_ARTIFACT: &str = "dist/CustomRuntimeFunctionTest.zip";

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Task runner for the custom runtime workspace",
    long_about = "Packages the custom runtime test function as a Lambda deployment zip,\n\
                  runs the live validation harness against it, and runs CI checks."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Cross-build the test function and zip it as a `bootstrap` executable
    Package(PackageArgs),
    /// Package, then deploy and validate against a live AWS account
    Integration {
        #[command(flatten)]
        package: PackageArgs,
        /// Region the harness deploys into
        #[arg(long, env = "RUNTIME_HARNESS_REGION")]
        region: Option<String>,
        /// Where to write the JSON run report
        #[arg(long)]
        report: Option<PathBuf>,
        /// Reuse an existing artifact instead of rebuilding it
        #[arg(long)]
        skip_package: bool,
    },
    /// Run CI checks
    Ci {
        #[arg(value_enum, default_value_t = CiJob::Check)]
        job: CiJob,
    },
}

#[derive(clap::Args)]
struct PackageArgs {
    /// Compilation target triple for the Lambda binary
    #[arg(long, default_value = "x86_64-unknown-linux-gnu")]
    target: String,
    #[arg(value_enum, long, default_value_t = BuildProfile::Release)]
    profile: BuildProfile,
    /// Output zip path
    #[arg(long, default_value = DEFAULT_ARTIFACT)]
    output: PathBuf,
}

#[derive(Clone, ValueEnum)]
enum CiJob {
    /// Formatting, clippy, and offline tests
    Check,
    /// Build the deployment zip for the host target
    Package,
    /// Run check + package
    All,
}

#[derive(Clone, Copy, ValueEnum)]
enum BuildProfile {
    Debug,
    Release,
}

impl BuildProfile {
    fn dir_name(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Release => "release",
        }
    }

    fn as_cargo_flag(self) -> Option<&'static str> {
        match self {
            Self::Debug => None,
            Self::Release => Some("--release"),
        }
    }
}

fn step(label: &str) {
    eprintln!("\n=== {label} ===");
}

fn run_cargo(args: &[&str]) -> Result<(), String> {
    run_cargo_with_env(args, &[])
}

fn run_cargo_with_env(args: &[&str], envs: &[(&str, &str)]) -> Result<(), String> {
    eprintln!("+ cargo {}", args.join(" "));
    let status = Command::new("cargo")
        .args(args)
        .envs(envs.iter().copied())
        .status()
        .map_err(|error| format!("failed to execute cargo: {error}"))?;
    if status.success() {
        Ok(())
    } else {
        Err(format!(
            "`cargo {}` exited with {}",
            args.join(" "),
            status.code().map_or("a signal".to_string(), |code| code.to_string())
        ))
    }
}

fn package_artifact(args: &PackageArgs) -> Result<PathBuf, String> {
    ensure_rust_target_installed(&args.target)?;

    step("Build custom runtime function");
    let mut cargo_args = vec![
        "build",
        "-p",
        ARTIFACT_PACKAGE,
        "--target",
        args.target.as_str(),
        "--bin",
        ARTIFACT_BINARY,
    ];
    if let Some(flag) = args.profile.as_cargo_flag() {
        cargo_args.push(flag);
    }
    run_cargo(&cargo_args)?;

    step("Package deployment zip");
    let binary = Path::new("target")
        .join(&args.target)
        .join(args.profile.dir_name())
        .join(ARTIFACT_BINARY);
    if let Some(parent) = args.output.parent() {
        fs::create_dir_all(parent)
            .map_err(|error| format!("failed to create {}: {error}", parent.display()))?;
    }
    write_bootstrap_zip(&binary, &args.output)?;

    eprintln!("\nPackaged artifact:\n- {}", args.output.display());
    Ok(args.output.clone())
}

fn ensure_rust_target_installed(target: &str) -> Result<(), String> {
    let output = match Command::new("rustup")
        .args(["target", "list", "--installed"])
        .output()
    {
        Ok(output) if output.status.success() => output,
        Ok(_) | Err(_) => {
            eprintln!("warning: could not list installed rust targets; continuing without target preflight");
            return Ok(());
        }
    };

    let installed = String::from_utf8_lossy(&output.stdout);
    if installed.lines().any(|line| line.trim() == target) {
        Ok(())
    } else {
        Err(format!(
            "rust target `{target}` is not installed. install it with `rustup target add {target}` and re-run `cargo run -p xtask -- package`"
        ))
    }
}

/// Lambda's custom runtime launches an executable named `bootstrap` from the
/// zip root.
fn write_bootstrap_zip(binary_path: &Path, zip_path: &Path) -> Result<(), String> {
    let binary = fs::read(binary_path).map_err(|error| {
        format!(
            "expected function binary at '{}': {error}",
            binary_path.display()
        )
    })?;
    let file = fs::File::create(zip_path)
        .map_err(|error| format!("failed to create {}: {error}", zip_path.display()))?;

    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o755);
    zip.start_file("bootstrap", options)
        .map_err(|error| format!("failed to start bootstrap entry: {error}"))?;
    zip.write_all(&binary)
        .map_err(|error| format!("failed to write bootstrap entry: {error}"))?;
    zip.finish()
        .map_err(|error| format!("failed to finish deployment zip: {error}"))?;
    Ok(())
}

fn absolute(path: &Path) -> Result<PathBuf, String> {
    std::path::absolute(path)
        .map_err(|error| format!("failed to resolve {}: {error}", path.display()))
}

fn run_integration(
    artifact: &Path,
    region: Option<&str>,
    report: Option<&Path>,
) -> Result<(), String> {
    step("Deploy and validate against AWS");
    // cargo runs the test binary from the package directory.
    let artifact = absolute(artifact)?.to_string_lossy().into_owned();
    let mut envs = vec![("RUNTIME_HARNESS_ARTIFACT", artifact.as_str())];
    if let Some(region) = region {
        envs.push(("RUNTIME_HARNESS_REGION", region));
    }
    let report = report
        .map(|path| absolute(path).map(|path| path.to_string_lossy().into_owned()))
        .transpose()?;
    if let Some(report) = report.as_deref() {
        envs.push(("RUNTIME_HARNESS_REPORT", report));
    }

    run_cargo_with_env(
        &[
            "test",
            "-p",
            "runtime_harness",
            "--test",
            "live_tests",
            "--",
            "--ignored",
            "--nocapture",
        ],
        &envs,
    )
}

fn ci_check() -> Result<(), String> {
    step("Check formatting");
    run_cargo(&["fmt", "--all", "--", "--check"])?;

    step("Clippy");
    run_cargo(&[
        "clippy",
        "--all-targets",
        "--all-features",
        "--",
        "-D",
        "warnings",
    ])?;

    step("Test bootstrap_wrapper");
    run_cargo(&["test", "-p", "bootstrap_wrapper"])?;

    step("Test runtime_harness");
    run_cargo(&["test", "-p", "runtime_harness"])
}

fn ci_package() -> Result<(), String> {
    step("Build deployment binary");
    run_cargo(&["build", "-p", ARTIFACT_PACKAGE, "--bin", ARTIFACT_BINARY])
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Package(args) => package_artifact(&args).map(|_| ()),
        Commands::Integration {
            package,
            region,
            report,
            skip_package,
        } => {
            let artifact = if skip_package {
                Ok(package.output.clone())
            } else {
                package_artifact(&package)
            };
            artifact.and_then(|artifact| {
                run_integration(&artifact, region.as_deref(), report.as_deref())
            })
        }
        Commands::Ci { job } => {
            let result = match job {
                CiJob::Check => ci_check(),
                CiJob::Package => ci_package(),
                CiJob::All => ci_check().and_then(|()| ci_package()),
            };
            if result.is_ok() {
                eprintln!("\nCI job passed.");
            }
            result
        }
    };

    if let Err(message) = result {
        eprintln!("error: {message}");
        exit(1);
    }
}
