//! Validates a policy package.
//!
//! Reads `trifinger.toml` of the package, installs the package into a fresh
//! isolated environment and checks the configured policy there.
use anyhow::Result;
use clap::Parser;
use log::{error, info};
use rrc_harness::{HarnessConfig, ValidationPipeline};
use std::{path::PathBuf, process::ExitCode};

/// Exit code if the package failed validation.
const EXIT_INVALID: u8 = 1;

/// Exit code if the environment could not be provisioned.
const EXIT_PROVISIONING: u8 = 2;

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Directory of the package
    #[arg(default_value = ".")]
    package_dir: PathBuf,

    /// Print the full error and the output of the failing command
    #[arg(short, long, default_value_t = false)]
    verbose: bool,

    /// Harness settings (YAML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Timeout of the policy check in seconds, 0 disables it
    #[arg(long)]
    timeout: Option<u64>,

    /// Parent directory of the isolated environment
    #[arg(long)]
    workspace_dir: Option<PathBuf>,
}

fn harness_config(args: &Args) -> Result<HarnessConfig> {
    let mut config = match &args.config {
        Some(path) => HarnessConfig::load(path)?,
        None => HarnessConfig::default(),
    };
    if let Some(secs) = args.timeout {
        config = config.timeout_secs((secs > 0).then_some(secs));
    }
    if let Some(dir) = &args.workspace_dir {
        config = config.workspace_dir(dir);
    }
    Ok(config)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = match harness_config(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load harness settings: {:#}", e);
            return ExitCode::from(EXIT_PROVISIONING);
        }
    };

    match ValidationPipeline::new(config).validate(&args.package_dir) {
        Ok(report) => {
            info!(
                "{}: all checks passed ({})",
                args.package_dir.display(),
                report.config.policy
            );
            ExitCode::SUCCESS
        }
        Err(failure) => {
            let code = if failure.is_provisioning_failure() {
                EXIT_PROVISIONING
            } else {
                EXIT_INVALID
            };
            if args.verbose {
                if let Some(output) = failure.error.output() {
                    eprintln!("{}", output.trim_end());
                }
                eprintln!("Error: {:?}", anyhow::Error::new(failure));
            } else {
                eprintln!("Error: {}", failure);
            }
            ExitCode::from(code)
        }
    }
}
