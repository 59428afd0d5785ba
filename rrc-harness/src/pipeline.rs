//! Validation of a policy package.
//!
//! The pipeline loads the configuration of the package, installs the package
//! into a fresh isolated environment and runs the `check` subcommand of the
//! installed executable there. Either all steps pass or the first failing
//! step is reported.
use crate::{
    config::PolicyConfig,
    error::HarnessError,
    host::{EXIT_CONTRACT_VIOLATION, EXIT_OK, EXIT_RESOLUTION},
    install::InstallManager,
    process::CommandSpec,
    settings::HarnessConfig,
};
use log::{error, info};
use std::{fmt, path::Path, time::Duration};
use thiserror::Error;

/// Step of the validation pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationStep {
    /// Parse and validate `trifinger.toml`.
    LoadConfig,

    /// Create the isolated environment.
    CreateEnvironment,

    /// Install the package into the environment.
    InstallPackage,

    /// Run the policy check inside the environment.
    CheckPolicy,
}

impl fmt::Display for ValidationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::LoadConfig => "load-config",
            Self::CreateEnvironment => "create-environment",
            Self::InstallPackage => "install-package",
            Self::CheckPolicy => "check-policy",
        })
    }
}

/// Result of a successful validation.
#[derive(Debug, Clone)]
pub struct ValidationReport {
    /// The package configuration.
    pub config: PolicyConfig,

    /// Captured output of the policy check.
    pub check_output: String,
}

/// The step at which a validation failed, and why.
#[derive(Error, Debug)]
#[error("Validation failed at step '{step}': {error}")]
pub struct ValidationFailure {
    /// The failing step.
    pub step: ValidationStep,

    /// The error.
    #[source]
    pub error: HarnessError,
}

impl ValidationFailure {
    /// Whether the environment could not be provisioned.
    ///
    /// Such a failure says nothing about the package.
    pub fn is_provisioning_failure(&self) -> bool {
        matches!(self.error, HarnessError::EnvironmentSetupError { .. })
    }
}

/// Validates policy packages.
#[derive(Debug, Clone)]
pub struct ValidationPipeline {
    manager: InstallManager,
    config_file: String,
    timeout: Option<Duration>,
}

impl ValidationPipeline {
    /// Constructs the pipeline.
    pub fn new(config: HarnessConfig) -> Self {
        Self {
            config_file: config.config_file.clone(),
            timeout: config.timeout(),
            manager: InstallManager::new(config),
        }
    }

    /// Validates the package in `package_dir`.
    ///
    /// The environment is removed before returning.
    pub fn validate(&self, package_dir: &Path) -> Result<ValidationReport, ValidationFailure> {
        let step = |step: ValidationStep| {
            info!("[{}] {}", step, package_dir.display());
            move |error: HarnessError| {
                error!("[{}] {}", step, error);
                ValidationFailure { step, error }
            }
        };

        let fail = step(ValidationStep::LoadConfig);
        let config = PolicyConfig::load(package_dir, &self.config_file)
            .map_err(|e| fail(e.into()))?;
        info!(
            "Task: {}, dataset: {}, policy: {}",
            config.task, config.dataset_type, config.policy
        );

        let fail = step(ValidationStep::CreateEnvironment);
        let env = self.manager.create_environment().map_err(fail)?;

        let fail = step(ValidationStep::InstallPackage);
        self.manager.install(&env, package_dir).map_err(fail)?;

        let fail = step(ValidationStep::CheckPolicy);
        let check = CommandSpec::new(env.bin_dir().join(&config.entry_point).display().to_string())
            .arg("check")
            .arg(config.task.as_str())
            .arg(config.policy.as_str());
        let out = self.manager.run(&env, &check, self.timeout).map_err(fail)?;
        match out.code() {
            Some(EXIT_OK) => {
                info!("All checks passed");
                Ok(ValidationReport {
                    config,
                    check_output: out.output,
                })
            }
            Some(EXIT_RESOLUTION) => Err(fail(HarnessError::PolicyResolutionError {
                output: out.output,
            })),
            Some(EXIT_CONTRACT_VIOLATION) => Err(fail(HarnessError::ContractViolationError {
                output: out.output,
            })),
            _ => Err(fail(HarnessError::PolicyCheckError {
                status: out.status.to_string(),
                output: out.output,
            })),
        }
    }
}
