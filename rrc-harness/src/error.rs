//! Errors of the validation pipeline.
use crate::config::ConfigError;
use std::time::Duration;
use thiserror::Error;

/// Errors of the validation pipeline.
///
/// Variants produced by a subprocess carry its captured output.
#[derive(Error, Debug)]
pub enum HarnessError {
    /// The package configuration is missing or invalid.
    #[error(transparent)]
    ConfigError(#[from] ConfigError),

    /// The isolated environment could not be provisioned.
    #[error("Failed to set up the environment: `{command}` exited with {status}")]
    EnvironmentSetupError {
        /// The command line.
        command: String,

        /// Exit status, or a description of why it could not be run.
        status: String,

        /// Captured stdout and stderr.
        output: String,
    },

    /// The package could not be installed into the environment.
    #[error("Failed to install '{package}': exited with {status}")]
    InstallError {
        /// Path of the package.
        package: String,

        /// Exit status.
        status: String,

        /// Captured stdout and stderr.
        output: String,
    },

    /// The policy reference could not be resolved inside the environment.
    #[error("Failed to resolve the policy inside the environment")]
    PolicyResolutionError {
        /// Captured stdout and stderr of the check.
        output: String,
    },

    /// The policy broke the contract.
    #[error("The policy violates the contract")]
    ContractViolationError {
        /// Captured stdout and stderr of the check.
        output: String,
    },

    /// The check failed for another reason.
    #[error("Policy check exited with {status}")]
    PolicyCheckError {
        /// Exit status.
        status: String,

        /// Captured stdout and stderr of the check.
        output: String,
    },

    /// The check did not finish in time and was killed.
    #[error("Policy check did not finish within {0:?}")]
    ValidationTimeoutError(Duration),

    /// A command could not be started.
    #[error("Failed to run `{command}`: {source}")]
    SpawnError {
        /// The command line.
        command: String,

        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

impl HarnessError {
    /// Captured output of the failing subprocess, if any.
    pub fn output(&self) -> Option<&str> {
        match self {
            Self::EnvironmentSetupError { output, .. }
            | Self::InstallError { output, .. }
            | Self::PolicyResolutionError { output }
            | Self::ContractViolationError { output }
            | Self::PolicyCheckError { output, .. } => Some(output),
            _ => None,
        }
    }
}
