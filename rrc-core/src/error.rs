//! Errors in the library.
use crate::registry::ResolutionError;
use thiserror::Error;

/// Errors in the library.
#[derive(Error, Debug)]
pub enum RrcError {
    /// A trajectory without waypoints was asked for its next waypoint.
    #[error("Trajectory has no waypoints")]
    EmptySequenceError,

    /// A policy reference could not be resolved in the registry.
    #[error("Failed to resolve policy '{reference}'")]
    PolicyResolutionError {
        /// The dotted reference as given by the user.
        reference: String,

        /// Why the lookup failed.
        #[source]
        source: ResolutionError,
    },

    /// A policy broke the contract, e.g. returned an action outside of the action space.
    #[error("Contract violation: {0}")]
    ContractViolationError(String),

    /// Inconsistent space definition.
    #[error("Invalid space: {0}")]
    SpaceError(String),

    /// No environment is known under the given name.
    #[error("Unknown environment: {0}")]
    UnknownEnvError(String),

    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKeyError(String),

    /// Record value type error.
    #[error("Record value type error: {0}")]
    RecordValueTypeError(String),
}
