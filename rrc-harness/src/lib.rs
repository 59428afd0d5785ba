//! Validation and evaluation of Real Robot Challenge policy packages.
//!
//! The workspace consists of the following crates:
//!
//! * [rrc-core](../rrc_core/index.html) defines the policy contract, the
//!   environment interface, the policy registry and the evaluator.
//! * [rrc-sim-env](../rrc_sim_env/index.html) provides the simulated TriFinger
//!   environments `trifinger-cube-{push,lift}-sim-{expert,mixed}-v0`.
//! * [rrc-example-policy](../rrc_example_policy/index.html) includes a policy
//!   moving the fingers along a fixed trajectory.
//! * rrc-harness (this crate) validates policy packages in an isolated
//!   environment ([`pipeline`], `rrc-validate`) and provides the command line
//!   a package exposes to the harness ([`host`]).
pub mod config;
pub mod error;
pub mod host;
pub mod install;
pub mod pipeline;
pub mod process;
pub mod settings;

pub use config::{ConfigError, PolicyConfig};
pub use error::HarnessError;
pub use install::{EnvironmentHandle, InstallManager};
pub use pipeline::{ValidationFailure, ValidationPipeline, ValidationReport, ValidationStep};
pub use settings::{CommandTemplate, HarnessConfig};
