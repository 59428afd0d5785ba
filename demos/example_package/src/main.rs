//! A policy package as submitted to the harness.
//!
//! Validate it with
//!
//! ```text
//! cargo run -p rrc-harness --bin rrc-validate -- demos/example_package
//! ```
//!
//! The entry point of the package is the first segment of the policy
//! reference in `trifinger.toml`, so the binary is named
//! `rrc_example_package`.
use anyhow::{anyhow, Result};
use rrc_core::{
    space::{Action, BoxSpace, Observation, ObservationSpace},
    Policy, PolicyBase, PolicyRegistry,
};
use rrc_example_policy::TrajectoryPolicy;
use std::process::ExitCode;

/// Keeps the fingers where they are.
struct HoldPolicy {
    action_space: BoxSpace,
}

impl Policy for HoldPolicy {
    fn reset(&mut self) {}

    fn get_action(&mut self, observation: &Observation) -> Result<Action> {
        let position = observation
            .field("robot_position")
            .ok_or_else(|| anyhow!("observation has no field robot_position"))?;
        Ok(self.action_space.clip(position))
    }
}

impl PolicyBase for HoldPolicy {
    fn build(action_space: &BoxSpace, _: &ObservationSpace, _: usize) -> Result<Self> {
        Ok(Self {
            action_space: action_space.clone(),
        })
    }

    fn is_using_flattened_observations() -> bool {
        false
    }
}

fn registry() -> Result<PolicyRegistry> {
    let mut registry = PolicyRegistry::new();
    registry
        .register::<TrajectoryPolicy>("rrc_example_package.policies.TrajectoryPolicy")?
        .register::<HoldPolicy>("rrc_example_package.policies.HoldPolicy")?;
    Ok(registry)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    match registry() {
        Ok(registry) => rrc_harness::host::run(registry),
        Err(e) => {
            eprintln!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
