//! Policy host of the example package.
use rrc_core::PolicyRegistry;
use rrc_example_policy::{TrajectoryPolicy, TRAJECTORY_POLICY};
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut registry = PolicyRegistry::new();
    if let Err(e) = registry.register::<TrajectoryPolicy>(TRAJECTORY_POLICY) {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }
    rrc_harness::host::run(registry)
}
