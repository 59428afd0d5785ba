//! Command line of a policy package.
//!
//! A policy package ships an executable whose `main` registers the policies
//! of the package and hands over to [`run`]:
//!
//! ```ignore
//! fn main() -> std::process::ExitCode {
//!     env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
//!     let mut registry = PolicyRegistry::new();
//!     registry.register::<MyPolicy>("my_package.policies.MyPolicy").unwrap();
//!     rrc_harness::host::run(registry)
//! }
//! ```
//!
//! The executable then understands the subcommands `check` (used by the
//! validation pipeline inside the isolated environment), `evaluate` and
//! `list`. The exit code of `check` tells the pipeline why a check failed,
//! see the `EXIT_*` constants.
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{error, info};
use rand::{rngs::SmallRng, SeedableRng};
use rrc_core::{
    contract::check_policy, error::RrcError, space::Action, DefaultEvaluator, Env,
    EvaluationReport, Evaluator, PolicyRegistry,
};
use rrc_sim_env::{SimEnvConfig, Task};
use std::{ffi::OsString, fmt, fs, path::PathBuf, process::ExitCode};

/// All checks passed.
pub const EXIT_OK: i32 = 0;

/// Failure not covered by the other codes.
pub const EXIT_FAILURE: i32 = 1;

/// Invalid command line.
pub const EXIT_USAGE: i32 = 2;

/// The policy reference could not be resolved.
pub const EXIT_RESOLUTION: i32 = 3;

/// The policy violates the contract.
pub const EXIT_CONTRACT_VIOLATION: i32 = 4;

/// Default environment of `evaluate`.
pub const DEFAULT_ENV_NAME: &str = "trifinger-cube-push-sim-expert-v0";

#[derive(Parser, Debug)]
#[command(version, about = "Checks and evaluates the policies of this package")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Checks that a policy can be loaded and returns valid actions
    Check {
        /// Task (push, lift)
        task: Task,

        /// Policy reference, e.g. 'package.module.Class'
        policy_class: String,
    },

    /// Evaluates a policy in simulation
    Evaluate {
        /// Policy reference, e.g. 'package.module.Class'
        policy_class: String,

        /// Name of the environment
        #[arg(long, default_value = DEFAULT_ENV_NAME)]
        env_name: String,

        /// Disable visualization of the environment
        #[arg(long, default_value_t = false)]
        no_visualization: bool,

        /// Number of episodes to run
        #[arg(long, default_value_t = 64)]
        n_episodes: usize,

        /// Provide observations as named fields instead of a flat vector
        #[arg(long, default_value_t = false)]
        structured_observations: bool,

        /// Save results to a JSON file
        #[arg(long, value_name = "FILENAME")]
        output: Option<PathBuf>,

        /// Base seed of the episodes
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },

    /// Lists the registered policies
    List,
}

/// Step of the in-environment policy check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStep {
    /// Look up the policy in the registry.
    ResolvePolicy,

    /// Construct the simulated environment.
    CreateEnv,

    /// Construct the policy.
    BuildPolicy,

    /// Reset the policy and check its action for a random observation.
    GetAction,
}

impl fmt::Display for CheckStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ResolvePolicy => "resolve-policy",
            Self::CreateEnv => "create-env",
            Self::BuildPolicy => "build-policy",
            Self::GetAction => "get-action",
        })
    }
}

/// Failure of [`check_policy_class`].
#[derive(Debug)]
pub struct CheckFailure {
    /// The failing step.
    pub step: CheckStep,

    /// Why it failed.
    pub error: anyhow::Error,
}

impl fmt::Display for CheckFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Check failed at step '{}': {:#}", self.step, self.error)
    }
}

impl std::error::Error for CheckFailure {}

impl CheckFailure {
    /// Exit code reported to the validation pipeline.
    pub fn exit_code(&self) -> i32 {
        exit_code(&self.error)
    }
}

fn fail(step: CheckStep) -> impl FnOnce(anyhow::Error) -> CheckFailure {
    move |error| CheckFailure { step, error }
}

fn exit_code(error: &anyhow::Error) -> i32 {
    match error.downcast_ref::<RrcError>() {
        Some(RrcError::PolicyResolutionError { .. }) => EXIT_RESOLUTION,
        Some(RrcError::ContractViolationError(_)) => EXIT_CONTRACT_VIOLATION,
        _ => EXIT_FAILURE,
    }
}

/// Checks the policy registered under `reference` against the simulated
/// environment of `task`.
///
/// Returns the action the policy produced for a random observation.
pub fn check_policy_class(
    registry: &PolicyRegistry,
    task: Task,
    reference: &str,
) -> Result<Action, CheckFailure> {
    let entry = registry
        .load(reference)
        .map_err(|e| fail(CheckStep::ResolvePolicy)(e.into()))?;
    let flatten_obs = entry.is_using_flattened_observations();
    if flatten_obs {
        info!("Using flattened observations");
    } else {
        info!("Using structured observations");
    }

    let env = SimEnvConfig::default()
        .name(task.sim_env_name())
        .flatten_obs(flatten_obs)
        .visualization(false)
        .build()
        .map_err(fail(CheckStep::CreateEnv))?;
    let mut rng = SmallRng::from_entropy();
    let observation = env.observation_space().sample(&mut rng);

    let mut policy = entry
        .build(
            env.action_space(),
            env.observation_space(),
            env.episode_length(),
        )
        .map_err(fail(CheckStep::BuildPolicy))?;

    let action = check_policy(policy.as_mut(), env.action_space(), &observation)
        .map_err(|e| fail(CheckStep::GetAction)(e.into()))?;
    info!("Policy {} passed all checks for task {}", reference, task);
    Ok(action)
}

/// Options of [`evaluate_policy_class`].
#[derive(Debug, Clone)]
pub struct EvaluateOptions {
    /// Name of the environment.
    pub env_name: String,

    /// Whether the environment is rendered.
    pub visualization: bool,

    /// Number of episodes.
    pub n_episodes: usize,

    /// Whether observations are flattened.
    pub flatten_obs: bool,

    /// Base seed of the episodes.
    pub seed: u64,
}

impl Default for EvaluateOptions {
    fn default() -> Self {
        Self {
            env_name: DEFAULT_ENV_NAME.to_string(),
            visualization: true,
            n_episodes: 64,
            flatten_obs: true,
            seed: 0,
        }
    }
}

/// Evaluates the policy registered under `reference`.
pub fn evaluate_policy_class(
    registry: &PolicyRegistry,
    reference: &str,
    opts: &EvaluateOptions,
) -> Result<EvaluationReport> {
    let entry = registry.load(reference)?;
    let env = SimEnvConfig::default()
        .name(opts.env_name.clone())
        .flatten_obs(opts.flatten_obs)
        .visualization(opts.visualization)
        .seed(opts.seed)
        .build()?;
    let mut policy = entry.build(
        env.action_space(),
        env.observation_space(),
        env.episode_length(),
    )?;
    let mut evaluator = DefaultEvaluator::new(env, opts.n_episodes)?;
    evaluator.evaluate(policy.as_mut())
}

fn execute(registry: &PolicyRegistry, command: Command) -> i32 {
    match command {
        Command::Check { task, policy_class } => {
            match check_policy_class(registry, task, &policy_class) {
                Ok(_) => EXIT_OK,
                Err(e) => {
                    error!("{}", e);
                    e.exit_code()
                }
            }
        }
        Command::Evaluate {
            policy_class,
            env_name,
            no_visualization,
            n_episodes,
            structured_observations,
            output,
            seed,
        } => {
            let opts = EvaluateOptions {
                env_name,
                visualization: !no_visualization,
                n_episodes,
                flatten_obs: !structured_observations,
                seed,
            };
            let result = evaluate_policy_class(registry, &policy_class, &opts).and_then(|report| {
                let json = report.to_json()?;
                println!("Evaluation result:");
                println!("{}", json);
                if let Some(path) = output {
                    fs::write(&path, &json)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                }
                Ok(())
            });
            match result {
                Ok(()) => EXIT_OK,
                Err(e) => {
                    error!("Evaluation failed: {:#}", e);
                    exit_code(&e)
                }
            }
        }
        Command::List => {
            for reference in registry.references() {
                println!("{}", reference);
            }
            EXIT_OK
        }
    }
}

/// Runs the command line with the given arguments, the first one being the
/// program name. Returns the exit code.
pub fn run_from<I, T>(registry: &PolicyRegistry, args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match Args::try_parse_from(args) {
        Ok(args) => execute(registry, args.command),
        Err(e) => {
            // Help and version are reported as errors with exit code 0.
            let _ = e.print();
            e.exit_code()
        }
    }
}

/// Runs the command line of the process.
pub fn run(registry: PolicyRegistry) -> ExitCode {
    let code = run_from(&registry, std::env::args_os());
    ExitCode::from(u8::try_from(code).unwrap_or(EXIT_FAILURE as u8))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rrc_core::{
        dummy::ConstantPolicy,
        space::{BoxSpace, Observation, ObservationSpace},
        Policy, PolicyBase,
    };

    #[test]
    fn test_check_step_names() {
        assert_eq!(CheckStep::ResolvePolicy.to_string(), "resolve-policy");
        assert_eq!(CheckStep::GetAction.to_string(), "get-action");
    }

    #[test]
    fn test_usage_error() {
        let registry = PolicyRegistry::new();
        assert_eq!(run_from(&registry, ["host", "check", "drop", "a.b.C"]), EXIT_USAGE);
        assert_eq!(run_from(&registry, ["host"]), EXIT_USAGE);
    }

    #[test]
    fn test_unknown_policy_exit_code() {
        let registry = PolicyRegistry::new();
        assert_eq!(
            run_from(&registry, ["host", "check", "push", "a.b.C"]),
            EXIT_RESOLUTION
        );
        assert_eq!(
            run_from(&registry, ["host", "evaluate", "a.b.C", "--n-episodes", "1"]),
            EXIT_RESOLUTION
        );
    }

    #[test]
    fn test_conforming_policy_passes() {
        let mut registry = PolicyRegistry::new();
        registry
            .register::<ConstantPolicy>("tests.constant.ConstantPolicy")
            .unwrap();
        let code = run_from(
            &registry,
            ["host", "check", "lift", "tests.constant.ConstantPolicy"],
        );
        assert_eq!(code, EXIT_OK);
    }

    struct AboveBounds(Action);

    impl Policy for AboveBounds {
        fn reset(&mut self) {}

        fn get_action(&mut self, _: &Observation) -> Result<Action> {
            Ok(self.0.clone())
        }
    }

    impl PolicyBase for AboveBounds {
        fn build(action_space: &BoxSpace, _: &ObservationSpace, _: usize) -> Result<Self> {
            Ok(Self(action_space.high() + 1.0))
        }
    }

    struct NeedsStructured;

    impl Policy for NeedsStructured {
        fn reset(&mut self) {}

        fn get_action(&mut self, observation: &Observation) -> Result<Action> {
            let position = observation
                .field("robot_position")
                .ok_or_else(|| anyhow::anyhow!("no robot_position"))?;
            Ok(position.clone())
        }
    }

    impl PolicyBase for NeedsStructured {
        fn build(_: &BoxSpace, observation_space: &ObservationSpace, _: usize) -> Result<Self> {
            anyhow::ensure!(!observation_space.is_flat(), "expected structured observations");
            Ok(Self)
        }

        fn is_using_flattened_observations() -> bool {
            false
        }
    }

    #[test]
    fn test_out_of_bounds_action_is_a_contract_violation() {
        let mut registry = PolicyRegistry::new();
        registry.register::<AboveBounds>("tests.bad.AboveBounds").unwrap();
        let err = check_policy_class(&registry, Task::Push, "tests.bad.AboveBounds").unwrap_err();
        assert_eq!(err.step, CheckStep::GetAction);
        assert_eq!(err.exit_code(), EXIT_CONTRACT_VIOLATION);
        assert!(err.to_string().contains("invalid action"));
    }

    #[test]
    fn test_structured_observations_are_provided_on_request() {
        let mut registry = PolicyRegistry::new();
        registry
            .register::<NeedsStructured>("tests.structured.NeedsStructured")
            .unwrap();
        let action =
            check_policy_class(&registry, Task::Lift, "tests.structured.NeedsStructured").unwrap();
        assert_eq!(action.len(), rrc_sim_env::N_JOINTS);
    }

    #[test]
    fn test_evaluate_writes_report() -> Result<()> {
        let mut registry = PolicyRegistry::new();
        registry.register::<ConstantPolicy>("tests.constant.ConstantPolicy")?;
        let dir = tempdir::TempDir::new("host")?;
        let path = dir.path().join("result.json");
        let code = run_from(
            &registry,
            [
                "host".to_string(),
                "evaluate".to_string(),
                "tests.constant.ConstantPolicy".to_string(),
                "--no-visualization".to_string(),
                "--n-episodes".to_string(),
                "2".to_string(),
                "--output".to_string(),
                path.display().to_string(),
            ],
        );
        assert_eq!(code, EXIT_OK);
        let report: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path)?)?;
        assert_eq!(report["n_episodes"], 2);
        assert_eq!(report["lengths"], serde_json::json!([750, 750]));
        Ok(())
    }
}
