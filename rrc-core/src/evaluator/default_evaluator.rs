//! Default implementation of the [`Evaluator`] trait.
//!
//! This module provides a simple evaluator that runs a fixed number of episodes
//! and aggregates the episode rewards and lengths.
use super::{EpisodeRecord, EpisodeStatus, EvaluationReport, Evaluator};
use crate::{contract::check_action, record::Record, Env, Policy};
use anyhow::{bail, Result};
use log::{debug, info, warn};

/// A default implementation of the [`Evaluator`] trait.
///
/// This evaluator runs a specified number of episodes sequentially. Each
/// episode starts with resetting the environment with the episode index and
/// resetting the policy, and ends when the environment terminates or truncates
/// it. If the environment never signals the end of an episode, the episode is
/// truncated after [`Env::episode_length`] steps.
///
/// Actions are passed to the environment as they are. Actions outside of the
/// action space are counted and logged, not clipped.
///
/// # Examples
///
/// ```ignore
/// let env = SimEnvConfig::default().name("trifinger-cube-push-sim-expert-v0").build()?;
/// let mut evaluator = DefaultEvaluator::new(env, 64)?;
/// let mut policy = registry.load(reference)?.build(
///     evaluator.env().action_space(),
///     evaluator.env().observation_space(),
///     evaluator.env().episode_length(),
/// )?;
/// let report = evaluator.evaluate(policy.as_mut())?;
/// println!("{}", report.to_json()?);
/// ```
pub struct DefaultEvaluator<E: Env> {
    /// The number of episodes to run during evaluation.
    n_episodes: usize,

    /// The environment instance used for evaluation.
    env: E,
}

/// Accumulated values of a running episode.
#[derive(Default)]
struct Rollout {
    reward: f64,
    length: usize,
    action_violations: usize,
    info: Record,
}

impl<E: Env> Evaluator for DefaultEvaluator<E> {
    /// Evaluates a policy by running `n_episodes` episodes.
    ///
    /// An error of the environment or the policy aborts the current episode
    /// only; it is recorded as failed and the remaining episodes are run.
    fn evaluate(&mut self, policy: &mut dyn Policy) -> Result<EvaluationReport> {
        let mut episodes = Vec::with_capacity(self.n_episodes);

        for ix in 0..self.n_episodes {
            let mut rollout = Rollout::default();
            let result = self.rollout(ix, policy, &mut rollout);
            let (status, error) = match result {
                Ok(()) => {
                    info!(
                        "Episode {}: {} steps, reward = {}",
                        ix, rollout.length, rollout.reward
                    );
                    (EpisodeStatus::Completed, None)
                }
                Err(e) => {
                    warn!("Episode {} failed after {} steps: {:#}", ix, rollout.length, e);
                    (EpisodeStatus::Failed, Some(format!("{:#}", e)))
                }
            };
            episodes.push(EpisodeRecord {
                index: ix,
                status,
                reward: rollout.reward,
                length: rollout.length,
                action_violations: rollout.action_violations,
                error,
                info: rollout.info,
            });
        }

        let report = EvaluationReport::from_episodes(episodes);
        if report.n_failed_episodes > 0 {
            warn!(
                "{} of {} episodes failed",
                report.n_failed_episodes, report.n_episodes
            );
        }
        Ok(report)
    }
}

impl<E: Env> DefaultEvaluator<E> {
    /// Constructs a new [`DefaultEvaluator`].
    ///
    /// # Arguments
    ///
    /// * `env` - The environment to evaluate policies on
    /// * `n_episodes` - Number of episodes to run during evaluation
    pub fn new(env: E, n_episodes: usize) -> Result<Self> {
        if n_episodes == 0 {
            bail!("The number of evaluation episodes must be positive");
        }
        Ok(Self { n_episodes, env })
    }

    /// The environment, e.g. to build a policy for its spaces.
    pub fn env(&self) -> &E {
        &self.env
    }

    fn rollout(&mut self, ix: usize, policy: &mut dyn Policy, rollout: &mut Rollout) -> Result<()> {
        let mut obs = self.env.reset_with_index(ix)?;
        policy.reset();
        let max_steps = self.env.episode_length();

        loop {
            let act = policy.get_action(&obs)?;
            if let Err(e) = check_action(self.env.action_space(), &act) {
                rollout.action_violations += 1;
                warn!("Episode {}, step {}: {}", ix, rollout.length, e);
            }

            let step = self.env.step(&act)?;
            rollout.reward += step.reward as f64;
            rollout.length += 1;
            let done = step.is_done();
            rollout.info = step.info;

            if done {
                return Ok(());
            }
            if max_steps > 0 && rollout.length >= max_steps {
                debug!(
                    "Episode {} truncated by the evaluator after {} steps",
                    ix, rollout.length
                );
                return Ok(());
            }
            obs = step.obs;
        }
    }
}
