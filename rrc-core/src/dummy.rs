//! This module is used for tests.
use crate::{
    record::{Record, RecordValue},
    space::{Action, BoxSpace, Observation, ObservationSpace},
    Env, Policy, PolicyBase, Step,
};
use anyhow::{bail, Result};
use ndarray::Array1;

/// Deterministic stub environment.
///
/// Every episode terminates after `steps_per_episode` steps with reward 1 per step.
/// The observation is the step counter.
pub struct DummyEnv {
    action_space: BoxSpace,
    observation_space: ObservationSpace,
    steps_per_episode: usize,
    episode_length: usize,
    failing_episode: Option<usize>,
    episode: usize,
    t: usize,
}

impl DummyEnv {
    /// Constructs the environment with a 3-dimensional action space `[-1, 1]^3`.
    pub fn new(steps_per_episode: usize) -> Self {
        Self {
            action_space: BoxSpace::new(Array1::from_elem(3, -1.0), Array1::from_elem(3, 1.0))
                .expect("valid bounds"),
            observation_space: ObservationSpace::Flat(
                BoxSpace::new(Array1::zeros(1), Array1::from_elem(1, f32::MAX))
                    .expect("valid bounds"),
            ),
            steps_per_episode,
            episode_length: steps_per_episode,
            failing_episode: None,
            episode: 0,
            t: 0,
        }
    }

    /// Makes `step()` fail in the second step of the episode with the given index.
    pub fn fail_in_episode(mut self, ix: usize) -> Self {
        self.failing_episode = Some(ix);
        self
    }

    /// Sets the episode length reported to the evaluator.
    pub fn episode_length(mut self, v: usize) -> Self {
        self.episode_length = v;
        self
    }

    fn obs(&self) -> Observation {
        Observation::Flat(Array1::from_elem(1, self.t as f32))
    }
}

impl Env for DummyEnv {
    fn action_space(&self) -> &BoxSpace {
        &self.action_space
    }

    fn observation_space(&self) -> &ObservationSpace {
        &self.observation_space
    }

    fn episode_length(&self) -> usize {
        self.episode_length
    }

    fn reset_with_index(&mut self, ix: usize) -> Result<Observation> {
        self.episode = ix;
        self.t = 0;
        Ok(self.obs())
    }

    fn step(&mut self, _act: &Action) -> Result<Step> {
        if self.failing_episode == Some(self.episode) && self.t == 1 {
            bail!("simulation diverged");
        }
        self.t += 1;
        let info = Record::from_slice(&[("t", RecordValue::Scalar(self.t as f32))]);
        Ok(Step::new(
            self.obs(),
            1.0,
            self.t >= self.steps_per_episode,
            false,
            info,
        ))
    }
}

/// Policy returning a constant action and counting its calls.
pub struct ConstantPolicy {
    /// The action returned at every step.
    pub action: Action,

    /// Number of calls of [`Policy::reset`].
    pub n_resets: usize,
}

impl Policy for ConstantPolicy {
    fn reset(&mut self) {
        self.n_resets += 1;
    }

    fn get_action(&mut self, _observation: &Observation) -> Result<Action> {
        Ok(self.action.clone())
    }
}

impl PolicyBase for ConstantPolicy {
    fn build(action_space: &BoxSpace, _: &ObservationSpace, _: usize) -> Result<Self> {
        Ok(Self {
            action: (action_space.low() + action_space.high()) / 2.0,
            n_resets: 0,
        })
    }
}
