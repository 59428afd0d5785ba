//! Environment step.
use crate::{record::Record, space::Observation};

/// What [`Env::step`](crate::Env::step) returns: the next observation, the
/// reward of the action and the end-of-episode flags.
#[derive(Debug)]
pub struct Step {
    /// Observation after the action was applied.
    pub obs: Observation,

    /// Reward of the action.
    pub reward: f32,

    /// The task ended, e.g. the goal was reached.
    pub is_terminated: bool,

    /// The episode was cut off, e.g. after `episode_length` steps.
    pub is_truncated: bool,

    /// Auxiliary values reported by the environment.
    pub info: Record,
}

impl Step {
    /// Constructs a [`Step`].
    pub fn new(
        obs: Observation,
        reward: f32,
        is_terminated: bool,
        is_truncated: bool,
        info: Record,
    ) -> Self {
        Self {
            obs,
            reward,
            is_terminated,
            is_truncated,
            info,
        }
    }

    /// Whether the episode is over.
    #[inline]
    pub fn is_done(&self) -> bool {
        self.is_terminated || self.is_truncated
    }
}
