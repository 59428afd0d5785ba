//! Policy.
use crate::space::{Action, BoxSpace, Observation, ObservationSpace};
use anyhow::Result;

/// A policy on an environment.
///
/// Policy is a mapping from an observation to an action, together with the
/// per-episode state needed to compute it. The harness calls [`Policy::reset`]
/// at the start of every episode and [`Policy::get_action`] at every step.
///
/// The returned action must lie in the action space the policy was built with.
/// If the underlying model can produce values outside of the bounds, the
/// policy has to clip them itself (see [`BoxSpace::clip`]); the harness only
/// checks actions and reports violations.
pub trait Policy {
    /// Re-initializes per-episode state.
    ///
    /// Must be callable repeatedly without keeping state of earlier episodes.
    fn reset(&mut self);

    /// Returns the action for the given observation.
    fn get_action(&mut self, observation: &Observation) -> Result<Action>;
}

/// A policy which can be constructed by the harness.
///
/// Only types implementing this trait can be put into a
/// [`PolicyRegistry`](crate::PolicyRegistry), so every registered policy
/// provides the full set of operations required by the harness.
pub trait PolicyBase: Policy + Sized + 'static {
    /// Builds the policy for an environment.
    fn build(
        action_space: &BoxSpace,
        observation_space: &ObservationSpace,
        episode_length: usize,
    ) -> Result<Self>;

    /// Whether the policy expects flattened observations.
    ///
    /// Queried before the environment is constructed, so that the environment
    /// can be asked for the matching observation encoding.
    fn is_using_flattened_observations() -> bool {
        true
    }
}
