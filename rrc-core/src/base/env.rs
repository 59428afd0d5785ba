//! Environment.
use super::Step;
use crate::space::{Action, BoxSpace, Observation, ObservationSpace};
use anyhow::Result;

/// Represents an environment the policies are evaluated on.
///
/// The environment owns the description of its action and observation spaces
/// and the nominal length of an episode, which are handed to a policy at
/// construction time.
pub trait Env {
    /// Space of valid actions.
    fn action_space(&self) -> &BoxSpace;

    /// Space of observations, flat or structured depending on the configuration.
    fn observation_space(&self) -> &ObservationSpace;

    /// Number of steps of an episode.
    fn episode_length(&self) -> usize;

    /// Resets the environment with a given index.
    ///
    /// The index is used in an arbitrary way, typically as a random seed so
    /// that evaluation runs are reproducible.
    fn reset_with_index(&mut self, ix: usize) -> Result<Observation>;

    /// Performs an environment step.
    fn step(&mut self, act: &Action) -> Result<Step>;
}
