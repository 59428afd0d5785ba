use crate::Trajectory;
use anyhow::{ensure, Result};
use log::debug;
use rrc_core::{
    space::{Action, BoxSpace, Observation, ObservationSpace},
    Policy, PolicyBase,
};

/// Number of waypoints between the lower and upper configuration.
const DEFAULT_STEPS: usize = 1000;

/// Moves the fingers up and down along a fixed [`Trajectory`].
///
/// The returned actions are target joint positions.
#[derive(Clone, Debug)]
pub struct TrajectoryPolicy {
    initial: Trajectory,
    trajectory: Trajectory,
}

impl TrajectoryPolicy {
    /// Policy with `steps` waypoints between the two configurations.
    pub fn with_steps(steps: usize) -> Self {
        let trajectory = Trajectory::fingers(steps);
        Self {
            initial: trajectory.clone(),
            trajectory,
        }
    }
}

impl Default for TrajectoryPolicy {
    fn default() -> Self {
        Self::with_steps(DEFAULT_STEPS)
    }
}

impl Policy for TrajectoryPolicy {
    fn reset(&mut self) {
        self.trajectory = self.initial.clone();
    }

    fn get_action(&mut self, _observation: &Observation) -> Result<Action> {
        Ok(self.trajectory.next_waypoint()?)
    }
}

impl PolicyBase for TrajectoryPolicy {
    fn build(
        action_space: &BoxSpace,
        _observation_space: &ObservationSpace,
        episode_length: usize,
    ) -> Result<Self> {
        ensure!(
            action_space.dim() == 9,
            "TrajectoryPolicy needs 9 joints, the action space has {} dimensions",
            action_space.dim()
        );
        debug!(
            "TrajectoryPolicy with {} waypoints, episode length {}",
            DEFAULT_STEPS, episode_length
        );
        Ok(Self::default())
    }
}
