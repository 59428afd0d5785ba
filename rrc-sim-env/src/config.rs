//! Configuration of [`TriFingerSimEnv`](super::TriFingerSimEnv).
use crate::{parse_env_name, TriFingerSimEnv};
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Configuration of [`TriFingerSimEnv`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SimEnvConfig {
    pub(crate) name: String,
    pub(crate) flatten_obs: bool,
    pub(crate) visualization: bool,
    pub(crate) episode_length: usize,
    pub(crate) seed: u64,
}

impl Default for SimEnvConfig {
    fn default() -> Self {
        Self {
            name: "trifinger-cube-push-sim-expert-v0".to_string(),
            flatten_obs: true,
            visualization: false,
            episode_length: 750,
            seed: 0,
        }
    }
}

impl SimEnvConfig {
    /// Sets the name of the environment.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets whether observations are flattened into a single vector.
    pub fn flatten_obs(mut self, v: bool) -> Self {
        self.flatten_obs = v;
        self
    }

    /// Sets whether the state is rendered while stepping.
    pub fn visualization(mut self, v: bool) -> Self {
        self.visualization = v;
        self
    }

    /// Sets the number of steps of an episode.
    pub fn episode_length(mut self, v: usize) -> Self {
        self.episode_length = v;
        self
    }

    /// Sets the base seed; episode `ix` is reset with `seed + ix`.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Builds the environment.
    ///
    /// Fails if the name does not denote a known environment.
    pub fn build(&self) -> Result<TriFingerSimEnv> {
        let (task, _) = parse_env_name(&self.name)?;
        Ok(TriFingerSimEnv::new(task, self.clone()))
    }
}
