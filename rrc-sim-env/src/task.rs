//! Tasks, datasets and the environment names derived from them.
use rrc_core::error::RrcError;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Manipulation task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Task {
    /// Push the cube to a goal position on the table.
    Push,

    /// Lift the cube to a goal position above the table.
    Lift,
}

impl Task {
    /// All tasks, in the order used in messages.
    pub const ALL: [Task; 2] = [Task::Push, Task::Lift];

    /// Name as used in configuration files and environment names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Push => "push",
            Self::Lift => "lift",
        }
    }

    /// Name of the simulated environment used to check policies for the task.
    pub fn sim_env_name(&self) -> String {
        env_name(*self, DatasetType::Expert)
    }
}

/// Dataset the policy was trained on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetType {
    /// Expert demonstrations.
    Expert,

    /// Mixture of expert and weak demonstrations.
    Mixed,
}

impl DatasetType {
    /// All dataset types, in the order used in messages.
    pub const ALL: [DatasetType; 2] = [DatasetType::Expert, DatasetType::Mixed];

    /// Name as used in configuration files and environment names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Expert => "expert",
            Self::Mixed => "mixed",
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for DatasetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Task {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("invalid task '{}' (expected one of: push, lift)", s))
    }
}

impl FromStr for DatasetType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("invalid dataset type '{}' (expected one of: expert, mixed)", s))
    }
}

/// Name of the simulated environment, e.g. `trifinger-cube-push-sim-expert-v0`.
pub fn env_name(task: Task, dataset_type: DatasetType) -> String {
    format!("trifinger-cube-{}-sim-{}-v0", task, dataset_type)
}

/// Inverse of [`env_name`].
pub fn parse_env_name(name: &str) -> Result<(Task, DatasetType), RrcError> {
    let unknown = || RrcError::UnknownEnvError(name.to_string());
    let rest = name
        .strip_prefix("trifinger-cube-")
        .and_then(|s| s.strip_suffix("-v0"))
        .ok_or_else(unknown)?;
    let (task, dataset_type) = rest.split_once("-sim-").ok_or_else(unknown)?;
    Ok((
        task.parse().map_err(|_| unknown())?,
        dataset_type.parse().map_err(|_| unknown())?,
    ))
}
