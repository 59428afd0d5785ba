//! Result of an evaluation run.
//!
//! The report only consists of numbers, strings, sequences and mappings and
//! is written as JSON by the evaluation tool. Downstream consumers rely on the
//! key names, so fields must not be renamed.
use crate::record::Record;
use serde::Serialize;

/// Outcome of a single episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EpisodeStatus {
    /// The episode ran until the environment terminated or truncated it.
    Completed,

    /// The episode was aborted by an error of the environment or the policy.
    Failed,
}

/// Record of a single episode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpisodeRecord {
    /// Index of the episode, also used to reset the environment.
    pub index: usize,

    /// Outcome of the episode.
    pub status: EpisodeStatus,

    /// Sum of rewards (up to the failure for failed episodes).
    pub reward: f64,

    /// Number of environment steps.
    pub length: usize,

    /// Number of actions outside of the action space.
    pub action_violations: usize,

    /// Error message of a failed episode.
    pub error: Option<String>,

    /// Information of the last step of the episode.
    pub info: Record,
}

/// Aggregated result of an evaluation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    /// Number of episodes run.
    pub n_episodes: usize,

    /// Number of completed episodes.
    pub n_completed_episodes: usize,

    /// Number of failed episodes.
    pub n_failed_episodes: usize,

    /// Mean episode reward of the completed episodes.
    pub mean_reward: Option<f64>,

    /// Standard deviation of the episode reward of the completed episodes.
    pub std_reward: Option<f64>,

    /// Minimum episode reward of the completed episodes.
    pub min_reward: Option<f64>,

    /// Maximum episode reward of the completed episodes.
    pub max_reward: Option<f64>,

    /// Mean episode length of the completed episodes.
    pub mean_length: Option<f64>,

    /// Reward of every episode, in order.
    pub rewards: Vec<f64>,

    /// Length of every episode, in order.
    pub lengths: Vec<usize>,

    /// Per-episode records.
    pub episodes: Vec<EpisodeRecord>,
}

fn mean(xs: &[f64]) -> Option<f64> {
    if xs.is_empty() {
        None
    } else {
        Some(xs.iter().sum::<f64>() / xs.len() as f64)
    }
}

impl EvaluationReport {
    /// Aggregates episode records.
    pub fn from_episodes(episodes: Vec<EpisodeRecord>) -> Self {
        let completed: Vec<&EpisodeRecord> = episodes
            .iter()
            .filter(|e| e.status == EpisodeStatus::Completed)
            .collect();
        let rs: Vec<f64> = completed.iter().map(|e| e.reward).collect();
        let ls: Vec<f64> = completed.iter().map(|e| e.length as f64).collect();

        let mean_reward = mean(&rs);
        let std_reward = mean_reward.map(|m| {
            let var = rs.iter().map(|r| (r - m).powi(2)).sum::<f64>() / rs.len() as f64;
            var.sqrt()
        });
        let min_reward = rs.iter().cloned().reduce(f64::min);
        let max_reward = rs.iter().cloned().reduce(f64::max);

        Self {
            n_episodes: episodes.len(),
            n_completed_episodes: completed.len(),
            n_failed_episodes: episodes.len() - completed.len(),
            mean_reward,
            std_reward,
            min_reward,
            max_reward,
            mean_length: mean(&ls),
            rewards: episodes.iter().map(|e| e.reward).collect(),
            lengths: episodes.iter().map(|e| e.length).collect(),
            episodes,
        }
    }

    /// Serializes the report as pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
