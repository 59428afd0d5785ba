//! Evaluation of policies.
use crate::Policy;
use anyhow::Result;
mod default_evaluator;
mod report;
pub use default_evaluator::DefaultEvaluator;
pub use report::{EpisodeRecord, EpisodeStatus, EvaluationReport};

/// Evaluates a [`Policy`].
pub trait Evaluator {
    /// Runs the evaluation episodes and returns the aggregated report.
    ///
    /// Failures of single episodes are recorded in the report. An error is
    /// returned only if the evaluation could not be carried out at all.
    fn evaluate(&mut self, policy: &mut dyn Policy) -> Result<EvaluationReport>;
}
