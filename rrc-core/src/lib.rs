#![warn(missing_docs)]
//! Core of the Real Robot Challenge policy harness.
//!
//! The crate defines the contract every third-party policy has to satisfy
//! ([`Policy`] and [`PolicyBase`]), the environment interface the policies are
//! run against ([`Env`]), a typed registry that resolves policies by their
//! dotted reference ([`PolicyRegistry`]) and the evaluation harness
//! ([`DefaultEvaluator`]) producing a JSON-serializable [`EvaluationReport`].
pub mod contract;
pub mod error;
pub mod record;
pub mod space;

mod base;
pub use base::{Env, Policy, PolicyBase, Step};

mod registry;
pub use registry::{PolicyEntry, PolicyRegistry, ResolutionError};

mod evaluator;
pub use evaluator::{DefaultEvaluator, EpisodeRecord, EpisodeStatus, EvaluationReport, Evaluator};

pub mod dummy;
