//! Core functionalities.
mod env;
mod policy;
mod step;
pub use env::Env;
pub use policy::{Policy, PolicyBase};
pub use step::Step;
