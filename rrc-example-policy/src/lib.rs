//! Reference policy for the Real Robot Challenge harness.
//!
//! [`TrajectoryPolicy`] ignores its observations and moves the fingers back
//! and forth between two fixed joint configurations. It is meant as a
//! template for third-party packages and as a known-good policy for testing
//! the harness itself.
mod policy;
mod trajectory;
pub use policy::TrajectoryPolicy;
pub use trajectory::{Trajectory, POSITION_DOWN, POSITION_UP};

/// Reference under which [`TrajectoryPolicy`] is registered by the example host.
pub const TRAJECTORY_POLICY: &str = "rrc_example.example.TrajectoryPolicy";
