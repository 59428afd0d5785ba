//! Simulated TriFinger environment.
//!
//! [`TriFingerSimEnv`] stands in for the cube manipulation simulation of the
//! Real Robot Challenge. Environments are created by name, e.g.
//! `trifinger-cube-push-sim-expert-v0`, with [`SimEnvConfig`]:
//!
//! ```rust
//! use rrc_core::Env;
//! use rrc_sim_env::SimEnvConfig;
//!
//! let mut env = SimEnvConfig::default()
//!     .name("trifinger-cube-lift-sim-mixed-v0")
//!     .flatten_obs(false)
//!     .build()
//!     .unwrap();
//! let obs = env.reset_with_index(0).unwrap();
//! assert!(env.observation_space().contains(&obs));
//! ```
//!
//! Observations consist of the fields `robot_position`, `robot_velocity`,
//! `robot_torque` (nine joints each), `object_position` and `desired_goal`.
//! With `flatten_obs` they are concatenated in alphabetical order of the
//! field names. Actions are target joint positions.
mod base;
mod config;
mod task;
pub use base::{TriFingerSimEnv, N_JOINTS};
pub use config::SimEnvConfig;
pub use task::{env_name, parse_env_name, DatasetType, Task};
