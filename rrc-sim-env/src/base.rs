//! Kinematic stand-in of the simulated TriFinger platform.
//!
//! The fingers follow the commanded joint positions with a first-order lag.
//! The cube is not moved by the fingers; the reward is the negative distance
//! between cube and goal. This is enough to exercise the policy interface and
//! the evaluation harness with the spaces of the real platform.
use crate::{SimEnvConfig, Task};
use anyhow::{ensure, Result};
use log::{info, trace};
use ndarray::{array, Array1};
use rand::{rngs::SmallRng, Rng, SeedableRng};
use rrc_core::{
    record::{Record, RecordValue},
    space::{Action, BoxSpace, Observation, ObservationSpace},
    Env, Step,
};
use std::collections::BTreeMap;

/// Number of joints (three fingers with three joints each).
pub const N_JOINTS: usize = 9;

const JOINT_LOWER: [f32; 3] = [-0.33, 0.0, -2.7];
const JOINT_UPPER: [f32; 3] = [1.0, 1.57, 0.0];
const INITIAL_POSITION: [f32; 3] = [0.0, 0.9, -1.7];
const MAX_VELOCITY: f32 = 10.0;
const MAX_TORQUE: f32 = 0.36;
const ARENA_RADIUS: f32 = 0.19;
const CUBE_HALF_WIDTH: f32 = 0.0325;
const MAX_LIFT_HEIGHT: f32 = 0.1;
const DT: f32 = 0.02;
const POSITION_GAIN: f32 = 0.5;
const KP: f32 = 1.0;
const RENDER_INTERVAL: usize = 25;

fn per_finger(x: [f32; 3]) -> Array1<f32> {
    x.iter().cycle().take(N_JOINTS).cloned().collect()
}

// Bounds are constants satisfying low <= high.
fn space(low: Array1<f32>, high: Array1<f32>) -> BoxSpace {
    BoxSpace::new(low, high).unwrap_or_else(|e| panic!("{}", e))
}

fn uniform(dim: usize, low: f32, high: f32) -> BoxSpace {
    space(Array1::from_elem(dim, low), Array1::from_elem(dim, high))
}

/// Simulated TriFinger environment.
pub struct TriFingerSimEnv {
    task: Task,
    config: SimEnvConfig,
    action_space: BoxSpace,
    observation_space: ObservationSpace,
    rng: SmallRng,
    t: usize,
    position: Array1<f32>,
    velocity: Array1<f32>,
    torque: Array1<f32>,
    object_position: Array1<f32>,
    goal: Array1<f32>,
}

impl TriFingerSimEnv {
    pub(crate) fn new(task: Task, config: SimEnvConfig) -> Self {
        let action_space = space(per_finger(JOINT_LOWER), per_finger(JOINT_UPPER));
        let fields = BTreeMap::from([
            ("robot_position".to_string(), action_space.clone()),
            (
                "robot_velocity".to_string(),
                uniform(N_JOINTS, -MAX_VELOCITY, MAX_VELOCITY),
            ),
            (
                "robot_torque".to_string(),
                uniform(N_JOINTS, -MAX_TORQUE, MAX_TORQUE),
            ),
            (
                "object_position".to_string(),
                space(array![-0.3, -0.3, 0.0], array![0.3, 0.3, 0.3]),
            ),
            (
                "desired_goal".to_string(),
                space(array![-0.3, -0.3, 0.0], array![0.3, 0.3, 0.3]),
            ),
        ]);
        let structured = ObservationSpace::Structured(fields);
        let observation_space = if config.flatten_obs {
            ObservationSpace::Flat(structured.flatten())
        } else {
            structured
        };
        info!(
            "Initialize {} (flatten_obs = {}, visualization = {})",
            config.name, config.flatten_obs, config.visualization
        );

        Self {
            task,
            rng: SmallRng::seed_from_u64(config.seed),
            config,
            action_space,
            observation_space,
            t: 0,
            position: per_finger(INITIAL_POSITION),
            velocity: Array1::zeros(N_JOINTS),
            torque: Array1::zeros(N_JOINTS),
            object_position: array![0.0, 0.0, CUBE_HALF_WIDTH],
            goal: array![0.0, 0.0, CUBE_HALF_WIDTH],
        }
    }

    /// The task of the environment.
    pub fn task(&self) -> Task {
        self.task
    }

    fn sample_on_table(&mut self) -> Array1<f32> {
        let r = ARENA_RADIUS * self.rng.gen::<f32>().sqrt();
        let phi = self.rng.gen_range(0.0..std::f32::consts::TAU);
        array![r * phi.cos(), r * phi.sin(), CUBE_HALF_WIDTH]
    }

    fn observation(&self) -> Observation {
        let fields = BTreeMap::from([
            ("desired_goal".to_string(), self.goal.clone()),
            ("object_position".to_string(), self.object_position.clone()),
            ("robot_position".to_string(), self.position.clone()),
            ("robot_torque".to_string(), self.torque.clone()),
            ("robot_velocity".to_string(), self.velocity.clone()),
        ]);
        let obs = Observation::Structured(fields);
        if self.config.flatten_obs {
            Observation::Flat(obs.flatten())
        } else {
            obs
        }
    }

    fn object_distance(&self) -> f32 {
        (&self.object_position - &self.goal)
            .mapv(|x| x * x)
            .sum()
            .sqrt()
    }

    fn render(&self) {
        info!(
            "t = {:4}, object = {:.3}, goal = {:.3}, joints = {:.2}",
            self.t, self.object_position, self.goal, self.position
        );
    }
}

impl Env for TriFingerSimEnv {
    fn action_space(&self) -> &BoxSpace {
        &self.action_space
    }

    fn observation_space(&self) -> &ObservationSpace {
        &self.observation_space
    }

    fn episode_length(&self) -> usize {
        self.config.episode_length
    }

    /// Resets the environment with seed `config.seed + ix`.
    fn reset_with_index(&mut self, ix: usize) -> Result<Observation> {
        self.rng = SmallRng::seed_from_u64(self.config.seed.wrapping_add(ix as u64));
        self.t = 0;
        self.position = per_finger(INITIAL_POSITION);
        self.velocity = Array1::zeros(N_JOINTS);
        self.torque = Array1::zeros(N_JOINTS);
        self.object_position = self.sample_on_table();
        self.goal = self.sample_on_table();
        if self.task == Task::Lift {
            self.goal[2] = self.rng.gen_range(CUBE_HALF_WIDTH..MAX_LIFT_HEIGHT);
        }
        trace!("TriFingerSimEnv::reset_with_index({})", ix);
        Ok(self.observation())
    }

    fn step(&mut self, act: &Action) -> Result<Step> {
        ensure!(
            act.len() == N_JOINTS,
            "action has {} elements, expected {}",
            act.len(),
            N_JOINTS
        );
        ensure!(
            act.iter().all(|x| x.is_finite()),
            "action contains non-finite values"
        );

        // The robot enforces its joint limits regardless of the command.
        let target = self.action_space.clip(act);
        let error = &target - &self.position;
        let new_position = &self.position + &(&error * POSITION_GAIN);
        self.velocity = ((&new_position - &self.position) / DT)
            .mapv(|v| v.clamp(-MAX_VELOCITY, MAX_VELOCITY));
        self.torque = (&error * KP).mapv(|v| v.clamp(-MAX_TORQUE, MAX_TORQUE));
        self.position = new_position;
        self.t += 1;

        if self.config.visualization && self.t % RENDER_INTERVAL == 0 {
            self.render();
        }

        let distance = self.object_distance();
        let info = Record::from_slice(&[
            ("object_distance", RecordValue::Scalar(distance)),
            ("task", RecordValue::String(self.task.to_string())),
        ]);
        Ok(Step::new(
            self.observation(),
            -distance,
            false,
            self.t >= self.config.episode_length,
            info,
        ))
    }
}
