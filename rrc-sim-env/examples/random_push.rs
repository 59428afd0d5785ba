use anyhow::Result;
use rand::{rngs::SmallRng, SeedableRng};
use rrc_core::{
    space::{Action, BoxSpace, Observation, ObservationSpace},
    DefaultEvaluator, Env as _, Evaluator as _, Policy, PolicyBase,
};
use rrc_sim_env::SimEnvConfig;

struct RandomPolicy {
    action_space: BoxSpace,
    rng: SmallRng,
}

impl Policy for RandomPolicy {
    fn reset(&mut self) {}

    fn get_action(&mut self, _: &Observation) -> Result<Action> {
        Ok(self.action_space.sample(&mut self.rng))
    }
}

impl PolicyBase for RandomPolicy {
    fn build(action_space: &BoxSpace, _: &ObservationSpace, _: usize) -> Result<Self> {
        Ok(Self {
            action_space: action_space.clone(),
            rng: SmallRng::seed_from_u64(42),
        })
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let env = SimEnvConfig::default()
        .name("trifinger-cube-push-sim-expert-v0")
        .visualization(true)
        .episode_length(100)
        .build()?;
    let mut policy = RandomPolicy::build(
        env.action_space(),
        env.observation_space(),
        env.episode_length(),
    )?;

    let report = DefaultEvaluator::new(env, 3)?.evaluate(&mut policy)?;
    println!("{}", report.to_json()?);

    Ok(())
}

#[test]
fn test_random_push() {
    let env = SimEnvConfig::default().episode_length(20).build().unwrap();
    let mut policy = RandomPolicy::build(
        env.action_space(),
        env.observation_space(),
        env.episode_length(),
    )
    .unwrap();
    let report = DefaultEvaluator::new(env, 2)
        .unwrap()
        .evaluate(&mut policy)
        .unwrap();
    assert_eq!(report.lengths, vec![20, 20]);
    assert_eq!(report.n_failed_episodes, 0);
}
