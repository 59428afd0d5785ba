//! Runtime part of the policy contract.
//!
//! That a policy provides `reset`, `get_action` and
//! `is_using_flattened_observations` is guaranteed by the [`PolicyBase`]
//! bound of [`PolicyRegistry::register`]. What remains to be checked at run
//! time is the value a policy returns.
//!
//! [`PolicyBase`]: crate::PolicyBase
//! [`PolicyRegistry::register`]: crate::PolicyRegistry::register
use crate::{
    error::RrcError,
    space::{Action, BoxSpace, Observation},
    Policy,
};

/// Checks that `action` lies in `space`.
pub fn check_action(space: &BoxSpace, action: &Action) -> Result<(), RrcError> {
    match space.violations(action) {
        None => Err(RrcError::ContractViolationError(format!(
            "action has {} dimensions, the action space has {}",
            action.len(),
            space.dim()
        ))),
        Some(ixs) if ixs.is_empty() => Ok(()),
        Some(ixs) => {
            let details: Vec<String> = ixs
                .iter()
                .map(|&i| {
                    format!(
                        "action[{}] = {} not in [{}, {}]",
                        i,
                        action[i],
                        space.low()[i],
                        space.high()[i]
                    )
                })
                .collect();
            Err(RrcError::ContractViolationError(format!(
                "invalid action: {}",
                details.join(", ")
            )))
        }
    }
}

/// Resets `policy`, asks it for an action for `observation` and checks the action.
///
/// Returns the action if it is valid.
pub fn check_policy(
    policy: &mut dyn Policy,
    action_space: &BoxSpace,
    observation: &Observation,
) -> Result<Action, RrcError> {
    policy.reset();
    let action = policy
        .get_action(observation)
        .map_err(|e| RrcError::ContractViolationError(format!("get_action failed: {:#}", e)))?;
    check_action(action_space, &action)?;
    Ok(action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use ndarray::{array, Array1};

    struct Fixed(Array1<f32>);

    impl Policy for Fixed {
        fn reset(&mut self) {}

        fn get_action(&mut self, _: &Observation) -> Result<Action> {
            Ok(self.0.clone())
        }
    }

    struct Failing;

    impl Policy for Failing {
        fn reset(&mut self) {}

        fn get_action(&mut self, _: &Observation) -> Result<Action> {
            anyhow::bail!("model weights missing")
        }
    }

    fn space() -> BoxSpace {
        BoxSpace::uniform(3, -1.0, 1.0).unwrap()
    }

    fn obs() -> Observation {
        Observation::Flat(Array1::zeros(2))
    }

    #[test]
    fn test_valid_action_passes() {
        let act = check_policy(&mut Fixed(array![0.0, 1.0, -1.0]), &space(), &obs()).unwrap();
        assert_eq!(act, array![0.0, 1.0, -1.0]);
    }

    #[test]
    fn test_out_of_bounds_is_a_violation() {
        let err = check_policy(&mut Fixed(array![0.0, 1.5, -1.0]), &space(), &obs()).unwrap_err();
        match err {
            RrcError::ContractViolationError(msg) => assert!(msg.contains("action[1]"), "{}", msg),
            e => panic!("unexpected error: {}", e),
        }
    }

    #[test]
    fn test_wrong_shape_is_a_violation() {
        let err = check_policy(&mut Fixed(array![0.0, 0.0]), &space(), &obs()).unwrap_err();
        assert!(matches!(err, RrcError::ContractViolationError(_)));
    }

    #[test]
    fn test_failing_policy_is_a_violation() {
        let err = check_policy(&mut Failing, &space(), &obs()).unwrap_err();
        match err {
            RrcError::ContractViolationError(msg) => {
                assert!(msg.contains("model weights missing"), "{}", msg)
            }
            e => panic!("unexpected error: {}", e),
        }
    }
}
