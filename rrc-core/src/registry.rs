//! Resolution of policies by name.
//!
//! Policies are referred to by a dotted reference of the form
//! `"<module.path>.<TypeName>"`, e.g. `"rrc_example.example.TrajectoryPolicy"`.
//! The rightmost segment is the type name and everything before it is the
//! module. A package hosting policies registers each of its policy types under
//! such a reference at start-up; the harness then resolves the reference given
//! by the user with [`PolicyRegistry::load`].
use crate::{
    error::RrcError,
    space::{BoxSpace, ObservationSpace},
    Policy, PolicyBase,
};
use anyhow::Result;
use log::info;
use std::collections::BTreeMap;
use thiserror::Error;

/// Reason why a policy reference could not be resolved.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolutionError {
    /// The reference is not of the form `module.Type`.
    #[error("'{0}' is not of the form 'package.module.Class'")]
    MalformedReference(String),

    /// No policy is registered in the module.
    #[error("No module named '{0}'")]
    ModuleNotFound(String),

    /// The module has no policy of the given name.
    #[error("Module '{module}' has no attribute '{type_name}'")]
    TypeNotFound {
        /// The module.
        module: String,

        /// The requested type name.
        type_name: String,
    },

    /// The reference is registered already.
    #[error("'{0}' is registered twice")]
    DuplicateReference(String),
}

type BuildFn = fn(&BoxSpace, &ObservationSpace, usize) -> Result<Box<dyn Policy>>;

/// A registered policy type.
#[derive(Clone)]
pub struct PolicyEntry {
    reference: String,
    flattened: fn() -> bool,
    build: BuildFn,
}

impl PolicyEntry {
    fn of<P: PolicyBase>(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            flattened: P::is_using_flattened_observations,
            build: |action_space, observation_space, episode_length| {
                let policy = P::build(action_space, observation_space, episode_length)?;
                Ok(Box::new(policy) as Box<dyn Policy>)
            },
        }
    }

    /// The reference the policy is registered under.
    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// Whether the policy expects flattened observations.
    pub fn is_using_flattened_observations(&self) -> bool {
        (self.flattened)()
    }

    /// Builds an instance of the policy.
    pub fn build(
        &self,
        action_space: &BoxSpace,
        observation_space: &ObservationSpace,
        episode_length: usize,
    ) -> Result<Box<dyn Policy>> {
        (self.build)(action_space, observation_space, episode_length)
    }
}

impl std::fmt::Debug for PolicyEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyEntry")
            .field("reference", &self.reference)
            .field("flattened", &self.is_using_flattened_observations())
            .finish()
    }
}

/// Maps policy references to constructors.
#[derive(Debug, Default, Clone)]
pub struct PolicyRegistry {
    modules: BTreeMap<String, BTreeMap<String, PolicyEntry>>,
}

fn split(reference: &str) -> Result<(&str, &str), ResolutionError> {
    match reference.rsplit_once('.') {
        Some((module, type_name))
            if !module.is_empty()
                && !type_name.is_empty()
                && module.split('.').all(|s| !s.is_empty()) =>
        {
            Ok((module, type_name))
        }
        _ => Err(ResolutionError::MalformedReference(reference.to_string())),
    }
}

impl PolicyRegistry {
    /// Constructs an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the policy type `P` under `reference`.
    ///
    /// Only types the harness can construct, i.e. implementing [`PolicyBase`],
    /// are accepted:
    ///
    /// ```
    /// use rrc_core::{
    ///     space::{Action, BoxSpace, Observation, ObservationSpace},
    ///     Policy, PolicyBase, PolicyRegistry,
    /// };
    ///
    /// struct Zero(usize);
    ///
    /// impl Policy for Zero {
    ///     fn reset(&mut self) {}
    ///
    ///     fn get_action(&mut self, _: &Observation) -> anyhow::Result<Action> {
    ///         Ok(Action::zeros(self.0))
    ///     }
    /// }
    ///
    /// impl PolicyBase for Zero {
    ///     fn build(
    ///         action_space: &BoxSpace,
    ///         _: &ObservationSpace,
    ///         _: usize,
    ///     ) -> anyhow::Result<Self> {
    ///         Ok(Self(action_space.dim()))
    ///     }
    /// }
    ///
    /// let mut registry = PolicyRegistry::new();
    /// registry.register::<Zero>("pkg.policies.Zero").unwrap();
    /// ```
    ///
    /// A type implementing only [`Policy`] is rejected at compile time:
    ///
    /// ```compile_fail
    /// use rrc_core::{
    ///     space::{Action, Observation},
    ///     Policy, PolicyRegistry,
    /// };
    ///
    /// struct Zero(usize);
    ///
    /// impl Policy for Zero {
    ///     fn reset(&mut self) {}
    ///
    ///     fn get_action(&mut self, _: &Observation) -> anyhow::Result<Action> {
    ///         Ok(Action::zeros(self.0))
    ///     }
    /// }
    ///
    /// let mut registry = PolicyRegistry::new();
    /// registry.register::<Zero>("pkg.policies.Zero").unwrap();
    /// ```
    pub fn register<P: PolicyBase>(&mut self, reference: &str) -> Result<&mut Self, RrcError> {
        let resolution_error = |source| RrcError::PolicyResolutionError {
            reference: reference.to_string(),
            source,
        };
        let (module, type_name) = split(reference).map_err(resolution_error)?;
        let types = self.modules.entry(module.to_string()).or_default();
        if types.contains_key(type_name) {
            return Err(resolution_error(ResolutionError::DuplicateReference(
                reference.to_string(),
            )));
        }
        types.insert(type_name.to_string(), PolicyEntry::of::<P>(reference));
        Ok(self)
    }

    /// Resolves `reference`.
    ///
    /// The module is looked up first, then the type within it.
    pub fn load(&self, reference: &str) -> Result<&PolicyEntry, RrcError> {
        info!("Import policy {}", reference);
        let resolution_error = |source| RrcError::PolicyResolutionError {
            reference: reference.to_string(),
            source,
        };
        let (module, type_name) = split(reference).map_err(resolution_error)?;
        let types = self
            .modules
            .get(module)
            .ok_or_else(|| resolution_error(ResolutionError::ModuleNotFound(module.to_string())))?;
        types.get(type_name).ok_or_else(|| {
            resolution_error(ResolutionError::TypeNotFound {
                module: module.to_string(),
                type_name: type_name.to_string(),
            })
        })
    }

    /// All registered references, sorted.
    pub fn references(&self) -> Vec<&str> {
        self.modules
            .values()
            .flat_map(|types| types.values().map(|e| e.reference()))
            .collect()
    }
}
