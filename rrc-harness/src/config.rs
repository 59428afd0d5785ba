//! Configuration of a policy package (`trifinger.toml`).
//!
//! ```toml
//! [rrc2022]
//! task = "push"
//! dataset_type = "expert"
//! push_expert_policy = "rrc_example.example.TrajectoryPolicy"
//! # Optional, defaults to the first segment of the policy reference.
//! entry_point = "rrc_example"
//! ```
//!
//! Keys are checked one by one so that an error names the exact key. Missing
//! or invalid values are never replaced by defaults.
use rrc_sim_env::{DatasetType, Task};
use std::{fs, io, path::Path};
use thiserror::Error;

/// Default name of the configuration file in the package directory.
pub const CONFIG_FILE: &str = "trifinger.toml";

/// Section holding the configuration.
pub const SECTION: &str = "rrc2022";

/// Errors of loading the package configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("{file}: Failed to read: {source}")]
    ReadError {
        /// Path of the file.
        file: String,

        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// The file is not valid TOML.
    #[error("{file}: Failed to parse: {source}")]
    ParseError {
        /// Path of the file.
        file: String,

        /// Underlying error.
        #[source]
        source: toml::de::Error,
    },

    /// The section is missing.
    #[error("{file}: Missing section '{section}'")]
    MissingSection {
        /// Path of the file.
        file: String,

        /// Name of the section.
        section: String,
    },

    /// A required value is missing.
    #[error("{file}: Missing value {key}")]
    MissingValue {
        /// Path of the file.
        file: String,

        /// Full key path, e.g. `rrc2022.dataset_type`.
        key: String,
    },

    /// A value is outside of its domain.
    #[error("{file}: Invalid value for {key}: {reason}")]
    InvalidValue {
        /// Path of the file.
        file: String,

        /// Full key path, e.g. `rrc2022.task`.
        key: String,

        /// What is wrong with the value.
        reason: String,
    },
}

impl ConfigError {
    /// Full key path of a missing or invalid value.
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::MissingValue { key, .. } | Self::InvalidValue { key, .. } => Some(key),
            _ => None,
        }
    }
}

/// Validated configuration of a policy package.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyConfig {
    /// The task the policy solves.
    pub task: Task,

    /// The dataset the policy was trained on.
    pub dataset_type: DatasetType,

    /// Dotted reference of the policy, e.g. `package.module.Class`.
    pub policy: String,

    /// Name of the installed executable hosting the policy.
    pub entry_point: String,
}

/// Key of the policy reference, e.g. `push_expert_policy`.
pub fn policy_key(task: Task, dataset_type: DatasetType) -> String {
    format!("{}_{}_policy", task, dataset_type)
}

impl PolicyConfig {
    /// Loads `file_name` from the package directory.
    pub fn load(package_dir: &Path, file_name: &str) -> Result<Self, ConfigError> {
        let path = package_dir.join(file_name);
        let text = fs::read_to_string(&path).map_err(|source| ConfigError::ReadError {
            file: path.display().to_string(),
            source,
        })?;
        Self::parse(&text, file_name)
    }

    /// Parses the configuration; `file` is only used in error messages.
    pub fn parse(text: &str, file: &str) -> Result<Self, ConfigError> {
        let doc: toml::Table = text.parse().map_err(|source| ConfigError::ParseError {
            file: file.to_string(),
            source,
        })?;
        let section = doc
            .get(SECTION)
            .and_then(|v| v.as_table())
            .ok_or_else(|| ConfigError::MissingSection {
                file: file.to_string(),
                section: SECTION.to_string(),
            })?;
        let values = Values { file, section };

        let task = values.string("task")?;
        let task: Task = task
            .parse()
            .map_err(|reason| values.invalid("task", reason))?;
        let dataset_type = values.string("dataset_type")?;
        let dataset_type: DatasetType = dataset_type
            .parse()
            .map_err(|reason| values.invalid("dataset_type", reason))?;

        let key = policy_key(task, dataset_type);
        let policy = values.string(&key)?.trim().to_string();
        if policy.is_empty() {
            return Err(values.invalid(&key, "empty policy reference".to_string()));
        }

        let entry_point = match section.get("entry_point") {
            None => policy.split('.').next().unwrap_or_default().to_string(),
            Some(_) => values.string("entry_point")?.to_string(),
        };
        if entry_point.is_empty()
            || entry_point.starts_with('.')
            || entry_point.contains(|c: char| c == '/' || c == '\\' || c.is_whitespace())
        {
            return Err(values.invalid(
                "entry_point",
                format!("'{}' is not a valid executable name", entry_point),
            ));
        }

        Ok(Self {
            task,
            dataset_type,
            policy,
            entry_point,
        })
    }
}

struct Values<'a> {
    file: &'a str,
    section: &'a toml::Table,
}

impl<'a> Values<'a> {
    fn key(&self, key: &str) -> String {
        format!("{}.{}", SECTION, key)
    }

    fn invalid(&self, key: &str, reason: String) -> ConfigError {
        ConfigError::InvalidValue {
            file: self.file.to_string(),
            key: self.key(key),
            reason,
        }
    }

    fn string(&self, key: &str) -> Result<&'a str, ConfigError> {
        match self.section.get(key) {
            None => Err(ConfigError::MissingValue {
                file: self.file.to_string(),
                key: self.key(key),
            }),
            Some(v) => v
                .as_str()
                .ok_or_else(|| self.invalid(key, format!("expected a string, found {}", v))),
        }
    }
}
