//! Settings of the validation harness.
use crate::process::CommandSpec;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufReader, Write},
    path::{Path, PathBuf},
    time::Duration,
};

/// A command line with placeholders.
///
/// `{env}` is replaced by the root of the isolated environment and
/// `{package}` by the absolute path of the package being validated.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct CommandTemplate {
    /// The program.
    pub program: String,

    /// Arguments.
    #[serde(default)]
    pub args: Vec<String>,
}

impl CommandTemplate {
    /// Constructs a template.
    pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Substitutes the placeholders.
    pub fn render(&self, env: &Path, package: Option<&Path>) -> CommandSpec {
        CommandSpec::new(substitute(&self.program, env, package))
            .args(self.args.iter().map(|a| substitute(a, env, package)))
    }
}

/// Substitutes `{env}` and `{package}` in `s`.
///
/// `{package}` is left as is if no package is given.
pub fn substitute(s: &str, env: &Path, package: Option<&Path>) -> String {
    let s = s.replace("{env}", &env.display().to_string());
    match package {
        Some(package) => s.replace("{package}", &package.display().to_string()),
        None => s,
    }
}

/// Settings of the validation harness.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
#[serde(default)]
pub struct HarnessConfig {
    /// Command run once in a new environment.
    pub provision: CommandTemplate,

    /// Command installing the package into the environment.
    pub install: CommandTemplate,

    /// Extra environment variables of every command. Values may contain placeholders.
    pub env: BTreeMap<String, String>,

    /// Timeout of the policy check in seconds. `None` disables the timeout.
    pub timeout_secs: Option<u64>,

    /// Timeout of the provisioning and install commands in seconds, each.
    /// `None` disables the timeout.
    pub install_timeout_secs: Option<u64>,

    /// Parent directory of isolated environments. Defaults to the system temp directory.
    pub workspace_dir: Option<PathBuf>,

    /// Name of the configuration file in the package directory.
    pub config_file: String,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            provision: CommandTemplate::new("cargo", &["--version"]),
            install: CommandTemplate::new(
                "cargo",
                &["install", "--path", "{package}", "--root", "{env}"],
            ),
            env: BTreeMap::new(),
            timeout_secs: Some(600),
            install_timeout_secs: Some(3600),
            workspace_dir: None,
            config_file: crate::config::CONFIG_FILE.to_string(),
        }
    }
}

impl HarnessConfig {
    /// Sets the provisioning command.
    pub fn provision(mut self, v: CommandTemplate) -> Self {
        self.provision = v;
        self
    }

    /// Sets the install command.
    pub fn install(mut self, v: CommandTemplate) -> Self {
        self.install = v;
        self
    }

    /// Adds an environment variable passed to every command.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Sets the timeout of the policy check in seconds.
    pub fn timeout_secs(mut self, v: Option<u64>) -> Self {
        self.timeout_secs = v;
        self
    }

    /// Sets the timeout of the provisioning and install commands in seconds.
    pub fn install_timeout_secs(mut self, v: Option<u64>) -> Self {
        self.install_timeout_secs = v;
        self
    }

    /// Sets the parent directory of isolated environments.
    pub fn workspace_dir(mut self, v: impl Into<PathBuf>) -> Self {
        self.workspace_dir = Some(v.into());
        self
    }

    /// Sets the name of the configuration file.
    pub fn config_file(mut self, v: impl Into<String>) -> Self {
        self.config_file = v.into();
        self
    }

    /// Timeout of the policy check.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Timeout of the provisioning and install commands.
    pub fn install_timeout(&self) -> Option<Duration> {
        self.install_timeout_secs.map(Duration::from_secs)
    }

    /// Constructs [`HarnessConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`HarnessConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
