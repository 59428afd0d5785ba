//! Isolated environments.
//!
//! An environment is a fresh directory with a `bin/` subdirectory into which
//! the package is installed. Commands run "inside" an environment see a
//! cleared set of environment variables (apart from a short whitelist), the
//! environment's `bin/` in front of `PATH`, a private Cargo target directory
//! and the environment root as working directory. The caller's own process
//! is never modified.
use crate::{
    error::HarnessError,
    process::{self, CommandSpec, ProcessOutput},
    settings::{substitute, HarnessConfig},
};
use log::{debug, info};
use std::{
    env,
    ffi::OsString,
    fs, io,
    path::{Path, PathBuf},
    process::Command,
    time::Duration,
};
use tempdir::TempDir;

/// Variables passed through from the caller to commands in an environment.
pub const PASS_THROUGH_VARS: [&str; 9] = [
    "PATH",
    "HOME",
    "CARGO_HOME",
    "RUSTUP_HOME",
    "LANG",
    "TMPDIR",
    "USER",
    "RUST_LOG",
    "RUST_BACKTRACE",
];

/// Variable pointing commands to the root of their environment.
pub const ENV_ROOT_VAR: &str = "RRC_ENV_ROOT";

/// An isolated environment.
///
/// The directory is removed when the handle is dropped.
#[derive(Debug)]
pub struct EnvironmentHandle {
    dir: TempDir,
}

impl EnvironmentHandle {
    /// Root directory of the environment.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Directory of installed executables.
    pub fn bin_dir(&self) -> PathBuf {
        self.root().join("bin")
    }
}

/// Creates environments, installs packages and runs commands in them.
#[derive(Debug, Clone)]
pub struct InstallManager {
    config: HarnessConfig,
}

impl InstallManager {
    /// Constructs the manager.
    pub fn new(config: HarnessConfig) -> Self {
        Self { config }
    }

    /// The settings.
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Creates an environment and runs the provisioning command in it.
    pub fn create_environment(&self) -> Result<EnvironmentHandle, HarnessError> {
        let setup_error = |e: io::Error| HarnessError::EnvironmentSetupError {
            command: "create environment directory".to_string(),
            status: e.to_string(),
            output: String::new(),
        };
        let dir = match &self.config.workspace_dir {
            Some(parent) => {
                fs::create_dir_all(parent).map_err(setup_error)?;
                TempDir::new_in(parent, "rrc-env")
            }
            None => TempDir::new("rrc-env"),
        }
        .map_err(setup_error)?;
        let handle = EnvironmentHandle { dir };
        fs::create_dir_all(handle.bin_dir()).map_err(setup_error)?;
        info!("Created environment {}", handle.root().display());

        let spec = self.config.provision.render(handle.root(), None);
        let result = self.run(&handle, &spec, self.config.install_timeout());
        match result {
            Ok(out) if out.success() => Ok(handle),
            Ok(out) => Err(HarnessError::EnvironmentSetupError {
                command: spec.to_string(),
                status: out.status.to_string(),
                output: out.output,
            }),
            Err(HarnessError::SpawnError { command, source }) => {
                Err(HarnessError::EnvironmentSetupError {
                    command,
                    status: source.to_string(),
                    output: String::new(),
                })
            }
            Err(HarnessError::ValidationTimeoutError(timeout)) => {
                Err(HarnessError::EnvironmentSetupError {
                    command: spec.to_string(),
                    status: format!("timed out after {:?}", timeout),
                    output: String::new(),
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Installs the package at `package` into the environment.
    pub fn install(&self, env: &EnvironmentHandle, package: &Path) -> Result<(), HarnessError> {
        // Commands run in the environment root, so relative paths would break.
        let package = package
            .canonicalize()
            .map_err(|e| HarnessError::InstallError {
                package: package.display().to_string(),
                status: e.to_string(),
                output: String::new(),
            })?;
        info!("Install {}", package.display());
        let spec = self.config.install.render(env.root(), Some(&package));
        let out = match self.run(env, &spec, self.config.install_timeout()) {
            Err(HarnessError::ValidationTimeoutError(timeout)) => {
                return Err(HarnessError::InstallError {
                    package: package.display().to_string(),
                    status: format!("timed out after {:?}", timeout),
                    output: String::new(),
                })
            }
            result => result?,
        };
        if out.success() {
            Ok(())
        } else {
            Err(HarnessError::InstallError {
                package: package.display().to_string(),
                status: out.status.to_string(),
                output: out.output,
            })
        }
    }

    /// Runs a command in the environment.
    pub fn run(
        &self,
        env: &EnvironmentHandle,
        spec: &CommandSpec,
        timeout: Option<Duration>,
    ) -> Result<ProcessOutput, HarnessError> {
        let display = spec.to_string();
        let command = self.activate(env, spec).map_err(|source| HarnessError::SpawnError {
            command: display.clone(),
            source,
        })?;
        process::run(command, &display, timeout)
    }

    fn activate(&self, env: &EnvironmentHandle, spec: &CommandSpec) -> io::Result<Command> {
        let mut cmd = spec.command();
        cmd.env_clear();
        for key in PASS_THROUGH_VARS {
            if let Some(value) = env::var_os(key) {
                cmd.env(key, value);
            }
        }

        let inherited: Vec<PathBuf> = env::var_os("PATH")
            .map(|p| env::split_paths(&p).collect())
            .unwrap_or_default();
        let path: OsString = env::join_paths(std::iter::once(env.bin_dir()).chain(inherited))
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        debug!("PATH={}", path.to_string_lossy());
        cmd.env("PATH", path);
        cmd.env(ENV_ROOT_VAR, env.root());
        cmd.env("CARGO_TARGET_DIR", env.root().join("target"));
        for (key, value) in &self.config.env {
            cmd.env(key, substitute(value, env.root(), None));
        }
        cmd.current_dir(env.root());
        Ok(cmd)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::settings::CommandTemplate;

    fn manager(workspace: &Path) -> InstallManager {
        InstallManager::new(
            HarnessConfig::default()
                .provision(CommandTemplate::new("true", &[]))
                .workspace_dir(workspace),
        )
    }

    #[test]
    fn test_environment_is_removed_on_drop() -> anyhow::Result<()> {
        let workspace = TempDir::new("workspace")?;
        let env = manager(workspace.path()).create_environment()?;
        let root = env.root().to_path_buf();
        assert!(root.starts_with(workspace.path()));
        assert!(env.bin_dir().is_dir());
        drop(env);
        assert!(!root.exists());
        Ok(())
    }

    #[test]
    fn test_activation() -> anyhow::Result<()> {
        let workspace = TempDir::new("workspace")?;
        let manager = InstallManager::new(
            HarnessConfig::default()
                .provision(CommandTemplate::new("true", &[]))
                .workspace_dir(workspace.path())
                .env("RRC_DATA", "{env}/data"),
        );
        let env = manager.create_environment()?;
        let script = "echo root=$RRC_ENV_ROOT; echo data=$RRC_DATA; echo target=$CARGO_TARGET_DIR; \
                      echo cwd=$(pwd -P); echo path=$PATH";
        let out = manager.run(&env, &CommandSpec::new("sh").arg("-c").arg(script), None)?;
        assert!(out.success());

        let root = env.root().display().to_string();
        let real_root = env.root().canonicalize()?.display().to_string();
        assert!(out.output.contains(&format!("root={}\n", root)));
        assert!(out.output.contains(&format!("data={}/data\n", root)));
        assert!(out.output.contains(&format!("target={}/target\n", root)));
        assert!(out.output.contains(&format!("cwd={}\n", real_root)));
        assert!(out
            .output
            .contains(&format!("path={}", env.bin_dir().display())));
        Ok(())
    }

    #[test]
    fn test_unrelated_variables_are_not_passed() -> anyhow::Result<()> {
        std::env::set_var("RRC_TEST_SECRET", "leaked");
        let workspace = TempDir::new("workspace")?;
        let manager = manager(workspace.path());
        let env = manager.create_environment()?;
        let out = manager.run(
            &env,
            &CommandSpec::new("sh")
                .arg("-c")
                .arg("echo secret=${RRC_TEST_SECRET:-unset}"),
            None,
        )?;
        assert_eq!(out.output, "secret=unset\n");
        Ok(())
    }

    #[test]
    fn test_failing_provisioning() -> anyhow::Result<()> {
        let workspace = TempDir::new("workspace")?;
        let manager = InstallManager::new(
            HarnessConfig::default()
                .provision(CommandTemplate::new("sh", &["-c", "echo no toolchain; exit 1"]))
                .workspace_dir(workspace.path()),
        );
        let err = manager.create_environment().unwrap_err();
        assert!(matches!(err, HarnessError::EnvironmentSetupError { .. }));
        assert!(err.output().unwrap().contains("no toolchain"));
        assert_eq!(fs::read_dir(workspace.path())?.count(), 0);
        Ok(())
    }

    #[test]
    fn test_missing_provisioning_program() -> anyhow::Result<()> {
        let workspace = TempDir::new("workspace")?;
        let manager = InstallManager::new(
            HarnessConfig::default()
                .provision(CommandTemplate::new("/nonexistent/cargo", &[]))
                .workspace_dir(workspace.path()),
        );
        let err = manager.create_environment().unwrap_err();
        assert!(matches!(err, HarnessError::EnvironmentSetupError { .. }));
        Ok(())
    }

    #[test]
    fn test_failing_install() -> anyhow::Result<()> {
        let workspace = TempDir::new("workspace")?;
        let package = TempDir::new("package")?;
        let manager = InstallManager::new(
            HarnessConfig::default()
                .provision(CommandTemplate::new("true", &[]))
                .install(CommandTemplate::new(
                    "sh",
                    &["-c", "echo cannot build {package}; exit 101"],
                ))
                .workspace_dir(workspace.path()),
        );
        let env = manager.create_environment()?;
        let err = manager.install(&env, package.path()).unwrap_err();
        match &err {
            HarnessError::InstallError { output, .. } => {
                let package = package.path().canonicalize()?;
                assert!(output.contains(&format!("cannot build {}", package.display())));
            }
            e => panic!("unexpected error: {}", e),
        }
        Ok(())
    }

    #[test]
    fn test_hanging_install_times_out() -> anyhow::Result<()> {
        let workspace = TempDir::new("workspace")?;
        let package = TempDir::new("package")?;
        let manager = InstallManager::new(
            HarnessConfig::default()
                .provision(CommandTemplate::new("true", &[]))
                .install(CommandTemplate::new("sleep", &["30"]))
                .install_timeout_secs(Some(1))
                .workspace_dir(workspace.path()),
        );
        let env = manager.create_environment()?;
        let start = std::time::Instant::now();
        let err = manager.install(&env, package.path()).unwrap_err();
        assert!(start.elapsed() < Duration::from_secs(20));
        match &err {
            HarnessError::InstallError { status, .. } => assert!(status.contains("timed out")),
            e => panic!("unexpected error: {}", e),
        }
        Ok(())
    }

    #[test]
    fn test_hanging_provisioning_times_out() -> anyhow::Result<()> {
        let workspace = TempDir::new("workspace")?;
        let manager = InstallManager::new(
            HarnessConfig::default()
                .provision(CommandTemplate::new("sleep", &["30"]))
                .install_timeout_secs(Some(1))
                .workspace_dir(workspace.path()),
        );
        let err = manager.create_environment().unwrap_err();
        assert!(matches!(err, HarnessError::EnvironmentSetupError { .. }));
        assert!(err.to_string().contains("timed out"));
        assert_eq!(fs::read_dir(workspace.path())?.count(), 0);
        Ok(())
    }
}
