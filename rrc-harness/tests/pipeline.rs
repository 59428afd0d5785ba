#![cfg(unix)]
use anyhow::Result;
use rrc_example_policy::TRAJECTORY_POLICY;
use rrc_harness::{
    CommandTemplate, HarnessConfig, HarnessError, ValidationPipeline, ValidationStep,
};
use rrc_sim_env::{DatasetType, Task};
use std::{fs, os::unix::fs::PermissionsExt, path::Path};
use tempdir::TempDir;

const EXAMPLE_HOST: &str = env!("CARGO_BIN_EXE_rrc_example");

fn write_config(package: &Path, task: &str, policy: &str, entry_point: Option<&str>) -> Result<()> {
    let mut text = format!("[rrc2022]\ntask = \"{task}\"\ndataset_type = \"expert\"\n");
    text.push_str(&format!("{task}_expert_policy = \"{policy}\"\n"));
    if let Some(entry_point) = entry_point {
        text.push_str(&format!("entry_point = \"{}\"\n", entry_point));
    }
    fs::write(package.join("trifinger.toml"), text)?;
    Ok(())
}

fn write_script(package: &Path, name: &str, body: &str) -> Result<()> {
    let path = package.join(name);
    fs::write(&path, format!("#!/bin/sh\n{}\n", body))?;
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;
    Ok(())
}

/// Settings which "install" a package by copying an executable into the environment.
fn settings(workspace: &Path, source: &str, entry_point: &str) -> HarnessConfig {
    HarnessConfig::default()
        .provision(CommandTemplate::new("true", &[]))
        .install(CommandTemplate::new(
            "cp",
            &[source, format!("{{env}}/bin/{}", entry_point).as_str()],
        ))
        .workspace_dir(workspace)
        .timeout_secs(Some(60))
}

#[test]
fn test_valid_package_passes() -> Result<()> {
    let workspace = TempDir::new("workspace")?;
    let package = TempDir::new("package")?;
    write_config(package.path(), "push", TRAJECTORY_POLICY, None)?;

    let config = settings(workspace.path(), EXAMPLE_HOST, "rrc_example");
    let pipeline = ValidationPipeline::new(config);
    let report = pipeline.validate(package.path())?;
    assert_eq!(report.config.task, Task::Push);
    assert_eq!(report.config.dataset_type, DatasetType::Expert);
    assert_eq!(report.config.entry_point, "rrc_example");

    // The environment is gone.
    assert_eq!(fs::read_dir(workspace.path())?.count(), 0);
    Ok(())
}

#[test]
fn test_lift_task_passes() -> Result<()> {
    let workspace = TempDir::new("workspace")?;
    let package = TempDir::new("package")?;
    write_config(package.path(), "lift", TRAJECTORY_POLICY, None)?;

    let config = settings(workspace.path(), EXAMPLE_HOST, "rrc_example");
    let pipeline = ValidationPipeline::new(config);
    assert!(pipeline.validate(package.path()).is_ok());
    Ok(())
}

#[test]
fn test_unknown_policy_is_a_resolution_error() -> Result<()> {
    let workspace = TempDir::new("workspace")?;
    let package = TempDir::new("package")?;
    write_config(package.path(), "push", "rrc_example.example.NoSuchPolicy", None)?;

    let config = settings(workspace.path(), EXAMPLE_HOST, "rrc_example");
    let pipeline = ValidationPipeline::new(config);
    let failure = pipeline.validate(package.path()).unwrap_err();
    assert_eq!(failure.step, ValidationStep::CheckPolicy);
    assert!(matches!(failure.error, HarnessError::PolicyResolutionError { .. }));
    assert_eq!(fs::read_dir(workspace.path())?.count(), 0);
    Ok(())
}

#[test]
fn test_contract_violation_exit_code() -> Result<()> {
    let workspace = TempDir::new("workspace")?;
    let package = TempDir::new("package")?;
    write_config(package.path(), "push", "bad.policies.Broken", Some("bad"))?;
    write_script(package.path(), "host.sh", "echo invalid action >&2\nexit 4")?;

    let source = package.path().join("host.sh").display().to_string();
    let pipeline = ValidationPipeline::new(settings(workspace.path(), &source, "bad"));
    let failure = pipeline.validate(package.path()).unwrap_err();
    assert_eq!(failure.step, ValidationStep::CheckPolicy);
    match &failure.error {
        HarnessError::ContractViolationError { output } => {
            assert!(output.contains("invalid action"));
        }
        e => panic!("unexpected error: {}", e),
    }
    Ok(())
}

#[test]
fn test_other_exit_code_is_a_check_error() -> Result<()> {
    let workspace = TempDir::new("workspace")?;
    let package = TempDir::new("package")?;
    write_config(package.path(), "push", "bad.policies.Broken", Some("bad"))?;
    write_script(package.path(), "host.sh", "exit 1")?;

    let source = package.path().join("host.sh").display().to_string();
    let pipeline = ValidationPipeline::new(settings(workspace.path(), &source, "bad"));
    let failure = pipeline.validate(package.path()).unwrap_err();
    assert!(matches!(failure.error, HarnessError::PolicyCheckError { .. }));
    Ok(())
}

#[test]
fn test_hanging_check_times_out() -> Result<()> {
    let workspace = TempDir::new("workspace")?;
    let package = TempDir::new("package")?;
    write_config(package.path(), "push", "slow.policies.Slow", Some("slow"))?;
    write_script(package.path(), "host.sh", "exec sleep 30")?;

    let source = package.path().join("host.sh").display().to_string();
    let config = settings(workspace.path(), &source, "slow").timeout_secs(Some(1));
    let failure = ValidationPipeline::new(config)
        .validate(package.path())
        .unwrap_err();
    assert_eq!(failure.step, ValidationStep::CheckPolicy);
    assert!(matches!(failure.error, HarnessError::ValidationTimeoutError(_)));
    assert_eq!(fs::read_dir(workspace.path())?.count(), 0);
    Ok(())
}

#[test]
fn test_failing_install() -> Result<()> {
    let workspace = TempDir::new("workspace")?;
    let package = TempDir::new("package")?;
    write_config(package.path(), "push", TRAJECTORY_POLICY, None)?;

    let config = settings(workspace.path(), EXAMPLE_HOST, "rrc_example")
        .install(CommandTemplate::new("false", &[]));
    let failure = ValidationPipeline::new(config)
        .validate(package.path())
        .unwrap_err();
    assert_eq!(failure.step, ValidationStep::InstallPackage);
    assert!(matches!(failure.error, HarnessError::InstallError { .. }));
    assert!(!failure.is_provisioning_failure());
    Ok(())
}

#[test]
fn test_failing_provisioning() -> Result<()> {
    let workspace = TempDir::new("workspace")?;
    let package = TempDir::new("package")?;
    write_config(package.path(), "push", TRAJECTORY_POLICY, None)?;

    let config = settings(workspace.path(), EXAMPLE_HOST, "rrc_example")
        .provision(CommandTemplate::new("false", &[]));
    let failure = ValidationPipeline::new(config)
        .validate(package.path())
        .unwrap_err();
    assert_eq!(failure.step, ValidationStep::CreateEnvironment);
    assert!(failure.is_provisioning_failure());
    Ok(())
}

#[test]
fn test_invalid_config_stops_before_installing() -> Result<()> {
    let workspace = TempDir::new("workspace")?;
    let package = TempDir::new("package")?;
    fs::write(
        package.path().join("trifinger.toml"),
        "[rrc2022]\ntask = \"push\"\npush_expert_policy = \"a.b.C\"\n",
    )?;

    let config = settings(workspace.path(), EXAMPLE_HOST, "rrc_example");
    let pipeline = ValidationPipeline::new(config);
    let failure = pipeline.validate(package.path()).unwrap_err();
    assert_eq!(failure.step, ValidationStep::LoadConfig);
    assert!(failure.to_string().contains("rrc2022.dataset_type"));
    assert_eq!(fs::read_dir(workspace.path())?.count(), 0);
    Ok(())
}
