use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::LaunchConfig;
use crate::env_setup::LaunchEnv;
use crate::installer::{InstallerError, requirements_command, resolve_python};
use crate::runner::{CommandSpec, Stage};

#[derive(Debug, Serialize)]
pub struct LaunchPlan {
    pub workdir: PathBuf,
    pub env: LaunchEnv,
    /// Python dependency installation, only when enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirements: Option<CommandSpec>,
    pub steps: Vec<PlannedStep>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlannedStep {
    pub stage: Stage,
    pub banner: String,
    pub command: CommandSpec,
}

impl PlannedStep {
    pub fn npm(stage: Stage, command: CommandSpec) -> Self {
        Self {
            stage,
            banner: stage.banner().to_string(),
            command,
        }
    }
}

/// Arguments passed to the npm program for each stage.
fn npm_args(stage: Stage) -> &'static [&'static str] {
    match stage {
        Stage::Install => &["install"],
        Stage::Build => &["run", "build"],
        Stage::Serve => &["start"],
    }
}

pub fn plan_launch(
    config: &LaunchConfig,
    workdir: &Path,
    env: LaunchEnv,
) -> Result<LaunchPlan, InstallerError> {
    // The interpreter is only looked up when pip is enabled.
    let requirements = if config.install_requirements {
        let python = resolve_python(config)?;
        Some(requirements_command(&python, config))
    } else {
        None
    };

    let steps = Stage::ALL
        .iter()
        .map(|&stage| {
            PlannedStep::npm(
                stage,
                CommandSpec::new(config.npm.as_str(), npm_args(stage).iter().copied()),
            )
        })
        .collect();

    Ok(LaunchPlan {
        workdir: workdir.to_path_buf(),
        env,
        requirements,
        steps,
    })
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::plan_launch;
    use crate::config::LaunchConfig;
    use crate::env_setup::LaunchEnv;
    use crate::runner::Stage;

    fn config_with_python() -> LaunchConfig {
        LaunchConfig {
            python: Some("/usr/bin/python3".to_string()),
            install_requirements: true,
            ..LaunchConfig::default()
        }
    }

    #[test]
    fn plans_three_npm_stages_in_order() {
        let plan = plan_launch(&config_with_python(), Path::new("app"), LaunchEnv::default())
            .expect("plan should build");

        let stages: Vec<Stage> = plan.steps.iter().map(|step| step.stage).collect();
        assert_eq!(stages, vec![Stage::Install, Stage::Build, Stage::Serve]);

        let commands: Vec<String> = plan.steps.iter().map(|s| s.command.to_string()).collect();
        assert_eq!(commands, vec!["npm install", "npm run build", "npm start"]);
        assert_eq!(plan.steps[2].banner, "🚀 Starting application...");
    }

    #[test]
    fn requirements_step_uses_configured_interpreter() {
        let plan = plan_launch(&config_with_python(), Path::new("."), LaunchEnv::default())
            .expect("plan should build");

        let requirements = plan.requirements.expect("requirements step planned");
        assert_eq!(
            requirements.to_string(),
            "/usr/bin/python3 -m pip install -r requirements.txt"
        );
    }

    #[test]
    fn default_plan_has_no_requirements_step() {
        let plan = plan_launch(&LaunchConfig::default(), Path::new("."), LaunchEnv::default())
            .expect("plan should build");

        assert!(plan.requirements.is_none());
        assert_eq!(plan.steps[0].command.to_string(), "npm install");
    }

    #[test]
    fn disabled_requirements_never_resolve_python() {
        let config = LaunchConfig {
            python: None,
            npm: "pnpm".to_string(),
            ..LaunchConfig::default()
        };
        let plan = plan_launch(&config, Path::new("."), LaunchEnv::default())
            .expect("plan should build");

        assert!(plan.requirements.is_none());
        assert_eq!(plan.steps[1].command.to_string(), "pnpm run build");
    }

    #[test]
    fn plan_serializes_stage_names_lowercase() {
        let plan = plan_launch(&config_with_python(), Path::new("."), LaunchEnv::default())
            .expect("plan should build");
        let json = serde_json::to_value(&plan).expect("plan serializes");

        assert_eq!(json["steps"][0]["stage"], "install");
        assert_eq!(json["steps"][2]["command"]["args"][0], "start");
    }
}
