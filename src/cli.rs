use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use crate::config::{LaunchConfig, load_config};
use crate::env_detect::detect_environment;
use crate::env_setup::{process_lookup, setup_environment};
use crate::installer::install_requirements;
use crate::planner::plan_launch;
use crate::runner::{CommandRunner, ExecutionContext, ProcessRunner, build_and_serve};

#[derive(Debug, Parser)]
#[command(
    name = "space-launcher",
    version,
    about = "Install, build and serve a Next.js app on a hosted Space"
)]
pub struct Cli {
    /// Directory the app lives in; every command runs here
    #[arg(long, global = true, default_value = ".")]
    project_dir: PathBuf,
    /// JSON file overriding the built-in launch settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Run `pip install -r <requirements>` before the npm stages
    #[arg(long, global = true)]
    with_requirements: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Report host, tools and environment variables as JSON
    Check {
        /// Emit compact JSON instead of pretty output
        #[arg(long)]
        raw: bool,
    },
    /// Print the launch plan as JSON without running anything
    Plan {
        /// Emit compact JSON instead of pretty output
        #[arg(long)]
        raw: bool,
    },
}

/// Parse arguments and run. `Ok` carries the exit code; `Err` is an
/// unhandled failure.
pub fn run() -> anyhow::Result<i32> {
    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;
    if cli.with_requirements {
        config.install_requirements = true;
    }

    match cli.command {
        None => launch(&ProcessRunner, &config, &cli.project_dir, process_lookup),
        Some(Commands::Check { raw }) => {
            let report = detect_environment(&config, process_lookup);
            print_json(&report, raw)?;
            Ok(0)
        }
        Some(Commands::Plan { raw }) => {
            let env = setup_environment(&config, process_lookup);
            let plan = plan_launch(&config, &cli.project_dir, env)?;
            print_json(&plan, raw)?;
            Ok(0)
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T, raw: bool) -> anyhow::Result<()> {
    if raw {
        println!("{}", serde_json::to_string(value)?);
    } else {
        println!("{}", serde_json::to_string_pretty(value)?);
    }
    Ok(())
}

/// Setup, Python requirements when enabled, then npm install/build/start.
pub fn launch<R, F>(
    runner: &R,
    config: &LaunchConfig,
    project_dir: &Path,
    lookup: F,
) -> anyhow::Result<i32>
where
    R: CommandRunner + ?Sized,
    F: Fn(&str) -> Option<String>,
{
    let env = setup_environment(config, lookup);
    env.print_warnings();

    let plan = plan_launch(config, project_dir, env)?;
    info!(workdir = %plan.workdir.display(), steps = plan.steps.len(), "launch planned");
    let ctx = ExecutionContext::new(plan.workdir.clone(), plan.env.clone());

    if let Some(command) = &plan.requirements {
        install_requirements(runner, &ctx, command, config.requirements.clone())?;
    }

    build_and_serve(runner, &ctx, &plan.steps).context("running npm build and serve")
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::Path;

    use super::{Cli, launch};
    use crate::config::LaunchConfig;
    use crate::installer::InstallerError;
    use crate::runner::tests::ScriptedRunner;
    use clap::Parser;

    fn config_with_pip() -> LaunchConfig {
        LaunchConfig {
            python: Some("python3".to_string()),
            install_requirements: true,
            ..LaunchConfig::default()
        }
    }

    fn no_vars(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn default_launch_runs_only_the_npm_stages() {
        let runner = ScriptedRunner::default();
        let code = launch(&runner, &LaunchConfig::default(), Path::new("."), no_vars)
            .expect("launch succeeds");

        assert_eq!(code, 0);
        assert_eq!(
            runner.calls(),
            vec!["npm install", "npm run build", "npm start"]
        );
    }

    #[test]
    fn first_subprocess_failure_exits_one_with_no_later_call() {
        let runner = ScriptedRunner::failing_on("npm install");
        let code = launch(&runner, &LaunchConfig::default(), Path::new("."), no_vars)
            .expect("handled failure");

        assert_eq!(code, 1);
        assert_eq!(runner.calls(), vec!["npm install"]);
    }

    #[test]
    fn enabled_requirements_run_pip_before_npm() {
        let runner = ScriptedRunner::default();
        let code =
            launch(&runner, &config_with_pip(), Path::new("."), no_vars).expect("launch succeeds");

        assert_eq!(code, 0);
        assert_eq!(
            runner.calls(),
            vec![
                "python3 -m pip install -r requirements.txt",
                "npm install",
                "npm run build",
                "npm start",
            ]
        );
    }

    #[test]
    fn missing_credentials_do_not_stop_the_launch() {
        let vars = HashMap::from([("NODE_ENV", "production")]);
        let runner = ScriptedRunner::default();
        let code = launch(&runner, &LaunchConfig::default(), Path::new("."), |name: &str| {
            vars.get(name).map(|value| value.to_string())
        })
        .expect("launch succeeds");

        assert_eq!(code, 0);
        assert_eq!(runner.calls().len(), 3);
    }

    #[test]
    fn pip_failure_is_unhandled_and_stops_everything() {
        let runner = ScriptedRunner::failing_on("python3 -m pip install -r requirements.txt");
        let err = launch(&runner, &config_with_pip(), Path::new("."), no_vars)
            .expect_err("installer failure propagates");

        assert!(err.downcast_ref::<InstallerError>().is_some());
        assert_eq!(runner.calls().len(), 1);
    }

    #[test]
    fn build_failure_exits_one() {
        let runner = ScriptedRunner::failing_on("npm run build");
        let code = launch(&runner, &LaunchConfig::default(), Path::new("."), no_vars)
            .expect("handled failure");

        assert_eq!(code, 1);
        assert_eq!(runner.calls(), vec!["npm install", "npm run build"]);
    }

    #[test]
    fn no_arguments_means_launch() {
        let cli = Cli::try_parse_from(["space-launcher"]).expect("no args parse");
        assert!(cli.command.is_none());
        assert_eq!(cli.project_dir, Path::new("."));
        assert!(cli.config.is_none());
        assert!(!cli.with_requirements);
    }

    #[test]
    fn global_flags_work_after_subcommand() {
        let cli = Cli::try_parse_from(["space-launcher", "plan", "--raw", "--project-dir", "app"])
            .expect("flags parse");
        assert_eq!(cli.project_dir, Path::new("app"));
        assert!(cli.command.is_some());
    }
}
