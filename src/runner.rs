//! Command execution and the build-and-serve sequence.
//!
//! [`CommandRunner`] separates the sequencing from process spawning, so
//! tests can script outcomes without starting `npm`.

use std::fmt;
use std::path::PathBuf;
use std::process::{Command, ExitStatus};

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::env_setup::LaunchEnv;
use crate::exit_codes;
use crate::planner::PlannedStep;

/// A program and its fixed argument list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// The command ran and reported failure.
    #[error("command `{command}` returned non-zero exit status {}", describe_code(.code))]
    Failed { command: String, code: Option<i32> },
    /// The command could not be started.
    #[error("failed to start `{command}`")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "(terminated by signal)".to_string(),
    }
}

/// Where and with which environment commands run.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub workdir: PathBuf,
    pub env: LaunchEnv,
}

impl ExecutionContext {
    pub fn new(workdir: impl Into<PathBuf>, env: LaunchEnv) -> Self {
        Self {
            workdir: workdir.into(),
            env,
        }
    }
}

pub trait CommandRunner {
    /// Run `command` to completion, blocking until it exits.
    fn run(&self, command: &CommandSpec, ctx: &ExecutionContext) -> Result<(), CommandError>;
}

/// Runner that spawns real child processes with inherited stdio.
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    #[instrument(skip_all, fields(command = %command))]
    fn run(&self, command: &CommandSpec, ctx: &ExecutionContext) -> Result<(), CommandError> {
        debug!(workdir = %ctx.workdir.display(), "spawning");

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args).current_dir(&ctx.workdir);
        ctx.env.apply_to(&mut cmd);

        let status = cmd.status().map_err(|source| CommandError::Spawn {
            command: command.to_string(),
            source,
        })?;

        check_status(command, status)
    }
}

fn check_status(command: &CommandSpec, status: ExitStatus) -> Result<(), CommandError> {
    if status.success() {
        debug!("command succeeded");
        return Ok(());
    }

    warn!(exit_code = ?status.code(), "command failed");
    Err(CommandError::Failed {
        command: command.to_string(),
        code: status.code(),
    })
}

/// Stages of the build-and-serve sequence, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Install,
    Build,
    Serve,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::Install, Stage::Build, Stage::Serve];

    pub fn banner(self) -> &'static str {
        match self {
            Stage::Install => "📦 Installing dependencies...",
            Stage::Build => "🔨 Building application...",
            Stage::Serve => "🚀 Starting application...",
        }
    }
}

/// Run the planned npm steps in order, stopping at the first failure.
///
/// Only [`CommandError::Failed`] is handled: it is printed and turned into
/// exit code 1. A command that cannot be spawned is returned to the caller.
pub fn build_and_serve<R: CommandRunner + ?Sized>(
    runner: &R,
    ctx: &ExecutionContext,
    steps: &[PlannedStep],
) -> Result<i32, CommandError> {
    match run_steps(runner, ctx, steps) {
        Ok(()) => Ok(exit_codes::OK),
        Err(err @ CommandError::Failed { .. }) => {
            println!("❌ Error: {err}");
            Ok(exit_codes::COMMAND_FAILED)
        }
        Err(err) => Err(err),
    }
}

fn run_steps<R: CommandRunner + ?Sized>(
    runner: &R,
    ctx: &ExecutionContext,
    steps: &[PlannedStep],
) -> Result<(), CommandError> {
    for step in steps {
        println!("{}", step.banner);
        info!(stage = ?step.stage, command = %step.command, "running stage");
        runner.run(&step.command, ctx)?;
    }
    Ok(())
}
