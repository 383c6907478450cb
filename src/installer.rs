use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, info};
use which::which;

use crate::config::LaunchConfig;
use crate::runner::{CommandError, CommandRunner, CommandSpec, ExecutionContext};

const PYTHON_CANDIDATES: [&str; 2] = ["python3", "python"];

#[derive(Debug, Error)]
pub enum InstallerError {
    #[error("no Python interpreter found on PATH (tried {})", PYTHON_CANDIDATES.join(", "))]
    PythonNotFound,
    #[error("installing Python requirements from {}", .manifest.display())]
    Install {
        manifest: PathBuf,
        #[source]
        source: CommandError,
    },
}

/// Interpreter used for `-m pip`: the configured one, else the first
/// candidate found on `PATH`.
pub fn resolve_python(config: &LaunchConfig) -> Result<String, InstallerError> {
    if let Some(python) = &config.python {
        return Ok(python.clone());
    }

    for candidate in PYTHON_CANDIDATES {
        if let Ok(path) = which(candidate) {
            debug!(python = %path.display(), "resolved interpreter");
            return Ok(path.to_string_lossy().into_owned());
        }
    }

    Err(InstallerError::PythonNotFound)
}

pub fn requirements_command(python: &str, config: &LaunchConfig) -> CommandSpec {
    CommandSpec::new(
        python,
        [
            "-m".to_string(),
            "pip".to_string(),
            "install".to_string(),
            "-r".to_string(),
            config.requirements.to_string_lossy().into_owned(),
        ],
    )
}

/// Install the Python requirements. Failures are returned as-is for the
/// caller to propagate; nothing is printed here.
pub fn install_requirements<R: CommandRunner + ?Sized>(
    runner: &R,
    ctx: &ExecutionContext,
    command: &CommandSpec,
    manifest: PathBuf,
) -> Result<(), InstallerError> {
    info!(command = %command, "installing python requirements");
    runner
        .run(command, ctx)
        .map_err(|source| InstallerError::Install { manifest, source })
}
