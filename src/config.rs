use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const APP_URL_VAR: &str = "NEXT_PUBLIC_APP_URL";
pub const NODE_ENV_VAR: &str = "NODE_ENV";
pub const SUPABASE_URL_VAR: &str = "NEXT_PUBLIC_SUPABASE_URL";
pub const SUPABASE_ANON_KEY_VAR: &str = "NEXT_PUBLIC_SUPABASE_ANON_KEY";

pub const DEFAULT_APP_URL: &str = "https://your-space-name.hf.space";
pub const DEFAULT_NODE_ENV: &str = "production";

/// Launch configuration. Every field has a built-in value, so an absent
/// file and `{}` behave the same.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LaunchConfig {
    /// Python requirements file, relative to the project directory.
    pub requirements: PathBuf,
    /// Interpreter used for `-m pip`. Looked up on `PATH` when unset.
    pub python: Option<String>,
    /// Node package manager program.
    pub npm: String,
    /// Variables assigned only when absent from the environment.
    pub defaults: BTreeMap<String, String>,
    /// Variables that produce a warning when absent or empty.
    pub required: Vec<String>,
    /// Run `pip install` for `requirements` before the npm stages.
    pub install_requirements: bool,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        let mut defaults = BTreeMap::new();
        defaults.insert(APP_URL_VAR.to_string(), DEFAULT_APP_URL.to_string());
        defaults.insert(NODE_ENV_VAR.to_string(), DEFAULT_NODE_ENV.to_string());

        Self {
            requirements: PathBuf::from("requirements.txt"),
            python: None,
            npm: "npm".to_string(),
            defaults,
            required: vec![
                SUPABASE_URL_VAR.to_string(),
                SUPABASE_ANON_KEY_VAR.to_string(),
            ],
            install_requirements: false,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("config field '{0}' must not be empty")]
    EmptyField(&'static str),
    #[error("invalid environment variable name '{0}'")]
    InvalidVarName(String),
}

/// Load the configuration at `path`, or the built-in one when `path` is `None`.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<LaunchConfig> {
    let Some(path) = path else {
        return Ok(LaunchConfig::default());
    };

    let data = fs::read_to_string(path)
        .with_context(|| format!("reading launch config at {}", path.display()))?;
    let config: LaunchConfig = serde_json::from_str(&data)
        .with_context(|| format!("parsing launch config at {}", path.display()))?;
    validate_config(config).with_context(|| format!("validating launch config at {}", path.display()))
}

fn validate_config(config: LaunchConfig) -> Result<LaunchConfig, ConfigValidationError> {
    if config.npm.trim().is_empty() {
        return Err(ConfigValidationError::EmptyField("npm"));
    }

    if config.requirements.as_os_str().is_empty() {
        return Err(ConfigValidationError::EmptyField("requirements"));
    }

    if let Some(python) = &config.python {
        if python.trim().is_empty() {
            return Err(ConfigValidationError::EmptyField("python"));
        }
    }

    for name in config.defaults.keys().chain(config.required.iter()) {
        validate_var_name(name)?;
    }

    Ok(config)
}

fn validate_var_name(name: &str) -> Result<(), ConfigValidationError> {
    if name.is_empty() || name.contains('=') || name.contains('\0') {
        return Err(ConfigValidationError::InvalidVarName(name.to_string()));
    }
    Ok(())
}
