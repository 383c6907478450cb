use std::path::PathBuf;

use serde::Serialize;
use sysinfo::System;
use which::which;

use crate::config::LaunchConfig;
use crate::env_setup::setup_environment;

/// Read-only picture of the host, used by `space-launcher check`.
#[derive(Debug, Clone, Serialize)]
pub struct HostReport {
    pub os: String,
    pub os_version: String,
    pub cpu_arch: String,
    pub tools: Vec<ToolStatus>,
    pub variables: Vec<VariableStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolStatus {
    pub name: String,
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VariableStatus {
    pub name: String,
    #[serde(flatten)]
    pub state: VariableState,
}

/// Values of variables that are already set are never reported, since the
/// required ones are credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum VariableState {
    Set,
    Defaulted { value: String },
    Missing,
}

pub fn detect_environment<F>(config: &LaunchConfig, lookup: F) -> HostReport
where
    F: Fn(&str) -> Option<String>,
{
    let os_version = System::long_os_version()
        .or_else(System::os_version)
        .unwrap_or_else(|| "unknown".to_string());

    HostReport {
        os: std::env::consts::OS.to_string(),
        os_version,
        cpu_arch: normalize_arch(std::env::consts::ARCH),
        tools: tool_names(config).into_iter().map(tool_status).collect(),
        variables: variable_statuses(config, lookup),
    }
}

/// Tools worth reporting, configured interpreter first, each named once.
fn tool_names(config: &LaunchConfig) -> Vec<&str> {
    let candidates = config
        .python
        .as_deref()
        .into_iter()
        .chain(["python3", "python", config.npm.as_str(), "node"]);

    let mut names = Vec::new();
    for name in candidates {
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

fn tool_status(name: &str) -> ToolStatus {
    ToolStatus {
        name: name.to_string(),
        path: which(name).ok(),
    }
}

fn variable_statuses<F>(config: &LaunchConfig, lookup: F) -> Vec<VariableStatus>
where
    F: Fn(&str) -> Option<String>,
{
    let env = setup_environment(config, &lookup);

    let defaulted = config.defaults.keys().map(|name| VariableStatus {
        name: name.clone(),
        state: match env.get(name) {
            Some(value) => VariableState::Defaulted {
                value: value.to_string(),
            },
            None => VariableState::Set,
        },
    });

    let required = config.required.iter().map(|name| VariableStatus {
        name: name.clone(),
        state: if env.missing.contains(name) {
            VariableState::Missing
        } else {
            VariableState::Set
        },
    });

    defaulted.chain(required).collect()
}

fn normalize_arch(raw: &str) -> String {
    match raw {
        "x86_64" => "x64".to_string(),
        "aarch64" => "arm64".to_string(),
        other => other.to_lowercase(),
    }
}
