use std::collections::BTreeMap;
use std::process::Command;

use serde::Serialize;
use tracing::debug;

use crate::config::LaunchConfig;

/// Environment handed to every child process: the defaults that were
/// missing from the launcher's own environment, plus the required
/// variables found absent.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LaunchEnv {
    pub overlay: BTreeMap<String, String>,
    pub missing: Vec<String>,
}

impl LaunchEnv {
    pub fn apply_to(&self, command: &mut Command) {
        command.envs(&self.overlay);
    }

    /// Value a child will see for `name`, if the overlay decides it.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.overlay.get(name).map(String::as_str)
    }

    pub fn warnings(&self) -> impl Iterator<Item = String> + '_ {
        self.missing
            .iter()
            .map(|name| format!("⚠️  {name} not set. Please configure in Space settings."))
    }

    pub fn print_warnings(&self) {
        for warning in self.warnings() {
            println!("{warning}");
        }
    }
}

/// Read a variable from the launcher's process environment. A value that
/// is present but not valid UTF-8 still counts as present.
pub fn process_lookup(name: &str) -> Option<String> {
    std::env::var_os(name).map(|value| value.to_string_lossy().into_owned())
}

/// Compute the launch environment against `lookup`.
///
/// A default is applied only when its variable is absent; an existing
/// value, even an empty one, is left alone. A required variable is
/// reported missing when absent or empty. Nothing here fails.
pub fn setup_environment<F>(config: &LaunchConfig, lookup: F) -> LaunchEnv
where
    F: Fn(&str) -> Option<String>,
{
    let mut env = LaunchEnv::default();

    for (name, fallback) in &config.defaults {
        if lookup(name).is_none() {
            debug!(var = %name, value = %fallback, "applying default");
            env.overlay.insert(name.clone(), fallback.clone());
        }
    }

    for name in &config.required {
        let present = lookup(name).is_some_and(|value| !value.is_empty());
        if !present {
            env.missing.push(name.clone());
        }
    }

    env
}
