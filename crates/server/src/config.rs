use std::{fs, path::Path, time::Duration};

use anyhow::Context;
use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub bind_addr: String,
    pub compute_timeout_seconds: u64,
    pub max_body_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:5000".into(),
            compute_timeout_seconds: 30,
            max_body_bytes: 1024 * 1024,
        }
    }
}

impl Settings {
    pub fn compute_timeout(&self) -> Duration {
        Duration::from_secs(self.compute_timeout_seconds)
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(v) = var("SOLVER_BIND") {
            self.bind_addr = v;
        }
        if let Some(v) = var("APP__BIND_ADDR") {
            self.bind_addr = v;
        }

        if let Some(v) = var("APP__COMPUTE_TIMEOUT_SECONDS") {
            if let Ok(parsed) = v.parse::<u64>() {
                self.compute_timeout_seconds = parsed;
            }
        }
        if let Some(v) = var("APP__MAX_BODY_BYTES") {
            if let Ok(parsed) = v.parse::<usize>() {
                self.max_body_bytes = parsed;
            }
        }
    }
}

pub fn load_settings() -> Settings {
    match load_settings_from("solver.toml") {
        Ok(settings) => settings,
        Err(err) => {
            warn!("ignoring solver.toml: {err:#}");
            let mut settings = Settings::default();
            settings.apply_env(|key| std::env::var(key).ok());
            settings
        }
    }
}

fn load_settings_from(path: impl AsRef<Path>) -> anyhow::Result<Settings> {
    let path = path.as_ref();
    let mut settings = match fs::read_to_string(path) {
        Ok(raw) => toml::from_str::<Settings>(&raw)
            .with_context(|| format!("failed to parse '{}'", path.display()))?,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Settings::default(),
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read '{}'", path.display()))
        }
    };
    settings.apply_env(|key| std::env::var(key).ok());
    Ok(settings)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
