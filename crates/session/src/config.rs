use std::{fs, path::Path, time::Duration};

use anyhow::Context;
use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub solver_url: String,
    pub request_timeout_seconds: u64,
    pub edge_reveal_millis: u64,
    pub backup_reveal_millis: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            solver_url: "http://127.0.0.1:5000".into(),
            request_timeout_seconds: 30,
            edge_reveal_millis: 900,
            backup_reveal_millis: 0,
        }
    }
}

impl SessionSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn edge_reveal(&self) -> Duration {
        Duration::from_millis(self.edge_reveal_millis)
    }

    pub fn backup_reveal(&self) -> Duration {
        Duration::from_millis(self.backup_reveal_millis)
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(v) = var("GRID_SOLVER_URL") {
            self.solver_url = v;
        }
        if let Some(v) = var("APP__SOLVER_URL") {
            self.solver_url = v;
        }

        if let Some(v) = var("APP__REQUEST_TIMEOUT_SECONDS") {
            if let Ok(parsed) = v.parse::<u64>() {
                self.request_timeout_seconds = parsed;
            }
        }
        if let Some(v) = var("APP__EDGE_REVEAL_MILLIS") {
            if let Ok(parsed) = v.parse::<u64>() {
                self.edge_reveal_millis = parsed;
            }
        }
        if let Some(v) = var("APP__BACKUP_REVEAL_MILLIS") {
            if let Ok(parsed) = v.parse::<u64>() {
                self.backup_reveal_millis = parsed;
            }
        }
    }
}

/// Defaults, then `session.toml` in the working directory, then the
/// environment.
pub fn load_session_settings() -> SessionSettings {
    match load_session_settings_from("session.toml") {
        Ok(settings) => settings,
        Err(err) => {
            warn!("ignoring session.toml: {err:#}");
            let mut settings = SessionSettings::default();
            settings.apply_env(|key| std::env::var(key).ok());
            settings
        }
    }
}

pub fn load_session_settings_from(path: impl AsRef<Path>) -> anyhow::Result<SessionSettings> {
    let path = path.as_ref();
    let mut settings = match fs::read_to_string(path) {
        Ok(raw) => toml::from_str::<SessionSettings>(&raw)
            .with_context(|| format!("failed to parse '{}'", path.display()))?,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => SessionSettings::default(),
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read '{}'", path.display()))
        }
    };
    settings.apply_env(|key| std::env::var(key).ok());
    Ok(settings)
}
