use std::{
    collections::HashMap,
    fs,
    path::Path,
    time::Duration,
};

use capture_core::ControllerConfig;
use shared::{domain::DevicePosition, error::ParsePositionError};
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "capture.toml";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse settings file '{path}': {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
    #[error("invalid value for 'initial_position': {0}")]
    InvalidPosition(#[from] ParsePositionError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub orientation_poll_ms: u64,
    pub frame_interval_ms: u64,
    pub initial_position: DevicePosition,
    pub log_filter: String,
    pub step_delay_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            orientation_poll_ms: 100,
            frame_interval_ms: 33,
            initial_position: DevicePosition::Front,
            log_filter: "info".into(),
            step_delay_ms: 250,
        }
    }
}

impl Settings {
    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            orientation_poll_interval: Duration::from_millis(self.orientation_poll_ms),
            initial_position: self.initial_position,
            ..ControllerConfig::default()
        }
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }

    fn apply(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        match key {
            "orientation_poll_ms" => self.orientation_poll_ms = parse_millis(key, value)?,
            "frame_interval_ms" => self.frame_interval_ms = parse_millis(key, value)?,
            "step_delay_ms" => self.step_delay_ms = parse_millis(key, value)?,
            "initial_position" => self.initial_position = value.parse()?,
            "log_filter" => self.log_filter = value.to_string(),
            _ => {}
        }
        Ok(())
    }
}

/// Defaults, then the optional TOML file, then environment overrides.
/// A missing file is not an error; a malformed one is.
pub fn load_settings(path: &Path) -> Result<Settings, SettingsError> {
    let mut settings = Settings::default();

    match fs::read_to_string(path) {
        Ok(raw) => apply_file(&mut settings, path, &raw)?,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(source) => {
            return Err(SettingsError::Read {
                path: path.display().to_string(),
                source,
            })
        }
    }

    apply_env(&mut settings, |name| std::env::var(name).ok())?;
    Ok(settings)
}

fn apply_file(settings: &mut Settings, path: &Path, raw: &str) -> Result<(), SettingsError> {
    let file_cfg = toml::from_str::<HashMap<String, toml::Value>>(raw).map_err(|source| {
        SettingsError::Parse {
            path: path.display().to_string(),
            source,
        }
    })?;

    for (key, value) in &file_cfg {
        let value = match value {
            toml::Value::String(v) => v.clone(),
            other => other.to_string(),
        };
        settings.apply(key, &value)?;
    }
    Ok(())
}

const ENV_KEYS: [&str; 5] = [
    "orientation_poll_ms",
    "frame_interval_ms",
    "initial_position",
    "log_filter",
    "step_delay_ms",
];

/// `CAPTURE_<KEY>` first, then `APP__<KEY>`, so the latter wins.
fn apply_env(
    settings: &mut Settings,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), SettingsError> {
    for key in ENV_KEYS {
        let upper = key.to_ascii_uppercase();
        for name in [format!("CAPTURE_{upper}"), format!("APP__{upper}")] {
            if let Some(value) = lookup(&name) {
                settings.apply(key, &value)?;
            }
        }
    }
    Ok(())
}

fn parse_millis(key: &str, value: &str) -> Result<u64, SettingsError> {
    let millis = value
        .trim()
        .parse::<u64>()
        .map_err(|err| SettingsError::InvalidValue {
            key: key.to_string(),
            message: err.to_string(),
        })?;
    if millis == 0 {
        return Err(SettingsError::InvalidValue {
            key: key.to_string(),
            message: "must be greater than zero".into(),
        });
    }
    Ok(millis)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
