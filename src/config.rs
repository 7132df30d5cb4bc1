//! Application-level configuration loading, including the pin allocator bounds.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "QUIZ_BACK_CONFIG_PATH";

/// Draws per allocation round before the round is abandoned.
const DEFAULT_PIN_DRAW_ATTEMPTS: u32 = 100;
/// Rounds before the allocator gives up entirely.
const DEFAULT_PIN_ROUND_LIMIT: u32 = 1000;
/// Reload-and-retry attempts for revision-guarded writes.
const DEFAULT_WRITE_RETRIES: u32 = 3;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Candidate draws per pin allocation round.
    pub pin_draw_attempts: u32,
    /// Maximum pin allocation rounds before failing hard.
    pub pin_round_limit: u32,
    /// How often a guarded write is retried after losing a revision race.
    pub write_retries: u32,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to the
    /// baked-in defaults when the file is missing or malformed.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    info!(path = %path.display(), "loaded configuration");
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            pin_draw_attempts: DEFAULT_PIN_DRAW_ATTEMPTS,
            pin_round_limit: DEFAULT_PIN_ROUND_LIMIT,
            write_retries: DEFAULT_WRITE_RETRIES,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    pin_draw_attempts: Option<u32>,
    pin_round_limit: Option<u32>,
    write_retries: Option<u32>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();
        Self {
            pin_draw_attempts: value.pin_draw_attempts.unwrap_or(defaults.pin_draw_attempts),
            pin_round_limit: value.pin_round_limit.unwrap_or(defaults.pin_round_limit),
            write_retries: value.write_retries.unwrap_or(defaults.write_retries),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults_for_missing_fields() {
        let raw: RawConfig = serde_json::from_str(r#"{"pin_draw_attempts": 5}"#).unwrap();
        let config: AppConfig = raw.into();
        assert_eq!(config.pin_draw_attempts, 5);
        assert_eq!(config.pin_round_limit, DEFAULT_PIN_ROUND_LIMIT);
        assert_eq!(config.write_retries, DEFAULT_WRITE_RETRIES);
    }
}
