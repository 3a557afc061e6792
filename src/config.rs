//! Application-level configuration loading: grid sizes, timers, bank location and operator credentials.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use serde_with::{DurationSeconds, serde_as};
use tracing::{info, warn};

use crate::state::question::Part;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "QUIZ_SHOW_BACK_CONFIG_PATH";
/// Environment variable selecting the storage backend.
const STORAGE_BACKEND_ENV: &str = "STORAGE_BACKEND";

/// Immutable runtime configuration shared across the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Cells in the part 1 grid.
    pub part_one_cells: u16,
    /// Cells in the part 2 grid.
    pub part_two_cells: u16,
    /// Rows of the bulk source assigned to part 1.
    pub part_one_rows: usize,
    /// Countdown started when a single question is shown.
    pub question_countdown: Duration,
    /// Remaining seconds at which the warning starts and the cue fires.
    pub warning_threshold_secs: u32,
    /// Time's-up indicator before a single question answer is revealed.
    pub question_overlay: Duration,
    /// Time's-up overlay before challenge answers are revealed.
    pub challenge_overlay: Duration,
    /// Budget of a challenge sub-question stored without a time.
    pub default_sub_question_secs: u32,
    /// Time assigned to questions added without one.
    pub default_question_secs: u32,
    /// Time assigned to new challenge sub-questions without one.
    pub new_sub_question_secs: u32,
    /// CSV file the bank is reloaded from.
    pub question_csv_path: PathBuf,
    pub operator: OperatorCredentials,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorCredentials {
    pub username: String,
    pub password: String,
}

impl AppConfig {
    /// Load the configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        csv = %app_config.question_csv_path.display(),
                        "loaded console configuration"
                    );
                    app_config
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

    /// Number of cells of the grid for `part`.
    pub fn cells(&self, part: Part) -> u16 {
        match part {
            Part::One => self.part_one_cells,
            Part::Two => self.part_two_cells,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        RawConfig::default().into()
    }
}

/// JSON representation of the configuration file; every field is optional.
#[serde_as]
#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawConfig {
    part_one_cells: u16,
    part_two_cells: u16,
    part_one_rows: usize,
    #[serde_as(as = "DurationSeconds<u64>")]
    question_countdown: Duration,
    warning_threshold: u32,
    #[serde_as(as = "DurationSeconds<u64>")]
    question_overlay: Duration,
    #[serde_as(as = "DurationSeconds<u64>")]
    challenge_overlay: Duration,
    default_sub_question_time: u32,
    default_question_time: u32,
    new_sub_question_time: u32,
    question_csv_path: PathBuf,
    operator: RawOperator,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            part_one_cells: 58,
            part_two_cells: 60,
            part_one_rows: 58,
            question_countdown: Duration::from_secs(150),
            warning_threshold: 10,
            question_overlay: Duration::from_secs(2),
            challenge_overlay: Duration::from_secs(3),
            default_sub_question_time: 300,
            default_question_time: 300,
            new_sub_question_time: 60,
            question_csv_path: PathBuf::from("data/questions.csv"),
            operator: RawOperator::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawOperator {
    username: String,
    password: String,
}

impl Default for RawOperator {
    fn default() -> Self {
        Self {
            username: "operator".into(),
            password: "operator".into(),
        }
    }
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        Self {
            part_one_cells: value.part_one_cells,
            part_two_cells: value.part_two_cells,
            part_one_rows: value.part_one_rows,
            question_countdown: value.question_countdown,
            warning_threshold_secs: value.warning_threshold,
            question_overlay: value.question_overlay,
            challenge_overlay: value.challenge_overlay,
            default_sub_question_secs: value.default_sub_question_time,
            default_question_secs: value.default_question_time,
            new_sub_question_secs: value.new_sub_question_time,
            question_csv_path: value.question_csv_path,
            operator: OperatorCredentials {
                username: value.operator.username,
                password: value.operator.password,
            },
        }
    }
}

/// Persistence backend selected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Couch,
    Mongo,
}

impl StorageBackend {
    /// Read `STORAGE_BACKEND` (`memory`, `couch`, `mongo`); defaults to MongoDB when compiled in.
    pub fn from_env() -> Self {
        let default = if cfg!(feature = "mongo-store") {
            StorageBackend::Mongo
        } else if cfg!(feature = "couch-store") {
            StorageBackend::Couch
        } else {
            StorageBackend::Memory
        };

        match env::var(STORAGE_BACKEND_ENV) {
            Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
                "memory" => StorageBackend::Memory,
                "couch" | "couchdb" => StorageBackend::Couch,
                "mongo" | "mongodb" => StorageBackend::Mongo,
                other => {
                    warn!(backend = other, ?default, "unknown storage backend; using default");
                    default
                }
            },
            Err(_) => default,
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
    fn defaults_match_show_format() {
        let config = AppConfig::default();
        assert_eq!(config.part_one_cells, 58);
        assert_eq!(config.part_two_cells, 60);
        assert_eq!(config.question_countdown, Duration::from_secs(150));
        assert_eq!(config.challenge_overlay, Duration::from_secs(3));
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let raw: RawConfig = serde_json::from_str(
            r#"{"question_countdown": 90, "operator": {"password": "secret"}}"#,
        )
        .unwrap();
        let config = AppConfig::from(raw);
        assert_eq!(config.question_countdown, Duration::from_secs(90));
        assert_eq!(config.operator.username, "operator");
        assert_eq!(config.operator.password, "secret");
        assert_eq!(config.part_two_cells, 60);
    }
}
