//! Application-level configuration loading: roster, foul thresholds and snapshot location.

use std::{collections::HashSet, env, fs, io::ErrorKind, path::PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::{Validate, ValidationError};

use crate::state::{FoulThresholds, Player, Roster};

/// Default location on disk where the binary looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/courtside.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "COURTSIDE_CONFIG_PATH";
/// Default snapshot file, relative to the working directory.
const DEFAULT_SNAPSHOT_PATH: &str = "courtside-snapshot.json";
/// Environment variable that overrides the snapshot path from the file.
const SNAPSHOT_PATH_ENV: &str = "COURTSIDE_SNAPSHOT_PATH";

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    roster: Roster,
    thresholds: FoulThresholds,
    snapshot_path: PathBuf,
}

impl AppConfig {
    /// Load the configuration from disk, falling back to the built-in team.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let mut config = match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(config) => {
                    info!(
                        path = %path.display(),
                        players = config.roster.len(),
                        "loaded roster from config"
                    );
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "invalid config; falling back to defaults"
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
        };

        if let Some(path) = env::var_os(SNAPSHOT_PATH_ENV).filter(|path| !path.is_empty()) {
            config.snapshot_path = PathBuf::from(path);
        }
        config
    }

    /// Parse and validate a JSON configuration document.
    pub fn from_json(contents: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_json::from_str(contents)?;
        raw.validate()?;
        Ok(raw.into())
    }

    /// Players available for the match.
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Foul warning and maximum counts.
    pub fn thresholds(&self) -> FoulThresholds {
        self.thresholds
    }

    /// File backing the snapshot store.
    pub fn snapshot_path(&self) -> &PathBuf {
        &self.snapshot_path
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            roster: default_roster(),
            thresholds: FoulThresholds::default(),
            snapshot_path: PathBuf::from(DEFAULT_SNAPSHOT_PATH),
        }
    }
}

/// Why a configuration document was rejected.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Not valid JSON for the expected shape.
    #[error("malformed config")]
    Parse(#[from] serde_json::Error),
    /// Well-formed but semantically invalid.
    #[error("invalid config: {0}")]
    Invalid(#[from] validator::ValidationErrors),
}

#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "validate_thresholds"))]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default = "default_raw_roster")]
    #[validate(length(min = 6), nested, custom(function = "validate_unique_numbers"))]
    roster: Vec<RawPlayer>,
    #[serde(default = "default_max_fouls")]
    #[validate(range(min = 1))]
    max_fouls: u32,
    #[serde(default = "default_foul_warning")]
    #[validate(range(min = 1))]
    foul_warning: u32,
    #[serde(default)]
    snapshot_path: Option<PathBuf>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        Self {
            roster: Roster::new(value.roster.into_iter().map(Into::into).collect()),
            thresholds: FoulThresholds {
                warning: value.foul_warning,
                max: value.max_fouls,
            },
            snapshot_path: value
                .snapshot_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SNAPSHOT_PATH)),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
/// JSON representation of a single roster entry.
struct RawPlayer {
    #[validate(length(min = 1))]
    name: String,
    #[validate(range(min = 1))]
    number: u32,
}

impl From<RawPlayer> for Player {
    fn from(value: RawPlayer) -> Self {
        Player::new(value.name, value.number)
    }
}

#[allow(clippy::ptr_arg)]
fn validate_unique_numbers(roster: &Vec<RawPlayer>) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    if let Some(duplicate) = roster.iter().find(|player| !seen.insert(player.number)) {
        let mut err = ValidationError::new("duplicate_number");
        err.message = Some(format!("jersey number {} is listed twice", duplicate.number).into());
        return Err(err);
    }
    Ok(())
}

fn validate_thresholds(raw: &RawConfig) -> Result<(), ValidationError> {
    if raw.foul_warning > raw.max_fouls {
        let mut err = ValidationError::new("foul_thresholds");
        err.message = Some("foul_warning must not exceed max_fouls".into());
        return Err(err);
    }
    Ok(())
}

fn default_max_fouls() -> u32 {
    FoulThresholds::default().max
}

fn default_foul_warning() -> u32 {
    FoulThresholds::default().warning
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

const DEFAULT_PLAYERS: [(&str, u32); 10] = [
    ("Allison", 1),
    ("Amylia", 2),
    ("Kaylee", 3),
    ("Mikayla", 4),
    ("Marin", 5),
    ("Avery", 6),
    ("Jissel", 7),
    ("Brielle", 8),
    ("Kaelie", 9),
    ("Natassja", 10),
];

fn default_raw_roster() -> Vec<RawPlayer> {
    DEFAULT_PLAYERS
        .iter()
        .map(|(name, number)| RawPlayer {
            name: (*name).to_owned(),
            number: *number,
        })
        .collect()
}

/// Built-in team shipped with the binary.
fn default_roster() -> Roster {
    Roster::new(default_raw_roster().into_iter().map(Into::into).collect())
}
