//! Configuration loading and typed settings for the snapshot jobs.
//!
//! Settings live in a single flat document (`pulse-config.json` by default)
//! whose camelCase keys are shared with the host's settings file. A `.json`
//! file is parsed as JSON; any other extension is parsed as YAML. Every key
//! is optional and falls back to the defaults below.
//!
//! A [`SnapshotConfig`] is immutable once published. A reload builds a new
//! value and the scheduler swaps it in whole, so a poll never observes a
//! mix of old and new settings.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::job::JobKind;

/// Errors that can occur when loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse JSON content.
    #[error("failed to parse config JSON: {source}")]
    Json {
        /// The underlying JSON parse error.
        source: serde_json::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but is not usable.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_json::Error> for ConfigError {
    fn from(source: serde_json::Error) -> Self {
        Self::Json { source }
    }
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Maximum number of records a job may write per export.
///
/// Serialized as an integer: any negative value means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum RecordLimit {
    /// No cap.
    Unbounded,
    /// At most this many records.
    Max(usize),
}

impl RecordLimit {
    /// Whether a batch already holding `len` records is full.
    pub const fn is_reached(self, len: usize) -> bool {
        match self {
            Self::Unbounded => false,
            Self::Max(max) => len >= max,
        }
    }
}

impl From<i64> for RecordLimit {
    fn from(raw: i64) -> Self {
        usize::try_from(raw).map_or(Self::Unbounded, Self::Max)
    }
}

impl From<RecordLimit> for i64 {
    fn from(limit: RecordLimit) -> Self {
        match limit {
            RecordLimit::Unbounded => -1,
            RecordLimit::Max(max) => Self::try_from(max).unwrap_or(Self::MAX),
        }
    }
}

impl core::fmt::Display for RecordLimit {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Unbounded => f.write_str("unbounded"),
            Self::Max(max) => write!(f, "{max}"),
        }
    }
}

/// Top-level exporter configuration.
///
/// Mirrors the host settings document. All fields have defaults so an
/// empty document is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotConfig {
    /// Emit per-cycle info and per-entity warnings.
    #[serde(default)]
    pub enable_logging: bool,

    /// Schedule the player job.
    #[serde(default = "default_true")]
    pub enable_player_output: bool,

    /// Seconds between player polls.
    #[serde(default = "default_player_interval_seconds")]
    pub player_interval_seconds: u64,

    /// Cap on player records per export.
    #[serde(default = "default_player_max_records")]
    pub player_max_records: RecordLimit,

    /// Directory for the player file, absolute or relative to the working
    /// directory.
    #[serde(default = "default_output_path")]
    pub player_output_path: String,

    /// File name of the player export.
    #[serde(default = "default_player_output_file")]
    pub player_output_file: String,

    /// Schedule the region job.
    #[serde(default = "default_true")]
    pub enable_region_output: bool,

    /// Seconds between region polls.
    #[serde(default = "default_region_interval_seconds")]
    pub region_interval_seconds: u64,

    /// Cap on region records per export.
    #[serde(default = "default_region_max_records")]
    pub region_max_records: RecordLimit,

    /// Directory for the region file.
    #[serde(default = "default_output_path")]
    pub region_output_path: String,

    /// File name of the region export.
    #[serde(default = "default_region_output_file")]
    pub region_output_file: String,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            enable_logging: false,
            enable_player_output: true,
            player_interval_seconds: default_player_interval_seconds(),
            player_max_records: default_player_max_records(),
            player_output_path: default_output_path(),
            player_output_file: default_player_output_file(),
            enable_region_output: true,
            region_interval_seconds: default_region_interval_seconds(),
            region_max_records: default_region_max_records(),
            region_output_path: default_output_path(),
            region_output_file: default_region_output_file(),
        }
    }
}

impl SnapshotConfig {
    /// Load configuration from a file. `.json` files are parsed as JSON,
    /// anything else as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or a parse
    /// error if the content is malformed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::parse_json(&contents)
        } else {
            Self::parse(&contents)
        }
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Parse configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] if the string is not valid JSON.
    pub fn parse_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Settings for one job.
    pub fn job(&self, kind: JobKind) -> JobSettings<'_> {
        match kind {
            JobKind::Player => JobSettings {
                kind,
                enabled: self.enable_player_output,
                interval_seconds: self.player_interval_seconds,
                max_records: self.player_max_records,
                output_path: &self.player_output_path,
                output_file: &self.player_output_file,
            },
            JobKind::Region => JobSettings {
                kind,
                enabled: self.enable_region_output,
                interval_seconds: self.region_interval_seconds,
                max_records: self.region_max_records,
                output_path: &self.region_output_path,
                output_file: &self.region_output_file,
            },
        }
    }

    /// Validate every enabled job.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError::Invalid`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for kind in JobKind::ALL {
            let settings = self.job(kind);
            if settings.enabled {
                settings.validate()?;
            }
        }
        Ok(())
    }
}

/// Borrowed view of the settings that drive a single job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobSettings<'a> {
    /// Which job these settings belong to.
    pub kind: JobKind,
    /// Whether the job is scheduled at all.
    pub enabled: bool,
    /// Seconds between polls.
    pub interval_seconds: u64,
    /// Cap on records per export.
    pub max_records: RecordLimit,
    /// Output directory as configured.
    pub output_path: &'a str,
    /// Output file name.
    pub output_file: &'a str,
}

impl JobSettings<'_> {
    /// Poll period.
    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }

    /// Check the values a running job depends on.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a zero interval or an empty
    /// output file name.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_seconds == 0 {
            return Err(ConfigError::Invalid {
                reason: format!("{} interval must be at least 1 second", self.kind),
            });
        }
        if self.output_file.trim().is_empty() {
            return Err(ConfigError::Invalid {
                reason: format!("{} output file name must not be empty", self.kind),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

const fn default_true() -> bool {
    true
}

const fn default_player_interval_seconds() -> u64 {
    10
}

const fn default_player_max_records() -> RecordLimit {
    RecordLimit::Max(100)
}

const fn default_region_interval_seconds() -> u64 {
    60
}

const fn default_region_max_records() -> RecordLimit {
    RecordLimit::Unbounded
}

fn default_output_path() -> String {
    "DerethMaps-master".to_owned()
}

fn default_player_output_file() -> String {
    "dynamicPlayers.json".to_owned()
}

fn default_region_output_file() -> String {
    "dynamicLandblocks.json".to_owned()
}
