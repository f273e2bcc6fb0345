//! Store and logging configuration.
//!
//! # Responsibility
//! - Describe where the store lives and how its connections are configured.
//! - Load configuration from JSON documents with field-level defaults.
//!
//! # Invariants
//! - A missing `db_path` always means an in-memory store.
//! - Defaults treat `students.major_id` as required.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Policy for students without a major.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MajorAssignment {
    /// Every student row must reference a major.
    #[default]
    Required,
    /// Students may be stored with a NULL `major_id`.
    Optional,
}

/// Connection-level configuration for a [`crate::db::Store`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite database file. `None` opens a private in-memory store.
    pub db_path: Option<PathBuf>,
    /// How long a session waits on a locked database before failing.
    pub busy_timeout_ms: u64,
    pub major_assignment: MajorAssignment,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            major_assignment: MajorAssignment::default(),
        }
    }
}

impl StoreConfig {
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn with_major_assignment(mut self, policy: MajorAssignment) -> Self {
        self.major_assignment = policy;
        self
    }

    pub fn with_busy_timeout_ms(mut self, busy_timeout_ms: u64) -> Self {
        self.busy_timeout_ms = busy_timeout_ms;
        self
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    /// Parses a JSON document. Absent fields fall back to defaults.
    pub fn from_json_str(source: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(source).map_err(ConfigError::Parse)
    }

    /// Reads and parses a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|err| ConfigError::Io {
            path: path.to_path_buf(),
            source: err,
        })?;
        Self::from_json_str(&source)
    }
}

/// File logging settings consumed by [`crate::logging::init_logging`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// One of `trace|debug|info|warn|error`, case-insensitive.
    pub level: String,
    /// Absolute directory for rolling log files.
    pub log_dir: PathBuf,
    /// Mirror warnings and errors to stderr as well.
    #[serde(default)]
    pub duplicate_to_stderr: bool,
}

impl LoggingConfig {
    pub fn new(level: impl Into<String>, log_dir: impl Into<PathBuf>) -> Self {
        Self {
            level: level.into(),
            log_dir: log_dir.into(),
            duplicate_to_stderr: false,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(serde_json::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, MajorAssignment, StoreConfig};
    use std::path::PathBuf;

    #[test]
    fn empty_document_uses_defaults() {
        let config = StoreConfig::from_json_str("{}").unwrap();
        assert_eq!(config, StoreConfig::default());
        assert!(config.db_path.is_none());
        assert_eq!(config.major_assignment, MajorAssignment::Required);
    }

    #[test]
    fn parses_all_fields() {
        let config = StoreConfig::from_json_str(
            r#"{
                "db_path": "/var/lib/records.sqlite3",
                "busy_timeout_ms": 250,
                "major_assignment": "optional"
            }"#,
        )
        .unwrap();

        assert_eq!(
            config.db_path,
            Some(PathBuf::from("/var/lib/records.sqlite3"))
        );
        assert_eq!(config.busy_timeout_ms, 250);
        assert_eq!(config.major_assignment, MajorAssignment::Optional);
    }

    #[test]
    fn rejects_unknown_policy() {
        let err = StoreConfig::from_json_str(r#"{"major_assignment": "sometimes"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        let err = StoreConfig::from_json_file(&path).unwrap_err();
        assert!(err.to_string().contains("absent.json"));
    }
}
