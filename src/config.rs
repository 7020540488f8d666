// Configuration file and storage selection

use crate::backend::{Backend, FileBackend, MemoryBackend, SqliteBackend};
use crate::error::ParseError;
use crate::ids::{IdGenerator, TimestampIds, UuidIds};
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

const APP_DIR: &str = "recordkeeper";
const CONFIG_FILE: &str = "config.yaml";
const SQLITE_FILE: &str = "recordkeeper.db";

/// Which durable backend holds the collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// One JSON document per collection in `data_dir`
    #[default]
    File,
    /// A single SQLite database in `data_dir`
    Sqlite,
    /// Nothing survives the process
    Memory,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::File => write!(f, "file"),
            BackendKind::Sqlite => write!(f, "sqlite"),
            BackendKind::Memory => write!(f, "memory"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "file" | "json" => Ok(BackendKind::File),
            "sqlite" => Ok(BackendKind::Sqlite),
            "memory" => Ok(BackendKind::Memory),
            _ => Err(ParseError::new("backend", s)),
        }
    }
}

/// How new record ids are generated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdStrategy {
    #[default]
    Timestamp,
    Uuid,
}

impl FromStr for IdStrategy {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "timestamp" => Ok(IdStrategy::Timestamp),
            "uuid" => Ok(IdStrategy::Uuid),
            _ => Err(ParseError::new("id strategy", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data_dir: PathBuf,
    pub backend: BackendKind,
    /// Default log filter when `RUST_LOG` is unset
    pub log_level: String,
    pub id_strategy: IdStrategy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            backend: BackendKind::default(),
            log_level: "warn".to_string(),
            id_strategy: IdStrategy::default(),
        }
    }
}

impl Config {
    /// `<config_dir>/recordkeeper/config.yaml`, if the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Read the config at `path`; a missing file yields the defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = ?path, "No config file, using defaults");
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path).with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config =
            serde_yaml::from_str(&text).with_context(|| format!("Failed to parse config {}", path.display()))?;
        debug!(path = ?path, backend = %config.backend, "Loaded config");
        Ok(config)
    }

    /// Read the config from its default location
    pub fn load_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Open the configured backend under `data_dir`
    pub fn open_backend(&self) -> Result<Box<dyn Backend>> {
        let backend: Box<dyn Backend> = match self.backend {
            BackendKind::File => Box::new(FileBackend::open(&self.data_dir)?),
            BackendKind::Sqlite => Box::new(SqliteBackend::open(self.data_dir.join(SQLITE_FILE))?),
            BackendKind::Memory => Box::new(MemoryBackend::new()),
        };
        Ok(backend)
    }

    pub fn id_generator(&self) -> Box<dyn IdGenerator> {
        match self.id_strategy {
            IdStrategy::Timestamp => Box::new(TimestampIds::default()),
            IdStrategy::Uuid => Box::new(UuidIds),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from(".recordkeeper"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let config = Config::load(temp.path().join("absent.yaml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.backend, BackendKind::File);
        assert!(config.data_dir.ends_with("recordkeeper") || config.data_dir.ends_with(".recordkeeper"));
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        fs::write(&path, "backend: sqlite\nid_strategy: uuid\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.backend, BackendKind::Sqlite);
        assert_eq!(config.id_strategy, IdStrategy::Uuid);
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        fs::write(&path, "backend: floppy\n").unwrap();
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_open_backend_kinds() {
        let temp = TempDir::new().unwrap();
        let mut config = Config {
            data_dir: temp.path().join("data"),
            ..Config::default()
        };
        assert!(config.open_backend().unwrap().describe().starts_with("file:"));

        config.backend = BackendKind::Sqlite;
        let backend = config.open_backend().unwrap();
        assert!(backend.describe().ends_with("recordkeeper.db"));
        assert!(temp.path().join("data/recordkeeper.db").exists());

        config.backend = BackendKind::Memory;
        assert_eq!(config.open_backend().unwrap().describe(), "memory");
    }

    #[test]
    fn test_parse_kinds() {
        assert_eq!("SQLite".parse::<BackendKind>().unwrap(), BackendKind::Sqlite);
        assert_eq!("json".parse::<BackendKind>().unwrap(), BackendKind::File);
        assert!("floppy".parse::<BackendKind>().is_err());
        assert_eq!("uuid".parse::<IdStrategy>().unwrap(), IdStrategy::Uuid);
    }

    #[test]
    fn test_id_generators() {
        let mut config = Config::default();
        let a = config.id_generator().next_id();
        assert!(a.parse::<i64>().is_ok());

        config.id_strategy = IdStrategy::Uuid;
        let b = config.id_generator().next_id();
        assert!(uuid::Uuid::parse_str(&b).is_ok());
    }
}
