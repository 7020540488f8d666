// Durable key-value backends holding one serialized collection per key

use crate::clock::now_ms;
use eyre::{Context, Result, eyre};
use fs2::FileExt;
use rusqlite::{Connection, OptionalExtension};
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Durable storage: whole documents read and written by key
pub trait Backend {
    /// Read the document stored under `key`, `None` if absent
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Replace the document stored under `key`
    fn write(&mut self, key: &str, value: &str) -> Result<()>;

    /// Human-readable location, for logs and the CLI
    fn describe(&self) -> String;
}

impl<B: Backend + ?Sized> Backend for Box<B> {
    fn read(&self, key: &str) -> Result<Option<String>> {
        (**self).read(key)
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).write(key, value)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(eyre!("Storage key cannot be empty"));
    }
    if key.len() > 64 {
        return Err(eyre!("Storage key too long: {} (max 64 chars)", key));
    }
    if !key.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-') {
        return Err(eyre!("Invalid storage key: {} (must be alphanumeric with _/-)", key));
    }
    Ok(())
}

// ============================================================================
// File backend
// ============================================================================

/// One `{key}.json` file per key inside a directory
#[derive(Debug)]
pub struct FileBackend {
    base_path: PathBuf,
}

impl FileBackend {
    /// Open or create the backend directory
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path).context("Failed to create data directory")?;
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.base_path.join(format!("{}.json", key))
    }
}

impl Backend for FileBackend {
    fn read(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Some(text))
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        let target = self.path_for(key);
        let temp = self.base_path.join(format!("{}.json.tmp", key));

        // Writers of the same key serialize on the lock file
        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.base_path.join(format!("{}.lock", key)))
            .context("Failed to open lock file")?;
        lock.lock_exclusive().context("Failed to acquire file lock")?;

        let mut file = OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(&temp)
            .context("Failed to open temp file for writing")?;
        file.write_all(value.as_bytes())?;
        file.sync_all()?;
        fs::rename(&temp, &target).with_context(|| format!("Failed to replace {}", target.display()))?;

        debug!(path = ?target, bytes = value.len(), "wrote collection file");
        // Lock is released when `lock` is dropped
        Ok(())
    }

    fn describe(&self) -> String {
        format!("file:{}", self.base_path.display())
    }
}

// ============================================================================
// SQLite backend
// ============================================================================

/// Key-value table in a SQLite database
pub struct SqliteBackend {
    db: Connection,
    location: String,
}

impl SqliteBackend {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create database directory")?;
        }
        let db = Connection::open(path).context("Failed to open SQLite database")?;
        Self::init(db, path.display().to_string())
    }

    pub fn in_memory() -> Result<Self> {
        let db = Connection::open_in_memory().context("Failed to open in-memory SQLite database")?;
        Self::init(db, ":memory:".to_string())
    }

    fn init(db: Connection, location: String) -> Result<Self> {
        debug!("Creating key-value schema");
        db.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );
            "#,
        )?;
        Ok(Self { db, location })
    }

    /// Get a reference to the SQLite database connection
    pub fn db(&self) -> &Connection {
        &self.db
    }
}

impl Backend for SqliteBackend {
    fn read(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        let value = self
            .db
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get::<_, String>(0))
            .optional()?;
        Ok(value)
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        self.db.execute(
            "INSERT OR REPLACE INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![key, value, now_ms()],
        )?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("sqlite:{}", self.location)
    }
}

// ============================================================================
// In-memory backend
// ============================================================================

/// Process-local map; writes can be made to fail to simulate a full or
/// unavailable medium
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: HashMap<String, String>,
    fail_writes: bool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed `key` with raw text, valid or not
    pub fn with_entry(mut self, key: &str, value: &str) -> Self {
        self.entries.insert(key.to_string(), value.to_string());
        self
    }

    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    pub fn raw(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

impl Backend for MemoryBackend {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes {
            return Err(eyre!("storage quota exceeded"));
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_backend_roundtrip() {
        let temp = TempDir::new().unwrap();
        let mut backend = FileBackend::open(temp.path().join("data")).unwrap();

        assert_eq!(backend.read("books").unwrap(), None);
        backend.write("books", "[]").unwrap();
        assert_eq!(backend.read("books").unwrap().as_deref(), Some("[]"));

        backend.write("books", "[1]").unwrap();
        assert_eq!(backend.read("books").unwrap().as_deref(), Some("[1]"));
        assert!(backend.path_for("books").exists());
        assert!(!temp.path().join("data/books.json.tmp").exists());
    }

    #[test]
    fn test_file_backend_rejects_bad_key() {
        let temp = TempDir::new().unwrap();
        let mut backend = FileBackend::open(temp.path()).unwrap();
        assert!(backend.write("../escape", "[]").is_err());
        assert!(backend.read("").is_err());
        assert!(backend.read(&"a".repeat(65)).is_err());
    }

    #[test]
    fn test_sqlite_backend_roundtrip() {
        let temp = TempDir::new().unwrap();
        let mut backend = SqliteBackend::open(temp.path().join("store.db")).unwrap();

        assert_eq!(backend.read("tasks").unwrap(), None);
        backend.write("tasks", "[]").unwrap();
        backend.write("tasks", "[{}]").unwrap();
        assert_eq!(backend.read("tasks").unwrap().as_deref(), Some("[{}]"));

        let rows: i64 = backend
            .db()
            .query_row("SELECT COUNT(*) FROM kv", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn test_sqlite_persists_across_connections() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("store.db");
        {
            let mut backend = SqliteBackend::open(&path).unwrap();
            backend.write("schedules", "[]").unwrap();
        }
        let backend = SqliteBackend::open(&path).unwrap();
        assert_eq!(backend.read("schedules").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_memory_backend_failing_writes() {
        let mut backend = MemoryBackend::new().with_entry("tasks", "[]");
        backend.set_fail_writes(true);
        assert!(backend.write("tasks", "[1]").is_err());
        assert_eq!(backend.raw("tasks"), Some("[]"));
    }
}
