//! Atomic TOML file operations.
//!
//! A thin layer for safe access to the client state file: atomic writes via
//! tmp file + fsync + rename, and an advisory file lock around
//! read-modify-write updates.

use std::fs::{self, File, OpenOptions};
use std::io::Write as IoWrite;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::{Serialize, de::DeserializeOwned};

/// Errors that can occur during atomic TOML operations.
#[derive(Debug, thiserror::Error)]
pub enum AtomicTomlError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("TOML serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Lock error: {0}")]
    Lock(String),
}

/// A handle to a TOML file with atomic write semantics.
///
/// - Writes go to a temp file in the same directory, are fsynced, then
///   renamed over the target, so readers never see a torn file.
/// - [`update`](Self::update) holds an advisory lock for the whole
///   read-modify-write cycle, so two processes cannot interleave updates.
pub struct AtomicTomlFile<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T> AtomicTomlFile<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Creates a handle for the file at `path`. The file need not exist yet.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    /// Loads and deserializes the file.
    ///
    /// Returns `Ok(None)` when the file does not exist or is empty.
    pub fn load(&self) -> Result<Option<T>, AtomicTomlError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(toml::from_str(&content)?))
    }

    /// Serializes `data` and writes it atomically.
    pub fn save(&self, data: &T) -> Result<(), AtomicTomlError> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let serialized = toml::to_string_pretty(data)?;

        let tmp_path = self.temp_path()?;
        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(serialized.as_bytes())?;
        tmp_file.sync_all()?;
        drop(tmp_file);

        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    /// Read-modify-write under an exclusive advisory lock.
    ///
    /// Loads the current data (or `default_value` when the file is absent),
    /// applies `f`, and saves the result atomically.
    pub fn update<F>(&self, default_value: T, f: F) -> Result<(), AtomicTomlError>
    where
        F: FnOnce(&mut T),
    {
        let _lock = FileLock::acquire(&self.path)?;

        let mut data = self.load()?.unwrap_or(default_value);
        f(&mut data);
        self.save(&data)
    }

    fn temp_path(&self) -> Result<PathBuf, AtomicTomlError> {
        let parent = self.path.parent().ok_or_else(|| {
            AtomicTomlError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Path has no parent directory",
            ))
        })?;
        let file_name = self.path.file_name().ok_or_else(|| {
            AtomicTomlError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Path has no file name",
            ))
        })?;

        Ok(parent.join(format!(".{}.tmp", file_name.to_string_lossy())))
    }
}

/// Advisory lock guard; releases the lock and removes the lock file on drop.
struct FileLock {
    #[allow(dead_code)]
    file: File,
    lock_path: PathBuf,
}

impl FileLock {
    fn acquire(path: &Path) -> Result<Self, AtomicTomlError> {
        let lock_path = path.with_extension("lock");

        if let Some(parent) = lock_path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        #[cfg(unix)]
        {
            use fs2::FileExt;
            file.lock_exclusive()
                .map_err(|e| AtomicTomlError::Lock(format!("Failed to acquire lock: {e}")))?;
        }
        // Non-Unix: no advisory locking; acceptable for a single-user client.

        Ok(Self { file, lock_path })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        // Unlock happens when the handle closes; removing the lock file is
        // best effort.
        let _ = fs::remove_file(&self.lock_path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
    struct TestState {
        credential: Option<String>,
        generation: u32,
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let file = AtomicTomlFile::<TestState>::new(temp_dir.path().join("state.toml"));

        let state = TestState {
            credential: Some("tok".to_string()),
            generation: 3,
        };
        file.save(&state).unwrap();

        let loaded = file.load().unwrap().unwrap();
        assert_eq!(loaded, state);
    }

    #[test]
    fn test_load_missing_file_returns_none() {
        let temp_dir = TempDir::new().unwrap();
        let file = AtomicTomlFile::<TestState>::new(temp_dir.path().join("absent.toml"));
        assert!(file.load().unwrap().is_none());
    }

    #[test]
    fn test_update_creates_and_mutates() {
        let temp_dir = TempDir::new().unwrap();
        let file = AtomicTomlFile::<TestState>::new(temp_dir.path().join("state.toml"));

        file.update(TestState::default(), |state| state.generation += 1)
            .unwrap();
        file.update(TestState::default(), |state| state.generation += 1)
            .unwrap();

        let loaded = file.load().unwrap().unwrap();
        assert_eq!(loaded.generation, 2);
    }

    #[test]
    fn test_no_temp_file_left_behind() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("state.toml");
        let file = AtomicTomlFile::<TestState>::new(path.clone());

        file.save(&TestState::default()).unwrap();

        assert!(path.exists());
        assert!(!temp_dir.path().join(".state.toml.tmp").exists());
    }
}
