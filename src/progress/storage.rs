use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use super::{ProgressError, UserProgress};

/// Fixed key the progress blob is stored under.
pub const PROGRESS_STORAGE_KEY: &str = "userProgress";

/// Client-side persistence for the progress blob.
pub trait ProgressStorage {
    fn load(&self) -> Result<Option<UserProgress>, ProgressError>;

    fn save(&self, progress: &UserProgress) -> Result<(), ProgressError>;
}

/// Keeps the serialized blob in memory, the way a browser's storage would.
#[derive(Debug, Default)]
pub struct MemoryProgressStorage {
    blob: Mutex<Option<String>>,
}

impl MemoryProgressStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(&self) -> Option<String> {
        self.blob.lock().clone()
    }
}

impl ProgressStorage for MemoryProgressStorage {
    fn load(&self) -> Result<Option<UserProgress>, ProgressError> {
        match self.blob.lock().as_deref() {
            Some(raw) => Ok(Some(serde_json::from_str(raw)?)),
            None => Ok(None),
        }
    }

    fn save(&self, progress: &UserProgress) -> Result<(), ProgressError> {
        let raw = serde_json::to_string(progress)?;
        *self.blob.lock() = Some(raw);
        Ok(())
    }
}

impl<S: ProgressStorage + ?Sized> ProgressStorage for &S {
    fn load(&self) -> Result<Option<UserProgress>, ProgressError> {
        (**self).load()
    }

    fn save(&self, progress: &UserProgress) -> Result<(), ProgressError> {
        (**self).save(progress)
    }
}

/// Stores the blob as `<dir>/userProgress.json`.
#[derive(Debug, Clone)]
pub struct FileProgressStorage {
    dir: PathBuf,
}

impl FileProgressStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(format!("{PROGRESS_STORAGE_KEY}.json"))
    }

    fn write_atomic(path: &Path, contents: &str) -> Result<(), ProgressError> {
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

impl ProgressStorage for FileProgressStorage {
    fn load(&self) -> Result<Option<UserProgress>, ProgressError> {
        match fs::read_to_string(self.path()) {
            Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn save(&self, progress: &UserProgress) -> Result<(), ProgressError> {
        fs::create_dir_all(&self.dir)?;
        let raw = serde_json::to_string_pretty(progress)?;
        Self::write_atomic(&self.path(), &raw)?;
        tracing::debug!(path = %self.path().display(), "progress saved");
        Ok(())
    }
}
