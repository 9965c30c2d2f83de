use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde_json::Value;
use tempfile::NamedTempFile;

use crate::io::recovery::{self, RecoveryCategory, RecoveryEntry};
use crate::io::storage::{Collection, Storage, StorageError};

/// Collections stored as `<dir>/<key>.json`, one pretty-printed file each.
///
/// A file that fails to parse is never overwritten: the first save of that
/// collection moves it to `<key>.json.corrupt-<timestamp>` and notes the move
/// in the recovery log. Unreadable records go to the recovery log as well.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    dir: PathBuf,
    unparsed: Arc<Mutex<HashSet<Collection>>>,
}

impl JsonFileStorage {
    /// Store collections under `dir`, creating it if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| StorageError::WriteError {
            path: dir.clone(),
            source: e,
        })?;
        Ok(JsonFileStorage {
            dir,
            unparsed: Arc::default(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, collection: Collection) -> PathBuf {
        self.dir.join(format!("{}.json", collection.key()))
    }

    fn unparsed(&self) -> std::sync::MutexGuard<'_, HashSet<Collection>> {
        self.unparsed.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Move an unparseable collection file out of the way of the next save.
    fn set_aside(&self, collection: Collection) -> Result<(), StorageError> {
        let path = self.path_for(collection);
        let now = Utc::now();
        let moved_to = recovery::corrupt_copy_path(&path, now);
        match fs::rename(&path, &moved_to) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(StorageError::WriteError { path: moved_to, source: e }),
        }
        tracing::warn!(%collection, moved_to = %moved_to.display(), "moved unparseable collection aside");
        let entry = RecoveryEntry {
            timestamp: now,
            category: RecoveryCategory::Parse,
            description: format!("{} could not be parsed", collection),
            fields: vec![("moved_to".into(), moved_to.display().to_string())],
            body: String::new(),
        };
        self.log(&entry)
    }

    fn log(&self, entry: &RecoveryEntry) -> Result<(), StorageError> {
        recovery::log_recovery(&self.dir, entry).map_err(|e| StorageError::WriteError {
            path: recovery::recovery_log_path(&self.dir),
            source: e,
        })
    }
}

impl Storage for JsonFileStorage {
    fn load(&self, collection: Collection) -> Result<Option<Value>, StorageError> {
        let path = self.path_for(collection);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::ReadError { path, source: e }),
        };
        match serde_json::from_str(&text) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                self.unparsed().insert(collection);
                Err(StorageError::ParseError { collection, source: e })
            }
        }
    }

    fn save(&self, collection: Collection, value: &Value) -> Result<(), StorageError> {
        if self.unparsed().contains(&collection) {
            self.set_aside(collection)?;
            self.unparsed().remove(&collection);
        }
        let bytes = serde_json::to_vec_pretty(value)
            .map_err(|e| StorageError::SerializeError { collection, source: e })?;
        let path = self.path_for(collection);
        atomic_write(&path, &bytes).map_err(|e| StorageError::WriteError { path: path.clone(), source: e })?;
        tracing::debug!(%collection, path = %path.display(), "collection saved");
        Ok(())
    }

    fn preserve(&self, collection: Collection, unreadable: &[Value]) -> Result<(), StorageError> {
        if unreadable.is_empty() {
            return Ok(());
        }
        let body = serde_json::to_string_pretty(unreadable)
            .map_err(|e| StorageError::SerializeError { collection, source: e })?;
        let entry = RecoveryEntry {
            timestamp: Utc::now(),
            category: RecoveryCategory::Record,
            description: format!("{} unreadable value(s) in {}", unreadable.len(), collection),
            fields: vec![("collection".into(), collection.key().into())],
            body,
        };
        self.log(&entry)?;
        tracing::warn!(%collection, count = unreadable.len(), "unreadable values copied to recovery log");
        Ok(())
    }
}

/// Replace `path` with `content` in one step.
///
/// The temp file is synced before the rename and the directory after it, so
/// a crash leaves either the old file or the new one.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    sync_dir(dir)
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}
