use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use serde_json::Value;

/// The persisted collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Groups,
    Tasks,
    Tags,
    Notes,
    ArchivedTasks,
}

impl Collection {
    pub const ALL: [Collection; 5] = [
        Collection::Groups,
        Collection::Tasks,
        Collection::Tags,
        Collection::Notes,
        Collection::ArchivedTasks,
    ];

    /// Storage key, as earlier versions of the app wrote it
    pub fn key(self) -> &'static str {
        match self {
            Collection::Groups => "groups",
            Collection::Tasks => "tasks",
            Collection::Tags => "tags",
            Collection::Notes => "notes",
            Collection::ArchivedTasks => "archivedTasks",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Error type for storage backends
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse {collection}: {source}")]
    ParseError {
        collection: Collection,
        source: serde_json::Error,
    },
    #[error("could not serialize {collection}: {source}")]
    SerializeError {
        collection: Collection,
        source: serde_json::Error,
    },
    #[error("background writer has stopped")]
    WriterGone,
}

/// Key-value persistence for whole collections. Last write wins.
pub trait Storage: Send + Sync {
    /// Load a collection. `Ok(None)` if it was never saved.
    fn load(&self, collection: Collection) -> Result<Option<Value>, StorageError>;

    /// Replace a collection.
    fn save(&self, collection: Collection, value: &Value) -> Result<(), StorageError>;

    /// Block until earlier saves have reached the medium.
    fn flush(&self) -> Result<(), StorageError> {
        Ok(())
    }

    /// Keep stored values that loading could not turn into records, so the
    /// next save of `collection` does not lose them.
    fn preserve(&self, collection: Collection, unreadable: &[Value]) -> Result<(), StorageError> {
        for value in unreadable {
            tracing::warn!(%collection, %value, "dropping unreadable stored value");
        }
        Ok(())
    }
}

impl<S: Storage + ?Sized> Storage for Box<S> {
    fn load(&self, collection: Collection) -> Result<Option<Value>, StorageError> {
        (**self).load(collection)
    }

    fn save(&self, collection: Collection, value: &Value) -> Result<(), StorageError> {
        (**self).save(collection, value)
    }

    fn flush(&self) -> Result<(), StorageError> {
        (**self).flush()
    }

    fn preserve(&self, collection: Collection, unreadable: &[Value]) -> Result<(), StorageError> {
        (**self).preserve(collection, unreadable)
    }
}

/// In-memory storage. Clones share the same contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<HashMap<Collection, Value>>>,
    preserved: Arc<Mutex<Vec<(Collection, Value)>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed or inspect a collection directly
    pub fn insert(&self, collection: Collection, value: Value) {
        self.lock().insert(collection, value);
    }

    pub fn get(&self, collection: Collection) -> Option<Value> {
        self.lock().get(&collection).cloned()
    }

    /// Values handed to [`Storage::preserve`], oldest first
    pub fn preserved(&self) -> Vec<(Collection, Value)> {
        self.preserved.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Collection, Value>> {
        // A panic while holding the lock cannot leave a map half-written.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Storage for MemoryStorage {
    fn load(&self, collection: Collection) -> Result<Option<Value>, StorageError> {
        Ok(self.get(collection))
    }

    fn save(&self, collection: Collection, value: &Value) -> Result<(), StorageError> {
        self.insert(collection, value.clone());
        Ok(())
    }

    fn preserve(&self, collection: Collection, unreadable: &[Value]) -> Result<(), StorageError> {
        let mut preserved = self.preserved.lock().unwrap_or_else(|e| e.into_inner());
        preserved.extend(unreadable.iter().map(|v| (collection, v.clone())));
        Ok(())
    }
}
