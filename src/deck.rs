use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

use crate::io::json_store::JsonFileStorage;
use crate::io::lock::{DataLock, LockError};
use crate::io::storage::{Storage, StorageError};
use crate::io::write_behind::WriteBehind;
use crate::model::config::AppConfig;
use crate::store::Store;
use crate::store::broadcast::{Broadcaster, NoopBroadcaster, OverlayFilter};

/// Error type for opening a deck
#[derive(Debug, thiserror::Error)]
pub enum DeckError {
    #[error(transparent)]
    Lock(#[from] LockError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// A [`Store`] backed by JSON files in a locked data directory.
///
/// Dereferences to the store. Dropping the deck flushes pending saves and
/// then releases the lock.
pub struct Deck {
    // Declared before the lock so it is dropped (and flushed) first.
    store: Store,
    data_dir: PathBuf,
    _lock: DataLock,
}

impl Deck {
    /// Open the configured data directory with no overlay attached.
    pub fn open(config: &AppConfig) -> Result<Deck, DeckError> {
        Self::open_with_broadcaster(config, NoopBroadcaster)
    }

    /// Open the configured data directory. Completion updates go to
    /// `broadcaster`, restricted to the configured stream group.
    pub fn open_with_broadcaster<B: Broadcaster + 'static>(
        config: &AppConfig,
        broadcaster: B,
    ) -> Result<Deck, DeckError> {
        let data_dir = config.storage.resolved_data_dir();
        let lock = DataLock::acquire_default(&data_dir)?;
        let files = JsonFileStorage::open(&data_dir)?;
        let storage: Box<dyn Storage> = if config.storage.write_behind {
            Box::new(WriteBehind::new(files))
        } else {
            Box::new(files)
        };
        tracing::info!(
            data_dir = %data_dir.display(),
            write_behind = config.storage.write_behind,
            "opening deck"
        );

        let mut store = Store::load(storage, config.focus.clone());
        store.set_broadcaster(Box::new(OverlayFilter::new(broadcaster, &config.overlay)));
        Ok(Deck {
            store,
            data_dir,
            _lock: lock,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Flush pending saves and release the data directory.
    pub fn close(self) -> Result<(), StorageError> {
        self.store.flush()
    }
}

impl Deref for Deck {
    type Target = Store;

    fn deref(&self) -> &Store {
        &self.store
    }
}

impl DerefMut for Deck {
    fn deref_mut(&mut self) -> &mut Store {
        &mut self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config(dir: &Path, write_behind: bool) -> AppConfig {
        let mut config = AppConfig::default();
        config.storage.data_dir = Some(dir.to_path_buf());
        config.storage.write_behind = write_behind;
        config
    }

    #[test]
    fn test_reopen_sees_saved_tasks() {
        let tmp = TempDir::new().unwrap();
        let config = config(tmp.path(), true);
        let id = {
            let mut deck = Deck::open(&config).unwrap();
            let g = deck.add_group("Inbox");
            let id = deck.add_task("Ship it", Some(g));
            deck.close().unwrap();
            id
        };

        let deck = Deck::open(&config).unwrap();
        assert_eq!(deck.task(&id).map(|t| t.title.as_str()), Some("Ship it"));
        assert_eq!(deck.groups().len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_second_open_is_refused() {
        let tmp = TempDir::new().unwrap();
        let config = config(tmp.path(), false);
        let _first = Deck::open(&config).unwrap();
        assert!(matches!(Deck::open(&config), Err(DeckError::Lock(_))));
    }
}
