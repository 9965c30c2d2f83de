use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use serde_json::Value;

use crate::io::storage::{Collection, Storage, StorageError};

enum Job {
    Save(Collection, Value),
    Flush(mpsc::Sender<()>),
}

/// Storage wrapper that hands saves to a background thread.
///
/// `save` returns as soon as the job is queued. Jobs run in submission
/// order, so the last save of a collection is the one that sticks. Write
/// failures on the worker are logged and dropped. Loads and
/// [`Storage::preserve`] go straight to the inner storage.
pub struct WriteBehind<S: Storage + 'static> {
    inner: Arc<S>,
    tx: Mutex<Option<mpsc::Sender<Job>>>,
    worker: Option<JoinHandle<()>>,
}

impl<S: Storage + 'static> WriteBehind<S> {
    pub fn new(inner: S) -> Self {
        let inner = Arc::new(inner);
        let (tx, rx) = mpsc::channel::<Job>();
        let storage = Arc::clone(&inner);
        let worker = std::thread::Builder::new()
            .name("taskdeck-writer".into())
            .spawn(move || {
                while let Ok(job) = rx.recv() {
                    match job {
                        Job::Save(collection, value) => {
                            if let Err(e) = storage.save(collection, &value) {
                                tracing::warn!(%collection, error = %e, "background save failed");
                            }
                        }
                        Job::Flush(done) => {
                            let _ = done.send(());
                        }
                    }
                }
            });
        let worker = match worker {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::warn!(error = %e, "could not start background writer");
                None
            }
        };
        let tx = worker.as_ref().map(|_| tx);
        WriteBehind {
            inner,
            tx: Mutex::new(tx),
            worker,
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn send(&self, job: Job) -> Result<(), StorageError> {
        let guard = self.tx.lock().unwrap_or_else(|e| e.into_inner());
        match guard.as_ref() {
            Some(tx) => tx.send(job).map_err(|_| StorageError::WriterGone),
            None => Err(StorageError::WriterGone),
        }
    }
}

impl<S: Storage + 'static> Storage for WriteBehind<S> {
    fn load(&self, collection: Collection) -> Result<Option<Value>, StorageError> {
        self.inner.load(collection)
    }

    fn save(&self, collection: Collection, value: &Value) -> Result<(), StorageError> {
        if self.worker.is_none() {
            return self.inner.save(collection, value);
        }
        self.send(Job::Save(collection, value.clone()))
    }

    /// Wait for every save queued so far.
    fn flush(&self) -> Result<(), StorageError> {
        if self.worker.is_none() {
            return self.inner.flush();
        }
        let (done_tx, done_rx) = mpsc::channel();
        self.send(Job::Flush(done_tx))?;
        done_rx.recv().map_err(|_| StorageError::WriterGone)?;
        self.inner.flush()
    }

    fn preserve(&self, collection: Collection, unreadable: &[Value]) -> Result<(), StorageError> {
        self.inner.preserve(collection, unreadable)
    }
}

impl<S: Storage + 'static> Drop for WriteBehind<S> {
    fn drop(&mut self) {
        // Closing the channel lets the worker drain its queue and exit.
        let tx = self.tx.get_mut().unwrap_or_else(|e| e.into_inner()).take();
        drop(tx);
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            tracing::warn!("background writer panicked");
        }
    }
}
