use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Advisory lock on a data directory.
///
/// Held for as long as a [`crate::deck::Deck`] is open so two processes
/// never write the same collection files. Uses flock on Unix; the lock is
/// released with the file handle. The `.lock` file itself stays in place,
/// so every process contends on the same inode.
pub struct DataLock {
    _file: File,
    path: PathBuf,
}

/// Error type for lock operations
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("could not create lock file at {path}: {source}")]
    CreateError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not lock {path}: another taskdeck process is using this data directory")]
    Timeout { path: PathBuf },
}

impl DataLock {
    /// Lock `data_dir`, creating it if needed. Retries for up to `timeout`.
    pub fn acquire(data_dir: &Path, timeout: Duration) -> Result<Self, LockError> {
        let lock_path = data_dir.join(".lock");
        fs::create_dir_all(data_dir).map_err(|e| LockError::CreateError {
            path: lock_path.clone(),
            source: e,
        })?;
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| LockError::CreateError {
                path: lock_path.clone(),
                source: e,
            })?;

        let start = Instant::now();
        loop {
            match try_lock(&file) {
                Ok(()) => {
                    tracing::debug!(path = %lock_path.display(), "data directory locked");
                    return Ok(DataLock {
                        _file: file,
                        path: lock_path,
                    });
                }
                Err(_) if start.elapsed() < timeout => {
                    std::thread::sleep(Duration::from_millis(10));
                }
                Err(_) => {
                    return Err(LockError::Timeout { path: lock_path });
                }
            }
        }
    }

    /// Acquire with default timeout (2 seconds)
    pub fn acquire_default(data_dir: &Path) -> Result<Self, LockError> {
        Self::acquire(data_dir, Duration::from_secs(2))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(unix)]
fn try_lock(file: &File) -> Result<(), std::io::Error> {
    use std::os::unix::io::AsRawFd;
    let fd = file.as_raw_fd();
    let result = unsafe { libc::flock(fd, libc::LOCK_EX | libc::LOCK_NB) };
    if result == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn try_lock(_file: &File) -> Result<(), std::io::Error> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_acquire_creates_missing_dir() {
        let tmp = TempDir::new().unwrap();
        let data_dir = tmp.path().join("nested").join("deck");

        let lock = DataLock::acquire_default(&data_dir).unwrap();
        assert!(lock.path().exists());

        drop(lock);
        assert!(DataLock::acquire_default(&data_dir).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_release_keeps_lock_file() {
        use std::os::unix::fs::MetadataExt;

        let tmp = TempDir::new().unwrap();
        let first = DataLock::acquire_default(tmp.path()).unwrap();
        let inode = fs::metadata(first.path()).unwrap().ino();
        drop(first);

        let second = DataLock::acquire_default(tmp.path()).unwrap();
        assert_eq!(fs::metadata(second.path()).unwrap().ino(), inode);
        let third = DataLock::acquire(tmp.path(), Duration::from_millis(50));
        assert!(matches!(third, Err(LockError::Timeout { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_lock_contention() {
        let tmp = TempDir::new().unwrap();
        let _held = DataLock::acquire_default(tmp.path()).unwrap();

        let second = DataLock::acquire(tmp.path(), Duration::from_millis(50));
        assert!(matches!(second, Err(LockError::Timeout { .. })));
    }
}
