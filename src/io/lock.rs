use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Default time to wait for another mandala process to finish writing
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Exclusive advisory lock on `mandala/.lock`, held while the chart file is
/// written. Released when dropped.
pub struct FileLock {
    _file: File,
}

/// Error type for lock operations
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("could not open lock file {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("timed out waiting for {path}: another mandala process is writing")]
    Timeout { path: PathBuf },
}

impl FileLock {
    /// Lock the workspace's mandala directory, retrying until `timeout`.
    pub fn acquire(mandala_dir: &Path, timeout: Duration) -> Result<Self, LockError> {
        let path = mandala_dir.join(".lock");
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|source| LockError::Open {
                path: path.clone(),
                source,
            })?;

        let start = Instant::now();
        while try_lock(&file).is_err() {
            if start.elapsed() >= timeout {
                return Err(LockError::Timeout { path });
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        Ok(FileLock { _file: file })
    }
}

/// Non-blocking exclusive flock. The lock lives as long as the open file.
#[cfg(unix)]
pub(crate) fn try_lock(file: &File) -> std::io::Result<()> {
    use std::os::unix::io::AsRawFd;
    let result = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
    if result == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
pub(crate) fn try_lock(_file: &File) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn lock_is_reusable_after_drop() {
        let tmp = TempDir::new().unwrap();
        let lock = FileLock::acquire(tmp.path(), DEFAULT_TIMEOUT).unwrap();
        drop(lock);
        assert!(FileLock::acquire(tmp.path(), DEFAULT_TIMEOUT).is_ok());
        assert!(tmp.path().join(".lock").exists());
    }

    #[cfg(unix)]
    #[test]
    fn second_lock_times_out() {
        let tmp = TempDir::new().unwrap();
        let _held = FileLock::acquire(tmp.path(), DEFAULT_TIMEOUT).unwrap();
        let err = FileLock::acquire(tmp.path(), Duration::from_millis(50)).err().unwrap();
        assert!(matches!(err, LockError::Timeout { .. }));
    }
}
