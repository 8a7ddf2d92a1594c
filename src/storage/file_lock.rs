use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use crate::core::error::{Error, ErrorKind, Result};
use crate::storage::byte_store::StoreLock;

/// Single writer guarantee for a directory-backed index
#[derive(Debug)]
pub struct FileLock {
    pub file: File,
    pub path: PathBuf,
}

impl FileLock {
    /// Non-blocking exclusive lock; fails with `WriterLocked` when held elsewhere
    pub fn acquire(lock_path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(lock_path)?;

        // Platform-specific locking
        #[cfg(unix)]
        {
            use std::os::unix::io::AsRawFd;
            use libc::{flock, LOCK_EX, LOCK_NB};

            let fd = file.as_raw_fd();

            unsafe {
                if flock(fd, LOCK_EX | LOCK_NB) != 0 {
                    return Err(Error::new(
                        ErrorKind::WriterLocked,
                        format!("index is locked by another writer: {}", lock_path.display()),
                    ));
                }
            }
        }

        Ok(FileLock {
            file,
            path: lock_path.to_path_buf(),
        })
    }
}

impl StoreLock for FileLock {
    fn name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        #[cfg(unix)]
        {
            use std::os::unix::io::AsRawFd;
            use libc::{flock, LOCK_UN};

            let fd = self.file.as_raw_fd();
            unsafe {
                flock(fd, LOCK_UN);
            }
        }
    }
}
