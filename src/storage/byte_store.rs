//! Byte-addressable storage the segment and commit code is written against.
//!
//! An index lives in a flat namespace of named byte sequences. Files are only
//! ever appended to, read by range, synced, or removed; nothing is rewritten
//! in place.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use parking_lot::{Mutex, RwLock};
use crate::core::error::{Error, ErrorKind, Result};
use crate::storage::file_lock::FileLock;

/// Exclusive lock on a store, released on drop
pub trait StoreLock: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;
}

pub trait ByteStore: Send + Sync + fmt::Debug {
    /// Read exactly `len` bytes starting at `offset`.
    fn read_range(&self, name: &str, offset: u64, len: usize) -> Result<Vec<u8>>;

    /// Append `data` to `name`, creating it if missing. Returns the offset the data starts at.
    fn write_append(&self, name: &str, data: &[u8]) -> Result<u64>;

    /// Make previously appended bytes of `name` durable.
    fn sync(&self, name: &str) -> Result<()>;

    fn len(&self, name: &str) -> Result<u64>;

    fn exists(&self, name: &str) -> bool;

    fn list(&self) -> Result<Vec<String>>;

    /// Remove `name`; removing a missing file is not an error.
    fn remove(&self, name: &str) -> Result<()>;

    /// Take the named exclusive lock without blocking.
    fn try_lock(&self, name: &str) -> Result<Box<dyn StoreLock>>;

    fn read_all(&self, name: &str) -> Result<Vec<u8>> {
        let len = self.len(name)?;
        self.read_range(name, 0, len as usize)
    }
}

fn missing(name: &str) -> Error {
    Error::not_found(format!("file not found: {}", name))
}

fn map_io(name: &str, err: io::Error) -> Error {
    if err.kind() == io::ErrorKind::NotFound {
        missing(name)
    } else {
        Error::storage(format!("{}: {}", name, err))
    }
}

/// One file per name inside a directory
#[derive(Debug, Clone)]
pub struct FsByteStore {
    pub base_dir: PathBuf,
}

impl FsByteStore {
    pub fn create_or_open(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir)?;
        Ok(FsByteStore { base_dir })
    }

    fn path(&self, name: &str) -> PathBuf {
        self.base_dir.join(name)
    }
}

impl ByteStore for FsByteStore {
    fn read_range(&self, name: &str, offset: u64, len: usize) -> Result<Vec<u8>> {
        let mut file = File::open(self.path(name)).map_err(|e| map_io(name, e))?;
        let file_len = file.metadata().map_err(|e| map_io(name, e))?.len();

        // Check the range before allocating for it
        let end = offset.checked_add(len as u64).filter(|end| *end <= file_len);
        if end.is_none() {
            return Err(Error::storage(format!(
                "{}: range {}..{} beyond length {}",
                name,
                offset,
                offset.saturating_add(len as u64),
                file_len
            )));
        }
        file.seek(SeekFrom::Start(offset)).map_err(|e| map_io(name, e))?;

        let mut buf = vec![0u8; len];
        file.read_exact(&mut buf).map_err(|e| map_io(name, e))?;
        Ok(buf)
    }

    fn write_append(&self, name: &str, data: &[u8]) -> Result<u64> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path(name))
            .map_err(|e| map_io(name, e))?;

        let offset = file.metadata().map_err(|e| map_io(name, e))?.len();
        file.write_all(data).map_err(|e| map_io(name, e))?;
        Ok(offset)
    }

    fn sync(&self, name: &str) -> Result<()> {
        let file = OpenOptions::new()
            .write(true)
            .open(self.path(name))
            .map_err(|e| map_io(name, e))?;
        file.sync_all().map_err(|e| map_io(name, e))
    }

    fn len(&self, name: &str) -> Result<u64> {
        let metadata = fs::metadata(self.path(name)).map_err(|e| map_io(name, e))?;
        Ok(metadata.len())
    }

    fn exists(&self, name: &str) -> bool {
        self.path(name).is_file()
    }

    fn list(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.base_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn remove(&self, name: &str) -> Result<()> {
        match fs::remove_file(self.path(name)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(map_io(name, e)),
        }
    }

    fn try_lock(&self, name: &str) -> Result<Box<dyn StoreLock>> {
        Ok(Box::new(FileLock::acquire(&self.path(name))?))
    }
}

/// In-process store. Clones share the same files and locks, so a clone is
/// the same storage location.
#[derive(Debug, Clone, Default)]
pub struct MemoryByteStore {
    files: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    locks: Arc<Mutex<HashSet<String>>>,
}

impl MemoryByteStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ByteStore for MemoryByteStore {
    fn read_range(&self, name: &str, offset: u64, len: usize) -> Result<Vec<u8>> {
        let files = self.files.read();
        let data = files.get(name).ok_or_else(|| missing(name))?;

        let start = offset as usize;
        let end = start.checked_add(len).filter(|end| *end <= data.len()).ok_or_else(|| {
            Error::storage(format!(
                "{}: range {}..{} beyond length {}",
                name,
                start,
                start.saturating_add(len),
                data.len()
            ))
        })?;
        Ok(data[start..end].to_vec())
    }

    fn write_append(&self, name: &str, data: &[u8]) -> Result<u64> {
        let mut files = self.files.write();
        let file = files.entry(name.to_string()).or_default();
        let offset = file.len() as u64;
        file.extend_from_slice(data);
        Ok(offset)
    }

    fn sync(&self, name: &str) -> Result<()> {
        if self.files.read().contains_key(name) {
            Ok(())
        } else {
            Err(missing(name))
        }
    }

    fn len(&self, name: &str) -> Result<u64> {
        self.files
            .read()
            .get(name)
            .map(|data| data.len() as u64)
            .ok_or_else(|| missing(name))
    }

    fn exists(&self, name: &str) -> bool {
        self.files.read().contains_key(name)
    }

    fn list(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.files.read().keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn remove(&self, name: &str) -> Result<()> {
        self.files.write().remove(name);
        Ok(())
    }

    fn try_lock(&self, name: &str) -> Result<Box<dyn StoreLock>> {
        let mut locks = self.locks.lock();
        if !locks.insert(name.to_string()) {
            return Err(Error::new(
                ErrorKind::WriterLocked,
                format!("index is locked by another writer: {}", name),
            ));
        }
        Ok(Box::new(MemoryLock {
            name: name.to_string(),
            locks: self.locks.clone(),
        }))
    }
}

#[derive(Debug)]
struct MemoryLock {
    name: String,
    locks: Arc<Mutex<HashSet<String>>>,
}

impl StoreLock for MemoryLock {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for MemoryLock {
    fn drop(&mut self) {
        self.locks.lock().remove(&self.name);
    }
}
