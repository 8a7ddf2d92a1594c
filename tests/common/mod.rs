#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use parking_lot::Mutex;
use segdex::storage::byte_store::StoreLock;
use segdex::{
    ByteStore, Document, Error, Field, IndexConfig, IndexWriter, MemoryByteStore, Result,
};

pub const KEY: &str = "7gg-sg-7x1-1ds";

pub fn keyed_doc(key: &str, ft1: i64) -> Document {
    Document::new()
        .with_field(Field::exact("_key", key))
        .with_field(Field::integer("ft1", ft1))
        .with_field(Field::text("title", format!("document {}", key)))
}

pub fn memory_writer() -> (MemoryByteStore, IndexWriter) {
    let store = MemoryByteStore::new();
    let writer = IndexWriter::open(Arc::new(store.clone()), IndexConfig::default()).unwrap();
    (store, writer)
}

/// Store that fails appends to files whose name contains a pattern
#[derive(Debug)]
pub struct FailingStore {
    inner: MemoryByteStore,
    failing: AtomicBool,
    pattern: Mutex<String>,
}

impl FailingStore {
    pub fn new(inner: MemoryByteStore) -> Self {
        FailingStore {
            inner,
            failing: AtomicBool::new(false),
            pattern: Mutex::new(String::new()),
        }
    }

    pub fn fail_writes_to(&self, pattern: &str) {
        *self.pattern.lock() = pattern.to_string();
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn heal(&self) {
        self.failing.store(false, Ordering::SeqCst);
    }
}

impl ByteStore for FailingStore {
    fn read_range(&self, name: &str, offset: u64, len: usize) -> Result<Vec<u8>> {
        self.inner.read_range(name, offset, len)
    }

    fn write_append(&self, name: &str, data: &[u8]) -> Result<u64> {
        if self.failing.load(Ordering::SeqCst) && name.contains(self.pattern.lock().as_str()) {
            return Err(Error::storage(format!("injected failure writing {}", name)));
        }
        self.inner.write_append(name, data)
    }

    fn sync(&self, name: &str) -> Result<()> {
        self.inner.sync(name)
    }

    fn len(&self, name: &str) -> Result<u64> {
        self.inner.len(name)
    }

    fn exists(&self, name: &str) -> bool {
        self.inner.exists(name)
    }

    fn list(&self) -> Result<Vec<String>> {
        self.inner.list()
    }

    fn remove(&self, name: &str) -> Result<()> {
        self.inner.remove(name)
    }

    fn try_lock(&self, name: &str) -> Result<Box<dyn StoreLock>> {
        self.inner.try_lock(name)
    }
}

type Hook = Box<dyn FnOnce() + Send>;

/// Store that runs a hook the first time a file matching a pattern is read,
/// before the read itself goes through
pub struct InterleavingStore {
    inner: MemoryByteStore,
    hook: Mutex<Option<(String, Hook)>>,
}

impl InterleavingStore {
    pub fn new(inner: MemoryByteStore) -> Self {
        InterleavingStore {
            inner,
            hook: Mutex::new(None),
        }
    }

    pub fn before_first_read(&self, pattern: &str, hook: impl FnOnce() + Send + 'static) {
        *self.hook.lock() = Some((pattern.to_string(), Box::new(hook)));
    }

    fn run_hook(&self, name: &str) {
        let hook = {
            let mut slot = self.hook.lock();
            match slot.as_ref() {
                Some((pattern, _)) if name.contains(pattern.as_str()) => slot.take(),
                _ => None,
            }
        };
        if let Some((_, hook)) = hook {
            hook();
        }
    }
}

impl std::fmt::Debug for InterleavingStore {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("InterleavingStore").field("inner", &self.inner).finish()
    }
}

impl ByteStore for InterleavingStore {
    fn read_range(&self, name: &str, offset: u64, len: usize) -> Result<Vec<u8>> {
        self.run_hook(name);
        self.inner.read_range(name, offset, len)
    }

    fn write_append(&self, name: &str, data: &[u8]) -> Result<u64> {
        self.inner.write_append(name, data)
    }

    fn sync(&self, name: &str) -> Result<()> {
        self.inner.sync(name)
    }

    fn len(&self, name: &str) -> Result<u64> {
        self.run_hook(name);
        self.inner.len(name)
    }

    fn exists(&self, name: &str) -> bool {
        self.inner.exists(name)
    }

    fn list(&self) -> Result<Vec<String>> {
        self.inner.list()
    }

    fn remove(&self, name: &str) -> Result<()> {
        self.inner.remove(name)
    }

    fn try_lock(&self, name: &str) -> Result<Box<dyn StoreLock>> {
        self.inner.try_lock(name)
    }
}
