use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use crate::core::config::IndexConfig;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::{DocAddress, Document, Field};
use crate::index::inverted::Term;
use crate::mvcc::controller::{Snapshot, SnapshotController};
use crate::query::ast::Query;
use crate::search::executor::QueryExecutor;
use crate::search::results::SearchResults;
use crate::storage::byte_store::ByteStore;
use crate::storage::commit::CommitPoint;
use crate::writer::index_writer::IndexWriter;

/// Where a reader looks for newer commit points on reopen
#[derive(Debug, Clone)]
enum ReaderSource {
    Writer(Arc<SnapshotController>),
    Store(Arc<dyn ByteStore>),
}

/// Point-in-time view of an index.
///
/// A reader is bound to one commit point for its whole life. Commits made
/// after it was opened stay invisible until `reopen` hands out a new reader.
#[derive(Debug)]
pub struct IndexReader {
    snapshot: Arc<Snapshot>,
    source: ReaderSource,
    key_field: String,
    closed: AtomicBool,
}

/// Latest committed snapshot, or `None` if it is `current`'s generation.
///
/// A writer may commit and purge between picking a commit point and loading
/// its files. A file that disappeared that way sends us back to the newest
/// commit point once; a second miss on the same generation is a real error.
fn load_committed(store: &dyn ByteStore, current: Option<&Snapshot>) -> Result<Option<Snapshot>> {
    let mut purged: Option<u64> = None;
    loop {
        let commit = CommitPoint::load_latest(store)?
            .ok_or_else(|| Error::not_found("no commit point in store"))?;
        if current.is_some_and(|c| c.generation == commit.generation) {
            return Ok(None);
        }

        match Snapshot::load(store, &commit, current) {
            Ok(snapshot) => return Ok(Some(snapshot)),
            Err(e) if e.is(ErrorKind::NotFound) && purged != Some(commit.generation) => {
                log::debug!("commit point {} was purged while loading: {}", commit.generation, e);
                purged = Some(commit.generation);
            }
            Err(e) => return Err(e),
        }
    }
}

impl IndexReader {
    /// Reader over the writer's latest commit point
    pub fn open(writer: &IndexWriter) -> Result<Self> {
        let controller = writer.controller();
        if controller.is_closed() {
            return Err(Error::closed_writer());
        }
        Ok(Self::bind(
            controller.current_snapshot(),
            ReaderSource::Writer(controller),
            writer.config().key_field.clone(),
        ))
    }

    /// Reader over the latest durable commit point, without a writer
    pub fn open_committed(store: Arc<dyn ByteStore>, config: &IndexConfig) -> Result<Self> {
        let snapshot = load_committed(store.as_ref(), None)?
            .ok_or_else(|| Error::not_found("no commit point in store"))?;
        Ok(Self::bind(
            Arc::new(snapshot),
            ReaderSource::Store(store),
            config.key_field.clone(),
        ))
    }

    fn bind(snapshot: Arc<Snapshot>, source: ReaderSource, key_field: String) -> Self {
        IndexReader {
            snapshot,
            source,
            key_field,
            closed: AtomicBool::new(false),
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::closed_reader());
        }
        Ok(())
    }

    /// New reader over a newer commit point, or `None` if nothing changed.
    /// `self` stays open and bound to its own commit point.
    pub fn reopen(&self) -> Result<Option<IndexReader>> {
        self.ensure_open()?;

        let snapshot = match &self.source {
            ReaderSource::Writer(controller) => {
                if controller.is_closed() {
                    return Err(Error::closed_writer());
                }
                let current = controller.current_snapshot();
                if current.generation == self.snapshot.generation {
                    return Ok(None);
                }
                current
            }
            ReaderSource::Store(store) => match load_committed(store.as_ref(), Some(&self.snapshot))? {
                Some(snapshot) => Arc::new(snapshot),
                None => return Ok(None),
            },
        };

        log::debug!(
            "reopened reader: generation {} -> {}",
            self.snapshot.generation,
            snapshot.generation
        );
        Ok(Some(Self::bind(snapshot, self.source.clone(), self.key_field.clone())))
    }

    /// Closing only affects the reader handle. The accessors below that do
    /// not return `Result` (`generation`, `key_field`, `segment_count`)
    /// describe the bound commit point and keep answering after `close`.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Generation of the commit point this reader is bound to
    pub fn generation(&self) -> u64 {
        self.snapshot.generation
    }

    pub fn key_field(&self) -> &str {
        &self.key_field
    }

    /// Live documents visible to this reader
    pub fn num_docs(&self) -> Result<u64> {
        self.ensure_open()?;
        Ok(self.snapshot.num_docs())
    }

    /// All documents in the bound segments, deleted ones included
    pub fn max_doc(&self) -> Result<u64> {
        self.ensure_open()?;
        Ok(self.snapshot.max_doc())
    }

    pub fn segment_count(&self) -> usize {
        self.snapshot.segments.len()
    }

    pub fn search(&self, query: &Query, limit: usize) -> Result<SearchResults> {
        self.ensure_open()?;
        let results = QueryExecutor::new(&self.snapshot).execute(query, limit);
        log::debug!("hit count for query {}: {}", query, results.total_hits);
        Ok(results)
    }

    pub fn count(&self, query: &Query) -> Result<usize> {
        self.ensure_open()?;
        Ok(QueryExecutor::new(&self.snapshot).count(query))
    }

    /// Stored fields of a document. Deleted documents still resolve: an
    /// address always refers to the same values within this reader.
    pub fn doc(&self, address: DocAddress) -> Result<Document> {
        self.ensure_open()?;
        self.snapshot
            .segments
            .get(address.segment_ord as usize)
            .and_then(|view| view.reader.get_document(address.doc_id))
            .cloned()
            .ok_or_else(|| {
                Error::not_found(format!(
                    "no document {} in segment {}",
                    address.doc_id.0, address.segment_ord
                ))
            })
    }

    /// The single live document carrying `key`, if any.
    /// Fails with `AmbiguousKey` when more than one does.
    pub fn find_by_key(&self, key: &str) -> Result<Option<DocAddress>> {
        let query = Query::term(Term::exact(self.key_field.as_str(), key));
        let results = self.search(&query, 2)?;

        if results.total_hits > 1 {
            return Err(Error::new(
                ErrorKind::AmbiguousKey,
                format!(
                    "{} live documents found for {}={}",
                    results.total_hits, self.key_field, key
                ),
            ));
        }
        Ok(results.first())
    }

    /// Stored copy of the document for `key`, or a new document holding only the key
    pub fn retrieve_or_create(&self, key: &str) -> Result<Document> {
        match self.find_by_key(key)? {
            Some(address) => {
                log::debug!("updating existing document for {}={}", self.key_field, key);
                self.doc(address)
            }
            None => {
                log::debug!("creating new document for {}={}", self.key_field, key);
                Ok(Document::new().with_field(Field::exact(self.key_field.as_str(), key)))
            }
        }
    }
}
