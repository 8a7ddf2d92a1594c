use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use chrono::{DateTime, Utc};
use crate::core::error::Result;
use crate::core::types::DocId;
use crate::storage::byte_store::ByteStore;
use crate::storage::commit::{CommitPoint, SegmentEntry};
use crate::storage::live_docs::LiveDocs;
use crate::storage::segment_reader::SegmentReader;

/// A segment together with the liveness version a snapshot is bound to
#[derive(Debug, Clone)]
pub struct SegmentView {
    pub reader: Arc<SegmentReader>,
    pub live_docs: Arc<LiveDocs>,
}

impl SegmentView {
    pub fn new(reader: Arc<SegmentReader>, live_docs: Arc<LiveDocs>) -> Self {
        SegmentView { reader, live_docs }
    }

    pub fn is_live(&self, doc_id: DocId) -> bool {
        doc_id.0 < self.reader.max_doc() && self.live_docs.is_live(doc_id)
    }

    pub fn num_live(&self) -> u32 {
        self.live_docs.num_live(self.reader.max_doc())
    }

    pub fn entry(&self) -> SegmentEntry {
        SegmentEntry {
            meta: self.reader.meta.clone(),
            del_gen: self.live_docs.del_gen,
            deleted_count: self.live_docs.num_deleted(),
        }
    }
}

/// In-memory form of a commit point: what a reader is bound to
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub generation: u64,
    pub segments: Vec<SegmentView>,
    pub timestamp: DateTime<Utc>,
}

impl Snapshot {
    pub fn empty() -> Self {
        Snapshot {
            generation: 0,
            segments: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    /// Materialize a commit point, reusing segment data and liveness
    /// versions `previous` already has loaded
    pub fn load(
        store: &dyn ByteStore,
        commit: &CommitPoint,
        previous: Option<&Snapshot>,
    ) -> Result<Self> {
        let mut segments = Vec::with_capacity(commit.segments.len());

        for entry in &commit.segments {
            let known = previous.and_then(|p| {
                p.segments.iter().find(|v| v.reader.id() == entry.meta.id)
            });

            let reader = match known {
                Some(view) => view.reader.clone(),
                None => Arc::new(SegmentReader::open(store, entry.meta.clone())?),
            };
            let live_docs = match known {
                Some(view) if view.live_docs.del_gen == entry.del_gen => view.live_docs.clone(),
                _ => Arc::new(LiveDocs::load(store, &entry.meta.id, entry.del_gen)?),
            };

            segments.push(SegmentView::new(reader, live_docs));
        }

        Ok(Snapshot {
            generation: commit.generation,
            segments,
            timestamp: commit.timestamp,
        })
    }

    pub fn commit_point(&self) -> CommitPoint {
        CommitPoint {
            generation: self.generation,
            timestamp: self.timestamp,
            segments: self.segments.iter().map(SegmentView::entry).collect(),
        }
    }

    /// Live documents across all segments
    pub fn num_docs(&self) -> u64 {
        self.segments.iter().map(|s| s.num_live() as u64).sum()
    }

    pub fn max_doc(&self) -> u64 {
        self.segments.iter().map(|s| s.reader.max_doc() as u64).sum()
    }
}

/// Holds the published snapshot a writer hands to its readers
#[derive(Debug)]
pub struct SnapshotController {
    current: RwLock<Arc<Snapshot>>,
    closed: AtomicBool,
}

impl SnapshotController {
    pub fn new(snapshot: Snapshot) -> Self {
        SnapshotController {
            current: RwLock::new(Arc::new(snapshot)),
            closed: AtomicBool::new(false),
        }
    }

    pub fn current_snapshot(&self) -> Arc<Snapshot> {
        self.current.read().clone()
    }

    /// Atomically replace the visible snapshot
    pub fn publish(&self, snapshot: Arc<Snapshot>) {
        *self.current.write() = snapshot;
    }

    pub fn mark_closed(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}
