use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use chrono::Utc;
use parking_lot::Mutex;
use crate::core::config::{IndexConfig, OpenMode};
use crate::core::error::{Error, Result};
use crate::core::types::{DocId, Document, Field, FieldValue};
use crate::index::inverted::Term;
use crate::mvcc::controller::{SegmentView, Snapshot, SnapshotController};
use crate::storage::byte_store::{ByteStore, FsByteStore, StoreLock};
use crate::storage::commit::CommitPoint;
use crate::storage::layout::{FileLayout, LOCK_FILE};
use crate::storage::live_docs::LiveDocs;
use crate::storage::segment::SegmentId;
use crate::storage::segment_writer::{SegmentData, SegmentWriter};

/// A delete recorded in this session. It applies to every committed segment
/// and to the first `doc_upto` documents buffered before it was issued.
#[derive(Debug, Clone)]
struct PendingDelete {
    term: Term,
    doc_upto: u32,
}

struct WriterState {
    buffer: SegmentWriter,
    pending_deletes: Vec<PendingDelete>,
    next_generation: u64,
    previous_commit: Option<CommitPoint>,
}

impl WriterState {
    fn has_changes(&self) -> bool {
        !self.buffer.is_empty() || !self.pending_deletes.is_empty()
    }

    fn discard(&mut self) {
        self.buffer.clear();
        self.pending_deletes.clear();
    }
}

/// Single writer per storage location.
///
/// Changes are buffered until `commit`, which flushes them into a new
/// segment, applies deletes to fresh liveness versions and publishes the
/// result as one commit point. Readers never see a partial commit.
pub struct IndexWriter {
    store: Arc<dyn ByteStore>,
    config: Arc<IndexConfig>,
    controller: Arc<SnapshotController>,
    state: Mutex<WriterState>, // Serializes every mutation, commit included
    lock: Mutex<Option<Box<dyn StoreLock>>>,
}

impl std::fmt::Debug for IndexWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("IndexWriter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl IndexWriter {
    pub fn open(store: Arc<dyn ByteStore>, config: IndexConfig) -> Result<Self> {
        let lock = store.try_lock(LOCK_FILE)?;

        if config.open_mode == OpenMode::Create {
            for name in store.list()? {
                if FileLayout::is_index_file(&name) {
                    store.remove(&name)?;
                }
            }
        }

        let latest = CommitPoint::load_latest(store.as_ref())?;
        let snapshot = match (&latest, config.open_mode) {
            (Some(commit), _) => Snapshot::load(store.as_ref(), commit, None)?,
            (None, OpenMode::Append) => {
                return Err(Error::not_found("no commit point to append to"));
            }
            (None, _) => Snapshot::empty(),
        };

        // Torn commit files still occupy their generation
        let highest_seen = CommitPoint::generations(store.as_ref())?
            .last()
            .copied()
            .unwrap_or(0);
        let next_generation = highest_seen.max(snapshot.generation) + 1;

        log::info!(
            "opened index writer (mode {:?}) at generation {} with {} segments, {} live docs",
            config.open_mode,
            snapshot.generation,
            snapshot.segments.len(),
            snapshot.num_docs()
        );

        Ok(IndexWriter {
            store,
            config: Arc::new(config),
            controller: Arc::new(SnapshotController::new(snapshot)),
            state: Mutex::new(WriterState {
                buffer: SegmentWriter::new(),
                pending_deletes: Vec::new(),
                next_generation,
                previous_commit: latest,
            }),
            lock: Mutex::new(Some(lock)),
        })
    }

    pub fn open_in_dir(path: impl AsRef<Path>, config: IndexConfig) -> Result<Self> {
        let store = FsByteStore::create_or_open(path)?;
        Self::open(Arc::new(store), config)
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    pub fn store(&self) -> Arc<dyn ByteStore> {
        self.store.clone()
    }

    pub(crate) fn controller(&self) -> Arc<SnapshotController> {
        self.controller.clone()
    }

    /// Generation of the last published commit point
    pub fn generation(&self) -> u64 {
        self.controller.current_snapshot().generation
    }

    pub fn is_closed(&self) -> bool {
        self.controller.is_closed()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.controller.is_closed() {
            return Err(Error::closed_writer());
        }
        Ok(())
    }

    pub fn add_document(&self, doc: Document) -> Result<()> {
        self.ensure_open()?;
        let mut state = self.state.lock();
        state.buffer.write_document(doc);
        Ok(())
    }

    /// Delete every document holding `term`, effective on the next commit
    pub fn delete_by_term(&self, term: Term) -> Result<()> {
        self.ensure_open()?;
        let mut state = self.state.lock();
        let doc_upto = state.buffer.len() as u32;
        state.pending_deletes.push(PendingDelete { term, doc_upto });
        Ok(())
    }

    /// Replace whatever document carries `key` with `doc`.
    ///
    /// The delete and the add land in the same commit. `doc` gets the key
    /// field added when it lacks one; a different key is rejected.
    pub fn update_document(&self, key: &str, mut doc: Document) -> Result<()> {
        self.ensure_open()?;
        let key_field = self.config.key_field.as_str();

        let carried: Vec<FieldValue> = doc.get_all(key_field).cloned().collect();
        match carried.as_slice() {
            [] => {
                log::debug!("adding missing key field {}={}", key_field, key);
                doc.add_field(Field::exact(key_field, key));
            }
            [FieldValue::StoredExact(existing)] if existing == key => {}
            other => {
                return Err(Error::invalid_argument(format!(
                    "document carries {}={:?} but is submitted as {}",
                    key_field, other, key
                )));
            }
        }

        let mut state = self.state.lock();
        let doc_upto = state.buffer.len() as u32;
        state.pending_deletes.push(PendingDelete {
            term: Term::exact(key_field, key),
            doc_upto,
        });
        state.buffer.write_document(doc);
        Ok(())
    }

    pub fn has_uncommitted_changes(&self) -> bool {
        self.state.lock().has_changes()
    }

    /// Number of documents buffered since the last commit
    pub fn buffered_docs(&self) -> usize {
        self.state.lock().buffer.len()
    }

    /// Make buffered changes durable and visible to newly (re)opened readers.
    ///
    /// Returns whether there was anything to commit. On failure the previous
    /// commit point stays current and the buffered changes are kept.
    pub fn commit(&self) -> Result<bool> {
        self.ensure_open()?;
        let mut state = self.state.lock();
        self.commit_locked(&mut state)
    }

    fn commit_locked(&self, state: &mut WriterState) -> Result<bool> {
        if !state.has_changes() {
            return Ok(false);
        }

        let generation = state.next_generation;
        // Burn the generation up front: a failed attempt may leave a torn file behind
        state.next_generation += 1;

        let current = self.controller.current_snapshot();
        let store = self.store.as_ref();
        let mut deleted_total = 0usize;

        // 1. Deletes against already committed segments
        let mut segments = Vec::with_capacity(current.segments.len() + 1);
        for view in &current.segments {
            let doomed: Vec<DocId> = state
                .pending_deletes
                .iter()
                .filter_map(|d| view.reader.postings(&d.term))
                .flat_map(|postings| postings.iter())
                .filter(|doc_id| view.live_docs.is_live(*doc_id))
                .collect::<HashSet<_>>()
                .into_iter()
                .collect();

            if doomed.is_empty() {
                segments.push(view.clone());
                continue;
            }

            deleted_total += doomed.len();
            let live_docs = view.live_docs.with_deleted(doomed, generation);
            live_docs.write(store, &view.reader.id())?;
            segments.push(SegmentView::new(view.reader.clone(), Arc::new(live_docs)));
        }

        // 2. Flush buffered documents; deletes issued after a doc was buffered apply to it
        let added = state.buffer.len();
        if !state.buffer.is_empty() {
            let segment_id = SegmentId::new();
            let reader = state.buffer.flush(
                store,
                segment_id,
                &self.config.analyzer,
                self.config.parallel_analysis_threshold,
            )?;

            let doomed: Vec<DocId> = state
                .pending_deletes
                .iter()
                .filter_map(|d| reader.postings(&d.term).map(|p| (p, d.doc_upto)))
                .flat_map(|(postings, upto)| postings.iter().filter(move |id| id.0 < upto))
                .collect::<HashSet<_>>()
                .into_iter()
                .collect();

            let live_docs = if doomed.is_empty() {
                LiveDocs::new()
            } else {
                let live_docs = LiveDocs::new().with_deleted(doomed, generation);
                live_docs.write(store, &segment_id)?;
                live_docs
            };
            segments.push(SegmentView::new(Arc::new(reader), Arc::new(live_docs)));
        }

        // Fully deleted segments drop out of the commit point
        segments.retain(|view| view.num_live() > 0);

        // 3. Publish: durable commit file first, then the in-memory snapshot
        let snapshot = Snapshot {
            generation,
            segments,
            timestamp: Utc::now(),
        };
        let commit = snapshot.commit_point();
        commit.write(store)?;

        log::info!(
            "committed generation {}: {} segments, {} added, {} deleted, {} live docs",
            generation,
            snapshot.segments.len(),
            added,
            deleted_total,
            snapshot.num_docs()
        );

        self.controller.publish(Arc::new(snapshot));
        state.discard();

        let previous = state.previous_commit.replace(commit.clone());
        self.purge_unreferenced(&commit, previous.as_ref());

        Ok(true)
    }

    /// Rewrite all live documents into a single segment.
    ///
    /// Works on the committed state only; returns false when there is
    /// nothing to reclaim.
    pub fn compact(&self) -> Result<bool> {
        self.ensure_open()?;
        let mut state = self.state.lock();

        let current = self.controller.current_snapshot();
        let has_deletes = current.segments.iter().any(|v| v.live_docs.num_deleted() > 0);
        if current.segments.len() <= 1 && !has_deletes {
            return Ok(false);
        }

        let data = SegmentData::merge(
            current.segments.iter().map(|v| (v.reader.as_ref(), v.live_docs.as_ref())),
        );

        let generation = state.next_generation;
        state.next_generation += 1;

        let mut segments = Vec::new();
        if !data.stored.is_empty() {
            let reader = SegmentWriter::write_data(self.store.as_ref(), SegmentId::new(), data)?;
            segments.push(SegmentView::new(Arc::new(reader), Arc::new(LiveDocs::new())));
        }

        let snapshot = Snapshot {
            generation,
            segments,
            timestamp: Utc::now(),
        };
        let commit = snapshot.commit_point();
        commit.write(self.store.as_ref())?;

        log::info!(
            "compacted {} segments into generation {} ({} live docs)",
            current.segments.len(),
            generation,
            snapshot.num_docs()
        );

        self.controller.publish(Arc::new(snapshot));
        let previous = state.previous_commit.replace(commit.clone());
        self.purge_unreferenced(&commit, previous.as_ref());

        Ok(true)
    }

    /// Delete index files neither `current` nor (if configured) `previous` needs.
    /// Failures are logged; the commit has already landed.
    fn purge_unreferenced(&self, current: &CommitPoint, previous: Option<&CommitPoint>) {
        let mut keep: HashSet<String> = current.referenced_files().into_iter().collect();
        if self.config.keep_previous_commit {
            if let Some(previous) = previous {
                keep.extend(previous.referenced_files());
            }
        }

        let names = match self.store.list() {
            Ok(names) => names,
            Err(e) => {
                log::warn!("could not list index files for purge: {}", e);
                return;
            }
        };

        for name in names {
            if !FileLayout::is_index_file(&name) || keep.contains(&name) {
                continue;
            }
            match self.store.remove(&name) {
                Ok(()) => log::debug!("purged unreferenced file {}", name),
                Err(e) => log::warn!("could not purge {}: {}", name, e),
            }
        }
    }

    /// Commit pending changes, then release the index lock
    pub fn close(&self) -> Result<()> {
        if self.controller.is_closed() {
            return Ok(());
        }
        {
            let mut state = self.state.lock();
            self.commit_locked(&mut state)?;
        }
        self.release();
        Ok(())
    }

    /// Drop pending changes, then release the index lock
    pub fn rollback(&self) -> Result<()> {
        self.ensure_open()?;
        {
            let mut state = self.state.lock();
            if state.has_changes() {
                log::debug!(
                    "rolling back {} buffered docs and {} deletes",
                    state.buffer.len(),
                    state.pending_deletes.len()
                );
            }
            state.discard();
        }
        self.release();
        Ok(())
    }

    fn release(&self) {
        self.controller.mark_closed();
        self.lock.lock().take();
    }
}

impl Drop for IndexWriter {
    fn drop(&mut self) {
        // Uncommitted changes are lost, as with rollback
        self.controller.mark_closed();
    }
}
