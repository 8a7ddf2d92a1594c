pub mod core;
pub mod storage;
pub mod analysis;
pub mod index;
pub mod search;
pub mod query;
pub mod mvcc;
pub mod writer;
pub mod reader;

pub use crate::core::config::{IndexConfig, OpenMode, DEFAULT_KEY_FIELD};
pub use crate::core::error::{Error, ErrorKind, Result};
pub use crate::core::types::{DocAddress, DocId, Document, Field, FieldValue};
pub use crate::index::inverted::Term;
pub use crate::query::ast::Query;
pub use crate::reader::index_reader::IndexReader;
pub use crate::search::results::SearchResults;
pub use crate::storage::byte_store::{ByteStore, FsByteStore, MemoryByteStore};
pub use crate::writer::index_writer::IndexWriter;

/*
┌──────────────────────────────────── SEGDEX LAYOUT ────────────────────────────────────┐
│                                                                                        │
│  IndexWriter (one per store, holds write.lock)                                         │
│  ├─ buffer: SegmentWriter           // docs added since last commit                   │
│  ├─ pending_deletes: [(Term, upto)] // delete_by_term / update_document               │
│  └─ controller: SnapshotController  // published Arc<Snapshot>                        │
│                                                                                        │
│  commit():                                                                             │
│    1. new LiveDocs (.del) for every committed segment a pending delete hits            │
│    2. flush buffer -> new .seg, apply deletes issued after each buffered doc           │
│    3. drop segments with no live docs                                                  │
│    4. write commit_<gen>  (durable point)                                              │
│    5. publish snapshot    (visible to reopen)                                          │
│    6. purge files no kept commit point references                                      │
│                                                                                        │
│  IndexReader                                                                           │
│  ├─ snapshot: Arc<Snapshot>          // fixed for the reader's lifetime                │
│  │   └─ segments: [SegmentView { Arc<SegmentReader>, Arc<LiveDocs> }]                  │
│  └─ reopen() -> Option<IndexReader>  // None when generation unchanged                 │
│                                                                                        │
│  Store files                                                                           │
│    {uuid}.seg           header | LZ4(bincode(SegmentData))                             │
│    {uuid}_{delgen}.del  crc | roaring bitmap of deleted ids                            │
│    commit_{gen:010}     crc | bincode(CommitPoint)                                     │
│    write.lock           flock / in-memory lock registry                                │
│                                                                                        │
└────────────────────────────────────────────────────────────────────────────────────────┘
*/
