mod common;

use std::sync::Arc;
use std::thread;
use common::{keyed_doc, memory_writer, InterleavingStore};
use segdex::{DocAddress, DocId, ErrorKind, IndexConfig, IndexReader, Query};

#[test]
fn reader_does_not_see_later_commits() {
    let (_store, writer) = memory_writer();
    writer.add_document(keyed_doc("a", 1)).unwrap();
    writer.commit().unwrap();

    let before = IndexReader::open(&writer).unwrap();
    writer.add_document(keyed_doc("b", 2)).unwrap();
    writer.commit().unwrap();
    assert!(!writer.has_uncommitted_changes());

    assert_eq!(before.num_docs().unwrap(), 1);
    assert!(before.find_by_key("b").unwrap().is_none());

    let after = before.reopen().unwrap().unwrap();
    assert_eq!(after.num_docs().unwrap(), 2);
    assert!(after.find_by_key("b").unwrap().is_some());
    // The old reader stays bound to its commit point
    assert_eq!(before.num_docs().unwrap(), 1);
    assert!(after.generation() > before.generation());
}

#[test]
fn uncommitted_changes_are_invisible() {
    let (_store, writer) = memory_writer();
    let reader = IndexReader::open(&writer).unwrap();
    writer.add_document(keyed_doc("a", 1)).unwrap();

    assert!(reader.reopen().unwrap().is_none());
    assert_eq!(IndexReader::open(&writer).unwrap().num_docs().unwrap(), 0);
}

#[test]
fn reopen_without_commit_reports_no_change() {
    let (_store, writer) = memory_writer();
    writer.add_document(keyed_doc("a", 1)).unwrap();
    writer.commit().unwrap();

    let reader = IndexReader::open(&writer).unwrap();
    assert!(reader.reopen().unwrap().is_none());
    assert!(reader.reopen().unwrap().is_none());

    // An empty commit publishes nothing
    assert!(!writer.commit().unwrap());
    assert!(reader.reopen().unwrap().is_none());
}

#[test]
fn deleted_documents_keep_their_address_in_old_readers() {
    let (_store, writer) = memory_writer();
    writer.add_document(keyed_doc("a", 1)).unwrap();
    // Keeps the first segment alive once "a" is deleted
    writer.add_document(keyed_doc("b", 1)).unwrap();
    writer.commit().unwrap();

    let reader = IndexReader::open(&writer).unwrap();
    let address = reader.find_by_key("a").unwrap().unwrap();
    writer.update_document("a", keyed_doc("a", 2)).unwrap();
    writer.commit().unwrap();

    let fresh = reader.reopen().unwrap().unwrap();
    // Same address, same values, whether or not the document is still live
    assert_eq!(reader.doc(address).unwrap(), keyed_doc("a", 1));
    assert_eq!(fresh.doc(address).unwrap(), keyed_doc("a", 1));
    assert_eq!(fresh.find_by_key("a").unwrap(), Some(DocAddress::new(1, DocId(0))));
}

#[test]
fn doc_outside_bound_segments_is_not_found() {
    let (_store, writer) = memory_writer();
    writer.add_document(keyed_doc("a", 1)).unwrap();
    writer.commit().unwrap();

    let reader = IndexReader::open(&writer).unwrap();
    let err = reader.doc(DocAddress::new(0, DocId(5))).unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
    let err = reader.doc(DocAddress::new(3, DocId(0))).unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[test]
fn search_orders_hits_by_segment_then_id() {
    let (_store, writer) = memory_writer();
    for batch in 0..3 {
        for i in 0..4 {
            writer.add_document(keyed_doc(&format!("k{}-{}", batch, i), i)).unwrap();
        }
        writer.commit().unwrap();
    }

    let reader = IndexReader::open(&writer).unwrap();
    assert_eq!(reader.segment_count(), 3);

    let results = reader.search(&Query::match_all(), 5).unwrap();
    assert_eq!(results.total_hits, 12);
    assert_eq!(results.len(), 5);
    let hits: Vec<_> = results.iter().copied().collect();
    let mut sorted = hits.clone();
    sorted.sort();
    assert_eq!(hits, sorted);
    assert_eq!(hits[4], DocAddress::new(1, DocId(0)));

    // Deterministic for a fixed commit point
    assert_eq!(reader.search(&Query::match_all(), 5).unwrap().hits, hits);
    assert!(reader.search(&Query::match_all(), 0).unwrap().is_empty());
}

#[test]
fn closed_reader_rejects_operations() {
    let (_store, writer) = memory_writer();
    writer.add_document(keyed_doc("a", 1)).unwrap();
    writer.commit().unwrap();

    let reader = IndexReader::open(&writer).unwrap();
    let address = reader.find_by_key("a").unwrap().unwrap();
    reader.close();
    assert!(reader.is_closed());

    assert_eq!(reader.search(&Query::match_all(), 10).unwrap_err().kind, ErrorKind::ClosedReader);
    assert_eq!(reader.doc(address).unwrap_err().kind, ErrorKind::ClosedReader);
    assert_eq!(reader.reopen().unwrap_err().kind, ErrorKind::ClosedReader);
    assert_eq!(reader.find_by_key("a").unwrap_err().kind, ErrorKind::ClosedReader);
    assert_eq!(reader.num_docs().unwrap_err().kind, ErrorKind::ClosedReader);
    assert_eq!(reader.max_doc().unwrap_err().kind, ErrorKind::ClosedReader);
    assert_eq!(reader.count(&Query::match_all()).unwrap_err().kind, ErrorKind::ClosedReader);

    // Metadata of the bound commit point stays readable
    assert_eq!(reader.generation(), 1);
    assert_eq!(reader.key_field(), "_key");
    assert_eq!(reader.segment_count(), 1);
}

#[test]
fn closed_writer_stops_reopen_but_not_committed_readers() {
    let (store, writer) = memory_writer();
    writer.add_document(keyed_doc("a", 1)).unwrap();
    let reader = IndexReader::open(&writer).unwrap();
    writer.close().unwrap();

    // close committed the pending document
    assert_eq!(reader.reopen().unwrap_err().kind, ErrorKind::ClosedWriter);
    assert_eq!(IndexReader::open(&writer).unwrap_err().kind, ErrorKind::ClosedWriter);
    assert_eq!(reader.num_docs().unwrap(), 0);

    let committed = IndexReader::open_committed(Arc::new(store), &IndexConfig::default()).unwrap();
    assert_eq!(committed.num_docs().unwrap(), 1);
}

#[test]
fn committed_reader_follows_a_new_writer() {
    let (store, writer) = memory_writer();
    writer.add_document(keyed_doc("a", 1)).unwrap();
    writer.add_document(keyed_doc("b", 1)).unwrap();
    writer.close().unwrap();

    let config = IndexConfig::default();
    let reader = IndexReader::open_committed(Arc::new(store.clone()), &config).unwrap();
    assert!(reader.reopen().unwrap().is_none());

    // Writer identity does not matter, only commit points do
    let writer = segdex::IndexWriter::open(Arc::new(store.clone()), config.clone()).unwrap();
    writer.update_document("a", keyed_doc("a", 2)).unwrap();
    writer.commit().unwrap();

    let reopened = reader.reopen().unwrap().unwrap();
    assert_eq!(reopened.generation(), writer.generation());
    assert_eq!(reopened.num_docs().unwrap(), 2);
    assert_eq!(reopened.max_doc().unwrap(), 3);
    assert_eq!(reader.num_docs().unwrap(), 2);
}

#[test]
fn committed_reopen_retries_when_files_are_purged_underneath() {
    let inner = segdex::MemoryByteStore::new();
    let store = Arc::new(InterleavingStore::new(inner));
    let config = IndexConfig::default().with_keep_previous_commit(false);
    let writer = Arc::new(segdex::IndexWriter::open(store.clone(), config.clone()).unwrap());

    writer.add_document(keyed_doc("a", 1)).unwrap();
    writer.add_document(keyed_doc("b", 1)).unwrap();
    writer.commit().unwrap();
    let reader = IndexReader::open_committed(store.clone(), &config).unwrap();

    // Generation 2 deletes "a" from the first segment through {segment}_2.del
    writer.update_document("a", keyed_doc("a", 2)).unwrap();
    writer.commit().unwrap();

    // While the reader loads generation 2, generation 3 lands and purges that file
    let racing = writer.clone();
    store.before_first_read("_2.del", move || {
        racing.update_document("b", keyed_doc("b", 2)).unwrap();
        racing.commit().unwrap();
    });

    let reopened = reader.reopen().unwrap().unwrap();
    assert_eq!(reopened.generation(), 3);
    assert_eq!(reopened.num_docs().unwrap(), 2);
    let b = reopened.retrieve_or_create("b").unwrap();
    assert_eq!(b.get("ft1").and_then(segdex::FieldValue::as_i64), Some(2));
}

#[test]
fn open_committed_on_empty_store_is_not_found() {
    let store = segdex::MemoryByteStore::new();
    let err = IndexReader::open_committed(Arc::new(store), &IndexConfig::default()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[test]
fn readers_search_while_the_writer_commits() {
    let (_store, writer) = memory_writer();
    writer.add_document(keyed_doc("seed", 0)).unwrap();
    writer.commit().unwrap();
    let writer = Arc::new(writer);

    let reader = Arc::new(IndexReader::open(&writer).unwrap());
    let searchers: Vec<_> = (0..4)
        .map(|_| {
            let reader = reader.clone();
            thread::spawn(move || {
                for _ in 0..50 {
                    assert_eq!(reader.count(&Query::match_all()).unwrap(), 1);
                }
            })
        })
        .collect();

    for i in 0..10 {
        writer.update_document("seed", keyed_doc("seed", i)).unwrap();
        writer.add_document(keyed_doc(&format!("extra{}", i), i)).unwrap();
        writer.commit().unwrap();
    }
    for handle in searchers {
        handle.join().unwrap();
    }

    let latest = reader.reopen().unwrap().unwrap();
    assert_eq!(latest.num_docs().unwrap(), 11);
    assert_eq!(reader.num_docs().unwrap(), 1);
}
