use chrono::Utc;
use crc32fast::Hasher;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use crate::analysis::analyzer::Analyzer;
use crate::core::error::{Error, Result};
use crate::core::types::{DocId, Document};
use crate::index::inverted::{InvertedIndex, Term};
use crate::storage::byte_store::ByteStore;
use crate::storage::layout::FileLayout;
use crate::storage::segment::{SegmentHeader, SegmentId, SegmentMeta};
use crate::storage::live_docs::LiveDocs;
use crate::storage::segment_reader::SegmentReader;

/// Everything a segment file holds
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SegmentData {
    pub index: InvertedIndex,
    pub stored: Vec<Document>, // Indexed by DocId
}

impl SegmentData {
    /// Combine the live documents of several segments, renumbering ids in
    /// segment order. Postings are remapped rather than re-analyzed, so
    /// indexed-only fields survive.
    pub fn merge<'a>(parts: impl IntoIterator<Item = (&'a SegmentReader, &'a LiveDocs)>) -> Self {
        let mut merged = SegmentData::default();

        for (reader, live_docs) in parts {
            let base = merged.stored.len() as u32;
            let mut remap = vec![None; reader.max_doc() as usize];
            let mut next = base;

            for (ord, doc) in reader.stored.iter().enumerate() {
                if live_docs.is_live(DocId(ord as u32)) {
                    remap[ord] = Some(DocId(next));
                    merged.stored.push(doc.clone());
                    next += 1;
                }
            }

            for (field, terms) in &reader.index.fields {
                for (value, postings) in terms {
                    for old in postings.iter() {
                        if let Some(Some(new_id)) = remap.get(old.0 as usize) {
                            merged.index
                                .fields
                                .entry(field.clone())
                                .or_default()
                                .entry(value.clone())
                                .or_default()
                                .add(*new_id);
                        }
                    }
                }
            }
        }

        merged.index.doc_count = merged.stored.len() as u32;
        merged
    }
}

/// In-memory buffer of documents waiting to become a segment
#[derive(Debug, Default)]
pub struct SegmentWriter {
    pub docs: Vec<Document>,
}

impl SegmentWriter {
    pub fn new() -> Self {
        SegmentWriter { docs: Vec::new() }
    }

    /// Buffer a document; returns the id it will get once flushed
    pub fn write_document(&mut self, doc: Document) -> DocId {
        let doc_id = DocId(self.docs.len() as u32);
        self.docs.push(doc);
        doc_id
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn clear(&mut self) {
        self.docs.clear();
    }

    /// Analyze buffered docs and build the inverted index + stored fields table
    pub fn build(&self, analyzer: &Analyzer, parallel_threshold: usize) -> SegmentData {
        let analyze = |doc: &Document| -> Vec<Term> {
            doc.fields
                .iter()
                .flat_map(|field| Term::from_field(field, analyzer))
                .collect()
        };

        // Parallel analysis only pays off for larger batches; order is preserved either way
        let doc_terms: Vec<Vec<Term>> = if self.docs.len() > parallel_threshold {
            self.docs.par_iter().map(analyze).collect()
        } else {
            self.docs.iter().map(analyze).collect()
        };

        let mut index = InvertedIndex::new();
        for (ord, terms) in doc_terms.iter().enumerate() {
            index.add_document(DocId(ord as u32), terms);
        }
        index.doc_count = self.docs.len() as u32;

        SegmentData {
            index,
            stored: self.docs.iter().map(Document::stored_only).collect(),
        }
    }

    pub fn flush(
        &self,
        store: &dyn ByteStore,
        segment_id: SegmentId,
        analyzer: &Analyzer,
        parallel_threshold: usize,
    ) -> Result<SegmentReader> {
        let data = self.build(analyzer, parallel_threshold);
        Self::write_data(store, segment_id, data)
    }

    // [ HEADER (magic, version, doc_count, body_len, checksum) ] <- byte 0
    // [ LZ4( bincode(SegmentData) ) ]
    pub fn write_data(store: &dyn ByteStore, segment_id: SegmentId, data: SegmentData) -> Result<SegmentReader> {
        let doc_count = data.stored.len() as u32;

        let body = bincode::serialize(&data)?;
        let compressed = lz4_flex::compress_prepend_size(&body);

        let mut hasher = Hasher::new();
        hasher.update(&compressed);
        let header = SegmentHeader::new(doc_count, compressed.len() as u64, hasher.finalize());

        let mut bytes = Vec::with_capacity(SegmentHeader::SIZE + compressed.len());
        bytes.extend_from_slice(&header.encode());
        bytes.extend_from_slice(&compressed);

        let name = FileLayout::segment_file(&segment_id);
        let offset = store.write_append(&name, &bytes)?;
        if offset != 0 {
            return Err(Error::corruption(format!("segment file {} already existed", name)));
        }
        store.sync(&name)?;

        let meta = SegmentMeta {
            id: segment_id,
            doc_count,
            created_at: Utc::now(),
            size_bytes: bytes.len() as u64,
        };
        Ok(SegmentReader::from_data(meta, data))
    }
}
