use crc32fast::Hasher;
use crate::core::error::{Error, Result};
use crate::core::types::{DocId, Document};
use crate::index::inverted::{InvertedIndex, Term};
use crate::index::posting::PostingList;
use crate::storage::byte_store::ByteStore;
use crate::storage::layout::FileLayout;
use crate::storage::segment::{SegmentHeader, SegmentId, SegmentMeta};
use crate::storage::segment_writer::SegmentData;

/// Immutable, fully loaded segment: inverted index plus stored fields
#[derive(Debug)]
pub struct SegmentReader {
    pub meta: SegmentMeta,
    pub index: InvertedIndex,
    pub stored: Vec<Document>,
}

impl SegmentReader {
    pub fn from_data(meta: SegmentMeta, data: SegmentData) -> Self {
        SegmentReader {
            meta,
            index: data.index,
            stored: data.stored,
        }
    }

    /// Load and verify a segment file
    pub fn open(store: &dyn ByteStore, meta: SegmentMeta) -> Result<Self> {
        let name = FileLayout::segment_file(&meta.id);

        let header_buf = store.read_range(&name, 0, SegmentHeader::SIZE)?;
        let header = SegmentHeader::decode(&header_buf)?;

        if header.doc_count != meta.doc_count {
            return Err(Error::corruption(format!(
                "segment {} holds {} docs, commit point expects {}",
                name, header.doc_count, meta.doc_count
            )));
        }

        // The header has no checksum of its own, so its length is checked against the file
        let file_len = store.len(&name)?;
        if (SegmentHeader::SIZE as u64).checked_add(header.body_len) != Some(file_len) {
            return Err(Error::corruption(format!(
                "segment {} declares a {} byte body but the file is {} bytes",
                name, header.body_len, file_len
            )));
        }

        let body = store.read_range(&name, SegmentHeader::SIZE as u64, header.body_len as usize)?;

        let mut hasher = Hasher::new();
        hasher.update(&body);
        if hasher.finalize() != header.checksum {
            return Err(Error::corruption(format!("checksum mismatch in segment {}", name)));
        }

        let raw = lz4_flex::decompress_size_prepended(&body)?;
        let data: SegmentData = bincode::deserialize(&raw)?;

        if data.stored.len() != meta.doc_count as usize {
            return Err(Error::corruption(format!("segment {} stored table is truncated", name)));
        }

        Ok(Self::from_data(meta, data))
    }

    pub fn id(&self) -> SegmentId {
        self.meta.id
    }

    /// Number of documents ever written to this segment, deleted or not
    pub fn max_doc(&self) -> u32 {
        self.meta.doc_count
    }

    pub fn get_document(&self, doc_id: DocId) -> Option<&Document> {
        self.stored.get(doc_id.0 as usize)
    }

    pub fn postings(&self, term: &Term) -> Option<&PostingList> {
        self.index.search_term(term)
    }
}
