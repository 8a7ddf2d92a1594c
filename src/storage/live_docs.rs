use roaring::RoaringBitmap;
use crate::core::error::{Error, Result};
use crate::core::types::DocId;
use crate::storage::byte_store::ByteStore;
use crate::storage::layout::FileLayout;
use crate::storage::segment::SegmentId;

/// One version of a segment's deletion bitmap.
///
/// Versions are immutable: deleting more documents produces a new `LiveDocs`
/// with a higher `del_gen`, and readers holding the old one keep seeing it.
/// `del_gen == 0` means nothing was ever deleted and no file exists.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LiveDocs {
    pub deleted: RoaringBitmap,
    pub del_gen: u64,
}

impl LiveDocs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_live(&self, doc_id: DocId) -> bool {
        !self.deleted.contains(doc_id.0)
    }

    pub fn num_deleted(&self) -> u32 {
        self.deleted.len() as u32
    }

    pub fn num_live(&self, max_doc: u32) -> u32 {
        max_doc.saturating_sub(self.num_deleted())
    }

    /// Copy-on-write: a new version with `doc_ids` also marked deleted
    pub fn with_deleted(&self, doc_ids: impl IntoIterator<Item = DocId>, del_gen: u64) -> Self {
        let mut deleted = self.deleted.clone();
        deleted.extend(doc_ids.into_iter().map(|d| d.0));
        LiveDocs { deleted, del_gen }
    }

    // [ CRC32 4 ][ roaring bitmap ]
    pub fn write(&self, store: &dyn ByteStore, segment_id: &SegmentId) -> Result<()> {
        let mut bitmap = Vec::with_capacity(self.deleted.serialized_size());
        self.deleted.serialize_into(&mut bitmap)?;

        let mut bytes = Vec::with_capacity(4 + bitmap.len());
        bytes.extend_from_slice(&crc32fast::hash(&bitmap).to_le_bytes());
        bytes.extend_from_slice(&bitmap);

        let name = FileLayout::live_docs_file(segment_id, self.del_gen);
        let offset = store.write_append(&name, &bytes)?;
        if offset != 0 {
            return Err(Error::corruption(format!("liveness file {} already existed", name)));
        }
        store.sync(&name)
    }

    pub fn load(store: &dyn ByteStore, segment_id: &SegmentId, del_gen: u64) -> Result<Self> {
        if del_gen == 0 {
            return Ok(Self::new());
        }

        let name = FileLayout::live_docs_file(segment_id, del_gen);
        let bytes = store.read_all(&name)?;
        if bytes.len() < 4 {
            return Err(Error::corruption(format!("liveness file {} is truncated", name)));
        }

        let (crc, bitmap) = bytes.split_at(4);
        let expected = u32::from_le_bytes([crc[0], crc[1], crc[2], crc[3]]);
        if crc32fast::hash(bitmap) != expected {
            return Err(Error::corruption(format!("checksum mismatch in {}", name)));
        }

        let deleted = RoaringBitmap::deserialize_from(bitmap)
            .map_err(|e| Error::corruption(format!("{}: {}", name, e)))?;
        Ok(LiveDocs { deleted, del_gen })
    }
}
