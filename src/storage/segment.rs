use chrono::{DateTime, Utc};
use uuid::Uuid;
use serde::{Deserialize, Serialize};
use crate::core::error::{Error, Result};

/// Unique segment identifier, never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SegmentId(pub Uuid);

impl SegmentId {
    pub fn new() -> Self {
        SegmentId(Uuid::new_v4())
    }
}

impl Default for SegmentId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentMeta {
    pub id: SegmentId,
    pub doc_count: u32,
    pub created_at: DateTime<Utc>,
    pub size_bytes: u64,
}

/// Segment file header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentHeader {
    pub version: u32,   // Format version
    pub doc_count: u32, // Number of documents
    pub body_len: u64,  // Compressed body length
    pub checksum: u32,  // CRC32 of the body
}

impl SegmentHeader {
    pub const MAGIC: [u8; 4] = *b"SGDX";
    pub const VERSION: u32 = 1;
    pub const SIZE: usize = 24; // Fixed header size

    pub fn new(doc_count: u32, body_len: u64, checksum: u32) -> Self {
        SegmentHeader {
            version: Self::VERSION,
            doc_count,
            body_len,
            checksum,
        }
    }

    // [ MAGIC 4 ][ version 4 ][ doc_count 4 ][ body_len 8 ][ checksum 4 ]
    pub fn encode(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        buf[0..4].copy_from_slice(&Self::MAGIC);
        buf[4..8].copy_from_slice(&self.version.to_le_bytes());
        buf[8..12].copy_from_slice(&self.doc_count.to_le_bytes());
        buf[12..20].copy_from_slice(&self.body_len.to_le_bytes());
        buf[20..24].copy_from_slice(&self.checksum.to_le_bytes());
        buf
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < Self::SIZE || buf[0..4] != Self::MAGIC {
            return Err(Error::corruption("not a segment file"));
        }

        let u32_at = |at: usize| u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]]);
        let mut body_len = [0u8; 8];
        body_len.copy_from_slice(&buf[12..20]);

        let header = SegmentHeader {
            version: u32_at(4),
            doc_count: u32_at(8),
            body_len: u64::from_le_bytes(body_len),
            checksum: u32_at(20),
        };

        if header.version != Self::VERSION {
            return Err(Error::corruption(format!(
                "incompatible segment version {}",
                header.version
            )));
        }
        Ok(header)
    }
}
