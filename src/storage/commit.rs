use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::core::error::{Error, ErrorKind, Result};
use crate::storage::byte_store::ByteStore;
use crate::storage::layout::FileLayout;
use crate::storage::segment::SegmentMeta;

/// A segment as referenced by a commit point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentEntry {
    pub meta: SegmentMeta,
    pub del_gen: u64, // 0 = no liveness file
    pub deleted_count: u32,
}

/// Durable description of the whole index at one generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitPoint {
    pub generation: u64,
    pub timestamp: DateTime<Utc>,
    pub segments: Vec<SegmentEntry>,
}

impl CommitPoint {
    /// Write the commit file. Once this returns the commit is durable and
    /// discoverable; a torn write fails its checksum and is skipped on load.
    pub fn write(&self, store: &dyn ByteStore) -> Result<()> {
        let data = bincode::serialize(self)?;

        let mut bytes = Vec::with_capacity(4 + data.len());
        bytes.extend_from_slice(&crc32fast::hash(&data).to_le_bytes());
        bytes.extend_from_slice(&data);

        let name = FileLayout::commit_file(self.generation);
        let offset = store.write_append(&name, &bytes)?;
        if offset != 0 {
            return Err(Error::corruption(format!("commit file {} already existed", name)));
        }
        store.sync(&name)
    }

    pub fn read(store: &dyn ByteStore, generation: u64) -> Result<Self> {
        let name = FileLayout::commit_file(generation);
        let bytes = store.read_all(&name)?;
        if bytes.len() < 4 {
            return Err(Error::corruption(format!("commit file {} is truncated", name)));
        }

        let (crc, data) = bytes.split_at(4);
        let expected = u32::from_le_bytes([crc[0], crc[1], crc[2], crc[3]]);
        if crc32fast::hash(data) != expected {
            return Err(Error::corruption(format!("checksum mismatch in {}", name)));
        }

        let commit: CommitPoint = bincode::deserialize(data)?;
        if commit.generation != generation {
            return Err(Error::corruption(format!(
                "{} claims generation {}",
                name, commit.generation
            )));
        }
        Ok(commit)
    }

    /// Generations of every commit file present, ascending
    pub fn generations(store: &dyn ByteStore) -> Result<Vec<u64>> {
        let mut generations: Vec<u64> = store
            .list()?
            .iter()
            .filter_map(|name| FileLayout::parse_commit_generation(name))
            .collect();
        generations.sort_unstable();
        Ok(generations)
    }

    /// Highest generation whose commit file verifies; corrupt ones are skipped
    pub fn load_latest(store: &dyn ByteStore) -> Result<Option<Self>> {
        for generation in Self::generations(store)?.into_iter().rev() {
            match Self::read(store, generation) {
                Ok(commit) => return Ok(Some(commit)),
                Err(e) if e.is(ErrorKind::Corruption) => {
                    log::warn!("skipping unreadable commit point {}: {}", generation, e);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(None)
    }

    /// Every file this commit point needs, itself included
    pub fn referenced_files(&self) -> Vec<String> {
        let mut files = vec![FileLayout::commit_file(self.generation)];
        for entry in &self.segments {
            files.push(FileLayout::segment_file(&entry.meta.id));
            if entry.del_gen > 0 {
                files.push(FileLayout::live_docs_file(&entry.meta.id, entry.del_gen));
            }
        }
        files
    }
}
