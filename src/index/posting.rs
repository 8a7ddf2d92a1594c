use serde::{Deserialize, Serialize};
use crate::core::types::DocId;

/// Posting list for a term
/// Note: Sorted by doc_id, no duplicates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostingList {
    pub doc_ids: Vec<DocId>,
}

impl PostingList {
    pub fn new() -> Self {
        PostingList {
            doc_ids: Vec::new(),
        }
    }

    pub fn add(&mut self, doc_id: DocId) {
        // Flush assigns ids in ascending order, so this is almost always a push
        if self.doc_ids.last().is_some_and(|last| *last < doc_id) {
            self.doc_ids.push(doc_id);
            return;
        }
        if let Err(pos) = self.doc_ids.binary_search(&doc_id) {
            self.doc_ids.insert(pos, doc_id);
        }
    }

    pub fn contains(&self, doc_id: DocId) -> bool {
        self.doc_ids.binary_search(&doc_id).is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = DocId> + '_ {
        self.doc_ids.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.doc_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc_ids.is_empty()
    }

    pub fn doc_freq(&self) -> u32 {
        self.doc_ids.len() as u32
    }
}
