use crate::core::types::DocAddress;

/// Search results container
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResults {
    pub hits: Vec<DocAddress>, // At most `limit`, ascending by segment then doc id
    pub total_hits: usize,     // All live matches, regardless of limit
}

impl SearchResults {
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn first(&self) -> Option<DocAddress> {
        self.hits.first().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DocAddress> {
        self.hits.iter()
    }
}
