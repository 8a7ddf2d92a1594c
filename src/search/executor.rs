use crate::core::types::{DocAddress, DocId};
use crate::mvcc::controller::{SegmentView, Snapshot};
use crate::query::ast::Query;
use crate::search::results::SearchResults;

/// Evaluates queries against the segments of one snapshot
pub struct QueryExecutor<'a> {
    pub snapshot: &'a Snapshot,
}

impl<'a> QueryExecutor<'a> {
    pub fn new(snapshot: &'a Snapshot) -> Self {
        QueryExecutor { snapshot }
    }

    pub fn execute(&self, query: &Query, limit: usize) -> SearchResults {
        let mut results = SearchResults::default();

        for (ord, view) in self.snapshot.segments.iter().enumerate() {
            for doc_id in Self::candidates(view, query) {
                if !view.is_live(doc_id) {
                    continue;
                }
                results.total_hits += 1;
                if results.hits.len() < limit {
                    results.hits.push(DocAddress::new(ord as u32, doc_id));
                }
            }
        }

        results
    }

    pub fn count(&self, query: &Query) -> usize {
        match query {
            Query::MatchAll => self.snapshot.num_docs() as usize,
            _ => self.execute(query, 0).total_hits,
        }
    }

    /// Candidate ids in ascending order, liveness not yet applied
    fn candidates(view: &'a SegmentView, query: &Query) -> Box<dyn Iterator<Item = DocId> + 'a> {
        match query {
            Query::MatchAll => Box::new((0..view.reader.max_doc()).map(DocId)),
            Query::Term(term) => match view.reader.postings(term) {
                Some(postings) => Box::new(postings.iter()),
                None => Box::new(std::iter::empty()),
            },
        }
    }
}
