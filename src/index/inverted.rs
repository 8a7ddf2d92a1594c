use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use crate::analysis::analyzer::Analyzer;
use crate::core::types::{DocId, Field, FieldValue};
use crate::index::posting::PostingList;

/// Indexed value of a term: a token or exact string, or an integer
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TermValue {
    Str(String),
    Int(i64),
}

/// Term representation: (field name, value)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Term {
    pub field: String,
    pub value: TermValue,
}

impl Term {
    pub fn new(field: impl Into<String>, value: TermValue) -> Self {
        Term {
            field: field.into(),
            value,
        }
    }

    /// Exact string term, matched without analysis
    pub fn exact(field: impl Into<String>, value: impl Into<String>) -> Self {
        Term::new(field, TermValue::Str(value.into()))
    }

    pub fn integer(field: impl Into<String>, value: i64) -> Self {
        Term::new(field, TermValue::Int(value))
    }

    /// Terms produced by indexing one field
    pub fn from_field(field: &Field, analyzer: &Analyzer) -> Vec<Term> {
        match &field.value {
            FieldValue::Text(text) => analyzer
                .analyze(text)
                .into_iter()
                .map(|token| Term::exact(field.name.clone(), token.text))
                .collect(),
            FieldValue::StoredExact(value) => vec![Term::exact(field.name.clone(), value.clone())],
            FieldValue::Integer(value) => vec![Term::integer(field.name.clone(), *value)],
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.value {
            TermValue::Str(s) => write!(f, "{}:{}", self.field, s),
            TermValue::Int(v) => write!(f, "{}:{}", self.field, v),
        }
    }
}

/// Inverted index structure: field -> term value -> posting list
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvertedIndex {
    pub fields: BTreeMap<String, BTreeMap<TermValue, PostingList>>,
    pub doc_count: u32,
}

impl InvertedIndex {
    pub fn new() -> Self {
        InvertedIndex {
            fields: BTreeMap::new(),
            doc_count: 0,
        }
    }

    pub fn add_document(&mut self, doc_id: DocId, terms: &[Term]) {
        for term in terms {
            self.fields
                .entry(term.field.clone())
                .or_default()
                .entry(term.value.clone())
                .or_default()
                .add(doc_id);
        }
        self.doc_count = self.doc_count.max(doc_id.0 + 1);
    }

    pub fn search_term(&self, term: &Term) -> Option<&PostingList> {
        self.fields.get(&term.field)?.get(&term.value)
    }
}
