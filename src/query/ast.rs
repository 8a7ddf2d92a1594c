use std::fmt;
use crate::index::inverted::Term;

/// Query kinds the executor understands
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    MatchAll,   // Every live document
    Term(Term), // Live documents whose field holds exactly this term
}

impl Query {
    pub fn match_all() -> Self {
        Query::MatchAll
    }

    pub fn term(term: Term) -> Self {
        Query::Term(term)
    }
}

impl From<Term> for Query {
    fn from(term: Term) -> Self {
        Query::Term(term)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Query::MatchAll => write!(f, "*:*"),
            Query::Term(term) => write!(f, "{}", term),
        }
    }
}
