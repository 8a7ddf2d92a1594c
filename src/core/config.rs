use std::sync::Arc;
use crate::analysis::analyzer::Analyzer;

pub const DEFAULT_KEY_FIELD: &str = "_key";

/// How a writer treats an existing index at its storage location
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    Create,         // Drop any existing index files
    Append,         // Require an existing commit point
    CreateOrAppend,
}

#[derive(Debug, Clone)]
pub struct IndexConfig {
    pub key_field: String,
    pub open_mode: OpenMode,
    pub analyzer: Arc<Analyzer>,

    pub parallel_analysis_threshold: usize, // Flush analyzes docs with rayon above this
    pub keep_previous_commit: bool,         // Purge keeps files of the prior commit point
}

impl IndexConfig {
    pub fn with_key_field(mut self, key_field: impl Into<String>) -> Self {
        self.key_field = key_field.into();
        self
    }

    pub fn with_open_mode(mut self, open_mode: OpenMode) -> Self {
        self.open_mode = open_mode;
        self
    }

    pub fn with_analyzer(mut self, analyzer: Analyzer) -> Self {
        self.analyzer = Arc::new(analyzer);
        self
    }

    pub fn with_parallel_analysis_threshold(mut self, threshold: usize) -> Self {
        self.parallel_analysis_threshold = threshold;
        self
    }

    pub fn with_keep_previous_commit(mut self, keep: bool) -> Self {
        self.keep_previous_commit = keep;
        self
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        IndexConfig {
            key_field: DEFAULT_KEY_FIELD.to_string(),
            open_mode: OpenMode::CreateOrAppend,
            analyzer: Arc::new(Analyzer::standard()),
            parallel_analysis_threshold: 100,
            keep_previous_commit: true,
        }
    }
}
