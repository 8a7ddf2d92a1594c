use crate::storage::segment::SegmentId;

pub const LOCK_FILE: &str = "write.lock";

const COMMIT_PREFIX: &str = "commit_";
const SEGMENT_EXT: &str = ".seg";
const LIVE_DOCS_EXT: &str = ".del";

/// Names of the files making up an index inside a byte store
pub struct FileLayout;

impl FileLayout {
    pub fn segment_file(id: &SegmentId) -> String {
        format!("{}{}", id.0, SEGMENT_EXT)
    }

    pub fn live_docs_file(id: &SegmentId, del_gen: u64) -> String {
        format!("{}_{}{}", id.0, del_gen, LIVE_DOCS_EXT)
    }

    pub fn commit_file(generation: u64) -> String {
        format!("{}{:010}", COMMIT_PREFIX, generation)
    }

    pub fn parse_commit_generation(name: &str) -> Option<u64> {
        name.strip_prefix(COMMIT_PREFIX)?.parse().ok()
    }

    /// Whether `name` is a file this crate writes (the lock excluded)
    pub fn is_index_file(name: &str) -> bool {
        name.ends_with(SEGMENT_EXT)
            || name.ends_with(LIVE_DOCS_EXT)
            || Self::parse_commit_generation(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_file_names_sort_by_generation() {
        assert_eq!(FileLayout::commit_file(7), "commit_0000000007");
        assert_eq!(FileLayout::parse_commit_generation("commit_0000000007"), Some(7));
        assert_eq!(FileLayout::parse_commit_generation("commit_x"), None);
        assert!(FileLayout::commit_file(9) < FileLayout::commit_file(10));
    }

    #[test]
    fn lock_is_not_an_index_file() {
        let id = SegmentId::new();
        assert!(FileLayout::is_index_file(&FileLayout::segment_file(&id)));
        assert!(FileLayout::is_index_file(&FileLayout::live_docs_file(&id, 3)));
        assert!(FileLayout::is_index_file(&FileLayout::commit_file(1)));
        assert!(!FileLayout::is_index_file(LOCK_FILE));
    }
}
