//! Combined "modified since" file query
//!
//! A single query covers every folder of a folder set, so a tick costs one
//! backend request no matter how many folders are monitored.

use crate::types::{FolderId, FolderSet, Watermark};
use chrono::{DateTime, Utc};

/// Files modified at or after `modified_since`, not trashed, whose parent is
/// any folder in `folders`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileQuery {
    pub modified_since: Watermark,
    pub folders: Vec<FolderId>,
}

impl FileQuery {
    pub fn new(folders: &FolderSet, modified_since: Watermark) -> Self {
        Self {
            modified_since,
            folders: folders.iter().cloned().collect(),
        }
    }

    /// Evaluate the query against one file, for backends that filter locally
    pub fn matches(&self, parent: &FolderId, modified: DateTime<Utc>, trashed: bool) -> bool {
        !trashed
            && modified >= self.modified_since.as_datetime()
            && self.folders.iter().any(|f| f == parent)
    }

    /// Render in the Drive v3 search syntax
    ///
    /// ```text
    /// modifiedTime >= '2024-01-01T00:00:00Z' and trashed = false and ('a' in parents or 'b' in parents)
    /// ```
    pub fn to_drive_query(&self) -> String {
        let parents = self
            .folders
            .iter()
            .map(|id| format!("'{}' in parents", escape_literal(id.as_str())))
            .collect::<Vec<_>>()
            .join(" or ");

        format!(
            "modifiedTime >= '{}' and trashed = false and ({})",
            self.modified_since.to_iso_string(),
            parents
        )
    }
}

/// Escape a value for use inside a single-quoted Drive query literal
pub fn escape_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn folders(ids: &[&str]) -> FolderSet {
        ids.iter().map(|id| FolderId::from(*id)).collect()
    }

    #[test]
    fn test_drive_query_combines_all_folders() {
        let wm = Watermark::parse("2024-01-01T00:00:00Z").unwrap();
        let query = FileQuery::new(&folders(&["root", "child"]), wm);

        assert_eq!(
            query.to_drive_query(),
            "modifiedTime >= '2024-01-01T00:00:00Z' and trashed = false \
             and ('root' in parents or 'child' in parents)"
        );
    }

    #[test]
    fn test_drive_query_escapes_quotes() {
        let query = FileQuery::new(&folders(&["it's"]), Watermark::epoch());
        assert!(query.to_drive_query().contains(r"'it\'s' in parents"));
    }

    #[test]
    fn test_matches_is_inclusive_at_watermark() {
        let wm = Watermark::parse("2024-01-01T00:00:00Z").unwrap();
        let query = FileQuery::new(&folders(&["root"]), wm);
        let root = FolderId::from("root");

        assert!(query.matches(&root, wm.as_datetime(), false));
        assert!(!query.matches(&root, wm.as_datetime() - chrono::Duration::seconds(1), false));
        assert!(!query.matches(&root, wm.as_datetime(), true));
        assert!(!query.matches(&FolderId::from("other"), wm.as_datetime(), false));
    }
}
