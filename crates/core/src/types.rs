//! Watermarks, folder sets and change records

use chrono::{DateTime, Duration, SubsecRound, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Wire format for persisted watermarks (second precision, always UTC)
const WATERMARK_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Opaque identifier of a folder in the monitored tree
#[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FolderId(String);

impl FolderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FolderId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for FolderId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Every folder reachable from a monitored root, root included
///
/// Insertion order is kept but carries no meaning; it follows whatever order
/// the backend enumerated children in.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<FolderId>", into = "Vec<FolderId>")]
pub struct FolderSet {
    ids: Vec<FolderId>,
    seen: HashSet<FolderId>,
}

impl FolderSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a folder, returning false if it was already present
    pub fn insert(&mut self, id: FolderId) -> bool {
        if self.seen.contains(&id) {
            return false;
        }
        self.seen.insert(id.clone());
        self.ids.push(id);
        true
    }

    pub fn contains(&self, id: &FolderId) -> bool {
        self.seen.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FolderId> {
        self.ids.iter()
    }
}

impl From<Vec<FolderId>> for FolderSet {
    fn from(ids: Vec<FolderId>) -> Self {
        ids.into_iter().collect()
    }
}

impl From<FolderSet> for Vec<FolderId> {
    fn from(set: FolderSet) -> Self {
        set.ids
    }
}

impl FromIterator<FolderId> for FolderSet {
    fn from_iter<I: IntoIterator<Item = FolderId>>(iter: I) -> Self {
        let mut set = FolderSet::new();
        for id in iter {
            set.insert(id);
        }
        set
    }
}

/// One file observed as modified at or after the watermark
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// Display name of the file
    pub name: String,
    /// User-facing link to the file
    pub url: String,
    /// Last modification time reported by the backend
    pub last_updated: DateTime<Utc>,
}

impl ChangeRecord {
    pub fn new(name: impl Into<String>, url: impl Into<String>, last_updated: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            last_updated,
        }
    }
}

/// Boundary between processed and unprocessed modifications
///
/// Backend queries compare inclusively (`>=`), so a watermark advanced past a
/// batch sits one second after the newest record in it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Watermark(DateTime<Utc>);

impl Watermark {
    /// The beginning of time, used when nothing has been stored yet
    pub fn epoch() -> Self {
        Self(Utc.timestamp_opt(0, 0).single().unwrap_or_default())
    }

    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self(at)
    }

    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }

    /// Parse a persisted watermark (any RFC 3339 timestamp is accepted)
    pub fn parse(value: &str) -> Result<Self, chrono::ParseError> {
        let parsed = DateTime::parse_from_rfc3339(value.trim())?;
        Ok(Self(parsed.with_timezone(&Utc)))
    }

    /// Render as `YYYY-MM-DDTHH:MM:SSZ`
    pub fn to_iso_string(&self) -> String {
        self.0.format(WATERMARK_FORMAT).to_string()
    }

    /// Compute the watermark that follows a batch of changes
    ///
    /// Returns `None` for an empty batch. Otherwise the result is the newest
    /// modification time truncated to whole seconds plus one second, and never
    /// earlier than `self`.
    pub fn advance_past(&self, changes: &[ChangeRecord]) -> Option<Self> {
        let newest = changes.iter().map(|c| c.last_updated).max()?;
        let next = Self(newest.trunc_subsecs(0) + Duration::seconds(1));
        Some(next.max(*self))
    }
}

impl Default for Watermark {
    fn default() -> Self {
        Self::epoch()
    }
}

impl fmt::Display for Watermark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_iso_string())
    }
}
