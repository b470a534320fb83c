//! Represents an object (or folder placeholder) returned by a listing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::paths::SEPARATOR;

/// A single entry of a bucket listing.
///
/// Folders are not real objects: the backend reports common prefixes as
/// entries whose name ends with the path separator.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ObjectEntry {
    /// Full object key (path-like identifier within the bucket).
    pub name: String,

    /// Size in bytes. Zero for folders.
    #[serde(default)]
    pub size: i64,

    #[serde(default)]
    pub last_modified: Option<DateTime<Utc>>,

    /// Version identifier if versioning is enabled.
    #[serde(default)]
    pub version_id: Option<String>,

    /// Whether this entry is a delete marker (soft-deleted object).
    #[serde(default)]
    pub delete_flag: bool,

    #[serde(default)]
    pub is_latest: bool,

    #[serde(default)]
    pub content_type: Option<String>,

    #[serde(default)]
    pub etag: Option<String>,
}

impl ObjectEntry {
    /// Entry for a folder (common prefix).
    pub fn folder(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn is_folder(&self) -> bool {
        self.name.ends_with(SEPARATOR)
    }
}

/// Body of `GET /buckets/{bucket}/objects` and the rewind endpoint.
///
/// `objects` is `None` when the backend omits the array entirely, which the
/// listing controller treats differently from an empty array.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ListObjectsResponse {
    #[serde(default)]
    pub objects: Option<Vec<ObjectEntry>>,

    #[serde(default)]
    pub total: Option<i64>,
}

impl ListObjectsResponse {
    pub fn into_entries(self) -> Vec<ObjectEntry> {
        self.objects.unwrap_or_default()
    }
}
