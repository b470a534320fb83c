//! Navigation state of the object browser.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::object::ObjectEntry;

/// What the browser is showing. Exactly one at a time.
#[derive(Serialize, Clone, Debug, PartialEq, Eq, Default)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum BrowseMode {
    #[default]
    FolderListing,
    /// Details panel for one object; `object` is the decoded key.
    ObjectDetails { object: String },
    /// Version history of one object.
    VersionsBrowsing { object: String },
}

impl BrowseMode {
    pub fn selected_object(&self) -> Option<&str> {
        match self {
            BrowseMode::FolderListing => None,
            BrowseMode::ObjectDetails { object } | BrowseMode::VersionsBrowsing { object } => {
                Some(object)
            }
        }
    }
}

/// Time-travel listing configuration.
#[derive(Serialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct RewindState {
    pub enabled: bool,
    /// Bucket the rewind was configured for.
    pub bucket: String,
    pub date: Option<DateTime<Utc>>,
}

#[derive(Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    Name,
    Size,
    LastModified,
}

#[derive(Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn compare(&self, a: &ObjectEntry, b: &ObjectEntry) -> Ordering {
        let ord = match self.field {
            SortField::Name => a.name.cmp(&b.name),
            SortField::Size => a.size.cmp(&b.size),
            SortField::LastModified => a.last_modified.cmp(&b.last_modified),
        };
        match self.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    }
}

#[derive(Serialize, Clone, Debug, Default)]
pub struct NavigationState {
    pub bucket: String,
    /// Decoded path exactly as navigated to.
    pub internal_path: String,
    /// Folder whose contents are listed; trailing separator, empty at root.
    pub simple_path: String,
    pub mode: BrowseMode,
    pub rewind: RewindState,
    pub show_deleted: bool,
    pub sort: SortSpec,
    /// Case-insensitive name filter applied to the visible entries.
    pub filter: String,
    /// Keys selected for bulk actions.
    pub selected: Vec<String>,
    /// Folders first, then files.
    pub entries: Vec<ObjectEntry>,
    /// Version list of the open object, filled in versions mode.
    pub versions: Vec<ObjectEntry>,
    pub loading: bool,
    pub loading_versions: bool,
}
