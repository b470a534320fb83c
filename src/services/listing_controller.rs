//! ListingController: resolves what the browser shows for a bucket and path.
//!
//! Navigation decodes the path, decides tentatively between a folder and an
//! object, lists the containing folder and, when that listing comes back
//! empty, probes the raw path to tell an empty folder from a single file.
//! Listing failures fall back to the folders the session is permitted to see.

use chrono::Utc;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::errors::{ClientError, ClientResult, ListingError, ListingResult};
use crate::models::navigation::{BrowseMode, NavigationState, RewindState, SortSpec};
use crate::models::object::{ListObjectsResponse, ObjectEntry};
use crate::models::session::AllowedResource;
use crate::paths::{
    decode_path, encode_path, file_name, is_folder_path, parent_folder, with_trailing_separator,
};
use crate::services::api_client::ObjectSource;
use crate::services::permissions::permitted_entries;

/// Where the current entries came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingOrigin {
    Backend,
    /// The listing was denied; entries are the permitted sub-folders.
    PermissionFallback,
}

/// How the ambiguity probe classified an empty listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeVerdict {
    Folder,
    File(String),
}

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// View changes for presentation code.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum NavigationEvent {
    DetailsOpened { object: String },
    DetailsClosed,
    SelectedObjectChanged { object: Option<String> },
}

pub struct ListingController<S> {
    source: S,
    permissions: Vec<AllowedResource>,
    state: NavigationState,
    events: broadcast::Sender<NavigationEvent>,
}

impl<S: ObjectSource> ListingController<S> {
    pub fn new(source: S) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            source,
            permissions: Vec::new(),
            state: NavigationState::default(),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NavigationEvent> {
        self.events.subscribe()
    }

    /// Switch the browse mode, announcing details open/close and selection changes.
    fn set_mode(&mut self, mode: BrowseMode) {
        let was_listing = self.state.mode == BrowseMode::FolderListing;
        let previous = self.state.mode.selected_object().map(str::to_string);
        self.state.mode = mode;
        let current = self.state.mode.selected_object().map(str::to_string);

        // No subscribers is fine.
        match (&current, was_listing) {
            (Some(object), true) => {
                let _ = self.events.send(NavigationEvent::DetailsOpened {
                    object: object.clone(),
                });
            }
            (None, false) => {
                let _ = self.events.send(NavigationEvent::DetailsClosed);
            }
            _ => {}
        }
        if previous != current {
            let _ = self
                .events
                .send(NavigationEvent::SelectedObjectChanged { object: current });
        }
    }

    pub fn with_permissions(mut self, permissions: Vec<AllowedResource>) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn set_permissions(&mut self, permissions: Vec<AllowedResource>) {
        self.permissions = permissions;
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn state(&self) -> &NavigationState {
        &self.state
    }

    pub fn mode(&self) -> &BrowseMode {
        &self.state.mode
    }

    /// Navigate to a URL-encoded path (empty for the bucket root).
    pub async fn navigate(&mut self, bucket: &str, encoded_path: &str) -> ListingResult<ListingOrigin> {
        let decoded = if encoded_path.is_empty() {
            String::new()
        } else {
            decode_path(encoded_path)
                .ok_or_else(|| ListingError::InvalidPath(encoded_path.to_string()))?
        };
        self.navigate_decoded(bucket, &decoded).await
    }

    /// Navigate to an already decoded path.
    pub async fn navigate_decoded(&mut self, bucket: &str, path: &str) -> ListingResult<ListingOrigin> {
        if self.state.bucket != bucket {
            self.state.bucket = bucket.to_string();
            self.state.selected.clear();
        }
        self.state.internal_path = path.to_string();
        self.state.versions.clear();

        if is_folder_path(path) {
            self.set_mode(BrowseMode::FolderListing);
            self.state.simple_path = path.to_string();
            self.state.loading_versions = false;
        } else {
            self.set_mode(BrowseMode::ObjectDetails {
                object: path.to_string(),
            });
            self.state.loading_versions = true;
            self.state.simple_path = parent_folder(path);
        }

        self.refresh().await
    }

    /// Re-list the current path.
    pub async fn refresh(&mut self) -> ListingResult<ListingOrigin> {
        if self.state.bucket.is_empty() {
            return Err(ListingError::NoBucket);
        }
        self.reset_stale_rewind();

        self.state.loading = true;
        let result = self.resolve().await;
        self.state.loading = false;

        if result.is_ok() && matches!(self.state.mode, BrowseMode::ObjectDetails { .. }) {
            self.load_versions().await;
        }
        result
    }

    async fn resolve(&mut self) -> ListingResult<ListingOrigin> {
        let internal_path = self.state.internal_path.clone();
        let path_prefix = with_trailing_separator(&self.state.simple_path);

        let response = match self.fetch(&path_prefix).await {
            Ok(resp) => resp,
            Err(err) => return self.fallback(err),
        };
        let entries = partition_entries(response, &internal_path, &path_prefix, &self.state.sort);

        if !entries.is_empty() || path_prefix.is_empty() {
            self.state.entries = entries;
            return Ok(ListingOrigin::Backend);
        }

        let probe_path = internal_path.trim_end_matches('/').to_string();
        let probe = self
            .fetch(&probe_path)
            .await
            .map_err(|source| ListingError::Probe {
                bucket: self.state.bucket.clone(),
                path: probe_path.clone(),
                source,
            })?;

        match classify_probe(&path_prefix, &probe) {
            ProbeVerdict::Folder => {
                debug!("`{}` resolved to a folder", path_prefix);
                self.set_mode(BrowseMode::FolderListing);
                self.state.internal_path = path_prefix.clone();
                self.state.simple_path = path_prefix;
                self.state.loading_versions = false;
                self.state.entries = entries;
                Ok(ListingOrigin::Backend)
            }
            ProbeVerdict::File(object) => {
                info!("`{}` resolved to object `{}`", probe_path, object);
                let parent = parent_folder(&object);
                self.set_mode(BrowseMode::ObjectDetails {
                    object: object.clone(),
                });
                self.state.internal_path = object;
                self.state.loading_versions = true;
                self.state.simple_path = parent.clone();

                match self.fetch(&parent).await {
                    Ok(resp) => {
                        self.state.entries = partition_entries(resp, &parent, &parent, &self.state.sort);
                        Ok(ListingOrigin::Backend)
                    }
                    Err(err) => self.fallback(err),
                }
            }
        }
    }

    /// Listing request for `prefix`, honouring rewind and show-deleted.
    async fn fetch(&self, prefix: &str) -> ClientResult<ListObjectsResponse> {
        let bucket = self.state.bucket.as_str();
        let prefix = Some(prefix).filter(|p| !p.is_empty());

        if self.state.rewind.enabled {
            if let Some(date) = self.state.rewind.date {
                return self.source.rewind_objects(bucket, date, prefix).await;
            }
        }
        if self.state.show_deleted {
            return self.source.rewind_objects(bucket, Utc::now(), prefix).await;
        }
        self.source.list_objects(bucket, prefix).await
    }

    fn fallback(&mut self, err: ClientError) -> ListingResult<ListingOrigin> {
        let entries = permitted_entries(&self.state.bucket, &self.state.simple_path, &self.permissions);
        if entries.is_empty() {
            warn!("listing `{}` failed: {}", self.state.bucket, err);
            self.state.entries.clear();
            return Err(ListingError::Fetch {
                bucket: self.state.bucket.clone(),
                source: err,
            });
        }
        debug!(
            "listing denied ({}); showing {} permitted folders",
            err,
            entries.len()
        );
        self.state.entries = entries;
        Ok(ListingOrigin::PermissionFallback)
    }

    /// Drop a rewind configured for a bucket other than the displayed one.
    fn reset_stale_rewind(&mut self) {
        let rewind = &self.state.rewind;
        if rewind.enabled && rewind.bucket != self.state.bucket {
            debug!(
                "resetting rewind configured for `{}` while browsing `{}`",
                rewind.bucket, self.state.bucket
            );
            self.disable_rewind();
        }
    }

    /// Fetch the version list of the open object. Failures only clear the spinner.
    pub async fn load_versions(&mut self) {
        let Some(object) = self.state.mode.selected_object().map(str::to_string) else {
            return;
        };
        self.state.loading_versions = true;
        match self.source.list_versions(&self.state.bucket, &object).await {
            Ok(resp) => {
                self.state.versions = resp
                    .into_entries()
                    .into_iter()
                    .filter(|e| e.name == object)
                    .collect();
            }
            Err(err) => warn!("could not load versions of `{}`: {}", object, err),
        }
        self.state.loading_versions = false;
    }

    /// Switch from object details to the version history of the same object.
    pub async fn open_versions(&mut self) -> ListingResult<()> {
        let object = match &self.state.mode {
            BrowseMode::ObjectDetails { object } | BrowseMode::VersionsBrowsing { object } => {
                object.clone()
            }
            BrowseMode::FolderListing => return Err(ListingError::NoObjectOpen),
        };
        self.set_mode(BrowseMode::VersionsBrowsing { object });
        self.load_versions().await;
        Ok(())
    }

    /// Close the details or versions panel.
    ///
    /// Returns the encoded parent folder the URL should be rewritten to.
    pub fn close_details(&mut self) -> String {
        self.set_mode(BrowseMode::FolderListing);
        self.state.versions.clear();
        self.state.loading_versions = false;
        self.state.internal_path = self.state.simple_path.clone();
        encode_path(&self.state.simple_path)
    }

    /// Enable rewind for `bucket`. Supersedes show-deleted.
    pub fn set_rewind(&mut self, bucket: &str, date: chrono::DateTime<Utc>) {
        self.state.rewind = RewindState {
            enabled: true,
            bucket: bucket.to_string(),
            date: Some(date),
        };
        self.state.show_deleted = false;
    }

    pub fn disable_rewind(&mut self) {
        self.state.rewind = RewindState::default();
    }

    pub fn set_show_deleted(&mut self, show: bool) {
        self.state.show_deleted = show;
    }

    pub fn set_sort(&mut self, sort: SortSpec) {
        self.state.sort = sort;
        let entries = std::mem::take(&mut self.state.entries);
        self.state.entries = order_entries(entries, &sort);
    }

    pub fn set_filter(&mut self, filter: impl Into<String>) {
        self.state.filter = filter.into();
    }

    /// Current entries with the name filter applied.
    pub fn visible_entries(&self) -> Vec<&ObjectEntry> {
        let needle = self.state.filter.to_lowercase();
        self.state
            .entries
            .iter()
            .filter(|e| needle.is_empty() || file_name(&e.name).to_lowercase().contains(&needle))
            .collect()
    }

    pub fn select(&mut self, key: &str) {
        if !self.state.selected.iter().any(|k| k == key) {
            self.state.selected.push(key.to_string());
        }
    }

    pub fn clear_selection(&mut self) {
        self.state.selected.clear();
    }

    /// Selected keys resolved against the current entries.
    pub fn selected_entries(&self) -> Vec<ObjectEntry> {
        self.state
            .selected
            .iter()
            .filter_map(|key| self.state.entries.iter().find(|e| &e.name == key).cloned())
            .collect()
    }
}

/// Folders first, then files, both ordered by `sort`.
///
/// Entries equal to the listed path itself (or its folder marker) are dropped.
fn partition_entries(
    response: ListObjectsResponse,
    internal_path: &str,
    path_prefix: &str,
    sort: &SortSpec,
) -> Vec<ObjectEntry> {
    let entries = response
        .into_entries()
        .into_iter()
        .filter(|e| e.name != internal_path && e.name != path_prefix)
        .collect();
    order_entries(entries, sort)
}

fn order_entries(entries: Vec<ObjectEntry>, sort: &SortSpec) -> Vec<ObjectEntry> {
    let (mut folders, mut files): (Vec<_>, Vec<_>) =
        entries.into_iter().partition(ObjectEntry::is_folder);
    folders.sort_by(|a, b| sort.compare(a, b));
    files.sort_by(|a, b| sort.compare(a, b));
    folders.extend(files);
    folders
}

/// Decide whether an empty listing of `path_prefix` is a folder or a file.
///
/// No `objects` array means a confirmed empty folder. So does an entry named
/// exactly like the prefix without its trailing separator, or a lone
/// folder-shaped entry; with both `foo` and `foo/` present the folder wins.
/// Anything else opens the first file entry.
pub fn classify_probe(path_prefix: &str, probe: &ListObjectsResponse) -> ProbeVerdict {
    let Some(objects) = probe.objects.as_deref() else {
        return ProbeVerdict::Folder;
    };
    let chopped = path_prefix.strip_suffix('/').unwrap_or(path_prefix);

    if objects.iter().any(|o| o.name == chopped) {
        return ProbeVerdict::Folder;
    }
    if let [only] = objects {
        if only.is_folder() {
            return ProbeVerdict::Folder;
        }
    }
    match objects.iter().find(|o| !o.is_folder()) {
        Some(file) => ProbeVerdict::File(file.name.clone()),
        None => ProbeVerdict::Folder,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::navigation::{SortDirection, SortField};
    use chrono::{DateTime, TimeZone};
    use reqwest::StatusCode;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory listing source keyed by `(endpoint, prefix)`.
    #[derive(Default)]
    struct FakeSource {
        listings: HashMap<String, Option<Vec<ObjectEntry>>>,
        versions: Vec<ObjectEntry>,
        denied: bool,
        calls: Mutex<Vec<String>>,
    }

    impl FakeSource {
        fn with(mut self, prefix: &str, names: &[&str]) -> Self {
            let entries = names
                .iter()
                .map(|n| ObjectEntry {
                    name: n.to_string(),
                    size: if n.ends_with('/') { 0 } else { n.len() as i64 },
                    ..ObjectEntry::default()
                })
                .collect();
            self.listings.insert(prefix.to_string(), Some(entries));
            self
        }

        fn without_array(mut self, prefix: &str) -> Self {
            self.listings.insert(prefix.to_string(), None);
            self
        }

        fn respond(&self, kind: &str, prefix: Option<&str>) -> ClientResult<ListObjectsResponse> {
            let prefix = prefix.unwrap_or("");
            self.calls.lock().unwrap().push(format!("{kind}:{prefix}"));
            if self.denied {
                return Err(ClientError::Status {
                    status: StatusCode::FORBIDDEN,
                    message: "Access Denied.".into(),
                });
            }
            Ok(ListObjectsResponse {
                objects: self
                    .listings
                    .get(prefix)
                    .cloned()
                    .unwrap_or(Some(Vec::new())),
                total: None,
            })
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl ObjectSource for FakeSource {
        async fn list_objects(
            &self,
            _bucket: &str,
            prefix: Option<&str>,
        ) -> ClientResult<ListObjectsResponse> {
            self.respond("list", prefix)
        }

        async fn rewind_objects(
            &self,
            _bucket: &str,
            _at: DateTime<Utc>,
            prefix: Option<&str>,
        ) -> ClientResult<ListObjectsResponse> {
            self.respond("rewind", prefix)
        }

        async fn list_versions(&self, _bucket: &str, _key: &str) -> ClientResult<ListObjectsResponse> {
            Ok(ListObjectsResponse {
                objects: Some(self.versions.clone()),
                total: None,
            })
        }
    }

    fn names(controller: &ListingController<FakeSource>) -> Vec<String> {
        controller
            .state()
            .entries
            .iter()
            .map(|e| e.name.clone())
            .collect()
    }

    #[tokio::test]
    async fn folders_listed_before_files() {
        let source = FakeSource::default().with(
            "",
            &["zeta.txt", "b/", "alpha.txt", "a/", "middle.bin"],
        );
        let mut controller = ListingController::new(source);
        let origin = controller.navigate("b1", "").await.unwrap();

        assert_eq!(origin, ListingOrigin::Backend);
        assert_eq!(
            names(&controller),
            vec!["a/", "b/", "alpha.txt", "middle.bin", "zeta.txt"]
        );
        assert_eq!(controller.mode(), &BrowseMode::FolderListing);
        assert!(!controller.state().loading);
    }

    #[tokio::test]
    async fn sort_applies_within_groups() {
        let source = FakeSource::default().with("", &["a.txt", "ccc.txt", "x/", "y/"]);
        let mut controller = ListingController::new(source);
        controller.navigate("b1", "").await.unwrap();
        controller.set_sort(SortSpec {
            field: SortField::Size,
            direction: SortDirection::Desc,
        });
        // Folders stay first even when sorting descending.
        assert_eq!(names(&controller), vec!["x/", "y/", "ccc.txt", "a.txt"]);
    }

    #[tokio::test]
    async fn self_reference_is_excluded() {
        let source = FakeSource::default().with("docs/", &["docs/", "docs/a.txt"]);
        let mut controller = ListingController::new(source);
        controller
            .navigate("b1", &encode_path("docs/"))
            .await
            .unwrap();
        assert_eq!(names(&controller), vec!["docs/a.txt"]);
        assert_eq!(controller.state().simple_path, "docs/");
    }

    #[tokio::test]
    async fn object_path_lists_parent_without_itself() {
        let source = FakeSource::default().with("docs/", &["docs/a.txt", "docs/b.txt"]);
        let mut controller = ListingController::new(source);
        controller
            .navigate("b1", &encode_path("docs/a.txt"))
            .await
            .unwrap();

        assert_eq!(
            controller.mode(),
            &BrowseMode::ObjectDetails {
                object: "docs/a.txt".into()
            }
        );
        assert_eq!(controller.state().simple_path, "docs/");
        assert_eq!(names(&controller), vec!["docs/b.txt"]);
        assert!(!controller.state().loading_versions);
        assert_eq!(controller.source().calls(), vec!["list:docs/"]);
    }

    #[tokio::test]
    async fn lone_object_is_confirmed_and_parent_relisted() {
        let source = FakeSource::default()
            .with("docs/", &["docs/a.txt"])
            .with("docs/a.txt", &["docs/a.txt"]);
        let mut controller = ListingController::new(source);
        controller
            .navigate("b1", &encode_path("docs/a.txt"))
            .await
            .unwrap();

        assert_eq!(
            controller.mode(),
            &BrowseMode::ObjectDetails {
                object: "docs/a.txt".into()
            }
        );
        assert_eq!(controller.state().simple_path, "docs/");
        assert_eq!(names(&controller), vec!["docs/a.txt"]);
        assert_eq!(
            controller.source().calls(),
            vec!["list:docs/", "list:docs/a.txt", "list:docs/"]
        );
    }

    #[tokio::test]
    async fn ambiguous_prefix_opens_sibling_file() {
        // Bucket holds `test1.txt` and an empty folder `test/`.
        let source = FakeSource::default()
            .with("test/", &["test/"])
            .with("test", &["test/", "test1.txt"])
            .with("", &["test/", "test1.txt"]);
        let mut controller = ListingController::new(source);
        controller.navigate("b1", &encode_path("test/")).await.unwrap();

        assert_eq!(
            controller.mode(),
            &BrowseMode::ObjectDetails {
                object: "test1.txt".into()
            }
        );
        assert_eq!(controller.state().simple_path, "");
        assert_eq!(names(&controller), vec!["test/", "test1.txt"]);
        assert_eq!(
            controller.source().calls(),
            vec!["list:test/", "list:test", "list:"]
        );
    }

    #[tokio::test]
    async fn exact_name_match_is_folder() {
        let source = FakeSource::default().with("test", &["test", "test1.txt"]);
        let mut controller = ListingController::new(source);
        controller.navigate("b1", &encode_path("test/")).await.unwrap();

        assert_eq!(controller.mode(), &BrowseMode::FolderListing);
        assert_eq!(controller.state().simple_path, "test/");
        assert!(names(&controller).is_empty());
    }

    #[tokio::test]
    async fn single_folder_entry_is_folder() {
        let source = FakeSource::default().with("test", &["test/"]);
        let mut controller = ListingController::new(source);
        controller.navigate("b1", &encode_path("test/")).await.unwrap();
        assert_eq!(controller.mode(), &BrowseMode::FolderListing);
        assert_eq!(controller.state().simple_path, "test/");
    }

    #[tokio::test]
    async fn missing_objects_array_confirms_empty_folder() {
        let source = FakeSource::default().without_array("empty");
        let mut controller = ListingController::new(source);
        controller
            .navigate("b1", &encode_path("empty/"))
            .await
            .unwrap();
        assert_eq!(controller.mode(), &BrowseMode::FolderListing);
        assert!(names(&controller).is_empty());
    }

    fn listing_of(names: &[&str]) -> ListObjectsResponse {
        ListObjectsResponse {
            objects: Some(
                names
                    .iter()
                    .map(|n| ObjectEntry {
                        name: n.to_string(),
                        ..ObjectEntry::default()
                    })
                    .collect(),
            ),
            total: None,
        }
    }

    #[test]
    fn ambiguity_classification_follows_exact_name_rule() {
        assert_eq!(
            classify_probe("test/", &listing_of(&["test/", "test1.txt"])),
            ProbeVerdict::File("test1.txt".into())
        );
        assert_eq!(
            classify_probe("test/", &listing_of(&["test"])),
            ProbeVerdict::Folder
        );
        assert_eq!(
            classify_probe("test/", &listing_of(&["test/"])),
            ProbeVerdict::Folder
        );
        assert_eq!(
            classify_probe("test/", &listing_of(&["test/", "test2/"])),
            ProbeVerdict::Folder
        );
        assert_eq!(
            classify_probe("test/", &ListObjectsResponse::default()),
            ProbeVerdict::Folder
        );
    }

    #[test]
    fn folder_wins_when_file_and_folder_share_name() {
        let probe = listing_of(&["foo/", "foo"]);
        assert_eq!(classify_probe("foo/", &probe), ProbeVerdict::Folder);

        let probe = listing_of(&["foo", "foo.bak"]);
        assert_eq!(classify_probe("foo/", &probe), ProbeVerdict::Folder);
    }

    #[tokio::test]
    async fn details_open_close_and_selection_are_announced() {
        let source = FakeSource::default().with("docs/", &["docs/a.txt", "docs/b.txt"]);
        let mut controller = ListingController::new(source);
        let mut events = controller.subscribe();

        controller
            .navigate("b1", &encode_path("docs/a.txt"))
            .await
            .unwrap();
        controller.open_versions().await.unwrap();
        controller
            .navigate("b1", &encode_path("docs/b.txt"))
            .await
            .unwrap();
        controller.close_details();

        let mut seen = Vec::new();
        while let Ok(event) = events.try_recv() {
            seen.push(event);
        }
        assert_eq!(
            seen,
            vec![
                NavigationEvent::DetailsOpened {
                    object: "docs/a.txt".into()
                },
                NavigationEvent::SelectedObjectChanged {
                    object: Some("docs/a.txt".into())
                },
                NavigationEvent::SelectedObjectChanged {
                    object: Some("docs/b.txt".into())
                },
                NavigationEvent::DetailsClosed,
                NavigationEvent::SelectedObjectChanged { object: None },
            ]
        );
    }

    #[tokio::test]
    async fn denied_listing_uses_permitted_folders() {
        let source = FakeSource {
            denied: true,
            ..FakeSource::default()
        };
        let mut controller = ListingController::new(source).with_permissions(vec![
            AllowedResource {
                resource: "arn:aws:s3:::b1/reports/*".into(),
            },
        ]);
        let origin = controller.navigate("b1", "").await.unwrap();
        assert_eq!(origin, ListingOrigin::PermissionFallback);
        assert_eq!(names(&controller), vec!["reports/"]);
    }

    #[tokio::test]
    async fn denied_listing_without_permissions_is_an_error() {
        let source = FakeSource {
            denied: true,
            ..FakeSource::default()
        };
        let mut controller = ListingController::new(source);
        let err = controller.navigate("b1", "").await.unwrap_err();
        assert!(matches!(err, ListingError::Fetch { .. }));
        assert!(!controller.state().loading);
    }

    #[tokio::test]
    async fn rewind_and_show_deleted_select_endpoint() {
        let source = FakeSource::default().with("", &["a.txt"]);
        let mut controller = ListingController::new(source);
        controller.navigate("b1", "").await.unwrap();

        controller.set_show_deleted(true);
        controller.refresh().await.unwrap();

        let date = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        controller.set_rewind("b1", date);
        assert!(!controller.state().show_deleted);
        controller.refresh().await.unwrap();

        assert_eq!(controller.source().calls(), vec!["list:", "rewind:", "rewind:"]);
        assert!(controller.state().rewind.enabled);
    }

    #[tokio::test]
    async fn rewind_for_other_bucket_is_reset() {
        let source = FakeSource::default().with("", &["a.txt"]);
        let mut controller = ListingController::new(source);
        let date = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        controller.set_rewind("x", date);

        controller.navigate("y", "").await.unwrap();

        assert_eq!(controller.state().rewind, RewindState::default());
        assert_eq!(controller.source().calls(), vec!["list:"]);
    }

    #[tokio::test]
    async fn versions_mode_and_close_details() {
        let mut source = FakeSource::default()
            .with("docs/a.txt", &["docs/a.txt"])
            .with("docs/", &["docs/a.txt"]);
        source.versions = vec![
            ObjectEntry {
                name: "docs/a.txt".into(),
                version_id: Some("v2".into()),
                is_latest: true,
                ..ObjectEntry::default()
            },
            ObjectEntry {
                name: "docs/a.txt".into(),
                version_id: Some("v1".into()),
                ..ObjectEntry::default()
            },
        ];
        let mut controller = ListingController::new(source);
        assert!(matches!(
            controller.open_versions().await,
            Err(ListingError::NoObjectOpen)
        ));

        controller
            .navigate("b1", &encode_path("docs/a.txt"))
            .await
            .unwrap();
        controller.open_versions().await.unwrap();
        assert_eq!(
            controller.mode(),
            &BrowseMode::VersionsBrowsing {
                object: "docs/a.txt".into()
            }
        );
        assert_eq!(controller.state().versions.len(), 2);

        let url = controller.close_details();
        assert_eq!(url, encode_path("docs/"));
        assert_eq!(controller.mode(), &BrowseMode::FolderListing);
        assert!(controller.state().versions.is_empty());
    }

    #[tokio::test]
    async fn filter_and_selection() {
        let source = FakeSource::default().with("", &["Report.pdf", "notes.txt", "reports/"]);
        let mut controller = ListingController::new(source);
        controller.navigate("b1", "").await.unwrap();

        controller.set_filter("REPORT");
        let visible: Vec<_> = controller
            .visible_entries()
            .into_iter()
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(visible, vec!["reports/", "Report.pdf"]);

        controller.select("notes.txt");
        controller.select("notes.txt");
        controller.select("missing.txt");
        assert_eq!(controller.selected_entries().len(), 1);
        controller.clear_selection();
        assert!(controller.state().selected.is_empty());
    }

    #[tokio::test]
    async fn invalid_encoded_path_is_rejected() {
        let mut controller = ListingController::new(FakeSource::default());
        assert!(matches!(
            controller.navigate("b1", "%%%").await,
            Err(ListingError::InvalidPath(_))
        ));
    }
}
