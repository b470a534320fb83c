//! Bucket metadata shown alongside a listing.

use serde::{Deserialize, Serialize};

/// Result of `GET /buckets/{bucket}`.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct BucketInfo {
    pub name: String,

    #[serde(default)]
    pub size: Option<i64>,

    #[serde(default)]
    pub objects: Option<i64>,

    /// Access policy label (e.g. `PRIVATE`, `PUBLIC`, `CUSTOM`).
    #[serde(default)]
    pub access: Option<String>,

    #[serde(default)]
    pub creation_date: Option<String>,
}

/// Result of `GET /buckets/{bucket}/quota`.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct BucketQuota {
    #[serde(default)]
    pub quota: Option<i64>,

    #[serde(default, rename = "type")]
    pub quota_type: Option<String>,
}

/// Result of `GET /buckets/{bucket}/versioning`.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct BucketVersioning {
    /// `Enabled`, `Suspended`, or empty when never configured.
    #[serde(default)]
    pub status: Option<String>,
}

/// Result of `GET /buckets/{bucket}/object-locking`.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ObjectLockingStatus {
    #[serde(default)]
    pub object_locking_enabled: bool,
}

/// Everything the browser shows about a bucket next to its listing.
#[derive(Serialize, Clone, Debug)]
pub struct BucketSummary {
    pub info: BucketInfo,
    /// `None` when the caller may not read the quota.
    pub quota: Option<BucketQuota>,
    pub versioning: Option<BucketVersioning>,
    pub locking: Option<ObjectLockingStatus>,
}
