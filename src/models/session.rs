//! Session data returned by `GET /session`.

use serde::{Deserialize, Serialize};

/// One statement resource the session is allowed to act on.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct AllowedResource {
    /// Resource ARN, e.g. `arn:aws:s3:::bucket/reports/*`.
    pub resource: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    #[serde(default)]
    pub allow_resources: Vec<AllowedResource>,
}
