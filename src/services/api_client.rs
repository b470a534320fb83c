//! HTTP client for the console REST API.
//!
//! [`ConsoleClient`] wraps `reqwest::Client` and exposes typed methods for
//! each endpoint the browser consumes. The listing controller only needs the
//! [`ObjectSource`] subset, which lets it run against an in-memory source in
//! tests.
//!
//! ## Error handling
//!
//! Non-2xx responses are parsed for a `detailedMessage` (or `message`) field
//! in the JSON body. If that fails, a generic message carrying the status
//! code is used.

use std::future::Future;

use chrono::{DateTime, Utc};
use reqwest::{Response, StatusCode, header};
use serde::{Deserialize, de::DeserializeOwned};
use tracing::debug;

use crate::errors::{ClientError, ClientResult};
use crate::models::bucket::{
    BucketInfo, BucketQuota, BucketSummary, BucketVersioning, ObjectLockingStatus,
};
use crate::models::object::ListObjectsResponse;
use crate::models::session::SessionInfo;
use crate::routes::routes::ApiRoutes;

/// Listing operations the controller depends on.
pub trait ObjectSource {
    /// Objects and folders directly under `prefix`.
    fn list_objects(
        &self,
        bucket: &str,
        prefix: Option<&str>,
    ) -> impl Future<Output = ClientResult<ListObjectsResponse>> + Send;

    /// Listing as of `at`, including delete markers.
    fn rewind_objects(
        &self,
        bucket: &str,
        at: DateTime<Utc>,
        prefix: Option<&str>,
    ) -> impl Future<Output = ClientResult<ListObjectsResponse>> + Send;

    /// All versions of one object key.
    fn list_versions(
        &self,
        bucket: &str,
        key: &str,
    ) -> impl Future<Output = ClientResult<ListObjectsResponse>> + Send;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiErrorBody {
    detailed_message: Option<String>,
    message: Option<String>,
}

/// HTTP client for one console API endpoint.
#[derive(Clone)]
pub struct ConsoleClient {
    http: reqwest::Client,
    routes: ApiRoutes,
    token: Option<String>,
}

impl ConsoleClient {
    pub fn new(base_url: &str, token: Option<String>) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(ClientError::Request)?;
        Ok(Self {
            http,
            routes: ApiRoutes::new(base_url),
            token,
        })
    }

    pub fn routes(&self) -> &ApiRoutes {
        &self.routes
    }

    /// Request builder with the session token attached.
    pub(crate) fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.token {
            Some(token) => builder.header(header::COOKIE, format!("token={token}")),
            None => builder,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> ClientResult<T> {
        debug!("GET {}", url);
        let resp = self
            .request(reqwest::Method::GET, url)
            .send()
            .await
            .map_err(ClientError::Request)?;
        let resp = Self::check_status(resp).await?;
        resp.json::<T>()
            .await
            .map_err(|err| ClientError::Decode(err.to_string()))
    }

    /// Pass 2xx responses through; turn anything else into [`ClientError::Status`].
    pub(crate) async fn check_status(resp: Response) -> ClientResult<Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(ClientError::Status {
            status,
            message: error_message(status, &body),
        })
    }

    pub async fn bucket_info(&self, bucket: &str) -> ClientResult<BucketInfo> {
        self.get_json(&self.routes.bucket_info(bucket)).await
    }

    pub async fn bucket_quota(&self, bucket: &str) -> ClientResult<BucketQuota> {
        self.get_json(&self.routes.quota(bucket)).await
    }

    pub async fn bucket_versioning(&self, bucket: &str) -> ClientResult<BucketVersioning> {
        self.get_json(&self.routes.versioning(bucket)).await
    }

    pub async fn object_locking(&self, bucket: &str) -> ClientResult<ObjectLockingStatus> {
        self.get_json(&self.routes.object_locking(bucket)).await
    }

    /// Bucket info plus the optional metadata panels.
    ///
    /// Only the info call is required; the others are commonly denied to
    /// restricted users and are reported as `None` in that case.
    pub async fn bucket_summary(&self, bucket: &str) -> ClientResult<BucketSummary> {
        let (info, quota, versioning, locking) = tokio::join!(
            self.bucket_info(bucket),
            self.bucket_quota(bucket),
            self.bucket_versioning(bucket),
            self.object_locking(bucket),
        );
        Ok(BucketSummary {
            info: info?,
            quota: quota.map_err(|e| debug!("quota unavailable: {}", e)).ok(),
            versioning: versioning
                .map_err(|e| debug!("versioning unavailable: {}", e))
                .ok(),
            locking: locking
                .map_err(|e| debug!("object locking unavailable: {}", e))
                .ok(),
        })
    }

    pub async fn session(&self) -> ClientResult<SessionInfo> {
        self.get_json(&self.routes.session()).await
    }
}

impl ObjectSource for ConsoleClient {
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: Option<&str>,
    ) -> ClientResult<ListObjectsResponse> {
        self.get_json(&self.routes.list_objects(bucket, prefix, false))
            .await
    }

    async fn rewind_objects(
        &self,
        bucket: &str,
        at: DateTime<Utc>,
        prefix: Option<&str>,
    ) -> ClientResult<ListObjectsResponse> {
        self.get_json(&self.routes.rewind(bucket, at, prefix)).await
    }

    async fn list_versions(&self, bucket: &str, key: &str) -> ClientResult<ListObjectsResponse> {
        self.get_json(&self.routes.list_objects(bucket, Some(key), true))
            .await
    }
}

/// Human-readable message for a failed response.
///
/// Known statuses map to fixed messages; otherwise the JSON error body is
/// consulted before falling back to the status code.
pub fn error_message(status: StatusCode, body: &str) -> String {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        return "Error - File size too large".to_string();
    }
    if let Ok(parsed) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(msg) = parsed
            .detailed_message
            .filter(|m| !m.is_empty())
            .or(parsed.message.filter(|m| !m.is_empty()))
        {
            return msg;
        }
    }
    format!("Unexpected response, status code: {}", status.as_u16())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_too_large_has_friendly_message() {
        let msg = error_message(StatusCode::PAYLOAD_TOO_LARGE, r#"{"detailedMessage":"x"}"#);
        assert_eq!(msg, "Error - File size too large");
    }

    #[test]
    fn detailed_message_preferred_over_message() {
        let body = r#"{"message":"short","detailedMessage":"bucket quota exceeded"}"#;
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, body),
            "bucket quota exceeded"
        );
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, r#"{"message":"short"}"#),
            "short"
        );
    }

    #[test]
    fn unparseable_body_falls_back_to_status() {
        assert_eq!(
            error_message(StatusCode::BAD_GATEWAY, "<html>"),
            "Unexpected response, status code: 502"
        );
    }
}
