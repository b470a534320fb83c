//! Endpoints of the console API consumed by the browser.
//!
//! ## Structure
//! - **Bucket-level endpoints**
//!   - `GET  /buckets/{bucket}`: bucket info
//!   - `GET  /buckets/{bucket}/quota`
//!   - `GET  /buckets/{bucket}/versioning`
//!   - `GET  /buckets/{bucket}/object-locking`
//!
//! - **Object-level endpoints**
//!   - `GET  /buckets/{bucket}/objects?prefix=`: list (optionally `with_versions`)
//!   - `GET  /buckets/{bucket}/rewind/{date}?prefix=`: list as of `date`
//!   - `POST /buckets/{bucket}/objects/upload?prefix=`: multipart upload
//!   - `GET  /buckets/{bucket}/objects/download?prefix=`: streamed download
//!
//! - `GET /session`: allowed resources for the permission fallback
//!
//! Prefixes are base64-encoded and then URL-encoded.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::paths::encode_path;

/// Builds absolute endpoint URLs from the API base URL.
#[derive(Clone, Debug)]
pub struct ApiRoutes {
    base_url: String,
}

impl ApiRoutes {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn bucket(&self, bucket: &str) -> String {
        format!("{}/buckets/{}", self.base_url, urlencoding::encode(bucket))
    }

    pub fn bucket_info(&self, bucket: &str) -> String {
        self.bucket(bucket)
    }

    pub fn quota(&self, bucket: &str) -> String {
        format!("{}/quota", self.bucket(bucket))
    }

    pub fn versioning(&self, bucket: &str) -> String {
        format!("{}/versioning", self.bucket(bucket))
    }

    pub fn object_locking(&self, bucket: &str) -> String {
        format!("{}/object-locking", self.bucket(bucket))
    }

    pub fn list_objects(&self, bucket: &str, prefix: Option<&str>, with_versions: bool) -> String {
        let mut url = format!("{}/objects", self.bucket(bucket));
        let mut query = Vec::new();
        if let Some(prefix) = prefix.filter(|p| !p.is_empty()) {
            query.push(prefix_param(prefix));
        }
        if with_versions {
            query.push("with_versions=true".to_string());
        }
        push_query(&mut url, &query);
        url
    }

    pub fn rewind(&self, bucket: &str, at: DateTime<Utc>, prefix: Option<&str>) -> String {
        let date = at.to_rfc3339_opts(SecondsFormat::Secs, true);
        let mut url = format!("{}/rewind/{}", self.bucket(bucket), urlencoding::encode(&date));
        if let Some(prefix) = prefix.filter(|p| !p.is_empty()) {
            push_query(&mut url, &[prefix_param(prefix)]);
        }
        url
    }

    /// `folder` is the destination folder of the uploaded file.
    pub fn upload(&self, bucket: &str, folder: &str) -> String {
        let mut url = format!("{}/objects/upload", self.bucket(bucket));
        push_query(&mut url, &[prefix_param(folder)]);
        url
    }

    pub fn download(&self, bucket: &str, key: &str, version_id: Option<&str>) -> String {
        let mut url = format!("{}/objects/download", self.bucket(bucket));
        let mut query = vec![prefix_param(key)];
        if let Some(version) = version_id {
            query.push(format!("version_id={}", urlencoding::encode(version)));
        }
        push_query(&mut url, &query);
        url
    }

    pub fn session(&self) -> String {
        format!("{}/session", self.base_url)
    }
}

fn prefix_param(prefix: &str) -> String {
    format!("prefix={}", urlencoding::encode(&encode_path(prefix)))
}

fn push_query(url: &mut String, params: &[String]) {
    if !params.is_empty() {
        url.push('?');
        url.push_str(&params.join("&"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_urls_encode_prefix() {
        let routes = ApiRoutes::new("http://console/api/v1/");
        assert_eq!(
            routes.list_objects("b1", None, false),
            "http://console/api/v1/buckets/b1/objects"
        );
        assert_eq!(
            routes.list_objects("b1", Some("test/"), false),
            "http://console/api/v1/buckets/b1/objects?prefix=dGVzdC8%3D"
        );
        assert_eq!(
            routes.list_objects("b1", Some("a.txt"), true),
            "http://console/api/v1/buckets/b1/objects?prefix=YS50eHQ%3D&with_versions=true"
        );
    }

    #[test]
    fn rewind_url_carries_timestamp() {
        let routes = ApiRoutes::new("http://console/api/v1");
        let at = DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(
            routes.rewind("b1", at, None),
            "http://console/api/v1/buckets/b1/rewind/2024-05-01T10%3A00%3A00Z"
        );
    }

    #[test]
    fn download_url_with_version() {
        let routes = ApiRoutes::new("http://console/api/v1");
        assert_eq!(
            routes.download("b1", "a.txt", Some("v 1")),
            "http://console/api/v1/buckets/b1/objects/download?prefix=YS50eHQ%3D&version_id=v%201"
        );
    }
}
