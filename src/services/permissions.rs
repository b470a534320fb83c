//! Folder entries a restricted session is allowed to see.
//!
//! When a listing is denied, the browser shows the sub-folders of the current
//! path that the session's policy grants instead of an error.

use std::collections::BTreeSet;

use crate::models::object::ObjectEntry;
use crate::models::session::AllowedResource;
use crate::paths::{SEPARATOR, with_trailing_separator};

const S3_ARN_PREFIX: &str = "arn:aws:s3:::";

/// Folder entries under `current_path` granted by `resources`.
///
/// A resource `arn:aws:s3:::bucket/a/b/*` listed from `a/` yields `a/b/`.
/// Resources for other buckets, or ones that do not extend below the current
/// path, contribute nothing. The result is sorted and deduplicated.
pub fn permitted_entries(
    bucket: &str,
    current_path: &str,
    resources: &[AllowedResource],
) -> Vec<ObjectEntry> {
    let current = with_trailing_separator(current_path);
    let mut folders = BTreeSet::new();

    for resource in resources {
        let Some(path) = resource_path(&resource.resource, bucket) else {
            continue;
        };
        let Some(rest) = path.strip_prefix(current.as_str()) else {
            continue;
        };
        if let Some(pos) = rest.find(SEPARATOR) {
            let segment = &rest[..pos];
            if !segment.is_empty() && !segment.contains('*') {
                folders.insert(format!("{current}{segment}{SEPARATOR}"));
            }
        }
    }

    folders.into_iter().map(ObjectEntry::folder).collect()
}

/// Object path of an ARN if it targets `bucket` (or every bucket).
fn resource_path<'a>(resource: &'a str, bucket: &str) -> Option<&'a str> {
    let rest = resource.strip_prefix(S3_ARN_PREFIX)?;
    let (res_bucket, path) = match rest.find(SEPARATOR) {
        Some(pos) => (&rest[..pos], &rest[pos + 1..]),
        None => (rest, ""),
    };
    if res_bucket == bucket || res_bucket == "*" {
        Some(path.trim_end_matches('*'))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resources(list: &[&str]) -> Vec<AllowedResource> {
        list.iter()
            .map(|r| AllowedResource {
                resource: r.to_string(),
            })
            .collect()
    }

    #[test]
    fn root_listing_yields_top_level_folders() {
        let allowed = resources(&[
            "arn:aws:s3:::b1/reports/*",
            "arn:aws:s3:::b1/reports/2024/*",
            "arn:aws:s3:::b1/shared/team/*",
            "arn:aws:s3:::other/secret/*",
        ]);
        let names: Vec<_> = permitted_entries("b1", "", &allowed)
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["reports/", "shared/"]);
    }

    #[test]
    fn nested_listing_yields_next_segment() {
        let allowed = resources(&["arn:aws:s3:::b1/shared/team/docs/*"]);
        let entries = permitted_entries("b1", "shared", &allowed);
        assert_eq!(entries, vec![ObjectEntry::folder("shared/team/")]);
    }

    #[test]
    fn bucket_wide_grant_adds_nothing() {
        let allowed = resources(&["arn:aws:s3:::b1/*", "arn:aws:s3:::b1"]);
        assert!(permitted_entries("b1", "", &allowed).is_empty());
    }

    #[test]
    fn wildcard_bucket_matches() {
        let allowed = resources(&["arn:aws:s3:::*/public/*"]);
        assert_eq!(
            permitted_entries("anything", "", &allowed),
            vec![ObjectEntry::folder("public/")]
        );
    }
}
