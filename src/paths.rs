//! Path helpers for object keys and URL-safe path encoding.
//!
//! Object keys travel through URLs and query strings base64-encoded
//! (standard alphabet over the UTF-8 bytes), matching the console API.

use base64::{Engine as _, engine::general_purpose};

pub const SEPARATOR: char = '/';

/// Encode a decoded object path for use in a URL or `prefix=` query value.
pub fn encode_path(path: &str) -> String {
    general_purpose::STANDARD.encode(path.as_bytes())
}

/// Decode a path produced by [`encode_path`]. Returns `None` for malformed input.
pub fn decode_path(encoded: &str) -> Option<String> {
    general_purpose::STANDARD
        .decode(encoded)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
}

pub fn is_folder_path(path: &str) -> bool {
    path.is_empty() || path.ends_with(SEPARATOR)
}

/// `path` with a trailing separator, or empty for the root.
pub fn with_trailing_separator(path: &str) -> String {
    if path.is_empty() || path.ends_with(SEPARATOR) {
        path.to_string()
    } else {
        format!("{path}{SEPARATOR}")
    }
}

/// Containing folder of an object key, with trailing separator; empty at root.
///
/// `a/b/c.txt` -> `a/b/`, `c.txt` -> ``, `a/b/` -> `a/`.
pub fn parent_folder(path: &str) -> String {
    let trimmed = path.strip_suffix(SEPARATOR).unwrap_or(path);
    match trimmed.rfind(SEPARATOR) {
        Some(pos) => trimmed[..=pos].to_string(),
        None => String::new(),
    }
}

/// Last segment of a key, without a trailing separator.
pub fn file_name(path: &str) -> &str {
    let trimmed = path.strip_suffix(SEPARATOR).unwrap_or(path);
    trimmed.rsplit(SEPARATOR).next().unwrap_or(trimmed)
}

/// Folder an uploaded file lands in.
///
/// `relative_path` is whatever the file source reported: a drag-and-drop
/// relative path (`photos/2024/a.jpg`, possibly with a leading separator or
/// Windows separators) or just the file name for a picked file. The file
/// name is stripped and the remaining directory appended to `current_folder`.
pub fn upload_folder(current_folder: &str, relative_path: &str) -> String {
    let normalized = relative_path.replace('\\', "/");
    let relative_dir = match normalized.rfind(SEPARATOR) {
        Some(pos) => &normalized[..=pos],
        None => "",
    };
    let relative_dir = relative_dir.trim_start_matches(SEPARATOR);

    let mut folder = with_trailing_separator(current_folder);
    folder.push_str(relative_dir);
    folder
}
