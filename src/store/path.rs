use std::path::PathBuf;

use crate::error::{Error, Result};

pub const USERS_FILE: &str = "users.json";
pub const GROUPS_FILE: &str = "groups.json";
pub const MEMBERS_FILE: &str = "group_members.json";
pub const FILE_ACCESS_FILE: &str = "fileaccess.json";
pub const SHARES_FILE: &str = "shared_files.json";
pub const BLACKLIST_FILE: &str = "blacklist.json";

const MAX_SEGMENT_LEN: usize = 255;

/// Where collections and per-user/per-group storage live on disk.
#[derive(Debug, Clone)]
pub struct StorageLayout {
    pub data_dir: PathBuf,
    pub storage_dir: PathBuf,
}

impl StorageLayout {
    pub fn new(data_dir: impl Into<PathBuf>, storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            storage_dir: storage_dir.into(),
        }
    }

    #[must_use]
    pub fn data_file(&self, name: &str) -> PathBuf {
        self.data_dir.join(name)
    }

    /// Personal storage root for `username`. Separators and `..` are stripped.
    #[must_use]
    pub fn user_dir(&self, username: &str) -> PathBuf {
        self.storage_dir.join(sanitize_segment(username))
    }

    #[must_use]
    pub fn group_dir(&self, group_id: &str) -> PathBuf {
        self.storage_dir
            .join("groups")
            .join(sanitize_segment(group_id))
    }

    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        std::fs::create_dir_all(&self.storage_dir)?;
        Ok(())
    }
}

fn sanitize_segment(segment: &str) -> String {
    segment.replace("..", "").replace(['/', '\\'], "")
}

/// Normalizes a resource path of the form `owner/dir/file`.
///
/// Empty segments are collapsed and leading/trailing slashes removed.
/// `.` and `..` segments, control characters and over-long segments are rejected.
pub fn normalize_resource_path(path: &str) -> Result<String> {
    let path = path.trim();

    let segments: Vec<&str> = path
        .split(['/', '\\'])
        .filter(|s| !s.is_empty())
        .collect();

    if segments.is_empty() {
        return Err(Error::BadRequest("Path cannot be empty".to_string()));
    }

    for segment in &segments {
        validate_segment(segment)?;
    }

    Ok(segments.join("/"))
}

fn validate_segment(segment: &str) -> Result<()> {
    if segment == "." || segment == ".." {
        return Err(Error::BadRequest(
            "Path traversal is not allowed".to_string(),
        ));
    }

    if segment.len() > MAX_SEGMENT_LEN {
        return Err(Error::BadRequest(
            "Path segment cannot exceed 255 characters".to_string(),
        ));
    }

    const INVALID_CHARS: &[char] = &['\0', '\n', '\r'];
    if segment.chars().any(|c| INVALID_CHARS.contains(&c)) {
        return Err(Error::BadRequest(
            "Path segment contains invalid characters".to_string(),
        ));
    }

    Ok(())
}

/// Returns true if `path` lives in the personal tree of `username`.
#[must_use]
pub fn is_owned_path(path: &str, username: &str) -> bool {
    path.strip_prefix(username)
        .is_some_and(|rest| rest.starts_with('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_basic() {
        assert_eq!(normalize_resource_path("alice/report.pdf").unwrap(), "alice/report.pdf");
        assert_eq!(normalize_resource_path("/alice/report.pdf/").unwrap(), "alice/report.pdf");
    }

    #[test]
    fn test_normalize_collapses_slashes() {
        assert_eq!(
            normalize_resource_path("//alice//docs//a.txt").unwrap(),
            "alice/docs/a.txt"
        );
    }

    #[test]
    fn test_normalize_rejects_traversal() {
        assert!(normalize_resource_path("alice/../bob/secret").is_err());
        assert!(normalize_resource_path("./alice").is_err());
        assert!(normalize_resource_path("alice\\..\\bob").is_err());
    }

    #[test]
    fn test_normalize_empty_error() {
        assert!(normalize_resource_path("").is_err());
        assert!(normalize_resource_path("/").is_err());
    }

    #[test]
    fn test_normalize_keeps_case() {
        assert_eq!(normalize_resource_path("Alice/Report.PDF").unwrap(), "Alice/Report.PDF");
    }

    #[test]
    fn test_user_dir_is_sanitized() {
        let layout = StorageLayout::new("/data", "/storage");
        assert_eq!(layout.user_dir("../etc"), PathBuf::from("/storage/etc"));
        assert_eq!(layout.group_dir("g1"), PathBuf::from("/storage/groups/g1"));
    }

    #[test]
    fn test_is_owned_path() {
        assert!(is_owned_path("alice/report.pdf", "alice"));
        assert!(!is_owned_path("alicex/report.pdf", "alice"));
        assert!(!is_owned_path("alice", "alice"));
    }
}
