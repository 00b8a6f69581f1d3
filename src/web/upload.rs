//! Upload handling: file name sanitization and saving.

use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::{KagamiError, Result};

/// Sanitize an uploaded file name for safe use on the local file system.
///
/// Strips any directory components, replaces characters outside
/// `[A-Za-z0-9._-]` with `_`, and trims leading dots so the result can never
/// escape the upload directory or hide as a dotfile. An empty result falls
/// back to `"upload"`.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(name);

    let sanitized: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let sanitized = sanitized.trim_start_matches('.').to_string();
    if sanitized.is_empty() {
        "upload".to_string()
    } else {
        sanitized
    }
}

/// Save uploaded bytes under `upload_dir` with a sanitized, UUID-prefixed
/// file name to avoid collisions. Returns the path of the saved file.
pub fn save_upload(upload_dir: &Path, original_name: &str, bytes: &[u8]) -> Result<PathBuf> {
    if bytes.is_empty() {
        return Err(KagamiError::invalid_argument("uploaded file is empty"));
    }

    std::fs::create_dir_all(upload_dir)
        .map_err(|e| KagamiError::storage(format!("Failed to create upload directory: {e}")))?;

    let unique_name = format!("{}_{}", Uuid::new_v4(), sanitize_file_name(original_name));
    let path = upload_dir.join(unique_name);
    std::fs::write(&path, bytes)?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_plain_name() {
        assert_eq!(sanitize_file_name("photo.jpg"), "photo.jpg");
        assert_eq!(sanitize_file_name("my-photo_1.png"), "my-photo_1.png");
    }

    #[test]
    fn test_sanitize_strips_directories() {
        assert_eq!(sanitize_file_name("../../etc/passwd.png"), "passwd.png");
        assert_eq!(sanitize_file_name("C:\\temp\\shot.jpg"), "shot.jpg");
    }

    #[test]
    fn test_sanitize_replaces_special_characters() {
        assert_eq!(sanitize_file_name("my photo (1).jpg"), "my_photo__1_.jpg");
    }

    #[test]
    fn test_sanitize_leading_dots_and_empty() {
        assert_eq!(sanitize_file_name("...hidden.png"), "hidden.png");
        assert_eq!(sanitize_file_name("///"), "upload");
        assert_eq!(sanitize_file_name(""), "upload");
    }

    #[test]
    fn test_save_upload_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_upload(dir.path(), "query.png", b"not-really-a-png").unwrap();

        assert!(path.exists());
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .ends_with("_query.png"));
        assert_eq!(std::fs::read(&path).unwrap(), b"not-really-a-png");
    }

    #[test]
    fn test_save_upload_rejects_empty_bytes() {
        let dir = tempfile::tempdir().unwrap();
        assert!(save_upload(dir.path(), "query.png", b"").is_err());
    }

    #[test]
    fn test_save_upload_unique_names() {
        let dir = tempfile::tempdir().unwrap();
        let a = save_upload(dir.path(), "query.png", b"a").unwrap();
        let b = save_upload(dir.path(), "query.png", b"b").unwrap();
        assert_ne!(a, b);
    }
}
