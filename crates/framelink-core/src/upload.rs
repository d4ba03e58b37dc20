//! File-to-bytes conversion and photo id generation for uploads.

use std::path::{Component, Path};

use bytes::Bytes;
use chrono::Utc;
use rand::Rng;

use crate::error::AppError;

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const PHOTO_ID_SUFFIX_LEN: usize = 7;

/// A local file read into memory, ready for upload.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

/// Read `path` into memory. The display name is the file name and the content
/// type is derived from the extension.
pub fn read_upload_file(path: &Path) -> Result<UploadFile, AppError> {
    if path.components().any(|c| c == Component::ParentDir) {
        return Err(AppError::InvalidInput(format!(
            "Invalid path: {}",
            path.display()
        )));
    }

    let bytes = std::fs::read(path).map_err(|e| {
        AppError::InvalidInput(format!("Failed to read file {}: {}", path.display(), e))
    })?;

    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("photo")
        .to_string();

    Ok(UploadFile {
        content_type: content_type_for_path(path).to_string(),
        name,
        bytes: Bytes::from(bytes),
    })
}

/// Image content type for a file extension; `application/octet-stream` when unknown.
pub fn content_type_for_path(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());
    match extension.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}

/// Photo id of the form `{now_ms}-{7 random base-36 chars}`.
pub fn generate_photo_id() -> String {
    generate_photo_id_with(Utc::now().timestamp_millis(), &mut rand::rng())
}

pub fn generate_photo_id_with<R: Rng + ?Sized>(now_ms: i64, rng: &mut R) -> String {
    let suffix: String = (0..PHOTO_ID_SUFFIX_LEN)
        .map(|_| char::from(BASE36[rng.random_range(0..BASE36.len())]))
        .collect();
    format!("{}-{}", now_ms, suffix)
}
