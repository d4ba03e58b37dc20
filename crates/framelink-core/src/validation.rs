//! Upload validation

use crate::error::AppError;

/// Content types accepted for upload.
pub const ALLOWED_IMAGE_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/webp",
    "image/gif",
];

/// Default upload limit (10 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Check that a file may be uploaded as a photo.
pub fn validate_image_file(content_type: &str, size: u64, max_bytes: u64) -> Result<(), AppError> {
    if !ALLOWED_IMAGE_TYPES.contains(&content_type.to_lowercase().as_str()) {
        return Err(AppError::InvalidInput(
            "Please select a valid image file (JPEG, PNG, WebP, or GIF)".to_string(),
        ));
    }

    if size > max_bytes {
        return Err(AppError::PayloadTooLarge(format!(
            "Image size must be less than {}MB",
            max_bytes / (1024 * 1024)
        )));
    }

    Ok(())
}
