//! `GalleryBackend` over HTTP.
//!
//! Endpoints (relative to the API prefix):
//! `GET /photos`, `GET /photos/{id}`, `POST /photos` (multipart),
//! `POST /short-links`, `GET /short-links/{code}`, `GET /short-links/{code}/photo`,
//! `GET /me/can-upload`, `GET /me/role`, `GET /me/is-admin`,
//! `GET|PUT /me/profile`, `GET /stats`.

use async_trait::async_trait;
use bytes::Bytes;
use framelink_core::models::{GalleryStats, NewPhoto, PhotoMetadata, UserProfile, UserRole};
use framelink_core::{AppError, AppResult, GalleryBackend, ProgressReporter, ShortCode};
use futures::stream;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::multipart::{Form, Part};
use reqwest::Body;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::ApiClient;

/// Upload bodies are streamed in chunks of this size so progress can be reported.
const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateShortLinkRequest {
    pub photo_id: String,
    pub short_code: ShortCode,
}

/// Response of `GET /short-links/{code}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ShortLinkTarget {
    pub photo_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CanUploadResponse {
    pub can_upload: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RoleResponse {
    pub role: UserRole,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IsAdminResponse {
    pub is_admin: bool,
}

/// Everything but RFC 3986 unreserved characters is escaped in a path segment.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

fn segment(value: &str) -> String {
    utf8_percent_encode(value, PATH_SEGMENT).to_string()
}

/// Stream `bytes` in chunks, reporting progress as each chunk is handed over.
fn progress_body(bytes: Bytes, progress: ProgressReporter) -> Body {
    let total = bytes.len() as u64;
    let chunks: Vec<Bytes> = (0..bytes.len())
        .step_by(UPLOAD_CHUNK_SIZE)
        .map(|start| bytes.slice(start..(start + UPLOAD_CHUNK_SIZE).min(bytes.len())))
        .collect();

    let mut sent = 0u64;
    let stream = stream::iter(chunks.into_iter().map(move |chunk| {
        sent += chunk.len() as u64;
        progress.report_bytes(sent, total);
        Ok::<Bytes, std::io::Error>(chunk)
    }));
    Body::wrap_stream(stream)
}

#[async_trait]
impl GalleryBackend for ApiClient {
    async fn list_photos(&self) -> AppResult<Vec<PhotoMetadata>> {
        self.get_json("/photos").await
    }

    async fn get_photo(&self, id: &str) -> AppResult<Option<PhotoMetadata>> {
        self.get_optional(&format!("/photos/{}", segment(id))).await
    }

    async fn add_photo(&self, photo: NewPhoto, progress: &ProgressReporter) -> AppResult<()> {
        let length = photo.bytes.len() as u64;
        let file = Part::stream_with_length(progress_body(photo.bytes, progress.clone()), length)
            .file_name(photo.name.clone())
            .mime_str(&photo.content_type)
            .map_err(|e| AppError::InvalidInput(format!("Invalid content type: {}", e)))?;

        let form = Form::new()
            .text("id", photo.id.clone())
            .text("name", photo.name.clone())
            .text("content_type", photo.content_type.clone())
            .text("timestamp", photo.timestamp.to_string())
            .part("file", file);

        self.post_multipart("/photos", form).await?;
        info!(photo_id = %photo.id, bytes = length, "Photo uploaded");
        Ok(())
    }

    async fn add_short_link(&self, photo_id: &str, short_code: &ShortCode) -> AppResult<()> {
        let body = CreateShortLinkRequest {
            photo_id: photo_id.to_string(),
            short_code: short_code.clone(),
        };
        self.post_json("/short-links", &body).await
    }

    async fn get_photo_by_short_code(
        &self,
        short_code: &ShortCode,
    ) -> AppResult<Option<PhotoMetadata>> {
        self.get_optional(&format!("/short-links/{}/photo", short_code))
            .await
    }

    async fn resolve_short_link(&self, short_code: &ShortCode) -> AppResult<Option<String>> {
        let target: Option<ShortLinkTarget> = self
            .get_optional(&format!("/short-links/{}", short_code))
            .await?;
        Ok(target.map(|t| t.photo_id))
    }

    async fn can_upload(&self) -> AppResult<bool> {
        let response: CanUploadResponse = self.get_json("/me/can-upload").await?;
        Ok(response.can_upload)
    }

    async fn get_caller_user_role(&self) -> AppResult<UserRole> {
        let response: RoleResponse = self.get_json("/me/role").await?;
        Ok(response.role)
    }

    async fn is_caller_admin(&self) -> AppResult<bool> {
        let response: IsAdminResponse = self.get_json("/me/is-admin").await?;
        Ok(response.is_admin)
    }

    async fn get_caller_user_profile(&self) -> AppResult<Option<UserProfile>> {
        let profile: Option<Option<UserProfile>> = self.get_optional("/me/profile").await?;
        Ok(profile.flatten())
    }

    async fn save_caller_user_profile(&self, profile: &UserProfile) -> AppResult<()> {
        self.put_json("/me/profile", profile).await
    }

    async fn get_gallery_stats(&self) -> AppResult<GalleryStats> {
        self.get_json("/stats").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_escapes_reserved_characters() {
        assert_eq!(segment("photo-1_a.b~c"), "photo-1_a.b~c");
        assert_eq!(segment("a/b c?d#e"), "a%2Fb%20c%3Fd%23e");
        assert_eq!(segment("été"), "%C3%A9t%C3%A9");
    }
}
