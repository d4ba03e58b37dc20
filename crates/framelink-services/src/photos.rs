//! Photo listing and uploads.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::Utc;
use framelink_core::models::{NewPhoto, PhotoMetadata};
use framelink_core::upload::{generate_photo_id_with, UploadFile};
use framelink_core::validation::validate_image_file;
use framelink_core::{AppError, AppResult, ErrorMetadata, ProgressReporter, UploadProgress};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::query_cache::QueryCache;
use crate::session::Session;

const PHOTOS_KEY: &str = "photos";

#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl From<UploadFile> for UploadRequest {
    fn from(file: UploadFile) -> Self {
        Self {
            name: file.name,
            content_type: file.content_type,
            bytes: file.bytes,
        }
    }
}

/// An upload running in the background.
///
/// The progress receiver always ends in `Completed` or `Failed`.
pub struct UploadHandle {
    photo_id: String,
    progress: watch::Receiver<UploadProgress>,
    task: JoinHandle<AppResult<()>>,
}

impl UploadHandle {
    pub fn photo_id(&self) -> &str {
        &self.photo_id
    }

    pub fn progress(&self) -> watch::Receiver<UploadProgress> {
        self.progress.clone()
    }

    /// Wait for the upload to settle and return the new photo's id.
    pub async fn finish(self) -> AppResult<String> {
        self.task
            .await
            .map_err(|e| AppError::Internal(format!("Upload task failed: {}", e)))??;
        Ok(self.photo_id)
    }
}

pub struct PhotoService {
    session: Arc<Session>,
    cache: QueryCache<Vec<PhotoMetadata>>,
    stale_time: Duration,
    max_upload_bytes: u64,
}

impl PhotoService {
    pub fn new(
        session: Arc<Session>,
        cache: QueryCache<Vec<PhotoMetadata>>,
        stale_time: Duration,
        max_upload_bytes: u64,
    ) -> Self {
        Self {
            session,
            cache,
            stale_time,
            max_upload_bytes,
        }
    }

    /// All photos, newest first.
    pub async fn list_photos(&self) -> AppResult<Vec<PhotoMetadata>> {
        let state = self.session.current();
        if let Some(photos) = self
            .cache
            .get_fresh(PHOTOS_KEY, state.generation, self.stale_time)
        {
            debug!(count = photos.len(), "Serving photo list from cache");
            return Ok(photos);
        }

        let mut photos = state.backend()?.list_photos().await?;
        photos.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        self.cache.insert(PHOTOS_KEY, state.generation, photos.clone());
        Ok(photos)
    }

    pub async fn get_photo(&self, id: &str) -> AppResult<Option<PhotoMetadata>> {
        self.session.backend()?.get_photo(id).await
    }

    /// Validate `request` and start uploading it.
    ///
    /// Rejections (bad type, oversized file, no backend) are returned
    /// directly; everything after that is reported on the handle.
    pub fn upload(&self, request: UploadRequest) -> AppResult<UploadHandle> {
        validate_image_file(
            &request.content_type,
            request.bytes.len() as u64,
            self.max_upload_bytes,
        )?;
        let backend = self.session.backend()?;

        let timestamp = Utc::now().timestamp_millis();
        let photo = NewPhoto {
            id: generate_photo_id_with(timestamp, &mut rand::rng()),
            name: request.name,
            content_type: request.content_type,
            timestamp,
            bytes: request.bytes,
        };
        let photo_id = photo.id.clone();

        let (reporter, progress) = ProgressReporter::channel();
        let cache = self.cache.clone();
        let task = tokio::spawn(async move {
            let id = photo.id.clone();
            let size = photo.bytes.len();
            match backend.add_photo(photo, &reporter).await {
                Ok(()) => {
                    cache.invalidate(PHOTOS_KEY);
                    reporter.complete();
                    info!(photo_id = %id, bytes = size, "Upload completed");
                    Ok(())
                }
                Err(e) => {
                    warn!(photo_id = %id, error = %e, "Upload failed");
                    reporter.fail(e.client_message());
                    Err(e)
                }
            }
        });

        Ok(UploadHandle {
            photo_id,
            progress,
            task,
        })
    }
}
