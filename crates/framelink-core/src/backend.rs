//! Remote gallery backend interface.
//!
//! The backend is an opaque collaborator; only its call contract matters
//! here. `framelink-api-client` provides the HTTP implementation and tests use
//! in-memory ones.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AppResult;
use crate::models::{GalleryStats, Identity, NewPhoto, PhotoMetadata, UserProfile, UserRole};
use crate::progress::ProgressReporter;
use crate::short_code::ShortCode;

/// Operations offered by the gallery backend for one calling identity.
///
/// Expected absence is modelled as `Ok(None)`. Errors use the `AppError`
/// taxonomy: `Unauthorized`, `NotFound`, `Collision` for rejected actions and
/// `Unavailable` when the service cannot be reached.
#[async_trait]
pub trait GalleryBackend: Send + Sync {
    async fn list_photos(&self) -> AppResult<Vec<PhotoMetadata>>;

    async fn get_photo(&self, id: &str) -> AppResult<Option<PhotoMetadata>>;

    /// Store a new photo, reporting transfer progress on `progress`.
    async fn add_photo(&self, photo: NewPhoto, progress: &ProgressReporter) -> AppResult<()>;

    /// Register `short_code` for `photo_id`. Requires upload permission.
    async fn add_short_link(&self, photo_id: &str, short_code: &ShortCode) -> AppResult<()>;

    /// Public lookup of the photo behind a short code.
    async fn get_photo_by_short_code(
        &self,
        short_code: &ShortCode,
    ) -> AppResult<Option<PhotoMetadata>>;

    /// Public lookup of the photo id behind a short code.
    async fn resolve_short_link(&self, short_code: &ShortCode) -> AppResult<Option<String>>;

    async fn can_upload(&self) -> AppResult<bool>;

    async fn get_caller_user_role(&self) -> AppResult<UserRole>;

    async fn is_caller_admin(&self) -> AppResult<bool>;

    async fn get_caller_user_profile(&self) -> AppResult<Option<UserProfile>>;

    async fn save_caller_user_profile(&self, profile: &UserProfile) -> AppResult<()>;

    async fn get_gallery_stats(&self) -> AppResult<GalleryStats>;
}

/// Opens a backend bound to an identity.
pub trait BackendConnector: Send + Sync {
    fn connect(&self, identity: &Identity) -> AppResult<Arc<dyn GalleryBackend>>;
}
