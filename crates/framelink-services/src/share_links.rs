//! Short-link registration and resolution.

use std::sync::Arc;
use std::time::Duration;

use framelink_core::models::PhotoMetadata;
use framelink_core::{short_code, AppError, AppResult, HashParams, ShortCode};
use tracing::{debug, info, warn};

use crate::authorization::{AuthorizationStatus, UploadAuthorization};
use crate::query_cache::QueryCache;
use crate::session::Session;

pub const PERMISSION_MESSAGE: &str = "You do not have permission to create share links";
pub const PHOTO_NOT_FOUND_MESSAGE: &str = "Photo not found";
pub const SHARE_FAILED_MESSAGE: &str = "Failed to create share link. Please try again.";

const CACHE_PREFIX: &str = "shortLink:";

/// Message to show for a failed [`ShareLinkService::create_short_link`].
pub fn share_error_message(err: &AppError) -> &'static str {
    match err {
        AppError::Unauthorized(_) => PERMISSION_MESSAGE,
        AppError::NotFound(_) => PHOTO_NOT_FOUND_MESSAGE,
        _ => SHARE_FAILED_MESSAGE,
    }
}

pub struct ShareLinkService {
    session: Arc<Session>,
    authorization: Arc<UploadAuthorization>,
    cache: QueryCache<Option<PhotoMetadata>>,
    stale_time: Duration,
    public_origin: String,
    param: String,
}

impl ShareLinkService {
    pub fn new(
        session: Arc<Session>,
        authorization: Arc<UploadAuthorization>,
        cache: QueryCache<Option<PhotoMetadata>>,
        stale_time: Duration,
        public_origin: impl Into<String>,
        param: impl Into<String>,
    ) -> Self {
        Self {
            session,
            authorization,
            cache,
            stale_time,
            public_origin: public_origin.into(),
            param: param.into(),
        }
    }

    /// Register a freshly generated code for `photo_id`.
    ///
    /// A denial settled for the active identity is rejected without a remote
    /// call; otherwise the backend decides. `Collision` is returned as-is so the caller can
    /// retry with a new code.
    pub async fn create_short_link(&self, photo_id: &str) -> AppResult<ShortCode> {
        if self.authorization.status() == AuthorizationStatus::Denied {
            debug!(photo_id = %photo_id, "Share link refused: caller cannot upload");
            return Err(AppError::Unauthorized(PERMISSION_MESSAGE.to_string()));
        }

        let backend = self.session.backend()?;
        let code = short_code::generate();

        match backend.add_short_link(photo_id, &code).await {
            Ok(()) => {
                info!(photo_id = %photo_id, short_code = %code, "Share link created");
                self.cache.invalidate(&cache_key(&code));
                Ok(code)
            }
            Err(AppError::Unauthorized(reason)) => {
                debug!(photo_id = %photo_id, reason = %reason, "Backend refused share link");
                Err(AppError::Unauthorized(PERMISSION_MESSAGE.to_string()))
            }
            Err(AppError::NotFound(_)) => {
                Err(AppError::NotFound(PHOTO_NOT_FOUND_MESSAGE.to_string()))
            }
            Err(e) => {
                warn!(photo_id = %photo_id, short_code = %code, error = %e, "Failed to create share link");
                Err(e)
            }
        }
    }

    /// Photo behind `code`, or `None` when the code is unknown, expired or
    /// points at a deleted photo. Only transport failures are errors.
    pub async fn resolve_short_code(&self, code: &ShortCode) -> AppResult<Option<PhotoMetadata>> {
        let state = self.session.current();
        let key = cache_key(code);
        if let Some(photo) = self.cache.get_fresh(&key, state.generation, self.stale_time) {
            debug!(short_code = %code, "Serving short link from cache");
            return Ok(photo);
        }

        let photo = match state.backend()?.get_photo_by_short_code(code).await {
            Ok(photo) => photo,
            Err(AppError::NotFound(_)) => None,
            Err(e) => return Err(e),
        };
        self.cache.insert(key, state.generation, photo.clone());
        Ok(photo)
    }

    /// Photo id behind `code` without fetching the photo record.
    pub async fn resolve_photo_id(&self, code: &ShortCode) -> AppResult<Option<String>> {
        match self.session.backend()?.resolve_short_link(code).await {
            Err(AppError::NotFound(_)) => Ok(None),
            other => other,
        }
    }

    /// Shareable URL of the form `<origin>/#<param>=<code>`.
    pub fn share_url(&self, code: &ShortCode) -> String {
        HashParams::compose_link(&self.public_origin, &self.param, code.as_str())
    }
}

fn cache_key(code: &ShortCode) -> String {
    format!("{}{}", CACHE_PREFIX, code)
}
