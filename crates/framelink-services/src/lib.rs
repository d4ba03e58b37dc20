//! Framelink Services
//!
//! Client-side orchestration on top of a [`GalleryBackend`]: identity
//! context, query cache, upload authorization, photos, share links and the
//! short-link landing flow.

pub mod authorization;
pub mod landing;
pub mod photos;
pub mod query_cache;
pub mod session;
pub mod share_links;

#[cfg(test)]
pub mod test_helpers;

pub use authorization::{AuthorizationStatus, UploadAuthorization};
pub use landing::{LandingState, PhotoPresenter, ShortLinkLanding};
pub use photos::{PhotoService, UploadHandle, UploadRequest};
pub use query_cache::QueryCache;
pub use session::{Session, SessionState};
pub use share_links::{share_error_message, ShareLinkService};

use std::sync::Arc;

use framelink_core::{BackendConnector, ClientConfig, GalleryBackend, HashParams, UrlCell};
use tokio::task::JoinHandle;

/// Every service wired to one session.
pub struct Gallery {
    pub session: Arc<Session>,
    pub authorization: Arc<UploadAuthorization>,
    pub photos: Arc<PhotoService>,
    pub share_links: Arc<ShareLinkService>,
    short_link_param: String,
    /// Re-checks upload authorization on login/logout
    identity_watcher: Option<JoinHandle<()>>,
}

impl Gallery {
    pub fn new(config: &ClientConfig, connector: Arc<dyn BackendConnector>) -> Self {
        let session = Arc::new(Session::new(connector, config.identity()));
        let authorization = Arc::new(UploadAuthorization::new(
            session.clone(),
            QueryCache::new(),
            config.authorization_stale_time(),
        ));
        let photos = Arc::new(PhotoService::new(
            session.clone(),
            QueryCache::new(),
            config.photos_stale_time(),
            config.max_upload_bytes,
        ));
        let share_links = Arc::new(ShareLinkService::new(
            session.clone(),
            authorization.clone(),
            QueryCache::new(),
            config.short_link_stale_time(),
            config.public_origin.clone(),
            config.short_link_param.clone(),
        ));

        // Outside a runtime the status is still generation-checked, only not
        // re-evaluated eagerly.
        let identity_watcher = tokio::runtime::Handle::try_current()
            .is_ok()
            .then(|| authorization.watch_identity());

        Self {
            session,
            authorization,
            photos,
            share_links,
            short_link_param: config.short_link_param.clone(),
            identity_watcher,
        }
    }

    /// Backend for calls not wrapped by a service (role, profile, stats).
    pub fn backend(&self) -> framelink_core::AppResult<Arc<dyn GalleryBackend>> {
        self.session.backend()
    }

    /// Landing flow reading the short-link parameter from `url`.
    pub fn landing(
        &self,
        url: Arc<dyn UrlCell>,
        presenter: Arc<dyn PhotoPresenter>,
    ) -> ShortLinkLanding {
        ShortLinkLanding::new(
            HashParams::new(url),
            self.short_link_param.clone(),
            self.share_links.clone(),
            presenter,
        )
    }
}

impl Drop for Gallery {
    fn drop(&mut self) {
        if let Some(watcher) = self.identity_watcher.take() {
            watcher.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{photo, test_config, MockBackend, MockConnector, RecordingPresenter};
    use framelink_core::models::Identity;
    use framelink_core::MemoryUrl;

    #[tokio::test]
    async fn share_then_land_round_trip() {
        let backend = MockBackend::new().with_photo(photo("photo-1", 1_000));
        let connector = Arc::new(MockConnector::new(backend));
        let mut config = test_config();
        config.api_token = Some("admin".to_string());
        let gallery = Gallery::new(&config, connector.clone());
        assert!(!gallery.session.identity().is_anonymous());

        let code = gallery.share_links.create_short_link("photo-1").await.unwrap();
        let url = gallery.share_links.share_url(&code);
        assert!(url.starts_with("https://gallery.example.com/#s="));

        gallery.session.logout();
        let cell = Arc::new(MemoryUrl::new(&url));
        let presenter = RecordingPresenter::new();
        let landing = gallery.landing(cell.clone(), presenter.clone());

        assert!(matches!(landing.run().await, LandingState::Resolved(_)));
        assert_eq!(presenter.opened_ids(), vec!["photo-1"]);
        assert_eq!(cell.href(), "https://gallery.example.com/");
        assert_eq!(connector.identities().last(), Some(&Identity::Anonymous));
    }

    #[tokio::test]
    async fn sign_in_after_denial_can_share() {
        let backend = MockBackend::new().with_photo(photo("photo-1", 1_000));
        let connector = Arc::new(MockConnector::new(backend));
        let gallery = Gallery::new(&test_config(), connector.clone());

        assert!(!gallery.authorization.can_upload().await);
        let err = gallery.share_links.create_short_link("photo-1").await.unwrap_err();
        assert_eq!(share_error_message(&err), share_links::PERMISSION_MESSAGE);

        gallery.session.login(Identity::Bearer("admin".into()));
        assert_ne!(gallery.authorization.status(), AuthorizationStatus::Denied);
        let code = gallery.share_links.create_short_link("photo-1").await.unwrap();
        assert_eq!(
            connector.backend().link_target(code.as_str()).as_deref(),
            Some("photo-1")
        );
        assert_eq!(connector.backend().calls("add_short_link"), 1);
    }

    #[tokio::test]
    async fn watcher_follows_identity_changes() {
        let connector = Arc::new(MockConnector::new(MockBackend::new()));
        let mut config = test_config();
        config.api_token = Some("admin".to_string());
        let gallery = Gallery::new(&config, connector.clone());
        assert!(gallery.authorization.can_upload().await);

        let mut rx = gallery.authorization.subscribe();
        rx.mark_unchanged();
        gallery.session.logout();
        rx.wait_for(|status| *status == AuthorizationStatus::Denied)
            .await
            .unwrap();
        assert!(!gallery.authorization.status().can_upload());
    }
}
