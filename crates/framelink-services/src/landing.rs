//! Short-link landing.
//!
//! On start-up a URL such as `https://gallery.example.com/#s=abc123` is turned
//! into an opened photo. The fragment parameter is removed once the lookup
//! has settled, whatever the outcome, so a re-render never resolves the same
//! link twice.

use std::sync::{Arc, Mutex};

use framelink_core::models::PhotoMetadata;
use framelink_core::{HashParams, ShortCode};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::share_links::ShareLinkService;

pub const INVALID_LINK_MESSAGE: &str = "This share link is invalid or has expired.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LandingState {
    Idle,
    Resolving(ShortCode),
    Resolved(PhotoMetadata),
    NotFound,
    TransportFailed,
}

impl LandingState {
    /// Message for the user. Nothing is shown while a lookup is in flight.
    pub fn error_message(&self) -> Option<&'static str> {
        match self {
            LandingState::NotFound | LandingState::TransportFailed => Some(INVALID_LINK_MESSAGE),
            _ => None,
        }
    }

    pub fn is_settled(&self) -> bool {
        !matches!(self, LandingState::Idle | LandingState::Resolving(_))
    }
}

/// Where a resolved link ends up.
pub trait PhotoPresenter: Send + Sync {
    fn open_photo(&self, photo: &PhotoMetadata);

    fn show_error(&self, message: &str);
}

pub struct ShortLinkLanding {
    hash: HashParams,
    param: String,
    links: Arc<ShareLinkService>,
    presenter: Arc<dyn PhotoPresenter>,
    /// Raw parameter value of the attempt already started
    attempted: Mutex<Option<String>>,
    state: watch::Sender<LandingState>,
}

impl ShortLinkLanding {
    pub fn new(
        hash: HashParams,
        param: impl Into<String>,
        links: Arc<ShareLinkService>,
        presenter: Arc<dyn PhotoPresenter>,
    ) -> Self {
        let (state, _) = watch::channel(LandingState::Idle);
        Self {
            hash,
            param: param.into(),
            links,
            presenter,
            attempted: Mutex::new(None),
            state,
        }
    }

    pub fn state(&self) -> LandingState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<LandingState> {
        self.state.subscribe()
    }

    /// Resolve the link parameter if one is present.
    ///
    /// Safe to call on every render: a code that has already been attempted
    /// is never resolved again.
    pub async fn run(&self) -> LandingState {
        let Some(raw) = self.hash.get(&self.param) else {
            return self.state();
        };

        {
            let mut attempted = self
                .attempted
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if attempted.as_deref() == Some(raw.as_str()) {
                debug!(short_code = %raw, "Short link already attempted");
                return self.state();
            }
            *attempted = Some(raw.clone());
        }

        let outcome = match ShortCode::parse(&raw) {
            Ok(code) => self.resolve(code).await,
            Err(e) => {
                debug!(error = %e, "Malformed short code in link");
                LandingState::NotFound
            }
        };

        self.state.send_replace(outcome.clone());
        match &outcome {
            LandingState::Resolved(photo) => self.presenter.open_photo(photo),
            other => {
                if let Some(message) = other.error_message() {
                    self.presenter.show_error(message);
                }
            }
        }
        self.hash.remove(&self.param);
        outcome
    }

    async fn resolve(&self, code: ShortCode) -> LandingState {
        self.state.send_replace(LandingState::Resolving(code.clone()));
        match self.links.resolve_short_code(&code).await {
            Ok(Some(photo)) => {
                info!(short_code = %code, photo_id = %photo.id, "Short link resolved");
                LandingState::Resolved(photo)
            }
            Ok(None) => {
                debug!(short_code = %code, "Short link not found");
                LandingState::NotFound
            }
            Err(e) => {
                warn!(short_code = %code, error = %e, "Short link lookup failed");
                LandingState::TransportFailed
            }
        }
    }
}
