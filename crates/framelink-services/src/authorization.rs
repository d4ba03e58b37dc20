//! Upload-authorization gate.
//!
//! The capability is derived from the backend for the active identity and
//! published through a `watch` channel. It fails closed: a lookup that cannot
//! reach the backend yields [`AuthorizationStatus::Unknown`], which never
//! permits uploading but stays distinguishable from an actual denial.

use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::query_cache::QueryCache;
use crate::session::Session;

const CACHE_KEY: &str = "uploadAuthorization";
pub const CHECKING_MESSAGE: &str = "Checking permissions...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationStatus {
    /// No result yet for the active identity
    Checking,
    Allowed,
    Denied,
    /// The backend could not be asked
    Unknown,
}

impl AuthorizationStatus {
    pub fn can_upload(self) -> bool {
        matches!(self, AuthorizationStatus::Allowed)
    }

    /// True until a definitive answer is known.
    pub fn is_checking(self) -> bool {
        matches!(self, AuthorizationStatus::Checking | AuthorizationStatus::Unknown)
    }

    /// Transient message to display, if any.
    pub fn message(self) -> Option<&'static str> {
        self.is_checking().then_some(CHECKING_MESSAGE)
    }

    fn from_allowed(allowed: bool) -> Self {
        if allowed {
            AuthorizationStatus::Allowed
        } else {
            AuthorizationStatus::Denied
        }
    }
}

pub struct UploadAuthorization {
    session: Arc<Session>,
    cache: QueryCache<bool>,
    stale_time: Duration,
    status: watch::Sender<AuthorizationStatus>,
    /// Generation the published status was settled for
    settled: Mutex<Option<u64>>,
}

impl UploadAuthorization {
    pub fn new(session: Arc<Session>, cache: QueryCache<bool>, stale_time: Duration) -> Self {
        let (status, _) = watch::channel(AuthorizationStatus::Checking);
        Self {
            session,
            cache,
            stale_time,
            status,
            settled: Mutex::new(None),
        }
    }

    /// Status for the active identity. An answer settled for an earlier
    /// identity reads as `Checking`.
    pub fn status(&self) -> AuthorizationStatus {
        let settled = self
            .settled
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if *settled == Some(self.session.generation()) {
            *self.status.borrow()
        } else {
            AuthorizationStatus::Checking
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthorizationStatus> {
        self.status.subscribe()
    }

    /// Re-evaluate and return whether the active identity may upload.
    pub async fn can_upload(&self) -> bool {
        self.refresh().await.can_upload()
    }

    /// Re-evaluate the capability for the active identity.
    ///
    /// `Checking` is only published when no settled answer exists for the
    /// current identity, so a re-check never flashes an earlier `Denied`
    /// back to `Checking`.
    pub async fn refresh(&self) -> AuthorizationStatus {
        let state = self.session.current();
        let generation = state.generation;

        if state.identity.is_anonymous() {
            debug!("Anonymous identity cannot upload");
            return self.settle(generation, AuthorizationStatus::Denied);
        }

        if let Some(allowed) = self.cache.get_fresh(CACHE_KEY, generation, self.stale_time) {
            return self.settle(generation, AuthorizationStatus::from_allowed(allowed));
        }

        if !self.is_settled_for(generation) {
            self.status.send_if_modified(|status| {
                let changed = *status != AuthorizationStatus::Checking;
                *status = AuthorizationStatus::Checking;
                changed
            });
        }

        let outcome = match state.backend() {
            Ok(backend) => backend.can_upload().await,
            Err(e) => Err(e),
        };

        let status = match outcome {
            Ok(allowed) => {
                self.cache.insert(CACHE_KEY, generation, allowed);
                AuthorizationStatus::from_allowed(allowed)
            }
            Err(e) => {
                warn!(error = %e, "Upload authorization check failed");
                AuthorizationStatus::Unknown
            }
        };

        if self.session.generation() != generation {
            debug!(generation, "Identity changed during authorization check; discarding result");
            return AuthorizationStatus::Checking;
        }
        self.settle(generation, status)
    }

    /// Re-run [`refresh`](Self::refresh) after every identity transition.
    /// The task ends once the authorization gate is dropped.
    pub fn watch_identity(self: &Arc<Self>) -> JoinHandle<()> {
        let weak: Weak<Self> = Arc::downgrade(self);
        let mut changes = self.session.subscribe();
        tokio::spawn(async move {
            while changes.changed().await.is_ok() {
                let Some(gate) = weak.upgrade() else {
                    break;
                };
                gate.refresh().await;
            }
        })
    }

    fn is_settled_for(&self, generation: u64) -> bool {
        let settled = self
            .settled
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *settled == Some(generation) && *self.status.borrow() != AuthorizationStatus::Unknown
    }

    fn settle(&self, generation: u64, status: AuthorizationStatus) -> AuthorizationStatus {
        let mut settled = self
            .settled
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *settled = Some(generation);
        self.status.send_if_modified(|current| {
            let changed = *current != status;
            *current = status;
            changed
        });
        status
    }
}
