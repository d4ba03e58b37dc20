//! Identity context.
//!
//! Holds the active identity and the backend connection bound to it. Every
//! identity transition bumps a generation counter; caches keyed on the
//! generation therefore forget results fetched for a previous identity.

use std::sync::Arc;

use framelink_core::models::Identity;
use framelink_core::{AppError, AppResult, BackendConnector, GalleryBackend};
use tokio::sync::watch;
use tracing::{info, warn};

#[derive(Clone)]
pub struct SessionState {
    pub identity: Identity,
    /// `None` when connecting for this identity failed
    pub backend: Option<Arc<dyn GalleryBackend>>,
    pub generation: u64,
}

impl SessionState {
    /// Backend bound to this state's identity.
    pub fn backend(&self) -> AppResult<Arc<dyn GalleryBackend>> {
        self.backend.clone().ok_or_else(|| {
            AppError::Unavailable("Backend connection not available. Please try again.".to_string())
        })
    }
}

impl std::fmt::Debug for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionState")
            .field("identity", &self.identity)
            .field("connected", &self.backend.is_some())
            .field("generation", &self.generation)
            .finish()
    }
}

pub struct Session {
    connector: Arc<dyn BackendConnector>,
    state: watch::Sender<SessionState>,
}

impl Session {
    pub fn new(connector: Arc<dyn BackendConnector>, identity: Identity) -> Self {
        let backend = connect(connector.as_ref(), &identity);
        let (state, _) = watch::channel(SessionState {
            identity,
            backend,
            generation: 0,
        });
        Self { connector, state }
    }

    pub fn current(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn identity(&self) -> Identity {
        self.state.borrow().identity.clone()
    }

    pub fn generation(&self) -> u64 {
        self.state.borrow().generation
    }

    /// Backend for the active identity.
    pub fn backend(&self) -> AppResult<Arc<dyn GalleryBackend>> {
        self.state.borrow().backend()
    }

    /// Notified on every identity transition.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Switch to `identity`, invalidating everything cached for the previous one.
    pub fn login(&self, identity: Identity) {
        let backend = connect(self.connector.as_ref(), &identity);
        self.state.send_modify(|state| {
            state.generation += 1;
            state.identity = identity;
            state.backend = backend;
            info!(
                identity = state.identity.label(),
                generation = state.generation,
                "Identity changed"
            );
        });
    }

    pub fn logout(&self) {
        self.login(Identity::Anonymous);
    }
}

fn connect(connector: &dyn BackendConnector, identity: &Identity) -> Option<Arc<dyn GalleryBackend>> {
    match connector.connect(identity) {
        Ok(backend) => Some(backend),
        Err(e) => {
            warn!(identity = identity.label(), error = %e, "Failed to connect to gallery backend");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{MockBackend, MockConnector};

    #[test]
    fn login_and_logout_bump_generation() {
        let connector = Arc::new(MockConnector::new(MockBackend::new()));
        let session = Session::new(connector.clone(), Identity::Anonymous);
        let mut rx = session.subscribe();
        assert_eq!(session.generation(), 0);

        session.login(Identity::Bearer("t".to_string()));
        assert!(rx.has_changed().unwrap());
        assert_eq!(session.generation(), 1);
        assert!(!session.identity().is_anonymous());
        rx.mark_unchanged();

        session.logout();
        assert!(rx.has_changed().unwrap());
        assert_eq!(session.generation(), 2);
        assert!(session.identity().is_anonymous());
        assert_eq!(connector.connects(), 3);
    }

    #[test]
    fn failed_connection_surfaces_as_unavailable() {
        let connector = Arc::new(MockConnector::new(MockBackend::new()));
        connector.fail_connections(true);
        let session = Session::new(connector, Identity::Anonymous);
        match session.backend() {
            Err(AppError::Unavailable(msg)) => assert!(msg.contains("Backend connection")),
            Err(other) => panic!("unexpected error: {:?}", other),
            Ok(_) => panic!("expected no backend"),
        }
    }
}
