//! URL state cell
//!
//! The visible URL is process-wide mutable state. Every read and write of it
//! goes through a [`UrlCell`]; fragment parameters are handled by
//! [`HashParams`] and one-time query-string secrets by [`SecretParams`], so the
//! route-versus-parameter distinction is enforced in a single place.

mod location;
mod params;

pub mod hash_params;
pub mod secret_params;

use std::sync::Mutex;

pub use hash_params::HashParams;
pub use location::Location;
pub use params::ParamBag;
pub use secret_params::{MemorySessionStore, SecretParams, SessionStore};

/// Holder of the current URL.
///
/// Implementations never trigger a page load; both write operations only
/// change what the URL shows.
pub trait UrlCell: Send + Sync {
    /// Snapshot of the current URL.
    fn location(&self) -> Location;

    /// Assign the fragment (without the leading `#`), keeping path and query.
    fn set_fragment(&self, fragment: &str);

    /// Replace the current history entry with `location`.
    fn replace(&self, location: Location);
}

/// In-memory URL cell, used by the CLI and in tests.
#[derive(Debug)]
pub struct MemoryUrl {
    current: Mutex<Location>,
}

impl MemoryUrl {
    pub fn new(href: &str) -> Self {
        Self {
            current: Mutex::new(Location::parse(href)),
        }
    }

    pub fn href(&self) -> String {
        self.location().href()
    }

    fn with_current<T>(&self, f: impl FnOnce(&mut Location) -> T) -> T {
        let mut guard = self
            .current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }
}

impl UrlCell for MemoryUrl {
    fn location(&self) -> Location {
        self.with_current(|loc| loc.clone())
    }

    fn set_fragment(&self, fragment: &str) {
        self.with_current(|loc| loc.fragment = Some(fragment.to_string()));
    }

    fn replace(&self, location: Location) {
        self.with_current(|loc| *loc = location);
    }
}
