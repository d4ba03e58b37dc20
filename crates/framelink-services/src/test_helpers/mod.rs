//! Test helpers for service unit tests
//!
//! In-memory backend, connector and fixtures, so no HTTP server is needed.

pub mod fixtures;
pub mod mock_backend;

pub use fixtures::*;
pub use mock_backend::{MockBackend, MockConnector};
