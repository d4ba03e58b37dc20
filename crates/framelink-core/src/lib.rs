//! Framelink Core Library
//!
//! Domain models, error types, configuration and the client-side primitives
//! (URL state, short codes, upload validation) shared by all Framelink crates.

pub mod backend;
pub mod config;
pub mod error;
pub mod models;
pub mod progress;
pub mod short_code;
pub mod upload;
pub mod url_state;
pub mod validation;

// Re-export commonly used types
pub use backend::{BackendConnector, GalleryBackend};
pub use config::{AuthScheme, ClientConfig};
pub use error::{AppError, AppResult, ErrorMetadata, LogLevel, StoreError};
pub use progress::{ProgressReporter, UploadProgress};
pub use short_code::ShortCode;
pub use url_state::{HashParams, Location, MemoryUrl, SecretParams, SessionStore, UrlCell};
