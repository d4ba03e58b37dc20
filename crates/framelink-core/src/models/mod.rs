//! Domain models shared by the client crates.

pub mod identity;
pub mod photo;
pub mod user;

pub use identity::Identity;
pub use photo::{BlobRef, GalleryStats, NewPhoto, PhotoMetadata};
pub use user::{UserProfile, UserRole};
