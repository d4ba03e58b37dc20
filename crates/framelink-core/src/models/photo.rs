use bytes::Bytes;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Handle to the binary content of a photo held by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobRef {
    /// URL the image bytes can be fetched from directly
    pub direct_url: String,
}

/// Photo record produced by the backend. Never mutated by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoMetadata {
    pub id: String,
    pub name: String,
    pub content_type: String,
    pub blob: BlobRef,
    /// Creation instant in milliseconds since the Unix epoch
    pub timestamp: i64,
}

impl PhotoMetadata {
    /// Creation instant as a UTC date, if the timestamp is representable.
    pub fn uploaded_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.timestamp).single()
    }
}

/// Photo submitted for upload.
#[derive(Debug, Clone)]
pub struct NewPhoto {
    pub id: String,
    pub name: String,
    pub content_type: String,
    pub timestamp: i64,
    pub bytes: Bytes,
}

/// Aggregate counters reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryStats {
    pub photo_count: u64,
    pub short_link_count: u64,
}
