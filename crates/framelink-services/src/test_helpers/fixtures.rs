//! Test fixtures

use std::sync::{Arc, Mutex};

use framelink_core::models::{BlobRef, PhotoMetadata};
use framelink_core::ClientConfig;

use crate::landing::PhotoPresenter;

pub fn photo(id: &str, timestamp: i64) -> PhotoMetadata {
    PhotoMetadata {
        id: id.to_string(),
        name: format!("{}.jpg", id),
        content_type: "image/jpeg".to_string(),
        blob: BlobRef {
            direct_url: format!("https://cdn.example.com/{}", id),
        },
        timestamp,
    }
}

pub fn test_config() -> ClientConfig {
    ClientConfig {
        public_origin: "https://gallery.example.com".to_string(),
        ..ClientConfig::default()
    }
}

/// Presenter recording what it was asked to show.
#[derive(Default)]
pub struct RecordingPresenter {
    pub opened: Mutex<Vec<PhotoMetadata>>,
    pub errors: Mutex<Vec<String>>,
}

impl RecordingPresenter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn opened_ids(&self) -> Vec<String> {
        self.opened.lock().unwrap().iter().map(|p| p.id.clone()).collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }
}

impl PhotoPresenter for RecordingPresenter {
    fn open_photo(&self, photo: &PhotoMetadata) {
        self.opened.lock().unwrap().push(photo.clone());
    }

    fn show_error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }
}
