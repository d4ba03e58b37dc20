//! In-memory gallery backend for service tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use framelink_core::models::{
    BlobRef, GalleryStats, Identity, NewPhoto, PhotoMetadata, UserProfile, UserRole,
};
use framelink_core::{
    AppError, AppResult, BackendConnector, GalleryBackend, ProgressReporter, ShortCode,
};
use tokio::sync::Semaphore;

/// Mock backend holding photos and short links in memory.
///
/// Every call is counted by method name. `set_offline` turns every call into
/// a transport failure, and `hold_calls` parks lookups until `release_calls`.
pub struct MockBackend {
    photos: Mutex<HashMap<String, PhotoMetadata>>,
    links: Mutex<HashMap<String, String>>,
    profile: Mutex<Option<UserProfile>>,
    calls: Mutex<HashMap<&'static str, usize>>,
    can_upload: AtomicBool,
    offline: AtomicBool,
    collisions: AtomicUsize,
    gate: Mutex<Option<Arc<Semaphore>>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            photos: Mutex::new(HashMap::new()),
            links: Mutex::new(HashMap::new()),
            profile: Mutex::new(None),
            calls: Mutex::new(HashMap::new()),
            can_upload: AtomicBool::new(true),
            offline: AtomicBool::new(false),
            collisions: AtomicUsize::new(0),
            gate: Mutex::new(None),
        }
    }

    pub fn with_photo(self, photo: PhotoMetadata) -> Self {
        self.insert_photo(photo);
        self
    }

    pub fn insert_photo(&self, photo: PhotoMetadata) {
        self.photos.lock().unwrap().insert(photo.id.clone(), photo);
    }

    /// Register `code` directly, bypassing authorization.
    pub fn insert_link(&self, code: &str, photo_id: &str) {
        self.links
            .lock()
            .unwrap()
            .insert(code.to_string(), photo_id.to_string());
    }

    pub fn link_target(&self, code: &str) -> Option<String> {
        self.links.lock().unwrap().get(code).cloned()
    }

    pub fn link_count(&self) -> usize {
        self.links.lock().unwrap().len()
    }

    pub fn has_photo(&self, id: &str) -> bool {
        self.photos.lock().unwrap().contains_key(id)
    }

    pub fn set_can_upload(&self, allowed: bool) {
        self.can_upload.store(allowed, Ordering::SeqCst);
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Reject the next `count` short-link registrations as collisions.
    pub fn collide_next(&self, count: usize) {
        self.collisions.store(count, Ordering::SeqCst);
    }

    /// Park `can_upload` and short-code lookups until [`release_calls`](Self::release_calls).
    pub fn hold_calls(&self) {
        *self.gate.lock().unwrap() = Some(Arc::new(Semaphore::new(0)));
    }

    pub fn release_calls(&self) {
        if let Some(gate) = self.gate.lock().unwrap().as_ref() {
            gate.add_permits(1024);
        }
    }

    /// Number of calls made to `method`.
    pub fn calls(&self, method: &str) -> usize {
        self.calls.lock().unwrap().get(method).copied().unwrap_or(0)
    }

    fn enter(&self, method: &'static str) -> AppResult<()> {
        *self.calls.lock().unwrap().entry(method).or_insert(0) += 1;
        self.reachable()
    }

    fn reachable(&self) -> AppResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(AppError::Unavailable("connection refused".to_string()));
        }
        Ok(())
    }

    /// Wait for the gate, then re-check reachability.
    async fn wait_gate(&self) -> AppResult<()> {
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            let _permit = gate.acquire().await;
        }
        self.reachable()
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GalleryBackend for MockBackend {
    async fn list_photos(&self) -> AppResult<Vec<PhotoMetadata>> {
        self.enter("list_photos")?;
        Ok(self.photos.lock().unwrap().values().cloned().collect())
    }

    async fn get_photo(&self, id: &str) -> AppResult<Option<PhotoMetadata>> {
        self.enter("get_photo")?;
        Ok(self.photos.lock().unwrap().get(id).cloned())
    }

    async fn add_photo(&self, photo: NewPhoto, progress: &ProgressReporter) -> AppResult<()> {
        self.enter("add_photo")?;
        let total = photo.bytes.len() as u64;
        progress.report_bytes(total / 2, total);
        progress.report_bytes(total, total);
        self.insert_photo(PhotoMetadata {
            blob: BlobRef {
                direct_url: format!("memory://{}", photo.id),
            },
            id: photo.id,
            name: photo.name,
            content_type: photo.content_type,
            timestamp: photo.timestamp,
        });
        Ok(())
    }

    async fn add_short_link(&self, photo_id: &str, short_code: &ShortCode) -> AppResult<()> {
        self.enter("add_short_link")?;
        if !self.can_upload.load(Ordering::SeqCst) {
            return Err(AppError::Unauthorized(
                "Unauthorized: only admins can create short links".to_string(),
            ));
        }
        if !self.has_photo(photo_id) {
            return Err(AppError::NotFound("Photo does not exist".to_string()));
        }
        let forced = self
            .collisions
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        let mut links = self.links.lock().unwrap();
        if forced || links.contains_key(short_code.as_str()) {
            return Err(AppError::Collision(short_code.to_string()));
        }
        links.insert(short_code.to_string(), photo_id.to_string());
        Ok(())
    }

    async fn get_photo_by_short_code(
        &self,
        short_code: &ShortCode,
    ) -> AppResult<Option<PhotoMetadata>> {
        self.enter("get_photo_by_short_code")?;
        self.wait_gate().await?;
        let Some(photo_id) = self.link_target(short_code.as_str()) else {
            return Ok(None);
        };
        Ok(self.photos.lock().unwrap().get(&photo_id).cloned())
    }

    async fn resolve_short_link(&self, short_code: &ShortCode) -> AppResult<Option<String>> {
        self.enter("resolve_short_link")?;
        Ok(self.link_target(short_code.as_str()))
    }

    async fn can_upload(&self) -> AppResult<bool> {
        self.enter("can_upload")?;
        self.wait_gate().await?;
        Ok(self.can_upload.load(Ordering::SeqCst))
    }

    async fn get_caller_user_role(&self) -> AppResult<UserRole> {
        self.enter("get_caller_user_role")?;
        Ok(if self.can_upload.load(Ordering::SeqCst) {
            UserRole::Admin
        } else {
            UserRole::User
        })
    }

    async fn is_caller_admin(&self) -> AppResult<bool> {
        self.enter("is_caller_admin")?;
        Ok(self.can_upload.load(Ordering::SeqCst))
    }

    async fn get_caller_user_profile(&self) -> AppResult<Option<UserProfile>> {
        self.enter("get_caller_user_profile")?;
        Ok(self.profile.lock().unwrap().clone())
    }

    async fn save_caller_user_profile(&self, profile: &UserProfile) -> AppResult<()> {
        self.enter("save_caller_user_profile")?;
        *self.profile.lock().unwrap() = Some(profile.clone());
        Ok(())
    }

    async fn get_gallery_stats(&self) -> AppResult<GalleryStats> {
        self.enter("get_gallery_stats")?;
        Ok(GalleryStats {
            photo_count: self.photos.lock().unwrap().len() as u64,
            short_link_count: self.link_count() as u64,
        })
    }
}

/// Connector handing out the same [`MockBackend`] for every identity.
pub struct MockConnector {
    backend: Arc<MockBackend>,
    connects: AtomicUsize,
    fail: AtomicBool,
    identities: Mutex<Vec<Identity>>,
}

impl MockConnector {
    pub fn new(backend: MockBackend) -> Self {
        Self::shared(Arc::new(backend))
    }

    pub fn shared(backend: Arc<MockBackend>) -> Self {
        Self {
            backend,
            connects: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
            identities: Mutex::new(Vec::new()),
        }
    }

    pub fn backend(&self) -> Arc<MockBackend> {
        self.backend.clone()
    }

    pub fn fail_connections(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn identities(&self) -> Vec<Identity> {
        self.identities.lock().unwrap().clone()
    }
}

impl BackendConnector for MockConnector {
    fn connect(&self, identity: &Identity) -> AppResult<Arc<dyn GalleryBackend>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        self.identities.lock().unwrap().push(identity.clone());
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Unavailable("actor not ready".to_string()));
        }
        Ok(self.backend.clone())
    }
}
