//! Transient `blob:` URLs for viewed documents.
//!
//! Every view registers the downloaded bytes under a fresh URL. Entries are
//! revoked after a fixed delay or as soon as the viewer is done, so repeated
//! views do not pile up memory.

use std::collections::HashMap;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use bytes::Bytes;
use tokio::task::JoinHandle;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlobUrl(String);

impl BlobUrl {
    fn generate() -> Self {
        Self(format!("blob:paydesk/{}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for BlobUrl {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
struct BlobEntry {
    bytes: Bytes,
    content_type: Option<String>,
}

/// Cheap to clone; clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct BlobUrlRegistry {
    entries: Arc<Mutex<HashMap<BlobUrl, BlobEntry>>>,
}

impl BlobUrlRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, bytes: Bytes, content_type: Option<String>) -> BlobUrl {
        let url = BlobUrl::generate();
        self.lock().insert(url.clone(), BlobEntry { bytes, content_type });
        url
    }

    pub fn get(&self, url: &BlobUrl) -> Option<Bytes> {
        self.lock().get(url).map(|entry| entry.bytes.clone())
    }

    pub fn content_type(&self, url: &BlobUrl) -> Option<String> {
        self.lock().get(url).and_then(|entry| entry.content_type.clone())
    }

    /// Returns whether the URL was still live. Revoking twice is harmless.
    pub fn revoke(&self, url: &BlobUrl) -> bool {
        self.lock().remove(url).is_some()
    }

    /// Revoke `url` once `ttl` has elapsed. Must be called inside a tokio runtime.
    pub fn revoke_after(&self, url: BlobUrl, ttl: Duration) -> JoinHandle<()> {
        let registry = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            if registry.revoke(&url) {
                tracing::debug!(url = %url, "Revoked blob URL after timeout");
            }
        })
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<BlobUrl, BlobEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_revoke() {
        let registry = BlobUrlRegistry::new();
        let url = registry.register(Bytes::from_static(b"pdf"), Some("application/pdf".into()));

        assert!(url.as_str().starts_with("blob:paydesk/"));
        assert_eq!(registry.get(&url), Some(Bytes::from_static(b"pdf")));
        assert_eq!(registry.content_type(&url).as_deref(), Some("application/pdf"));

        assert!(registry.revoke(&url));
        assert!(!registry.revoke(&url));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_urls_are_unique() {
        let registry = BlobUrlRegistry::new();
        let a = registry.register(Bytes::new(), None);
        let b = registry.register(Bytes::new(), None);
        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_revoke_after_ttl() {
        let registry = BlobUrlRegistry::new();
        let url = registry.register(Bytes::from_static(b"x"), None);
        let handle = registry.revoke_after(url.clone(), Duration::from_secs(5));

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert!(registry.get(&url).is_some());

        handle.await.unwrap();
        assert!(registry.get(&url).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_early_revoke_then_timer_is_harmless() {
        let registry = BlobUrlRegistry::new();
        let url = registry.register(Bytes::from_static(b"x"), None);
        let handle = registry.revoke_after(url.clone(), Duration::from_secs(5));

        assert!(registry.revoke(&url));
        handle.await.unwrap();
        assert!(registry.is_empty());
    }
}
