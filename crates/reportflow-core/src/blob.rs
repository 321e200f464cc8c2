//! In-memory blobs and their object URLs
//!
//! A decoded document is wrapped as a [`Blob`] and registered in a
//! [`BlobStore`], which hands out an [`ObjectUrl`]. The URL serves as preview
//! and download source until the handle is dropped, at which point the blob is
//! revoked and its bytes released.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct Blob {
    media_type: &'static str,
    bytes: Arc<[u8]>,
}

impl Blob {
    pub fn new(media_type: &'static str, bytes: Vec<u8>) -> Self {
        Self {
            media_type,
            bytes: bytes.into(),
        }
    }

    pub fn media_type(&self) -> &'static str {
        self.media_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

type BlobTable = HashMap<String, Blob>;

fn lock(table: &Mutex<BlobTable>) -> MutexGuard<'_, BlobTable> {
    table.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Clone, Default)]
pub struct BlobStore {
    table: Arc<Mutex<BlobTable>>,
}

impl BlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_object_url(&self, blob: Blob) -> ObjectUrl {
        let url = format!("blob:reportflow/{}", Uuid::new_v4());
        let len = blob.len();
        let media_type = blob.media_type();
        lock(&self.table).insert(url.clone(), blob);
        tracing::debug!(%url, bytes = len, "object url created");

        ObjectUrl {
            url,
            media_type,
            len,
            table: Arc::downgrade(&self.table),
        }
    }

    /// Look up a live object URL.
    pub fn resolve(&self, url: &str) -> Option<Blob> {
        lock(&self.table).get(url).cloned()
    }

    /// Number of object URLs that have not been revoked yet.
    pub fn live_count(&self) -> usize {
        lock(&self.table).len()
    }
}

/// Owned handle to a registered blob; revokes it on drop
#[derive(Debug)]
pub struct ObjectUrl {
    url: String,
    media_type: &'static str,
    len: usize,
    table: Weak<Mutex<BlobTable>>,
}

impl ObjectUrl {
    pub fn as_str(&self) -> &str {
        &self.url
    }

    pub fn media_type(&self) -> &'static str {
        self.media_type
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Drop for ObjectUrl {
    fn drop(&mut self) {
        if let Some(table) = self.table.upgrade() {
            lock(&table).remove(&self.url);
            tracing::debug!(url = %self.url, "object url revoked");
        }
    }
}
