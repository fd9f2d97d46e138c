//! Lookup table of live uploads
//!
//! The registry maps native upload ids to the [`Upload`] tracking them. It
//! exists for deduplication and lookup only: entries are weak, so the
//! registry never keeps an upload alive. A started upload is kept alive by
//! its event subscriptions until it reaches a terminal state.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use crate::events::lock;
use crate::types::UploadId;
use crate::uploader::{Upload, UploadInner};

/// Id → upload mapping owned by an [`Uploader`](crate::Uploader) (cheap to clone)
#[derive(Clone, Default)]
pub struct UploadRegistry {
    uploads: Arc<Mutex<HashMap<UploadId, Weak<UploadInner>>>>,
}

impl std::fmt::Debug for UploadRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadRegistry")
            .field("len", &self.len())
            .finish()
    }
}

impl UploadRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `upload` under its id, replacing any previous entry
    ///
    /// Uploads without an id are not registered.
    pub fn register(&self, upload: &Upload) {
        if let Some(id) = upload.id() {
            self.insert(id, upload);
        }
    }

    /// Remove the entry for `id`; a missing id is a no-op
    pub fn unregister(&self, id: &UploadId) {
        lock(&self.uploads).remove(id);
    }

    /// The live upload registered under `id`
    pub fn get_by_id(&self, id: &UploadId) -> Option<Upload> {
        lock(&self.uploads)
            .get(id)
            .and_then(Weak::upgrade)
            .map(|inner| Upload { inner })
    }

    /// Whether a live upload is registered under `id`
    pub fn has(&self, id: &UploadId) -> bool {
        self.get_by_id(id).is_some()
    }

    /// Remove every entry
    pub fn clear(&self) {
        lock(&self.uploads).clear();
    }

    /// Every live registered upload, ordered by id
    ///
    /// Entries whose upload has been dropped are pruned.
    pub fn snapshot(&self) -> Vec<Upload> {
        let mut uploads = lock(&self.uploads);
        uploads.retain(|_, weak| weak.strong_count() > 0);

        let mut live: Vec<(UploadId, Upload)> = uploads
            .iter()
            .filter_map(|(id, weak)| weak.upgrade().map(|inner| (id.clone(), Upload { inner })))
            .collect();
        drop(uploads);

        live.sort_by(|a, b| a.0.cmp(&b.0));
        live.into_iter().map(|(_, upload)| upload).collect()
    }

    /// Number of live registered uploads
    pub fn len(&self) -> usize {
        lock(&self.uploads)
            .values()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    /// Whether no live upload is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Register under an explicit id without reading the upload's state
    pub(crate) fn insert(&self, id: UploadId, upload: &Upload) {
        tracing::debug!(upload_id = %id, "upload registered");
        lock(&self.uploads).insert(id, Arc::downgrade(&upload.inner));
    }

    /// Remove the entry for `id` only if it still points at `upload`
    ///
    /// A newer upload registered under the same id is left in place.
    pub(crate) fn release(&self, id: &UploadId, upload: &Upload) {
        let mut uploads = lock(&self.uploads);
        let same = uploads
            .get(id)
            .is_some_and(|weak| std::ptr::eq(weak.as_ptr(), Arc::as_ptr(&upload.inner)));
        if same {
            uploads.remove(id);
            tracing::debug!(upload_id = %id, "upload unregistered");
        }
    }
}
