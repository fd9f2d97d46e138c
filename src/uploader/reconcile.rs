//! Reconciliation of upload tasks with the native provider's state
//!
//! - [`Uploader::create`] reuses a running task registered under the same
//!   custom id
//! - [`Upload::start`] adopts a native upload already running under the
//!   task's custom id instead of starting a duplicate
//! - [`Uploader::resume`] rebuilds a task for a native upload that outlived
//!   the process that started it

use super::{Upload, UploadOutcome, Uploader};
use crate::config::UploadOptions;
use crate::error::Result;
use crate::events::lock;
use crate::types::{NativeUploadState, UploadChangeEvent, UploadId, UploadResult, UploadStatus};

impl Uploader {
    /// Create an upload task, or return the running one with the same custom id
    ///
    /// No native call is made; the upload begins with [`Upload::start`].
    pub fn create(&self, options: UploadOptions) -> Upload {
        if let Some(custom_id) = options.custom_upload_id.as_deref() {
            let id = UploadId::from(custom_id);
            if let Some(existing) = self.registry.get_by_id(&id) {
                if existing.is_running() {
                    tracing::warn!(
                        upload_id = %id,
                        "upload with this custom id is already running, reusing it"
                    );
                    return existing;
                }
            }
        }
        Upload::new(self.clone(), options)
    }

    /// Rebuild a task for a native upload by id
    ///
    /// Returns the registered task if there is one, `Ok(None)` if the provider
    /// does not know the id. The rebuilt task carries default options. A
    /// native upload that already finished yields a task whose outcome is
    /// resolved and which is not registered.
    ///
    /// # Errors
    ///
    /// Propagates any error from the provider's listing.
    pub async fn resume(&self, id: impl Into<UploadId>) -> Result<Option<Upload>> {
        let id = id.into();
        if let Some(existing) = self.registry.get_by_id(&id) {
            return Ok(Some(existing));
        }

        let uploads = self.provider.list_uploads().await?;
        let Some(native) = uploads.into_iter().find(|info| info.id == id) else {
            tracing::debug!(upload_id = %id, "no native upload to resume");
            return Ok(None);
        };

        // Another caller may have resumed it while the listing was in flight
        if let Some(existing) = self.registry.get_by_id(&id) {
            return Ok(Some(existing));
        }

        let status = UploadStatus::from_native(native.state);
        let upload = Upload::new(self.clone(), UploadOptions::default());
        upload.attach_to_native(id.clone(), status);

        tracing::info!(upload_id = %id, status = %status, "upload resumed");
        Ok(Some(upload))
    }

    /// Every live, non-terminal upload this uploader tracks, ordered by id
    pub fn get_all(&self) -> Vec<Upload> {
        self.registry.snapshot()
    }
}

impl Upload {
    /// Attach to the native upload already running under this task's custom id
    ///
    /// Native uploads that failed or were cancelled are not adopted; a new
    /// upload is started under the same id instead.
    pub(crate) async fn adopt_native(&self) -> Result<Option<UploadOutcome>> {
        let Some(custom_id) = self.inner.options.custom_upload_id.as_deref() else {
            return Ok(None);
        };
        let id = UploadId::from(custom_id);

        let uploads = self.inner.ctx.provider.list_uploads().await?;
        let Some(native) = uploads.into_iter().find(|info| {
            info.id == id
                && !matches!(
                    info.state,
                    NativeUploadState::Error | NativeUploadState::Cancelled
                )
        }) else {
            return Ok(None);
        };

        tracing::warn!(
            upload_id = %id,
            native_state = ?native.state,
            "native upload already exists for custom id, adopting it"
        );
        Ok(Some(self.attach_to_native(id, UploadStatus::from_native(native.state))))
    }

    /// Track an existing native upload under `id`
    ///
    /// A terminal `status` resolves the outcome at once and leaves the task
    /// unobserved and unregistered.
    pub(crate) fn attach_to_native(&self, id: UploadId, status: UploadStatus) -> UploadOutcome {
        if status.is_terminal() {
            let outcome = UploadOutcome::resolved(Ok(UploadResult::bare(status)));
            {
                let mut state = lock(&self.inner.state);
                state.id = Some(id);
                state.status = status;
                state.outcome = Some(outcome.clone());
            }
            self.notify(&UploadChangeEvent::status(status));
            return outcome;
        }

        let (resolver, outcome) = UploadOutcome::channel();
        let changed = {
            let mut state = lock(&self.inner.state);
            let changed = state.status != status;
            state.id = Some(id.clone());
            state.status = status;
            state.outcome = Some(outcome.clone());
            state.resolver = Some(resolver);
            state.awaiting_id = false;
            changed
        };
        if changed {
            self.notify(&UploadChangeEvent::status(status));
        }
        self.attach_listeners();

        {
            // A terminal event may already have arrived and cleaned up
            let state = lock(&self.inner.state);
            if !state.status.is_terminal() {
                self.inner.ctx.registry.insert(id, self);
            }
        }
        outcome
    }
}
