//! Direct pass-through calls for callers that do not use upload tasks
//!
//! None of these touch the registry: an upload started here is tracked by
//! the provider only.

use super::Uploader;
use crate::config::UploadOptions;
use crate::error::{Error, Result};
use crate::events::Subscription;
use crate::types::{EventKind, FileInfo, NativeUploadInfo, Platform, UploadEvent, UploadId};

impl Uploader {
    /// File metadata for `path`, normalized into a [`FileInfo`]
    ///
    /// A size reported as a numeric string is converted to a number.
    pub async fn get_file_info(&self, path: &str) -> Result<FileInfo> {
        let raw = self.provider.get_file_info(path).await?;
        let info: FileInfo = serde_json::from_value(raw)?;
        tracing::debug!(path, exists = info.exists, size = ?info.size, "file info");
        Ok(info)
    }

    /// Start a native upload without creating a task
    pub async fn start_upload(&self, options: &UploadOptions) -> Result<UploadId> {
        let id = self.provider.start_upload(options).await?;
        tracing::info!(upload_id = %id, path = %options.path, "untracked upload started");
        Ok(id)
    }

    /// Cancel a native upload by id without going through a task
    ///
    /// # Errors
    ///
    /// [`Error::InvalidParameter`] if `upload_id` is empty; the provider is
    /// not called.
    pub async fn cancel_upload(&self, upload_id: &str) -> Result<bool> {
        if upload_id.is_empty() {
            return Err(Error::invalid_parameter(
                "upload_id",
                "upload id must not be empty",
            ));
        }
        self.provider.cancel_upload(&UploadId::from(upload_id)).await
    }

    /// Listen to raw events of `kind` for one upload id, or all ids when `None`
    pub fn add_listener<F>(
        &self,
        kind: EventKind,
        upload_id: Option<UploadId>,
        listener: F,
    ) -> Subscription
    where
        F: Fn(&UploadEvent) + Send + Sync + 'static,
    {
        self.events.add_listener_for(kind, upload_id, listener)
    }

    /// Let the OS suspend the app while uploads continue (iOS only)
    pub fn can_suspend_if_background(&self) {
        if self.provider.platform() == Platform::Ios {
            self.provider.can_suspend_if_background();
        }
    }

    /// Restrict uploads to unmetered networks
    pub fn should_limit_network(&self, limit: bool) {
        self.provider.should_limit_network(limit);
    }

    /// Every upload the provider knows about, as reported
    pub async fn get_all_uploads(&self) -> Result<Vec<NativeUploadInfo>> {
        self.provider.list_uploads().await
    }
}
