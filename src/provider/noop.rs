//! No-op provider for builds without a native upload bridge

use super::traits::NativeUploadProvider;
use crate::config::UploadOptions;
use crate::types::{NativeUploadInfo, UploadId};
use async_trait::async_trait;

/// Provider used when no native upload service is available
///
/// Every call that would need the native side returns
/// `Error::NotSupported`. The listing is empty, so `resume` reports
/// not-found instead of failing.
///
/// # Examples
///
/// ```
/// use background_upload::provider::NoOpProvider;
/// use background_upload::{Config, Uploader, UploadOptions};
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let uploader = Uploader::new(Arc::new(NoOpProvider), Config::default())?;
///
/// let upload = uploader.create(UploadOptions::new("https://example.com/up", "/tmp/a.bin"));
/// assert!(upload.start().await.is_err());
/// assert!(uploader.resume("missing").await?.is_none());
/// # Ok(())
/// # }
/// ```
pub struct NoOpProvider;

#[async_trait]
impl NativeUploadProvider for NoOpProvider {
    async fn start_upload(&self, _options: &UploadOptions) -> crate::Result<UploadId> {
        Err(crate::Error::NotSupported(
            "background uploads require a native upload provider".into(),
        ))
    }

    async fn cancel_upload(&self, _id: &UploadId) -> crate::Result<bool> {
        Err(crate::Error::NotSupported(
            "background uploads require a native upload provider".into(),
        ))
    }

    async fn list_uploads(&self) -> crate::Result<Vec<NativeUploadInfo>> {
        Ok(Vec::new())
    }

    async fn get_file_info(&self, _path: &str) -> crate::Result<serde_json::Value> {
        Err(crate::Error::NotSupported(
            "file info requires a native upload provider".into(),
        ))
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}
