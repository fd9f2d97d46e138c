//! The native upload provider seam

use async_trait::async_trait;

use crate::config::UploadOptions;
use crate::types::{NativeUploadInfo, Platform, UploadId};

/// Platform service that performs uploads
///
/// Implementations wrap a native bridge (a mobile OS background transfer
/// service, a host process, a test double). They perform the HTTP transfer,
/// assign upload ids, and report lifecycle events by pushing them into the
/// [`EventEmitter`](crate::events::EventEmitter) owned by the
/// [`Uploader`](crate::Uploader).
///
/// Every call may fail with [`Error::Native`](crate::Error::Native); those
/// failures propagate to the caller unchanged.
///
/// # Examples
///
/// ```no_run
/// use async_trait::async_trait;
/// use background_upload::provider::NativeUploadProvider;
/// use background_upload::{NativeUploadInfo, Result, UploadId, UploadOptions};
///
/// struct Bridge;
///
/// #[async_trait]
/// impl NativeUploadProvider for Bridge {
///     async fn start_upload(&self, options: &UploadOptions) -> Result<UploadId> {
///         let id = options.custom_upload_id.clone().unwrap_or_else(|| "1".into());
///         Ok(UploadId::new(id))
///     }
///
///     async fn cancel_upload(&self, _id: &UploadId) -> Result<bool> {
///         Ok(true)
///     }
///
///     async fn list_uploads(&self) -> Result<Vec<NativeUploadInfo>> {
///         Ok(vec![])
///     }
///
///     async fn get_file_info(&self, _path: &str) -> Result<serde_json::Value> {
///         Ok(serde_json::json!({ "exists": false }))
///     }
///
///     fn name(&self) -> &'static str {
///         "bridge"
///     }
/// }
/// ```
#[async_trait]
pub trait NativeUploadProvider: Send + Sync {
    /// Start a native upload and return the id the provider assigned
    ///
    /// Providers must use `options.custom_upload_id` as the id when it is set.
    async fn start_upload(&self, options: &UploadOptions) -> crate::Result<UploadId>;

    /// Ask the provider to cancel an upload
    ///
    /// A `true` result only acknowledges the request. The upload is
    /// cancelled once the provider emits the matching `cancelled` event.
    async fn cancel_upload(&self, id: &UploadId) -> crate::Result<bool>;

    /// Every upload the provider currently knows about
    async fn list_uploads(&self) -> crate::Result<Vec<NativeUploadInfo>>;

    /// Raw file metadata for `path`
    ///
    /// Returned undecoded; [`Uploader::get_file_info`](crate::Uploader::get_file_info)
    /// normalizes it into a [`FileInfo`](crate::FileInfo).
    async fn get_file_info(&self, path: &str) -> crate::Result<serde_json::Value>;

    /// Allow the OS to suspend the app while uploads run in the background
    fn can_suspend_if_background(&self) {}

    /// Restrict uploads to unmetered networks
    fn should_limit_network(&self, _limit: bool) {}

    /// Platform family this provider runs on
    fn platform(&self) -> Platform {
        Platform::Other
    }

    /// Activate one native event stream before first use
    ///
    /// Only called on platforms whose event streams need it, once per stream.
    fn activate_event(&self, _stream_name: &str) -> crate::Result<()> {
        Ok(())
    }

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
