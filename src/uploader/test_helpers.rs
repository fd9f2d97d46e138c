//! Shared test helpers for creating Uploader instances in tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::config::{Config, UploadOptions};
use crate::error::{Error, Result};
use crate::provider::NativeUploadProvider;
use crate::types::{
    NativeUploadInfo, NativeUploadState, Platform, UploadChangeEvent, UploadEvent, UploadId,
};
use crate::uploader::{Upload, Uploader};

/// Hook run inside `start_upload`, before the id is returned
pub(crate) type StartHook = Box<dyn Fn(&UploadId) + Send + Sync>;

/// Provider double with scripted responses and call counters
#[derive(Default)]
pub(crate) struct ScriptedProvider {
    pub listing: Mutex<Vec<NativeUploadInfo>>,
    pub next_ids: Mutex<VecDeque<UploadId>>,
    pub fail_start: Mutex<Option<Error>>,
    pub fail_cancel: Mutex<Option<Error>>,
    pub fail_list: Mutex<Option<Error>>,
    pub cancel_ack: Mutex<Option<bool>>,
    pub file_info: Mutex<Option<serde_json::Value>>,
    pub platform: Mutex<Platform>,
    pub on_start: Mutex<Option<StartHook>>,
    pub activated: Mutex<Vec<String>>,
    pub cancelled: Mutex<Vec<UploadId>>,
    pub limit_network: Mutex<Option<bool>>,
    pub suspend_calls: AtomicUsize,
    pub start_calls: AtomicUsize,
    pub cancel_calls: AtomicUsize,
    pub list_calls: AtomicUsize,
    pub counter: AtomicUsize,
}

impl ScriptedProvider {
    pub fn starts(&self) -> usize {
        self.start_calls.load(Ordering::SeqCst)
    }

    pub fn cancels(&self) -> usize {
        self.cancel_calls.load(Ordering::SeqCst)
    }

    pub fn lists(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Queue the id the next `start_upload` without a custom id returns
    pub fn push_next_id(&self, id: &str) {
        self.next_ids.lock().unwrap().push_back(UploadId::from(id));
    }

    /// Add an entry to the native listing
    pub fn add_native(&self, id: &str, state: NativeUploadState) {
        self.listing
            .lock()
            .unwrap()
            .push(NativeUploadInfo::new(id, state));
    }

    pub fn set_fail_start(&self, err: Error) {
        *self.fail_start.lock().unwrap() = Some(err);
    }

    pub fn set_fail_cancel(&self, err: Error) {
        *self.fail_cancel.lock().unwrap() = Some(err);
    }

    pub fn set_fail_list(&self, err: Error) {
        *self.fail_list.lock().unwrap() = Some(err);
    }

    pub fn set_on_start<F>(&self, hook: F)
    where
        F: Fn(&UploadId) + Send + Sync + 'static,
    {
        *self.on_start.lock().unwrap() = Some(Box::new(hook));
    }
}

#[async_trait]
impl NativeUploadProvider for ScriptedProvider {
    async fn start_upload(&self, options: &UploadOptions) -> Result<UploadId> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        // Let concurrent callers interleave as they would against a real bridge
        tokio::task::yield_now().await;

        if let Some(err) = self.fail_start.lock().unwrap().clone() {
            return Err(err);
        }

        let id = match &options.custom_upload_id {
            Some(custom) => UploadId::from(custom.as_str()),
            None => self.next_ids.lock().unwrap().pop_front().unwrap_or_else(|| {
                let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
                UploadId::new(format!("native-{}", n))
            }),
        };

        {
            let mut listing = self.listing.lock().unwrap();
            listing.retain(|info| info.id != id);
            listing.push(NativeUploadInfo::new(id.clone(), NativeUploadState::Running));
        }

        if let Some(hook) = self.on_start.lock().unwrap().as_ref() {
            hook(&id);
        }
        Ok(id)
    }

    async fn cancel_upload(&self, id: &UploadId) -> Result<bool> {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.fail_cancel.lock().unwrap().clone() {
            return Err(err);
        }
        self.cancelled.lock().unwrap().push(id.clone());
        Ok(self.cancel_ack.lock().unwrap().unwrap_or(true))
    }

    async fn list_uploads(&self) -> Result<Vec<NativeUploadInfo>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.fail_list.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(self.listing.lock().unwrap().clone())
    }

    async fn get_file_info(&self, _path: &str) -> Result<serde_json::Value> {
        Ok(self
            .file_info
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| serde_json::json!({ "exists": false })))
    }

    fn can_suspend_if_background(&self) {
        self.suspend_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn should_limit_network(&self, limit: bool) {
        *self.limit_network.lock().unwrap() = Some(limit);
    }

    fn platform(&self) -> Platform {
        *self.platform.lock().unwrap()
    }

    fn activate_event(&self, name: &str) -> Result<()> {
        self.activated.lock().unwrap().push(name.to_string());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Helper to create a test Uploader backed by a fresh ScriptedProvider.
/// Returns the uploader and the provider, for scripting and call counts.
pub(crate) fn create_test_uploader() -> (Uploader, Arc<ScriptedProvider>) {
    create_test_uploader_with(ScriptedProvider::default())
}

/// Same as [`create_test_uploader`] with a pre-scripted provider
pub(crate) fn create_test_uploader_with(
    provider: ScriptedProvider,
) -> (Uploader, Arc<ScriptedProvider>) {
    let provider = Arc::new(provider);
    let uploader = Uploader::new(provider.clone(), Config::default()).unwrap();
    (uploader, provider)
}

/// Options pointing at the sample upload endpoint
pub(crate) fn sample_options() -> UploadOptions {
    UploadOptions::new("https://api.example.com/upload", "/tmp/video.mp4")
}

/// Record every change delivered to `upload`'s observers
pub(crate) fn record_changes(upload: &Upload) -> Arc<Mutex<Vec<UploadChangeEvent>>> {
    let changes = Arc::new(Mutex::new(Vec::new()));
    let sink = changes.clone();
    upload.on_change_fn(move |change| sink.lock().unwrap().push(change.clone()));
    changes
}

pub(crate) fn progress(id: &str, value: f64, uploaded: u64, total: u64) -> UploadEvent {
    UploadEvent::Progress {
        id: id.into(),
        progress: value,
        uploaded_bytes: Some(uploaded),
        total_bytes: Some(total),
    }
}

pub(crate) fn completed(id: &str, code: u16, body: &str) -> UploadEvent {
    UploadEvent::Completed {
        id: id.into(),
        response_code: Some(code),
        response_body: Some(body.to_string()),
    }
}

pub(crate) fn failed(id: &str, error: &str) -> UploadEvent {
    UploadEvent::Error {
        id: id.into(),
        error: error.to_string(),
    }
}

pub(crate) fn cancelled(id: &str) -> UploadEvent {
    UploadEvent::Cancelled {
        id: id.into(),
        error: None,
    }
}
