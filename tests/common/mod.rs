//! Common test utilities for background-upload integration tests

use async_trait::async_trait;
use background_upload::{
    EventEmitter, NativeUploadInfo, NativeUploadProvider, NativeUploadState, Platform, Result,
    UploadEvent, UploadId, UploadOptions,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct BridgeUpload {
    state: NativeUploadState,
    cancel: Arc<AtomicBool>,
}

/// In-process stand-in for a native background upload service
///
/// Each started upload runs on a spawned task that reports `steps` progress
/// events `step_delay` apart and then completes with HTTP 200, unless it is
/// cancelled first. Events go to whichever emitter is connected at the time,
/// so a second `Uploader` can pick up uploads started by the first.
pub struct FakeBridge {
    emitter: Mutex<Option<EventEmitter>>,
    uploads: Mutex<HashMap<UploadId, BridgeUpload>>,
    steps: u64,
    step_delay: Duration,
    next_id: AtomicUsize,
    starts: AtomicUsize,
}

impl FakeBridge {
    pub fn new(steps: u64, step_delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            emitter: Mutex::new(None),
            uploads: Mutex::new(HashMap::new()),
            steps,
            step_delay,
            next_id: AtomicUsize::new(1),
            starts: AtomicUsize::new(0),
        })
    }

    /// Route future events to `emitter`
    pub fn connect(&self, emitter: &EventEmitter) {
        *self.emitter.lock().unwrap() = Some(emitter.clone());
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    fn emit(&self, event: UploadEvent) {
        let emitter = self.emitter.lock().unwrap().clone();
        if let Some(emitter) = emitter {
            emitter.emit(event);
        }
    }

    fn set_state(&self, id: &UploadId, state: NativeUploadState) {
        if let Some(upload) = self.uploads.lock().unwrap().get_mut(id) {
            upload.state = state;
        }
    }

    async fn run(self: Arc<Self>, id: UploadId, cancel: Arc<AtomicBool>) {
        let total = 1024 * self.steps;
        for step in 1..=self.steps {
            tokio::time::sleep(self.step_delay).await;
            if cancel.load(Ordering::SeqCst) {
                self.set_state(&id, NativeUploadState::Cancelled);
                self.emit(UploadEvent::Cancelled {
                    id,
                    error: Some("cancelled by user".into()),
                });
                return;
            }
            self.emit(UploadEvent::Progress {
                id: id.clone(),
                progress: (step * 100 / self.steps) as f64,
                uploaded_bytes: Some(1024 * step),
                total_bytes: Some(total),
            });
        }

        self.set_state(&id, NativeUploadState::Completed);
        self.emit(UploadEvent::Completed {
            id,
            response_code: Some(200),
            response_body: Some("stored".into()),
        });
    }
}

/// Provider handle; the bridge needs an owned `Arc` to spawn its workers
pub struct BridgeProvider(pub Arc<FakeBridge>);

#[async_trait]
impl NativeUploadProvider for BridgeProvider {
    async fn start_upload(&self, options: &UploadOptions) -> Result<UploadId> {
        let bridge = &self.0;
        bridge.starts.fetch_add(1, Ordering::SeqCst);

        let id = match &options.custom_upload_id {
            Some(custom) => UploadId::from(custom.as_str()),
            None => UploadId::new(format!(
                "bridge-{}",
                bridge.next_id.fetch_add(1, Ordering::SeqCst)
            )),
        };

        let cancel = Arc::new(AtomicBool::new(false));
        bridge.uploads.lock().unwrap().insert(
            id.clone(),
            BridgeUpload {
                state: NativeUploadState::Running,
                cancel: cancel.clone(),
            },
        );
        tokio::spawn(bridge.clone().run(id.clone(), cancel));
        Ok(id)
    }

    async fn cancel_upload(&self, id: &UploadId) -> Result<bool> {
        let uploads = self.0.uploads.lock().unwrap();
        Ok(match uploads.get(id) {
            Some(upload) if upload.state == NativeUploadState::Running => {
                upload.cancel.store(true, Ordering::SeqCst);
                true
            }
            _ => false,
        })
    }

    async fn list_uploads(&self) -> Result<Vec<NativeUploadInfo>> {
        Ok(self
            .0
            .uploads
            .lock()
            .unwrap()
            .iter()
            .map(|(id, upload)| NativeUploadInfo::new(id.clone(), upload.state))
            .collect())
    }

    async fn get_file_info(&self, path: &str) -> Result<serde_json::Value> {
        let name = path.rsplit('/').next().unwrap_or(path);
        Ok(serde_json::json!({
            "exists": true,
            "name": name,
            "extension": name.rsplit('.').next(),
            "size": "2048",
            "mimeType": "application/octet-stream",
        }))
    }

    fn platform(&self) -> Platform {
        Platform::Android
    }

    fn name(&self) -> &'static str {
        "fake-bridge"
    }
}
