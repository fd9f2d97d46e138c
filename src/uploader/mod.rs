//! Upload tracking split into focused submodules.
//!
//! The [`Uploader`] context and its [`Upload`] tasks are organized by concern:
//! - [`task`] - Per-upload state machine (start, cancel, observers)
//! - [`outcome`] - The single-resolution outcome future
//! - [`listeners`] - Event subscriptions, routing and cleanup
//! - [`reconcile`] - Create/resume/list against native state
//! - [`legacy`] - Direct pass-through calls for callers not using tasks

mod legacy;
mod listeners;
mod outcome;
mod reconcile;
mod task;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

pub use outcome::UploadOutcome;
pub use task::{ChangeCallback, Upload};
pub(crate) use task::UploadInner;

use std::sync::Arc;

use futures::Stream;

use crate::config::Config;
use crate::error::Result;
use crate::events::EventEmitter;
use crate::provider::NativeUploadProvider;
use crate::registry::UploadRegistry;
use crate::types::{UploadEvent, UploadId};

/// Entry point: owns the provider, event streams and registry (cheap to clone)
///
/// Each `Uploader` is an independent context; there is no process-wide
/// state. Native bridges push events with [`Uploader::dispatch`] or
/// [`Uploader::dispatch_raw`].
///
/// # Examples
///
/// ```no_run
/// use background_upload::provider::NoOpProvider;
/// use background_upload::{Config, Uploader, UploadOptions};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let uploader = Uploader::new(Arc::new(NoOpProvider), Config::default())?;
///
///     let upload = uploader.create(
///         UploadOptions::new("https://api.example.com/upload", "/tmp/video.mp4")
///             .custom_upload_id("video-1"),
///     );
///     upload.on_change_fn(|change| println!("{:?}", change));
///
///     let outcome = upload.start().await?;
///     let result = outcome.await?;
///     println!("{} {:?}", result.status, result.response_code);
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct Uploader {
    /// Native upload service
    pub(crate) provider: Arc<dyn NativeUploadProvider>,
    /// Listener table for the native event streams
    pub(crate) events: EventEmitter,
    /// Live uploads by id
    pub(crate) registry: UploadRegistry,
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
}

impl Uploader {
    /// Create a new Uploader
    ///
    /// Validates `config` and, on platforms that need it, activates the four
    /// native event streams with the provider.
    pub fn new(provider: Arc<dyn NativeUploadProvider>, config: Config) -> Result<Self> {
        config.validate()?;

        let events = EventEmitter::new(config.event_prefix.clone(), config.event_channel_capacity);
        events.activate(provider.as_ref())?;

        tracing::info!(
            provider = provider.name(),
            platform = ?provider.platform(),
            event_prefix = %config.event_prefix,
            "uploader initialized"
        );

        Ok(Self {
            provider,
            events,
            registry: UploadRegistry::new(),
            config: Arc::new(config),
        })
    }

    /// The native event streams
    pub fn events(&self) -> &EventEmitter {
        &self.events
    }

    /// The registry of live uploads
    pub fn registry(&self) -> &UploadRegistry {
        &self.registry
    }

    /// The current configuration
    pub fn config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// The native provider
    pub fn provider(&self) -> Arc<dyn NativeUploadProvider> {
        Arc::clone(&self.provider)
    }

    /// Deliver a typed native event
    pub fn dispatch(&self, event: UploadEvent) {
        self.events.emit(event);
    }

    /// Decode and deliver a raw native event received on `stream_name`
    pub fn dispatch_raw(&self, stream_name: &str, payload: serde_json::Value) -> Result<()> {
        self.events.emit_raw(stream_name, payload)
    }

    /// Subscribe to every native event
    ///
    /// Multiple subscribers are supported; each receives all events.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<UploadEvent> {
        self.events.subscribe()
    }

    /// Async stream of native events for one upload, or all uploads when `None`
    pub fn event_stream(
        &self,
        upload_id: Option<UploadId>,
    ) -> impl Stream<Item = UploadEvent> + Send + use<> {
        self.events.stream(upload_id)
    }
}
