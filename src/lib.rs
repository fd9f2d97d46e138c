//! # background-upload
//!
//! Client-side facade over a platform's native background HTTP upload
//! service.
//!
//! ## Design Philosophy
//!
//! background-upload is designed to be:
//! - **Provider-agnostic** - The native service sits behind one trait; the
//!   crate never performs HTTP itself
//! - **Task-oriented** - Each upload is a small state machine with an
//!   awaitable outcome
//! - **Reconciling** - Uploads that outlive the process can be found and
//!   adopted again by id
//! - **Event-driven** - Native progress and lifecycle events are routed to
//!   the task they belong to, and republished for any subscriber
//!
//! ## Quick Start
//!
//! ```no_run
//! use background_upload::provider::NoOpProvider;
//! use background_upload::{Config, UploadOptions, Uploader};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Swap NoOpProvider for the platform bridge
//!     let uploader = Uploader::new(Arc::new(NoOpProvider), Config::default())?;
//!
//!     let upload = uploader.create(
//!         UploadOptions::new("https://api.example.com/upload", "/tmp/video.mp4")
//!             .custom_upload_id("video-1")
//!             .header("Authorization", "Bearer token"),
//!     );
//!     upload.on_change_fn(|change| {
//!         if let Some(progress) = change.progress {
//!             println!("{:.0}%", progress);
//!         }
//!     });
//!
//!     let result = upload.start().await?.await?;
//!     println!("finished: {} {:?}", result.status, result.response_code);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Native event multiplexer
pub mod events;
/// Native upload provider abstraction
pub mod provider;
/// Lookup table of live uploads
pub mod registry;
/// Core types and events
pub mod types;
/// Upload tasks and the uploader context (decomposed into focused submodules)
pub mod uploader;

// Re-export commonly used types
pub use config::{Config, HttpMethod, NotificationOptions, UploadOptions, UploadType};
pub use error::{Error, Result, UploadError};
pub use events::{EventEmitter, EventListener, Subscription};
pub use provider::{NativeUploadProvider, NoOpProvider};
pub use registry::UploadRegistry;
pub use types::{
    EventKind, FileInfo, NativeUploadInfo, NativeUploadState, Platform, UploadChangeEvent,
    UploadEvent, UploadId, UploadResult, UploadStatus,
};
pub use uploader::{ChangeCallback, Upload, UploadOutcome, Uploader};
