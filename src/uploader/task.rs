//! Upload task state machine
//!
//! `Pending → Running → {Completed | Error | Cancelled}`. Terminal states are
//! final; events arriving after one are ignored.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

use super::{UploadOutcome, Uploader};
use crate::config::UploadOptions;
use crate::error::{Result, UploadError};
use crate::events::{Subscription, call_isolated, lock};
use crate::types::{UploadChangeEvent, UploadEvent, UploadId, UploadResult, UploadStatus};

/// Observer invoked on every status change of an upload
///
/// Observers are deduplicated by `Arc` identity: registering the same `Arc`
/// twice has no effect.
pub type ChangeCallback = Arc<dyn Fn(&UploadChangeEvent) + Send + Sync>;

/// Mutable state of an upload, guarded by `UploadInner::state`
#[derive(Default)]
pub(crate) struct TaskState {
    /// Native id, once known
    pub(crate) id: Option<UploadId>,
    pub(crate) status: UploadStatus,
    pub(crate) outcome: Option<UploadOutcome>,
    /// Taken exactly once to resolve `outcome`
    pub(crate) resolver: Option<oneshot::Sender<Result<UploadResult>>>,
    /// One per event kind while the upload is observed
    pub(crate) subscriptions: Vec<Subscription>,
    /// Set while a native start is in flight and the id is still unknown
    pub(crate) awaiting_id: bool,
    /// Events received while `awaiting_id`, replayed once the id is known
    pub(crate) early_events: VecDeque<UploadEvent>,
    /// Events for this id waiting to be applied, in arrival order
    pub(crate) mailbox: VecDeque<UploadEvent>,
    /// Set while one caller is draining `mailbox`
    pub(crate) delivering: bool,
}

pub(crate) struct UploadInner {
    /// Immutable after construction
    pub(crate) options: UploadOptions,
    pub(crate) state: Mutex<TaskState>,
    pub(crate) observers: Mutex<Vec<ChangeCallback>>,
    /// Serializes `start()` so a task never issues two native starts
    pub(crate) start_lock: tokio::sync::Mutex<()>,
    pub(crate) ctx: Uploader,
}

/// One logical upload (cheap to clone; clones are the same task)
///
/// Obtain one with [`Uploader::create`] or [`Uploader::resume`].
#[derive(Clone)]
pub struct Upload {
    pub(crate) inner: Arc<UploadInner>,
}

impl std::fmt::Debug for Upload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = lock(&self.inner.state);
        f.debug_struct("Upload")
            .field("id", &state.id)
            .field("status", &state.status)
            .field("path", &self.inner.options.path)
            .finish()
    }
}

impl Upload {
    pub(crate) fn new(ctx: Uploader, options: UploadOptions) -> Self {
        Self {
            inner: Arc::new(UploadInner {
                options,
                state: Mutex::new(TaskState::default()),
                observers: Mutex::new(Vec::new()),
                start_lock: tokio::sync::Mutex::new(()),
                ctx,
            }),
        }
    }

    /// Native id, `None` until the upload has been started or adopted
    pub fn id(&self) -> Option<UploadId> {
        lock(&self.inner.state).id.clone()
    }

    /// Current status
    pub fn status(&self) -> UploadStatus {
        lock(&self.inner.state).status
    }

    /// Source file path (empty for resumed uploads)
    pub fn path(&self) -> &str {
        &self.inner.options.path
    }

    /// Options this upload was created with
    ///
    /// Resumed uploads carry default options: the original ones cannot be
    /// recovered from the native side.
    pub fn options(&self) -> &UploadOptions {
        &self.inner.options
    }

    /// Whether the upload is transferring
    pub fn is_running(&self) -> bool {
        self.status() == UploadStatus::Running
    }

    /// Whether the upload has reached a terminal state
    pub fn is_terminal(&self) -> bool {
        self.status().is_terminal()
    }

    /// The outcome future, once the upload has been started or adopted
    pub fn outcome(&self) -> Option<UploadOutcome> {
        lock(&self.inner.state).outcome.clone()
    }

    /// Whether `other` is a handle to this same task
    pub fn same_task(&self, other: &Upload) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Add an observer for every status change, progress updates included
    ///
    /// Observers run synchronously in registration order. A panicking
    /// observer is logged and skipped; the others still run.
    pub fn on_change(&self, callback: ChangeCallback) -> &Self {
        let mut observers = lock(&self.inner.observers);
        if !observers.iter().any(|cb| Arc::ptr_eq(cb, &callback)) {
            observers.push(callback);
        }
        self
    }

    /// Add a closure observer
    pub fn on_change_fn<F>(&self, callback: F) -> &Self
    where
        F: Fn(&UploadChangeEvent) + Send + Sync + 'static,
    {
        self.on_change(Arc::new(callback))
    }

    /// Start the upload, or attach to the native upload already running under
    /// its custom id
    ///
    /// Returns the outcome future, which resolves when a terminal event
    /// arrives. Calling `start` again returns the same outcome without a
    /// second native call.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidParameter`](crate::Error::InvalidParameter) if the
    ///   options fail validation; nothing is sent to the provider
    /// - Any error from listing native uploads while reconciling a custom id
    /// - Any error from the provider's `start_upload`; the outcome is
    ///   rejected with the same error and the task is left unregistered
    pub async fn start(&self) -> Result<UploadOutcome> {
        let _start_guard = self.inner.start_lock.lock().await;

        if let Some(outcome) = self.started_outcome() {
            return Ok(outcome);
        }

        self.inner.options.validate()?;

        if let Some(outcome) = self.adopt_native().await? {
            return Ok(outcome);
        }

        let (resolver, outcome) = UploadOutcome::channel();
        {
            let mut state = lock(&self.inner.state);
            state.outcome = Some(outcome.clone());
            state.resolver = Some(resolver);
            state.awaiting_id = true;
            state.early_events.clear();
        }
        self.attach_listeners();

        let provider = &self.inner.ctx.provider;
        match provider.start_upload(&self.inner.options).await {
            Ok(id) => {
                tracing::info!(
                    upload_id = %id,
                    path = %self.inner.options.path,
                    provider = provider.name(),
                    "upload started"
                );
                self.mark_started(id);
                Ok(outcome)
            }
            Err(e) => {
                tracing::error!(
                    path = %self.inner.options.path,
                    error = %e,
                    "native start failed"
                );
                self.cleanup();
                self.resolve(Err(e.clone()));
                Err(e)
            }
        }
    }

    /// Ask the provider to cancel this upload
    ///
    /// Returns the provider's acknowledgment. The status does not change
    /// here: the upload becomes `Cancelled` when the provider emits the
    /// `cancelled` event.
    ///
    /// # Errors
    ///
    /// - [`UploadError::NotStarted`] if the upload has no id yet; the
    ///   provider is not called
    /// - Any error from the provider; the upload stops being observed and its
    ///   outcome is rejected with the same error
    pub async fn cancel(&self) -> Result<bool> {
        let id = self.id().ok_or(UploadError::NotStarted)?;

        match self.inner.ctx.provider.cancel_upload(&id).await {
            Ok(acknowledged) => {
                tracing::debug!(upload_id = %id, acknowledged, "cancel requested");
                Ok(acknowledged)
            }
            Err(e) => {
                tracing::error!(upload_id = %id, error = %e, "native cancel failed");
                self.cleanup();
                self.resolve(Err(e.clone()));
                Err(e)
            }
        }
    }

    /// Cancel and wait for the upload's terminal outcome
    ///
    /// The result is whatever terminal event the provider delivers next;
    /// usually `Cancelled`, but an upload that completes before the cancel
    /// takes effect resolves as `Completed`.
    pub async fn cancel_and_wait(&self) -> Result<UploadResult> {
        let outcome = self.outcome().ok_or(UploadError::NotStarted)?;
        self.cancel().await?;
        outcome.await
    }

    /// The outcome of an upload that already has an id
    fn started_outcome(&self) -> Option<UploadOutcome> {
        let state = lock(&self.inner.state);
        match (&state.id, &state.outcome) {
            (Some(_), Some(outcome)) => Some(outcome.clone()),
            _ => None,
        }
    }

    /// Record the id returned by a native start and go `Running`
    ///
    /// The `Running` change and the replay of early events are delivered
    /// before any live event for the id.
    fn mark_started(&self, id: UploadId) {
        let started = {
            let mut state = lock(&self.inner.state);
            state.id = Some(id.clone());
            state.awaiting_id = false;

            let early = std::mem::take(&mut state.early_events);
            let before = state.mailbox.len();
            state.mailbox.extend(early.into_iter().filter(|e| e.id() == &id));
            let replayed = state.mailbox.len() - before;
            if replayed > 0 {
                tracing::debug!(upload_id = %id, replayed, "replaying early events");
            }

            // Nothing could be delivered for this id while it was unknown
            state.delivering = true;

            let started = !state.status.is_terminal();
            if started {
                state.status = UploadStatus::Running;
                self.inner.ctx.registry.insert(id, self);
            }
            started
        };

        if started {
            self.notify(&UploadChangeEvent::status(UploadStatus::Running));
        }
        self.drain_mailbox();
    }

    /// Deliver a change to every observer
    pub(crate) fn notify(&self, change: &UploadChangeEvent) {
        let observers = lock(&self.inner.observers).clone();
        for observer in observers {
            call_isolated("upload change observer", || observer(change));
        }
    }

    /// Resolve the outcome; later calls are no-ops
    pub(crate) fn resolve(&self, result: Result<UploadResult>) {
        let resolver = lock(&self.inner.state).resolver.take();
        if let Some(resolver) = resolver {
            // The receiver lives inside the outcome we still hold, so this
            // only fails if the outcome was never stored
            resolver.send(result).ok();
        }
    }
}
