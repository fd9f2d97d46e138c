//! Native event multiplexer
//!
//! The native provider reports every upload on four process-wide streams,
//! one per [`EventKind`], named `<prefix><kind>`. [`EventEmitter`] keeps a
//! listener table keyed by those names and dispatches each event to every
//! listener of its stream. Per-upload routing happens in the listeners: an
//! upload task subscribes once per kind and ignores events for other ids.
//!
//! Every emitted event is also published on a broadcast channel for async
//! consumers ([`EventEmitter::subscribe`], [`EventEmitter::stream`]).

use futures::{Stream, StreamExt};
use std::collections::{HashMap, HashSet};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

use crate::error::{Error, Result, UploadError};
use crate::provider::NativeUploadProvider;
use crate::types::{EventKind, UploadEvent, UploadId};

/// Callback invoked for each event on a stream
pub type EventListener = Arc<dyn Fn(&UploadEvent) + Send + Sync>;

struct ListenerEntry {
    id: u64,
    listener: EventListener,
}

struct EmitterInner {
    prefix: String,
    listeners: Mutex<HashMap<String, Vec<ListenerEntry>>>,
    activated: Mutex<HashSet<String>>,
    next_listener_id: AtomicU64,
    event_tx: broadcast::Sender<UploadEvent>,
}

/// Listener table for the native event streams (cheap to clone)
#[derive(Clone)]
pub struct EventEmitter {
    inner: Arc<EmitterInner>,
}

/// Handle to one registered listener
///
/// Dropping a `Subscription` does not remove the listener; call
/// [`Subscription::remove`]. Removal is idempotent.
pub struct Subscription {
    emitter: Weak<EmitterInner>,
    stream: String,
    id: u64,
    removed: AtomicBool,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("stream", &self.stream)
            .field("id", &self.id)
            .field("removed", &self.removed.load(Ordering::SeqCst))
            .finish()
    }
}

impl Subscription {
    /// Stream name this listener is attached to
    pub fn stream(&self) -> &str {
        &self.stream
    }

    /// Whether [`remove`](Self::remove) has been called
    pub fn is_removed(&self) -> bool {
        self.removed.load(Ordering::SeqCst)
    }

    /// Detach the listener from its stream
    pub fn remove(&self) {
        if self.removed.swap(true, Ordering::SeqCst) {
            return;
        }
        let Some(inner) = self.emitter.upgrade() else {
            return;
        };
        let mut listeners = lock(&inner.listeners);
        if let Some(entries) = listeners.get_mut(&self.stream) {
            entries.retain(|entry| entry.id != self.id);
            if entries.is_empty() {
                listeners.remove(&self.stream);
            }
        }
    }
}

impl EventEmitter {
    /// Create an emitter for streams named `<prefix><kind>`
    pub fn new(prefix: impl Into<String>, channel_capacity: usize) -> Self {
        let (event_tx, _rx) = broadcast::channel(channel_capacity.max(1));
        Self {
            inner: Arc::new(EmitterInner {
                prefix: prefix.into(),
                listeners: Mutex::new(HashMap::new()),
                activated: Mutex::new(HashSet::new()),
                next_listener_id: AtomicU64::new(1),
                event_tx,
            }),
        }
    }

    /// Stream name prefix
    pub fn prefix(&self) -> &str {
        &self.inner.prefix
    }

    /// Full stream name for `kind`
    pub fn stream_name(&self, kind: EventKind) -> String {
        kind.stream_name(&self.inner.prefix)
    }

    /// Listen to every event of `kind`, whatever its upload id
    pub fn add_listener<F>(&self, kind: EventKind, listener: F) -> Subscription
    where
        F: Fn(&UploadEvent) + Send + Sync + 'static,
    {
        let stream = self.stream_name(kind);
        let id = self.inner.next_listener_id.fetch_add(1, Ordering::SeqCst);
        lock(&self.inner.listeners)
            .entry(stream.clone())
            .or_default()
            .push(ListenerEntry {
                id,
                listener: Arc::new(listener),
            });

        tracing::trace!(stream = %stream, listener_id = id, "event listener added");

        Subscription {
            emitter: Arc::downgrade(&self.inner),
            stream,
            id,
            removed: AtomicBool::new(false),
        }
    }

    /// Listen to events of `kind` for one upload id, or all ids when `None`
    pub fn add_listener_for<F>(
        &self,
        kind: EventKind,
        upload_id: Option<UploadId>,
        listener: F,
    ) -> Subscription
    where
        F: Fn(&UploadEvent) + Send + Sync + 'static,
    {
        self.add_listener(kind, move |event| {
            if upload_id.as_ref().is_none_or(|id| event.id() == id) {
                listener(event);
            }
        })
    }

    /// Number of listeners currently attached to the stream of `kind`
    pub fn listener_count(&self, kind: EventKind) -> usize {
        lock(&self.inner.listeners)
            .get(&self.stream_name(kind))
            .map_or(0, Vec::len)
    }

    /// Dispatch a typed event to its stream's listeners and the broadcast channel
    ///
    /// Listeners run synchronously, in registration order, outside the table
    /// lock, so a listener may add or remove subscriptions. A panicking
    /// listener is logged and skipped.
    pub fn emit(&self, event: UploadEvent) {
        let stream = self.stream_name(event.kind());
        let listeners: Vec<EventListener> = lock(&self.inner.listeners)
            .get(&stream)
            .map(|entries| entries.iter().map(|e| e.listener.clone()).collect())
            .unwrap_or_default();

        tracing::trace!(
            stream = %stream,
            upload_id = %event.id(),
            listeners = listeners.len(),
            "dispatching upload event"
        );

        for listener in listeners {
            call_isolated("event listener", || listener(&event));
        }

        // No receivers is fine; the event has already reached the listeners
        self.inner.event_tx.send(event).ok();
    }

    /// Decode a raw native payload received on `stream_name` and dispatch it
    pub fn emit_raw(&self, stream_name: &str, payload: serde_json::Value) -> Result<()> {
        let event = self.decode(stream_name, payload)?;
        self.emit(event);
        Ok(())
    }

    /// Decode a raw native payload into a typed event
    ///
    /// The stream name selects the variant; the payload carries camelCase
    /// fields.
    pub fn decode(&self, stream_name: &str, payload: serde_json::Value) -> Result<UploadEvent> {
        let kind = stream_name
            .strip_prefix(self.prefix())
            .and_then(EventKind::from_name)
            .ok_or_else(|| UploadError::UnknownEvent {
                name: stream_name.to_string(),
            })?;

        let serde_json::Value::Object(mut fields) = payload else {
            return Err(Error::Serialization(format!(
                "{} payload must be a JSON object",
                stream_name
            )));
        };
        fields.insert("type".into(), serde_json::Value::from(kind.as_str()));

        Ok(serde_json::from_value(serde_json::Value::Object(fields))?)
    }

    /// Subscribe to every emitted event
    ///
    /// Subscribers that fall behind by more than the channel capacity
    /// receive `RecvError::Lagged`.
    pub fn subscribe(&self) -> broadcast::Receiver<UploadEvent> {
        self.inner.event_tx.subscribe()
    }

    /// Async stream of emitted events for one upload id, or all ids when `None`
    ///
    /// Lag gaps are skipped with a warning.
    pub fn stream(
        &self,
        upload_id: Option<UploadId>,
    ) -> impl Stream<Item = UploadEvent> + Send + use<> {
        BroadcastStream::new(self.subscribe()).filter_map(move |item| {
            let keep = match item {
                Ok(event) if upload_id.as_ref().is_none_or(|id| event.id() == id) => Some(event),
                Ok(_) => None,
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "upload event stream lagged, events dropped");
                    None
                }
            };
            futures::future::ready(keep)
        })
    }

    /// Activate every event stream on platforms that need it
    ///
    /// Streams already activated through this emitter are skipped.
    pub(crate) fn activate(&self, provider: &dyn NativeUploadProvider) -> Result<()> {
        if !provider.platform().requires_event_activation() {
            return Ok(());
        }

        for kind in EventKind::ALL {
            let stream = self.stream_name(kind);
            if lock(&self.inner.activated).contains(&stream) {
                continue;
            }
            provider.activate_event(&stream)?;
            lock(&self.inner.activated).insert(stream.clone());
            tracing::debug!(stream = %stream, provider = provider.name(), "event stream activated");
        }
        Ok(())
    }

    /// Whether `kind` has been activated with the provider
    pub fn is_activated(&self, kind: EventKind) -> bool {
        lock(&self.inner.activated).contains(&self.stream_name(kind))
    }
}

/// Lock a std mutex, recovering the data if a panicking holder poisoned it
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Run a caller-supplied callback, containing any panic it raises
pub(crate) fn call_isolated(context: &'static str, f: impl FnOnce()) {
    if let Err(panic) = catch_unwind(AssertUnwindSafe(f)) {
        let message = panic
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        tracing::error!(context, panic = %message, "callback panicked; continuing delivery");
    }
}
