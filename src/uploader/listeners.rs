//! Event subscriptions, per-id routing and cleanup for upload tasks

use super::Upload;
use super::task::TaskState;
use crate::events::{Subscription, lock};
use crate::types::{EventKind, UploadChangeEvent, UploadEvent, UploadResult};

impl Upload {
    /// Subscribe this task to all four event streams
    ///
    /// Each listener holds a strong handle, which keeps the task alive while
    /// it is observed. Any previous subscriptions are released.
    pub(crate) fn attach_listeners(&self) {
        let events = &self.inner.ctx.events;
        let subscriptions: Vec<Subscription> = EventKind::ALL
            .into_iter()
            .map(|kind| {
                let upload = self.clone();
                events.add_listener(kind, move |event| upload.handle_event(event))
            })
            .collect();

        let stale = std::mem::replace(&mut lock(&self.inner.state).subscriptions, subscriptions);
        for subscription in stale {
            subscription.remove();
        }
        tracing::debug!(path = %self.inner.options.path, "upload listeners attached");
    }

    /// Apply one native event to this task
    ///
    /// Events for other ids are ignored. Before the id is known (native start
    /// in flight) events are buffered for replay. Events for this id are
    /// applied one at a time in arrival order, whichever thread emits them.
    pub(crate) fn handle_event(&self, event: &UploadEvent) {
        {
            let mut guard = lock(&self.inner.state);
            let state = &mut *guard;

            if state.id.is_none() {
                if state.awaiting_id {
                    self.buffer_early(state, event);
                }
                return;
            }
            if state.id.as_ref() != Some(event.id()) {
                return;
            }

            state.mailbox.push_back(event.clone());
            if state.delivering {
                return;
            }
            state.delivering = true;
        }
        self.drain_mailbox();
    }

    /// Hold an event that arrived before the native id
    ///
    /// Only progress events count against the capacity; terminal events are
    /// never evicted.
    fn buffer_early(&self, state: &mut TaskState, event: &UploadEvent) {
        let capacity = self.inner.ctx.config.early_event_capacity;
        if capacity == 0 {
            return;
        }

        if !event.is_terminal() {
            let buffered = state.early_events.iter().filter(|e| !e.is_terminal()).count();
            if buffered >= capacity {
                if let Some(oldest) = state.early_events.iter().position(|e| !e.is_terminal()) {
                    state.early_events.remove(oldest);
                }
                tracing::warn!(
                    capacity,
                    "early upload event buffer full, oldest progress event dropped"
                );
            }
        }
        state.early_events.push_back(event.clone());
    }

    /// Apply queued events until the mailbox is empty
    ///
    /// Only the caller that set `delivering` drains; events queued meanwhile
    /// (from other threads or from observers) are picked up by this loop.
    pub(crate) fn drain_mailbox(&self) {
        loop {
            let event = {
                let mut state = lock(&self.inner.state);
                match state.mailbox.pop_front() {
                    Some(event) => event,
                    None => {
                        state.delivering = false;
                        return;
                    }
                }
            };
            self.apply_event(&event);
        }
    }

    fn apply_event(&self, event: &UploadEvent) {
        {
            let mut state = lock(&self.inner.state);
            if state.status.is_terminal() {
                tracing::trace!(
                    upload_id = %event.id(),
                    kind = %event.kind(),
                    "event after terminal state ignored"
                );
                return;
            }
            state.status = event.status();
        }

        self.notify(&UploadChangeEvent::from(event));

        if let Some(result) = UploadResult::from_event(event) {
            tracing::info!(
                upload_id = %event.id(),
                status = %result.status,
                response_code = ?result.response_code,
                "upload finished"
            );
            // Unregistered before anyone awaiting the outcome wakes up
            self.cleanup();
            self.resolve(Ok(result));
        }
    }

    /// Release subscriptions and the registry entry
    ///
    /// Idempotent; status and outcome are left untouched.
    pub(crate) fn cleanup(&self) {
        let (subscriptions, id) = {
            let mut state = lock(&self.inner.state);
            state.awaiting_id = false;
            state.early_events.clear();
            (std::mem::take(&mut state.subscriptions), state.id.clone())
        };

        for subscription in &subscriptions {
            subscription.remove();
        }
        if let Some(id) = id {
            self.inner.ctx.registry.release(&id, self);
            if !subscriptions.is_empty() {
                tracing::debug!(upload_id = %id, "upload listeners released");
            }
        }
    }
}
