//! Session Registry: the process-wide `job_key -> Session` map plus each
//! Session's bounded, drop-oldest-non-terminal event queue (SPEC_FULL.md §5).
//!
//! Grounded on `sr-adapters/src/event_manager.rs`'s in-memory map guarded by
//! an `RwLock`, generalized from an event-projection store to a Session
//! registry. The Confirmation Gate (`confirmation_gate.rs`) is a distinct,
//! narrower component; a `Session` owns one.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use apply_domain::entities::SessionId;
use apply_domain::events::Event;
use apply_domain::state_machines::{SessionState, SessionStateMachine, SessionTransition};
use apply_domain::DomainError;
use tokio::sync::{watch, Notify};
use tracing::warn;

use crate::confirmation_gate::ConfirmationGate;

/// A thread-safe, bounded FIFO queue of `Event`s with a drop-oldest-
/// non-terminal overflow policy. §5: "a `done` event always ... rather than
/// being dropped."
struct EventQueue {
    inner: Mutex<EventQueueInner>,
    notify: Notify,
}

struct EventQueueInner {
    events: VecDeque<Event>,
    capacity: usize,
    closed: bool,
}

impl EventQueue {
    fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(EventQueueInner {
                events: VecDeque::with_capacity(capacity.min(256)),
                capacity,
                closed: false,
            }),
            notify: Notify::new(),
        }
    }

    /// Push an event, evicting the oldest buffered non-terminal event if the
    /// queue is at capacity. `done` (terminal) events are never evicted and
    /// are always admitted even over capacity.
    fn push(&self, event: Event, job_key: &str) {
        {
            let mut inner = self.inner.lock().expect("session queue mutex poisoned");
            if inner.events.len() >= inner.capacity && !event.event_type.is_terminal() {
                if let Some(pos) = inner.events.iter().position(|e| !e.event_type.is_terminal()) {
                    inner.events.remove(pos);
                    warn!(job_key, "session event queue full, dropped oldest non-terminal event");
                }
            }
            inner.events.push_back(event);
        }
        self.notify.notify_one();
    }

    /// Pop the next event, waiting if the queue is empty. Returns `None`
    /// once the queue has been closed and drained.
    async fn pop(&self) -> Option<Event> {
        loop {
            {
                let mut inner = self.inner.lock().expect("session queue mutex poisoned");
                if let Some(event) = inner.events.pop_front() {
                    return Some(event);
                }
                if inner.closed {
                    return None;
                }
            }
            self.notify.notified().await;
        }
    }

    fn close(&self) {
        self.inner.lock().expect("session queue mutex poisoned").closed = true;
        self.notify.notify_waiters();
    }
}

/// An in-flight apply/tailor/cover-letter run for one `job_key`. §2/§5.
pub struct Session {
    pub id: SessionId,
    pub job_key: String,
    queue: EventQueue,
    state: Mutex<SessionState>,
    cancelled: AtomicBool,
    pub gate: ConfirmationGate,
    done_tx: watch::Sender<bool>,
    done_rx: watch::Receiver<bool>,
}

impl Session {
    pub(crate) fn new(job_key: String, channel_capacity: usize) -> Self {
        let (done_tx, done_rx) = watch::channel(false);
        Self {
            id: SessionId::new(),
            job_key,
            queue: EventQueue::new(channel_capacity),
            state: Mutex::new(SessionState::Active),
            cancelled: AtomicBool::new(false),
            gate: ConfirmationGate::new(),
            done_tx,
            done_rx,
        }
    }

    /// Wait until this Session reaches `Done` (the terminal event has been
    /// published). Used by the Orchestrator to release the apply-serialization
    /// lease and remove the Session from the Registry once the Worker's
    /// `finally`-equivalent has run, without consuming events the Stream
    /// Adapter still needs to drain.
    pub async fn wait_until_done(&self) {
        let mut rx = self.done_rx.clone();
        if *rx.borrow() {
            return;
        }
        let _ = rx.changed().await;
    }

    /// Publish an event onto this Session's queue. Called by the Worker
    /// thread; never blocks beyond a mutex acquisition.
    pub fn publish(&self, event: Event) {
        let is_terminal = event.event_type.is_terminal();
        self.queue.push(event, &self.job_key);
        if is_terminal {
            self.queue.close();
            self.transition(SessionTransition::Finish).ok();
            self.done_tx.send(true).ok();
        }
    }

    /// Consume the next event, awaiting one if none is buffered. Used by the
    /// Stream Adapter. Returns `None` once the Session is done and drained.
    pub async fn next_event(&self) -> Option<Event> {
        self.queue.pop().await
    }

    pub fn state(&self) -> SessionState {
        *self.state.lock().expect("session state mutex poisoned")
    }

    pub fn transition(&self, transition: SessionTransition) -> Result<SessionState, DomainError> {
        let mut state = self.state.lock().expect("session state mutex poisoned");
        let next = SessionStateMachine::transition(*state, transition)?;
        *state = next;
        Ok(next)
    }

    /// Requests cancellation. Checked by the Worker at well-defined
    /// checkpoints (§5); does not itself interrupt blocking adapter I/O.
    pub fn request_cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Process-wide `job_key -> Session` map. Only the Orchestrator mutates it
/// (§5: "Orchestrator-only Session Registry mutation").
#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, Arc<Session>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Register a new Session for `job_key`, or return `None` if one is
    /// already live (the idempotent start guard, §4.1).
    pub fn register(&self, job_key: &str, channel_capacity: usize) -> Option<Arc<Session>> {
        let mut sessions = self.sessions.lock().expect("session registry mutex poisoned");
        if sessions.contains_key(job_key) {
            return None;
        }
        let session = Arc::new(Session::new(job_key.to_string(), channel_capacity));
        sessions.insert(job_key.to_string(), session.clone());
        Some(session)
    }

    pub fn get(&self, job_key: &str) -> Option<Arc<Session>> {
        self.sessions
            .lock()
            .expect("session registry mutex poisoned")
            .get(job_key)
            .cloned()
    }

    /// Remove a Session. Called once the Worker's `finally`-equivalent has
    /// emitted `done`.
    pub fn remove(&self, job_key: &str) -> Option<Arc<Session>> {
        self.sessions
            .lock()
            .expect("session registry mutex poisoned")
            .remove(job_key)
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().expect("session registry mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_rejects_duplicate_job_key() {
        let registry = SessionRegistry::new();
        assert!(registry.register("acme::swe", 4).is_some());
        assert!(registry.register("acme::swe", 4).is_none());
    }

    #[tokio::test]
    async fn overflow_drops_oldest_non_terminal_never_done() {
        let session = Session::new("acme::swe".to_string(), 2);
        session.publish(Event::progress("acme::swe", "one"));
        session.publish(Event::progress("acme::swe", "two"));
        // Queue at capacity (2); this push should evict "one".
        session.publish(Event::progress("acme::swe", "three"));
        session.publish(Event::done("acme::swe", "finished"));

        let mut seen = vec![];
        while let Some(e) = session.next_event().await {
            seen.push(e.message.clone());
        }
        assert!(!seen.contains(&"one".to_string()));
        assert_eq!(seen.last().unwrap(), "finished");
    }

    #[tokio::test]
    async fn publish_done_transitions_session_to_done() {
        let session = Session::new("acme::swe".to_string(), 4);
        session.publish(Event::done("acme::swe", "bye"));
        assert_eq!(session.state(), SessionState::Done);
        assert!(session.next_event().await.is_some());
        assert!(session.next_event().await.is_none());
    }
}
