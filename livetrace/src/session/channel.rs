//! Backend channel abstraction.
//!
//! The session never talks to a socket or a backend object directly; it gets
//! a [`BackendChannel`] at construction. Every implementation shares the same
//! listener bookkeeping ([`ListenerRegistry`]) and the same delivery rule:
//! inbound messages are queued by the transport and handed to listeners only
//! from [`BackendChannel::dispatch_pending`], on the thread that owns the
//! session.

use livetrace_common::{Envelope, Request};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use crate::domain::ChannelError;

/// Callback invoked once per inbound message.
pub type Listener = Box<dyn FnMut(&Envelope)>;

/// Handle returned by [`BackendChannel::watch`], used to unwatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Asynchronous message channel to the sampling backend.
pub trait BackendChannel {
    /// Send a request without waiting for any response.
    ///
    /// # Errors
    /// Returns an error if the request could not be handed to the transport
    fn post(&self, request: &Request) -> Result<(), ChannelError>;

    /// Register a listener for every inbound message.
    fn watch(&self, listener: Listener) -> ListenerId;

    /// Remove a listener. Once this returns the listener is never called again.
    fn unwatch(&self, id: ListenerId);

    /// Deliver queued inbound messages to listeners, in arrival order.
    ///
    /// Returns the number of messages delivered.
    fn dispatch_pending(&self) -> usize;

    /// True once the transport can neither send nor receive any more.
    fn is_closed(&self) -> bool {
        false
    }
}

// =============================================================================
// LISTENER REGISTRY
// =============================================================================

/// Listener bookkeeping shared by all channel implementations.
#[derive(Default)]
pub struct ListenerRegistry {
    next_id: Cell<u64>,
    listeners: RefCell<Vec<(ListenerId, Rc<RefCell<Listener>>)>>,
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry").field("listeners", &self.len()).finish()
    }
}

impl ListenerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.listeners.borrow_mut().push((id, Rc::new(RefCell::new(listener))));
        id
    }

    pub fn unregister(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_registered(&self, id: ListenerId) -> bool {
        self.listeners.borrow().iter().any(|(existing, _)| *existing == id)
    }

    /// Call every registered listener with `envelope`.
    ///
    /// Listeners may watch or unwatch from inside the callback. A listener
    /// removed mid-dispatch is skipped for the rest of the dispatch.
    pub fn dispatch(&self, envelope: &Envelope) {
        let current: Vec<_> = self.listeners.borrow().clone();
        for (id, listener) in current {
            if !self.is_registered(id) {
                continue;
            }
            // A listener that re-enters dispatch does not see its own message twice
            let Ok(mut listener) = listener.try_borrow_mut() else {
                continue;
            };
            let callback: &mut dyn FnMut(&Envelope) = &mut **listener;
            callback(envelope);
        }
    }
}

// =============================================================================
// IN-MEMORY CHANNEL
// =============================================================================

/// In-process channel that records requests and delivers injected messages.
///
/// Useful for driving a session without a backend: inspect what was posted
/// with [`MemoryChannel::posted`], push replies with
/// [`MemoryChannel::deliver`], then pump them with `dispatch_pending`.
#[derive(Debug, Default)]
pub struct MemoryChannel {
    posted: RefCell<Vec<Request>>,
    inbound: RefCell<VecDeque<Envelope>>,
    listeners: ListenerRegistry,
    closed: Cell<bool>,
}

impl MemoryChannel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests posted so far, oldest first.
    #[must_use]
    pub fn posted(&self) -> Vec<Request> {
        self.posted.borrow().clone()
    }

    /// Drain the record of posted requests.
    pub fn take_posted(&self) -> Vec<Request> {
        std::mem::take(&mut *self.posted.borrow_mut())
    }

    /// Queue an inbound message for the next `dispatch_pending`.
    pub fn deliver(&self, envelope: Envelope) {
        self.inbound.borrow_mut().push_back(envelope);
    }

    /// Make subsequent posts fail with [`ChannelError::Closed`].
    pub fn set_closed(&self, closed: bool) {
        self.closed.set(closed);
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl BackendChannel for MemoryChannel {
    fn post(&self, request: &Request) -> Result<(), ChannelError> {
        if self.closed.get() {
            return Err(ChannelError::Closed);
        }
        self.posted.borrow_mut().push(request.clone());
        Ok(())
    }

    fn watch(&self, listener: Listener) -> ListenerId {
        self.listeners.register(listener)
    }

    fn unwatch(&self, id: ListenerId) {
        self.listeners.unregister(id);
    }

    fn dispatch_pending(&self) -> usize {
        let mut delivered = 0;
        // Pop one at a time so listeners may deliver more messages re-entrantly
        loop {
            let Some(envelope) = self.inbound.borrow_mut().pop_front() else {
                break;
            };
            self.listeners.dispatch(&envelope);
            delivered += 1;
        }
        delivered
    }

    fn is_closed(&self) -> bool {
        self.closed.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn counting_listener(counter: &Rc<Cell<usize>>) -> Listener {
        let counter = Rc::clone(counter);
        Box::new(move |_: &Envelope| counter.set(counter.get() + 1))
    }

    #[test]
    fn test_registry_dispatches_to_all_listeners() {
        let registry = ListenerRegistry::new();
        let a = Rc::new(Cell::new(0));
        let b = Rc::new(Cell::new(0));
        registry.register(counting_listener(&a));
        registry.register(counting_listener(&b));

        registry.dispatch(&Envelope::new("snapshot", json!({})));
        assert_eq!((a.get(), b.get()), (1, 1));
    }

    #[test]
    fn test_unregistered_listener_is_not_called() {
        let registry = ListenerRegistry::new();
        let count = Rc::new(Cell::new(0));
        let id = registry.register(counting_listener(&count));

        assert!(registry.unregister(id));
        assert!(!registry.unregister(id));
        registry.dispatch(&Envelope::new("snapshot", json!({})));
        assert_eq!(count.get(), 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_listener_removed_mid_dispatch_is_skipped() {
        let registry = Rc::new(ListenerRegistry::new());
        let second_calls = Rc::new(Cell::new(0));
        let second_id = Rc::new(Cell::new(None));

        let reg = Rc::clone(&registry);
        let target = Rc::clone(&second_id);
        registry.register(Box::new(move |_: &Envelope| {
            if let Some(id) = target.get() {
                reg.unregister(id);
            }
        }));
        second_id.set(Some(registry.register(counting_listener(&second_calls))));

        registry.dispatch(&Envelope::new("snapshot", json!({})));
        assert_eq!(second_calls.get(), 0);
    }

    #[test]
    fn test_memory_channel_records_and_delivers_in_order() {
        let channel = MemoryChannel::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        channel.watch(Box::new(move |env: &Envelope| sink.borrow_mut().push(env.kind.clone())));

        channel.post(&Request::Pause).unwrap();
        channel.deliver(Envelope::new("first", json!(null)));
        channel.deliver(Envelope::new("second", json!(null)));

        assert_eq!(channel.posted(), vec![Request::Pause]);
        assert!(seen.borrow().is_empty());
        assert_eq!(channel.dispatch_pending(), 2);
        assert_eq!(*seen.borrow(), ["first", "second"]);
    }

    #[test]
    fn test_memory_channel_closed_rejects_posts() {
        let channel = MemoryChannel::new();
        channel.set_closed(true);
        assert!(matches!(channel.post(&Request::Snapshot), Err(ChannelError::Closed)));
        assert!(channel.posted().is_empty());
    }
}
