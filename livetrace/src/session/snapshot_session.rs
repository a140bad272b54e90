//! # Snapshot Session
//!
//! Owns the poll cadence and the single current [`Snapshot`].
//!
//! ## Lifecycle
//!
//! ```text
//!                mount()                        unmount() / drop
//! Uninitialized ─────────► Subscribed ─────────────────────────► TornDown
//!                          │  ▲
//!     tick (period due) ───┘  │   send {"type":"snapshot"}
//!     "snapshot" message ─────┤   decode, replace current snapshot
//!     set_target(rule) ───────┘   send {"type":"process","rule":..}
//! ```
//!
//! ## Consistency
//!
//! Responses are not correlated with requests: whichever `"snapshot"` message
//! arrives last wins. The decoded snapshot is stored behind an `Rc` and
//! swapped whole, so a view holding the previous `Rc` keeps a consistent
//! snapshot (cost maps and symbols from the same capture) while the session
//! moves on.

use livetrace_common::{Envelope, Request, Snapshot};
use log::{debug, info, trace, warn};
use serde::Deserialize;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Instant;

use super::channel::{BackendChannel, ListenerId};
use super::timer::PollTimer;
use crate::config::SessionConfig;
use crate::domain::{Rule, SessionError, Tid};

/// Lifecycle state of a [`SnapshotSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Subscribed,
    TornDown,
}

/// Diagnostic counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub requests_sent: usize,
    pub send_failures: usize,
    pub snapshots_received: usize,
    pub decode_failures: usize,
}

/// State written by the channel listener and read by the session.
#[derive(Debug, Default)]
struct Inbox {
    current: Option<Rc<Snapshot>>,
    accepting: bool,
    stats: SessionStats,
}

impl Inbox {
    fn receive(&mut self, envelope: &Envelope) {
        if !self.accepting {
            return;
        }
        if !envelope.is_snapshot() {
            trace!("Ignoring {:?} message", envelope.kind);
            return;
        }

        match decode_snapshot(envelope) {
            Ok(snapshot) => {
                debug!(
                    "Snapshot: pid={} samples={} points={}",
                    snapshot.process_id,
                    snapshot.samples,
                    snapshot.instruction_point_map.len()
                );
                self.current = Some(Rc::new(snapshot));
                self.stats.snapshots_received += 1;
            }
            Err(e) => {
                // Keep showing the last good snapshot
                warn!("{e}");
                self.stats.decode_failures += 1;
            }
        }
    }
}

/// Decode the payload of a `"snapshot"` message.
///
/// # Errors
/// Returns [`SessionError::SnapshotDecode`] if the payload does not match the
/// snapshot schema
pub fn decode_snapshot(envelope: &Envelope) -> Result<Snapshot, SessionError> {
    Snapshot::deserialize(&envelope.data).map_err(SessionError::SnapshotDecode)
}

/// Polls the backend for snapshots and keeps the latest one.
///
/// Single-threaded: the session, its channel and every reader of
/// [`SnapshotSession::current`] live on the same event loop.
pub struct SnapshotSession {
    channel: Rc<dyn BackendChannel>,
    rule: Rule,
    state: SessionState,
    timer: PollTimer,
    listener: Option<ListenerId>,
    inbox: Rc<RefCell<Inbox>>,
}

impl SnapshotSession {
    #[must_use]
    pub fn new(channel: Rc<dyn BackendChannel>, config: &SessionConfig) -> Self {
        Self {
            channel,
            rule: Rule::new(config.rule.clone()),
            state: SessionState::Uninitialized,
            timer: PollTimer::new(config.poll_interval),
            listener: None,
            inbox: Rc::new(RefCell::new(Inbox::default())),
        }
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn rule(&self) -> &Rule {
        &self.rule
    }

    /// The most recently received snapshot, if any.
    #[must_use]
    pub fn current(&self) -> Option<Rc<Snapshot>> {
        self.inbox.borrow().current.clone()
    }

    #[must_use]
    pub fn stats(&self) -> SessionStats {
        self.inbox.borrow().stats
    }

    /// When the next snapshot request is due.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timer.deadline()
    }

    /// Subscribe: listen for snapshots, select the target process, request a
    /// first snapshot and start the poll timer.
    ///
    /// Mounting an already subscribed session does nothing.
    ///
    /// # Errors
    /// Returns [`SessionError::TornDown`] if the session was already torn down
    pub fn mount(&mut self, now: Instant) -> Result<(), SessionError> {
        match self.state {
            SessionState::TornDown => return Err(SessionError::TornDown),
            SessionState::Subscribed => {
                debug!("Session already subscribed");
                return Ok(());
            }
            SessionState::Uninitialized => {}
        }

        let inbox: Weak<RefCell<Inbox>> = Rc::downgrade(&self.inbox);
        let id = self.channel.watch(Box::new(move |envelope: &Envelope| {
            if let Some(inbox) = inbox.upgrade() {
                inbox.borrow_mut().receive(envelope);
            }
        }));
        self.listener = Some(id);
        self.inbox.borrow_mut().accepting = true;
        self.state = SessionState::Subscribed;

        info!("Session subscribed (target: {}, poll every {:?})", self.rule, self.timer.interval());
        self.send(&Request::Process { rule: self.rule.as_str().to_string() });
        self.send(&Request::Snapshot);
        self.timer.start(now);
        Ok(())
    }

    /// Advance the poll timer; sends a snapshot request when a period is due.
    ///
    /// Returns true if a request was sent.
    pub fn tick(&mut self, now: Instant) -> bool {
        if self.state != SessionState::Subscribed || !self.timer.poll(now) {
            return false;
        }
        self.send(&Request::Snapshot);
        true
    }

    /// Change the target process rule.
    ///
    /// While subscribed, the new rule is sent at once rather than on the next
    /// tick. The current snapshot is kept until the backend sends a new one.
    pub fn set_target(&mut self, rule: impl Into<Rule>) {
        let rule = rule.into();
        if self.state == SessionState::TornDown {
            debug!("Ignoring target change to {rule} after teardown");
            return;
        }
        if rule == self.rule {
            return;
        }

        info!("Target changed: {} -> {}", self.rule, rule);
        self.rule = rule;
        if self.state == SessionState::Subscribed {
            self.send(&Request::Process { rule: self.rule.as_str().to_string() });
        }
    }

    /// Re-select the current target, restarting the trace.
    pub fn restart(&mut self) {
        if self.ensure_subscribed("restart") {
            self.send(&Request::Process { rule: self.rule.as_str().to_string() });
        }
    }

    /// Toggle sampling pause in the backend.
    pub fn pause(&mut self) {
        if self.ensure_subscribed("pause") {
            self.send(&Request::Pause);
        }
    }

    /// Select the thread whose stack and costs the backend reports.
    pub fn select_thread(&mut self, tid: Tid) {
        if self.ensure_subscribed("thread selection") {
            self.send(&Request::Thread { thread: tid.0 });
        }
    }

    /// Stop polling and stop listening. Idempotent.
    ///
    /// After this returns no request is sent and the current snapshot never
    /// changes again.
    pub fn unmount(&mut self) {
        if self.state == SessionState::TornDown {
            return;
        }

        self.timer.stop();
        if let Some(id) = self.listener.take() {
            self.channel.unwatch(id);
        }
        self.inbox.borrow_mut().accepting = false;
        self.state = SessionState::TornDown;
        info!("Session torn down");
    }

    fn ensure_subscribed(&self, action: &str) -> bool {
        let subscribed = self.state == SessionState::Subscribed;
        if !subscribed {
            debug!("Ignoring {action} in state {:?}", self.state);
        }
        subscribed
    }

    fn send(&self, request: &Request) {
        // Fire-and-forget: the next tick is the retry
        let result = self.channel.post(request);
        let mut inbox = self.inbox.borrow_mut();
        match result {
            Ok(()) => inbox.stats.requests_sent += 1,
            Err(e) => {
                warn!("Failed to send {request:?}: {e}");
                inbox.stats.send_failures += 1;
            }
        }
    }
}

impl Drop for SnapshotSession {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::channel::MemoryChannel;
    use serde_json::json;
    use std::time::Duration;

    fn setup() -> (Rc<MemoryChannel>, SnapshotSession) {
        let channel = Rc::new(MemoryChannel::new());
        let session = SnapshotSession::new(channel.clone(), &SessionConfig::default());
        (channel, session)
    }

    fn snapshot_message(samples: u64) -> Envelope {
        Envelope::new("snapshot", json!({ "samples": samples, "state": 1 }))
    }

    #[test]
    fn test_mount_selects_process_and_requests_snapshot() {
        let (channel, mut session) = setup();
        session.mount(Instant::now()).unwrap();

        assert_eq!(session.state(), SessionState::Subscribed);
        assert_eq!(
            channel.posted(),
            vec![Request::Process { rule: "livetrace.exe".into() }, Request::Snapshot]
        );
        assert_eq!(channel.listener_count(), 1);
    }

    #[test]
    fn test_tick_requests_on_period() {
        let (channel, mut session) = setup();
        let start = Instant::now();
        session.mount(start).unwrap();
        channel.take_posted();

        assert!(!session.tick(start + Duration::from_millis(60)));
        assert!(session.tick(start + Duration::from_millis(120)));
        assert!(session.tick(start + Duration::from_millis(240)));
        assert_eq!(channel.posted(), vec![Request::Snapshot, Request::Snapshot]);
    }

    #[test]
    fn test_tick_before_mount_does_nothing() {
        let (channel, mut session) = setup();
        assert!(!session.tick(Instant::now() + Duration::from_secs(1)));
        assert!(channel.posted().is_empty());
    }

    #[test]
    fn test_last_snapshot_wins() {
        let (channel, mut session) = setup();
        session.mount(Instant::now()).unwrap();

        channel.deliver(snapshot_message(1));
        channel.deliver(snapshot_message(2));
        channel.dispatch_pending();

        assert_eq!(session.current().unwrap().samples, 2);
        assert_eq!(session.stats().snapshots_received, 2);
    }

    #[test]
    fn test_other_messages_are_ignored() {
        let (channel, mut session) = setup();
        session.mount(Instant::now()).unwrap();

        channel.deliver(Envelope::new("log", json!("hello")));
        channel.dispatch_pending();
        assert!(session.current().is_none());
    }

    #[test]
    fn test_undecodable_snapshot_keeps_previous() {
        let (channel, mut session) = setup();
        session.mount(Instant::now()).unwrap();

        channel.deliver(snapshot_message(5));
        channel.deliver(Envelope::new("snapshot", json!({ "samples": "many" })));
        channel.dispatch_pending();

        assert_eq!(session.current().unwrap().samples, 5);
        assert_eq!(session.stats().decode_failures, 1);
    }

    #[test]
    fn test_held_snapshot_is_not_mutated_by_replacement() {
        let (channel, mut session) = setup();
        session.mount(Instant::now()).unwrap();

        channel.deliver(snapshot_message(1));
        channel.dispatch_pending();
        let held = session.current().unwrap();

        channel.deliver(snapshot_message(2));
        channel.dispatch_pending();

        assert_eq!(held.samples, 1);
        assert_eq!(session.current().unwrap().samples, 2);
    }

    #[test]
    fn test_set_target_sends_once_immediately() {
        let (channel, mut session) = setup();
        session.mount(Instant::now()).unwrap();
        channel.take_posted();

        session.set_target("1234");
        session.set_target("1234");

        assert_eq!(channel.posted(), vec![Request::Process { rule: "1234".into() }]);
        assert_eq!(session.rule().as_str(), "1234");
    }

    #[test]
    fn test_set_target_before_mount_is_used_by_mount() {
        let (channel, mut session) = setup();
        session.set_target("other.exe");
        assert!(channel.posted().is_empty());

        session.mount(Instant::now()).unwrap();
        assert_eq!(channel.posted()[0], Request::Process { rule: "other.exe".into() });
    }

    #[test]
    fn test_set_target_keeps_current_snapshot() {
        let (channel, mut session) = setup();
        session.mount(Instant::now()).unwrap();
        channel.deliver(snapshot_message(9));
        channel.dispatch_pending();

        session.set_target("1234");
        assert_eq!(session.current().unwrap().samples, 9);
    }

    #[test]
    fn test_commands() {
        let (channel, mut session) = setup();
        session.mount(Instant::now()).unwrap();
        channel.take_posted();

        session.pause();
        session.select_thread(Tid(7));
        session.restart();

        assert_eq!(
            channel.posted(),
            vec![
                Request::Pause,
                Request::Thread { thread: 7 },
                Request::Process { rule: "livetrace.exe".into() },
            ]
        );
    }

    #[test]
    fn test_unmount_stops_everything() {
        let (channel, mut session) = setup();
        let start = Instant::now();
        session.mount(start).unwrap();
        channel.deliver(snapshot_message(1));
        channel.dispatch_pending();
        session.unmount();
        channel.take_posted();

        channel.deliver(snapshot_message(2));
        channel.dispatch_pending();
        assert!(!session.tick(start + Duration::from_secs(10)));
        session.set_target("1234");
        session.pause();

        assert_eq!(session.state(), SessionState::TornDown);
        assert_eq!(session.current().unwrap().samples, 1);
        assert!(channel.posted().is_empty());
        assert_eq!(channel.listener_count(), 0);
        assert!(matches!(session.mount(start), Err(SessionError::TornDown)));
    }

    #[test]
    fn test_drop_unwatches() {
        let (channel, mut session) = setup();
        session.mount(Instant::now()).unwrap();
        drop(session);
        assert_eq!(channel.listener_count(), 0);
    }

    #[test]
    fn test_send_failure_is_counted_not_fatal() {
        let (channel, mut session) = setup();
        channel.set_closed(true);
        session.mount(Instant::now()).unwrap();

        assert_eq!(session.state(), SessionState::Subscribed);
        assert_eq!(session.stats().send_failures, 2);
        assert_eq!(session.stats().requests_sent, 0);
    }
}
