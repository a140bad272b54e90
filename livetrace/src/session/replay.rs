//! Recorded-snapshot backend.
//!
//! Stands in for the sampling backend: answers every `snapshot` request with
//! the next frame of a recording, cycling at the end. A recording is a text
//! file with one JSON document per line, either a bare snapshot payload or a
//! full `{"type":"snapshot","data":{..}}` message as captured off the wire.

use livetrace_common::{Envelope, Request, Snapshot, TraceState, MSG_SNAPSHOT};
use log::{debug, info};
use serde::Deserialize;
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::fs;
use std::path::Path;

use super::channel::{BackendChannel, Listener, ListenerId, MemoryChannel};
use crate::domain::{ChannelError, ReplayError};

#[derive(Debug)]
pub struct ReplayBackend {
    frames: Vec<Value>,
    cursor: Cell<usize>,
    paused: Cell<bool>,
    rule: RefCell<Option<String>>,
    thread: Cell<Option<u32>>,
    /// Carries responses to listeners; requests are answered in `post`.
    transport: MemoryChannel,
}

impl ReplayBackend {
    /// Load a recording from disk.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, a line is not a valid
    /// snapshot, or the file holds no snapshots at all
    pub fn from_file(path: &Path) -> Result<Self, ReplayError> {
        let text = fs::read_to_string(path)
            .map_err(|source| ReplayError::ReadFailed { path: path.to_path_buf(), source })?;

        let mut frames = Vec::new();
        for (index, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let frame = parse_frame(line)
                .map_err(|source| ReplayError::InvalidLine { line: index + 1, source })?;
            frames.push(frame);
        }

        info!("Loaded {} snapshots from {}", frames.len(), path.display());
        Self::from_frames(frames)
    }

    /// Build a backend from in-memory snapshot payloads.
    ///
    /// # Errors
    /// Returns [`ReplayError::Empty`] if `frames` is empty
    pub fn from_frames(frames: Vec<Value>) -> Result<Self, ReplayError> {
        if frames.is_empty() {
            return Err(ReplayError::Empty);
        }
        Ok(Self {
            frames,
            cursor: Cell::new(0),
            paused: Cell::new(false),
            rule: RefCell::new(None),
            thread: Cell::new(None),
            transport: MemoryChannel::new(),
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Last process rule requested by the client.
    #[must_use]
    pub fn rule(&self) -> Option<String> {
        self.rule.borrow().clone()
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused.get()
    }

    #[must_use]
    pub fn selected_thread(&self) -> Option<u32> {
        self.thread.get()
    }

    fn respond(&self, request: &Request) {
        match request {
            Request::Snapshot => self.send_frame(),
            Request::Process { rule } => {
                debug!("Replay: restarting for {rule}");
                *self.rule.borrow_mut() = Some(rule.clone());
                self.cursor.set(0);
                self.paused.set(false);
            }
            Request::Pause => {
                self.paused.set(!self.paused.get());
                debug!("Replay: paused={}", self.paused.get());
            }
            Request::Thread { thread } => self.thread.set(Some(*thread)),
        }
    }

    fn send_frame(&self) {
        let index = self.cursor.get();
        let mut frame = self.frames[index].clone();
        if self.paused.get() {
            set_field(&mut frame, "state", Value::from(i64::from(TraceState::Paused)));
        } else {
            self.cursor.set((index + 1) % self.frames.len());
        }
        if let Some(thread) = self.thread.get() {
            set_field(&mut frame, "thread_id", Value::from(thread));
        }
        self.transport.deliver(Envelope::new(MSG_SNAPSHOT, frame));
    }
}

/// Parse one recording line, unwrapping a captured message if present.
fn parse_frame(line: &str) -> Result<Value, serde_json::Error> {
    let mut value: Value = serde_json::from_str(line)?;
    if value.get("type").and_then(Value::as_str) == Some(MSG_SNAPSHOT) {
        value = value.get_mut("data").map(Value::take).unwrap_or_default();
    }
    // Reject lines that would never decode on the client
    Snapshot::deserialize(&value)?;
    Ok(value)
}

fn set_field(frame: &mut Value, key: &str, value: Value) {
    if let Value::Object(map) = frame {
        map.insert(key.to_string(), value);
    }
}

impl BackendChannel for ReplayBackend {
    fn post(&self, request: &Request) -> Result<(), ChannelError> {
        self.respond(request);
        Ok(())
    }

    fn watch(&self, listener: Listener) -> ListenerId {
        self.transport.watch(listener)
    }

    fn unwatch(&self, id: ListenerId) {
        self.transport.unwatch(id);
    }

    fn dispatch_pending(&self) -> usize {
        self.transport.dispatch_pending()
    }
}
