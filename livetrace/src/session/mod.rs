//! Snapshot polling and backend transports.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐  post(Request)   ┌──────────────────────────┐
//! │ SnapshotSession  │ ───────────────► │ dyn BackendChannel       │
//! │  PollTimer       │                  │  MemoryChannel  (tests)  │
//! │  Rc<Snapshot>    │ ◄─────────────── │  LineChannel    (TCP)    │
//! └──────────────────┘  dispatch_pending│  ReplayBackend  (file)   │
//!                                       └──────────────────────────┘
//! ```
//!
//! The event loop owns the cadence: it calls `dispatch_pending` on the
//! channel, then `tick` on the session, then reads `current()` to render.

pub mod channel;
pub mod line_channel;
pub mod replay;
pub mod snapshot_session;
pub mod timer;

pub use channel::{BackendChannel, Listener, ListenerId, ListenerRegistry, MemoryChannel};
pub use line_channel::LineChannel;
pub use replay::ReplayBackend;
pub use snapshot_session::{decode_snapshot, SessionState, SessionStats, SnapshotSession};
pub use timer::PollTimer;
