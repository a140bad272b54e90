//! # livetrace - Live Sampling Profiler Client
//!
//! livetrace is the viewing side of a sampling profiler. A backend process
//! attaches to a target program, samples its threads and answers requests with
//! a complete snapshot of the trace: process summary, thread list, the selected
//! thread's stack, inclusive/exclusive cost maps keyed by code offset, and the
//! symbols for those offsets. This crate polls for those snapshots, resolves
//! offsets to readable labels and ranks the hottest locations.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                  Sampling Backend (external)                    │
//! │      attaches by rule, samples threads, builds snapshots        │
//! └───────────────────────┬─────────────────────────────────────────┘
//!                         │ {"type":"snapshot","data":{..}}
//!                         ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     livetrace (This Crate)                      │
//! │                                                                 │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐         │
//! │  │   Session    │──▶│    Views     │──▶│  TUI or      │         │
//! │  │ (poll, swap) │   │ (rows, text) │   │  headless    │         │
//! │  └──────────────┘   └──────┬───────┘   └──────────────┘         │
//! │                            │                                    │
//! │              ┌─────────────┴─────────────┐                      │
//! │              ▼                           ▼                      │
//! │       ┌──────────────┐           ┌──────────────┐               │
//! │       │ Symbolization│◀──────────│   Analysis   │               │
//! │       │  (resolver)  │           │ (cost ranker)│               │
//! │       └──────────────┘           └──────────────┘               │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! ### Core
//!
//! - [`session`]: Snapshot polling state machine and backend transports
//!   - `snapshot_session`: mount/tick/teardown, last-received-wins snapshot swap
//!   - `channel`: the [`session::BackendChannel`] trait and an in-memory channel
//!   - `line_channel`: newline-delimited JSON over TCP
//!   - `replay`: answers requests from a recorded file
//!
//! - [`symbolization`]: Offset → `function+0xDISP` / `file:line` labels
//!
//! - [`analysis`]: Top-N inclusive/exclusive rankings, normalized to the top entry
//!
//! ### Presentation
//!
//! - [`views`]: Display strings for each panel, independent of the terminal
//! - [`tui`]: Live terminal monitor
//! - [`headless`]: Plain-text reports for scripts and CI
//!
//! ### Support
//!
//! - [`cli`]: Command-line argument parsing
//! - [`config`]: Defaults and [`config::SessionConfig`]
//! - [`domain`]: Newtypes and error types
//!
//! ## Threading
//!
//! Everything above runs on one thread. Transports that need blocking I/O
//! read on a helper thread and hand messages over a channel; listeners only
//! run when the event loop calls `dispatch_pending`.
//!
//! ## Typical Usage
//!
//! ```bash
//! # Live TUI against a running backend
//! ./livetrace --connect 127.0.0.1:8089
//!
//! # Print five reports from a recording
//! ./livetrace --replay capture.jsonl --headless --count 5
//! ```

pub mod analysis;
pub mod cli;
pub mod config;
pub mod domain;
pub mod headless;
pub mod session;
pub mod symbolization;
pub mod tui;
pub mod views;
