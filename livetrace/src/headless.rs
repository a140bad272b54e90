//! Headless mode: drive a session without a terminal UI and print a report
//! for every new snapshot.
//!
//! ```text
//! [snapshot 3] game.exe (1234) Running | samples 5,000 (2500.00/sec) | cpu 12.50%
//! INCLUSIVE TOP 20
//!   100.0%  (50)  f+0x0
//!    60.0%  (30)  g+0x0
//! EXCLUSIVE TOP 20
//!   100.0%  (20)  (unknown)
//! ```

use anyhow::Result;
use livetrace_common::Snapshot;
use log::{debug, info};
use std::io::Write;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::analysis::{rank_snapshot, CostKind};
use crate::config::SessionConfig;
use crate::session::{BackendChannel, SnapshotSession};
use crate::views::SummaryView;

/// Upper bound on how long the loop idles between iterations.
const IDLE_WAIT: Duration = Duration::from_millis(10);

/// When to stop a headless run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StopCondition {
    /// Wall-clock limit; `None` runs until the process is interrupted.
    pub duration: Option<Duration>,
    /// Stop after this many snapshots have been reported.
    pub snapshots: Option<usize>,
}

impl StopCondition {
    fn reached(&self, started: Instant, reported: usize) -> bool {
        self.duration.is_some_and(|limit| started.elapsed() >= limit)
            || self.snapshots.is_some_and(|limit| reported >= limit)
    }
}

/// Run a session against `channel` and write one report per new snapshot to `out`.
///
/// Returns the number of snapshots reported. Stops early when the channel closes.
///
/// # Errors
/// Returns an error if the session cannot be mounted or `out` cannot be written
pub fn run_headless(
    channel: Rc<dyn BackendChannel>,
    config: &SessionConfig,
    stop: StopCondition,
    out: &mut impl Write,
) -> Result<usize> {
    let mut session = SnapshotSession::new(Rc::clone(&channel), config);
    let started = Instant::now();
    session.mount(started)?;

    let mut last_reported: Option<Rc<Snapshot>> = None;
    let mut reported = 0;

    while !stop.reached(started, reported) {
        channel.dispatch_pending();

        if let Some(snapshot) = session.current() {
            let is_new = !last_reported.as_ref().is_some_and(|last| Rc::ptr_eq(last, &snapshot));
            if is_new {
                reported += 1;
                write_report(out, reported, &snapshot, config.rank_limit)?;
                last_reported = Some(snapshot);
            }
        }

        if channel.is_closed() {
            info!("Backend channel closed");
            break;
        }

        let now = Instant::now();
        if !session.tick(now) {
            let wait = session
                .next_deadline()
                .map_or(IDLE_WAIT, |due| due.saturating_duration_since(now).min(IDLE_WAIT));
            std::thread::sleep(wait);
        }
    }

    session.unmount();
    debug!("Session stats: {:?}", session.stats());
    Ok(reported)
}

fn write_report(out: &mut impl Write, seq: usize, snapshot: &Snapshot, limit: usize) -> Result<()> {
    let summary = SummaryView::new(Some(snapshot));
    writeln!(
        out,
        "[snapshot {seq}] {} {} | samples {} | cpu {}",
        summary.target, summary.state, summary.samples, summary.cpu
    )?;

    for kind in [CostKind::Inclusive, CostKind::Exclusive] {
        writeln!(out, "{} TOP {limit}", kind.title())?;
        for entry in rank_snapshot(snapshot, kind, limit) {
            writeln!(out, "  {:>5.1}%  ({})  {}", entry.percentage, entry.count, entry.label)?;
        }
    }
    out.flush()?;
    Ok(())
}
