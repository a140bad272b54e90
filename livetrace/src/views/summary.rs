//! Process summary header.

// Rate and CPU percentage are display-only conversions
#![allow(clippy::cast_precision_loss)]

use livetrace_common::{Snapshot, TraceState};

use super::group_thousands;
use crate::symbolization::UNKNOWN_LABEL;

/// Display strings for the summary panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryView {
    /// `name (pid)`, or `(unknown)` before a process is attached.
    pub target: String,
    pub state: String,
    /// `samples (rate/sec)`.
    pub samples: String,
    pub cpu: String,
    pub physical_memory: String,
    pub virtual_memory: String,
}

impl SummaryView {
    /// Build the summary for `snapshot`, or the empty summary when there is none yet.
    #[must_use]
    pub fn new(snapshot: Option<&Snapshot>) -> Self {
        snapshot.map_or_else(|| Self::from_snapshot(&Snapshot::default()), Self::from_snapshot)
    }

    fn from_snapshot(snapshot: &Snapshot) -> Self {
        let target = if snapshot.process_name.is_empty() || snapshot.process_id == 0 {
            UNKNOWN_LABEL.to_string()
        } else {
            format!("{} ({})", snapshot.process_name, snapshot.process_id)
        };

        Self {
            target,
            state: state_label(snapshot.state).to_string(),
            samples: format!(
                "{} ({:.2}/sec)",
                group_thousands(snapshot.samples),
                sample_rate(snapshot.samples, snapshot.elapsed)
            ),
            cpu: format!("{:.2}%", snapshot.process_cpu_usage * 100.0),
            physical_memory: group_thousands(snapshot.process_phys_mem_usage),
            virtual_memory: group_thousands(snapshot.process_virt_mem_usage),
        }
    }
}

/// Human-readable trace state; unknown codes read `Unknown`.
#[must_use]
pub fn state_label(state: TraceState) -> &'static str {
    state.label()
}

/// Samples per second over `elapsed_ms`; 0 before any time has elapsed.
#[must_use]
pub fn sample_rate(samples: u64, elapsed_ms: u64) -> f64 {
    if elapsed_ms == 0 {
        return 0.0;
    }
    samples as f64 / (elapsed_ms as f64 / 1000.0)
}
