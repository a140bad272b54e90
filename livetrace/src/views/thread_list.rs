//! Thread list rows: one per sampled thread, with its last location.

use livetrace_common::Snapshot;

use super::group_thousands;
use crate::domain::Tid;
use crate::symbolization::SymbolResolver;

/// One row of the thread list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadRow {
    pub id: Tid,
    /// Where the thread was last sampled, `function+0xDISP` or `(unknown)`.
    pub address: String,
    pub cycles: String,
    /// True for the thread whose stack the snapshot carries.
    pub active: bool,
}

/// Thread rows in the order the backend listed them.
#[must_use]
pub fn thread_rows(snapshot: &Snapshot) -> Vec<ThreadRow> {
    let resolver = SymbolResolver::new(&snapshot.instruction_point_map);
    snapshot
        .threads
        .iter()
        .map(|thread| ThreadRow {
            id: Tid(thread.id),
            address: resolver.resolve_optional(thread.instruction_offset.as_ref()).function_label(),
            cycles: group_thousands(thread.cycles),
            active: thread.id == snapshot.thread_id,
        })
        .collect()
}
