//! Stack trace table and the rankings shown beside it.
//!
//! Rows and rankings are always built from the same snapshot, so addresses,
//! counts and labels describe one capture.

use livetrace_common::Snapshot;

use crate::analysis::{cost_of, rank_snapshot, CostKind, RankEntry};
use crate::symbolization::SymbolResolver;

/// One frame of the selected thread's stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackRow {
    /// Frame position, 0 for the innermost frame.
    pub index: usize,
    pub address: String,
    pub source: String,
    pub inclusive: u64,
    pub exclusive: u64,
}

/// Stack rows in delivered order.
#[must_use]
pub fn stack_rows(snapshot: &Snapshot) -> Vec<StackRow> {
    let resolver = SymbolResolver::new(&snapshot.instruction_point_map);
    snapshot
        .stack_frame
        .iter()
        .enumerate()
        .map(|(index, frame)| {
            let offset = &frame.instruction_offset;
            let resolution = resolver.resolve(offset);
            StackRow {
                index,
                address: resolution.function_label(),
                source: resolution.source_label(),
                inclusive: cost_of(&snapshot.inclusive, offset),
                exclusive: cost_of(&snapshot.exclusive, offset),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct StackTraceView {
    pub rows: Vec<StackRow>,
    pub inclusive: Vec<RankEntry>,
    pub exclusive: Vec<RankEntry>,
}

impl StackTraceView {
    #[must_use]
    pub fn new(snapshot: &Snapshot, limit: usize) -> Self {
        Self {
            rows: stack_rows(snapshot),
            inclusive: rank_snapshot(snapshot, CostKind::Inclusive, limit),
            exclusive: rank_snapshot(snapshot, CostKind::Exclusive, limit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    fn snapshot() -> Snapshot {
        Snapshot::deserialize(json!({
            "stack_frame": [
                { "instruction_offset": 16 },
                { "instruction_offset": 32 },
                { "instruction_offset": 48 }
            ],
            "instruction_point_map": {
                "16": { "function_name": "leaf", "displacement": "4",
                        "source_name": "leaf.c", "source_line": 12 },
                "32": { "function_name": "main", "displacement": "0x10" }
            },
            "inclusive": { "16": 8, "32": 10 },
            "exclusive": { "16": 8 }
        }))
        .unwrap()
    }

    #[test]
    fn test_stack_rows() {
        let rows = stack_rows(&snapshot());
        assert_eq!(
            rows[0],
            StackRow {
                index: 0,
                address: "leaf+0x4".into(),
                source: "leaf.c:12".into(),
                inclusive: 8,
                exclusive: 8,
            }
        );
        assert_eq!(rows[1].address, "main+0x16");
        assert_eq!(rows[1].source, "");
        assert_eq!(rows[1].exclusive, 0);
        assert_eq!(rows[2].address, "(unknown)");
        assert_eq!(rows[2].source, "(unknown)");
        assert_eq!((rows[2].inclusive, rows[2].exclusive), (0, 0));
    }

    #[test]
    fn test_view_ranks_both_maps() {
        let view = StackTraceView::new(&snapshot(), 20);
        assert_eq!(view.rows.len(), 3);
        assert_eq!(view.inclusive[0].label, "main+0x16");
        assert_eq!(view.inclusive[1].percentage, 80.0);
        assert_eq!(view.exclusive.len(), 1);
    }

    #[test]
    fn test_empty_snapshot() {
        let view = StackTraceView::new(&Snapshot::default(), 20);
        assert!(view.rows.is_empty());
        assert!(view.inclusive.is_empty());
        assert!(view.exclusive.is_empty());
    }
}
