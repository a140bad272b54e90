//! Cost ranking for inclusive and exclusive sample counts.
//!
//! Turns one of a snapshot's cost maps (offset → samples) into the
//! "TOP 20" lists shown next to the stack trace.
//!
//! # Normalization
//!
//! Percentages are relative to the **first retained entry**, not to the total
//! sample count and not to the global maximum of the map:
//!
//! ```text
//! INCLUSIVE TOP 20
//! ─────────────────────────────────
//!   f+0x0        (50)  ██████████  100%
//!   g+0x0        (30)  ██████░░░░   60%
//!   (unknown)    (20)  ████░░░░░░   40%
//! ```
//!
//! The top entry always fills the bar. This is what the bars are for: they
//! compare hot spots with each other, not with the whole program.
//!
//! # Performance
//!
//! - `rank()`: O(n log n) in the number of cost map entries (sorting),
//!   labels are only built for the retained top-N.

// Percentage calculations intentionally convert u64 to f64
#![allow(clippy::cast_precision_loss)]

use livetrace_common::{CostMap, InstructionPointMap, Offset, Snapshot};
use std::cmp::Reverse;

use crate::symbolization::SymbolResolver;

/// One row of a ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct RankEntry {
    /// Resolved `function+0xDISP` label, or `(unknown)`.
    pub label: String,

    /// Sample count from the cost map.
    pub count: u64,

    /// Count relative to the top entry (0.0 - 100.0).
    pub percentage: f64,
}

/// Which of a snapshot's cost maps to rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostKind {
    /// Samples where the location was anywhere on the stack.
    Inclusive,
    /// Samples where the location was the innermost frame.
    Exclusive,
}

impl CostKind {
    /// Pick this kind's cost map out of a snapshot.
    #[must_use]
    pub fn select(self, snapshot: &Snapshot) -> &CostMap {
        match self {
            Self::Inclusive => &snapshot.inclusive,
            Self::Exclusive => &snapshot.exclusive,
        }
    }

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::Inclusive => "INCLUSIVE",
            Self::Exclusive => "EXCLUSIVE",
        }
    }
}

/// Rank a cost map, keeping the `limit` highest counts.
///
/// Sorting is stable: entries with equal counts keep the cost map's order.
/// When the top count is 0, every percentage is 0.
#[must_use]
pub fn rank(costs: &CostMap, points: &InstructionPointMap, limit: usize) -> Vec<RankEntry> {
    let mut ordered: Vec<(&Offset, u64)> = costs.iter().map(|(offset, &count)| (offset, count)).collect();

    // Stable sort: no secondary key exists, so ties keep wire order
    ordered.sort_by_key(|&(_, count)| Reverse(count));
    ordered.truncate(limit);

    let max_count = ordered.first().map_or(0, |&(_, count)| count);
    let resolver = SymbolResolver::new(points);

    ordered
        .into_iter()
        .map(|(offset, count)| {
            let percentage =
                if max_count > 0 { (count as f64 / max_count as f64) * 100.0 } else { 0.0 };
            RankEntry { label: resolver.resolve_function(offset), count, percentage }
        })
        .collect()
}

/// Rank one of a snapshot's cost maps against the same snapshot's symbols.
#[must_use]
pub fn rank_snapshot(snapshot: &Snapshot, kind: CostKind, limit: usize) -> Vec<RankEntry> {
    rank(kind.select(snapshot), &snapshot.instruction_point_map, limit)
}

/// Sample count for one offset, 0 when the offset has no samples.
#[must_use]
pub fn cost_of(costs: &CostMap, offset: &Offset) -> u64 {
    costs.get(offset).copied().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use livetrace_common::InstructionPoint;

    fn costs(entries: &[(u64, u64)]) -> CostMap {
        entries.iter().map(|&(offset, count)| (Offset::from(offset), count)).collect()
    }

    fn points(entries: &[(u64, &str)]) -> InstructionPointMap {
        entries
            .iter()
            .map(|&(offset, name)| {
                let point = InstructionPoint {
                    function_name: name.to_string(),
                    displacement: "0".to_string(),
                    source_name: None,
                    source_line: None,
                };
                (Offset::from(offset), point)
            })
            .collect()
    }

    #[test]
    fn test_rank_sorts_and_normalizes_to_top_entry() {
        let ranked = rank(&costs(&[(10, 50), (20, 30), (30, 20)]), &points(&[(10, "f"), (20, "g")]), 20);

        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0], RankEntry { label: "f+0x0".into(), count: 50, percentage: 100.0 });
        assert_eq!(ranked[1], RankEntry { label: "g+0x0".into(), count: 30, percentage: 60.0 });
        assert_eq!(ranked[2], RankEntry { label: "(unknown)".into(), count: 20, percentage: 40.0 });
    }

    #[test]
    fn test_rank_empty_map() {
        assert!(rank(&CostMap::new(), &InstructionPointMap::new(), 20).is_empty());
    }

    #[test]
    fn test_rank_all_zero_counts() {
        let ranked = rank(&costs(&[(1, 0), (2, 0)]), &InstructionPointMap::new(), 20);
        assert_eq!(ranked.len(), 2);
        assert!(ranked.iter().all(|e| e.percentage == 0.0));
    }

    #[test]
    fn test_rank_single_entry_is_full_bar() {
        let ranked = rank(&costs(&[(1, 7)]), &InstructionPointMap::new(), 20);
        assert!((ranked[0].percentage - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rank_truncates_and_normalizes_within_top_n() {
        let map = costs(&[(1, 1), (2, 8), (3, 4), (4, 2)]);
        let ranked = rank(&map, &InstructionPointMap::new(), 2);

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].count, 8);
        assert_eq!(ranked[1].count, 4);
        assert!((ranked[1].percentage - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rank_ties_keep_map_order() {
        let map = costs(&[(3, 5), (1, 9), (2, 5), (4, 5)]);
        let pts = points(&[(1, "a"), (2, "b"), (3, "c"), (4, "d")]);
        let labels: Vec<String> = rank(&map, &pts, 20).into_iter().map(|e| e.label).collect();
        assert_eq!(labels, ["a+0x0", "c+0x0", "b+0x0", "d+0x0"]);
    }

    #[test]
    fn test_rank_snapshot_selects_cost_map() {
        let snapshot = Snapshot {
            inclusive: costs(&[(1, 10), (2, 4)]),
            exclusive: costs(&[(2, 3)]),
            instruction_point_map: points(&[(1, "outer"), (2, "inner")]),
            ..Snapshot::default()
        };

        let inclusive = rank_snapshot(&snapshot, CostKind::Inclusive, 20);
        let exclusive = rank_snapshot(&snapshot, CostKind::Exclusive, 20);
        assert_eq!(inclusive[0].label, "outer+0x0");
        assert_eq!(exclusive.len(), 1);
        assert_eq!(exclusive[0].label, "inner+0x0");
    }

    #[test]
    fn test_cost_of_defaults_to_zero() {
        let map = costs(&[(1, 10)]);
        assert_eq!(cost_of(&map, &Offset::from(1_u64)), 10);
        assert_eq!(cost_of(&map, &Offset::from(2_u64)), 0);
    }
}
