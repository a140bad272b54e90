//! Analysis logic for snapshot data
//!
//! This module contains pure business logic for ranking costs,
//! separated from the TUI presentation layer.

pub mod cost_ranker;

pub use cost_ranker::{cost_of, rank, rank_snapshot, CostKind, RankEntry};
