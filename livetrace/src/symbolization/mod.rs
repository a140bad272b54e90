//! # Symbol Resolution
//!
//! Turns the opaque offsets found in a snapshot (thread locations, stack
//! frames, cost map keys) into the labels shown to the user.
//!
//! Unlike a DWARF symbolizer, nothing is computed here: the backend already
//! resolved every instruction point it saw and ships the results in the
//! snapshot's `instruction_point_map`. This module only looks them up and
//! formats them.
//!
//! ## Labels
//!
//! ```text
//! offset present, source known     →  "RtlUserThreadStart+0x33"   "ntdll.c:88"
//! offset present, no source        →  "RtlUserThreadStart+0x33"   ""
//! offset absent                    →  "(unknown)"                 "(unknown)"
//! ```
//!
//! The displacement arrives as hex digits (`"21"` above) and is printed as
//! its decimal value after the `0x`, the way the backend's own UI labels
//! frames.
//!
//! The empty source string and `"(unknown)"` are distinct: the
//! first means "symbol found, no line info", the second "nothing resolved".
//!
//! Lookups never fail. [`Resolution`] keeps the resolved/unresolved
//! distinction as a type until the very last step, when a view asks for a
//! string.

pub mod resolver;

pub use resolver::{OffsetKey, Resolution, SourceLocation, SymbolResolver, UNKNOWN_LABEL};
