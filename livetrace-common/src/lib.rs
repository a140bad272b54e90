//! # Shared Data Structures (client ↔ backend)
//!
//! Defines the JSON messages exchanged between the LiveTrace client and the
//! sampling backend. The backend owns sampling, stack walking and cost
//! attribution; this crate only describes what crosses the wire.
//!
//! ## Message Flow
//!
//! ```text
//! client ──► {"type":"snapshot"}                 request the current state
//! client ──► {"type":"process","rule":"app.exe"} attach by name or PID
//! client ──► {"type":"pause"}                    toggle sampling
//! client ──► {"type":"thread","thread":7}        select the displayed thread
//!
//! backend ─► {"type":"snapshot","data":{...}}    one complete Snapshot
//! ```
//!
//! ## Key Types
//!
//! - [`Snapshot`] - One internally consistent capture of process state
//! - [`InstructionPoint`] - A resolved symbol for one code offset
//! - [`Offset`] - Opaque key into a snapshot's instruction point map
//! - [`Request`] - Outgoing command
//! - [`Envelope`] - Inbound message wrapper

use indexmap::IndexMap;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt;

// ============================================================================
// Message Type Constants
// ============================================================================

/// Inbound message type carrying a [`Snapshot`] payload.
pub const MSG_SNAPSHOT: &str = "snapshot";

// ============================================================================
// Offsets
// ============================================================================

/// Key identifying a code location within one snapshot.
///
/// The backend serializes instruction offsets as decimal integers, and uses
/// their decimal string form as object keys in `instruction_point_map`,
/// `inclusive` and `exclusive`. Offsets are opaque: they are only compared,
/// never interpreted, and are not stable across snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Offset(String);

impl Offset {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u64> for Offset {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl From<i64> for Offset {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl From<&str> for Offset {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Offset {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Borrow<str> for Offset {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Offset {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // Canonical decimal keys go back out as numbers, matching the backend.
        match self.0.parse::<u64>() {
            Ok(n) if n.to_string() == self.0 => serializer.serialize_u64(n),
            _ => serializer.serialize_str(&self.0),
        }
    }
}

struct OffsetVisitor;

impl Visitor<'_> for OffsetVisitor {
    type Value = Offset;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an integer or string instruction offset")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Offset, E> {
        Ok(Offset::from(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Offset, E> {
        Ok(Offset::from(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Offset, E> {
        Ok(Offset::from(v))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Offset, E> {
        Ok(Offset(v))
    }
}

impl<'de> Deserialize<'de> for Offset {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(OffsetVisitor)
    }
}

/// Deserialize an optional offset where `null` and any negative value both
/// mean "no resolved location".
fn optional_offset<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Offset>, D::Error> {
    struct OptionalOffsetVisitor;

    impl<'de> Visitor<'de> for OptionalOffsetVisitor {
        type Value = Option<Offset>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an instruction offset or null")
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
            d.deserialize_any(self)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(Some(Offset::from(v)))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok((v >= 0).then(|| Offset::from(v)))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok((!v.is_empty() && !v.starts_with('-')).then(|| Offset::from(v)))
        }
    }

    deserializer.deserialize_option(OptionalOffsetVisitor)
}

/// Accept the displacement either as a hex digit string or as a bare number.
///
/// A numeric displacement is kept as its decimal digits; the resolver parses
/// whatever digits arrive as base 16.
fn hex_digits<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    struct HexDigitsVisitor;

    impl Visitor<'_> for HexDigitsVisitor {
        type Value = String;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a hexadecimal displacement")
        }

        fn visit_unit<E: de::Error>(self) -> Result<String, E> {
            Ok(String::new())
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
            Ok(v.to_string())
        }
    }

    deserializer.deserialize_any(HexDigitsVisitor)
}

/// Treat an explicit `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ============================================================================
// Snapshot Payload
// ============================================================================

/// Mapping offset → resolved symbol, in wire order.
pub type InstructionPointMap = IndexMap<Offset, InstructionPoint>;

/// Mapping offset → accumulated sample count, in wire order.
///
/// Wire order matters: equal counts rank in the order the backend sent them.
pub type CostMap = IndexMap<Offset, u64>;

/// A resolved symbol for one code offset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionPoint {
    #[serde(default, deserialize_with = "null_as_default")]
    pub function_name: String,

    /// Distance from the function start, as hexadecimal digits.
    #[serde(default, deserialize_with = "hex_digits")]
    pub displacement: String,

    #[serde(default)]
    pub source_name: Option<String>,

    #[serde(default)]
    pub source_line: Option<u64>,
}

/// One thread of the traced process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: u32,

    /// Innermost frame of the thread's last captured stack.
    #[serde(default, deserialize_with = "optional_offset")]
    pub instruction_offset: Option<Offset>,

    /// CPU cycles consumed by the thread.
    #[serde(default, deserialize_with = "null_as_default")]
    pub cycles: u64,
}

/// One frame of the selected thread's captured stack.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackFrame {
    #[serde(default, deserialize_with = "null_as_default")]
    pub instruction_offset: Offset,
}

/// Backend trace state. Display only; the backend owns transitions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum TraceState {
    #[default]
    Idle,
    Running,
    Exited,
    Failed,
    Paused,
    /// Any code outside the known range, kept for diagnostics.
    Unknown(i64),
}

impl TraceState {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Running => "Running",
            Self::Exited => "Exited",
            Self::Failed => "Failed",
            Self::Paused => "Paused",
            Self::Unknown(_) => "Unknown",
        }
    }
}

impl From<i64> for TraceState {
    fn from(code: i64) -> Self {
        match code {
            0 => Self::Idle,
            1 => Self::Running,
            2 => Self::Exited,
            3 => Self::Failed,
            4 => Self::Paused,
            other => Self::Unknown(other),
        }
    }
}

impl From<TraceState> for i64 {
    fn from(state: TraceState) -> Self {
        match state {
            TraceState::Idle => 0,
            TraceState::Running => 1,
            TraceState::Exited => 2,
            TraceState::Failed => 3,
            TraceState::Paused => 4,
            TraceState::Unknown(code) => code,
        }
    }
}

impl fmt::Display for TraceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One complete capture of process, thread, stack and cost state.
///
/// Every field defaults when missing or `null`, so partial payloads decode
/// into a usable (if sparse) snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    // summary
    #[serde(deserialize_with = "null_as_default")]
    pub process_id: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub process_name: String,
    /// Fraction of total CPU, 0.0 - 1.0.
    #[serde(deserialize_with = "null_as_default")]
    pub process_cpu_usage: f64,
    /// Bytes.
    #[serde(deserialize_with = "null_as_default")]
    pub process_phys_mem_usage: u64,
    /// Bytes.
    #[serde(deserialize_with = "null_as_default")]
    pub process_virt_mem_usage: u64,
    /// Currently selected thread.
    #[serde(deserialize_with = "null_as_default")]
    pub thread_id: u32,
    /// Milliseconds since the trace started.
    #[serde(deserialize_with = "null_as_default")]
    pub elapsed: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub samples: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub state: TraceState,

    // threads
    #[serde(deserialize_with = "null_as_default")]
    pub threads: Vec<Thread>,

    // selected thread
    #[serde(deserialize_with = "null_as_default")]
    pub instruction_point_map: InstructionPointMap,
    #[serde(deserialize_with = "null_as_default")]
    pub stack_frame: Vec<StackFrame>,
    #[serde(deserialize_with = "null_as_default")]
    pub inclusive: CostMap,
    #[serde(deserialize_with = "null_as_default")]
    pub exclusive: CostMap,
}

// ============================================================================
// Messages
// ============================================================================

/// Outgoing command to the backend. All commands are fire-and-forget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Request {
    /// Ask for the current snapshot.
    Snapshot,
    /// Attach to the process matching `rule` (name pattern or decimal PID).
    Process { rule: String },
    /// Toggle sampling pause.
    Pause,
    /// Select the thread whose stack and costs are reported.
    Thread { thread: u32 },
}

/// Inbound message: a `type` tag plus an untyped payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl Envelope {
    pub fn new(kind: impl Into<String>, data: serde_json::Value) -> Self {
        Self { kind: kind.into(), data }
    }

    /// Wrap a snapshot the way the backend sends it.
    ///
    /// # Errors
    /// Returns an error if the snapshot cannot be represented as JSON
    pub fn snapshot(snapshot: &Snapshot) -> serde_json::Result<Self> {
        Ok(Self::new(MSG_SNAPSHOT, serde_json::to_value(snapshot)?))
    }

    #[must_use]
    pub fn is_snapshot(&self) -> bool {
        self.kind == MSG_SNAPSHOT
    }
}
