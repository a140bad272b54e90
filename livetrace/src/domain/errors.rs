//! Structured error types for livetrace
//!
//! Using thiserror for automatic Display implementation and error chaining.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChannelError {
    #[error("Backend channel is closed")]
    Closed,

    #[error("Failed to connect to backend at {addr}: {source}")]
    ConnectFailed { addr: String, source: std::io::Error },

    #[error("Failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Failed to decode snapshot payload: {0}")]
    SnapshotDecode(#[source] serde_json::Error),

    #[error("Session already torn down")]
    TornDown,
}

#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("Failed to read recording {path}: {source}")]
    ReadFailed { path: PathBuf, source: std::io::Error },

    #[error("Invalid snapshot on line {line}: {source}")]
    InvalidLine { line: usize, source: serde_json::Error },

    #[error("Recording contains no snapshots")]
    Empty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_error_display() {
        let err = ChannelError::Closed;
        assert_eq!(err.to_string(), "Backend channel is closed");
    }

    #[test]
    fn test_replay_error_mentions_line() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = ReplayError::InvalidLine { line: 3, source };
        assert!(err.to_string().contains("line 3"));
    }
}
