//! Configuration and defaults for the client session.

use std::time::Duration;

/// Target process rule used until the user edits it.
pub const DEFAULT_RULE: &str = "livetrace.exe";

/// Period between snapshot requests.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(120);

/// Entries shown in each inclusive/exclusive ranking.
pub const DEFAULT_RANK_LIMIT: usize = 20;

/// Runtime settings for a [`crate::session::SnapshotSession`] and its views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Process name pattern or PID to attach to.
    pub rule: String,
    /// How often to request a snapshot.
    pub poll_interval: Duration,
    /// Top-N size for the cost rankings.
    pub rank_limit: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            rule: DEFAULT_RULE.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            rank_limit: DEFAULT_RANK_LIMIT,
        }
    }
}

impl SessionConfig {
    #[must_use]
    pub fn with_rule(mut self, rule: impl Into<String>) -> Self {
        self.rule = rule.into();
        self
    }

    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    #[must_use]
    pub fn with_rank_limit(mut self, limit: usize) -> Self {
        self.rank_limit = limit;
        self
    }
}
