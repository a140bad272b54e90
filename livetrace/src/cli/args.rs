//! CLI argument definitions

use clap::{ArgGroup, Parser};
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{SessionConfig, DEFAULT_RANK_LIMIT, DEFAULT_RULE};

#[derive(Parser, Debug)]
#[command(
    name = "livetrace",
    version,
    about = "Live view of a sampling profiler's snapshots",
    group(ArgGroup::new("backend").required(true).args(["connect", "replay"])),
    after_help = "\
EXAMPLES:
    livetrace --connect 127.0.0.1:8089                 Live TUI against a running backend
    livetrace --connect 127.0.0.1:8089 --rule 1234     Attach to PID 1234
    livetrace --replay capture.jsonl --headless --count 5"
)]
pub struct Args {
    /// Backend address (newline-delimited JSON over TCP)
    #[arg(long, value_name = "ADDR")]
    pub connect: Option<String>,

    /// Replay recorded snapshots (one JSON document per line)
    #[arg(long, value_name = "FILE")]
    pub replay: Option<PathBuf>,

    /// Process name or PID to trace
    #[arg(short, long, default_value = DEFAULT_RULE)]
    pub rule: String,

    /// Milliseconds between snapshot requests
    #[arg(long, default_value = "120", value_parser = clap::value_parser!(u64).range(1..))]
    pub interval_ms: u64,

    /// Entries per inclusive/exclusive ranking
    #[arg(long, default_value_t = DEFAULT_RANK_LIMIT)]
    pub top: usize,

    /// Print rankings to stdout instead of running the TUI
    #[arg(long)]
    pub headless: bool,

    /// Stop after N seconds (0 = unlimited)
    #[arg(long, default_value = "0")]
    pub duration: u64,

    /// Stop after N snapshots in headless mode (0 = unlimited)
    #[arg(long, default_value = "0", requires = "headless")]
    pub count: usize,

    /// Suppress non-essential output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    #[must_use]
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig::default()
            .with_rule(self.rule.clone())
            .with_poll_interval(Duration::from_millis(self.interval_ms))
            .with_rank_limit(self.top)
    }

    #[must_use]
    pub fn duration_limit(&self) -> Option<Duration> {
        (self.duration > 0).then(|| Duration::from_secs(self.duration))
    }

    #[must_use]
    pub fn snapshot_limit(&self) -> Option<usize> {
        (self.count > 0).then_some(self.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_command_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["livetrace", "--connect", "127.0.0.1:8089"]).unwrap();
        assert_eq!(args.session_config(), SessionConfig::default());
        assert_eq!(args.duration_limit(), None);
        assert_eq!(args.snapshot_limit(), None);
    }

    #[test]
    fn test_backend_is_required_and_exclusive() {
        assert!(Args::try_parse_from(["livetrace"]).is_err());
        assert!(Args::try_parse_from([
            "livetrace",
            "--connect",
            "127.0.0.1:8089",
            "--replay",
            "capture.jsonl"
        ])
        .is_err());
    }

    #[test]
    fn test_overrides() {
        let args = Args::try_parse_from([
            "livetrace",
            "--replay",
            "capture.jsonl",
            "--rule",
            "1234",
            "--interval-ms",
            "500",
            "--top",
            "5",
            "--headless",
            "--count",
            "3",
        ])
        .unwrap();

        let config = args.session_config();
        assert_eq!(config.rule, "1234");
        assert_eq!(config.poll_interval, Duration::from_millis(500));
        assert_eq!(config.rank_limit, 5);
        assert_eq!(args.snapshot_limit(), Some(3));
    }

    #[test]
    fn test_zero_interval_rejected() {
        assert!(Args::try_parse_from(["livetrace", "--connect", "x:1", "--interval-ms", "0"])
            .is_err());
    }
}
