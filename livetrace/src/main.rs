//! # livetrace - Main Entry Point
//!
//! Supports two operational modes:
//! - **Live TUI** (default): interactive monitor
//! - **Headless** (`--headless`): rankings printed to stdout for each new snapshot
//!
//! Either mode talks to a live backend (`--connect`) or a recording (`--replay`).

use anyhow::{Context, Result};
use clap::Parser;
use livetrace::cli::Args;
use livetrace::domain::{ChannelError, ReplayError};
use livetrace::headless::{run_headless, StopCondition};
use livetrace::session::{BackendChannel, LineChannel, ReplayBackend};
use livetrace::tui;
use log::info;
use std::io;
use std::rc::Rc;

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_USAGE: i32 = 2;
const EXIT_UNAVAILABLE: i32 = 69;

fn main() {
    env_logger::init();
    std::process::exit(match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            let code = exit_code_for(&e);
            eprintln!("error: {e:#}");
            code
        }
    });
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    if matches!(err.downcast_ref::<ChannelError>(), Some(ChannelError::ConnectFailed { .. })) {
        EXIT_UNAVAILABLE
    } else if err.downcast_ref::<ReplayError>().is_some() {
        EXIT_USAGE
    } else {
        EXIT_ERROR
    }
}

/// Open the backend named on the command line.
fn open_channel(args: &Args) -> Result<Rc<dyn BackendChannel>> {
    if let Some(ref addr) = args.connect {
        let channel = LineChannel::connect(addr)?;
        return Ok(Rc::new(channel));
    }
    if let Some(ref path) = args.replay {
        let backend = ReplayBackend::from_file(path)?;
        return Ok(Rc::new(backend));
    }
    // clap enforces one of the two
    anyhow::bail!("Missing required argument: --connect or --replay")
}

fn run() -> Result<()> {
    let args = Args::parse();
    let quiet = args.quiet;
    let config = args.session_config();

    let channel = open_channel(&args)?;

    if !quiet {
        println!("livetrace v{}", env!("CARGO_PKG_VERSION"));
        match (&args.connect, &args.replay) {
            (Some(addr), _) => println!("backend: {addr}"),
            (_, Some(path)) => println!("replay: {}", path.display()),
            _ => {}
        }
        println!("target: {}", config.rule);
        println!("interval: {}ms", config.poll_interval.as_millis());
    }

    if args.headless {
        let stop = StopCondition { duration: args.duration_limit(), snapshots: args.snapshot_limit() };
        let reported = run_headless(channel, &config, stop, &mut io::stdout().lock())
            .context("Headless run failed")?;
        if !quiet {
            eprintln!("\nreported {reported} snapshots");
        }
    } else {
        tui::run_live(channel, &config).context("Live TUI failed")?;
        info!("TUI closed");
    }

    Ok(())
}
