//! # Terminal User Interface (TUI)
//!
//! Live terminal monitor built on `ratatui`.
//!
//! ## Layout
//!
//! ```text
//! ┌──────────────────────── SUMMARY ────────────────────────┐
//! ├──────── THREADS ────────┬──────────── STACK ────────────┤
//! │                         ├─ INCLUSIVE TOP ─┬─ EXCLUSIVE ─┤
//! └─────────────────────────┴─────────────────┴─────────────┘
//! ```
//!
//! ## View Modes
//!
//! - **Monitor** - Summary, threads, stack and rankings (default)
//! - **`EditTarget`** - Text input for the process rule
//! - **Help** - Keyboard shortcuts
//!
//! ## Sub-Modules
//!
//! - `summary` - Process header
//! - `threads` - Thread list with selection cursor
//! - `stack` - Stack trace table and cost rankings
//! - `theme` - Color scheme

// TUI rendering intentionally uses long functions for clarity
#![allow(clippy::too_many_lines, clippy::needless_pass_by_value)]

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use livetrace_common::Snapshot;
use log::info;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Terminal,
};
use std::io;
use std::rc::Rc;
use std::time::{Duration, Instant};

mod stack;
mod summary;
mod threads;
pub mod theme;

use stack::StackPanel;
use summary::SummaryPanel;
use theme::{CAUTION_AMBER, CRITICAL_RED, INFO_DIM, TRACE_GREEN};
use threads::ThreadsPanel;

use crate::config::SessionConfig;
use crate::domain::{Rule, Tid};
use crate::session::{BackendChannel, SessionState, SnapshotSession};
use crate::views::{thread_rows, StackTraceView};

// =============================================================================
// STYLE CONSTANTS
// =============================================================================

const STYLE_HEADING: Style = Style::new().fg(TRACE_GREEN).add_modifier(Modifier::BOLD);
const STYLE_DIM: Style = Style::new().fg(INFO_DIM);
const STYLE_KEY: Style = Style::new().fg(CAUTION_AMBER);
const STYLE_TEXT: Style = Style::new().fg(ratatui::style::Color::White);

/// Redraw cadence, independent of the poll interval.
const REDRAW_INTERVAL: Duration = Duration::from_millis(100);

// =============================================================================
// VIEW MODES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ViewMode {
    Monitor,
    /// Text input for the process rule (Enter applies, Esc cancels)
    EditTarget,
    Help,
}

// =============================================================================
// LIVE APP
// =============================================================================

/// Key handling and UI state around one [`SnapshotSession`].
struct LiveApp {
    session: SnapshotSession,
    rank_limit: usize,

    // UI state
    view_mode: ViewMode,
    target_input: String,
    thread_cursor: usize,
    should_quit: bool,
}

impl LiveApp {
    fn new(channel: Rc<dyn BackendChannel>, config: &SessionConfig) -> Self {
        Self {
            session: SnapshotSession::new(channel, config),
            rank_limit: config.rank_limit,
            view_mode: ViewMode::Monitor,
            target_input: String::new(),
            thread_cursor: 0,
            should_quit: false,
        }
    }

    /// Process keyboard input based on current view mode
    fn handle_key(&mut self, key: KeyCode) {
        match self.view_mode {
            ViewMode::Monitor => match key {
                KeyCode::Char('q' | 'Q') | KeyCode::Esc => self.should_quit = true,
                KeyCode::Char('p' | 'P') => self.session.pause(),
                KeyCode::Char('r' | 'R') => self.session.restart(),
                KeyCode::Up => self.move_thread_cursor(-1),
                KeyCode::Down => self.move_thread_cursor(1),
                KeyCode::Char('t' | 'T') => {
                    self.target_input = self.session.rule().to_string();
                    self.view_mode = ViewMode::EditTarget;
                }
                KeyCode::Char('?') => self.view_mode = ViewMode::Help,
                _ => {}
            },
            ViewMode::EditTarget => match key {
                KeyCode::Esc => {
                    self.target_input.clear();
                    self.view_mode = ViewMode::Monitor;
                }
                KeyCode::Enter => {
                    let rule = std::mem::take(&mut self.target_input);
                    let rule = rule.trim();
                    if !rule.is_empty() {
                        self.session.set_target(rule);
                    }
                    self.view_mode = ViewMode::Monitor;
                }
                KeyCode::Backspace => {
                    self.target_input.pop();
                }
                KeyCode::Char(c) => self.target_input.push(c),
                _ => {}
            },
            // Any key closes help
            ViewMode::Help => self.view_mode = ViewMode::Monitor,
        }
    }

    /// Move the cursor over the current thread list and select that thread.
    fn move_thread_cursor(&mut self, delta: isize) {
        let Some(snapshot) = self.session.current() else {
            return;
        };
        if snapshot.threads.is_empty() {
            return;
        }

        let last = snapshot.threads.len() - 1;
        let cursor = self.thread_cursor.min(last).saturating_add_signed(delta).min(last);
        self.thread_cursor = cursor;
        self.session.select_thread(Tid(snapshot.threads[cursor].id));
    }

    fn draw(&self, f: &mut ratatui::Frame, snapshot: Option<&Snapshot>) {
        let outer_layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(6), // Summary
                Constraint::Min(0),    // Main panels
                Constraint::Length(3), // Status bar
            ])
            .split(f.area());

        SummaryPanel::new(snapshot).render(f, outer_layout[0], self.session.rule().as_str());

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
            .split(outer_layout[1]);

        let rows = snapshot.map(thread_rows).unwrap_or_default();
        ThreadsPanel::new(&rows, self.thread_cursor).render(f, columns[0]);

        let stack_view = StackTraceView::new(
            snapshot.unwrap_or(&Snapshot::default()),
            self.rank_limit,
        );
        StackPanel::new(&stack_view, self.rank_limit).render(f, columns[1]);

        match self.view_mode {
            ViewMode::EditTarget => render_target_overlay(f, f.area(), &self.target_input),
            ViewMode::Help => render_help_overlay(f, f.area()),
            ViewMode::Monitor => {}
        }

        let mode_indicator = match self.view_mode {
            ViewMode::EditTarget => Span::styled("[Target]", Style::new().fg(CAUTION_AMBER)),
            _ if snapshot.is_some() => Span::styled("[Live]", Style::new().fg(CRITICAL_RED)),
            _ => Span::styled("[Waiting]", STYLE_DIM),
        };
        let status_line = Line::from(vec![
            Span::styled("Q", STYLE_KEY),
            Span::styled(":Quit ", STYLE_DIM),
            Span::styled("P", STYLE_KEY),
            Span::styled(":Pause ", STYLE_DIM),
            Span::styled("R", STYLE_KEY),
            Span::styled(":Restart ", STYLE_DIM),
            Span::styled("T", STYLE_KEY),
            Span::styled(":Target ", STYLE_DIM),
            Span::styled("?", STYLE_KEY),
            Span::styled(":Help ", STYLE_DIM),
            mode_indicator,
        ]);
        let status = Paragraph::new(vec![status_line]).block(
            Block::default().borders(Borders::ALL).border_style(Style::default().fg(TRACE_GREEN)),
        );
        f.render_widget(status, outer_layout[2]);
    }
}

// =============================================================================
// OVERLAYS
// =============================================================================

fn render_help_overlay(f: &mut ratatui::Frame, area: Rect) {
    let popup_area = centered_popup(area, 70, 16);

    let key_line = |key: &'static str, text: &'static str| {
        Line::from(vec![Span::styled(format!("  {key:<8}"), STYLE_KEY), Span::styled(text, STYLE_TEXT)])
    };
    let help_text = vec![
        Line::from(""),
        Line::from(Span::styled("  Keys", STYLE_HEADING)),
        key_line("↑↓", "Select thread"),
        key_line("P", "Pause / resume sampling"),
        key_line("R", "Restart trace on the current target"),
        key_line("T", "Edit target (process name or PID)"),
        key_line("Q", "Quit"),
        Line::from(""),
        Line::from(Span::styled("  Rankings", STYLE_HEADING)),
        Line::from(Span::styled("  Bars are relative to the top entry of each list.", STYLE_DIM)),
        Line::from(Span::styled("  Inclusive: anywhere on the stack. Exclusive: innermost frame.", STYLE_DIM)),
        Line::from(""),
        Line::from(Span::styled("  Press any key to close", STYLE_DIM)),
    ];

    let help_widget = Paragraph::new(help_text).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Help ")
            .style(Style::new().bg(ratatui::style::Color::Black).fg(TRACE_GREEN)),
    );

    f.render_widget(Clear, popup_area);
    f.render_widget(help_widget, popup_area);
}

fn render_target_overlay(f: &mut ratatui::Frame, area: Rect, input: &str) {
    let popup_area = centered_popup(area, 60, 3);
    let widget = Paragraph::new(target_prompt(input))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Process name or PID (Enter to apply, Esc to cancel)")
                .style(Style::default().bg(ratatui::style::Color::Black).fg(TRACE_GREEN)),
        )
        .style(Style::default().fg(CAUTION_AMBER));

    f.render_widget(Clear, popup_area);
    f.render_widget(widget, popup_area);
}

/// Input line for the target overlay, tagged with how the backend will match it.
fn target_prompt(input: &str) -> String {
    let rule = Rule::from(input);
    if rule.as_str().is_empty() {
        "Target: _".to_string()
    } else if rule.is_pid() {
        format!("Target (PID): {input}_")
    } else {
        format!("Target (name): {input}_")
    }
}

/// Create a centered popup area with given width percentage and height in lines
fn centered_popup(area: Rect, width_percent: u16, height_lines: u16) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Fill(1), Constraint::Length(height_lines), Constraint::Fill(1)])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - width_percent) / 2),
            Constraint::Percentage(width_percent),
            Constraint::Percentage((100 - width_percent) / 2),
        ])
        .split(vertical[1])[1]
}

// =============================================================================
// ENTRY POINT
// =============================================================================

/// Run the live monitor against `channel` until the user quits.
///
/// Each loop iteration:
/// 1. Delivers pending backend messages (the session swaps in new snapshots)
/// 2. Sends a snapshot request when the poll period is due
/// 3. Redraws at 10Hz from the current snapshot
/// 4. Handles keyboard input
///
/// The session is torn down before the terminal is restored.
///
/// # Errors
/// Returns an error if terminal setup or rendering fails
pub fn run_live(channel: Rc<dyn BackendChannel>, config: &SessionConfig) -> Result<()> {
    // -------------------------------------------------------------------------
    // Terminal Setup
    // -------------------------------------------------------------------------
    let mut app = LiveApp::new(Rc::clone(&channel), config);
    app.session.mount(Instant::now())?;

    enable_raw_mode().context("Failed to enable raw terminal mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    let mut last_draw: Option<Instant> = None;

    // -------------------------------------------------------------------------
    // Main Event Loop
    // -------------------------------------------------------------------------
    let result: Result<()> = loop {
        channel.dispatch_pending();
        app.session.tick(Instant::now());

        let redraw_due = match last_draw {
            Some(at) => at.elapsed() >= REDRAW_INTERVAL,
            None => true,
        };
        if redraw_due {
            // Hold one snapshot for the whole frame
            let snapshot = app.session.current();
            if let Err(e) = terminal.draw(|f| app.draw(f, snapshot.as_deref())) {
                break Err(e.into());
            }
            last_draw = Some(Instant::now());
        }

        // Wait for input, but never past the next poll
        let wait = app
            .session
            .next_deadline()
            .map_or(Duration::from_millis(50), |due| due.saturating_duration_since(Instant::now()))
            .min(Duration::from_millis(50));
        match event::poll(wait) {
            Ok(true) => match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => app.handle_key(key.code),
                Ok(_) => {}
                Err(e) => break Err(e.into()),
            },
            Ok(false) => {}
            Err(e) => break Err(e.into()),
        }

        if app.should_quit || app.session.state() == SessionState::TornDown {
            break Ok(());
        }
    };

    app.session.unmount();
    info!("Session stats: {:?}", app.session.stats());

    // Cleanup terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MemoryChannel;
    use livetrace_common::{Envelope, Request};
    use serde_json::json;

    fn setup() -> (Rc<MemoryChannel>, LiveApp) {
        let channel = Rc::new(MemoryChannel::new());
        let mut app = LiveApp::new(channel.clone(), &SessionConfig::default());
        app.session.mount(Instant::now()).unwrap();
        channel.take_posted();
        (channel, app)
    }

    fn type_keys(app: &mut LiveApp, text: &str) {
        for c in text.chars() {
            app.handle_key(KeyCode::Char(c));
        }
    }

    #[test]
    fn test_edit_target_applies_on_enter() {
        let (channel, mut app) = setup();

        app.handle_key(KeyCode::Char('t'));
        assert_eq!(app.view_mode, ViewMode::EditTarget);
        assert_eq!(app.target_input, "livetrace.exe");

        for _ in 0.."livetrace.exe".len() {
            app.handle_key(KeyCode::Backspace);
        }
        type_keys(&mut app, "1234");
        app.handle_key(KeyCode::Enter);

        assert_eq!(app.view_mode, ViewMode::Monitor);
        assert_eq!(channel.posted(), vec![Request::Process { rule: "1234".into() }]);
    }

    #[test]
    fn test_target_prompt_tags_pid_or_name() {
        assert_eq!(target_prompt("1234"), "Target (PID): 1234_");
        assert_eq!(target_prompt("livetrace.exe"), "Target (name): livetrace.exe_");
        assert_eq!(target_prompt(""), "Target: _");
    }

    #[test]
    fn test_edit_target_escape_cancels() {
        let (channel, mut app) = setup();

        app.handle_key(KeyCode::Char('t'));
        type_keys(&mut app, "x");
        app.handle_key(KeyCode::Esc);

        assert_eq!(app.view_mode, ViewMode::Monitor);
        assert!(channel.posted().is_empty());
        assert!(!app.should_quit);
    }

    #[test]
    fn test_pause_and_restart_keys() {
        let (channel, mut app) = setup();
        app.handle_key(KeyCode::Char('p'));
        app.handle_key(KeyCode::Char('r'));
        assert_eq!(
            channel.posted(),
            vec![Request::Pause, Request::Process { rule: "livetrace.exe".into() }]
        );
    }

    #[test]
    fn test_thread_cursor_selects_thread() {
        let (channel, mut app) = setup();
        channel.deliver(Envelope::new(
            "snapshot",
            json!({ "threads": [{ "id": 10 }, { "id": 11 }] }),
        ));
        channel.dispatch_pending();

        app.handle_key(KeyCode::Down);
        app.handle_key(KeyCode::Down);
        app.handle_key(KeyCode::Up);

        assert_eq!(
            channel.posted(),
            vec![
                Request::Thread { thread: 11 },
                Request::Thread { thread: 11 },
                Request::Thread { thread: 10 },
            ]
        );
    }

    #[test]
    fn test_thread_keys_without_snapshot_do_nothing() {
        let (channel, mut app) = setup();
        app.handle_key(KeyCode::Down);
        assert!(channel.posted().is_empty());
    }

    #[test]
    fn test_help_closes_on_any_key() {
        let (_channel, mut app) = setup();
        app.handle_key(KeyCode::Char('?'));
        assert_eq!(app.view_mode, ViewMode::Help);
        app.handle_key(KeyCode::Char('q'));
        assert_eq!(app.view_mode, ViewMode::Monitor);
        assert!(!app.should_quit);
    }
}
