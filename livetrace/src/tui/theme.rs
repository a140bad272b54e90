//! TUI color theme

use livetrace_common::TraceState;
use ratatui::style::Color;

pub const TRACE_GREEN: Color = Color::Rgb(0, 255, 0);
pub const CRITICAL_RED: Color = Color::Rgb(255, 0, 0);
pub const CAUTION_AMBER: Color = Color::Rgb(255, 191, 0);
pub const INFO_DIM: Color = Color::Rgb(0, 180, 0);
pub const ACCENT_CYAN: Color = Color::Rgb(0, 255, 255);

/// Color for a ranking bar: the hotter the entry, the warmer the color.
#[must_use]
pub fn heat_color(percentage: f64) -> Color {
    if percentage > 75.0 {
        CRITICAL_RED
    } else if percentage > 40.0 {
        CAUTION_AMBER
    } else {
        TRACE_GREEN
    }
}

#[must_use]
pub fn state_color(state: TraceState) -> Color {
    match state {
        TraceState::Running => TRACE_GREEN,
        TraceState::Paused => CAUTION_AMBER,
        TraceState::Failed => CRITICAL_RED,
        TraceState::Idle | TraceState::Exited | TraceState::Unknown(_) => INFO_DIM,
    }
}

/// Fixed-width bar: `gauge_bar(60.0, 10)` → `"██████░░░░"`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub fn gauge_bar(percentage: f64, width: usize) -> String {
    let filled = ((percentage.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    let filled = filled.min(width);
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gauge_bar() {
        assert_eq!(gauge_bar(100.0, 10), "██████████");
        assert_eq!(gauge_bar(60.0, 10), "██████░░░░");
        assert_eq!(gauge_bar(0.0, 4), "░░░░");
        assert_eq!(gauge_bar(250.0, 4), "████");
    }

    #[test]
    fn test_heat_color() {
        assert_eq!(heat_color(100.0), CRITICAL_RED);
        assert_eq!(heat_color(50.0), CAUTION_AMBER);
        assert_eq!(heat_color(10.0), TRACE_GREEN);
    }
}
