//! Thread list panel.
//!
//! The `>` marker follows the keyboard cursor; the active thread (the one
//! whose stack the backend is reporting) is drawn bold.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::theme::{ACCENT_CYAN, CAUTION_AMBER, INFO_DIM, TRACE_GREEN};
use crate::views::ThreadRow;

pub struct ThreadsPanel<'a> {
    rows: &'a [ThreadRow],
    cursor: usize,
}

impl<'a> ThreadsPanel<'a> {
    pub fn new(rows: &'a [ThreadRow], cursor: usize) -> Self {
        Self { rows, cursor }
    }

    pub fn render(&self, f: &mut Frame, area: Rect) {
        let mut lines = vec![Line::from(Span::styled(
            format!("  {:<10} {:<32} {:>16}", "TID", "ADDRESS", "CYCLES"),
            Style::new().fg(INFO_DIM),
        ))];

        if self.rows.is_empty() {
            lines.push(Line::from(Span::styled("  Waiting for snapshot...", Style::new().fg(INFO_DIM))));
        }

        lines.extend(self.rows.iter().enumerate().map(|(i, row)| {
            let marker = if i == self.cursor { ">" } else { " " };
            let mut style = Style::new().fg(if row.active { ACCENT_CYAN } else { TRACE_GREEN });
            if row.active {
                style = style.add_modifier(Modifier::BOLD);
            }
            Line::from(vec![
                Span::styled(format!("{marker} "), Style::new().fg(CAUTION_AMBER)),
                Span::styled(
                    format!("{:<10} {:<32} {:>16}", row.id.to_string(), row.address, row.cycles),
                    style,
                ),
            ])
        }));

        let paragraph = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title("[ THREADS ]")
                .border_style(Style::default().fg(TRACE_GREEN)),
        );
        f.render_widget(paragraph, area);
    }
}
