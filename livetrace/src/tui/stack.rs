//! Stack trace panel with the inclusive/exclusive rankings underneath.
//!
//! ```text
//! [ STACK ]
//!   #  ADDRESS            SOURCE        INCL   EXCL
//!   0  leaf+0x4           leaf.c:12        8      8
//!   1  main+0x16                          10      0
//! [ INCLUSIVE TOP 20 ]          [ EXCLUSIVE TOP 20 ]
//!   main+0x16  (10) ██████████   leaf+0x4  (8) ██████████
//!   leaf+0x4    (8) ████████░░
//! ```

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::theme::{gauge_bar, heat_color, CAUTION_AMBER, INFO_DIM, TRACE_GREEN};
use crate::analysis::{CostKind, RankEntry};
use crate::views::StackTraceView;

const BAR_WIDTH: usize = 10;

pub struct StackPanel<'a> {
    view: &'a StackTraceView,
    limit: usize,
}

impl<'a> StackPanel<'a> {
    pub fn new(view: &'a StackTraceView, limit: usize) -> Self {
        Self { view, limit }
    }

    pub fn render(&self, f: &mut Frame, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(area);
        let rankings = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[1]);

        self.render_frames(f, rows[0]);
        self.render_ranking(f, rankings[0], CostKind::Inclusive, &self.view.inclusive);
        self.render_ranking(f, rankings[1], CostKind::Exclusive, &self.view.exclusive);
    }

    fn render_frames(&self, f: &mut Frame, area: Rect) {
        let mut lines = vec![Line::from(Span::styled(
            format!("{:>3}  {:<32} {:<28} {:>8} {:>8}", "#", "ADDRESS", "SOURCE", "INCL", "EXCL"),
            Style::new().fg(INFO_DIM),
        ))];
        lines.extend(self.view.rows.iter().map(|row| {
            Line::from(Span::styled(
                format!(
                    "{:>3}  {:<32} {:<28} {:>8} {:>8}",
                    row.index, row.address, row.source, row.inclusive, row.exclusive
                ),
                Style::new().fg(TRACE_GREEN),
            ))
        }));

        let paragraph = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title("[ STACK ]")
                .border_style(Style::default().fg(TRACE_GREEN)),
        );
        f.render_widget(paragraph, area);
    }

    fn render_ranking(&self, f: &mut Frame, area: Rect, kind: CostKind, entries: &[RankEntry]) {
        let lines: Vec<Line> = entries
            .iter()
            .map(|entry| {
                let color = heat_color(entry.percentage);
                Line::from(vec![
                    Span::styled(format!("{:<28}", entry.label), Style::new().fg(TRACE_GREEN)),
                    Span::styled(format!("{:>8} ", format!("({})", entry.count)), Style::new().fg(INFO_DIM)),
                    Span::styled(gauge_bar(entry.percentage, BAR_WIDTH), Style::new().fg(color)),
                ])
            })
            .collect();

        let paragraph = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("[ {} TOP {} ]", kind.title(), self.limit))
                .border_style(Style::default().fg(CAUTION_AMBER)),
        );
        f.render_widget(paragraph, area);
    }
}
