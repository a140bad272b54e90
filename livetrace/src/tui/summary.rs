//! Summary panel - target process and trace counters.
//!
//! ```text
//! [ SUMMARY ]
//! Target  game.exe (1234)      State   Running
//! Samples 5,000 (2500.00/sec)  CPU     12.50%
//! Phys    52,428,800           Virt    1,073,741,824
//! ```

use livetrace_common::Snapshot;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::theme::{state_color, CAUTION_AMBER, INFO_DIM, TRACE_GREEN};
use crate::views::SummaryView;

const LABEL: Style = Style::new().fg(CAUTION_AMBER).add_modifier(Modifier::BOLD);
const VALUE: Style = Style::new().fg(TRACE_GREEN);

pub struct SummaryPanel {
    view: SummaryView,
    state_style: Style,
}

impl SummaryPanel {
    pub fn new(snapshot: Option<&Snapshot>) -> Self {
        let state = snapshot.map(|s| s.state).unwrap_or_default();
        Self {
            view: SummaryView::new(snapshot),
            state_style: Style::new().fg(state_color(state)).add_modifier(Modifier::BOLD),
        }
    }

    pub fn render(&self, f: &mut Frame, area: Rect, rule: &str) {
        let v = &self.view;
        let pair = |label: &'static str, value: String, style: Style| {
            [Span::styled(format!("{label:<8}"), LABEL), Span::styled(format!("{value:<28}"), style)]
        };

        let lines = vec![
            Line::from(
                [
                    pair("Target", v.target.clone(), VALUE),
                    pair("State", v.state.clone(), self.state_style),
                ]
                .concat(),
            ),
            Line::from(
                [pair("Samples", v.samples.clone(), VALUE), pair("CPU", v.cpu.clone(), VALUE)]
                    .concat(),
            ),
            Line::from(
                [
                    pair("Phys", v.physical_memory.clone(), VALUE),
                    pair("Virt", v.virtual_memory.clone(), VALUE),
                ]
                .concat(),
            ),
            Line::from(vec![
                Span::styled(format!("{:<8}", "Rule"), LABEL),
                Span::styled(rule.to_string(), Style::new().fg(INFO_DIM)),
            ]),
        ];

        let paragraph = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title("[ SUMMARY ]")
                .border_style(Style::default().fg(TRACE_GREEN)),
        );
        f.render_widget(paragraph, area);
    }
}
