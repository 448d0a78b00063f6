//! Scrollable activity history for the current kind.

use chrono::Local;
use pb_core::projection::HistoryEntry;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState};
use ratatui::Frame;

#[derive(Debug, Default)]
pub struct HistoryView {
    /// Lines scrolled from the top.
    pub scroll_offset: usize,
}

impl HistoryView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, entries: &[HistoryEntry]) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!("Historial ({})", entries.len()));

        if entries.is_empty() {
            frame.render_widget(Paragraph::new("Sin actividad registrada.").block(block), area);
            return;
        }

        let lines: Vec<Line> = entries.iter().map(entry_line).collect();
        let total_lines = lines.len();
        let paragraph = Paragraph::new(lines)
            .block(block)
            .scroll((self.scroll_offset as u16, 0));
        frame.render_widget(paragraph, area);

        let visible_lines = area.height.saturating_sub(2) as usize;
        if total_lines > visible_lines {
            let mut scrollbar_state = ScrollbarState::default()
                .content_length(total_lines)
                .viewport_content_length(visible_lines)
                .position(self.scroll_offset);
            let scrollbar = Scrollbar::default()
                .orientation(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("↑"))
                .end_symbol(Some("↓"));
            frame.render_stateful_widget(scrollbar, area, &mut scrollbar_state);
        }
    }

    pub fn scroll_up(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(1);
    }

    /// # Arguments
    ///
    /// * `max` - The largest offset, usually the entry count minus one
    pub fn scroll_down(&mut self, max: usize) {
        self.scroll_offset = (self.scroll_offset + 1).min(max);
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll_offset = 0;
    }
}

fn entry_line(entry: &HistoryEntry) -> Line<'static> {
    let when = entry
        .record
        .created_at
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M")
        .to_string();

    Line::from(vec![
        Span::styled(when, Style::default().fg(Color::DarkGray)),
        Span::raw("  "),
        Span::styled(entry.entity_title.clone(), Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("  "),
        Span::styled(entry.record.activity_type.label(), Style::default().fg(Color::Cyan)),
        Span::raw("  "),
        Span::raw(entry.record.description.clone()),
        Span::styled(format!("  · {}", entry.user_name), Style::default().fg(Color::Gray)),
    ])
}
