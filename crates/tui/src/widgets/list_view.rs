//! Table view of a kind's entities with filtering and sorting.

use super::format_amount;
use crate::event::EventStatus;
use crossterm::event::{KeyCode, KeyEvent};
use pb_core::pipeline::descriptor;
use pb_core::projection::{ListQuery, ListRow, SortDirection};
use pb_protocol::EntityKind;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState};
use ratatui::Frame;

#[derive(Debug, Default)]
pub struct ListView {
    pub query: ListQuery,
    pub selected: usize,
    /// Typing goes into the text filter.
    pub editing: bool,
}

impl ListView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle a key for this view.
    ///
    /// While the filter is being edited every key is consumed.
    pub fn handle_key(&mut self, key: KeyEvent, kind: EntityKind, row_count: usize) -> EventStatus {
        if self.editing {
            match key.code {
                KeyCode::Char(c) => self.query.text.get_or_insert_with(String::new).push(c),
                KeyCode::Backspace => {
                    if let Some(text) = self.query.text.as_mut() {
                        text.pop();
                    }
                }
                KeyCode::Enter | KeyCode::Esc => self.editing = false,
                _ => {}
            }
            self.selected = 0;
            return EventStatus::Consumed;
        }

        match key.code {
            KeyCode::Char('/') => self.editing = true,
            KeyCode::Char('s') => self.query.sort = self.query.sort.next(),
            KeyCode::Char('d') => self.query.direction = self.query.direction.toggled(),
            KeyCode::Char('f') => self.cycle_stage_filter(kind),
            KeyCode::Up => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down => {
                if self.selected + 1 < row_count {
                    self.selected += 1;
                }
            }
            _ => return EventStatus::NotConsumed,
        }
        EventStatus::Consumed
    }

    /// No filter, then each catalog stage in order, then no filter again.
    fn cycle_stage_filter(&mut self, kind: EntityKind) {
        let stages = descriptor(kind).stages;
        let next = match self.query.stage.as_deref() {
            None => stages.first(),
            Some(current) => stages
                .iter()
                .position(|s| s.stage == current)
                .and_then(|i| stages.get(i + 1)),
        };
        self.query.stage = next.map(|s| s.stage.to_string());
        self.selected = 0;
    }

    /// Drop filters that no longer apply after switching kinds.
    pub fn reset(&mut self) {
        self.query.stage = None;
        self.selected = 0;
        self.editing = false;
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, rows: &[ListRow]) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(0)])
            .split(area);

        let arrow = match self.query.direction {
            SortDirection::Ascending => "↑",
            SortDirection::Descending => "↓",
        };
        let filter = format!(
            " Filtro: {}{}  Etapa: {}  Orden: {} {}",
            self.query.text.as_deref().unwrap_or(""),
            if self.editing { "▏" } else { "" },
            self.query.stage.as_deref().unwrap_or("todas"),
            self.query.sort.label(),
            arrow,
        );
        let filter_style = if self.editing {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::Gray)
        };
        frame.render_widget(Paragraph::new(filter).style(filter_style), chunks[0]);

        let table_rows: Vec<Row> = rows
            .iter()
            .map(|row| {
                let stage_style = if row.archived {
                    Style::default().fg(Color::DarkGray)
                } else {
                    Style::default().fg(Color::Green)
                };
                Row::new(vec![
                    Cell::from(row.entity.display_title().to_string()),
                    Cell::from(row.entity.stage.clone()).style(stage_style),
                    Cell::from(row.group.unwrap_or("-")),
                    Cell::from(row.value.map(format_amount).unwrap_or_default()),
                    Cell::from(
                        row.entity
                            .updated_at
                            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                            .unwrap_or_default(),
                    ),
                ])
            })
            .collect();

        let header = Row::new(vec!["Título", "Etapa", "Grupo", "Valor", "Actualizado"])
            .style(Style::default().add_modifier(Modifier::BOLD).fg(Color::Cyan));
        let widths = [
            Constraint::Percentage(35),
            Constraint::Length(16),
            Constraint::Length(14),
            Constraint::Length(14),
            Constraint::Length(17),
        ];

        let table = Table::new(table_rows, widths)
            .header(header)
            .block(Block::default().borders(Borders::ALL).title(format!("Lista ({})", rows.len())))
            .row_highlight_style(
                Style::default()
                    .bg(Color::Blue)
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol(">> ");

        let mut state = TableState::default();
        if !rows.is_empty() {
            state.select(Some(self.selected.min(rows.len() - 1)));
        }
        frame.render_stateful_widget(table, chunks[1], &mut state);
    }
}
