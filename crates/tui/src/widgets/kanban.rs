//! Kanban board widget.
//!
//! Renders a [`KanbanProjection`] as grouped stage columns of two-line
//! cards and returns a [`BoardLayout`] describing where every column and
//! card landed, so mouse input can be hit-tested against the last frame.

use super::format_amount;
use pb_core::pipeline::{descriptor, DragSession};
use pb_core::projection::KanbanProjection;
use ratatui::layout::{Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

const CARD_HEIGHT: u16 = 2;

/// A rendered card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardArea {
    pub entity_id: String,
    pub stage: &'static str,
    pub column: usize,
    pub row: usize,
    pub rect: Rect,
}

/// Screen geometry of the last rendered board.
#[derive(Debug, Clone, Default)]
pub struct BoardLayout {
    columns: Vec<(&'static str, Rect)>,
    cards: Vec<CardArea>,
    archive: Option<(&'static str, Rect)>,
}

impl BoardLayout {
    /// The stage a card released at `(x, y)` would land on.
    pub fn drop_target_at(&self, x: u16, y: u16) -> Option<&'static str> {
        let at = Position::new(x, y);
        self.columns
            .iter()
            .chain(self.archive.iter())
            .find(|(_, rect)| rect.contains(at))
            .map(|(stage, _)| *stage)
    }

    pub fn card_at(&self, x: u16, y: u16) -> Option<&CardArea> {
        let at = Position::new(x, y);
        self.cards.iter().find(|card| card.rect.contains(at))
    }

    pub fn card(&self, entity_id: &str) -> Option<&CardArea> {
        self.cards.iter().find(|card| card.entity_id == entity_id)
    }

    pub fn column_rect(&self, stage: &str) -> Option<Rect> {
        self.columns
            .iter()
            .chain(self.archive.iter())
            .find(|(s, _)| *s == stage)
            .map(|(_, rect)| *rect)
    }
}

/// Keyboard selection on the board.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KanbanCursor {
    pub column: usize,
    pub row: usize,
}

/// Render the board into `area`.
///
/// Kinds with an archive stage get a drop zone under the columns; archived
/// entities never appear as cards.
pub fn render_kanban(
    frame: &mut Frame,
    area: Rect,
    projection: &KanbanProjection,
    cursor: KanbanCursor,
    drag: Option<&DragSession>,
) -> BoardLayout {
    let descriptor = descriptor(projection.kind);
    let mut layout = BoardLayout::default();

    let (board_area, archive_area) = match descriptor.archive_stage {
        Some(_) => {
            let split = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(3)])
                .split(area);
            (split[0], Some(split[1]))
        }
        None => (area, None),
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(board_area);

    let column_count = projection.columns().count().max(1) as u32;
    let column_rects = Layout::default()
        .direction(Direction::Horizontal)
        .constraints((0..column_count).map(|_| Constraint::Ratio(1, column_count)))
        .split(rows[1]);

    let hover = drag.and_then(|session| session.hover.as_deref());
    let mut index = 0;
    for group in &projection.groups {
        let first = index;
        for column in &group.columns {
            let Some(rect) = column_rects.get(index).copied() else {
                break;
            };
            let stage = column.stage.stage;
            layout.columns.push((stage, rect));

            let border = if hover == Some(stage) {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else if drag.is_none() && cursor.column == index {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default().fg(Color::DarkGray)
            };

            let block = Block::default()
                .borders(Borders::ALL)
                .border_style(border)
                .title(format!("{stage} ({})", column.count))
                .title_bottom(Line::from(format_amount(column.value_total)).right_aligned());
            let inner = block.inner(rect);
            frame.render_widget(block, rect);

            let selected_row = (cursor.column == index).then_some(cursor.row);
            for (row, entity) in column.entities.iter().enumerate() {
                let y = inner.y + row as u16 * CARD_HEIGHT;
                if y + CARD_HEIGHT > inner.bottom() {
                    let hidden = column.entities.len() - row;
                    let more = Rect::new(inner.x, inner.bottom().saturating_sub(1), inner.width, 1);
                    frame.render_widget(
                        Paragraph::new(format!("+{hidden} más")).style(Style::default().fg(Color::DarkGray)),
                        more,
                    );
                    break;
                }

                let card_rect = Rect::new(inner.x, y, inner.width, CARD_HEIGHT);
                let dragged = drag.is_some_and(|s| s.dragged_entity_id == entity.id);
                let title_style = if dragged {
                    Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC)
                } else if selected_row == Some(row) {
                    Style::default().add_modifier(Modifier::REVERSED | Modifier::BOLD)
                } else {
                    Style::default().add_modifier(Modifier::BOLD)
                };
                let value = descriptor
                    .aggregate_field
                    .and_then(|field| entity.numeric_field(field))
                    .map(format_amount)
                    .unwrap_or_default();

                let lines = vec![
                    Line::from(Span::styled(entity.display_title().to_string(), title_style)),
                    Line::from(Span::styled(value, Style::default().fg(Color::Gray))),
                ];
                frame.render_widget(Paragraph::new(lines), card_rect);

                layout.cards.push(CardArea {
                    entity_id: entity.id.clone(),
                    stage,
                    column: index,
                    row,
                    rect: card_rect,
                });
            }
            index += 1;
        }

        if let (Some(start), Some(end)) = (column_rects.get(first), column_rects.get(index.saturating_sub(1))) {
            let header = Rect::new(start.x, rows[0].y, (end.x + end.width).saturating_sub(start.x), 1);
            frame.render_widget(
                Paragraph::new(group.name)
                    .centered()
                    .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
                header,
            );
        }
    }

    if let (Some(stage), Some(rect)) = (descriptor.archive_stage, archive_area) {
        let style = if hover == Some(stage) {
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let text = format!("Suelta aquí para archivar ({} archivadas)", projection.archived);
        frame.render_widget(
            Paragraph::new(text)
                .centered()
                .block(Block::default().borders(Borders::ALL).border_style(style).title(stage)),
            rect,
        );
        layout.archive = Some((stage, rect));
    }

    layout
}

#[cfg(test)]
mod tests {
    use super::*;
    use pb_core::projection::{kanban, Viewer};
    use pb_protocol::{EntityKind, PipelineEntity};
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn quotes() -> Vec<PipelineEntity> {
        vec![
            PipelineEntity::new("q-1", "COT-101", "Borrador").with_field("total", 100),
            PipelineEntity::new("q-2", "COT-102", "Enviada").with_field("total", 250),
        ]
    }

    fn draw(projection: &KanbanProjection, drag: Option<&DragSession>) -> (String, BoardLayout) {
        let backend = TestBackend::new(160, 20);
        let mut terminal = Terminal::new(backend).unwrap();
        let mut layout = BoardLayout::default();
        terminal
            .draw(|frame| {
                layout = render_kanban(frame, frame.area(), projection, KanbanCursor::default(), drag);
            })
            .unwrap();
        let content = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect::<String>();
        (content, layout)
    }

    #[test]
    fn test_renders_groups_columns_and_cards() {
        let projection = kanban(EntityKind::Quote, &quotes(), &Viewer::admin("u-1"));
        let (content, layout) = draw(&projection, None);

        assert!(content.contains("Elaboración"));
        assert!(content.contains("Seguimiento"));
        assert!(content.contains("COT-101"));
        assert!(content.contains("Enviada (1)"));
        assert_eq!(layout.cards.len(), 2);
        assert_eq!(layout.columns.len(), 7);
        assert!(layout.archive.is_none());
    }

    #[test]
    fn test_hit_testing_matches_rendered_geometry() {
        let projection = kanban(EntityKind::Quote, &quotes(), &Viewer::admin("u-1"));
        let (_, layout) = draw(&projection, None);

        let card = layout.card("q-2").unwrap().clone();
        assert_eq!(card.stage, "Enviada");
        assert_eq!(
            layout.card_at(card.rect.x, card.rect.y).map(|c| c.entity_id.as_str()),
            Some("q-2")
        );
        assert_eq!(layout.drop_target_at(card.rect.x, card.rect.y), Some("Enviada"));

        let accepted = layout.column_rect("Aceptada").unwrap();
        assert_eq!(layout.drop_target_at(accepted.x + 1, accepted.y + 1), Some("Aceptada"));
        // The group header row is not a drop target.
        assert_eq!(layout.drop_target_at(accepted.x + 1, 0), None);
    }

    #[test]
    fn test_samples_get_an_archive_zone() {
        let samples = vec![
            PipelineEntity::new("s-1", "Muestra", "Aprobada"),
            PipelineEntity::new("s-2", "Vieja", "Archivada"),
        ];
        let projection = kanban(EntityKind::Sample, &samples, &Viewer::admin("u-1"));
        let (content, layout) = draw(&projection, None);

        assert!(content.contains("1 archivadas"));
        assert!(layout.card("s-2").is_none());
        let zone = layout.column_rect("Archivada").unwrap();
        assert_eq!(layout.drop_target_at(zone.x + 2, zone.y + 1), Some("Archivada"));
    }
}
