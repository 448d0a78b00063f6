//! TUI application state and event loop.
//!
//! `App` keeps a mirror of the core's board state, updated only through
//! [`Event`]s, plus everything that is purely presentational: the current
//! view, the keyboard cursor, the drag session and the toasts.

use anyhow::Result;
use crossterm::event::{KeyEvent, MouseEvent};
use pb_core::pipeline::DragController;
use pb_core::projection::{history, kanban, list, HistoryEntry, KanbanProjection, ListRow, Viewer};
use pb_core::state::BoardState;
use pb_core::store::LoadState;
use pb_protocol::{EntityKind, Event, NotificationLevel, Op, Role};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;
use std::time::Instant;
use tokio::select;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_stream::StreamExt;
use tracing::warn;

use crate::event_handler;
use crate::tui::{Tui, TuiEvent};
use crate::widgets::toast::TOAST_TTL;
use crate::widgets::{render_kanban, BoardLayout, HistoryView, KanbanCursor, ListView, Toasts};

/// The three projections of the current kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Kanban,
    List,
    History,
}

impl ViewMode {
    pub const ALL: [ViewMode; 3] = [ViewMode::Kanban, ViewMode::List, ViewMode::History];

    pub fn label(self) -> &'static str {
        match self {
            ViewMode::Kanban => "Tablero",
            ViewMode::List => "Lista",
            ViewMode::History => "Historial",
        }
    }

    pub fn next(self) -> ViewMode {
        match self {
            ViewMode::Kanban => ViewMode::List,
            ViewMode::List => ViewMode::History,
            ViewMode::History => ViewMode::Kanban,
        }
    }
}

pub struct App {
    /// Kind shown on the board.
    pub kind: EntityKind,
    pub viewer: Viewer,
    /// Mirror of the core's state.
    pub board: BoardState,
    pub view: ViewMode,
    pub drag: DragController,
    pub cursor: KanbanCursor,
    pub list: ListView,
    pub history: HistoryView,
    pub toasts: Toasts,
    /// Geometry of the last rendered board, for mouse hit-testing.
    pub layout: BoardLayout,
    pub op_tx: mpsc::Sender<Op>,
    pub event_rx: mpsc::Receiver<Event>,
    pub should_exit: bool,
}

impl App {
    pub fn new(kind: EntityKind, viewer: Viewer, op_tx: mpsc::Sender<Op>, event_rx: mpsc::Receiver<Event>) -> Self {
        Self {
            kind,
            viewer,
            board: BoardState::new(),
            view: ViewMode::default(),
            drag: DragController::new(),
            cursor: KanbanCursor::default(),
            list: ListView::new(),
            history: HistoryView::new(),
            toasts: Toasts::new(),
            layout: BoardLayout::default(),
            op_tx,
            event_rx,
            should_exit: false,
        }
    }

    /// Main event loop.
    ///
    /// Core events and terminal input are handled concurrently with
    /// `tokio::select!`; every change schedules a redraw.
    pub async fn run(&mut self, tui: &mut Tui) -> Result<()> {
        let mut tui_events = tui.event_stream();
        let frames = tui.frame_requester();

        self.send(Op::LoadBoard { kind: self.kind });
        frames.schedule_frame();

        while !self.should_exit {
            select! {
                Some(event) = self.event_rx.recv() => {
                    let toast = matches!(event, Event::Notification { .. });
                    self.handle_core_event(event);
                    frames.schedule_frame();
                    if toast {
                        frames.schedule_frame_in(TOAST_TTL);
                    }
                }
                Some(tui_event) = tui_events.next() => {
                    match tui_event {
                        TuiEvent::Key(key) => {
                            self.handle_key_event(key);
                            frames.schedule_frame();
                        }
                        TuiEvent::Mouse(mouse) => {
                            self.handle_mouse_event(mouse);
                            frames.schedule_frame();
                        }
                        TuiEvent::Draw => {
                            self.toasts.prune(Instant::now());
                            tui.draw(|frame| self.render(frame))?;
                            continue;
                        }
                    }
                    // A dropped operation may have raised a toast.
                    if !self.toasts.is_empty() {
                        frames.schedule_frame_in(TOAST_TTL);
                    }
                }
                else => break,
            }
        }

        self.send(Op::Shutdown);
        Ok(())
    }

    pub fn handle_core_event(&mut self, event: Event) {
        event_handler::handle_core_event(self, event);
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) {
        event_handler::handle_key_event(self, key);
    }

    pub fn handle_mouse_event(&mut self, mouse: MouseEvent) {
        event_handler::handle_mouse_event(self, mouse);
    }

    /// Queue an operation for the core.
    ///
    /// When the channel is full or closed the operation is dropped and the
    /// user gets an error toast, except for `Shutdown`.
    pub fn send(&mut self, op: Op) {
        let Err(e) = self.op_tx.try_send(op) else {
            return;
        };
        warn!(error = %e, "could not send operation to core");

        let reason = match &e {
            TrySendError::Full(_) => "el tablero está ocupado",
            TrySendError::Closed(_) => "el tablero dejó de responder",
        };
        let message = match e.into_inner() {
            Op::MoveEntity {
                kind,
                entity_id,
                target_stage,
            } => {
                let title = self
                    .board
                    .entity(kind, &entity_id)
                    .map_or(entity_id.as_str(), |e| e.display_title());
                format!("No se pudo mover \"{title}\" a \"{target_stage}\": {reason}. Intenta de nuevo.")
            }
            Op::LoadBoard { .. } | Op::Refresh { .. } => {
                format!("No se pudo cargar el tablero: {reason}. Presiona r para reintentar.")
            }
            Op::Shutdown => return,
        };
        self.toasts.push(NotificationLevel::Error, message, Instant::now());
    }

    pub fn kanban_projection(&self) -> KanbanProjection {
        kanban(self.kind, self.board.entity_list(self.kind), &self.viewer)
    }

    pub fn list_rows(&self) -> Vec<ListRow> {
        list(self.kind, self.board.entity_list(self.kind), &self.viewer, &self.list.query)
    }

    pub fn history_entries(&self) -> Vec<HistoryEntry> {
        history(
            self.kind,
            self.board.entity_list(self.kind),
            self.board.activities().data().map_or(&[], Vec::as_slice),
            self.board.users().data().map_or(&[], Vec::as_slice),
            &self.viewer,
        )
    }

    pub fn render(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(0), Constraint::Length(1)])
            .split(frame.area());

        self.render_header(frame, chunks[0]);
        self.render_body(frame, chunks[1]);
        self.render_footer(frame, chunks[2]);
        self.toasts.render(frame, chunks[1]);
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let mut spans = vec![
            Span::styled(" Pipeline Board ", Style::default().fg(Color::Black).bg(Color::Cyan)),
            Span::raw("  "),
            Span::styled(self.kind.label(), Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  │ "),
        ];
        for mode in ViewMode::ALL {
            let style = if mode == self.view {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
            } else {
                Style::default().fg(Color::Gray)
            };
            spans.push(Span::styled(mode.label(), style));
            spans.push(Span::raw(" "));
        }
        let role = match self.viewer.role {
            Role::Admin => "admin",
            Role::Manager => "gerente",
            Role::Salesperson => "vendedor",
        };
        spans.push(Span::styled(
            format!("│ {} ({role})", self.viewer.user_id),
            Style::default().fg(Color::DarkGray),
        ));
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn render_body(&mut self, frame: &mut Frame, area: Rect) {
        match self.board.entities(self.kind) {
            LoadState::Pending => {
                render_message(frame, area, "Cargando…", Color::Gray);
                return;
            }
            LoadState::Failed(error) => {
                let message = format!(
                    "No se pudieron cargar {}: {error}\n\nPresiona r para reintentar.",
                    self.kind.label().to_lowercase()
                );
                render_message(frame, area, &message, Color::Red);
                return;
            }
            LoadState::Loaded(_) => {}
        }

        match self.view {
            ViewMode::Kanban => {
                let projection = self.kanban_projection();
                self.layout = render_kanban(frame, area, &projection, self.cursor, self.drag.session());
            }
            ViewMode::List => {
                let rows = self.list_rows();
                self.list.render(frame, area, &rows);
            }
            ViewMode::History => {
                if let LoadState::Failed(error) = self.board.activities() {
                    let message = format!("No se pudo cargar el historial: {error}\n\nPresiona r para reintentar.");
                    render_message(frame, area, &message, Color::Red);
                    return;
                }
                let entries = self.history_entries();
                self.history.render(frame, area, &entries);
            }
        }
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect) {
        let help = match (self.view, self.drag.session()) {
            (ViewMode::Kanban, Some(session)) => {
                let title = self
                    .board
                    .entity(self.kind, &session.dragged_entity_id)
                    .map_or(session.dragged_entity_id.as_str(), |e| e.display_title());
                format!(
                    " Arrastrando «{title}» → {} · ←/→ columna · Espacio soltar · Esc cancelar",
                    session.hover.as_deref().unwrap_or("fuera del tablero")
                )
            }
            (ViewMode::Kanban, None) => {
                " ←↑↓→ mover · Espacio tomar · Tab vista · k tipo · r recargar · q salir".to_string()
            }
            (ViewMode::List, _) => {
                " / filtrar · s orden · d dirección · f etapa · Tab vista · k tipo · q salir".to_string()
            }
            (ViewMode::History, _) => " ↑↓ desplazar · Tab vista · k tipo · r recargar · q salir".to_string(),
        };
        frame.render_widget(Paragraph::new(help).style(Style::default().fg(Color::DarkGray)), area);
    }
}

fn render_message(frame: &mut Frame, area: Rect, message: &str, color: Color) {
    let paragraph = Paragraph::new(message)
        .wrap(Wrap { trim: false })
        .style(Style::default().fg(color))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pb_protocol::{LoadTarget, PipelineEntity};
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn app() -> (App, mpsc::Receiver<Op>) {
        let (op_tx, op_rx) = mpsc::channel(16);
        let (_event_tx, event_rx) = mpsc::channel(16);
        (App::new(EntityKind::Quote, Viewer::admin("u-001"), op_tx, event_rx), op_rx)
    }

    fn screen(app: &mut App) -> String {
        let backend = TestBackend::new(160, 24);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|frame| app.render(frame)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_renders_loading_then_board() {
        let (mut app, _op_rx) = app();
        assert!(screen(&mut app).contains("Cargando"));

        app.handle_core_event(Event::EntitiesLoaded {
            kind: EntityKind::Quote,
            entities: vec![PipelineEntity::new("q-1", "COT-101", "Borrador")],
        });
        let content = screen(&mut app);
        assert!(content.contains("Cotizaciones"));
        assert!(content.contains("COT-101"));
        assert!(content.contains("Borrador (1)"));
    }

    #[test]
    fn test_failed_load_offers_retry_not_empty_board() {
        let (mut app, _op_rx) = app();
        app.handle_core_event(Event::LoadFailed {
            target: LoadTarget::Entities(EntityKind::Quote),
            error: "error de red".to_string(),
        });

        let content = screen(&mut app);
        assert!(content.contains("error de red"));
        assert!(content.contains("reintentar"));
        assert!(!content.contains("Borrador (0)"));
    }

    #[test]
    fn test_view_cycle() {
        assert_eq!(ViewMode::Kanban.next(), ViewMode::List);
        assert_eq!(ViewMode::List.next(), ViewMode::History);
        assert_eq!(ViewMode::History.next(), ViewMode::Kanban);
    }

    #[test]
    fn test_send_survives_closed_core() {
        let (mut app, op_rx) = app();
        drop(op_rx);
        app.send(Op::Shutdown);
        assert!(app.toasts.is_empty());

        app.send(Op::Refresh { kind: EntityKind::Quote });
        let toast = app.toasts.iter().next().unwrap();
        assert_eq!(toast.level, NotificationLevel::Error);
        assert!(toast.message.contains("dejó de responder"));
    }

    #[test]
    fn test_move_dropped_on_full_channel_raises_toast() {
        let (op_tx, mut op_rx) = mpsc::channel(1);
        let (_event_tx, event_rx) = mpsc::channel(16);
        let mut app = App::new(EntityKind::Quote, Viewer::admin("u-001"), op_tx, event_rx);
        app.handle_core_event(Event::EntitiesLoaded {
            kind: EntityKind::Quote,
            entities: vec![PipelineEntity::new("q-1", "COT-101", "Borrador")],
        });

        app.send(Op::Refresh { kind: EntityKind::Quote });
        app.send(Op::MoveEntity {
            kind: EntityKind::Quote,
            entity_id: "q-1".to_string(),
            target_stage: "Enviada".to_string(),
        });

        assert!(matches!(op_rx.try_recv(), Ok(Op::Refresh { .. })));
        assert!(op_rx.try_recv().is_err());
        let messages: Vec<_> = app.toasts.iter().map(|t| t.message.as_str()).collect();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("COT-101"));
        assert!(messages[0].contains("ocupado"));
        assert!(screen(&mut app).contains("Error"));
    }
}
