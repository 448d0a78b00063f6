//! Input and core-event handling for the TUI.
//!
//! - Core events update the mirrored board and raise toasts
//! - Keyboard: arrows select, space picks a card up and drops it, Esc
//!   cancels the drag
//! - Mouse: press on a card, drag over a column, release to drop
//!
//! A completed drop is sent to the core as [`Op::MoveEntity`]. Guards and
//! persistence run there; the board only changes when events come back.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use pb_core::pipeline::{descriptor, DropOutcome};
use pb_protocol::{EntityKind, Event, Op};
use std::time::Instant;
use tracing::debug;

use crate::app::{App, ViewMode};

pub fn handle_core_event(app: &mut App, event: Event) {
    if let Event::Notification { level, message } = &event {
        app.toasts.push(*level, message.clone(), Instant::now());
    }
    app.board.apply_event(&event);

    if matches!(event, Event::EntitiesLoaded { kind, .. } if kind == app.kind) {
        clamp_cursor(app);
    }
}

pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_exit = true;
        return;
    }

    if app.view == ViewMode::List {
        let row_count = app.list_rows().len();
        if app.list.handle_key(key, app.kind, row_count).is_consumed() {
            return;
        }
    }

    if app.view == ViewMode::Kanban && app.drag.is_dragging() {
        handle_drag_key(app, key);
        return;
    }

    match key.code {
        KeyCode::Char('q') => app.should_exit = true,
        KeyCode::Tab => app.view = app.view.next(),
        KeyCode::Char('k') => {
            let next = app.kind.next();
            switch_kind(app, next);
        }
        KeyCode::Char('r') => app.send(Op::Refresh { kind: app.kind }),
        _ => match app.view {
            ViewMode::Kanban => handle_board_key(app, key),
            ViewMode::History => handle_history_key(app, key),
            ViewMode::List => {}
        },
    }
}

pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent) {
    if app.view == ViewMode::History {
        match mouse.kind {
            MouseEventKind::ScrollDown => {
                let max = app.history_entries().len().saturating_sub(1);
                app.history.scroll_down(max);
            }
            MouseEventKind::ScrollUp => app.history.scroll_up(),
            _ => {}
        }
        return;
    }
    if app.view != ViewMode::Kanban {
        return;
    }

    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            if let Some(card) = app.layout.card_at(mouse.column, mouse.row).cloned() {
                app.cursor.column = card.column;
                app.cursor.row = card.row;
                app.drag.begin(card.entity_id, card.stage);
            }
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            let target = app.layout.drop_target_at(mouse.column, mouse.row);
            app.drag.hover(target);
        }
        MouseEventKind::Up(MouseButton::Left) => {
            if app.drag.is_dragging() {
                let target = app.layout.drop_target_at(mouse.column, mouse.row);
                let outcome = app.drag.drop_on(target);
                dispatch_drop(app, outcome);
            }
        }
        _ => {}
    }
}

fn handle_board_key(app: &mut App, key: KeyEvent) {
    let columns = column_entities(app);
    match key.code {
        KeyCode::Left => {
            app.cursor.column = app.cursor.column.saturating_sub(1);
        }
        KeyCode::Right => {
            if app.cursor.column + 1 < columns.len() {
                app.cursor.column += 1;
            }
        }
        KeyCode::Up => app.cursor.row = app.cursor.row.saturating_sub(1),
        KeyCode::Down => app.cursor.row += 1,
        KeyCode::Char(' ') | KeyCode::Enter => {
            if let Some((stage, ids)) = columns.get(app.cursor.column) {
                if let Some(id) = ids.get(app.cursor.row) {
                    app.drag.begin(id.clone(), *stage);
                }
            }
        }
        _ => {}
    }
    clamp_cursor(app);
}

/// While a card is held, arrows move the hover between drop targets.
fn handle_drag_key(app: &mut App, key: KeyEvent) {
    let targets = drop_targets(app.kind, &column_entities(app));
    let hover_index = app
        .drag
        .session()
        .and_then(|s| s.hover.as_deref())
        .and_then(|hover| targets.iter().position(|t| *t == hover));

    match key.code {
        KeyCode::Left | KeyCode::Right => {
            let next = match (key.code, hover_index) {
                (KeyCode::Left, Some(i)) => i.saturating_sub(1),
                (KeyCode::Right, Some(i)) => (i + 1).min(targets.len().saturating_sub(1)),
                _ => 0,
            };
            if let Some(target) = targets.get(next).copied() {
                app.drag.hover(Some(target));
            }
        }
        KeyCode::Char(' ') | KeyCode::Enter => {
            let outcome = app.drag.drop_on_hover();
            dispatch_drop(app, outcome);
        }
        KeyCode::Esc => {
            let outcome = app.drag.cancel();
            dispatch_drop(app, outcome);
        }
        _ => {}
    }
}

fn handle_history_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Up => app.history.scroll_up(),
        KeyCode::Down => {
            let max = app.history_entries().len().saturating_sub(1);
            app.history.scroll_down(max);
        }
        KeyCode::Home => app.history.scroll_to_top(),
        _ => {}
    }
}

fn dispatch_drop(app: &mut App, outcome: DropOutcome) {
    match outcome {
        DropOutcome::Dropped {
            entity_id,
            source_stage,
            target_stage,
        } => {
            debug!(%entity_id, %source_stage, %target_stage, "card dropped");
            app.send(Op::MoveEntity {
                kind: app.kind,
                entity_id,
                target_stage,
            });
        }
        DropOutcome::Cancelled(reason) => debug!(?reason, "drag cancelled"),
    }
}

fn switch_kind(app: &mut App, kind: EntityKind) {
    let _ = app.drag.cancel();
    app.kind = kind;
    app.cursor = Default::default();
    app.list.reset();
    app.history.scroll_to_top();
    app.send(Op::LoadBoard { kind });
}

/// Each column's stage and the ids of its cards, in board order.
fn column_entities(app: &App) -> Vec<(&'static str, Vec<String>)> {
    app.kanban_projection()
        .columns()
        .map(|c| (c.stage.stage, c.entities.iter().map(|e| e.id.clone()).collect()))
        .collect()
}

/// Columns, then the archive stage when the kind has one.
fn drop_targets(kind: EntityKind, columns: &[(&'static str, Vec<String>)]) -> Vec<&'static str> {
    columns
        .iter()
        .map(|(stage, _)| *stage)
        .chain(descriptor(kind).archive_stage)
        .collect()
}

fn clamp_cursor(app: &mut App) {
    let columns = column_entities(app);
    app.cursor.column = app.cursor.column.min(columns.len().saturating_sub(1));
    let rows = columns.get(app.cursor.column).map_or(0, |(_, ids)| ids.len());
    app.cursor.row = app.cursor.row.min(rows.saturating_sub(1));
}
