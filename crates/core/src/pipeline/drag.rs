//! Drag-session state machine.
//!
//! `Idle -> Dragging -> (Dropped | Cancelled) -> Idle`
//!
//! The session carries the dragged entity's id and source stage from the
//! moment a card is picked up until it is released, independent of how the
//! board is rendered. Hovering only records the column under the pointer;
//! guards run after the drop, never while hovering.

use tracing::debug;

/// State carried for the duration of one drag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragSession {
    pub dragged_entity_id: String,
    pub source_stage: String,
    /// Column currently under the pointer, if any.
    pub hover: Option<String>,
}

impl DragSession {
    /// The plain-text drag payload: the entity id and nothing else.
    pub fn payload(&self) -> &str {
        &self.dragged_entity_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(DragSession),
}

/// Why a drag ended without a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// Released outside any stage column.
    OutsideDropTarget,
    /// Released while no session was active.
    NoSession,
    /// The drag payload did not name an entity.
    UnresolvedEntity,
    /// Aborted by the user.
    Aborted,
}

/// Result of ending a drag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    Dropped {
        entity_id: String,
        source_stage: String,
        target_stage: String,
    },
    Cancelled(CancelReason),
}

#[derive(Debug, Default)]
pub struct DragController {
    state: DragState,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn session(&self) -> Option<&DragSession> {
        match &self.state {
            DragState::Dragging(session) => Some(session),
            DragState::Idle => None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    /// Pick up a card. Any stale session is discarded.
    pub fn begin(&mut self, entity_id: impl Into<String>, source_stage: impl Into<String>) {
        if let DragState::Dragging(stale) = &self.state {
            debug!(entity_id = %stale.dragged_entity_id, "discarding stale drag session");
        }

        let source_stage = source_stage.into();
        self.state = DragState::Dragging(DragSession {
            dragged_entity_id: entity_id.into(),
            hover: Some(source_stage.clone()),
            source_stage,
        });
    }

    /// Record the column under the pointer.
    ///
    /// Returns whether a "can accept" affordance should be shown, which is
    /// whenever a session is active and the pointer is over a column.
    pub fn hover(&mut self, column: Option<&str>) -> bool {
        match &mut self.state {
            DragState::Dragging(session) => {
                session.hover = column.map(str::to_string);
                session.hover.is_some()
            }
            DragState::Idle => false,
        }
    }

    /// Release the card over `target` (`None` when outside every column).
    ///
    /// Always returns the controller to `Idle`.
    pub fn drop_on(&mut self, target: Option<&str>) -> DropOutcome {
        let DragState::Dragging(session) = std::mem::take(&mut self.state) else {
            return DropOutcome::Cancelled(CancelReason::NoSession);
        };

        if session.dragged_entity_id.is_empty() {
            return DropOutcome::Cancelled(CancelReason::UnresolvedEntity);
        }

        match target {
            Some(target_stage) => DropOutcome::Dropped {
                entity_id: session.dragged_entity_id,
                source_stage: session.source_stage,
                target_stage: target_stage.to_string(),
            },
            None => DropOutcome::Cancelled(CancelReason::OutsideDropTarget),
        }
    }

    /// Release over whatever column the session last hovered.
    pub fn drop_on_hover(&mut self) -> DropOutcome {
        let hover = self.session().and_then(|s| s.hover.clone());
        self.drop_on(hover.as_deref())
    }

    /// Abort the current drag, if any.
    pub fn cancel(&mut self) -> DropOutcome {
        match std::mem::take(&mut self.state) {
            DragState::Dragging(_) => DropOutcome::Cancelled(CancelReason::Aborted),
            DragState::Idle => DropOutcome::Cancelled(CancelReason::NoSession),
        }
    }
}
