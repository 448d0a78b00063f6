//! Inter-task communication protocol.
//!
//! This module defines the message types for asynchronous communication
//! between the TUI (user interface) and the Core (business logic).
//!
//! The protocol follows an Operation/Event pattern:
//! - `Op`: Commands sent from TUI to Core
//! - `Event`: State changes and notifications sent from Core to TUI
//!
//! The Core owns the canonical board state. Every change it makes is
//! mirrored to the TUI as an `Event`, so the UI never writes entity stages
//! on its own.

use serde::{Deserialize, Serialize};

use crate::activity_models::ActivityRecord;
use crate::delivery_models::Delivery;
use crate::entity_models::{EntityKind, PipelineEntity};
use crate::user_models::User;

/// Operations sent from the UI (TUI) to the Core logic.
///
/// Uses tagged enum serialization:
/// ```json
/// {
///   "type": "moveEntity",
///   "payload": {
///     "kind": "salesOrder",
///     "entity_id": "so-1",
///     "target_stage": "Entregada"
///   }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Op {
    /// Load entities of a kind plus the shared activity, delivery and user
    /// collections.
    LoadBoard { kind: EntityKind },

    /// Re-fetch everything for a kind. Idempotent.
    Refresh { kind: EntityKind },

    /// Move an entity to another stage (a completed drag-and-drop).
    MoveEntity {
        kind: EntityKind,
        entity_id: String,
        target_stage: String,
    },

    /// Shut down the core loop.
    Shutdown,
}

/// What a load operation was fetching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "target", content = "kind", rename_all = "camelCase")]
pub enum LoadTarget {
    Entities(EntityKind),
    Activities,
    Deliveries,
    Users,
}

/// Severity of a user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NotificationLevel {
    Info,
    /// A guard rejected a move. Nothing changed.
    Warning,
    /// Persistence failed and the move was rolled back.
    Error,
}

/// Events sent from the Core logic to the UI (TUI).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Event {
    /// A fetch has started; the target is pending.
    LoadStarted { target: LoadTarget },

    /// Entities of a kind were fetched.
    EntitiesLoaded {
        kind: EntityKind,
        entities: Vec<PipelineEntity>,
    },

    /// The activity log was fetched, newest first.
    ActivitiesLoaded { records: Vec<ActivityRecord> },

    /// Deliveries were fetched.
    DeliveriesLoaded { deliveries: Vec<Delivery> },

    /// Users were fetched.
    UsersLoaded { users: Vec<User> },

    /// A fetch failed. The UI must offer a retry instead of an empty board.
    LoadFailed { target: LoadTarget, error: String },

    /// A stage change was applied optimistically.
    StageApplied {
        kind: EntityKind,
        entity_id: String,
        stage: String,
    },

    /// A move settled and the entity's visible value changed: a rollback
    /// to its last confirmed value, or a confirmed timestamp.
    EntityReconciled {
        kind: EntityKind,
        entity: PipelineEntity,
    },

    /// A transition committed and its activity record was stored.
    ActivityAppended { record: ActivityRecord },

    /// A message for the toast area.
    Notification {
        level: NotificationLevel,
        message: String,
    },
}
