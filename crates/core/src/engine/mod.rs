//! Optimistic transition coordinator.
//!
//! The TransitionCoordinator turns a completed drop into a stage change.
//! The change is visible immediately, then persisted. A move either fully
//! commits (stage stored, activity recorded) or fully reverts (entity back
//! to its confirmed value, no activity, user notified).

use crate::pipeline::catalog::descriptor;
use crate::pipeline::guard::{can_transition, GuardContext, TransitionKind};
use crate::state::board::{BoardState, MoveToken, Settlement};
use crate::store::{EntityStoreAdapter, StoreError};
use chrono::Utc;
use pb_protocol::{ActivityRecord, ActivitySubject, EntityKind, Event, NotificationLevel, PipelineEntity};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc::Sender;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

/// The user a move is attributed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: String,
}

impl Actor {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

/// Why a drop was dropped without doing anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// No loaded entity has the dragged id.
    UnknownEntity,
    /// The entity is already in the target stage.
    SameStage,
}

/// How a move attempt ended.
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionOutcome {
    /// Nothing was touched.
    Ignored(IgnoreReason),
    /// The guard refused the move. Nothing was touched.
    Rejected { reason: String },
    /// The stage was stored and the activity record appended.
    Committed {
        record: ActivityRecord,
        kind: TransitionKind,
    },
    /// Persistence failed and the entity was reverted.
    RolledBack { message: String },
}

impl TransitionOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, TransitionOutcome::Committed { .. })
    }
}

/// Persistence failures of a move.
#[derive(Error, Debug, Clone)]
pub enum TransitionError {
    #[error("no se pudo guardar la nueva etapa: {0}")]
    Update(#[source] StoreError),

    #[error("no se pudo registrar la actividad: {0}")]
    ActivityAppend(#[source] StoreError),
}

pub type TransitionResult<T> = Result<T, TransitionError>;

/// Applies, persists and reconciles stage moves.
pub struct TransitionCoordinator {
    board: Arc<Mutex<BoardState>>,
    adapter: EntityStoreAdapter,
    events_tx: Sender<Event>,
}

impl TransitionCoordinator {
    /// Create a coordinator over shared board state.
    ///
    /// # Arguments
    ///
    /// * `board` - The canonical board state
    /// * `adapter` - Store access for persistence
    /// * `events_tx` - Channel for mirroring changes to the UI
    pub fn new(board: Arc<Mutex<BoardState>>, adapter: EntityStoreAdapter, events_tx: Sender<Event>) -> Self {
        Self {
            board,
            adapter,
            events_tx,
        }
    }

    /// Move an entity to another stage.
    ///
    /// 1. Ignores unknown entities and same-stage drops
    /// 2. Evaluates the kind's guard and warns on rejection
    /// 3. Applies the new stage locally
    /// 4. Persists the stage with the board unlocked
    /// 5. On success appends the activity record and commits both locally
    /// 6. On failure reverts the entity and notifies the user
    ///
    /// Exactly one of steps 5 and 6 runs for each applied move.
    ///
    /// # Arguments
    ///
    /// * `kind` - The entity kind
    /// * `entity_id` - The dragged entity
    /// * `target_stage` - The stage it was dropped on
    /// * `actor` - The user the activity record is attributed to
    pub async fn move_entity(
        &self,
        kind: EntityKind,
        entity_id: &str,
        target_stage: &str,
        actor: &Actor,
    ) -> TransitionOutcome {
        let descriptor = descriptor(kind);

        let (applied, transition_kind) = {
            let mut board = self.board.lock().await;

            let Some(entity) = board.entity(kind, entity_id) else {
                return TransitionOutcome::Ignored(IgnoreReason::UnknownEntity);
            };
            if entity.stage == target_stage {
                return TransitionOutcome::Ignored(IgnoreReason::SameStage);
            }

            let context = GuardContext {
                deliveries: board.deliveries().data().map(Vec::as_slice),
            };
            let verdict = can_transition(descriptor, entity, target_stage, &context);
            if !verdict.allowed {
                let reason = verdict
                    .reason
                    .unwrap_or_else(|| "Movimiento no permitido".to_string());
                drop(board);

                warn!(%kind, entity_id, target_stage, %reason, "transition rejected");
                self.notify(NotificationLevel::Warning, reason.clone()).await;
                return TransitionOutcome::Rejected { reason };
            }

            match board.begin_move(kind, entity_id, target_stage) {
                Some(applied) => (applied, verdict.kind),
                None => return TransitionOutcome::Ignored(IgnoreReason::UnknownEntity),
            }
        };

        self.emit(Event::StageApplied {
            kind,
            entity_id: entity_id.to_string(),
            stage: target_stage.to_string(),
        })
        .await;

        let result = self
            .persist(kind, &applied.snapshot, target_stage, transition_kind, actor)
            .await;

        match result {
            Ok(record) => {
                let reconciled = self
                    .settle(kind, entity_id, applied.token, Settlement::Committed, Some(&record))
                    .await;

                if let Some(entity) = reconciled {
                    self.emit(Event::EntityReconciled { kind, entity }).await;
                }
                self.emit(Event::ActivityAppended {
                    record: record.clone(),
                })
                .await;

                info!(
                    %kind,
                    entity_id,
                    to = target_stage,
                    description = %record.description,
                    "transition committed"
                );
                TransitionOutcome::Committed {
                    record,
                    kind: transition_kind,
                }
            }
            Err(e) => {
                let settlement = match &e {
                    TransitionError::Update(_) => Settlement::Failed,
                    TransitionError::ActivityAppend(_) => Settlement::Unrecorded,
                };
                let reconciled = self
                    .settle(kind, entity_id, applied.token, settlement, None)
                    .await;

                if let Some(entity) = reconciled {
                    self.emit(Event::EntityReconciled { kind, entity }).await;
                }

                error!(%kind, entity_id, target_stage, error = %e, "transition rolled back");
                let message = format!(
                    "No se pudo mover \"{}\" a \"{}\": {}. Intenta de nuevo.",
                    applied.snapshot.display_title(),
                    target_stage,
                    e
                );
                self.notify(NotificationLevel::Error, message.clone()).await;
                TransitionOutcome::RolledBack { message }
            }
        }
    }

    /// Store the new stage, then the activity record.
    ///
    /// The record describes the move from the stage the store last
    /// confirmed, which differs from `snapshot` while an earlier move of
    /// the entity is pending.
    async fn persist(
        &self,
        kind: EntityKind,
        snapshot: &PipelineEntity,
        target_stage: &str,
        transition_kind: TransitionKind,
        actor: &Actor,
    ) -> TransitionResult<ActivityRecord> {
        self.adapter
            .update_stage(kind, &snapshot.id, target_stage)
            .await
            .map_err(TransitionError::Update)?;

        let from = self
            .board
            .lock()
            .await
            .confirmed_stage(kind, &snapshot.id)
            .map_or_else(|| snapshot.stage.clone(), str::to_string);
        let record = ActivityRecord::stage_change(
            ActivitySubject::new(kind, snapshot.id.clone()),
            describe(&from, target_stage, transition_kind),
            actor.user_id.clone(),
            Utc::now(),
        );

        self.adapter
            .append_activity(&record)
            .await
            .map_err(TransitionError::ActivityAppend)
    }

    /// Settle a move and prepend its record when it committed.
    ///
    /// When the ledger reports that the store holds an unrecorded stage,
    /// the confirmed stage is written back before the board is unlocked,
    /// so no other move of the entity starts in between.
    async fn settle(
        &self,
        kind: EntityKind,
        entity_id: &str,
        token: MoveToken,
        settlement: Settlement,
        record: Option<&ActivityRecord>,
    ) -> Option<PipelineEntity> {
        let mut board = self.board.lock().await;
        let settled = board.settle_move(kind, entity_id, token, settlement);
        if let Some(record) = record {
            board.prepend_activity(record.clone());
        }

        if let Some(stage) = settled.restore_stage {
            match self.adapter.update_stage(kind, entity_id, &stage).await {
                Ok(()) => info!(%kind, entity_id, %stage, "stored stage restored"),
                Err(e) => warn!(
                    %kind,
                    entity_id,
                    %stage,
                    error = %e,
                    "could not restore stored stage after activity failure"
                ),
            }
        }
        settled.reconciled
    }

    async fn notify(&self, level: NotificationLevel, message: String) {
        self.emit(Event::Notification { level, message }).await;
    }

    /// Send an event. A closed channel means the UI is gone; the move still
    /// settles.
    async fn emit(&self, event: Event) {
        let _ = self.events_tx.send(event).await;
    }
}

/// Human-readable activity description of a transition.
pub fn describe(from: &str, to: &str, kind: TransitionKind) -> String {
    match kind {
        TransitionKind::Move => format!("Etapa cambiada de \"{from}\" a \"{to}\""),
        TransitionKind::Archive => format!("Archivada desde \"{from}\""),
    }
}
