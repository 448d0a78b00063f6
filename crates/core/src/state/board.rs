//! Canonical in-memory board state.
//!
//! `BoardState` holds every loaded collection together with its load
//! status, and tracks moves whose persistence call has not settled yet.
//! The core owns one instance behind a mutex; the TUI keeps a mirror that
//! it updates only through [`BoardState::apply_event`].

use crate::store::LoadState;
use chrono::Utc;
use pb_protocol::{
    ActivityRecord, Delivery, EntityKind, Event, LoadTarget, PipelineEntity, User,
};
use std::collections::HashMap;

/// Identifies one optimistic move of one entity.
pub type MoveToken = u64;

/// Moves of a single entity that have been applied locally but not settled.
#[derive(Debug, Clone)]
struct InFlight {
    /// The entity as last confirmed by the store.
    base: PipelineEntity,
    /// Unsettled moves in issue order.
    pending: Vec<(MoveToken, String)>,
    /// Token of the most recent successful settle.
    last_committed: Option<MoveToken>,
    /// A move's stage reached the store without its activity record.
    unrecorded_write: bool,
}

impl InFlight {
    /// The value the entity should show given what has settled so far.
    ///
    /// A pending move issued after the last commit is shown optimistically;
    /// otherwise the last confirmed value stands.
    fn visible(&self) -> PipelineEntity {
        let newest_pending = self.pending.last();
        match newest_pending {
            Some((token, stage)) if Some(*token) > self.last_committed => {
                let mut entity = self.base.clone();
                entity.stage = stage.clone();
                entity
            }
            _ => self.base.clone(),
        }
    }
}

/// Snapshot handed back by [`BoardState::begin_move`].
#[derive(Debug, Clone)]
pub struct AppliedMove {
    pub token: MoveToken,
    /// The entity exactly as it was shown before this move was applied.
    /// With other moves of the entity pending this is not what the store
    /// holds; see [`BoardState::confirmed_stage`].
    pub snapshot: PipelineEntity,
}

/// How the persistence of a move ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// Stage stored and activity recorded.
    Committed,
    /// The stage never reached the store.
    Failed,
    /// The stage reached the store but its activity record did not.
    Unrecorded,
}

/// Result of [`BoardState::settle_move`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settled {
    /// The entity's new visible value, when it changed.
    pub reconciled: Option<PipelineEntity>,
    /// Stage the store has to be set back to.
    ///
    /// Reported once, by the last pending move of an entity after any of
    /// its moves settled as [`Settlement::Unrecorded`].
    pub restore_stage: Option<String>,
}

/// Every collection the board needs, with load status.
#[derive(Debug, Clone, Default)]
pub struct BoardState {
    entities: HashMap<EntityKind, LoadState<Vec<PipelineEntity>>>,
    activities: LoadState<Vec<ActivityRecord>>,
    deliveries: LoadState<Vec<Delivery>>,
    users: LoadState<Vec<User>>,
    in_flight: HashMap<(EntityKind, String), InFlight>,
    next_token: MoveToken,
}

impl BoardState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load status of a kind's entities. Kinds never requested are pending.
    pub fn entities(&self, kind: EntityKind) -> &LoadState<Vec<PipelineEntity>> {
        const PENDING: &LoadState<Vec<PipelineEntity>> = &LoadState::Pending;
        self.entities.get(&kind).unwrap_or(PENDING)
    }

    /// Loaded entities of a kind, empty when not loaded.
    pub fn entity_list(&self, kind: EntityKind) -> &[PipelineEntity] {
        self.entities(kind).data().map_or(&[], Vec::as_slice)
    }

    pub fn entity(&self, kind: EntityKind, id: &str) -> Option<&PipelineEntity> {
        self.entity_list(kind).iter().find(|e| e.id == id)
    }

    fn entity_mut(&mut self, kind: EntityKind, id: &str) -> Option<&mut PipelineEntity> {
        self.entities
            .get_mut(&kind)?
            .data_mut()?
            .iter_mut()
            .find(|e| e.id == id)
    }

    pub fn activities(&self) -> &LoadState<Vec<ActivityRecord>> {
        &self.activities
    }

    pub fn deliveries(&self) -> &LoadState<Vec<Delivery>> {
        &self.deliveries
    }

    pub fn users(&self) -> &LoadState<Vec<User>> {
        &self.users
    }

    /// Replace a kind's entities. Unsettled moves of that kind are
    /// forgotten: the fresh data is the new baseline.
    pub fn set_entities(&mut self, kind: EntityKind, state: LoadState<Vec<PipelineEntity>>) {
        self.in_flight.retain(|(k, _), _| *k != kind);
        self.entities.insert(kind, state);
    }

    pub fn set_activities(&mut self, state: LoadState<Vec<ActivityRecord>>) {
        self.activities = state;
    }

    pub fn set_deliveries(&mut self, state: LoadState<Vec<Delivery>>) {
        self.deliveries = state;
    }

    pub fn set_users(&mut self, state: LoadState<Vec<User>>) {
        self.users = state;
    }

    /// Mark a load target as pending without dropping data already shown.
    pub fn mark_pending(&mut self, target: LoadTarget) {
        match target {
            LoadTarget::Entities(kind) => {
                if self.entities(kind).data().is_none() {
                    self.entities.insert(kind, LoadState::Pending);
                }
            }
            LoadTarget::Activities if self.activities.data().is_none() => {
                self.activities = LoadState::Pending;
            }
            LoadTarget::Deliveries if self.deliveries.data().is_none() => {
                self.deliveries = LoadState::Pending;
            }
            LoadTarget::Users if self.users.data().is_none() => {
                self.users = LoadState::Pending;
            }
            _ => {}
        }
    }

    /// Record a load failure for a target.
    pub fn mark_failed(&mut self, target: LoadTarget, error: String) {
        match target {
            LoadTarget::Entities(kind) => self.set_entities(kind, LoadState::Failed(error)),
            LoadTarget::Activities => self.activities = LoadState::Failed(error),
            LoadTarget::Deliveries => self.deliveries = LoadState::Failed(error),
            LoadTarget::Users => self.users = LoadState::Failed(error),
        }
    }

    /// Insert a stored activity record at the front of the log.
    ///
    /// Keeps the newest-first order. Ignored when the log is not loaded.
    pub fn prepend_activity(&mut self, record: ActivityRecord) {
        if let Some(records) = self.activities.data_mut() {
            records.insert(0, record);
        }
    }

    /// The entity's stage as last confirmed by the store.
    pub fn confirmed_stage(&self, kind: EntityKind, id: &str) -> Option<&str> {
        match self.in_flight.get(&(kind, id.to_string())) {
            Some(flight) => Some(flight.base.stage.as_str()),
            None => self.entity(kind, id).map(|e| e.stage.as_str()),
        }
    }

    /// Whether the entity has moves that have not settled yet.
    pub fn is_in_flight(&self, kind: EntityKind, id: &str) -> bool {
        self.in_flight.contains_key(&(kind, id.to_string()))
    }

    /// Apply a stage change optimistically.
    ///
    /// Returns `None` when the entity is not loaded.
    pub fn begin_move(&mut self, kind: EntityKind, id: &str, target_stage: &str) -> Option<AppliedMove> {
        let snapshot = self.entity(kind, id)?.clone();
        self.next_token += 1;
        let token = self.next_token;

        let entry = self
            .in_flight
            .entry((kind, id.to_string()))
            .or_insert_with(|| InFlight {
                base: snapshot.clone(),
                pending: Vec::new(),
                last_committed: None,
                unrecorded_write: false,
            });
        entry.pending.push((token, target_stage.to_string()));

        if let Some(entity) = self.entity_mut(kind, id) {
            entity.stage = target_stage.to_string();
        }
        Some(AppliedMove { token, snapshot })
    }

    /// Settle a move after its persistence calls returned.
    ///
    /// A committed move advances the confirmed value to its target; any
    /// other settlement leaves it. The visible entity is then recomputed
    /// from the confirmed value and the moves still pending, so a late
    /// settle never brings back a value that an earlier rollback removed.
    ///
    /// An unrecorded write leaves the store holding a stage the board never
    /// confirmed. Once no move of the entity is pending, the confirmed
    /// stage is reported in [`Settled::restore_stage`] so the caller can
    /// write it back.
    ///
    /// Moves dropped by a reload settle to [`Settled::default`].
    pub fn settle_move(
        &mut self,
        kind: EntityKind,
        id: &str,
        token: MoveToken,
        settlement: Settlement,
    ) -> Settled {
        let key = (kind, id.to_string());
        let Some(flight) = self.in_flight.get_mut(&key) else {
            return Settled::default();
        };
        let Some(position) = flight.pending.iter().position(|(t, _)| *t == token) else {
            return Settled::default();
        };
        let (_, stage) = flight.pending.remove(position);

        match settlement {
            Settlement::Committed => {
                flight.base.stage = stage;
                flight.base.updated_at = Some(Utc::now());
                flight.last_committed = Some(token);
            }
            Settlement::Failed => {}
            Settlement::Unrecorded => flight.unrecorded_write = true,
        }

        let visible = flight.visible();
        let mut restore_stage = None;
        if flight.pending.is_empty() {
            if flight.unrecorded_write {
                restore_stage = Some(flight.base.stage.clone());
            }
            self.in_flight.remove(&key);
        }

        let reconciled = match self.entity_mut(kind, id) {
            Some(entity) if *entity != visible => {
                *entity = visible.clone();
                Some(visible)
            }
            _ => None,
        };
        Settled {
            reconciled,
            restore_stage,
        }
    }

    /// Mirror a core event into this state.
    pub fn apply_event(&mut self, event: &Event) {
        match event {
            Event::LoadStarted { target } => self.mark_pending(*target),
            Event::EntitiesLoaded { kind, entities } => {
                self.set_entities(*kind, LoadState::Loaded(entities.clone()));
            }
            Event::ActivitiesLoaded { records } => {
                self.set_activities(LoadState::Loaded(records.clone()));
            }
            Event::DeliveriesLoaded { deliveries } => {
                self.set_deliveries(LoadState::Loaded(deliveries.clone()));
            }
            Event::UsersLoaded { users } => self.set_users(LoadState::Loaded(users.clone())),
            Event::LoadFailed { target, error } => self.mark_failed(*target, error.clone()),
            Event::StageApplied {
                kind,
                entity_id,
                stage,
            } => {
                if let Some(entity) = self.entity_mut(*kind, entity_id) {
                    entity.stage = stage.clone();
                }
            }
            Event::EntityReconciled { kind, entity } => {
                if let Some(current) = self.entity_mut(*kind, &entity.id) {
                    *current = entity.clone();
                }
            }
            Event::ActivityAppended { record } => self.prepend_activity(record.clone()),
            Event::Notification { .. } => {}
        }
    }
}
