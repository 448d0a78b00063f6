//! Board manager serving UI operations.
//!
//! The BoardManager owns the canonical board state. It loads collections,
//! hands moves to the transition coordinator on their own tasks, and
//! mirrors every change to the UI as an [`Event`].

use crate::engine::{Actor, TransitionCoordinator, TransitionOutcome};
use crate::state::board::BoardState;
use crate::store::{DocumentStore, EntityStoreAdapter, LoadState, StoreError};
use anyhow::{anyhow, Result};
use pb_protocol::{EntityKind, Event, LoadTarget, Op};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Manages the board state for one acting user.
///
/// The BoardManager provides a centralized interface for:
/// - Loading and refreshing collections
/// - Starting stage moves in the background
/// - Reading a snapshot of the board
pub struct BoardManager {
    /// Canonical state, shared with the coordinator.
    board: Arc<Mutex<BoardState>>,

    adapter: EntityStoreAdapter,

    coordinator: Arc<TransitionCoordinator>,

    /// The user moves are attributed to.
    actor: Actor,

    /// Channel for sending events to the UI.
    events_tx: mpsc::Sender<Event>,
}

impl BoardManager {
    /// Create a new BoardManager.
    ///
    /// # Arguments
    ///
    /// * `store` - The document store backing every collection
    /// * `actor` - The acting user
    /// * `events_tx` - Channel for sending events to the UI
    pub fn new(store: Arc<dyn DocumentStore>, actor: Actor, events_tx: mpsc::Sender<Event>) -> Self {
        let board = Arc::new(Mutex::new(BoardState::new()));
        let adapter = EntityStoreAdapter::new(store);
        let coordinator = Arc::new(TransitionCoordinator::new(
            Arc::clone(&board),
            adapter.clone(),
            events_tx.clone(),
        ));

        Self {
            board,
            adapter,
            coordinator,
            actor,
            events_tx,
        }
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    /// A copy of the current board state.
    pub async fn snapshot(&self) -> BoardState {
        self.board.lock().await.clone()
    }

    /// Load a kind's entities and the shared collections.
    ///
    /// Each collection is fetched independently, so one failing fetch
    /// leaves the others usable. Calling it again re-fetches everything.
    pub async fn load_board(&self, kind: EntityKind) {
        tokio::join!(
            self.load_entities(kind),
            self.load_activities(),
            self.load_deliveries(),
            self.load_users(),
        );
    }

    pub async fn load_entities(&self, kind: EntityKind) {
        let target = LoadTarget::Entities(kind);
        self.start_load(target).await;

        let result = self.adapter.load(kind).await;
        let event = match &result {
            Ok(entities) => Event::EntitiesLoaded {
                kind,
                entities: entities.clone(),
            },
            Err(e) => load_failed(target, e),
        };
        self.board.lock().await.set_entities(kind, LoadState::from(result));
        self.emit(event).await;
    }

    pub async fn load_activities(&self) {
        let target = LoadTarget::Activities;
        self.start_load(target).await;

        let result = self.adapter.load_activities().await;
        let event = match &result {
            Ok(records) => Event::ActivitiesLoaded {
                records: records.clone(),
            },
            Err(e) => load_failed(target, e),
        };
        self.board.lock().await.set_activities(LoadState::from(result));
        self.emit(event).await;
    }

    pub async fn load_deliveries(&self) {
        let target = LoadTarget::Deliveries;
        self.start_load(target).await;

        let result = self.adapter.load_deliveries().await;
        let event = match &result {
            Ok(deliveries) => Event::DeliveriesLoaded {
                deliveries: deliveries.clone(),
            },
            Err(e) => load_failed(target, e),
        };
        self.board.lock().await.set_deliveries(LoadState::from(result));
        self.emit(event).await;
    }

    pub async fn load_users(&self) {
        let target = LoadTarget::Users;
        self.start_load(target).await;

        let result = self.adapter.load_users().await;
        let event = match &result {
            Ok(users) => Event::UsersLoaded {
                users: users.clone(),
            },
            Err(e) => load_failed(target, e),
        };
        self.board.lock().await.set_users(LoadState::from(result));
        self.emit(event).await;
    }

    /// Move an entity and wait for the move to settle.
    pub async fn move_entity(&self, kind: EntityKind, entity_id: &str, target_stage: &str) -> TransitionOutcome {
        self.coordinator
            .move_entity(kind, entity_id, target_stage, &self.actor)
            .await
    }

    /// Start a move in the background.
    ///
    /// Returns immediately so a slow store never blocks other moves. The
    /// outcome is reported through events; the handle is for callers that
    /// want to wait on it.
    pub fn spawn_move(&self, kind: EntityKind, entity_id: String, target_stage: String) -> JoinHandle<TransitionOutcome> {
        let coordinator = Arc::clone(&self.coordinator);
        let actor = self.actor.clone();

        tokio::spawn(async move {
            coordinator
                .move_entity(kind, &entity_id, &target_stage, &actor)
                .await
        })
    }

    /// Serve one operation.
    ///
    /// # Returns
    ///
    /// `false` when the operation asks the loop to stop.
    pub async fn handle_op(&self, op: Op) -> bool {
        match op {
            Op::LoadBoard { kind } => self.load_board(kind).await,
            Op::Refresh { kind } => {
                debug!(%kind, "refreshing board");
                self.load_board(kind).await;
            }
            Op::MoveEntity {
                kind,
                entity_id,
                target_stage,
            } => {
                self.spawn_move(kind, entity_id, target_stage);
            }
            Op::Shutdown => return false,
        }
        true
    }

    /// Serve operations until shutdown or until the UI side hangs up.
    ///
    /// # Errors
    ///
    /// Returns an error if the operation channel closed without a
    /// shutdown request.
    pub async fn run(&self, mut op_rx: mpsc::Receiver<Op>) -> Result<()> {
        while let Some(op) = op_rx.recv().await {
            if !self.handle_op(op).await {
                info!("board manager shutting down");
                return Ok(());
            }
        }
        Err(anyhow!("operation channel closed without shutdown"))
    }

    async fn start_load(&self, target: LoadTarget) {
        self.board.lock().await.mark_pending(target);
        self.emit(Event::LoadStarted { target }).await;
    }

    async fn emit(&self, event: Event) {
        let _ = self.events_tx.send(event).await;
    }
}

fn load_failed(target: LoadTarget, error: &StoreError) -> Event {
    warn!(?target, %error, "load failed");
    Event::LoadFailed {
        target,
        error: error.to_string(),
    }
}
