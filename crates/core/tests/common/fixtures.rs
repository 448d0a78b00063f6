//! Test fixtures: seeded collections and a ready-to-use board.

use pb_core::engine::Actor;
use pb_core::state::BoardManager;
use pb_core::store::MemoryStore;
use pb_protocol::{EntityKind, Event};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// The acting user in every fixture.
pub const ACTOR_ID: &str = "u-001";

/// A board manager over a seeded in-memory store, with its event stream.
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub manager: BoardManager,
    pub events: mpsc::Receiver<Event>,
}

#[allow(dead_code)]
impl Harness {
    /// Every event received so far.
    pub fn drain(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }

    /// Current stage of an entity on the board.
    pub async fn stage(&self, kind: EntityKind, id: &str) -> String {
        self.manager
            .snapshot()
            .await
            .entity(kind, id)
            .map(|e| e.stage.clone())
            .unwrap_or_default()
    }

    /// Number of activity records on the board.
    pub async fn activity_count(&self) -> usize {
        self.manager
            .snapshot()
            .await
            .activities()
            .data()
            .map_or(0, Vec::len)
    }
}

/// A store with a small dataset covering every entity kind.
///
/// - quotes `q-1`..`q-3` sit in "Enviada" with totals 100, 250 and 50
/// - sales order `so-1` has one delivered and one in-transit delivery
/// - sales order `so-2` has no deliveries
/// - sample `s-1` is "Aprobada"
/// - one activity record points at a quote that no longer exists
pub async fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());

    store
        .insert_collection(
            "prospects",
            vec![
                json!({"id": "p-1", "title": "Distribuidora Altamira", "stage": "Nuevo", "ownerId": "u-003", "estimatedValue": 18000}),
                json!({"id": "p-2", "title": "Hoteles Costa Azul", "stage": "Propuesta", "ownerId": "u-004", "estimatedValue": 67000}),
            ],
        )
        .await;
    store
        .insert_collection(
            "quotes",
            vec![
                json!({"id": "q-1", "title": "COT-101", "stage": "Enviada", "total": 100}),
                json!({"id": "q-2", "title": "COT-102", "stage": "Enviada", "total": 250}),
                json!({"id": "q-3", "title": "COT-103", "stage": "Enviada", "total": 50}),
            ],
        )
        .await;
    store
        .insert_collection(
            "salesOrders",
            vec![
                json!({"id": "so-1", "title": "OV-5001", "stage": "En Tránsito", "total": 900}),
                json!({"id": "so-2", "title": "OV-5002", "stage": "Confirmada", "total": 300}),
            ],
        )
        .await;
    store
        .insert_collection(
            "deliveries",
            vec![
                json!({"id": "d-1", "salesOrderId": "so-1", "status": "Entregada"}),
                json!({"id": "d-2", "salesOrderId": "so-1", "status": "En Tránsito"}),
            ],
        )
        .await;
    store
        .insert_collection(
            "samples",
            vec![
                json!({"id": "s-1", "title": "Muestra etiqueta", "stage": "Aprobada", "quantity": 5}),
                json!({"id": "s-2", "title": "Muestra caja", "stage": "Enviada", "quantity": 10}),
            ],
        )
        .await;
    store
        .insert_collection(
            "activities",
            vec![
                json!({"id": "a-1", "quoteId": "q-1", "type": "Nota", "description": "Cliente pidió descuento", "userId": "u-003", "createdAt": "2024-05-01T10:00:00Z"}),
                json!({"id": "a-2", "quoteId": "q-deleted", "type": "Cambio de Estado", "description": "huérfana", "userId": "u-003", "createdAt": "2024-05-02T10:00:00Z"}),
            ],
        )
        .await;
    store
        .insert_collection(
            "users",
            vec![
                json!({"id": "u-001", "name": "Andrea Morales", "role": "admin"}),
                json!({"id": "u-003", "name": "Carmen Ruiz", "role": "salesperson"}),
            ],
        )
        .await;

    store
}

/// A manager over `store` with `kind` already loaded.
pub async fn harness_with(store: Arc<MemoryStore>, kind: EntityKind) -> Harness {
    let (tx, rx) = mpsc::channel(256);
    let manager = BoardManager::new(store.clone(), Actor::new(ACTOR_ID), tx);
    manager.load_board(kind).await;

    let mut harness = Harness {
        store,
        manager,
        events: rx,
    };
    harness.drain();
    harness
}

/// A manager over the seeded store with `kind` already loaded.
#[allow(dead_code)]
pub async fn harness(kind: EntityKind) -> Harness {
    harness_with(seeded_store().await, kind).await
}

/// Wait until `condition` holds, yielding to other tasks in between.
///
/// # Panics
///
/// Panics when the condition does not hold within five seconds.
#[allow(dead_code)]
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("condition not reached in time");
}
