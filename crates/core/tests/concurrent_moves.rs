//! Integration tests for moves whose persistence calls overlap.
//!
//! Updates are held behind a gate so tests decide when each call returns.
//! The gate releases waiting calls in the order they were issued.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::*;
use pb_core::engine::TransitionOutcome;
use pb_core::store::{DocumentStore, ACTIVITIES};
use pb_protocol::EntityKind;
use std::sync::Arc;

#[tokio::test]
async fn test_pending_move_does_not_block_other_entities() {
    let h = harness(EntityKind::Quote).await;
    let gate = h.store.gate_updates().await;
    let store = Arc::clone(&h.store);

    let first = h
        .manager
        .spawn_move(EntityKind::Quote, "q-1".to_string(), "Aceptada".to_string());
    wait_until(|| store.update_calls() == 1).await;

    let second = h
        .manager
        .spawn_move(EntityKind::Quote, "q-2".to_string(), "Rechazada".to_string());
    wait_until(|| store.update_calls() == 2).await;

    // Both moves are visible while neither has settled.
    let snapshot = h.manager.snapshot().await;
    assert_eq!(snapshot.entity(EntityKind::Quote, "q-1").unwrap().stage, "Aceptada");
    assert_eq!(snapshot.entity(EntityKind::Quote, "q-2").unwrap().stage, "Rechazada");
    assert!(snapshot.is_in_flight(EntityKind::Quote, "q-1"));

    gate.add_permits(2);
    assert!(first.await.unwrap().is_committed());
    assert!(second.await.unwrap().is_committed());
    assert!(!h.manager.snapshot().await.is_in_flight(EntityKind::Quote, "q-1"));
}

#[tokio::test]
async fn test_failure_of_one_entity_leaves_the_other_untouched() {
    let h = harness(EntityKind::Quote).await;
    h.store.script_updates([true, false]).await;
    let gate = h.store.gate_updates().await;
    let store = Arc::clone(&h.store);

    let failing = h
        .manager
        .spawn_move(EntityKind::Quote, "q-1".to_string(), "Aceptada".to_string());
    wait_until(|| store.update_calls() == 1).await;
    let passing = h
        .manager
        .spawn_move(EntityKind::Quote, "q-2".to_string(), "Aceptada".to_string());
    wait_until(|| store.update_calls() == 2).await;

    gate.add_permits(2);
    assert!(matches!(failing.await.unwrap(), TransitionOutcome::RolledBack { .. }));
    assert!(passing.await.unwrap().is_committed());

    assert_eq!(h.stage(EntityKind::Quote, "q-1").await, "Enviada");
    assert_eq!(h.stage(EntityKind::Quote, "q-2").await, "Aceptada");
    assert_eq!(h.stage(EntityKind::Quote, "q-3").await, "Enviada");
}

#[tokio::test]
async fn test_retry_after_failure_ends_on_the_successful_stage() {
    let h = harness(EntityKind::Quote).await;
    let before = h.activity_count().await;
    h.store.script_updates([true, false]).await;
    let gate = h.store.gate_updates().await;
    let store = Arc::clone(&h.store);

    // The user drags again before the first attempt has failed.
    let attempt = h
        .manager
        .spawn_move(EntityKind::Quote, "q-1".to_string(), "Negociación".to_string());
    wait_until(|| store.update_calls() == 1).await;
    let retry = h
        .manager
        .spawn_move(EntityKind::Quote, "q-1".to_string(), "Aceptada".to_string());
    wait_until(|| store.update_calls() == 2).await;

    gate.add_permits(1);
    assert!(matches!(attempt.await.unwrap(), TransitionOutcome::RolledBack { .. }));
    // The retry is still pending and stays visible.
    assert_eq!(h.stage(EntityKind::Quote, "q-1").await, "Aceptada");

    gate.add_permits(1);
    let TransitionOutcome::Committed { record, .. } = retry.await.unwrap() else {
        panic!("retry should commit");
    };
    // The record starts from the stored stage, not the failed attempt's.
    assert_eq!(record.description, "Etapa cambiada de \"Enviada\" a \"Aceptada\"");
    assert_eq!(h.stage(EntityKind::Quote, "q-1").await, "Aceptada");
    assert_eq!(h.activity_count().await, before + 1);
}

#[tokio::test]
async fn test_late_failure_does_not_revert_a_committed_retry() {
    let h = harness(EntityKind::Quote).await;
    h.store.script_updates([false, true]).await;
    let gate = h.store.gate_updates().await;
    let store = Arc::clone(&h.store);

    let first = h
        .manager
        .spawn_move(EntityKind::Quote, "q-1".to_string(), "Negociación".to_string());
    wait_until(|| store.update_calls() == 1).await;
    let second = h
        .manager
        .spawn_move(EntityKind::Quote, "q-1".to_string(), "Aceptada".to_string());
    wait_until(|| store.update_calls() == 2).await;

    gate.add_permits(2);
    assert!(first.await.unwrap().is_committed());
    assert!(matches!(second.await.unwrap(), TransitionOutcome::RolledBack { .. }));

    // The failed later move falls back to the last stage the store accepted.
    assert_eq!(h.stage(EntityKind::Quote, "q-1").await, "Negociación");
    assert_eq!(
        h.store.document("quotes", "q-1").await.unwrap()["stage"],
        "Negociación"
    );
}

#[tokio::test]
async fn test_unrecorded_write_under_overlap_restores_the_confirmed_stage() {
    let h = harness(EntityKind::Quote).await;
    let stored_activities = h.store.count(ACTIVITIES).await;
    h.store.script_updates([true, false, false]).await;
    h.store.set_fail_adds(true).await;
    let gate = h.store.gate_updates().await;
    let store = Arc::clone(&h.store);

    let first = h
        .manager
        .spawn_move(EntityKind::Quote, "q-1".to_string(), "Negociación".to_string());
    wait_until(|| store.update_calls() == 1).await;
    let second = h
        .manager
        .spawn_move(EntityKind::Quote, "q-1".to_string(), "Aceptada".to_string());
    wait_until(|| store.update_calls() == 2).await;

    // The first update fails; the second lands but its activity does not.
    gate.add_permits(3);
    assert!(matches!(first.await.unwrap(), TransitionOutcome::RolledBack { .. }));
    assert!(matches!(second.await.unwrap(), TransitionOutcome::RolledBack { .. }));

    assert_eq!(h.stage(EntityKind::Quote, "q-1").await, "Enviada");
    assert_eq!(
        h.store.document("quotes", "q-1").await.unwrap()["stage"],
        "Enviada"
    );
    assert_eq!(h.store.update_calls(), 3);
    assert_eq!(h.store.count(ACTIVITIES).await, stored_activities);
}

#[tokio::test]
async fn test_unrecorded_write_after_a_commit_keeps_store_and_history_in_step() {
    let h = harness(EntityKind::Quote).await;
    let stored_activities = h.store.count(ACTIVITIES).await;
    let gate = h.store.gate_updates().await;
    let store = Arc::clone(&h.store);

    let first = h
        .manager
        .spawn_move(EntityKind::Quote, "q-1".to_string(), "Negociación".to_string());
    wait_until(|| store.update_calls() == 1).await;
    let second = h
        .manager
        .spawn_move(EntityKind::Quote, "q-1".to_string(), "Aceptada".to_string());
    wait_until(|| store.update_calls() == 2).await;

    gate.add_permits(1);
    assert!(first.await.unwrap().is_committed());

    // The second update lands, its activity does not, and the store is
    // set back to the committed stage.
    h.store.set_fail_adds(true).await;
    gate.add_permits(2);
    assert!(matches!(second.await.unwrap(), TransitionOutcome::RolledBack { .. }));

    let board_stage = h.stage(EntityKind::Quote, "q-1").await;
    assert_eq!(board_stage, "Negociación");
    assert_eq!(
        h.store.document("quotes", "q-1").await.unwrap()["stage"],
        board_stage.as_str()
    );

    // The stored stage is the target of the newest stored stage change.
    let activities = h.store.get_collection(ACTIVITIES).await.unwrap();
    assert_eq!(activities.len(), stored_activities + 1);
    let changes: Vec<_> = activities
        .iter()
        .filter(|a| a["quoteId"] == "q-1" && a["type"] == "Cambio de Estado")
        .collect();
    assert_eq!(changes.len(), 1);
    assert_eq!(
        changes[0]["description"],
        "Etapa cambiada de \"Enviada\" a \"Negociación\""
    );
}
