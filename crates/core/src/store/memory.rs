//! In-memory document store.
//!
//! Used by tests and demos. Failures can be injected per operation so the
//! rollback paths of the transition coordinator can be exercised, and
//! updates can be held back behind a gate to control settle order.

use super::{ensure_id, merge_into, DocumentStore, StoreError, StoreResult};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore};

/// Which operations should fail.
#[derive(Debug, Default)]
struct FailurePlan {
    fail_updates: bool,
    fail_adds: bool,
    failing_collections: HashSet<String>,
    /// Per-call update outcomes, consumed in call order. `true` fails.
    scripted_updates: VecDeque<bool>,
}

#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, Vec<Value>>>,
    failures: Mutex<FailurePlan>,
    update_gate: Mutex<Option<Arc<Semaphore>>>,
    latency: Duration,
    update_calls: AtomicUsize,
    add_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a fixed delay to every call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Replace a collection's documents.
    pub async fn insert_collection(&self, name: &str, docs: Vec<Value>) {
        self.collections.lock().await.insert(name.to_string(), docs);
    }

    /// Fetch a single document, bypassing failure injection.
    pub async fn document(&self, name: &str, id: &str) -> Option<Value> {
        let collections = self.collections.lock().await;
        collections
            .get(name)?
            .iter()
            .find(|doc| doc.get("id").and_then(Value::as_str) == Some(id))
            .cloned()
    }

    /// Number of documents in a collection, bypassing failure injection.
    pub async fn count(&self, name: &str) -> usize {
        self.collections
            .lock()
            .await
            .get(name)
            .map_or(0, Vec::len)
    }

    pub async fn set_fail_updates(&self, fail: bool) {
        self.failures.lock().await.fail_updates = fail;
    }

    pub async fn set_fail_adds(&self, fail: bool) {
        self.failures.lock().await.fail_adds = fail;
    }

    /// Make `get_collection` fail for one collection.
    pub async fn set_fail_loads(&self, name: &str, fail: bool) {
        let mut failures = self.failures.lock().await;
        if fail {
            failures.failing_collections.insert(name.to_string());
        } else {
            failures.failing_collections.remove(name);
        }
    }

    /// Script the outcome of the next update calls, in order. `true` fails.
    pub async fn script_updates(&self, outcomes: impl IntoIterator<Item = bool>) {
        self.failures.lock().await.scripted_updates.extend(outcomes);
    }

    /// Hold every subsequent update until a permit is released on the
    /// returned semaphore.
    pub async fn gate_updates(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.update_gate.lock().await = Some(Arc::clone(&gate));
        gate
    }

    /// How many times `update_doc` was called.
    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    /// How many times `add_doc` was called.
    pub fn add_calls(&self) -> usize {
        self.add_calls.load(Ordering::SeqCst)
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get_collection(&self, name: &str) -> StoreResult<Vec<Value>> {
        self.simulate_latency().await;

        if self.failures.lock().await.failing_collections.contains(name) {
            return Err(StoreError::Network(format!("collection {name} unavailable")));
        }

        Ok(self
            .collections
            .lock()
            .await
            .get(name)
            .cloned()
            .unwrap_or_default())
    }

    async fn update_doc(&self, name: &str, id: &str, partial: Map<String, Value>) -> StoreResult<()> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);

        // Decide the outcome at call time so scripted results follow call order.
        let fail = {
            let mut failures = self.failures.lock().await;
            failures
                .scripted_updates
                .pop_front()
                .unwrap_or(failures.fail_updates)
        };

        let gate = self.update_gate.lock().await.clone();
        if let Some(gate) = gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
        self.simulate_latency().await;

        if fail {
            return Err(StoreError::Network(format!("update of {name}/{id} timed out")));
        }

        let mut collections = self.collections.lock().await;
        let docs = collections.entry(name.to_string()).or_default();
        merge_into(name, docs, id, partial)
    }

    async fn add_doc(&self, name: &str, mut record: Value) -> StoreResult<Value> {
        self.add_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        if self.failures.lock().await.fail_adds {
            return Err(StoreError::Network(format!("insert into {name} timed out")));
        }

        ensure_id(name, &mut record)?;
        self.collections
            .lock()
            .await
            .entry(name.to_string())
            .or_default()
            .push(record.clone());
        Ok(record)
    }
}
