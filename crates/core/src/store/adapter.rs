//! Typed access to the document store.
//!
//! The adapter turns raw documents into protocol models. A document that
//! does not deserialize is an integrity gap: it is skipped with a warning
//! and the rest of the collection still loads.

use super::{DocumentStore, StoreError, StoreResult, ACTIVITIES, DELIVERIES, USERS};
use crate::pipeline::catalog::descriptor;
use chrono::Utc;
use pb_protocol::{ActivityRecord, Delivery, EntityKind, PipelineEntity, User};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};

/// Load status of one collection.
///
/// Keeps "nothing loaded yet", "loaded but empty" and "failed to load"
/// apart so the UI never shows a failed fetch as an empty pipeline.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LoadState<T> {
    #[default]
    Pending,
    Loaded(T),
    Failed(String),
}

impl<T> LoadState<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, LoadState::Pending)
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            LoadState::Loaded(data) => Some(data),
            _ => None,
        }
    }

    pub fn data_mut(&mut self) -> Option<&mut T> {
        match self {
            LoadState::Loaded(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            LoadState::Failed(error) => Some(error),
            _ => None,
        }
    }
}

impl<T> From<StoreResult<T>> for LoadState<T> {
    fn from(result: StoreResult<T>) -> Self {
        match result {
            Ok(data) => LoadState::Loaded(data),
            Err(e) => LoadState::Failed(e.to_string()),
        }
    }
}

/// Typed facade over a [`DocumentStore`]. Cheap to clone.
#[derive(Clone)]
pub struct EntityStoreAdapter {
    store: Arc<dyn DocumentStore>,
}

impl EntityStoreAdapter {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Fetch every entity of a kind.
    pub async fn load(&self, kind: EntityKind) -> StoreResult<Vec<PipelineEntity>> {
        let collection = descriptor(kind).collection;
        let docs = self.store.get_collection(collection).await?;
        Ok(decode(collection, docs))
    }

    /// Fetch the activity log, newest first.
    pub async fn load_activities(&self) -> StoreResult<Vec<ActivityRecord>> {
        let docs = self.store.get_collection(ACTIVITIES).await?;
        let mut records: Vec<ActivityRecord> = decode(ACTIVITIES, docs);
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    pub async fn load_deliveries(&self) -> StoreResult<Vec<Delivery>> {
        let docs = self.store.get_collection(DELIVERIES).await?;
        Ok(decode(DELIVERIES, docs))
    }

    pub async fn load_users(&self) -> StoreResult<Vec<User>> {
        let docs = self.store.get_collection(USERS).await?;
        Ok(decode(USERS, docs))
    }

    /// Persist a new stage for one entity.
    pub async fn update_stage(&self, kind: EntityKind, id: &str, stage: &str) -> StoreResult<()> {
        let mut partial = Map::new();
        partial.insert("stage".to_string(), Value::String(stage.to_string()));
        partial.insert("updatedAt".to_string(), Value::String(Utc::now().to_rfc3339()));

        self.store
            .update_doc(descriptor(kind).collection, id, partial)
            .await
    }

    /// Append an activity record and return it as stored (with its id).
    pub async fn append_activity(&self, record: &ActivityRecord) -> StoreResult<ActivityRecord> {
        let malformed = |e: serde_json::Error| StoreError::Malformed {
            collection: ACTIVITIES.to_string(),
            reason: e.to_string(),
        };

        let doc = serde_json::to_value(record).map_err(malformed)?;
        let stored = self.store.add_doc(ACTIVITIES, doc).await?;
        serde_json::from_value(stored).map_err(malformed)
    }
}

/// Deserialize documents, skipping the ones that do not fit the model.
fn decode<T: DeserializeOwned>(collection: &str, docs: Vec<Value>) -> Vec<T> {
    let total = docs.len();
    let decoded: Vec<T> = docs
        .into_iter()
        .filter_map(|doc| {
            let id = doc.get("id").and_then(Value::as_str).unwrap_or("?").to_string();
            match serde_json::from_value(doc) {
                Ok(item) => Some(item),
                Err(e) => {
                    warn!(collection, id = %id, error = %e, "skipping malformed document");
                    None
                }
            }
        })
        .collect();

    debug!(collection, loaded = decoded.len(), total, "collection decoded");
    decoded
}
