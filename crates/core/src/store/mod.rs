//! Document store abstraction and backends.
//!
//! The engine talks to a generic document-collection API: read a whole
//! collection, patch one document, append one document. Backends:
//!
//! - [`memory::MemoryStore`]: in-memory collections with failure injection
//! - [`file::FileStore`]: one YAML file per collection on disk
//!
//! [`adapter::EntityStoreAdapter`] turns raw documents into typed models.

pub mod adapter;
pub mod file;
pub mod memory;

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::PathBuf;
use thiserror::Error;

pub use adapter::{EntityStoreAdapter, LoadState};
pub use file::FileStore;
pub use memory::MemoryStore;

/// Collection holding activity records.
pub const ACTIVITIES: &str = "activities";
/// Collection holding sales order deliveries.
pub const DELIVERIES: &str = "deliveries";
/// Collection holding users.
pub const USERS: &str = "users";

/// Errors raised by a document store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not be reached.
    #[error("Network error: {0}")]
    Network(String),

    /// The document to update does not exist.
    #[error("Document {id} not found in collection {collection}")]
    NotFound { collection: String, id: String },

    /// Reading or writing backing files failed.
    #[error("Storage error at {path:?}: {reason}")]
    Io { path: PathBuf, reason: String },

    /// A collection could not be encoded or decoded.
    #[error("Malformed collection {collection}: {reason}")]
    Malformed { collection: String, reason: String },
}

/// Type alias for Result with StoreError.
pub type StoreResult<T> = Result<T, StoreError>;

/// A generic document-collection API.
///
/// Documents are JSON objects carrying a string `id`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch every document of a collection. A missing collection is empty.
    async fn get_collection(&self, name: &str) -> StoreResult<Vec<Value>>;

    /// Merge `partial` into the document with the given id.
    async fn update_doc(&self, name: &str, id: &str, partial: Map<String, Value>) -> StoreResult<()>;

    /// Append a document and return it with its assigned `id`.
    async fn add_doc(&self, name: &str, record: Value) -> StoreResult<Value>;
}

/// Give a document a fresh UUID when it has no usable `id`.
pub(crate) fn ensure_id(collection: &str, record: &mut Value) -> StoreResult<String> {
    let doc = record.as_object_mut().ok_or_else(|| StoreError::Malformed {
        collection: collection.to_string(),
        reason: "documents must be objects".to_string(),
    })?;

    match doc.get("id").and_then(Value::as_str) {
        Some(id) if !id.is_empty() => Ok(id.to_string()),
        _ => {
            let id = uuid::Uuid::new_v4().to_string();
            doc.insert("id".to_string(), Value::String(id.clone()));
            Ok(id)
        }
    }
}

/// Find a document by id and merge `partial` into it.
pub(crate) fn merge_into(
    collection: &str,
    docs: &mut [Value],
    id: &str,
    partial: Map<String, Value>,
) -> StoreResult<()> {
    let doc = docs
        .iter_mut()
        .filter_map(Value::as_object_mut)
        .find(|doc| doc.get("id").and_then(Value::as_str) == Some(id))
        .ok_or_else(|| StoreError::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        })?;

    for (key, value) in partial {
        doc.insert(key, value);
    }
    Ok(())
}
