//! File-backed document store.
//!
//! Each collection lives in `<data_dir>/<collection>.yaml` as a YAML list of
//! documents. Writes go through a temporary file in the same directory and
//! are persisted with an atomic rename, so a crash never leaves a truncated
//! collection behind.

use super::{ensure_id, merge_into, DocumentStore, StoreError, StoreResult};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::Mutex;
use walkdir::WalkDir;

pub struct FileStore {
    data_dir: PathBuf,
    latency: Duration,
    /// Serializes read-modify-write cycles on collection files.
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Open a store rooted at `data_dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the directory cannot be created.
    pub fn open(data_dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir).map_err(|e| StoreError::Io {
            path: data_dir.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            data_dir,
            latency: Duration::ZERO,
            write_lock: Mutex::new(()),
        })
    }

    /// Add a fixed delay to every call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Names of all collections present on disk, sorted.
    pub fn collections(&self) -> StoreResult<Vec<String>> {
        let mut names = Vec::new();

        for entry in WalkDir::new(&self.data_dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| StoreError::Io {
                path: self.data_dir.clone(),
                reason: e.to_string(),
            })?;

            let path = entry.path();
            let ext = path.extension().and_then(|s| s.to_str());
            if ext != Some("yaml") && ext != Some("yml") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }

        names.sort();
        Ok(names)
    }

    fn collection_path(&self, name: &str) -> PathBuf {
        let yml = self.data_dir.join(format!("{name}.yml"));
        if yml.exists() {
            yml
        } else {
            self.data_dir.join(format!("{name}.yaml"))
        }
    }

    fn read_collection(&self, name: &str) -> StoreResult<Vec<Value>> {
        let path = self.collection_path(name);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let content = std::fs::read_to_string(&path).map_err(|e| StoreError::Io {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        let docs: Option<Vec<Value>> =
            serde_yaml::from_str(&content).map_err(|e| StoreError::Malformed {
                collection: name.to_string(),
                reason: e.to_string(),
            })?;
        Ok(docs.unwrap_or_default())
    }

    fn write_collection(&self, name: &str, docs: &[Value]) -> StoreResult<()> {
        let path = self.collection_path(name);
        let io_error = |e: std::io::Error| StoreError::Io {
            path: path.clone(),
            reason: e.to_string(),
        };

        let content = serde_yaml::to_string(docs).map_err(|e| StoreError::Malformed {
            collection: name.to_string(),
            reason: e.to_string(),
        })?;

        let mut tmp = tempfile::NamedTempFile::new_in(&self.data_dir).map_err(io_error)?;
        tmp.write_all(content.as_bytes()).map_err(io_error)?;
        tmp.persist(&path).map_err(|e| io_error(e.error))?;
        Ok(())
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

#[async_trait]
impl DocumentStore for FileStore {
    async fn get_collection(&self, name: &str) -> StoreResult<Vec<Value>> {
        self.simulate_latency().await;
        self.read_collection(name)
    }

    async fn update_doc(&self, name: &str, id: &str, partial: Map<String, Value>) -> StoreResult<()> {
        self.simulate_latency().await;
        let _guard = self.write_lock.lock().await;

        let mut docs = self.read_collection(name)?;
        merge_into(name, &mut docs, id, partial)?;
        self.write_collection(name, &docs)
    }

    async fn add_doc(&self, name: &str, mut record: Value) -> StoreResult<Value> {
        self.simulate_latency().await;
        let _guard = self.write_lock.lock().await;

        ensure_id(name, &mut record)?;
        let mut docs = self.read_collection(name)?;
        docs.push(record.clone());
        self.write_collection(name, &docs)?;
        Ok(record)
    }
}
