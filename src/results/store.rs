use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use super::error::ResultStoreError;
use super::types::IncentiveResults;
use crate::model::IncentiveId;

const JSON_EXTENSION: &str = "json";
const TEMP_EXTENSION: &str = "json.tmp";

#[async_trait]
/// Upsert store for per-incentive result sets.
pub trait ResultStore: Send + Sync {
    /// Replaces any previous results for `results.incentive_id`.
    async fn save(&self, results: &IncentiveResults) -> Result<(), ResultStoreError>;

    async fn load(&self, incentive_id: IncentiveId)
    -> Result<Option<IncentiveResults>, ResultStoreError>;
}

/// One pretty-printed JSON document per incentive under `<root>/<id>.json`.
#[derive(Debug, Clone)]
pub struct JsonResultStore {
    root: PathBuf,
}

impl JsonResultStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn result_path(&self, incentive_id: IncentiveId) -> PathBuf {
        self.root.join(format!("{}.{}", incentive_id, JSON_EXTENSION))
    }

    async fn ensure_root(&self) -> Result<(), ResultStoreError> {
        if tokio::fs::metadata(&self.root).await.is_err() {
            tokio::fs::create_dir_all(&self.root)
                .await
                .map_err(|_| ResultStoreError::StorageUnavailable {
                    path: self.root.clone(),
                })?;
        }
        Ok(())
    }
}

#[async_trait]
impl ResultStore for JsonResultStore {
    async fn save(&self, results: &IncentiveResults) -> Result<(), ResultStoreError> {
        self.ensure_root().await?;

        let json = serde_json::to_vec_pretty(results)?;
        let final_path = self.result_path(results.incentive_id);
        let temp_path = self.root.join(format!(
            "{}.{}.{}",
            results.incentive_id,
            uuid::Uuid::new_v4().simple(),
            TEMP_EXTENSION
        ));

        tokio::fs::write(&temp_path, &json).await?;
        if let Err(e) = tokio::fs::rename(&temp_path, &final_path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        debug!(
            incentive_id = results.incentive_id,
            bytes = json.len(),
            path = %final_path.display(),
            "Saved incentive results"
        );
        Ok(())
    }

    async fn load(
        &self,
        incentive_id: IncentiveId,
    ) -> Result<Option<IncentiveResults>, ResultStoreError> {
        let bytes = match tokio::fs::read(self.result_path(incentive_id)).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let results: IncentiveResults = serde_json::from_slice(&bytes)?;
        if results.incentive_id != incentive_id {
            return Err(ResultStoreError::Mismatch {
                expected: incentive_id,
                found: results.incentive_id,
            });
        }
        Ok(Some(results))
    }
}

/// In-process store for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryResultStore {
    results: RwLock<HashMap<IncentiveId, IncentiveResults>>,
}

impl MemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.results.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.read().is_empty()
    }
}

#[async_trait]
impl ResultStore for MemoryResultStore {
    async fn save(&self, results: &IncentiveResults) -> Result<(), ResultStoreError> {
        self.results
            .write()
            .insert(results.incentive_id, results.clone());
        Ok(())
    }

    async fn load(
        &self,
        incentive_id: IncentiveId,
    ) -> Result<Option<IncentiveResults>, ResultStoreError> {
        Ok(self.results.read().get(&incentive_id).cloned())
    }
}
