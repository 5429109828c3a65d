use std::path::PathBuf;

use thiserror::Error;

use crate::model::IncentiveId;

#[derive(Debug, Error)]
pub enum ResultStoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("results serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("results directory unavailable: {path}")]
    StorageUnavailable { path: PathBuf },

    #[error("stored results belong to incentive {found}, expected {expected}")]
    Mismatch {
        expected: IncentiveId,
        found: IncentiveId,
    },
}
