use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::model::CompanyId;

/// Errors returned by location cache backends.
#[derive(Debug, Error)]
pub enum LocationCacheError {
    /// IO error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored bytes could not be encoded or decoded.
    #[error("corrupt location record for company {company_id}: {reason}")]
    Corrupt {
        company_id: CompanyId,
        reason: String,
    },

    /// Cache root directory could not be created.
    #[error("location cache directory unavailable: {path}")]
    StorageUnavailable { path: PathBuf },

    /// Resolution errors are transient and never stored.
    #[error("location record for company {company_id} is a resolution error and cannot be cached")]
    NotCacheable { company_id: CompanyId },

    /// Blocking cache task panicked or was cancelled.
    #[error("location cache task failed: {reason}")]
    TaskFailed { reason: String },
}

/// Errors returned by geocoding providers.
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("geocoding timed out after {0:?}")]
    Timeout(Duration),

    #[error("geocoding quota exceeded")]
    RateLimited,

    #[error("geocoding request denied: {reason}")]
    Denied { reason: String },

    #[error("geocoding provider returned {status}: {message}")]
    Provider { status: String, message: String },

    #[error("geocoding request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid geocoding response: {reason}")]
    InvalidResponse { reason: String },
}
