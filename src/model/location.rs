//! Resolved company locations.
//!
//! A [`LocationRecord`] is the only record that outlives a matching run. It is stored as `rkyv`
//! bytes by the disk cache and as JSON inside persisted results.

use rkyv::{Archive, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};
use serde::{Deserialize, Serialize};

use super::CompanyId;

/// Outcome of resolving a company's address.
#[derive(
    Archive,
    RkyvSerialize,
    RkyvDeserialize,
    Serialize,
    Deserialize,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStatus {
    /// Served from the location cache without a provider call.
    ResolvedCached,
    /// Resolved by the geocoding provider during this run.
    ResolvedFresh,
    /// The provider answered but found no match.
    NotFound,
    /// The provider failed, timed out or refused the call.
    ResolutionError,
}

impl ResolutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ResolvedCached => "resolved-cached",
            Self::ResolvedFresh => "resolved-fresh",
            Self::NotFound => "not-found",
            Self::ResolutionError => "resolution-error",
        }
    }
}

impl std::fmt::Display for ResolutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Address (and optional coordinates) of a company, keyed by company id.
#[derive(
    Archive, RkyvSerialize, RkyvDeserialize, Serialize, Deserialize, Debug, Clone, PartialEq,
)]
pub struct LocationRecord {
    pub company_id: CompanyId,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub status: ResolutionStatus,
    /// Provider that produced the record (for example `google_places`).
    pub source: String,
    /// Unix seconds.
    pub resolved_at: i64,
    /// Provider error message, set only on [`ResolutionStatus::ResolutionError`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl LocationRecord {
    /// Creates a freshly resolved record.
    pub fn found(
        company_id: CompanyId,
        address: impl Into<String>,
        coordinates: Option<(f64, f64)>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            company_id,
            address: Some(address.into()),
            latitude: coordinates.map(|(lat, _)| lat),
            longitude: coordinates.map(|(_, lng)| lng),
            status: ResolutionStatus::ResolvedFresh,
            source: source.into(),
            resolved_at: chrono::Utc::now().timestamp(),
            detail: None,
        }
    }

    /// Creates a record for a company the provider could not locate.
    pub fn not_found(company_id: CompanyId, source: impl Into<String>) -> Self {
        Self {
            company_id,
            address: None,
            latitude: None,
            longitude: None,
            status: ResolutionStatus::NotFound,
            source: source.into(),
            resolved_at: chrono::Utc::now().timestamp(),
            detail: None,
        }
    }

    /// Creates a record for a failed provider call. These are never cached.
    pub fn error(
        company_id: CompanyId,
        source: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            company_id,
            address: None,
            latitude: None,
            longitude: None,
            status: ResolutionStatus::ResolutionError,
            source: source.into(),
            resolved_at: chrono::Utc::now().timestamp(),
            detail: Some(detail.into()),
        }
    }

    /// Returns `true` if the record carries a usable address.
    pub fn is_resolved(&self) -> bool {
        matches!(
            self.status,
            ResolutionStatus::ResolvedCached | ResolutionStatus::ResolvedFresh
        ) && self.address.as_deref().is_some_and(|a| !a.trim().is_empty())
    }

    /// Returns `true` if the record may be written to the location cache.
    pub fn is_cacheable(&self) -> bool {
        !matches!(self.status, ResolutionStatus::ResolutionError)
    }

    /// Marks a record read back from the cache.
    pub fn into_cached(mut self) -> Self {
        if self.status == ResolutionStatus::ResolvedFresh {
            self.status = ResolutionStatus::ResolvedCached;
        }
        self
    }

    /// Normalizes the status before persisting: cached reads are stored as fresh resolutions.
    pub fn for_storage(mut self) -> Self {
        if self.status == ResolutionStatus::ResolvedCached {
            self.status = ResolutionStatus::ResolvedFresh;
        }
        self
    }

    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }
}
