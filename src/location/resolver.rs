use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::cache::LocationCache;
use super::error::{GeocodeError, LocationCacheError};
use super::geocoder::{GeocodeOutcome, GeocodeQuery, GeocodingProvider};
use crate::model::{Company, CompanyId, LocationRecord};

/// Counters for provider cost monitoring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResolverStats {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub provider_calls: u64,
    pub not_found: u64,
    pub errors: u64,
    pub cache_write_failures: u64,
}

#[derive(Default)]
struct Counters {
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    provider_calls: AtomicU64,
    not_found: AtomicU64,
    errors: AtomicU64,
    cache_write_failures: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> ResolverStats {
        ResolverStats {
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            provider_calls: self.provider_calls.load(Ordering::Relaxed),
            not_found: self.not_found.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            cache_write_failures: self.cache_write_failures.load(Ordering::Relaxed),
        }
    }
}

/// Cache-first company geocoding.
///
/// A company already in the cache never reaches the provider. Fresh answers (including "no
/// match") are written to the cache before they are returned; provider failures are not.
pub struct LocationResolver {
    cache: Arc<dyn LocationCache>,
    provider: Arc<dyn GeocodingProvider>,
    country: String,
    timeout: Duration,
    concurrency: usize,
    counters: Counters,
}

impl LocationResolver {
    pub fn new(
        cache: Arc<dyn LocationCache>,
        provider: Arc<dyn GeocodingProvider>,
        country: impl Into<String>,
        timeout: Duration,
        concurrency: usize,
    ) -> Self {
        Self {
            cache,
            provider,
            country: country.into(),
            timeout,
            concurrency: concurrency.max(1),
            counters: Counters::default(),
        }
    }

    pub fn cache(&self) -> &Arc<dyn LocationCache> {
        &self.cache
    }

    pub fn stats(&self) -> ResolverStats {
        self.counters.snapshot()
    }

    /// Resolves one company. Never fails: provider problems become a
    /// [`crate::model::ResolutionStatus::ResolutionError`] record.
    pub async fn resolve(&self, company: &Company) -> LocationRecord {
        match self.cache_get(company.id).await {
            Ok(Some(record)) => {
                Counters::bump(&self.counters.cache_hits);
                debug!(company_id = company.id, "Location cache hit");
                return record.into_cached();
            }
            Ok(None) => {}
            Err(e) => {
                warn!(
                    company_id = company.id,
                    error = %e,
                    "Location cache read failed; treating as miss"
                );
            }
        }
        Counters::bump(&self.counters.cache_misses);

        let query = GeocodeQuery::for_company(company, &self.country);
        Counters::bump(&self.counters.provider_calls);
        let outcome =
            match tokio::time::timeout(self.timeout, self.provider.geocode(&query)).await {
                Ok(result) => result,
                Err(_) => Err(GeocodeError::Timeout(self.timeout)),
            };

        let source = self.provider.name();
        let record = match outcome {
            Ok(GeocodeOutcome::Found {
                address,
                coordinates,
            }) => LocationRecord::found(company.id, address, coordinates, source),
            Ok(GeocodeOutcome::NoMatch) => {
                Counters::bump(&self.counters.not_found);
                LocationRecord::not_found(company.id, source)
            }
            Err(e) => {
                Counters::bump(&self.counters.errors);
                warn!(company_id = company.id, error = %e, "Geocoding failed");
                return LocationRecord::error(company.id, source, e.to_string());
            }
        };

        if let Err(e) = self.cache_put(record.clone()).await {
            Counters::bump(&self.counters.cache_write_failures);
            warn!(company_id = company.id, error = %e, "Location cache write failed");
        }

        record
    }

    async fn cache_get(
        &self,
        company_id: CompanyId,
    ) -> Result<Option<LocationRecord>, LocationCacheError> {
        let cache = Arc::clone(&self.cache);
        tokio::task::spawn_blocking(move || cache.get(company_id))
            .await
            .map_err(|e| LocationCacheError::TaskFailed {
                reason: e.to_string(),
            })?
    }

    async fn cache_put(&self, record: LocationRecord) -> Result<(), LocationCacheError> {
        let cache = Arc::clone(&self.cache);
        tokio::task::spawn_blocking(move || cache.put(&record))
            .await
            .map_err(|e| LocationCacheError::TaskFailed {
                reason: e.to_string(),
            })?
    }

    /// Resolves a batch with at most `concurrency` provider calls in flight. Duplicate company
    /// ids are resolved once.
    pub async fn resolve_batch(
        &self,
        companies: &[Company],
    ) -> HashMap<CompanyId, LocationRecord> {
        let mut seen = HashSet::with_capacity(companies.len());
        let unique: Vec<&Company> = companies.iter().filter(|c| seen.insert(c.id)).collect();
        let requested = unique.len();

        let records: Vec<LocationRecord> = stream::iter(unique)
            .map(|company| self.resolve(company))
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let resolved = records.iter().filter(|r| r.is_resolved()).count();
        info!(
            requested,
            resolved,
            unresolved = requested - resolved,
            "Resolved location batch"
        );

        records.into_iter().map(|r| (r.company_id, r)).collect()
    }
}
