//! Geocoding providers.
//!
//! `GooglePlacesGeocoder` calls the Places Text Search API. `MockGeocoder` scripts per-company
//! outcomes for tests.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::Deserialize;
use tracing::debug;

use super::error::GeocodeError;
use crate::model::{Company, CompanyId};

/// Source tag stored on records produced by [`GooglePlacesGeocoder`].
pub const GOOGLE_PLACES_SOURCE: &str = "google_places";

const REGION_BIAS: &str = "pt";
const LANGUAGE_BIAS: &str = "pt";
const PLACE_TYPE: &str = "establishment";

/// Free-text lookup sent to a provider.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeQuery {
    pub company_id: CompanyId,
    pub text: String,
}

impl GeocodeQuery {
    /// Company name, optional address hint, then the country.
    pub fn for_company(company: &Company, country: &str) -> Self {
        let mut parts = vec![company.name.trim()];
        if let Some(hint) = company.address_hint.as_deref() {
            parts.push(hint.trim());
        }
        parts.push(country.trim());

        let text = parts
            .into_iter()
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(", ");

        Self {
            company_id: company.id,
            text,
        }
    }
}

/// Successful provider answer.
#[derive(Debug, Clone, PartialEq)]
pub enum GeocodeOutcome {
    Found {
        address: String,
        coordinates: Option<(f64, f64)>,
    },
    NoMatch,
}

#[async_trait]
/// Resolves a company to an address. Implementations must be safe to call concurrently.
pub trait GeocodingProvider: Send + Sync {
    /// Tag stored in [`crate::model::LocationRecord::source`].
    fn name(&self) -> &str;

    async fn geocode(&self, query: &GeocodeQuery) -> Result<GeocodeOutcome, GeocodeError>;
}

#[derive(Debug, Deserialize)]
struct PlacesResponse {
    status: String,
    #[serde(default)]
    results: Vec<PlaceResult>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaceResult {
    #[serde(default)]
    formatted_address: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    geometry: Option<Geometry>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

/// Maps a Places Text Search response body to an outcome.
///
/// The first result wins. Its formatted address is preferred, then its place name; a result
/// with neither is no match.
pub fn interpret_places_response(body: &str) -> Result<GeocodeOutcome, GeocodeError> {
    let response: PlacesResponse =
        serde_json::from_str(body).map_err(|e| GeocodeError::InvalidResponse {
            reason: e.to_string(),
        })?;

    let message = response.error_message.unwrap_or_default();
    match response.status.as_str() {
        "OK" => {
            let Some(first) = response.results.into_iter().next() else {
                return Ok(GeocodeOutcome::NoMatch);
            };
            let address = [first.formatted_address, first.name]
                .into_iter()
                .flatten()
                .find(|a| !a.trim().is_empty());
            match address {
                Some(address) => Ok(GeocodeOutcome::Found {
                    address,
                    coordinates: first.geometry.map(|g| (g.location.lat, g.location.lng)),
                }),
                None => Ok(GeocodeOutcome::NoMatch),
            }
        }
        "ZERO_RESULTS" => Ok(GeocodeOutcome::NoMatch),
        "OVER_QUERY_LIMIT" => Err(GeocodeError::RateLimited),
        "REQUEST_DENIED" => Err(GeocodeError::Denied { reason: message }),
        other => Err(GeocodeError::Provider {
            status: other.to_string(),
            message,
        }),
    }
}

/// Google Places Text Search client.
pub struct GooglePlacesGeocoder {
    endpoint: String,
    api_key: String,
    http: HttpClient,
}

impl GooglePlacesGeocoder {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            http: HttpClient::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| HttpClient::new()),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl GeocodingProvider for GooglePlacesGeocoder {
    fn name(&self) -> &str {
        GOOGLE_PLACES_SOURCE
    }

    async fn geocode(&self, query: &GeocodeQuery) -> Result<GeocodeOutcome, GeocodeError> {
        let resp = self
            .http
            .get(&self.endpoint)
            .query(&[
                ("query", query.text.as_str()),
                ("key", self.api_key.as_str()),
                ("region", REGION_BIAS),
                ("language", LANGUAGE_BIAS),
                ("type", PLACE_TYPE),
            ])
            .send()
            .await?;

        let status = resp.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(GeocodeError::RateLimited);
        }
        if !status.is_success() {
            return Err(GeocodeError::Provider {
                status: status.to_string(),
                message: resp.text().await.unwrap_or_default(),
            });
        }

        let body = resp.text().await?;
        let outcome = interpret_places_response(&body)?;
        debug!(
            company_id = query.company_id,
            found = matches!(outcome, GeocodeOutcome::Found { .. }),
            "Places lookup complete"
        );
        Ok(outcome)
    }
}

#[cfg(any(test, feature = "mock"))]
pub use mock::{MockBehavior, MockGeocoder};

#[cfg(any(test, feature = "mock"))]
mod mock {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use parking_lot::RwLock;

    use super::{GeocodeOutcome, GeocodeQuery, GeocodingProvider};
    use crate::location::error::GeocodeError;
    use crate::model::CompanyId;

    pub const MOCK_SOURCE: &str = "mock";

    /// Scripted answer for one company.
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        Found {
            address: String,
            coordinates: Option<(f64, f64)>,
        },
        NoMatch,
        Fail(String),
        /// Sleeps before answering `NoMatch`; used to trip the resolver timeout.
        Hang(Duration),
    }

    impl MockBehavior {
        pub fn found(address: impl Into<String>) -> Self {
            Self::Found {
                address: address.into(),
                coordinates: None,
            }
        }
    }

    /// Scripted provider. Companies without a behavior get `NoMatch`.
    #[derive(Default)]
    pub struct MockGeocoder {
        behaviors: RwLock<HashMap<CompanyId, MockBehavior>>,
        calls: RwLock<HashMap<CompanyId, usize>>,
        total: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        delay: RwLock<Option<Duration>>,
    }

    impl MockGeocoder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with(self, company_id: CompanyId, behavior: MockBehavior) -> Self {
            self.set(company_id, behavior);
            self
        }

        pub fn set(&self, company_id: CompanyId, behavior: MockBehavior) {
            self.behaviors.write().insert(company_id, behavior);
        }

        /// Adds a fixed delay to every call so concurrent calls overlap.
        pub fn set_delay(&self, delay: Duration) {
            *self.delay.write() = Some(delay);
        }

        pub fn calls_for(&self, company_id: CompanyId) -> usize {
            self.calls.read().get(&company_id).copied().unwrap_or(0)
        }

        pub fn total_calls(&self) -> usize {
            self.total.load(Ordering::SeqCst)
        }

        /// Highest number of calls observed running at once.
        pub fn max_in_flight(&self) -> usize {
            self.max_in_flight.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl GeocodingProvider for MockGeocoder {
        fn name(&self) -> &str {
            MOCK_SOURCE
        }

        async fn geocode(&self, query: &GeocodeQuery) -> Result<GeocodeOutcome, GeocodeError> {
            *self.calls.write().entry(query.company_id).or_insert(0) += 1;
            self.total.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            let _guard = InFlightGuard(&self.in_flight);

            let delay = *self.delay.read();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }

            let behavior = self.behaviors.read().get(&query.company_id).cloned();
            let result = match behavior {
                Some(MockBehavior::Found {
                    address,
                    coordinates,
                }) => Ok(GeocodeOutcome::Found {
                    address,
                    coordinates,
                }),
                Some(MockBehavior::Fail(message)) => Err(GeocodeError::Provider {
                    status: "UNKNOWN_ERROR".to_string(),
                    message,
                }),
                Some(MockBehavior::Hang(duration)) => {
                    tokio::time::sleep(duration).await;
                    Ok(GeocodeOutcome::NoMatch)
                }
                Some(MockBehavior::NoMatch) | None => Ok(GeocodeOutcome::NoMatch),
            };

            result
        }
    }

    struct InFlightGuard<'a>(&'a AtomicUsize);

    impl Drop for InFlightGuard<'_> {
        fn drop(&mut self) {
            self.0.fetch_sub(1, Ordering::SeqCst);
        }
    }
}
