//! Company location resolution.
//!
//! - [`cache`]: durable company-id → location store shared across runs
//! - [`geocoder`]: provider trait and the Places Text Search client
//! - [`resolver`]: cache-first resolution with bounded provider fan-out

pub mod cache;
pub mod error;
pub mod geocoder;
pub mod resolver;


pub use cache::{DiskLocationCache, LocationCache, MemoryLocationCache};
pub use error::{GeocodeError, LocationCacheError};
pub use geocoder::{
    GOOGLE_PLACES_SOURCE, GeocodeOutcome, GeocodeQuery, GeocodingProvider, GooglePlacesGeocoder,
    interpret_places_response,
};
#[cfg(any(test, feature = "mock"))]
pub use geocoder::{MockBehavior, MockGeocoder};
pub use resolver::{LocationResolver, ResolverStats};
