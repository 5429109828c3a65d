//! Environment-backed configuration.
//!
//! Most settings have defaults. Override with `FUNDMATCH_*` environment variables.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{
    DEFAULT_COUNTRY, DEFAULT_EXPANSION_STEP, DEFAULT_INITIAL_CANDIDATES, DEFAULT_MAX_CANDIDATES,
    DEFAULT_TARGET_MATCHES,
};
use crate::expansion::ExpansionConfig;

/// Pipeline configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `FUNDMATCH_*` overrides on top of defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory for the location cache and persisted results. Default: `./.data`.
    pub storage_path: PathBuf,

    /// Qdrant endpoint URL. Default: `http://localhost:6334`.
    pub qdrant_url: String,

    /// Qdrant collection holding company embeddings. Default: `companies`.
    pub collection: String,

    /// Directory of the sentence encoder (BERT + tokenizer). Stub mode when unset.
    pub encoder_path: Option<PathBuf>,

    /// Directory of the cross-encoder reranker (BERT + tokenizer). Stub mode when unset.
    pub reranker_path: Option<PathBuf>,

    /// Geocoding provider API key.
    pub geocoder_api_key: Option<String>,

    /// Geocoding provider endpoint.
    pub geocoder_url: String,

    /// Country appended to geocoding queries and used for national requirements.
    pub country: String,

    /// Model name for the eligibility reasoner. Default: `gpt-5-mini`.
    pub llm_model: String,

    /// Bound applied to every external call (geocoding, reasoning).
    pub provider_timeout: Duration,

    /// Max records kept in the in-memory front of the location cache.
    pub location_cache_capacity: u64,

    /// Max concurrent geocoding calls within one expansion round.
    pub geocode_concurrency: usize,

    /// Max incentives processed concurrently by the batch runner.
    pub incentive_concurrency: usize,

    /// Expansion parameters (initial size, step, cap, target).
    pub expansion: ExpansionConfig,

    /// JSON file with the incentives to process.
    pub incentives_file: Option<PathBuf>,

    /// JSON file with the company directory.
    pub companies_file: Option<PathBuf>,
}

/// Default Qdrant URL used when `FUNDMATCH_QDRANT_URL` is not set.
pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6334";

/// Default Places Text Search endpoint.
pub const DEFAULT_GEOCODER_URL: &str =
    "https://maps.googleapis.com/maps/api/place/textsearch/json";

pub const DEFAULT_COLLECTION: &str = "companies";

pub const DEFAULT_LLM_MODEL: &str = "gpt-5-mini";

pub const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 30;

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_path: PathBuf::from("./.data"),
            qdrant_url: DEFAULT_QDRANT_URL.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
            encoder_path: None,
            reranker_path: None,
            geocoder_api_key: None,
            geocoder_url: DEFAULT_GEOCODER_URL.to_string(),
            country: DEFAULT_COUNTRY.to_string(),
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            provider_timeout: Duration::from_secs(DEFAULT_PROVIDER_TIMEOUT_SECS),
            location_cache_capacity: 100_000,
            geocode_concurrency: 8,
            incentive_concurrency: 1,
            expansion: ExpansionConfig {
                initial_candidates: DEFAULT_INITIAL_CANDIDATES,
                step: DEFAULT_EXPANSION_STEP,
                max_candidates: DEFAULT_MAX_CANDIDATES,
                target_matches: DEFAULT_TARGET_MATCHES,
            },
            incentives_file: None,
            companies_file: None,
        }
    }
}

impl Config {
    const ENV_STORAGE_PATH: &'static str = "FUNDMATCH_STORAGE_PATH";
    const ENV_QDRANT_URL: &'static str = "FUNDMATCH_QDRANT_URL";
    const ENV_COLLECTION: &'static str = "FUNDMATCH_COLLECTION";
    const ENV_ENCODER_PATH: &'static str = "FUNDMATCH_ENCODER_PATH";
    const ENV_RERANKER_PATH: &'static str = "FUNDMATCH_RERANKER_PATH";
    const ENV_GEOCODER_API_KEY: &'static str = "FUNDMATCH_GEOCODER_API_KEY";
    const ENV_GEOCODER_URL: &'static str = "FUNDMATCH_GEOCODER_URL";
    const ENV_COUNTRY: &'static str = "FUNDMATCH_COUNTRY";
    const ENV_LLM_MODEL: &'static str = "FUNDMATCH_LLM_MODEL";
    const ENV_PROVIDER_TIMEOUT_SECS: &'static str = "FUNDMATCH_PROVIDER_TIMEOUT_SECS";
    const ENV_LOCATION_CACHE_CAPACITY: &'static str = "FUNDMATCH_LOCATION_CACHE_CAPACITY";
    const ENV_GEOCODE_CONCURRENCY: &'static str = "FUNDMATCH_GEOCODE_CONCURRENCY";
    const ENV_INCENTIVE_CONCURRENCY: &'static str = "FUNDMATCH_INCENTIVE_CONCURRENCY";
    const ENV_INITIAL_CANDIDATES: &'static str = "FUNDMATCH_INITIAL_CANDIDATES";
    const ENV_EXPANSION_STEP: &'static str = "FUNDMATCH_EXPANSION_STEP";
    const ENV_MAX_CANDIDATES: &'static str = "FUNDMATCH_MAX_CANDIDATES";
    const ENV_TARGET_MATCHES: &'static str = "FUNDMATCH_TARGET_MATCHES";
    const ENV_INCENTIVES_FILE: &'static str = "FUNDMATCH_INCENTIVES_FILE";
    const ENV_COMPANIES_FILE: &'static str = "FUNDMATCH_COMPANIES_FILE";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let storage_path = Self::parse_path_from_env(Self::ENV_STORAGE_PATH, defaults.storage_path);
        let qdrant_url = Self::parse_string_from_env(Self::ENV_QDRANT_URL, defaults.qdrant_url);
        let collection = Self::parse_string_from_env(Self::ENV_COLLECTION, defaults.collection);
        let encoder_path = Self::parse_optional_path_from_env(Self::ENV_ENCODER_PATH);
        let reranker_path = Self::parse_optional_path_from_env(Self::ENV_RERANKER_PATH);
        let geocoder_api_key = Self::parse_optional_string_from_env(Self::ENV_GEOCODER_API_KEY);
        let geocoder_url =
            Self::parse_string_from_env(Self::ENV_GEOCODER_URL, defaults.geocoder_url);
        let country = Self::parse_string_from_env(Self::ENV_COUNTRY, defaults.country);
        let llm_model = Self::parse_string_from_env(Self::ENV_LLM_MODEL, defaults.llm_model);

        let provider_timeout = Duration::from_secs(Self::parse_number_from_env(
            Self::ENV_PROVIDER_TIMEOUT_SECS,
            defaults.provider_timeout.as_secs(),
        )?);
        let location_cache_capacity = Self::parse_number_from_env(
            Self::ENV_LOCATION_CACHE_CAPACITY,
            defaults.location_cache_capacity,
        )?;
        let geocode_concurrency = Self::parse_number_from_env(
            Self::ENV_GEOCODE_CONCURRENCY,
            defaults.geocode_concurrency,
        )?;
        let incentive_concurrency = Self::parse_number_from_env(
            Self::ENV_INCENTIVE_CONCURRENCY,
            defaults.incentive_concurrency,
        )?;

        let expansion = ExpansionConfig {
            initial_candidates: Self::parse_number_from_env(
                Self::ENV_INITIAL_CANDIDATES,
                defaults.expansion.initial_candidates,
            )?,
            step: Self::parse_number_from_env(Self::ENV_EXPANSION_STEP, defaults.expansion.step)?,
            max_candidates: Self::parse_number_from_env(
                Self::ENV_MAX_CANDIDATES,
                defaults.expansion.max_candidates,
            )?,
            target_matches: Self::parse_number_from_env(
                Self::ENV_TARGET_MATCHES,
                defaults.expansion.target_matches,
            )?,
        };

        let incentives_file = Self::parse_optional_path_from_env(Self::ENV_INCENTIVES_FILE);
        let companies_file = Self::parse_optional_path_from_env(Self::ENV_COMPANIES_FILE);

        Ok(Self {
            storage_path,
            qdrant_url,
            collection,
            encoder_path,
            reranker_path,
            geocoder_api_key,
            geocoder_url,
            country,
            llm_model,
            provider_timeout,
            location_cache_capacity,
            geocode_concurrency,
            incentive_concurrency,
            expansion,
            incentives_file,
            companies_file,
        })
    }

    /// Validates paths and basic invariants (does not create directories).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage_path.exists() && !self.storage_path.is_dir() {
            return Err(ConfigError::NotADirectory {
                path: self.storage_path.clone(),
            });
        }

        for path in [&self.encoder_path, &self.reranker_path].into_iter().flatten() {
            if !path.exists() {
                return Err(ConfigError::PathNotFound { path: path.clone() });
            }
            if !path.is_dir() {
                return Err(ConfigError::NotADirectory { path: path.clone() });
            }
        }

        for path in [&self.incentives_file, &self.companies_file]
            .into_iter()
            .flatten()
        {
            if !path.exists() {
                return Err(ConfigError::PathNotFound { path: path.clone() });
            }
            if !path.is_file() {
                return Err(ConfigError::NotAFile { path: path.clone() });
            }
        }

        if self.provider_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: Self::ENV_PROVIDER_TIMEOUT_SECS,
                reason: "must be greater than zero".to_string(),
            });
        }

        if self.geocode_concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                name: Self::ENV_GEOCODE_CONCURRENCY,
                reason: "must be greater than zero".to_string(),
            });
        }

        if self.incentive_concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                name: Self::ENV_INCENTIVE_CONCURRENCY,
                reason: "must be greater than zero".to_string(),
            });
        }

        self.expansion
            .validate()
            .map_err(|reason| ConfigError::InvalidValue {
                name: "FUNDMATCH_*_CANDIDATES",
                reason,
            })?;

        Ok(())
    }

    /// Returns the API key, or [`ConfigError::MissingEnvVar`] when none is configured.
    pub fn require_geocoder_api_key(&self) -> Result<&str, ConfigError> {
        self.geocoder_api_key
            .as_deref()
            .ok_or(ConfigError::MissingEnvVar {
                name: Self::ENV_GEOCODER_API_KEY,
            })
    }

    /// Directory holding the durable location cache.
    pub fn locations_dir(&self) -> PathBuf {
        self.storage_path.join("locations")
    }

    /// Directory holding persisted per-incentive results.
    pub fn results_dir(&self) -> PathBuf {
        self.storage_path.join("results")
    }

    fn parse_path_from_env(var_name: &str, default: PathBuf) -> PathBuf {
        env::var(var_name).map(PathBuf::from).unwrap_or(default)
    }

    fn parse_optional_path_from_env(var_name: &str) -> Option<PathBuf> {
        Self::parse_optional_string_from_env(var_name).map(PathBuf::from)
    }

    fn parse_optional_string_from_env(var_name: &str) -> Option<String> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse_string_from_env(var_name: &str, default: String) -> String {
        env::var(var_name).unwrap_or(default)
    }

    fn parse_number_from_env<T>(var_name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: std::str::FromStr<Err = std::num::ParseIntError>,
    {
        match env::var(var_name) {
            Ok(value) => value
                .trim()
                .parse()
                .map_err(|e| ConfigError::NumberParseError {
                    name: var_name,
                    value,
                    source: e,
                }),
            Err(_) => Ok(default),
        }
    }
}
