//! Cross-cutting, shared constants.
//!
//! # Scoring Invariants
//!
//! The composite weights are compared across incentives by downstream consumers, so they are
//! compile-time constants rather than configuration. [`validate_weights`] checks that they form
//! a convex combination; the test module pins the exact values.

/// Weight of the normalized cross-encoder relevance score (S).
pub const WEIGHT_RELEVANCE: f64 = 0.50;
/// Weight of the sector/activity token overlap (M).
pub const WEIGHT_SECTOR_OVERLAP: f64 = 0.20;
/// Weight of the discretized geographic fit (G).
pub const WEIGHT_GEOGRAPHY: f64 = 0.10;
/// Weight of the direction-adjusted organizational capacity (O′).
pub const WEIGHT_ORGANIZATIONAL: f64 = 0.15;
/// Weight of the website presence signal (W).
pub const WEIGHT_DIGITAL_PRESENCE: f64 = 0.05;

/// Human-readable form of the composite formula, persisted with every result set.
pub const SCORING_FORMULA: &str = "0.50S + 0.20M + 0.10G + 0.15O' + 0.05W";

pub const DEFAULT_INITIAL_CANDIDATES: usize = 10;
pub const DEFAULT_EXPANSION_STEP: usize = 10;
pub const DEFAULT_MAX_CANDIDATES: usize = 50;
pub const DEFAULT_TARGET_MATCHES: usize = 5;

/// Entries kept in each persisted ranking.
pub const RANKING_SIZE: usize = 5;

/// Max characters of company activity text copied into persisted rankings.
pub const ACTIVITY_SNIPPET_CHARS: usize = 200;

pub const DEFAULT_COUNTRY: &str = "Portugal";

const WEIGHT_EPSILON: f64 = 1e-9;

/// Returns the five composite weights in formula order (S, M, G, O′, W).
pub fn composite_weights() -> [f64; 5] {
    [
        WEIGHT_RELEVANCE,
        WEIGHT_SECTOR_OVERLAP,
        WEIGHT_GEOGRAPHY,
        WEIGHT_ORGANIZATIONAL,
        WEIGHT_DIGITAL_PRESENCE,
    ]
}

/// Error returned when the composite weights do not form a convex combination.
#[derive(Debug, Clone, PartialEq)]
pub enum WeightValidationError {
    /// A weight lies outside `[0, 1]`.
    OutOfRange { index: usize, value: f64 },
    /// The weights do not sum to 1.0.
    BadSum { sum: f64 },
}

impl std::fmt::Display for WeightValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutOfRange { index, value } => {
                write!(f, "weight #{} is out of range: {}", index, value)
            }
            Self::BadSum { sum } => write!(f, "weights sum to {} instead of 1.0", sum),
        }
    }
}

impl std::error::Error for WeightValidationError {}

/// Validates that `weights` are each in `[0, 1]` and sum to 1.0.
pub fn validate_weights(weights: &[f64]) -> Result<(), WeightValidationError> {
    for (index, &value) in weights.iter().enumerate() {
        if !(0.0..=1.0).contains(&value) {
            return Err(WeightValidationError::OutOfRange { index, value });
        }
    }

    let sum: f64 = weights.iter().sum();
    if (sum - 1.0).abs() > WEIGHT_EPSILON {
        return Err(WeightValidationError::BadSum { sum });
    }
    Ok(())
}
