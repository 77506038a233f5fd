//! Rate table models
//!
//! Represents per-second billing rates keyed by region code prefix.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// A validated row of the rate table
///
/// `region_name` is carried for diagnostics only; the index never looks at it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct RateRecord {
    /// Digits only, no leading zeros (e.g., "43" for Austria, "43664" for an operator range)
    #[validate(length(min = 1, max = 11, message = "Region code must have 1 to 11 digits"))]
    pub region_code: String,

    /// Human-readable region name
    pub region_name: String,

    /// Price per second of call time
    #[validate(range(min = 0.0, message = "Rate must not be negative"))]
    pub rate: f64,
}

/// A rate as stored in the rate index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateEntry {
    pub region_code: String,
    pub rate: f64,
}

impl RateEntry {
    pub fn new(region_code: impl Into<String>, rate: f64) -> Self {
        Self {
            region_code: region_code.into(),
            rate,
        }
    }

    /// Flat per-second pricing; no rounding, no minimum increment
    #[inline]
    pub fn price(&self, duration_seconds: u64) -> f64 {
        duration_seconds as f64 * self.rate
    }
}
