//! Call models
//!
//! `CallRecord` is what the readers hand to the engine; `CallEvent` is what a
//! subscriber's ledger stores once the call has been rated.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Originating party of a call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Caller {
    /// A billable subscriber number
    Subscriber(String),
    /// The anonymous sentinel; never billed, never indexed
    Anonymous,
}

impl Caller {
    pub fn number(&self) -> Option<&str> {
        match self {
            Caller::Subscriber(number) => Some(number),
            Caller::Anonymous => None,
        }
    }

    #[inline]
    pub fn is_anonymous(&self) -> bool {
        matches!(self, Caller::Anonymous)
    }
}

/// A validated row of the call record stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct CallRecord {
    pub caller: Caller,

    /// Full callee number; censoring happens at export time only
    #[validate(length(min = 1, max = 15, message = "Callee number must have 1 to 15 digits"))]
    pub callee: String,

    pub duration_seconds: u64,

    pub year: i32,

    #[validate(range(min = 1, max = 12, message = "Month must be between 1 and 12"))]
    pub month: u32,

    #[validate(range(min = 1, max = 31, message = "Day must be between 1 and 31"))]
    pub day: u32,
}

impl CallRecord {
    /// Check the call year against an inclusive range
    pub fn year_within(&self, min_year: i32, max_year: i32) -> bool {
        (min_year..=max_year).contains(&self.year)
    }
}

/// How a call was priced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Rating {
    /// Priced with the rate of the longest matching region code
    Rated { region_code: String, rate: f64 },
    /// No region code matched; the call carries a zero price
    Unrated,
}

impl Rating {
    #[inline]
    pub fn is_unrated(&self) -> bool {
        matches!(self, Rating::Unrated)
    }
}

/// A rated call as stored in a subscriber ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallEvent {
    pub callee: String,
    pub duration_seconds: u64,
    pub price: f64,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub rating: Rating,
}

impl CallEvent {
    pub fn from_record(record: &CallRecord, price: f64, rating: Rating) -> Self {
        Self {
            callee: record.callee.clone(),
            duration_seconds: record.duration_seconds,
            price,
            year: record.year,
            month: record.month,
            day: record.day,
            rating,
        }
    }

    /// Ledger ordering key: `year * 100 + month`. The day is not part of it.
    #[inline]
    pub fn datetime_key(&self) -> i64 {
        i64::from(self.year) * 100 + i64::from(self.month)
    }
}
