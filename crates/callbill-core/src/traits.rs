//! Common traits for rating and report output
//!
//! Defines the seams between the indexes, the rating engine, and whatever
//! consumes the finished reports.

use crate::models::{CdrLine, MonthlyBill, RateEntry, Rating};
use crate::BillingResult;

/// Rate lookup and cost calculation for a single call
pub trait RatingService {
    /// Find the rate for a destination using Longest Prefix Match
    fn find_rate(&self, destination: &str) -> Option<RateEntry>;

    /// Price a call and report how it was rated
    ///
    /// Destinations without any matching prefix price at zero and come back
    /// as [`Rating::Unrated`], distinct from a zero-rate region.
    fn rate_call(&self, destination: &str, duration_seconds: u64) -> (f64, Rating) {
        rate_with(self.find_rate(destination), duration_seconds)
    }
}

/// Price a call against an optional rate match
///
/// No match prices at zero and yields [`Rating::Unrated`].
pub fn rate_with(entry: Option<RateEntry>, duration_seconds: u64) -> (f64, Rating) {
    match entry {
        Some(entry) => (
            entry.price(duration_seconds),
            Rating::Rated {
                region_code: entry.region_code,
                rate: entry.rate,
            },
        ),
        None => (0.0, Rating::Unrated),
    }
}

/// Consumer of per-subscriber monthly reports
pub trait ReportSink {
    /// Receive every CDR line of one subscriber for one month
    fn write_cdr(&mut self, subscriber: &str, year: i32, month: u32, lines: &[CdrLine])
        -> BillingResult<()>;

    /// Receive the monthly invoice of one subscriber
    fn write_bill(&mut self, bill: &MonthlyBill) -> BillingResult<()>;
}
