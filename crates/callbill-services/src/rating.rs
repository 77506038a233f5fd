//! Rating engine
//!
//! Prices calls against the rate index using Longest Prefix Match.

use callbill_core::models::{RateEntry, Rating};
use callbill_core::traits::{rate_with, RatingService};
use callbill_index::RateIndex;
use tracing::{trace, warn};

/// Rating engine over a fully built rate index
///
/// Holding a shared borrow keeps the index frozen for as long as the engine
/// is alive.
pub struct RatingEngine<'a> {
    rates: &'a RateIndex,
}

impl<'a> RatingEngine<'a> {
    pub fn new(rates: &'a RateIndex) -> Self {
        Self { rates }
    }

    /// Find the longest region code that prefixes `callee`
    ///
    /// Every prefix from length 1 up to the full number is looked up
    /// exactly; the last hit wins.
    pub fn longest_prefix_match(&self, callee: &str) -> Option<RateEntry> {
        let mut best = None;

        for len in 1..=callee.len() {
            if !callee.is_char_boundary(len) {
                continue;
            }
            if let Some(hit) = self.rates.lookup(&callee[..len]) {
                trace!(callee, prefix = hit.0, "Prefix match");
                best = Some(hit);
            }
        }

        best.map(|(code, rate)| RateEntry::new(code, rate))
    }
}

impl RatingService for RatingEngine<'_> {
    fn find_rate(&self, destination: &str) -> Option<RateEntry> {
        self.longest_prefix_match(destination)
    }

    fn rate_call(&self, destination: &str, duration_seconds: u64) -> (f64, Rating) {
        let (price, rating) = rate_with(self.find_rate(destination), duration_seconds);
        if rating.is_unrated() {
            warn!(callee = destination, "No rate match found, call price set to zero");
        }
        (price, rating)
    }
}
