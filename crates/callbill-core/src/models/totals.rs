//! Process-wide call totals
//!
//! Owned by whoever drives ingestion and threaded through it explicitly.

use serde::Serialize;

/// Running totals across every ingested call, anonymous calls included
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct CallTotals {
    pub call_count: u64,
    pub total_duration: u64,
    pub total_price: f64,
}

impl CallTotals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for a subscriber call
    pub fn record_billed(&mut self, duration_seconds: u64, price: f64) {
        self.call_count += 1;
        self.total_duration += duration_seconds;
        self.total_price += price;
    }

    /// Account for an anonymous call; anonymous callers are never billed
    pub fn record_anonymous(&mut self, duration_seconds: u64) {
        self.call_count += 1;
        self.total_duration += duration_seconds;
    }
}
