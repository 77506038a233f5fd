//! Subscriber node
//!
//! One subscriber owns its call ledger and three cached aggregates. The
//! aggregates are only ever recomputed from the ledger, never adjusted in
//! place.

use crate::ledger::CallLedger;
use callbill_core::models::CallEvent;

#[derive(Debug, Clone)]
pub struct Subscriber {
    number: String,
    ledger: CallLedger,
    total_call_number: u64,
    total_call_duration: u64,
    total_bill: f64,
}

impl Subscriber {
    pub(crate) fn new(number: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            ledger: CallLedger::new(),
            total_call_number: 0,
            total_call_duration: 0,
            total_bill: 0.0,
        }
    }

    /// Add a rated call to the ledger and refresh the aggregates
    pub(crate) fn add_call(&mut self, event: CallEvent) {
        self.ledger.insert_ordered(event);
        self.recalculate_totals();
    }

    fn recalculate_totals(&mut self) {
        let mut calls = 0;
        let mut duration = 0;
        let mut bill = 0.0;

        for event in &self.ledger {
            calls += 1;
            duration += event.duration_seconds;
            bill += event.price;
        }

        self.total_call_number = calls;
        self.total_call_duration = duration;
        self.total_bill = bill;
    }

    pub fn number(&self) -> &str {
        &self.number
    }

    pub fn ledger(&self) -> &CallLedger {
        &self.ledger
    }

    pub fn total_call_number(&self) -> u64 {
        self.total_call_number
    }

    pub fn total_call_duration(&self) -> u64 {
        self.total_call_duration
    }

    pub fn total_bill(&self) -> f64 {
        self.total_bill
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use callbill_core::models::Rating;

    #[test]
    fn test_aggregates_follow_ledger() {
        let mut sub = Subscriber::new("436802119876");
        for (month, duration, price) in [(3, 30, 0.3), (1, 90, 0.9), (2, 45, 0.0)] {
            sub.add_call(CallEvent {
                callee: "4369910149876".to_string(),
                duration_seconds: duration,
                price,
                year: 2020,
                month,
                day: 1,
                rating: Rating::Unrated,
            });
        }

        assert_eq!(sub.number(), "436802119876");
        assert_eq!(sub.total_call_number(), 3);
        assert_eq!(sub.total_call_number(), sub.ledger().len() as u64);
        assert_eq!(sub.total_call_duration(), 165);
        assert!((sub.total_bill() - 1.2).abs() < 1e-9);
    }
}
