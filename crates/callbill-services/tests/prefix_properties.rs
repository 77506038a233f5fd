//! Property-based checks for longest prefix rating.

use callbill_core::models::Rating;
use callbill_core::traits::RatingService;
use callbill_index::RateIndex;
use callbill_services::RatingEngine;
use proptest::prelude::*;
use std::collections::BTreeSet;

// A narrow alphabet so random callees share prefixes with random codes
fn codes() -> impl Strategy<Value = BTreeSet<String>> {
    prop::collection::btree_set("[1-3]{1,5}", 0..40)
}

fn callee() -> impl Strategy<Value = String> {
    "[1-3]{0,12}"
}

fn build(codes: &BTreeSet<String>) -> RateIndex {
    let mut rates = RateIndex::new();
    for (i, code) in codes.iter().enumerate() {
        rates.insert(code.clone(), i as f64 * 0.001).unwrap();
    }
    rates
}

proptest! {
    #[test]
    fn match_is_longest_prefixing_code(codes in codes(), callee in callee()) {
        let rates = build(&codes);
        let engine = RatingEngine::new(&rates);

        let expected = codes
            .iter()
            .filter(|code| callee.starts_with(code.as_str()))
            .max_by_key(|code| code.len());

        let found = engine.longest_prefix_match(&callee);
        prop_assert_eq!(found.map(|e| e.region_code), expected.cloned());
    }

    #[test]
    fn unrated_exactly_when_nothing_matches(codes in codes(), callee in callee(), duration in 0u64..10_000) {
        let rates = build(&codes);
        let engine = RatingEngine::new(&rates);

        let (price, rating) = engine.rate_call(&callee, duration);
        let any_prefix = codes.iter().any(|code| callee.starts_with(code.as_str()));

        prop_assert_eq!(rating.is_unrated(), !any_prefix);
        match rating {
            Rating::Rated { rate, .. } => prop_assert_eq!(price, duration as f64 * rate),
            Rating::Unrated => prop_assert_eq!(price, 0.0),
        }
    }
}
