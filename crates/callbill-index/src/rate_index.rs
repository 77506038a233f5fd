//! Rate index
//!
//! AVL tree of per-second rates keyed by region code. The rate table is
//! write-once: it is filled completely, then only ever borrowed immutably
//! while calls are rated.

use crate::avl::{AvlTree, InvariantViolation};
use callbill_core::models::RateEntry;
use callbill_core::{BillingError, BillingResult};
use tracing::debug;

/// Region code → rate lookup table
#[derive(Default)]
pub struct RateIndex {
    tree: AvlTree<String, f64>,
}

impl RateIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a rate for a region code
    ///
    /// Region codes are unique: a second insert for the same code leaves the
    /// first rate in place and fails with [`BillingError::DuplicateRegionCode`].
    pub fn insert(&mut self, region_code: impl Into<String>, rate: f64) -> BillingResult<()> {
        let region_code = region_code.into();
        debug!(region_code = %region_code, rate, "Inserting rate");
        self.tree
            .insert(region_code, rate)
            .map_err(|dup| BillingError::DuplicateRegionCode(dup.key))
    }

    /// Exact-match lookup by region code
    pub fn search(&self, region_code: &str) -> Option<RateEntry> {
        self.lookup(region_code)
            .map(|(code, rate)| RateEntry::new(code, rate))
    }

    /// Borrowing variant of [`search`](Self::search)
    pub fn lookup(&self, region_code: &str) -> Option<(&str, f64)> {
        self.tree
            .get_key_value(region_code)
            .map(|(code, rate)| (code.as_str(), *rate))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn height(&self) -> i32 {
        self.tree.height()
    }

    /// Rates in ascending region code order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.tree.iter().map(|(code, rate)| (code.as_str(), *rate))
    }

    /// Diagnostic listing in ascending region code order
    pub fn traverse_inorder<F: FnMut(&str, f64)>(&self, mut visit: F) {
        self.tree.traverse_inorder(|code, rate| visit(code, *rate));
    }

    /// Release every node, children before parents
    pub fn teardown<F: FnMut(RateEntry)>(self, mut visit: F) {
        self.tree
            .into_postorder(|region_code, rate| visit(RateEntry { region_code, rate }));
    }

    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        self.tree.check_invariants()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_search() {
        let mut rates = RateIndex::new();
        rates.insert("1", 0.01).unwrap();
        rates.insert("44", 0.02).unwrap();

        assert_eq!(rates.search("44"), Some(RateEntry::new("44", 0.02)));
        assert_eq!(rates.lookup("1"), Some(("1", 0.01)));
        assert!(rates.search("4").is_none());
        assert!(rates.search("441").is_none());
    }

    #[test]
    fn test_duplicate_region_code() {
        let mut rates = RateIndex::new();
        rates.insert("43", 0.05).unwrap();

        let err = rates.insert("43", 0.07).unwrap_err();
        assert!(matches!(err, BillingError::DuplicateRegionCode(ref code) if code == "43"));
        assert!(err.is_recoverable());
        assert_eq!(rates.len(), 1);
        assert_eq!(rates.lookup("43"), Some(("43", 0.05)));
    }

    #[test]
    fn test_inorder_listing() {
        let mut rates = RateIndex::new();
        for (code, rate) in [("07", 0.0), ("01", 0.0), ("05", 5.0), ("13", 0.0), ("10", 0.0)] {
            rates.insert(code, rate).unwrap();
        }

        let mut listed = Vec::new();
        rates.traverse_inorder(|code, _| listed.push(code.to_string()));
        assert_eq!(listed, vec!["01", "05", "07", "10", "13"]);
        assert!(rates.check_invariants().is_ok());
    }

    #[test]
    fn test_teardown_visits_each_once() {
        let mut rates = RateIndex::new();
        for code in ["1", "2", "3", "4", "5"] {
            rates.insert(code, 0.1).unwrap();
        }
        let mut freed = Vec::new();
        rates.teardown(|entry| freed.push(entry.region_code));
        freed.sort();
        assert_eq!(freed, vec!["1", "2", "3", "4", "5"]);
    }
}
