//! Subscriber index
//!
//! AVL tree of subscribers keyed by phone number. Recording a call rates it,
//! appends it to the caller's ledger and folds it into the run totals.

use crate::avl::{AvlTree, InvariantViolation};
use crate::subscriber::Subscriber;
use callbill_core::models::{CallEvent, CallRecord, CallTotals, Caller, Rating};
use callbill_core::traits::RatingService;
use tracing::debug;

/// What happened to a recorded call
#[derive(Debug, Clone, PartialEq)]
pub enum CallDisposition {
    /// Added to the caller's ledger with the given price and rating
    Billed { price: f64, rating: Rating },
    /// Anonymous caller: counted in the totals only
    Anonymous,
}

impl CallDisposition {
    pub fn is_unrated(&self) -> bool {
        matches!(
            self,
            CallDisposition::Billed {
                rating: Rating::Unrated,
                ..
            }
        )
    }
}

/// Phone number → subscriber lookup table
#[derive(Default)]
pub struct SubscriberIndex {
    tree: AvlTree<String, Subscriber>,
}

impl SubscriberIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rate a call and file it under its caller
    ///
    /// A caller seen for the first time gets a new tree node (with the usual
    /// AVL rebalancing); a known caller only has its ledger extended and its
    /// aggregates recomputed. Anonymous calls never reach the tree.
    pub fn record_call<R>(
        &mut self,
        call: &CallRecord,
        rater: &R,
        totals: &mut CallTotals,
    ) -> CallDisposition
    where
        R: RatingService + ?Sized,
    {
        let number = match &call.caller {
            Caller::Anonymous => {
                totals.record_anonymous(call.duration_seconds);
                return CallDisposition::Anonymous;
            }
            Caller::Subscriber(number) => number,
        };

        let (price, rating) = rater.rate_call(&call.callee, call.duration_seconds);
        totals.record_billed(call.duration_seconds, price);

        let event = CallEvent::from_record(call, price, rating.clone());
        let disposition = CallDisposition::Billed { price, rating };

        if let Some(subscriber) = self.tree.get_mut(number.as_str()) {
            subscriber.add_call(event);
            return disposition;
        }

        debug!(subscriber = %number, "New subscriber");
        let mut subscriber = Subscriber::new(number.clone());
        subscriber.add_call(event);
        let inserted = self.tree.insert(number.clone(), subscriber);
        debug_assert!(inserted.is_ok(), "subscriber {number} was absent before insert");

        disposition
    }

    pub fn get(&self, number: &str) -> Option<&Subscriber> {
        self.tree.get(number)
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

    /// Subscribers in ascending number order
    pub fn iter(&self) -> impl Iterator<Item = &Subscriber> + '_ {
        self.tree.iter().map(|(_, sub)| sub)
    }

    /// Visit subscribers node-first; drives report generation
    pub fn traverse_preorder<F: FnMut(&Subscriber)>(&self, mut visit: F) {
        self.tree.traverse_preorder(|_, sub| visit(sub));
    }

    /// Visit subscribers in ascending number order; diagnostic listing
    pub fn traverse_inorder<F: FnMut(&Subscriber)>(&self, mut visit: F) {
        self.tree.traverse_inorder(|_, sub| visit(sub));
    }

    /// Visit subscribers children-first
    pub fn traverse_postorder<F: FnMut(&Subscriber)>(&self, mut visit: F) {
        self.tree.traverse_postorder(|_, sub| visit(sub));
    }

    /// Release every subscriber and its ledger, children before parents
    pub fn teardown<F: FnMut(Subscriber)>(self, mut visit: F) {
        self.tree.into_postorder(|_, sub| visit(sub));
    }

    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        self.tree.check_invariants()
    }
}
