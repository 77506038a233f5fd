//! In-memory indexes for CallBill
//!
//! Two AVL trees carry the whole billing state:
//!
//! - [`RateIndex`] maps region codes to per-second rates. It is built once
//!   from the rate table and only read afterwards.
//! - [`SubscriberIndex`] maps subscriber numbers to a [`Subscriber`], each of
//!   which owns a [`CallLedger`] of rated calls kept in month order.
//!
//! Both trees are instances of the generic [`AvlTree`], which owns its nodes
//! strictly parent-to-child and never keeps back-references.

pub mod avl;
pub mod ledger;
pub mod rate_index;
pub mod subscriber;
pub mod subscriber_index;

pub use avl::{AvlTree, DuplicateKey, InvariantViolation};
pub use ledger::{CallLedger, MonthlyGroup, MonthlyGroups};
pub use rate_index::RateIndex;
pub use subscriber::Subscriber;
pub use subscriber_index::{CallDisposition, SubscriberIndex};
