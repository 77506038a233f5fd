//! Business logic services for CallBill
//!
//! This crate contains the services that turn validated input rows into
//! monthly reports:
//!
//! - `RatingEngine` - Longest Prefix Match rating over a frozen rate index
//! - `ingest` - Rate table and call record loading with row diagnostics
//! - `ReportProjection` - Per-subscriber, per-month bills and CDR lines
//!
//! Everything runs on one thread in one pass: the rate index is complete
//! before the first call is rated, and the subscriber index is complete
//! before the first report is produced.

pub mod ingest;
pub mod rating;
pub mod report;

pub use ingest::{load_calls, load_rates, CallLoad, LoadReport, RowDiagnostic, UnratedCall};
pub use rating::RatingEngine;
pub use report::{ReportProjection, ReportSummary};
