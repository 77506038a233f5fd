//! Domain models for CallBill
//!
//! This module contains all the core domain models used throughout the application.

pub mod call;
pub mod rate;
pub mod report;
pub mod row;
pub mod totals;

pub use call::{CallEvent, CallRecord, Caller, Rating};
pub use rate::{RateEntry, RateRecord};
pub use report::{censor_number, month_from_number, CallDuration, CdrLine, MonthlyBill};
pub use row::SourceRow;
pub use totals::CallTotals;
