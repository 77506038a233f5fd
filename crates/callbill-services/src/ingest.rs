//! Ingestion driver
//!
//! Feeds validated rows from the readers into the indexes. Row-level errors
//! are logged, collected and skipped; anything fatal stops the load. A source
//! without a single usable row is reported as `NoUsableData`.

use crate::rating::RatingEngine;
use callbill_core::models::{CallRecord, CallTotals, RateRecord, SourceRow};
use callbill_core::{BillingError, BillingResult};
use callbill_index::{CallDisposition, RateIndex, SubscriberIndex};
use tracing::{debug, error, info, warn};

/// A dropped row and why
#[derive(Debug)]
pub struct RowDiagnostic {
    pub line: Option<u64>,
    pub error: BillingError,
}

/// A call that matched no region code
#[derive(Debug, Clone, PartialEq)]
pub struct UnratedCall {
    pub line: u64,
    pub callee: String,
}

/// Outcome counters for one input source
#[derive(Debug, Default)]
pub struct LoadReport {
    pub accepted: usize,
    pub anonymous: usize,
    pub rejected: Vec<RowDiagnostic>,
    pub unrated: Vec<UnratedCall>,
}

impl LoadReport {
    fn reject(&mut self, line: Option<u64>, error: BillingError) {
        warn!(
            line = line.unwrap_or_default(),
            code = error.error_code(),
            "Row discarded: {}",
            error
        );
        self.rejected.push(RowDiagnostic { line, error });
    }

    /// Handle a reader error: keep going on row errors, bail out otherwise
    fn absorb(&mut self, err: BillingError) -> BillingResult<()> {
        if err.is_recoverable() {
            self.reject(err.line(), err);
            Ok(())
        } else {
            error!(code = err.error_code(), "Aborting load: {}", err);
            Err(err)
        }
    }
}

/// Everything produced by the call ingestion pass
pub struct CallLoad {
    pub subscribers: SubscriberIndex,
    pub totals: CallTotals,
    pub report: LoadReport,
}

/// Build the rate index from rate table rows
pub fn load_rates<I>(rows: I) -> BillingResult<(RateIndex, LoadReport)>
where
    I: IntoIterator<Item = BillingResult<SourceRow<RateRecord>>>,
{
    let mut rates = RateIndex::new();
    let mut report = LoadReport::default();

    for row in rows {
        let row = match row {
            Ok(row) => row,
            Err(err) => {
                report.absorb(err)?;
                continue;
            }
        };

        let SourceRow { line, record } = row;
        match rates.insert(record.region_code, record.rate) {
            Ok(()) => report.accepted += 1,
            Err(err) => report.reject(Some(line), err),
        }
    }

    if rates.is_empty() {
        error!("Rate table produced no valid rows");
        return Err(BillingError::NoUsableData("rate table"));
    }

    info!(
        rates = rates.len(),
        rejected = report.rejected.len(),
        height = rates.height(),
        "Rate table loaded"
    );

    Ok((rates, report))
}

/// Rate every call and build the subscriber index
///
/// `rates` must already be complete; it is only read from here on.
pub fn load_calls<I>(rows: I, rates: &RateIndex) -> BillingResult<CallLoad>
where
    I: IntoIterator<Item = BillingResult<SourceRow<CallRecord>>>,
{
    let engine = RatingEngine::new(rates);
    let mut subscribers = SubscriberIndex::new();
    let mut totals = CallTotals::new();
    let mut report = LoadReport::default();

    for row in rows {
        let row = match row {
            Ok(row) => row,
            Err(err) => {
                report.absorb(err)?;
                continue;
            }
        };

        let SourceRow { line, record } = row;
        report.accepted += 1;

        match subscribers.record_call(&record, &engine, &mut totals) {
            CallDisposition::Anonymous => {
                debug!(line, "Anonymous call counted in totals only");
                report.anonymous += 1;
            }
            CallDisposition::Billed { price, rating } => {
                if rating.is_unrated() {
                    debug!(line, callee = %record.callee, "Unrated call recorded");
                    report.unrated.push(UnratedCall {
                        line,
                        callee: record.callee.clone(),
                    });
                } else {
                    debug!(line, price, "Call rated");
                }
            }
        }
    }

    if report.accepted == 0 {
        error!("Call record produced no valid rows");
        return Err(BillingError::NoUsableData("call record"));
    }

    info!(
        calls = totals.call_count,
        subscribers = subscribers.len(),
        anonymous = report.anonymous,
        unrated = report.unrated.len(),
        rejected = report.rejected.len(),
        "Call record loaded"
    );

    Ok(CallLoad {
        subscribers,
        totals,
        report,
    })
}
