//! Report projection
//!
//! Read-only walk over the subscriber index that turns every subscriber's
//! monthly call groups into CDR lines and one invoice per month.

use callbill_core::models::{censor_number, CallDuration, CdrLine, MonthlyBill};
use callbill_core::traits::ReportSink;
use callbill_core::BillingResult;
use callbill_index::{MonthlyGroup, Subscriber, SubscriberIndex};
use serde::Serialize;
use tracing::{debug, info};

/// Counters for one reporting pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub subscribers: usize,
    pub bills: usize,
    pub cdr_lines: usize,
}

/// Projection of the subscriber index into monthly reports
pub struct ReportProjection<'a> {
    subscribers: &'a SubscriberIndex,
}

impl<'a> ReportProjection<'a> {
    pub fn new(subscribers: &'a SubscriberIndex) -> Self {
        Self { subscribers }
    }

    /// CDR export lines for one month; callee numbers are masked here
    pub fn cdr_lines(subscriber: &Subscriber, group: &MonthlyGroup<'_>) -> Vec<CdrLine> {
        group
            .calls
            .iter()
            .map(|call| CdrLine {
                caller: subscriber.number().to_string(),
                callee: censor_number(&call.callee),
                duration: CallDuration(call.duration_seconds),
                year: call.year,
                month: call.month,
                day: call.day,
            })
            .collect()
    }

    /// Invoice for one month
    ///
    /// Fails with `IllegalMonth` if the group carries a month outside 1..=12.
    pub fn monthly_bill(subscriber: &Subscriber, group: &MonthlyGroup<'_>) -> BillingResult<MonthlyBill> {
        MonthlyBill::new(
            subscriber.number(),
            group.year,
            group.month,
            group.call_count(),
            group.total_duration(),
            group.total_price(),
        )
    }

    /// Emit every subscriber's reports to `sink`, in preorder
    ///
    /// The first error from the sink or the formatter stops the pass.
    pub fn run<S>(&self, sink: &mut S) -> BillingResult<ReportSummary>
    where
        S: ReportSink + ?Sized,
    {
        let mut summary = ReportSummary::default();
        let mut outcome = Ok(());

        self.subscribers.traverse_preorder(|subscriber| {
            if outcome.is_ok() {
                outcome = Self::project_subscriber(subscriber, sink, &mut summary);
            }
        });
        outcome?;

        info!(
            subscribers = summary.subscribers,
            bills = summary.bills,
            cdr_lines = summary.cdr_lines,
            "Reports generated"
        );
        Ok(summary)
    }

    fn project_subscriber<S>(
        subscriber: &Subscriber,
        sink: &mut S,
        summary: &mut ReportSummary,
    ) -> BillingResult<()>
    where
        S: ReportSink + ?Sized,
    {
        debug!(
            subscriber = subscriber.number(),
            calls = subscriber.total_call_number(),
            "Projecting subscriber"
        );

        // Every month is resolved before the first write for this subscriber
        let mut reports = Vec::new();
        for group in subscriber.ledger().monthly_groups() {
            let bill = Self::monthly_bill(subscriber, &group)?;
            reports.push((Self::cdr_lines(subscriber, &group), bill));
        }

        for (lines, bill) in reports {
            sink.write_cdr(subscriber.number(), bill.year, bill.month_number(), &lines)?;
            summary.cdr_lines += lines.len();

            sink.write_bill(&bill)?;
            summary.bills += 1;
        }

        summary.subscribers += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use callbill_core::models::{CallRecord, CallTotals, Caller, RateEntry};
    use callbill_core::traits::RatingService;
    use callbill_core::BillingError;

    struct PennyPerSecond;

    impl RatingService for PennyPerSecond {
        fn find_rate(&self, _destination: &str) -> Option<RateEntry> {
            Some(RateEntry::new("1", 0.01))
        }
    }

    #[derive(Default)]
    struct Collector {
        cdr: Vec<(String, i32, u32, Vec<CdrLine>)>,
        bills: Vec<MonthlyBill>,
    }

    impl ReportSink for Collector {
        fn write_cdr(&mut self, subscriber: &str, year: i32, month: u32, lines: &[CdrLine]) -> BillingResult<()> {
            self.cdr.push((subscriber.to_string(), year, month, lines.to_vec()));
            Ok(())
        }

        fn write_bill(&mut self, bill: &MonthlyBill) -> BillingResult<()> {
            self.bills.push(bill.clone());
            Ok(())
        }
    }

    fn index(calls: &[(&str, u64, i32, u32, u32)]) -> SubscriberIndex {
        let mut index = SubscriberIndex::new();
        let mut totals = CallTotals::new();
        for (caller, duration, year, month, day) in calls {
            let record = CallRecord {
                caller: Caller::Subscriber(caller.to_string()),
                callee: "15550009999".to_string(),
                duration_seconds: *duration,
                year: *year,
                month: *month,
                day: *day,
            };
            index.record_call(&record, &PennyPerSecond, &mut totals);
        }
        index
    }

    #[test]
    fn test_single_call_projection() {
        let index = index(&[("5550001234", 120, 2021, 6, 15)]);
        let mut sink = Collector::default();

        let summary = ReportProjection::new(&index).run(&mut sink).unwrap();

        assert_eq!(summary, ReportSummary { subscribers: 1, bills: 1, cdr_lines: 1 });
        let (number, year, month, lines) = &sink.cdr[0];
        assert_eq!((number.as_str(), *year, *month), ("5550001234", 2021, 6));
        assert_eq!(lines[0].to_string(), "5550001234, 15550009***, 0:02:00, 2021-6-15");

        let bill = &sink.bills[0];
        assert_eq!(bill.month_name(), "June");
        assert_eq!(bill.calls, 1);
        assert_eq!(bill.duration.to_string(), "0:02:00");
        assert!((bill.total_price - 1.20).abs() < 1e-9);
    }

    #[test]
    fn test_one_bill_per_month() {
        let index = index(&[
            ("1", 60, 2021, 3, 1),
            ("1", 60, 2021, 1, 1),
            ("1", 30, 2021, 3, 2),
            ("1", 3600, 2020, 12, 31),
        ]);
        let mut sink = Collector::default();
        ReportProjection::new(&index).run(&mut sink).unwrap();

        let months: Vec<(i32, u32, u64)> = sink
            .bills
            .iter()
            .map(|b| (b.year, b.month_number(), b.calls))
            .collect();
        assert_eq!(months, vec![(2020, 12, 1), (2021, 1, 1), (2021, 3, 2)]);
        assert_eq!(sink.bills[0].duration.to_string(), "1:00:00");
        assert_eq!(sink.cdr[2].3.len(), 2);
    }

    #[test]
    fn test_preorder_subscriber_order() {
        let index = index(&[
            ("2", 1, 2021, 1, 1),
            ("1", 1, 2021, 1, 1),
            ("3", 1, 2021, 1, 1),
        ]);
        let mut sink = Collector::default();
        ReportProjection::new(&index).run(&mut sink).unwrap();

        let order: Vec<&str> = sink.bills.iter().map(|b| b.subscriber.as_str()).collect();
        assert_eq!(order, vec!["2", "1", "3"]);
    }

    #[test]
    fn test_illegal_month_writes_nothing_for_subscriber() {
        let index = index(&[("1", 60, 2021, 5, 1), ("1", 60, 2021, 13, 1)]);
        let mut sink = Collector::default();

        let result = ReportProjection::new(&index).run(&mut sink);

        assert!(matches!(result, Err(BillingError::IllegalMonth(13))));
        assert!(sink.cdr.is_empty());
        assert!(sink.bills.is_empty());
    }

    #[test]
    fn test_sink_error_stops_pass() {
        struct Failing;
        impl ReportSink for Failing {
            fn write_cdr(&mut self, _: &str, _: i32, _: u32, _: &[CdrLine]) -> BillingResult<()> {
                Err(BillingError::Io(std::io::Error::other("read-only")))
            }
            fn write_bill(&mut self, _: &MonthlyBill) -> BillingResult<()> {
                Ok(())
            }
        }

        let index = index(&[("1", 1, 2021, 1, 1), ("2", 1, 2021, 1, 1)]);
        let result = ReportProjection::new(&index).run(&mut Failing);
        assert!(matches!(result, Err(BillingError::Io(_))));
    }
}
