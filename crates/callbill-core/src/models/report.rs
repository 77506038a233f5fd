//! Report rows
//!
//! Plain data handed from the report projection to whatever writes bills and
//! CDR exports. Formatting lives here so every sink renders identically.

use crate::error::BillingError;
use crate::BillingResult;
use chrono::Month;
use serde::Serialize;
use std::fmt;

/// A call duration rendered as `H:MM:SS`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize)]
pub struct CallDuration(pub u64);

impl CallDuration {
    #[inline]
    pub fn hours(self) -> u64 {
        self.0 / 3600
    }

    #[inline]
    pub fn minutes(self) -> u64 {
        (self.0 - 3600 * self.hours()) / 60
    }

    #[inline]
    pub fn seconds(self) -> u64 {
        self.0 % 60
    }
}

impl fmt::Display for CallDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{:02}:{:02}",
            self.hours(),
            self.minutes(),
            self.seconds()
        )
    }
}

/// Replace the final three characters of a number with `*`
///
/// Numbers shorter than three characters are masked entirely.
pub fn censor_number(number: &str) -> String {
    let len = number.chars().count();
    let keep = len.saturating_sub(3);
    number
        .chars()
        .enumerate()
        .map(|(i, c)| if i < keep { c } else { '*' })
        .collect()
}

/// One line of a monthly CDR export
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CdrLine {
    pub caller: String,
    /// Callee with the final three digits masked
    pub callee: String,
    pub duration: CallDuration,
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl fmt::Display for CdrLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}, {}, {}-{}-{}",
            self.caller, self.callee, self.duration, self.year, self.month, self.day
        )
    }
}

/// Aggregate invoice for one subscriber and one month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyBill {
    pub subscriber: String,
    pub year: i32,
    #[serde(serialize_with = "serialize_month")]
    pub month: Month,
    pub calls: u64,
    pub duration: CallDuration,
    pub total_price: f64,
}

fn serialize_month<S: serde::Serializer>(month: &Month, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(month.name())
}

impl MonthlyBill {
    /// Build a bill, resolving the numeric month
    ///
    /// A month outside 1..=12 can only come from a defect upstream, so it is
    /// reported as the fatal [`BillingError::IllegalMonth`].
    pub fn new(
        subscriber: impl Into<String>,
        year: i32,
        month: u32,
        calls: u64,
        duration_seconds: u64,
        total_price: f64,
    ) -> BillingResult<Self> {
        Ok(Self {
            subscriber: subscriber.into(),
            year,
            month: month_from_number(month)?,
            calls,
            duration: CallDuration(duration_seconds),
            total_price,
        })
    }

    /// Human-readable month name (e.g., "January")
    pub fn month_name(&self) -> &'static str {
        self.month.name()
    }

    /// Numeric month, 1 = January
    pub fn month_number(&self) -> u32 {
        self.month.number_from_month()
    }

    /// Render the invoice text
    pub fn render(&self, currency: &str) -> String {
        format!(
            "Invoice for {} for Subscriber {}\nCalls: {}\nDuration: {}\nPrice: {:.2} {}",
            self.month_name(),
            self.subscriber,
            self.calls,
            self.duration,
            self.total_price,
            currency
        )
    }
}

/// Resolve a 1-based month number
pub fn month_from_number(month: u32) -> BillingResult<Month> {
    u8::try_from(month)
        .ok()
        .filter(|m| (1..=12).contains(m))
        .and_then(|m| Month::try_from(m).ok())
        .ok_or(BillingError::IllegalMonth(month))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_format() {
        assert_eq!(CallDuration(120).to_string(), "0:02:00");
        assert_eq!(CallDuration(3723).to_string(), "1:02:03");
        assert_eq!(CallDuration(0).to_string(), "0:00:00");
        assert_eq!(CallDuration(36_000 + 59).to_string(), "10:00:59");
    }

    #[test]
    fn test_censor_number() {
        assert_eq!(censor_number("15550009999"), "15550009***");
        assert_eq!(censor_number("123"), "***");
        assert_eq!(censor_number("12"), "**");
    }

    #[test]
    fn test_cdr_line_display() {
        let line = CdrLine {
            caller: "5550001234".to_string(),
            callee: censor_number("15550009999"),
            duration: CallDuration(65),
            year: 2021,
            month: 6,
            day: 15,
        };
        assert_eq!(
            line.to_string(),
            "5550001234, 15550009***, 0:01:05, 2021-6-15"
        );
    }

    #[test]
    fn test_month_names() {
        assert_eq!(month_from_number(1).unwrap().name(), "January");
        assert_eq!(month_from_number(12).unwrap().name(), "December");
    }

    #[test]
    fn test_illegal_month_is_fatal() {
        let err = MonthlyBill::new("1", 2021, 13, 1, 1, 0.0).unwrap_err();
        assert!(matches!(err, BillingError::IllegalMonth(13)));
        assert!(!err.is_recoverable());
        assert!(month_from_number(0).is_err());
    }

    #[test]
    fn test_render_bill() {
        let bill = MonthlyBill::new("5550001234", 2021, 6, 1, 120, 1.2).unwrap();
        assert_eq!(
            bill.render("€"),
            "Invoice for June for Subscriber 5550001234\nCalls: 1\nDuration: 0:02:00\nPrice: 1.20 €"
        );
        assert_eq!(bill.month_number(), 6);
    }
}
