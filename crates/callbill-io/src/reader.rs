//! CSV readers
//!
//! Both readers are plain iterators over `BillingResult<SourceRow<_>>`. A row
//! that fails any check comes back as a recoverable `MalformedRow` carrying its
//! line number; I/O failures come back as fatal errors.
//!
//! Rate rows: `region_code,region_name,rate`
//! Call rows: `caller,callee,duration_seconds,YYYY-MM-DD[ HH:MM:SS]`

use callbill_core::models::{CallRecord, Caller, RateRecord, SourceRow};
use callbill_core::{AppConfig, BillingError, BillingResult};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind, Lines, Read};
use std::path::Path;
use tracing::debug;
use validator::Validate;

const MAX_PHONE_DIGITS: usize = 15;
const MAX_REGION_DIGITS: usize = 11;

/// Parsing knobs shared by both readers
#[derive(Debug, Clone)]
pub struct ReaderOptions {
    pub delimiter: u8,
    pub has_headers: bool,
    pub max_line_length: usize,
    pub anonymous_caller: String,
    pub min_year: i32,
    pub max_year: i32,
}

impl ReaderOptions {
    pub fn from_config(config: &AppConfig) -> BillingResult<Self> {
        let delimiter = u8::try_from(config.input.delimiter).map_err(|_| {
            BillingError::Config(format!(
                "delimiter {:?} is not a single-byte character",
                config.input.delimiter
            ))
        })?;
        let (min_year, max_year) = config.year_bounds();

        Ok(Self {
            delimiter,
            has_headers: config.input.has_headers,
            max_line_length: config.input.max_line_length,
            anonymous_caller: config.billing.anonymous_caller.clone(),
            min_year,
            max_year,
        })
    }
}

impl Default for ReaderOptions {
    fn default() -> Self {
        // Infallible for the default ',' delimiter
        Self::from_config(&AppConfig::default()).unwrap_or(Self {
            delimiter: b',',
            has_headers: false,
            max_line_length: 1024,
            anonymous_caller: "Anonymous".to_string(),
            min_year: 1876,
            max_year: i32::MAX,
        })
    }
}

/// Open an input file, rejecting anything without a `.csv` suffix
pub fn open_csv(path: impl AsRef<Path>) -> BillingResult<File> {
    let path = path.as_ref();
    if path.extension().map_or(true, |ext| ext != "csv") {
        return Err(BillingError::InvalidInputFile(format!(
            "{} does not end in .csv",
            path.display()
        )));
    }

    debug!(path = %path.display(), "Opening input file");
    File::open(path).map_err(BillingError::from)
}

/// Fixed-arity rows with non-empty fields
///
/// Lines are counted here rather than by the csv parser, which silently
/// skips blank lines. Each physical line is tokenized on its own.
struct FieldReader<R> {
    lines: Lines<BufReader<R>>,
    line: u64,
    record: StringRecord,
    arity: usize,
    delimiter: u8,
    skip_header: bool,
    max_line_length: usize,
}

impl<R: Read> FieldReader<R> {
    fn new(source: R, options: &ReaderOptions, arity: usize) -> Self {
        Self {
            lines: BufReader::new(source).lines(),
            line: 0,
            record: StringRecord::new(),
            arity,
            delimiter: options.delimiter,
            skip_header: options.has_headers,
            max_line_length: options.max_line_length,
        }
    }

    /// Read the next row and return its line, or `None` at end of input
    fn next_row(&mut self) -> Option<BillingResult<u64>> {
        let raw = self.lines.next()?;
        self.line += 1;
        let line = self.line;

        let text = match raw {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::InvalidData => {
                return Some(Err(BillingError::malformed(line, "Line is not valid UTF-8")));
            }
            Err(err) => return Some(Err(BillingError::Io(err))),
        };

        if self.skip_header {
            self.skip_header = false;
            return self.next_row();
        }

        Some(self.tokenize(line, &text))
    }

    fn tokenize(&mut self, line: u64, text: &str) -> BillingResult<u64> {
        if text.trim().is_empty() {
            return Err(BillingError::malformed(line, "Line is empty"));
        }

        if text.len() > self.max_line_length {
            return Err(BillingError::malformed(
                line,
                format!("Line longer than {} characters", self.max_line_length),
            ));
        }

        let mut parser = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(text.as_bytes());

        match parser.read_record(&mut self.record) {
            Ok(true) => {}
            Ok(false) => return Err(BillingError::malformed(line, "Line is empty")),
            Err(err) => return Err(BillingError::malformed(line, err.to_string())),
        }

        if self.record.len() > self.arity {
            return Err(BillingError::malformed(line, "Additional field found"));
        }

        for i in 0..self.arity {
            if self.record.get(i).map_or(true, str::is_empty) {
                return Err(BillingError::malformed(line, format!("Missing field {}", i + 1)));
            }
        }

        Ok(line)
    }

    fn field(&self, i: usize) -> &str {
        self.record.get(i).unwrap_or_default()
    }
}

/// Iterator over validated rate table rows
pub struct RateReader<R> {
    fields: FieldReader<R>,
}

impl<R: Read> RateReader<R> {
    pub fn new(source: R, options: &ReaderOptions) -> Self {
        Self {
            fields: FieldReader::new(source, options, 3),
        }
    }

    fn parse(&self, line: u64) -> BillingResult<RateRecord> {
        let region_code = normalize_region_code(self.fields.field(0))
            .ok_or_else(|| BillingError::malformed(line, "Invalid region code"))?;
        let rate = parse_rate(self.fields.field(2))
            .ok_or_else(|| BillingError::malformed(line, "Invalid rate"))?;

        let record = RateRecord {
            region_code: region_code.to_string(),
            region_name: self.fields.field(1).to_string(),
            rate,
        };
        record
            .validate()
            .map_err(|e| BillingError::malformed(line, e.to_string()))?;
        Ok(record)
    }
}

impl<R: Read> Iterator for RateReader<R> {
    type Item = BillingResult<SourceRow<RateRecord>>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.fields.next_row()?;
        Some(row.and_then(|line| self.parse(line).map(|record| SourceRow::new(line, record))))
    }
}

/// Iterator over validated call record rows
pub struct CallReader<R> {
    fields: FieldReader<R>,
    options: ReaderOptions,
}

impl<R: Read> CallReader<R> {
    pub fn new(source: R, options: &ReaderOptions) -> Self {
        Self {
            fields: FieldReader::new(source, options, 4),
            options: options.clone(),
        }
    }

    fn parse(&self, line: u64) -> BillingResult<CallRecord> {
        let raw_caller = self.fields.field(0);
        let caller = if raw_caller == self.options.anonymous_caller {
            Caller::Anonymous
        } else {
            normalize_phone_number(raw_caller)
                .map(|n| Caller::Subscriber(n.to_string()))
                .ok_or_else(|| BillingError::malformed(line, "Invalid caller number"))?
        };

        let callee = normalize_phone_number(self.fields.field(1))
            .ok_or_else(|| BillingError::malformed(line, "Invalid callee number"))?;

        let duration_seconds: u64 = self
            .fields
            .field(2)
            .parse()
            .map_err(|_| BillingError::malformed(line, "Invalid call duration"))?;

        let date = parse_date(self.fields.field(3))
            .ok_or_else(|| BillingError::malformed(line, "Invalid date"))?;

        let record = CallRecord {
            caller,
            callee: callee.to_string(),
            duration_seconds,
            year: date.year(),
            month: date.month(),
            day: date.day(),
        };

        if !record.year_within(self.options.min_year, self.options.max_year) {
            return Err(BillingError::malformed(line, "Invalid year/month"));
        }
        record
            .validate()
            .map_err(|e| BillingError::malformed(line, e.to_string()))?;
        Ok(record)
    }
}

impl<R: Read> Iterator for CallReader<R> {
    type Item = BillingResult<SourceRow<CallRecord>>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.fields.next_row()?;
        Some(row.and_then(|line| self.parse(line).map(|record| SourceRow::new(line, record))))
    }
}

/// Strip leading zeros; the rest must be 1 to 15 digits
pub fn normalize_phone_number(raw: &str) -> Option<&str> {
    let number = raw.trim_start_matches('0');
    is_digits(number, MAX_PHONE_DIGITS).then_some(number)
}

/// Strip leading zeros and plus signs; the rest must be 1 to 11 digits
pub fn normalize_region_code(raw: &str) -> Option<&str> {
    let code = raw.trim_start_matches(['0', '+']);
    is_digits(code, MAX_REGION_DIGITS).then_some(code)
}

fn is_digits(s: &str, max: usize) -> bool {
    (1..=max).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_digit())
}

/// Rates are plain decimals: digits and dots only
fn parse_rate(raw: &str) -> Option<f64> {
    if !raw.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
        return None;
    }
    raw.parse().ok()
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .map(|dt| dt.date())
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> ReaderOptions {
        ReaderOptions {
            max_year: 2030,
            ..ReaderOptions::default()
        }
    }

    fn rates(input: &str) -> Vec<BillingResult<SourceRow<RateRecord>>> {
        RateReader::new(input.as_bytes(), &options()).collect()
    }

    fn calls(input: &str) -> Vec<BillingResult<SourceRow<CallRecord>>> {
        CallReader::new(input.as_bytes(), &options()).collect()
    }

    fn reason(result: &BillingResult<impl std::fmt::Debug>) -> String {
        match result {
            Err(err) => err.to_string(),
            Ok(row) => panic!("expected rejection, got {row:?}"),
        }
    }

    #[test]
    fn test_phone_normalization() {
        assert_eq!(normalize_phone_number("004369912345"), Some("4369912345"));
        assert_eq!(normalize_phone_number("123456789012345"), Some("123456789012345"));
        assert_eq!(normalize_phone_number("1234567890123456"), None);
        assert_eq!(normalize_phone_number("000"), None);
        assert_eq!(normalize_phone_number("43-699"), None);
    }

    #[test]
    fn test_region_normalization() {
        assert_eq!(normalize_region_code("+43"), Some("43"));
        assert_eq!(normalize_region_code("0043"), Some("43"));
        assert_eq!(normalize_region_code("+"), None);
        assert_eq!(normalize_region_code("123456789012"), None);
    }

    #[test]
    fn test_rate_rows() {
        let rows = rates("43,Austria,0.05\n+1,USA,0.01\n");
        let first = rows[0].as_ref().unwrap();
        assert_eq!(first.line, 1);
        assert_eq!(first.record.region_code, "43");
        assert_eq!(first.record.region_name, "Austria");
        assert_eq!(first.record.rate, 0.05);
        assert_eq!(rows[1].as_ref().unwrap().record.region_code, "1");
    }

    #[test]
    fn test_rate_row_rejections() {
        let rows = rates("43,Austria\n44,UK,0.1,extra\n45,Denmark,-1\n46,Sweden,1.2.3\n47,,0.1\n");
        assert_eq!(rows.len(), 5);
        assert!(reason(&rows[0]).contains("Missing field 3"));
        assert!(reason(&rows[1]).contains("Additional field"));
        assert!(reason(&rows[2]).contains("Invalid rate"));
        assert!(reason(&rows[3]).contains("Invalid rate"));
        assert!(reason(&rows[4]).contains("Missing field 2"));
        assert!(rows.iter().all(|r| r.as_ref().unwrap_err().is_recoverable()));
        assert_eq!(rows[3].as_ref().unwrap_err().line(), Some(4));
    }

    #[test]
    fn test_overlong_line_rejected() {
        let long_name = "x".repeat(1100);
        let input = format!("43,{long_name},0.05\n44,UK,0.1\n");
        let rows = rates(&input);
        assert!(reason(&rows[0]).contains("longer than 1024"));
        assert!(rows[1].is_ok());
    }

    #[test]
    fn test_call_rows() {
        let rows = calls("05550001234,0015551234567,120,2021-06-15 10:30:00\nAnonymous,15551234567,30,2021-06-16\n");

        let first = &rows[0].as_ref().unwrap().record;
        assert_eq!(first.caller, Caller::Subscriber("5550001234".to_string()));
        assert_eq!(first.callee, "15551234567");
        assert_eq!(first.duration_seconds, 120);
        assert_eq!((first.year, first.month, first.day), (2021, 6, 15));

        let second = &rows[1].as_ref().unwrap().record;
        assert!(second.caller.is_anonymous());
        assert_eq!(rows[1].as_ref().unwrap().line, 2);
    }

    #[test]
    fn test_call_row_rejections() {
        let rows = calls(concat!(
            "1,2,10,1800-01-01\n",
            "1,2,10,2021-13-01\n",
            "1,2,ten,2021-01-01\n",
            "1a,2,10,2021-01-01\n",
            "1,2,10,2021-01-01,x\n",
            "1,2,10,2031-01-01\n",
        ));
        assert!(reason(&rows[0]).contains("Invalid year"));
        assert!(reason(&rows[1]).contains("Invalid date"));
        assert!(reason(&rows[2]).contains("Invalid call duration"));
        assert!(reason(&rows[3]).contains("Invalid caller"));
        assert!(reason(&rows[4]).contains("Additional field"));
        assert!(reason(&rows[5]).contains("Invalid year"));
    }

    #[test]
    fn test_custom_anonymous_sentinel() {
        let options = ReaderOptions {
            anonymous_caller: "withheld".to_string(),
            ..options()
        };
        let rows: Vec<_> = CallReader::new("withheld,1,5,2021-01-01\n".as_bytes(), &options).collect();
        assert!(rows[0].as_ref().unwrap().record.caller.is_anonymous());
    }

    #[test]
    fn test_blank_lines_are_reported() {
        let rows = calls("1,2,10,2021-01-01\n\n   \n1,2,11,2021-01-02\n");
        assert_eq!(rows.len(), 4);
        assert!(reason(&rows[1]).contains("Line 2: Line is empty"));
        assert!(reason(&rows[2]).contains("Line 3: Line is empty"));
        assert!(rows[1].as_ref().unwrap_err().is_recoverable());
        assert_eq!(rows[3].as_ref().unwrap().line, 4);
    }

    #[test]
    fn test_line_numbers_count_blank_lines() {
        let rows = calls("1,2,10,2021-01-01\n\n\n1,2,ten,2021-01-02\n");
        assert_eq!(rows[3].as_ref().unwrap_err().line(), Some(4));
        assert!(reason(&rows[3]).contains("Invalid call duration"));
    }

    #[test]
    fn test_crlf_line_endings() {
        let rows = rates("43,Austria,0.05\r\n44,UK,0.1\r\n");
        assert_eq!(rows[1].as_ref().unwrap().record.rate, 0.1);
        assert_eq!(rows[1].as_ref().unwrap().line, 2);
    }

    #[test]
    fn test_headers_skipped_when_configured() {
        let options = ReaderOptions {
            has_headers: true,
            ..options()
        };
        let rows: Vec<_> = RateReader::new("code,name,rate\n43,Austria,0.05\n".as_bytes(), &options).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].as_ref().unwrap().line, 2);
    }

    #[test]
    fn test_open_csv_rejects_other_extensions() {
        assert!(matches!(open_csv("rates.txt"), Err(BillingError::InvalidInputFile(_))));
        assert!(matches!(open_csv("rates"), Err(BillingError::InvalidInputFile(_))));
        assert!(matches!(open_csv("/nonexistent/rates.csv"), Err(BillingError::Io(_))));
    }
}
