//! Bill and CDR file writer
//!
//! One file per subscriber and month for each report kind:
//! `{number}-{month}-{year}-cdr.txt` and `{number}-{month}-{year}.txt`.
//! Existing files are overwritten.

use callbill_core::config::OutputConfig;
use callbill_core::models::{CdrLine, MonthlyBill};
use callbill_core::traits::ReportSink;
use callbill_core::BillingResult;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// [`ReportSink`] that writes plain-text reports into a directory
#[derive(Debug)]
pub struct FileReportWriter {
    directory: PathBuf,
    currency: String,
    write_cdr: bool,
    write_bills: bool,
    files_written: usize,
}

impl FileReportWriter {
    /// Create the writer, creating the target directory if needed
    pub fn new(directory: impl Into<PathBuf>, currency: impl Into<String>) -> BillingResult<Self> {
        let directory = directory.into();
        fs::create_dir_all(&directory)?;

        Ok(Self {
            directory,
            currency: currency.into(),
            write_cdr: true,
            write_bills: true,
            files_written: 0,
        })
    }

    pub fn from_config(config: &OutputConfig) -> BillingResult<Self> {
        let mut writer = Self::new(&config.directory, config.currency.as_str())?;
        writer.write_cdr = config.write_cdr;
        writer.write_bills = config.write_bills;
        Ok(writer)
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn files_written(&self) -> usize {
        self.files_written
    }

    pub fn cdr_path(&self, subscriber: &str, year: i32, month: u32) -> PathBuf {
        self.directory
            .join(format!("{subscriber}-{month}-{year}-cdr.txt"))
    }

    pub fn bill_path(&self, subscriber: &str, year: i32, month: u32) -> PathBuf {
        self.directory.join(format!("{subscriber}-{month}-{year}.txt"))
    }

    fn create(&mut self, path: &Path) -> BillingResult<BufWriter<File>> {
        let file = File::create(path).map_err(|e| {
            error!(path = %path.display(), error = %e, "Could not open report file");
            e
        })?;
        self.files_written += 1;
        Ok(BufWriter::new(file))
    }
}

impl ReportSink for FileReportWriter {
    fn write_cdr(&mut self, subscriber: &str, year: i32, month: u32, lines: &[CdrLine]) -> BillingResult<()> {
        if !self.write_cdr {
            return Ok(());
        }

        let path = self.cdr_path(subscriber, year, month);
        let mut out = self.create(&path)?;
        for line in lines {
            writeln!(out, "{line}")?;
        }
        out.flush()?;

        debug!(path = %path.display(), lines = lines.len(), "CDR export written");
        Ok(())
    }

    fn write_bill(&mut self, bill: &MonthlyBill) -> BillingResult<()> {
        if !self.write_bills {
            return Ok(());
        }

        let path = self.bill_path(&bill.subscriber, bill.year, bill.month_number());
        let mut out = self.create(&path)?;
        out.write_all(bill.render(&self.currency).as_bytes())?;
        out.flush()?;

        debug!(path = %path.display(), "Bill written");
        Ok(())
    }
}
