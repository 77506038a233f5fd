//! CallBill I/O
//!
//! CSV readers that turn rate and call files into validated rows, and the
//! file writer that persists monthly bills and CDR exports.

pub mod reader;
pub mod writer;

pub use reader::{open_csv, CallReader, RateReader, ReaderOptions};
pub use writer::FileReportWriter;
