//! Unified error handling for CallBill
//!
//! Every failure in the pipeline is expressed as a [`BillingError`]. Row-level
//! problems are recoverable: the row is dropped and ingestion continues.
//! Everything else signals a broken invariant or an unusable input and stops
//! the run.

use thiserror::Error;

/// Main application error type
#[derive(Error, Debug)]
pub enum BillingError {
    // ==================== Row Errors (recoverable) ====================
    #[error("Line {line}: {reason}")]
    MalformedRow { line: u64, reason: String },

    #[error("Region code already present in rate table: {0}")]
    DuplicateRegionCode(String),

    #[error("Validation error: {0}")]
    Validation(String),

    // ==================== Data Errors (fatal) ====================
    #[error("No usable data in {0}")]
    NoUsableData(&'static str),

    #[error("Illegal month value {0} reached the report formatter")]
    IllegalMonth(u32),

    // ==================== I/O Errors (fatal) ====================
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("Invalid input file: {0}")]
    InvalidInputFile(String),

    // ==================== Internal Errors ====================
    #[error("Configuration error: {0}")]
    Config(String),
}

impl BillingError {
    /// Shorthand for a malformed row diagnostic
    pub fn malformed(line: u64, reason: impl Into<String>) -> Self {
        BillingError::MalformedRow {
            line,
            reason: reason.into(),
        }
    }

    /// Source line of a row-level error, when known
    pub fn line(&self) -> Option<u64> {
        match self {
            BillingError::MalformedRow { line, .. } => Some(*line),
            _ => None,
        }
    }

    /// Whether ingestion may skip the offending row and carry on
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            BillingError::MalformedRow { .. }
                | BillingError::DuplicateRegionCode(_)
                | BillingError::Validation(_)
        )
    }

    /// Returns a stable error code for logs and summaries
    pub fn error_code(&self) -> &'static str {
        match self {
            BillingError::MalformedRow { .. } => "malformed_row",
            BillingError::DuplicateRegionCode(_) => "duplicate_region_code",
            BillingError::Validation(_) => "validation_error",
            BillingError::NoUsableData(_) => "no_usable_data",
            BillingError::IllegalMonth(_) => "illegal_month",
            BillingError::Io(_) => "io_error",
            BillingError::Csv(_) => "csv_error",
            BillingError::InvalidInputFile(_) => "invalid_input_file",
            BillingError::Config(_) => "config_error",
        }
    }
}

// ==================== From implementations ====================

impl From<csv::Error> for BillingError {
    fn from(err: csv::Error) -> Self {
        match err.position() {
            Some(pos) => BillingError::malformed(pos.line(), err.to_string()),
            None => BillingError::Csv(err.to_string()),
        }
    }
}

impl From<config::ConfigError> for BillingError {
    fn from(err: config::ConfigError) -> Self {
        BillingError::Config(err.to_string())
    }
}

impl From<validator::ValidationErrors> for BillingError {
    fn from(err: validator::ValidationErrors) -> Self {
        BillingError::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        assert!(BillingError::malformed(3, "missing field").is_recoverable());
        assert!(BillingError::DuplicateRegionCode("43".to_string()).is_recoverable());
        assert!(!BillingError::IllegalMonth(13).is_recoverable());
        assert!(!BillingError::NoUsableData("rate table").is_recoverable());
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            BillingError::DuplicateRegionCode("1".to_string()).error_code(),
            "duplicate_region_code"
        );
        assert_eq!(BillingError::IllegalMonth(0).error_code(), "illegal_month");
    }

    #[test]
    fn test_malformed_display_names_line() {
        let err = BillingError::malformed(42, "Additional field found");
        assert_eq!(err.to_string(), "Line 42: Additional field found");
    }
}
