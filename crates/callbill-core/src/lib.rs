//! CallBill Core Library
//!
//! This crate provides the foundational types, traits, and error handling
//! for the CallBill system. It includes:
//!
//! - Domain models (RateRecord, CallRecord, CallEvent, CallTotals, report rows)
//! - Common traits for rating and report output
//! - Unified error handling with recoverable/fatal classification
//! - Application configuration

pub mod config;
pub mod error;
pub mod models;
pub mod traits;

pub use config::AppConfig;
pub use error::BillingError;

/// Result type alias using BillingError
pub type BillingResult<T> = Result<T, BillingError>;
