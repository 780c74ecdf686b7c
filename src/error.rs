//! Error types for the payroll engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for the fatal conditions that can occur while loading rate tables or
//! running a calculation. Ordinary input problems are not errors; they are
//! reported through [`crate::calculation::ValidationReport`].

use thiserror::Error;

/// The main error type for the payroll engine.
///
/// # Example
///
/// ```
/// use paye_engine::error::EngineError;
///
/// let error = EngineError::TaxYearNotFound {
///     tax_year: "2019-20".to_string(),
/// };
/// assert_eq!(error.to_string(), "No rate table configured for tax year 2019-20");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file or directory was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path (or built-in table name) that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// A rate table parsed but is internally inconsistent.
    #[error("Invalid rate table for tax year {tax_year}: {message}")]
    InvalidRateTable {
        /// The tax year of the offending table.
        tax_year: String,
        /// What is wrong with the table.
        message: String,
    },

    /// No rate table exists for the requested tax year.
    #[error("No rate table configured for tax year {tax_year}")]
    TaxYearNotFound {
        /// The tax year that was requested.
        tax_year: String,
    },

    /// A tax year string was not of the form `YYYY-YY`.
    #[error("Invalid tax year '{value}': expected the form YYYY-YY")]
    InvalidTaxYear {
        /// The rejected value.
        value: String,
    },

    /// Periods for one employee were supplied out of sequence.
    #[error("Pay period {found} supplied after period {previous}; periods must increase")]
    PeriodOutOfOrder {
        /// The period number processed last.
        previous: u32,
        /// The period number that broke the sequence.
        found: u32,
    },

    /// A general calculation error occurred.
    #[error("Calculation error: {message}")]
    CalculationError {
        /// A description of the calculation error.
        message: String,
    },
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
