//! Rate table configuration.
//!
//! This module provides the tax-year-keyed rate tables the calculators read:
//! income tax bands for each regime, National Insurance thresholds and rates,
//! student loan plans and pension thresholds. Tables are authored as YAML.
//!
//! # Example
//!
//! ```
//! use paye_engine::config::RateTables;
//! use paye_engine::models::TaxRegime;
//!
//! let tables = RateTables::builtin().unwrap();
//! let rates = tables.get("2025-26".parse().unwrap()).unwrap();
//! println!("Basic rate: {}", rates.schedule(TaxRegime::Standard).bands[0].rate);
//! ```

mod loader;
mod types;

pub use loader::{load_rate_table, parse_rate_table};
pub use types::{
    AnnualThreshold, CategoryRates, FlatRates, IncomeTaxRegimes, IncomeTaxSchedule,
    NationalInsuranceRates, PensionThresholds, RateTables, StudentLoanRate, TaxBand,
    TaxYearRates,
};
