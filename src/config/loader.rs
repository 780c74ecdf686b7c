//! Rate table loading.
//!
//! This module reads [`TaxYearRates`] from YAML, either from the tables
//! built into the crate or from a directory supplied by the caller.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{EngineError, EngineResult};

use super::types::{RateTables, TaxYearRates};

/// Rate tables compiled into the crate, by file name.
const BUILTIN_TABLES: [(&str, &str); 2] = [
    (
        "2024-25.yaml",
        include_str!("../../config/tax_years/2024-25.yaml"),
    ),
    (
        "2025-26.yaml",
        include_str!("../../config/tax_years/2025-26.yaml"),
    ),
];

impl RateTables {
    /// Returns the rate tables shipped with the crate (2024-25 and 2025-26).
    ///
    /// # Example
    ///
    /// ```
    /// use paye_engine::config::RateTables;
    /// use paye_engine::models::TaxYear;
    ///
    /// let tables = RateTables::builtin()?;
    /// let rates = tables.get("2025-26".parse()?)?;
    /// assert_eq!(rates.tax_year, TaxYear::starting(2025));
    /// # Ok::<(), paye_engine::error::EngineError>(())
    /// ```
    pub fn builtin() -> EngineResult<Self> {
        let mut tables = RateTables::new();
        for (name, content) in BUILTIN_TABLES {
            let rates = parse_rate_table(&format!("builtin:{name}"), content)?;
            tables.insert(rates)?;
        }
        Ok(tables)
    }

    /// Loads every `*.yaml` rate table in a directory.
    ///
    /// # Directory Structure
    ///
    /// ```text
    /// config/tax_years/
    /// ├── 2024-25.yaml
    /// └── 2025-26.yaml
    /// ```
    ///
    /// Each file must be named after the tax year it describes.
    ///
    /// # Returns
    ///
    /// Returns the loaded tables, or an error if:
    /// - The directory does not exist or holds no rate tables
    /// - Any file contains invalid YAML or is missing a field
    /// - Any table is internally inconsistent or misnamed
    ///
    /// # Example
    ///
    /// ```no_run
    /// use paye_engine::config::RateTables;
    ///
    /// let tables = RateTables::load("./config/tax_years")?;
    /// # Ok::<(), paye_engine::error::EngineError>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();
        let dir_str = path.display().to_string();

        if !path.is_dir() {
            return Err(EngineError::ConfigNotFound { path: dir_str });
        }

        let entries = fs::read_dir(path).map_err(|_| EngineError::ConfigNotFound {
            path: dir_str.clone(),
        })?;

        let mut tables = RateTables::new();
        for entry in entries {
            let entry = entry.map_err(|_| EngineError::ConfigNotFound {
                path: dir_str.clone(),
            })?;

            let file_path = entry.path();
            if file_path.extension().is_some_and(|ext| ext == "yaml") {
                let rates = load_rate_table(&file_path)?;
                tables.insert(rates)?;
            }
        }

        if tables.is_empty() {
            return Err(EngineError::ConfigNotFound {
                path: format!("{} (no rate tables found)", dir_str),
            });
        }

        info!(path = %dir_str, tables = tables.len(), "Loaded rate tables");
        Ok(tables)
    }
}

/// Loads a single rate table file.
///
/// The file stem must match the table's `tax_year`.
pub fn load_rate_table(path: &Path) -> EngineResult<TaxYearRates> {
    let path_str = path.display().to_string();

    let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
        path: path_str.clone(),
    })?;

    let rates = parse_rate_table(&path_str, &content)?;

    let stem = path.file_stem().and_then(|s| s.to_str());
    if stem.is_some_and(|stem| stem != rates.tax_year.to_string()) {
        return Err(EngineError::InvalidRateTable {
            tax_year: rates.tax_year.to_string(),
            message: format!("file '{}' is named for a different tax year", path_str),
        });
    }

    Ok(rates)
}

/// Parses and validates a rate table from YAML text.
///
/// `source` names the origin of the text in error messages.
pub fn parse_rate_table(source: &str, content: &str) -> EngineResult<TaxYearRates> {
    let rates: TaxYearRates =
        serde_yaml::from_str(content).map_err(|e| EngineError::ConfigParseError {
            path: source.to_string(),
            message: e.to_string(),
        })?;

    rates.validate()?;
    debug!(source = %source, tax_year = %rates.tax_year, "Parsed rate table");
    Ok(rates)
}
