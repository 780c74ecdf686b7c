//! Batch payroll runs.
//!
//! [`run_batch`] calculates many employees in parallel using [`rayon`]. Each
//! employee gets its own [`BatchOutcome`], so one invalid request or failed
//! calculation never stops the rest of the run. [`run_periods`] folds the
//! periods of a single employee in order, threading the year-to-date state
//! from one period into the next.

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::calculation::calculate_payroll;
use crate::config::RateTables;
use crate::error::{EngineError, EngineResult};
use crate::models::{PayrollRequest, PayrollResult, PeriodInput};

/// One employee's request in a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchItem {
    /// The caller's identifier for the employee.
    pub employee_id: String,
    /// The employee's payroll request.
    pub request: PayrollRequest,
}

/// What happened to one employee in a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchOutcome {
    /// The calculation succeeded.
    Calculated {
        /// The payroll result.
        result: Box<PayrollResult>,
    },
    /// The request failed validation.
    Invalid {
        /// Error messages keyed by field name.
        errors: BTreeMap<String, String>,
    },
    /// The request was valid but the calculation failed.
    Failed {
        /// The error message.
        message: String,
    },
}

impl BatchOutcome {
    /// Returns the result if the calculation succeeded.
    pub fn result(&self) -> Option<&PayrollResult> {
        match self {
            BatchOutcome::Calculated { result } => Some(result.as_ref()),
            BatchOutcome::Invalid { .. } | BatchOutcome::Failed { .. } => None,
        }
    }
}

/// One employee's entry in a batch result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchEntry {
    /// The caller's identifier for the employee.
    pub employee_id: String,
    /// What happened.
    pub outcome: BatchOutcome,
}

/// The result of a batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRunResult {
    /// Unique identifier for this run.
    pub run_id: Uuid,
    /// Version of the engine that produced the run.
    pub engine_version: String,
    /// One entry per item, in input order.
    pub entries: Vec<BatchEntry>,
}

impl BatchRunResult {
    /// Number of employees calculated successfully.
    pub fn calculated_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.outcome.result().is_some())
            .count()
    }
}

/// Runs payroll for many employees in parallel.
///
/// Each request is validated and calculated independently. Entries come back
/// in the same order as `items`.
///
/// # Examples
///
/// ```
/// use paye_engine::batch::{BatchItem, run_batch};
/// use paye_engine::config::RateTables;
/// use paye_engine::models::PayrollRequest;
///
/// let tables = RateTables::builtin().unwrap();
/// let request: PayrollRequest = serde_json::from_str(r#"{
///     "gross_pay": 300000,
///     "tax_code": "1257L",
///     "pay_frequency": "monthly",
///     "ni_category": "A",
///     "period_number": 1,
///     "tax_year": "2025-26"
/// }"#).unwrap();
///
/// let run = run_batch(
///     vec![BatchItem { employee_id: "emp_001".to_string(), request }],
///     &tables,
/// );
/// assert_eq!(run.calculated_count(), 1);
/// ```
pub fn run_batch(items: Vec<BatchItem>, tables: &RateTables) -> BatchRunResult {
    let run_id = Uuid::new_v4();
    info!(run_id = %run_id, employees = items.len(), "Starting batch payroll run");

    let entries: Vec<BatchEntry> = items
        .into_par_iter()
        .map(|item| {
            let outcome = calculate_item(&item.employee_id, item.request, tables, run_id);
            BatchEntry {
                employee_id: item.employee_id,
                outcome,
            }
        })
        .collect();

    let result = BatchRunResult {
        run_id,
        engine_version: env!("CARGO_PKG_VERSION").to_string(),
        entries,
    };

    info!(
        run_id = %run_id,
        calculated = result.calculated_count(),
        total = result.entries.len(),
        "Batch payroll run completed"
    );
    result
}

fn calculate_item(
    employee_id: &str,
    request: PayrollRequest,
    tables: &RateTables,
    run_id: Uuid,
) -> BatchOutcome {
    let input = match request.into_period_input() {
        Ok(input) => input,
        Err(report) => {
            warn!(
                run_id = %run_id,
                employee_id = %employee_id,
                fields = report.errors.len(),
                "Payroll request failed validation"
            );
            return BatchOutcome::Invalid {
                errors: report.errors,
            };
        }
    };

    match calculate_payroll(&input, tables) {
        Ok(result) => BatchOutcome::Calculated {
            result: Box::new(result),
        },
        Err(err) => {
            warn!(
                run_id = %run_id,
                employee_id = %employee_id,
                error = %err,
                "Payroll calculation failed"
            );
            BatchOutcome::Failed {
                message: err.to_string(),
            }
        }
    }
}

/// Runs consecutive periods for one employee.
///
/// The first input's cumulative state is the starting point; every later
/// input's state is replaced by the state produced by the period before it.
/// Period numbers must strictly increase and every input must be for the
/// same tax year.
///
/// # Errors
///
/// Returns [`EngineError::PeriodOutOfOrder`] if a period number does not
/// increase, [`EngineError::CalculationError`] if the tax year changes, or
/// the first error from any period's calculation.
///
/// # Examples
///
/// ```
/// use paye_engine::batch::run_periods;
/// use paye_engine::config::RateTables;
/// use paye_engine::models::{
///     CumulativeState, Money, NiCategory, PayFrequency, PensionRates, PeriodInput, TaxYear,
/// };
///
/// let tables = RateTables::builtin().unwrap();
/// let month = |period_number| PeriodInput {
///     gross_pay: Money::from_pounds(3_000),
///     tax_code: "1257L".to_string(),
///     pay_frequency: PayFrequency::Monthly,
///     ni_category: NiCategory::A,
///     period_number,
///     cumulative_state: CumulativeState::default(),
///     pension_opt_in: false,
///     pension_rates: PensionRates::default(),
///     student_loan_plans: vec![],
///     bonus: Money::ZERO,
///     commission: Money::ZERO,
///     other_deductions: Money::ZERO,
///     tax_year: TaxYear::starting(2025),
/// };
///
/// let results = run_periods(&[month(1), month(2), month(3)], &tables).unwrap();
/// let last = results.last().unwrap();
/// assert_eq!(last.new_cumulative_state.taxable_pay_to_date, Money::from_pounds(9_000));
/// ```
pub fn run_periods(
    inputs: &[PeriodInput],
    tables: &RateTables,
) -> EngineResult<Vec<PayrollResult>> {
    let mut results: Vec<PayrollResult> = Vec::with_capacity(inputs.len());

    for input in inputs {
        let period_input = match results.last() {
            None => input.clone(),
            Some(previous) => {
                let previous_input = &inputs[results.len() - 1];
                if input.period_number <= previous_input.period_number {
                    return Err(EngineError::PeriodOutOfOrder {
                        previous: previous_input.period_number,
                        found: input.period_number,
                    });
                }
                if input.tax_year != previous_input.tax_year {
                    return Err(EngineError::CalculationError {
                        message: format!(
                            "Period {} is in {} but earlier periods are in {}",
                            input.period_number, input.tax_year, previous_input.tax_year
                        ),
                    });
                }
                PeriodInput {
                    cumulative_state: previous.new_cumulative_state,
                    ..input.clone()
                }
            }
        };

        results.push(calculate_payroll(&period_input, tables)?);
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;
    use crate::models::{CumulativeState, Money, NiCategory, PayFrequency, PensionRates, TaxYear};

    fn request(gross_pay: i64) -> PayrollRequest {
        PayrollRequest {
            gross_pay: json!(gross_pay),
            tax_code: "1257L".to_string(),
            pay_frequency: "monthly".to_string(),
            ni_category: "A".to_string(),
            period_number: json!(1),
            cumulative_state: CumulativeState::default(),
            pension_opt_in: false,
            pension_rates: PensionRates::default(),
            student_loan_plans: vec![],
            bonus: Value::Null,
            commission: Value::Null,
            other_deductions: Value::Null,
            tax_year: "2025-26".to_string(),
        }
    }

    fn month(period_number: u32) -> PeriodInput {
        PeriodInput {
            gross_pay: Money::from_pounds(3_000),
            tax_code: "1257L".to_string(),
            pay_frequency: PayFrequency::Monthly,
            ni_category: NiCategory::A,
            period_number,
            cumulative_state: CumulativeState::default(),
            pension_opt_in: false,
            pension_rates: PensionRates::default(),
            student_loan_plans: vec![],
            bonus: Money::ZERO,
            commission: Money::ZERO,
            other_deductions: Money::ZERO,
            tax_year: TaxYear::starting(2025),
        }
    }

    #[test]
    fn test_batch_isolates_failures() {
        let tables = RateTables::builtin().unwrap();
        let mut invalid = request(300_000);
        invalid.ni_category = "Q".to_string();
        let mut missing_year = request(300_000);
        missing_year.tax_year = "2030-31".to_string();

        let items = vec![
            BatchItem {
                employee_id: "ok".to_string(),
                request: request(300_000),
            },
            BatchItem {
                employee_id: "invalid".to_string(),
                request: invalid,
            },
            BatchItem {
                employee_id: "missing_year".to_string(),
                request: missing_year,
            },
        ];

        let run = run_batch(items, &tables);
        assert_eq!(run.entries.len(), 3);
        assert_eq!(run.calculated_count(), 1);
        assert_eq!(run.engine_version, env!("CARGO_PKG_VERSION"));

        assert_eq!(run.entries[0].employee_id, "ok");
        assert_eq!(
            run.entries[0].outcome.result().unwrap().net_pay,
            Money::from_pence(245_330)
        );
        assert!(matches!(
            &run.entries[1].outcome,
            BatchOutcome::Invalid { errors } if errors.contains_key("ni_category")
        ));
        assert!(matches!(
            &run.entries[2].outcome,
            BatchOutcome::Failed { message } if message.contains("2030-31")
        ));
    }

    #[test]
    fn test_batch_from_json_isolates_malformed_requests() {
        let tables = RateTables::builtin().unwrap();
        let items: Vec<BatchItem> = serde_json::from_value(json!([
            {
                "employee_id": "ok",
                "request": {
                    "gross_pay": 300000,
                    "tax_code": "1257L",
                    "pay_frequency": "monthly",
                    "ni_category": "A",
                    "period_number": 1,
                    "tax_year": "2025-26"
                }
            },
            {
                "employee_id": "decimal_pay",
                "request": {
                    "gross_pay": "3000.00",
                    "tax_code": "1257L",
                    "pay_frequency": "monthly",
                    "ni_category": "A",
                    "period_number": 1,
                    "tax_year": "2025-26"
                }
            },
            {
                "employee_id": "no_frequency",
                "request": {
                    "gross_pay": 300000,
                    "tax_code": "1257L",
                    "ni_category": "A",
                    "period_number": 1,
                    "tax_year": "2025-26"
                }
            }
        ]))
        .unwrap();

        let run = run_batch(items, &tables);
        assert_eq!(run.entries.len(), 3);
        assert_eq!(run.calculated_count(), 1);
        assert!(matches!(
            &run.entries[1].outcome,
            BatchOutcome::Invalid { errors }
                if errors["gross_pay"] == "gross_pay must be a whole number of pence"
        ));
        assert!(matches!(
            &run.entries[2].outcome,
            BatchOutcome::Invalid { errors }
                if errors["pay_frequency"] == "pay_frequency is required"
        ));
    }

    #[test]
    fn test_batch_preserves_order() {
        let tables = RateTables::builtin().unwrap();
        let items: Vec<BatchItem> = (0..50)
            .map(|i| BatchItem {
                employee_id: format!("emp_{i:03}"),
                request: request(100_000 + i * 1_000),
            })
            .collect();

        let run = run_batch(items, &tables);
        for (i, entry) in run.entries.iter().enumerate() {
            assert_eq!(entry.employee_id, format!("emp_{i:03}"));
            assert_eq!(
                entry.outcome.result().unwrap().gross_pay,
                Money::from_pence(100_000 + i as i64 * 1_000)
            );
        }
    }

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let outcome = BatchOutcome::Failed {
            message: "boom".to_string(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["message"], "boom");
    }

    #[test]
    fn test_run_periods_threads_state() {
        let tables = RateTables::builtin().unwrap();
        let results = run_periods(&[month(1), month(2), month(3)], &tables).unwrap();
        assert_eq!(results.len(), 3);
        for result in &results {
            assert_eq!(result.income_tax, Money::from_pence(39_050));
        }
        assert_eq!(
            results[2].new_cumulative_state.tax_paid_to_date,
            Money::from_pence(117_150)
        );
    }

    #[test]
    fn test_run_periods_allows_gaps() {
        let tables = RateTables::builtin().unwrap();
        let results = run_periods(&[month(1), month(3)], &tables).unwrap();
        // Period 3 gets three months of allowance against six months' pay.
        assert_eq!(
            results[1].new_cumulative_state.taxable_pay_to_date,
            Money::from_pounds(6_000)
        );
    }

    #[test]
    fn test_run_periods_rejects_out_of_order() {
        let tables = RateTables::builtin().unwrap();
        let err = run_periods(&[month(2), month(2)], &tables).unwrap_err();
        assert!(matches!(
            err,
            EngineError::PeriodOutOfOrder {
                previous: 2,
                found: 2
            }
        ));
    }

    #[test]
    fn test_run_periods_rejects_year_change() {
        let tables = RateTables::builtin().unwrap();
        let mut next_year = month(2);
        next_year.tax_year = TaxYear::starting(2024);
        let err = run_periods(&[month(1), next_year], &tables).unwrap_err();
        assert!(matches!(err, EngineError::CalculationError { .. }));
    }

    #[test]
    fn test_run_periods_empty() {
        let tables = RateTables::builtin().unwrap();
        assert!(run_periods(&[], &tables).unwrap().is_empty());
    }
}
