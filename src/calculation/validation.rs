//! Input validation for payroll requests.
//!
//! Problems with a caller's input are reported, not raised: every invalid
//! field is collected into a [`ValidationReport`] keyed by field name so the
//! caller can show them all at once.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{NiCategory, PayFrequency, PayrollRequest, StudentLoanPlan, TaxYear};

/// Longest tax code accepted, after whitespace is removed.
const MAX_TAX_CODE_LEN: usize = 16;

/// Basis points in 100%.
const MAX_RATE_BPS: u32 = 10_000;

/// The outcome of validating a [`PayrollRequest`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// True when no errors were found.
    pub is_valid: bool,
    /// Error messages keyed by field name.
    pub errors: BTreeMap<String, String>,
}

impl ValidationReport {
    fn add(&mut self, field: &str, message: impl Into<String>) {
        // First problem per field wins.
        self.errors
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }
}

/// Checks a payroll request before calculation.
///
/// # Checks
///
/// - Gross pay, pay frequency, NI category, period number and tax year are
///   present
/// - Gross pay, bonus, commission and other deductions are whole numbers of
///   pence, and none of them nor the year-to-date figures are negative
/// - The tax code is present, at most 16 characters and uses only letters,
///   digits and `/`
/// - Pay frequency, NI category and every student loan plan are recognised
/// - At most one undergraduate student loan plan is given, with no repeats
/// - The tax year has the form `YYYY-YY`
/// - The period number lies between 1 and the last period of the frequency
///   (53 weekly, 27 fortnightly, 12 monthly)
/// - Pension rates are at most 10,000 basis points and any qualifying
///   earnings band is the right way round
///
/// # Examples
///
/// ```
/// use paye_engine::calculation::validate_payroll_inputs;
/// use paye_engine::models::PayrollRequest;
///
/// let request: PayrollRequest = serde_json::from_str(r#"{
///     "gross_pay": -100,
///     "tax_code": "",
///     "pay_frequency": "daily",
///     "ni_category": "A",
///     "period_number": 1,
///     "tax_year": "2025-26"
/// }"#).unwrap();
///
/// let report = validate_payroll_inputs(&request);
/// assert!(!report.is_valid);
/// assert_eq!(report.errors.len(), 3);
/// assert!(report.errors.contains_key("pay_frequency"));
/// ```
pub fn validate_payroll_inputs(request: &PayrollRequest) -> ValidationReport {
    let mut report = ValidationReport::default();

    if request.gross_pay.is_null() {
        report.add("gross_pay", "gross_pay is required");
    }
    for (field, value) in [
        ("gross_pay", &request.gross_pay),
        ("bonus", &request.bonus),
        ("commission", &request.commission),
        ("other_deductions", &request.other_deductions),
    ] {
        validate_amount(field, value, &mut report);
    }

    let state = &request.cumulative_state;
    if state.taxable_pay_to_date.is_negative() || state.tax_paid_to_date.is_negative() {
        report.add(
            "cumulative_state",
            "year-to-date figures must not be negative",
        );
    }

    validate_tax_code(&request.tax_code, &mut report);

    for (field, value) in [
        ("pay_frequency", &request.pay_frequency),
        ("ni_category", &request.ni_category),
        ("tax_year", &request.tax_year),
    ] {
        if value.trim().is_empty() {
            report.add(field, format!("{field} is required"));
        }
    }

    let frequency = match request.pay_frequency.parse::<PayFrequency>() {
        Ok(frequency) => Some(frequency),
        Err(message) => {
            report.add("pay_frequency", message);
            None
        }
    };

    if let Err(message) = request.ni_category.parse::<NiCategory>() {
        report.add("ni_category", message);
    }

    validate_student_loan_plans(&request.student_loan_plans, &mut report);

    if let Err(error) = request.tax_year.parse::<TaxYear>() {
        report.add("tax_year", error.to_string());
    }

    match (&request.period_number, request.period_number.as_i64()) {
        (Value::Null, _) => report.add("period_number", "period_number is required"),
        (_, None) => report.add("period_number", "period_number must be a whole number"),
        (_, Some(period)) => {
            let last_period = frequency.map(PayFrequency::max_period_number);
            if period < 1 || last_period.is_some_and(|last| period > i64::from(last)) {
                let message = match (last_period, frequency) {
                    (Some(last), Some(frequency)) => {
                        format!("period_number must be between 1 and {last} for {frequency} pay")
                    }
                    _ => "period_number must be at least 1".to_string(),
                };
                report.add("period_number", message);
            }
        }
    }

    let pension = &request.pension_rates;
    if pension.employee_rate_bps > MAX_RATE_BPS {
        report.add(
            "pension_rates.employee_rate_bps",
            format!("employee rate must be at most {MAX_RATE_BPS} basis points"),
        );
    }
    if pension.employer_rate_bps > MAX_RATE_BPS {
        report.add(
            "pension_rates.employer_rate_bps",
            format!("employer rate must be at most {MAX_RATE_BPS} basis points"),
        );
    }
    if let Some(band) = pension.qualifying_earnings {
        if band.lower.is_negative() || band.lower > band.upper {
            report.add(
                "pension_rates.qualifying_earnings",
                "qualifying earnings band must satisfy 0 <= lower <= upper",
            );
        }
    }

    report.is_valid = report.errors.is_empty();
    report
}

/// Absent amounts are left to the required-field checks.
fn validate_amount(field: &str, value: &Value, report: &mut ValidationReport) {
    match value {
        Value::Null => {}
        value => match value.as_i64() {
            Some(pence) if pence < 0 => {
                report.add(field, format!("{field} must not be negative"));
            }
            Some(_) => {}
            None => report.add(field, format!("{field} must be a whole number of pence")),
        },
    }
}

fn validate_tax_code(raw: &str, report: &mut ValidationReport) {
    let code: String = raw.chars().filter(|c| !c.is_whitespace()).collect();

    if code.is_empty() {
        report.add("tax_code", "tax_code must not be blank");
    } else if code.chars().count() > MAX_TAX_CODE_LEN {
        report.add(
            "tax_code",
            format!("tax_code must be at most {MAX_TAX_CODE_LEN} characters"),
        );
    } else if let Some(bad) = code.chars().find(|c| !c.is_ascii_alphanumeric() && *c != '/') {
        report.add("tax_code", format!("tax_code contains invalid character '{bad}'"));
    }
}

fn validate_student_loan_plans(plans: &[String], report: &mut ValidationReport) {
    let mut parsed: Vec<StudentLoanPlan> = Vec::with_capacity(plans.len());
    for raw in plans {
        match raw.parse::<StudentLoanPlan>() {
            Ok(plan) if parsed.contains(&plan) => {
                report.add("student_loan_plans", format!("{plan} is listed more than once"));
            }
            Ok(plan) => parsed.push(plan),
            Err(message) => report.add("student_loan_plans", message),
        }
    }

    let undergraduate = parsed.iter().filter(|plan| !plan.is_postgraduate()).count();
    if undergraduate > 1 {
        report.add(
            "student_loan_plans",
            "at most one undergraduate plan may be repaid at a time",
        );
    }
}
