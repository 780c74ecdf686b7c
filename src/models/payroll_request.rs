//! Unvalidated payroll requests.
//!
//! A [`PayrollRequest`] is what a caller hands over before validation: the
//! enumerations are still plain strings and the amounts are raw JSON values,
//! so a missing or non-numeric field is reported by validation rather than
//! rejected while deserializing. [`crate::calculation::validate_payroll_inputs`]
//! checks it, and [`PayrollRequest::into_period_input`] converts it into a
//! typed [`PeriodInput`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{CumulativeState, Money, PensionRates, PeriodInput};
use crate::calculation::{ValidationReport, validate_payroll_inputs};

/// Payroll input as received from a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollRequest {
    /// Basic gross pay in pence.
    #[serde(default)]
    pub gross_pay: Value,
    /// HMRC tax code.
    #[serde(default)]
    pub tax_code: String,
    /// `weekly`, `biweekly` (or `fortnightly`) or `monthly`.
    #[serde(default)]
    pub pay_frequency: String,
    /// NI category letter.
    #[serde(default)]
    pub ni_category: String,
    /// 1-based period number.
    #[serde(default)]
    pub period_number: Value,
    /// Year-to-date figures from the previous period.
    #[serde(default)]
    pub cumulative_state: CumulativeState,
    /// Whether the employee is in the pension scheme.
    #[serde(default)]
    pub pension_opt_in: bool,
    /// Pension contribution rates.
    #[serde(default)]
    pub pension_rates: PensionRates,
    /// Student loan plan names.
    #[serde(default)]
    pub student_loan_plans: Vec<String>,
    /// Bonus in pence.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub bonus: Value,
    /// Commission in pence.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub commission: Value,
    /// Other post-tax deductions in pence.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub other_deductions: Value,
    /// Tax year, `YYYY-YY`.
    #[serde(default)]
    pub tax_year: String,
}

impl PayrollRequest {
    /// Validates the request and converts it into a [`PeriodInput`].
    ///
    /// Returns the validation report when any field is invalid.
    ///
    /// # Example
    ///
    /// ```
    /// use paye_engine::models::{PayFrequency, PayrollRequest};
    ///
    /// let request: PayrollRequest = serde_json::from_str(r#"{
    ///     "gross_pay": 300000,
    ///     "tax_code": "1257L",
    ///     "pay_frequency": "monthly",
    ///     "ni_category": "A",
    ///     "period_number": 1,
    ///     "tax_year": "2025-26"
    /// }"#).unwrap();
    ///
    /// let input = request.into_period_input().unwrap();
    /// assert_eq!(input.pay_frequency, PayFrequency::Monthly);
    /// ```
    pub fn into_period_input(self) -> Result<PeriodInput, ValidationReport> {
        let report = validate_payroll_inputs(&self);
        if !report.is_valid {
            return Err(report);
        }

        // Validation has already proven every conversion succeeds.
        self.convert().ok_or(report)
    }

    fn convert(self) -> Option<PeriodInput> {
        Some(PeriodInput {
            gross_pay: Money::from_pence(self.gross_pay.as_i64()?),
            pay_frequency: self.pay_frequency.parse().ok()?,
            ni_category: self.ni_category.parse().ok()?,
            period_number: self
                .period_number
                .as_u64()
                .and_then(|period| u32::try_from(period).ok())?,
            cumulative_state: self.cumulative_state,
            pension_opt_in: self.pension_opt_in,
            pension_rates: self.pension_rates,
            student_loan_plans: self
                .student_loan_plans
                .iter()
                .map(|plan| plan.parse().ok())
                .collect::<Option<Vec<_>>>()?,
            bonus: optional_pence(&self.bonus)?,
            commission: optional_pence(&self.commission)?,
            other_deductions: optional_pence(&self.other_deductions)?,
            tax_year: self.tax_year.parse().ok()?,
            tax_code: self.tax_code,
        })
    }
}

/// An absent optional amount is zero.
fn optional_pence(value: &Value) -> Option<Money> {
    match value {
        Value::Null => Some(Money::ZERO),
        value => value.as_i64().map(Money::from_pence),
    }
}
