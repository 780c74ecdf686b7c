//! Employee (primary Class 1) National Insurance.
//!
//! This module calculates the employee's NI contribution for one period from
//! the category rates and thresholds in the tax year's rate table.

use crate::config::TaxYearRates;
use crate::error::{EngineError, EngineResult};
use crate::models::{AuditStep, EmployeeNiBreakdown, Money, NiCategory, PayFrequency};

/// The result of an employee NI calculation.
#[derive(Debug, Clone)]
pub struct EmployeeNiResult {
    /// The employee's contribution for the period.
    pub contribution: Money,
    /// How pay split across the thresholds.
    pub breakdown: EmployeeNiBreakdown,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Calculates employee Class 1 NI for one period.
///
/// Annual thresholds are converted to the period by dividing by the number
/// of periods per year and rounding to the penny. Pay up to the Primary
/// Threshold attracts nothing, pay up to the Upper Earnings Limit attracts
/// the category's main rate, and pay above it the reduced rate. Category `C`
/// always pays nothing.
///
/// # Errors
///
/// Returns [`EngineError::CalculationError`] if the rate table has no rates
/// for the category.
///
/// # Examples
///
/// ```
/// use paye_engine::calculation::calculate_employee_ni;
/// use paye_engine::config::RateTables;
/// use paye_engine::models::{Money, NiCategory, PayFrequency, TaxYear};
///
/// let tables = RateTables::builtin().unwrap();
/// let rates = tables.get(TaxYear::starting(2025)).unwrap();
///
/// let result = calculate_employee_ni(
///     Money::from_pounds(3_000),
///     PayFrequency::Monthly,
///     NiCategory::A,
///     rates,
///     1,
/// )
/// .unwrap();
/// assert_eq!(result.contribution, Money::from_pence(15_620));
/// ```
pub fn calculate_employee_ni(
    gross_pay: Money,
    frequency: PayFrequency,
    category: NiCategory,
    rates: &TaxYearRates,
    step_number: u32,
) -> EngineResult<EmployeeNiResult> {
    let ni = &rates.national_insurance;
    let category_rates =
        ni.employee_rates_for(category)
            .ok_or_else(|| EngineError::CalculationError {
                message: format!(
                    "No employee NI rates for category {} in {}",
                    category, rates.tax_year
                ),
            })?;

    let lower_earnings_limit = ni.lower_earnings_limit.per_period(frequency);
    let primary_threshold = ni.primary_threshold.per_period(frequency);
    let upper_earnings_limit = ni.upper_earnings_limit.per_period(frequency);

    let below_threshold = gross_pay.min(primary_threshold).clamp_non_negative();
    let main_band_top = gross_pay.min(upper_earnings_limit);
    let reduced_band_start = upper_earnings_limit.max(primary_threshold);
    let at_main_rate = (main_band_top - primary_threshold).clamp_non_negative();
    let at_reduced_rate = (gross_pay - reduced_band_start).clamp_non_negative();

    let (main_rate_contribution, reduced_rate_contribution) = if category == NiCategory::C {
        (Money::ZERO, Money::ZERO)
    } else {
        (
            at_main_rate.apply_rate(category_rates.main),
            at_reduced_rate.apply_rate(category_rates.reduced),
        )
    };
    let contribution = main_rate_contribution + reduced_rate_contribution;

    let breakdown = EmployeeNiBreakdown {
        below_threshold,
        at_main_rate,
        at_reduced_rate,
        main_rate_contribution,
        reduced_rate_contribution,
        reached_lower_earnings_limit: gross_pay >= lower_earnings_limit,
    };

    let reasoning = if category == NiCategory::C {
        format!("Category C - no employee NI on {}", gross_pay)
    } else {
        format!(
            "{} x {} + {} x {} = {}",
            at_main_rate,
            category_rates.main,
            at_reduced_rate,
            category_rates.reduced,
            contribution
        )
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "employee_ni".to_string(),
        rule_name: "Employee Class 1 NI".to_string(),
        reference: "Social Security Contributions and Benefits Act 1992, s.8".to_string(),
        input: serde_json::json!({
            "gross_pay": gross_pay,
            "pay_frequency": frequency,
            "ni_category": category,
            "primary_threshold": primary_threshold,
            "upper_earnings_limit": upper_earnings_limit,
        }),
        output: serde_json::to_value(breakdown).unwrap_or(serde_json::Value::Null),
        reasoning,
    };

    Ok(EmployeeNiResult {
        contribution,
        breakdown,
        audit_step,
    })
}
