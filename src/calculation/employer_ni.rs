//! Employer (secondary Class 1) National Insurance.

use crate::config::TaxYearRates;
use crate::models::{AuditStep, EmployerNiBreakdown, Money, NiCategory, PayFrequency};

/// The result of an employer NI calculation.
#[derive(Debug, Clone)]
pub struct EmployerNiResult {
    /// The employer's contribution for the period.
    pub contribution: Money,
    /// How pay split across the thresholds.
    pub breakdown: EmployerNiBreakdown,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Calculates employer Class 1 NI for one period.
///
/// Pay above the Secondary Threshold is charged at the employer rate with no
/// upper limit. For categories `H`, `M` and `Z` the pay between the Secondary
/// Threshold and the Upper Earnings Limit is relieved, so only pay above the
/// Upper Earnings Limit is charged.
///
/// # Examples
///
/// ```
/// use paye_engine::calculation::calculate_employer_ni;
/// use paye_engine::config::RateTables;
/// use paye_engine::models::{Money, NiCategory, PayFrequency, TaxYear};
///
/// let tables = RateTables::builtin().unwrap();
/// let rates = tables.get(TaxYear::starting(2025)).unwrap();
///
/// let standard = calculate_employer_ni(
///     Money::from_pounds(3_000),
///     PayFrequency::Monthly,
///     NiCategory::A,
///     rates,
///     1,
/// );
/// assert_eq!(standard.contribution, Money::from_pence(38_750));
///
/// let under_21 = calculate_employer_ni(
///     Money::from_pounds(3_000),
///     PayFrequency::Monthly,
///     NiCategory::M,
///     rates,
///     1,
/// );
/// assert_eq!(under_21.contribution, Money::ZERO);
/// ```
pub fn calculate_employer_ni(
    gross_pay: Money,
    frequency: PayFrequency,
    category: NiCategory,
    rates: &TaxYearRates,
    step_number: u32,
) -> EmployerNiResult {
    let ni = &rates.national_insurance;
    let secondary_threshold = ni.secondary_threshold.per_period(frequency);
    let upper_earnings_limit = ni.upper_earnings_limit.per_period(frequency);

    let below_threshold = gross_pay.min(secondary_threshold).clamp_non_negative();
    let (relieved, at_main_rate) = if category.has_employer_relief() {
        let relief_top = gross_pay.min(upper_earnings_limit);
        let main_rate_start = upper_earnings_limit.max(secondary_threshold);
        (
            (relief_top - secondary_threshold).clamp_non_negative(),
            (gross_pay - main_rate_start).clamp_non_negative(),
        )
    } else {
        (
            Money::ZERO,
            (gross_pay - secondary_threshold).clamp_non_negative(),
        )
    };
    let contribution = at_main_rate.apply_rate(ni.employer_rate);

    let breakdown = EmployerNiBreakdown {
        below_threshold,
        relieved,
        at_main_rate,
    };

    let reasoning = if category.has_employer_relief() {
        format!(
            "Category {} - {} relieved, {} x {} = {}",
            category, relieved, at_main_rate, ni.employer_rate, contribution
        )
    } else {
        format!("{} x {} = {}", at_main_rate, ni.employer_rate, contribution)
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "employer_ni".to_string(),
        rule_name: "Employer Class 1 NI".to_string(),
        reference: "Social Security Contributions and Benefits Act 1992, s.9".to_string(),
        input: serde_json::json!({
            "gross_pay": gross_pay,
            "pay_frequency": frequency,
            "ni_category": category,
            "secondary_threshold": secondary_threshold,
            "upper_earnings_limit": upper_earnings_limit,
        }),
        output: serde_json::json!({
            "below_threshold": below_threshold,
            "relieved": relieved,
            "at_main_rate": at_main_rate,
            "contribution": contribution,
        }),
        reasoning,
    };

    EmployerNiResult {
        contribution,
        breakdown,
        audit_step,
    }
}
