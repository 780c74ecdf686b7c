//! Relief-at-source pension contributions.
//!
//! Under relief at source the employee's contribution is taken from net pay
//! after tax. The scheme claims basic-rate relief from HMRC, so the amount
//! deducted from pay is the gross contribution less that relief.

use rust_decimal::Decimal;

use crate::models::{AuditStep, Money, PayFrequency, PensionContributions, PensionRates};

/// Returns the basic-rate relief the scheme reclaims on employee
/// contributions.
///
/// The rate is 20%.
pub fn relief_at_source_rate() -> Decimal {
    Decimal::new(20, 2)
}

/// The result of a pension calculation, including the audit step.
#[derive(Debug, Clone)]
pub struct PensionResult {
    /// Contribution detail.
    pub contributions: PensionContributions,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Calculates pension contributions for one period.
///
/// Nothing is contributed unless the employee has opted in with a non-zero
/// employee rate. When the rates carry a qualifying earnings band, the annual
/// limits are prorated to the period and contributions are due only on pay
/// between them; otherwise they are due on all pay. Rates are in basis
/// points.
///
/// # Arguments
///
/// * `gross_pay` - Total gross pay for the period
/// * `frequency` - How often the employee is paid
/// * `opted_in` - Whether the employee is a member of the scheme
/// * `pension_rates` - Contribution rates and optional qualifying band
/// * `step_number` - The step number for audit trail sequencing
///
/// # Examples
///
/// ```
/// use paye_engine::calculation::calculate_pension_contributions;
/// use paye_engine::models::{Money, PayFrequency, PensionRates};
///
/// let rates = PensionRates {
///     employee_rate_bps: 500,
///     employer_rate_bps: 300,
///     qualifying_earnings: None,
/// };
/// let result = calculate_pension_contributions(
///     Money::from_pounds(3_000),
///     PayFrequency::Monthly,
///     true,
///     &rates,
///     1,
/// );
/// let pension = result.contributions;
/// assert_eq!(pension.employee_gross_contribution, Money::from_pounds(150));
/// assert_eq!(pension.tax_relief, Money::from_pounds(30));
/// assert_eq!(pension.employee_net_contribution, Money::from_pounds(120));
/// assert_eq!(pension.employer_contribution, Money::from_pounds(90));
/// ```
pub fn calculate_pension_contributions(
    gross_pay: Money,
    frequency: PayFrequency,
    opted_in: bool,
    pension_rates: &PensionRates,
    step_number: u32,
) -> PensionResult {
    let input = serde_json::json!({
        "gross_pay": gross_pay,
        "opted_in": opted_in,
        "pension_rates": pension_rates,
    });

    if !opted_in || pension_rates.employee_rate_bps == 0 {
        let reasoning = if opted_in {
            "No contribution - employee rate is zero".to_string()
        } else {
            "No contribution - employee has not opted in".to_string()
        };
        return PensionResult {
            contributions: PensionContributions::default(),
            audit_step: audit_step(step_number, input, PensionContributions::default(), reasoning),
        };
    }

    let qualifying_earnings = match pension_rates.qualifying_earnings {
        Some(band) => {
            let periods_per_year = frequency.periods_per_year();
            let lower = band.lower.prorate(1, periods_per_year);
            let upper = band.upper.prorate(1, periods_per_year);
            (gross_pay.min(upper) - lower).clamp_non_negative()
        }
        None => gross_pay.clamp_non_negative(),
    };

    let employee_rate = bps_to_rate(pension_rates.employee_rate_bps);
    let employer_rate = bps_to_rate(pension_rates.employer_rate_bps);

    let employee_gross_contribution = qualifying_earnings.apply_rate(employee_rate);
    let tax_relief = employee_gross_contribution.apply_rate(relief_at_source_rate());
    let contributions = PensionContributions {
        qualifying_earnings,
        employee_gross_contribution,
        tax_relief,
        employee_net_contribution: employee_gross_contribution - tax_relief,
        employer_contribution: qualifying_earnings.apply_rate(employer_rate),
    };

    let reasoning = format!(
        "{} x {} = {} gross, less {} relief = {} deducted; employer {} x {} = {}",
        qualifying_earnings,
        employee_rate,
        employee_gross_contribution,
        tax_relief,
        contributions.employee_net_contribution,
        qualifying_earnings,
        employer_rate,
        contributions.employer_contribution
    );

    PensionResult {
        contributions,
        audit_step: audit_step(step_number, input, contributions, reasoning),
    }
}

fn bps_to_rate(bps: u32) -> Decimal {
    Decimal::new(i64::from(bps), 4)
}

fn audit_step(
    step_number: u32,
    input: serde_json::Value,
    contributions: PensionContributions,
    reasoning: String,
) -> AuditStep {
    AuditStep {
        step_number,
        rule_id: "pension".to_string(),
        rule_name: "Relief at Source Pension".to_string(),
        reference: "Finance Act 2004, s.192".to_string(),
        input,
        output: serde_json::to_value(contributions).unwrap_or(serde_json::Value::Null),
        reasoning,
    }
}
