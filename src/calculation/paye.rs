//! PAYE income tax calculation.
//!
//! This module computes the income tax due for one pay period from a parsed
//! tax code, the period's gross pay and the employee's year-to-date figures.
//! Codes are taxed either cumulatively (the default) or on a week 1/month 1
//! basis, as described on [`calculate_paye`].

use rust_decimal::Decimal;

use crate::config::{IncomeTaxSchedule, TaxYearRates};
use crate::models::{
    AccrualBasis, AuditStep, AuditWarning, BandTax, CumulativeState, Money, ParsedTaxCode,
    PayFrequency, SpecialCode, TaxCodeKind,
};

use super::bands::{cumulative_bands, period_bands, tax_on_bands};

/// The result of a PAYE calculation for one period.
#[derive(Debug, Clone)]
pub struct PayeResult {
    /// Tax to deduct this period. Never negative.
    pub tax: Money,
    /// Pay taxable this period after the period's share of the allowance.
    pub taxable_income: Money,
    /// Tax per band. Year-to-date figures when taxed cumulatively.
    pub bands: Vec<BandTax>,
    /// Year-to-date figures after this period.
    pub new_state: CumulativeState,
    /// The basis actually used, which may differ from the code's own basis
    /// in week 53 or fortnight 27.
    pub basis: AccrualBasis,
    /// The signed annual allowance applied after any taper.
    pub annual_allowance: Money,
    /// Conditions worth a second look.
    pub warnings: Vec<AuditWarning>,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Withdraws the personal allowance for high earners.
///
/// A positive `annual_allowance` is reduced by £1 for every £2 of
/// `annualised_income` above `taper_threshold`, but never below zero. Zero
/// and negative (K code) allowances are returned unchanged.
///
/// # Examples
///
/// ```
/// use paye_engine::calculation::tapered_personal_allowance;
/// use paye_engine::models::Money;
///
/// let allowance = Money::from_pounds(12_570);
/// let threshold = Money::from_pounds(100_000);
///
/// assert_eq!(
///     tapered_personal_allowance(allowance, Money::from_pounds(100_000), threshold),
///     allowance
/// );
/// assert_eq!(
///     tapered_personal_allowance(allowance, Money::from_pounds(110_000), threshold),
///     Money::from_pounds(7_570)
/// );
/// assert_eq!(
///     tapered_personal_allowance(allowance, Money::from_pounds(200_000), threshold),
///     Money::ZERO
/// );
/// ```
pub fn tapered_personal_allowance(
    annual_allowance: Money,
    annualised_income: Money,
    taper_threshold: Money,
) -> Money {
    if annual_allowance <= Money::ZERO {
        return annual_allowance;
    }
    let excess = (annualised_income - taper_threshold).clamp_non_negative();
    let reduction = Money::from_pence(excess.pence() / 2);
    (annual_allowance - reduction).clamp_non_negative()
}

/// Figures produced by one of the charging routes before the K code limit.
struct Assessment {
    tax: Money,
    taxable_income: Money,
    bands: Vec<BandTax>,
    annual_allowance: Money,
}

/// Calculates the income tax due for one pay period.
///
/// The code's kind is matched exhaustively:
///
/// - `NT`: no tax; all pay is reported as taxable income.
/// - `BR`, `D0`, `D1`: the regime's flat rate on the whole period's pay,
///   reported as a single band named after the code.
/// - `0T`: normal banding with no allowance.
/// - Allowance and K codes: normal banding with the code's allowance, which
///   is negative for K codes and tapered above the income threshold.
///
/// On the cumulative basis, tax is worked out on pay to date against the
/// allowance and bands to date (each annual figure scaled by
/// `period_number / periods_per_year` and rounded), and the tax already paid
/// is subtracted. Over-deductions are not refunded: the period's tax is
/// never negative. On the week 1/month 1 basis the period is taxed on its
/// own against one period's share of the allowance and band widths.
///
/// Periods beyond the frequency's periods per year (week 53, fortnight 27)
/// are always taxed on the week 1/month 1 basis. K code tax is capped at the
/// overriding limit share of the period's pay. The cumulative state is
/// carried forward whichever basis applies.
///
/// # Arguments
///
/// * `tax_code` - The parsed tax code
/// * `gross_pay` - Total taxable pay for the period
/// * `frequency` - How often the employee is paid
/// * `period_number` - The period within the tax year, starting at 1
/// * `state` - Year-to-date figures before this period
/// * `rates` - The tax year's rate table
/// * `step_number` - The step number for audit trail sequencing
///
/// # Examples
///
/// ```
/// use paye_engine::calculation::{calculate_paye, parse_tax_code};
/// use paye_engine::config::RateTables;
/// use paye_engine::models::{CumulativeState, Money, PayFrequency, TaxYear};
///
/// let tables = RateTables::builtin().unwrap();
/// let rates = tables.get(TaxYear::starting(2025)).unwrap();
/// let code = parse_tax_code("1257L", Some(rates));
///
/// let result = calculate_paye(
///     &code,
///     Money::from_pounds(3_000),
///     PayFrequency::Monthly,
///     1,
///     &CumulativeState::default(),
///     rates,
///     1,
/// );
/// assert_eq!(result.tax, Money::from_pence(39_050));
/// assert_eq!(result.taxable_income, Money::from_pence(195_250));
/// ```
pub fn calculate_paye(
    tax_code: &ParsedTaxCode,
    gross_pay: Money,
    frequency: PayFrequency,
    period_number: u32,
    state: &CumulativeState,
    rates: &TaxYearRates,
    step_number: u32,
) -> PayeResult {
    let periods_per_year = frequency.periods_per_year();
    let period_number = period_number.max(1);
    let schedule = rates.schedule(tax_code.regime);
    let mut warnings = Vec::new();

    let basis = if tax_code.is_cumulative() && period_number > periods_per_year {
        warnings.push(AuditWarning::new(
            "EXTRA_PERIOD_NON_CUMULATIVE",
            format!(
                "Period {} of a {} payroll is taxed on a week 1/month 1 basis",
                period_number, frequency
            ),
            "low",
        ));
        AccrualBasis::Week1Month1
    } else {
        tax_code.basis
    };

    let charge = BandedCharge {
        schedule,
        gross_pay,
        basis,
        period_number,
        periods_per_year,
        state,
        taper_threshold: rates.allowance_taper_threshold.annual(),
    };

    let mut assessment = match tax_code.kind {
        TaxCodeKind::Special(SpecialCode::NoTax) => Assessment {
            tax: Money::ZERO,
            taxable_income: gross_pay,
            bands: Vec::new(),
            annual_allowance: Money::ZERO,
        },
        TaxCodeKind::Special(SpecialCode::ZeroAllowance) => charge.assess(Money::ZERO),
        TaxCodeKind::Special(special) => flat_rate_charge(
            special,
            schedule.flat_rates.rate_for(special).unwrap_or_default(),
            gross_pay,
        ),
        TaxCodeKind::Allowance(allowance) => {
            let assessment = charge.assess(allowance);
            if assessment.annual_allowance < allowance {
                warnings.push(AuditWarning::new(
                    "ALLOWANCE_TAPERED",
                    format!(
                        "Allowance of {} reduced to {} for income above {}",
                        allowance,
                        assessment.annual_allowance,
                        rates.allowance_taper_threshold.annual()
                    ),
                    "low",
                ));
            }
            assessment
        }
        TaxCodeKind::KCode(addition) => charge.assess(-addition),
    };

    if tax_code.is_k_code() {
        let limit = gross_pay.apply_rate(rates.k_code_overriding_limit);
        if assessment.tax > limit {
            warnings.push(AuditWarning::new(
                "K_CODE_LIMIT_APPLIED",
                format!(
                    "K code tax of {} capped at {} ({} of pay)",
                    assessment.tax, limit, rates.k_code_overriding_limit
                ),
                "medium",
            ));
            assessment.tax = limit;
        }
    }

    let new_state = CumulativeState {
        taxable_pay_to_date: state.taxable_pay_to_date + gross_pay,
        tax_paid_to_date: state.tax_paid_to_date + assessment.tax,
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "paye".to_string(),
        rule_name: "PAYE Income Tax".to_string(),
        reference: "Income Tax (PAYE) Regulations 2003, reg. 21".to_string(),
        input: serde_json::json!({
            "tax_code": tax_code.code,
            "gross_pay": gross_pay,
            "pay_frequency": frequency,
            "period_number": period_number,
            "taxable_pay_to_date": state.taxable_pay_to_date,
            "tax_paid_to_date": state.tax_paid_to_date,
        }),
        output: serde_json::json!({
            "basis": basis,
            "annual_allowance": assessment.annual_allowance,
            "taxable_income": assessment.taxable_income,
            "tax": assessment.tax,
            "bands": assessment.bands,
        }),
        reasoning: describe(tax_code, basis, &assessment),
    };

    PayeResult {
        tax: assessment.tax,
        taxable_income: assessment.taxable_income,
        bands: assessment.bands,
        new_state,
        basis,
        annual_allowance: assessment.annual_allowance,
        warnings,
        audit_step,
    }
}

fn flat_rate_charge(special: SpecialCode, rate: Decimal, gross_pay: Money) -> Assessment {
    let tax = gross_pay.apply_rate(rate);
    let bands = if gross_pay.is_zero() {
        Vec::new()
    } else {
        vec![BandTax {
            band: special.as_str().to_string(),
            taxable_amount: gross_pay,
            rate,
            tax,
        }]
    };
    Assessment {
        tax,
        taxable_income: gross_pay,
        bands,
        annual_allowance: Money::ZERO,
    }
}

/// Inputs shared by the banded charging routes.
struct BandedCharge<'a> {
    schedule: &'a IncomeTaxSchedule,
    gross_pay: Money,
    basis: AccrualBasis,
    period_number: u32,
    periods_per_year: u32,
    state: &'a CumulativeState,
    taper_threshold: Money,
}

impl BandedCharge<'_> {
    fn assess(&self, annual_allowance: Money) -> Assessment {
        match self.basis {
            AccrualBasis::Cumulative => self.cumulative(annual_allowance),
            AccrualBasis::Week1Month1 => self.non_cumulative(annual_allowance),
        }
    }

    fn cumulative(&self, annual_allowance: Money) -> Assessment {
        let n = self.period_number;
        let ppy = self.periods_per_year;

        let pay_to_date = self.state.taxable_pay_to_date + self.gross_pay;
        let allowance = tapered_personal_allowance(
            annual_allowance,
            pay_to_date.prorate(ppy, n),
            self.taper_threshold,
        );
        let allowance_to_date = allowance.prorate(n, ppy);
        let allowance_this_period = allowance_to_date - allowance.prorate(n - 1, ppy);

        let taxable_to_date = (pay_to_date - allowance_to_date).clamp_non_negative();
        let (due, bands) = tax_on_bands(taxable_to_date, &cumulative_bands(self.schedule, n, ppy));

        Assessment {
            tax: (due - self.state.tax_paid_to_date).clamp_non_negative(),
            taxable_income: (self.gross_pay - allowance_this_period).clamp_non_negative(),
            bands,
            annual_allowance: allowance,
        }
    }

    fn non_cumulative(&self, annual_allowance: Money) -> Assessment {
        let ppy = self.periods_per_year;

        let allowance = tapered_personal_allowance(
            annual_allowance,
            self.gross_pay.prorate(ppy, 1),
            self.taper_threshold,
        );
        let taxable = (self.gross_pay - allowance.prorate(1, ppy)).clamp_non_negative();
        let (tax, bands) = tax_on_bands(taxable, &period_bands(self.schedule, ppy));

        Assessment {
            tax,
            taxable_income: taxable,
            bands,
            annual_allowance: allowance,
        }
    }
}

fn describe(tax_code: &ParsedTaxCode, basis: AccrualBasis, assessment: &Assessment) -> String {
    match tax_code.kind {
        TaxCodeKind::Special(SpecialCode::NoTax) => {
            format!("Code {} - no tax deducted", tax_code.code)
        }
        TaxCodeKind::Special(special) if special != SpecialCode::ZeroAllowance => format!(
            "Code {} - flat rate on {} = {}",
            tax_code.code, assessment.taxable_income, assessment.tax
        ),
        _ => {
            let basis = match basis {
                AccrualBasis::Cumulative => "cumulative",
                AccrualBasis::Week1Month1 => "week 1/month 1",
            };
            format!(
                "Code {} ({}) - allowance {} a year, taxable {} this period, tax {}",
                tax_code.code,
                basis,
                assessment.annual_allowance,
                assessment.taxable_income,
                assessment.tax
            )
        }
    }
}
