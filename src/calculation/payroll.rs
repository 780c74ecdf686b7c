//! Payroll orchestration.
//!
//! This module runs every calculator for one employee and one period, in
//! order, and assembles the [`PayrollResult`] with its audit trace.

use tracing::{debug, warn};

use crate::config::{RateTables, TaxYearRates};
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AuditStep, AuditTrace, AuditWarning, Money, PayrollBreakdown, PayrollResult, PeriodInput,
};

use super::employee_ni::calculate_employee_ni;
use super::employer_ni::calculate_employer_ni;
use super::paye::calculate_paye;
use super::pension::calculate_pension_contributions;
use super::student_loan::calculate_student_loan_deduction;
use super::tax_code::{parse_tax_code, tax_code_audit_step};

/// Runs payroll for one employee for one period.
///
/// Looks up the rate table for the input's tax year and delegates to
/// [`calculate_payroll_for_year`].
///
/// # Errors
///
/// Returns [`EngineError::TaxYearNotFound`] if no table is loaded for the
/// tax year, or any error from [`calculate_payroll_for_year`].
///
/// # Examples
///
/// ```
/// use paye_engine::calculation::calculate_payroll;
/// use paye_engine::config::RateTables;
/// use paye_engine::models::{
///     CumulativeState, Money, NiCategory, PayFrequency, PensionRates, PeriodInput, TaxYear,
/// };
///
/// let tables = RateTables::builtin().unwrap();
/// let input = PeriodInput {
///     gross_pay: Money::from_pounds(3_000),
///     tax_code: "1257L".to_string(),
///     pay_frequency: PayFrequency::Monthly,
///     ni_category: NiCategory::A,
///     period_number: 1,
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
/// let result = calculate_payroll(&input, &tables).unwrap();
/// assert_eq!(result.income_tax, Money::from_pence(39_050));
/// assert_eq!(result.employee_ni, Money::from_pence(15_620));
/// assert_eq!(result.employer_ni, Money::from_pence(38_750));
/// assert_eq!(result.net_pay, Money::from_pence(245_330));
/// ```
pub fn calculate_payroll(input: &PeriodInput, tables: &RateTables) -> EngineResult<PayrollResult> {
    let rates = tables.get(input.tax_year)?;
    calculate_payroll_for_year(input, rates)
}

/// Runs payroll for one period against a specific rate table.
///
/// The steps run in this order, each on total gross pay (basic pay plus
/// bonus and commission):
///
/// 1. Parse the tax code
/// 2. Pension contributions
/// 3. PAYE income tax
/// 4. Employee NI
/// 5. Employer NI
/// 6. Student loan repayments, one per plan
/// 7. Net pay: gross less tax, employee NI, the net pension contribution,
///    student loans and other deductions, floored at zero
///
/// # Errors
///
/// Returns [`EngineError::CalculationError`] if the rate table is for a
/// different tax year, the period number is outside the frequency's range,
/// or the table lacks rates for the NI category or a student loan plan.
pub fn calculate_payroll_for_year(
    input: &PeriodInput,
    rates: &TaxYearRates,
) -> EngineResult<PayrollResult> {
    if rates.tax_year != input.tax_year {
        return Err(EngineError::CalculationError {
            message: format!(
                "Rate table for {} supplied for a {} calculation",
                rates.tax_year, input.tax_year
            ),
        });
    }

    let frequency = input.pay_frequency;
    let last_period = frequency.max_period_number();
    if input.period_number == 0 || input.period_number > last_period {
        return Err(EngineError::CalculationError {
            message: format!(
                "Period {} is outside 1..={} for {} pay",
                input.period_number, last_period, frequency
            ),
        });
    }

    let gross_pay = input.total_gross();
    let mut steps: Vec<AuditStep> = Vec::new();
    let mut warnings: Vec<AuditWarning> = Vec::new();
    let mut step_number: u32 = 1;

    let tax_code = parse_tax_code(&input.tax_code, Some(rates));
    steps.push(tax_code_audit_step(&input.tax_code, &tax_code, step_number));
    step_number += 1;

    let pension = calculate_pension_contributions(
        gross_pay,
        frequency,
        input.pension_opt_in,
        &input.pension_rates,
        step_number,
    );
    steps.push(pension.audit_step);
    step_number += 1;
    let pension = pension.contributions;

    let paye = calculate_paye(
        &tax_code,
        gross_pay,
        frequency,
        input.period_number,
        &input.cumulative_state,
        rates,
        step_number,
    );
    steps.push(paye.audit_step);
    warnings.extend(paye.warnings);
    step_number += 1;

    let employee_ni =
        calculate_employee_ni(gross_pay, frequency, input.ni_category, rates, step_number)?;
    steps.push(employee_ni.audit_step);
    step_number += 1;

    let employer_ni =
        calculate_employer_ni(gross_pay, frequency, input.ni_category, rates, step_number);
    steps.push(employer_ni.audit_step);
    step_number += 1;

    let mut student_loans = Vec::with_capacity(input.student_loan_plans.len());
    let mut student_loan_deduction = Money::ZERO;
    if input.student_loan_plans.is_empty() {
        let none =
            calculate_student_loan_deduction(gross_pay, frequency, None, rates, step_number)?;
        steps.push(none.audit_step);
        step_number += 1;
    }
    for plan in &input.student_loan_plans {
        let loan = calculate_student_loan_deduction(
            gross_pay,
            frequency,
            Some(*plan),
            rates,
            step_number,
        )?;
        steps.push(loan.audit_step);
        step_number += 1;
        student_loan_deduction += loan.deduction;
        student_loans.extend(loan.detail);
    }

    let net_pay_before_clamp = gross_pay
        - paye.tax
        - employee_ni.contribution
        - pension.employee_net_contribution
        - student_loan_deduction
        - input.other_deductions;
    let is_clamped = net_pay_before_clamp.is_negative();
    let net_pay = net_pay_before_clamp.clamp_non_negative();

    if is_clamped {
        warn!(
            tax_year = %input.tax_year,
            period = input.period_number,
            net_pay_before_clamp = %net_pay_before_clamp,
            "Deductions exceed pay; net pay floored at zero"
        );
        warnings.push(AuditWarning::new(
            "NET_PAY_CLAMPED",
            format!(
                "Deductions exceed gross pay by {}; net pay set to zero",
                -net_pay_before_clamp
            ),
            "high",
        ));
    }

    steps.push(AuditStep {
        step_number,
        rule_id: "net_pay".to_string(),
        rule_name: "Net Pay".to_string(),
        reference: "Employment Rights Act 1996, s.13".to_string(),
        input: serde_json::json!({
            "gross_pay": gross_pay,
            "income_tax": paye.tax,
            "employee_ni": employee_ni.contribution,
            "pension_net_contribution": pension.employee_net_contribution,
            "student_loan_deduction": student_loan_deduction,
            "other_deductions": input.other_deductions,
        }),
        output: serde_json::json!({
            "net_pay": net_pay,
            "net_pay_before_clamp": net_pay_before_clamp,
            "is_clamped": is_clamped,
        }),
        reasoning: format!(
            "{} - {} - {} - {} - {} - {} = {}{}",
            gross_pay,
            paye.tax,
            employee_ni.contribution,
            pension.employee_net_contribution,
            student_loan_deduction,
            input.other_deductions,
            net_pay_before_clamp,
            if is_clamped { " (floored at zero)" } else { "" }
        ),
    });

    debug!(
        tax_year = %input.tax_year,
        period = input.period_number,
        tax_code = %tax_code,
        gross_pay = %gross_pay,
        income_tax = %paye.tax,
        employee_ni = %employee_ni.contribution,
        net_pay = %net_pay,
        "Payroll calculated"
    );

    Ok(PayrollResult {
        gross_pay,
        taxable_income: paye.taxable_income,
        income_tax: paye.tax,
        employee_ni: employee_ni.contribution,
        employer_ni: employer_ni.contribution,
        pension_employee_contribution: pension.employee_gross_contribution,
        pension_employer_contribution: pension.employer_contribution,
        pension_tax_relief: pension.tax_relief,
        student_loan_deduction,
        other_deductions: input.other_deductions,
        net_pay,
        net_pay_before_clamp,
        is_clamped,
        new_cumulative_state: paye.new_state,
        breakdown: PayrollBreakdown {
            tax_code,
            tax_bands: paye.bands,
            employee_ni: employee_ni.breakdown,
            employer_ni: employer_ni.breakdown,
            pension,
            student_loans,
            audit_trace: AuditTrace { steps, warnings },
        },
    })
}
