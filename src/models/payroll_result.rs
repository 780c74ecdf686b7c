//! Payroll result models.
//!
//! This module contains the [`PayrollResult`] type and the breakdown
//! structures that record how each figure was reached, including the audit
//! trace of every rule applied.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{CumulativeState, Money, ParsedTaxCode, StudentLoanPlan};

/// Tax charged within one income tax band.
///
/// # Example
///
/// ```
/// use paye_engine::models::{BandTax, Money};
/// use rust_decimal::Decimal;
///
/// let band = BandTax {
///     band: "basic".to_string(),
///     taxable_amount: Money::from_pence(195_250),
///     rate: Decimal::new(20, 2),
///     tax: Money::from_pence(39_050),
/// };
/// assert_eq!(band.taxable_amount.apply_rate(band.rate), band.tax);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandTax {
    /// Band name from the rate table, or the special code for flat-rate codes.
    pub band: String,
    /// Pay falling in the band.
    pub taxable_amount: Money,
    /// The band's rate as a fraction.
    pub rate: Decimal,
    /// Tax on `taxable_amount`, rounded to the penny.
    pub tax: Money,
}

/// How an employee's pay splits across the NI thresholds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeNiBreakdown {
    /// Pay up to the Primary Threshold.
    pub below_threshold: Money,
    /// Pay between the Primary Threshold and the Upper Earnings Limit.
    pub at_main_rate: Money,
    /// Pay above the Upper Earnings Limit.
    pub at_reduced_rate: Money,
    /// Contribution on `at_main_rate`.
    pub main_rate_contribution: Money,
    /// Contribution on `at_reduced_rate`.
    pub reduced_rate_contribution: Money,
    /// Whether pay reached the Lower Earnings Limit for the period.
    pub reached_lower_earnings_limit: bool,
}

/// How pay splits across the employer NI thresholds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployerNiBreakdown {
    /// Pay up to the Secondary Threshold.
    pub below_threshold: Money,
    /// Pay between the Secondary Threshold and the Upper Earnings Limit that
    /// is relieved for categories H, M and Z.
    pub relieved: Money,
    /// Pay charged at the employer rate.
    pub at_main_rate: Money,
}

/// Relief-at-source pension contributions for a period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PensionContributions {
    /// Earnings the contribution rates were applied to.
    pub qualifying_earnings: Money,
    /// Employee contribution including basic-rate relief.
    pub employee_gross_contribution: Money,
    /// Basic-rate relief the scheme reclaims from HMRC.
    pub tax_relief: Money,
    /// Amount actually deducted from the employee's net pay.
    pub employee_net_contribution: Money,
    /// Employer contribution.
    pub employer_contribution: Money,
}

/// One student loan deduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentLoanDeduction {
    /// The plan repaid.
    pub plan: StudentLoanPlan,
    /// The plan threshold prorated to the period.
    pub period_threshold: Money,
    /// The repayment rate as a fraction.
    pub rate: Decimal,
    /// The amount deducted.
    pub deduction: Money,
}

/// A single step in the audit trace recording a calculation decision.
///
/// Each step captures the input, output, and reasoning for a rule application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The sequential step number.
    pub step_number: u32,
    /// The unique identifier of the rule that was applied.
    pub rule_id: String,
    /// The human-readable name of the rule.
    pub rule_name: String,
    /// The legislation or guidance the rule implements.
    pub reference: String,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the decision.
    pub reasoning: String,
}

/// A warning generated during calculation.
///
/// Warnings flag outcomes that are legitimate but may need a person to look
/// at them, such as net pay being floored at zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditWarning {
    /// A code identifying the type of warning.
    pub code: String,
    /// A human-readable description of the warning.
    pub message: String,
    /// The severity level ("low", "medium" or "high").
    pub severity: String,
}

impl AuditWarning {
    /// Creates a warning.
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        severity: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            severity: severity.into(),
        }
    }
}

/// The complete audit trace for a calculation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditTrace {
    /// The sequence of calculation steps.
    pub steps: Vec<AuditStep>,
    /// Any warnings generated during calculation.
    pub warnings: Vec<AuditWarning>,
}

/// Detail behind the headline figures of a [`PayrollResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollBreakdown {
    /// The tax code as parsed.
    pub tax_code: ParsedTaxCode,
    /// Tax per band. For cumulative codes these are year-to-date figures.
    pub tax_bands: Vec<BandTax>,
    /// Employee NI split.
    pub employee_ni: EmployeeNiBreakdown,
    /// Employer NI split.
    pub employer_ni: EmployerNiBreakdown,
    /// Pension contribution detail.
    pub pension: PensionContributions,
    /// Student loan deductions, one per plan.
    pub student_loans: Vec<StudentLoanDeduction>,
    /// Every rule applied, in order.
    pub audit_trace: AuditTrace,
}

/// The complete result of one payroll period for one employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollResult {
    /// Total gross pay (basic pay, bonus and commission).
    pub gross_pay: Money,
    /// Pay subject to tax this period after allowances.
    pub taxable_income: Money,
    /// Income tax deducted this period.
    pub income_tax: Money,
    /// Employee National Insurance.
    pub employee_ni: Money,
    /// Employer National Insurance (not deducted from pay).
    pub employer_ni: Money,
    /// Employee pension contribution including basic-rate relief.
    pub pension_employee_contribution: Money,
    /// Employer pension contribution.
    pub pension_employer_contribution: Money,
    /// Basic-rate relief included in the employee contribution.
    pub pension_tax_relief: Money,
    /// Total student loan repayments.
    pub student_loan_deduction: Money,
    /// Other post-tax deductions.
    pub other_deductions: Money,
    /// Net pay, never below zero.
    pub net_pay: Money,
    /// Net pay before the zero floor was applied.
    pub net_pay_before_clamp: Money,
    /// True if deductions exceeded pay and net pay was floored at zero.
    pub is_clamped: bool,
    /// Year-to-date figures for the caller to persist.
    pub new_cumulative_state: CumulativeState,
    /// Supporting detail.
    pub breakdown: PayrollBreakdown,
}

impl PayrollResult {
    /// Total deducted from the employee's gross pay, before the zero floor.
    pub fn total_deductions(&self) -> Money {
        self.income_tax
            + self.employee_ni
            + self.breakdown.pension.employee_net_contribution
            + self.student_loan_deduction
            + self.other_deductions
    }
}
