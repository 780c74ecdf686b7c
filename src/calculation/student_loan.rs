//! Student loan repayment deductions.

use crate::config::TaxYearRates;
use crate::error::{EngineError, EngineResult};
use crate::models::{AuditStep, Money, PayFrequency, StudentLoanDeduction, StudentLoanPlan};

/// The result of a student loan calculation for one plan.
#[derive(Debug, Clone)]
pub struct StudentLoanResult {
    /// Amount deducted this period; zero when no plan applies.
    pub deduction: Money,
    /// Detail of the deduction, when a plan was supplied.
    pub detail: Option<StudentLoanDeduction>,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Calculates the student loan repayment for one plan and one period.
///
/// The plan's annual threshold is prorated to the period. When pay exceeds
/// it, the plan rate is applied to the excess and rounded to the penny.
/// With no plan nothing is deducted.
///
/// # Errors
///
/// Returns [`EngineError::CalculationError`] if the rate table has no terms
/// for the plan.
///
/// # Examples
///
/// ```
/// use paye_engine::calculation::calculate_student_loan_deduction;
/// use paye_engine::config::RateTables;
/// use paye_engine::models::{Money, PayFrequency, StudentLoanPlan, TaxYear};
///
/// let tables = RateTables::builtin().unwrap();
/// let rates = tables.get(TaxYear::starting(2025)).unwrap();
///
/// let result = calculate_student_loan_deduction(
///     Money::from_pounds(3_000),
///     PayFrequency::Monthly,
///     Some(StudentLoanPlan::Plan2),
///     rates,
///     1,
/// )
/// .unwrap();
/// // (£3,000.00 - £2,372.50) x 9%
/// assert_eq!(result.deduction, Money::from_pence(5_648));
/// ```
pub fn calculate_student_loan_deduction(
    gross_pay: Money,
    frequency: PayFrequency,
    plan: Option<StudentLoanPlan>,
    rates: &TaxYearRates,
    step_number: u32,
) -> EngineResult<StudentLoanResult> {
    let Some(plan) = plan else {
        return Ok(StudentLoanResult {
            deduction: Money::ZERO,
            detail: None,
            audit_step: AuditStep {
                step_number,
                rule_id: "student_loan".to_string(),
                rule_name: "Student Loan Repayment".to_string(),
                reference: "Education (Student Loans) (Repayment) Regulations 2009, Part 4"
                    .to_string(),
                input: serde_json::json!({ "gross_pay": gross_pay, "plan": null }),
                output: serde_json::json!({ "deduction": Money::ZERO }),
                reasoning: "No student loan plan".to_string(),
            },
        });
    };

    let terms = rates
        .student_loan(plan)
        .ok_or_else(|| EngineError::CalculationError {
            message: format!("No student loan terms for {} in {}", plan, rates.tax_year),
        })?;

    let period_threshold = terms.threshold.per_period(frequency);
    let excess = (gross_pay - period_threshold).clamp_non_negative();
    let deduction = excess.apply_rate(terms.rate);

    let detail = StudentLoanDeduction {
        plan,
        period_threshold,
        rate: terms.rate,
        deduction,
    };

    let reasoning = if excess.is_zero() {
        format!(
            "{} - pay {} does not exceed threshold {}",
            plan, gross_pay, period_threshold
        )
    } else {
        format!(
            "{} - ({} - {}) x {} = {}",
            plan, gross_pay, period_threshold, terms.rate, deduction
        )
    };

    Ok(StudentLoanResult {
        deduction,
        detail: Some(detail),
        audit_step: AuditStep {
            step_number,
            rule_id: "student_loan".to_string(),
            rule_name: "Student Loan Repayment".to_string(),
            reference: "Education (Student Loans) (Repayment) Regulations 2009, Part 4"
                .to_string(),
            input: serde_json::json!({
                "gross_pay": gross_pay,
                "pay_frequency": frequency,
                "plan": plan,
            }),
            output: serde_json::to_value(detail).unwrap_or(serde_json::Value::Null),
            reasoning,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RateTables;
    use crate::models::TaxYear;
    use rust_decimal::Decimal;

    fn rates() -> TaxYearRates {
        RateTables::builtin()
            .unwrap()
            .get(TaxYear::starting(2025))
            .unwrap()
            .clone()
    }

    fn monthly(pounds: i64, plan: Option<StudentLoanPlan>) -> StudentLoanResult {
        calculate_student_loan_deduction(
            Money::from_pounds(pounds),
            PayFrequency::Monthly,
            plan,
            &rates(),
            1,
        )
        .unwrap()
    }

    #[test]
    fn test_no_plan() {
        let result = monthly(3_000, None);
        assert_eq!(result.deduction, Money::ZERO);
        assert!(result.detail.is_none());
    }

    #[test]
    fn test_plan_2_rounds_half_away_from_zero() {
        let result = monthly(3_000, Some(StudentLoanPlan::Plan2));
        let detail = result.detail.unwrap();
        assert_eq!(detail.period_threshold, Money::from_pence(237_250));
        assert_eq!(detail.rate, Decimal::new(9, 2));
        assert_eq!(result.deduction, Money::from_pence(5_648));
    }

    #[test]
    fn test_plan_1() {
        // Threshold 2_606_500 / 12 = 217_208.33 -> 217_208
        let result = monthly(3_000, Some(StudentLoanPlan::Plan1));
        assert_eq!(result.deduction, Money::from_pence(7_451));
    }

    #[test]
    fn test_postgraduate_loan_rate() {
        let result = monthly(3_000, Some(StudentLoanPlan::Postgrad));
        assert_eq!(result.deduction, Money::from_pounds(75));
    }

    #[test]
    fn test_below_threshold() {
        let result = monthly(2_000, Some(StudentLoanPlan::Plan4));
        assert_eq!(result.deduction, Money::ZERO);
        assert!(result.audit_step.reasoning.contains("does not exceed"));
        assert!(result.detail.is_some());
    }

    #[test]
    fn test_weekly_plan_5() {
        // Threshold 2_500_000 / 52 = 48_076.92 -> 48_077
        let result = calculate_student_loan_deduction(
            Money::from_pounds(600),
            PayFrequency::Weekly,
            Some(StudentLoanPlan::Plan5),
            &rates(),
            1,
        )
        .unwrap();
        // 11_923 x 9% = 1_073.07
        assert_eq!(result.deduction, Money::from_pence(1_073));
    }

    #[test]
    fn test_missing_plan_terms_is_an_error() {
        let mut rates = rates();
        rates.student_loans.remove(&StudentLoanPlan::Plan1);
        let err = calculate_student_loan_deduction(
            Money::from_pounds(3_000),
            PayFrequency::Monthly,
            Some(StudentLoanPlan::Plan1),
            &rates,
            1,
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::CalculationError { .. }));
    }
}
