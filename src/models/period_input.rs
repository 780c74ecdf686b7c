//! Per-period payroll input and its enumerations.
//!
//! This module defines [`PeriodInput`], the fully-typed input to one payroll
//! calculation, together with the pay frequency, National Insurance category
//! and student loan plan enumerations it is built from.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{Money, TaxYear};

/// How often an employee is paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayFrequency {
    /// Paid every week (52 periods).
    Weekly,
    /// Paid every two weeks (26 periods).
    #[serde(alias = "fortnightly")]
    Biweekly,
    /// Paid every calendar month (12 periods).
    Monthly,
}

impl PayFrequency {
    /// Number of regular pay periods in a tax year.
    ///
    /// ```
    /// use paye_engine::models::PayFrequency;
    ///
    /// assert_eq!(PayFrequency::Monthly.periods_per_year(), 12);
    /// assert_eq!(PayFrequency::Biweekly.periods_per_year(), 26);
    /// ```
    pub const fn periods_per_year(self) -> u32 {
        match self {
            PayFrequency::Weekly => 52,
            PayFrequency::Biweekly => 26,
            PayFrequency::Monthly => 12,
        }
    }

    /// Highest period number a tax year can contain.
    ///
    /// Weekly and fortnightly payrolls can run an extra (week 53 or
    /// fortnight 27) period, which is always taxed on a week 1 basis.
    pub const fn max_period_number(self) -> u32 {
        match self {
            PayFrequency::Weekly => 53,
            PayFrequency::Biweekly => 27,
            PayFrequency::Monthly => 12,
        }
    }

    /// The canonical lower-case name.
    pub const fn as_str(self) -> &'static str {
        match self {
            PayFrequency::Weekly => "weekly",
            PayFrequency::Biweekly => "biweekly",
            PayFrequency::Monthly => "monthly",
        }
    }
}

impl fmt::Display for PayFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PayFrequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weekly" => Ok(PayFrequency::Weekly),
            "biweekly" | "fortnightly" => Ok(PayFrequency::Biweekly),
            "monthly" => Ok(PayFrequency::Monthly),
            other => Err(format!("unsupported pay frequency '{other}'")),
        }
    }
}

/// National Insurance category letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NiCategory {
    /// Standard employee.
    A,
    /// Married woman or widow with a reduced-rate election.
    B,
    /// Over state pension age.
    C,
    /// Apprentice under 25.
    H,
    /// Employee deferring NI because they pay it in another job.
    J,
    /// Under 21.
    M,
    /// Under 21 and deferring NI.
    Z,
}

impl NiCategory {
    /// All categories the engine supports.
    pub const ALL: [NiCategory; 7] = [
        NiCategory::A,
        NiCategory::B,
        NiCategory::C,
        NiCategory::H,
        NiCategory::J,
        NiCategory::M,
        NiCategory::Z,
    ];

    /// Returns true for categories where the employer pays nothing between
    /// the Secondary Threshold and the Upper Earnings Limit.
    pub const fn has_employer_relief(self) -> bool {
        matches!(self, NiCategory::H | NiCategory::M | NiCategory::Z)
    }

    /// The category letter.
    pub const fn letter(self) -> char {
        match self {
            NiCategory::A => 'A',
            NiCategory::B => 'B',
            NiCategory::C => 'C',
            NiCategory::H => 'H',
            NiCategory::J => 'J',
            NiCategory::M => 'M',
            NiCategory::Z => 'Z',
        }
    }
}

impl fmt::Display for NiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

impl FromStr for NiCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        NiCategory::ALL
            .into_iter()
            .find(|category| trimmed.eq_ignore_ascii_case(&category.letter().to_string()))
            .ok_or_else(|| format!("unknown NI category '{trimmed}'"))
    }
}

/// Student loan repayment plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StudentLoanPlan {
    /// Plan 1.
    Plan1,
    /// Plan 2.
    Plan2,
    /// Plan 4 (Scotland).
    Plan4,
    /// Plan 5.
    Plan5,
    /// Postgraduate loan.
    Postgrad,
}

impl StudentLoanPlan {
    /// All supported plans.
    pub const ALL: [StudentLoanPlan; 5] = [
        StudentLoanPlan::Plan1,
        StudentLoanPlan::Plan2,
        StudentLoanPlan::Plan4,
        StudentLoanPlan::Plan5,
        StudentLoanPlan::Postgrad,
    ];

    /// Returns true for the postgraduate loan, which is repaid alongside
    /// any undergraduate plan.
    pub const fn is_postgraduate(self) -> bool {
        matches!(self, StudentLoanPlan::Postgrad)
    }

    /// The canonical lower-case name.
    pub const fn as_str(self) -> &'static str {
        match self {
            StudentLoanPlan::Plan1 => "plan1",
            StudentLoanPlan::Plan2 => "plan2",
            StudentLoanPlan::Plan4 => "plan4",
            StudentLoanPlan::Plan5 => "plan5",
            StudentLoanPlan::Postgrad => "postgrad",
        }
    }
}

impl fmt::Display for StudentLoanPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StudentLoanPlan {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        StudentLoanPlan::ALL
            .into_iter()
            .find(|plan| plan.as_str() == normalized)
            .ok_or_else(|| format!("unknown student loan plan '{}'", s.trim()))
    }
}

/// Year-to-date PAYE figures for one employee, owned by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CumulativeState {
    /// Taxable pay received so far this tax year, before allowances.
    pub taxable_pay_to_date: Money,
    /// Income tax deducted so far this tax year.
    pub tax_paid_to_date: Money,
}

/// Annual band of earnings on which pension contributions are calculated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualifyingEarnings {
    /// Annual lower limit; earnings below it attract no contribution.
    pub lower: Money,
    /// Annual upper limit; earnings above it attract no contribution.
    pub upper: Money,
}

/// Pension contribution rates for a relief-at-source scheme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PensionRates {
    /// Employee rate in basis points (500 = 5%), including basic-rate relief.
    pub employee_rate_bps: u32,
    /// Employer rate in basis points.
    pub employer_rate_bps: u32,
    /// Qualifying earnings band. When absent, contributions are on full pay.
    #[serde(default)]
    pub qualifying_earnings: Option<QualifyingEarnings>,
}

/// Everything needed to run payroll for one employee for one period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodInput {
    /// Basic gross pay for the period.
    pub gross_pay: Money,
    /// HMRC tax code as issued, e.g. `1257L`, `K475 M1`, `SBR`.
    pub tax_code: String,
    /// How often the employee is paid.
    pub pay_frequency: PayFrequency,
    /// National Insurance category letter.
    pub ni_category: NiCategory,
    /// 1-based period number within the tax year.
    pub period_number: u32,
    /// Year-to-date figures carried from the previous period.
    #[serde(default)]
    pub cumulative_state: CumulativeState,
    /// Whether the employee is enrolled in the pension scheme.
    #[serde(default)]
    pub pension_opt_in: bool,
    /// Pension contribution rates.
    #[serde(default)]
    pub pension_rates: PensionRates,
    /// Student loan plans to repay (at most one undergraduate plan plus
    /// optionally a postgraduate loan).
    #[serde(default)]
    pub student_loan_plans: Vec<StudentLoanPlan>,
    /// Bonus paid this period.
    #[serde(default)]
    pub bonus: Money,
    /// Commission paid this period.
    #[serde(default)]
    pub commission: Money,
    /// Post-tax deductions taken from net pay.
    #[serde(default)]
    pub other_deductions: Money,
    /// Tax year whose rate table applies.
    pub tax_year: TaxYear,
}

impl PeriodInput {
    /// Total gross pay for the period: basic pay plus bonus and commission.
    pub fn total_gross(&self) -> Money {
        self.gross_pay + self.bonus + self.commission
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pay_frequency_periods() {
        assert_eq!(PayFrequency::Weekly.periods_per_year(), 52);
        assert_eq!(PayFrequency::Biweekly.periods_per_year(), 26);
        assert_eq!(PayFrequency::Monthly.periods_per_year(), 12);
        assert_eq!(PayFrequency::Weekly.max_period_number(), 53);
        assert_eq!(PayFrequency::Monthly.max_period_number(), 12);
    }

    #[test]
    fn test_pay_frequency_from_str_accepts_fortnightly_alias() {
        assert_eq!(
            "Fortnightly".parse::<PayFrequency>(),
            Ok(PayFrequency::Biweekly)
        );
        assert_eq!(" monthly ".parse::<PayFrequency>(), Ok(PayFrequency::Monthly));
        assert!("daily".parse::<PayFrequency>().is_err());
    }

    #[test]
    fn test_pay_frequency_serialization() {
        assert_eq!(
            serde_json::to_string(&PayFrequency::Biweekly).unwrap(),
            "\"biweekly\""
        );
        let alias: PayFrequency = serde_json::from_str("\"fortnightly\"").unwrap();
        assert_eq!(alias, PayFrequency::Biweekly);
    }

    #[test]
    fn test_ni_category_from_str_is_case_insensitive() {
        assert_eq!("a".parse::<NiCategory>(), Ok(NiCategory::A));
        assert_eq!(" Z ".parse::<NiCategory>(), Ok(NiCategory::Z));
        assert!("X".parse::<NiCategory>().is_err());
        assert!("AB".parse::<NiCategory>().is_err());
    }

    #[test]
    fn test_employer_relief_categories() {
        let relieved: Vec<NiCategory> = NiCategory::ALL
            .into_iter()
            .filter(|c| c.has_employer_relief())
            .collect();
        assert_eq!(relieved, vec![NiCategory::H, NiCategory::M, NiCategory::Z]);
    }

    #[test]
    fn test_student_loan_plan_from_str() {
        assert_eq!("plan2".parse::<StudentLoanPlan>(), Ok(StudentLoanPlan::Plan2));
        assert_eq!("Plan 4".parse::<StudentLoanPlan>(), Ok(StudentLoanPlan::Plan4));
        assert_eq!(
            "POSTGRAD".parse::<StudentLoanPlan>(),
            Ok(StudentLoanPlan::Postgrad)
        );
        assert!("plan3".parse::<StudentLoanPlan>().is_err());
    }

    #[test]
    fn test_deserialize_period_input_with_defaults() {
        let json = r#"{
            "gross_pay": 300000,
            "tax_code": "1257L",
            "pay_frequency": "monthly",
            "ni_category": "A",
            "period_number": 1,
            "tax_year": "2025-26"
        }"#;

        let input: PeriodInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.gross_pay, Money::from_pounds(3_000));
        assert_eq!(input.pay_frequency, PayFrequency::Monthly);
        assert_eq!(input.ni_category, NiCategory::A);
        assert_eq!(input.cumulative_state, CumulativeState::default());
        assert!(!input.pension_opt_in);
        assert!(input.student_loan_plans.is_empty());
        assert_eq!(input.tax_year, TaxYear::starting(2025));
    }

    #[test]
    fn test_total_gross_includes_bonus_and_commission() {
        let json = r#"{
            "gross_pay": 200000,
            "bonus": 50000,
            "commission": 12345,
            "tax_code": "1257L",
            "pay_frequency": "weekly",
            "ni_category": "A",
            "period_number": 3,
            "tax_year": "2025-26"
        }"#;

        let input: PeriodInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.total_gross(), Money::from_pence(262_345));
    }
}
