//! Calculation logic for the payroll engine.
//!
//! This module contains the calculation functions for one pay period: tax
//! code parsing, banded PAYE income tax under the cumulative and week
//! 1/month 1 bases, employee and employer National Insurance, relief-at-source
//! pension contributions, student loan repayments, input validation, and the
//! orchestrator that runs them in order to reach net pay.

mod bands;
mod employee_ni;
mod employer_ni;
mod paye;
mod payroll;
mod pension;
mod student_loan;
mod tax_code;
mod validation;

pub use bands::{BandSlice, cumulative_bands, period_bands, tax_on_bands};
pub use employee_ni::{EmployeeNiResult, calculate_employee_ni};
pub use employer_ni::{EmployerNiResult, calculate_employer_ni};
pub use paye::{PayeResult, calculate_paye, tapered_personal_allowance};
pub use payroll::{calculate_payroll, calculate_payroll_for_year};
pub use pension::{PensionResult, calculate_pension_contributions, relief_at_source_rate};
pub use student_loan::{StudentLoanResult, calculate_student_loan_deduction};
pub use tax_code::parse_tax_code;
pub use validation::{ValidationReport, validate_payroll_inputs};
