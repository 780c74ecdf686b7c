//! Domain models for the payroll engine.

mod money;
mod payroll_request;
mod payroll_result;
mod period_input;
mod tax_code;
mod tax_year;

pub use money::Money;
pub use payroll_request::PayrollRequest;
pub use payroll_result::{
    AuditStep, AuditTrace, AuditWarning, BandTax, EmployeeNiBreakdown, EmployerNiBreakdown,
    PayrollBreakdown, PayrollResult, PensionContributions, StudentLoanDeduction,
};
pub use period_input::{
    CumulativeState, NiCategory, PayFrequency, PensionRates, PeriodInput, QualifyingEarnings,
    StudentLoanPlan,
};
pub use tax_code::{AccrualBasis, ParsedTaxCode, SpecialCode, TaxCodeKind, TaxRegime};
pub use tax_year::TaxYear;
