//! UK PAYE payroll engine
//!
//! This crate turns a period's gross pay, an HMRC tax code, a pay frequency
//! and the employee's year-to-date figures into income tax, employee and
//! employer National Insurance, pension contributions, student loan
//! repayments and net pay. All money is held as whole pence.

#![warn(missing_docs)]

pub mod batch;
pub mod calculation;
pub mod config;
pub mod error;
pub mod models;
