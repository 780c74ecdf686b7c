//! Structured tax code descriptors.
//!
//! A raw HMRC code such as `S1257L`, `K475 W1` or `CBR` is parsed by
//! [`crate::calculation::parse_tax_code`] into a [`ParsedTaxCode`]. The
//! shape of the code is a [`TaxCodeKind`], so the PAYE calculator has to
//! handle every kind explicitly.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::Money;

/// Which set of income tax bands applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxRegime {
    /// England and Northern Ireland rates.
    Standard,
    /// Scottish rates (`S` prefix).
    Scottish,
    /// Welsh rates (`C` prefix).
    Welsh,
}

/// Whether tax is worked out on year-to-date totals or per period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccrualBasis {
    /// Tax due is calculated on year-to-date pay and self-corrects.
    Cumulative,
    /// Each period stands alone (`W1`, `M1` or `X` codes).
    Week1Month1,
}

/// Codes that do not carry a personal allowance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpecialCode {
    /// `BR`: all pay taxed at the basic rate.
    #[serde(rename = "BR")]
    BasicRate,
    /// `D0`: all pay taxed at the higher rate.
    #[serde(rename = "D0")]
    HigherRate,
    /// `D1`: all pay taxed at the additional rate.
    #[serde(rename = "D1")]
    AdditionalRate,
    /// `NT`: no tax deducted.
    #[serde(rename = "NT")]
    NoTax,
    /// `0T`: normal bands with no personal allowance.
    #[serde(rename = "0T")]
    ZeroAllowance,
}

impl SpecialCode {
    /// The code as written by HMRC.
    pub const fn as_str(self) -> &'static str {
        match self {
            SpecialCode::BasicRate => "BR",
            SpecialCode::HigherRate => "D0",
            SpecialCode::AdditionalRate => "D1",
            SpecialCode::NoTax => "NT",
            SpecialCode::ZeroAllowance => "0T",
        }
    }

    /// Looks up a special code by its HMRC spelling.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "BR" => Some(SpecialCode::BasicRate),
            "D0" => Some(SpecialCode::HigherRate),
            "D1" => Some(SpecialCode::AdditionalRate),
            "NT" => Some(SpecialCode::NoTax),
            "0T" => Some(SpecialCode::ZeroAllowance),
            _ => None,
        }
    }
}

impl fmt::Display for SpecialCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The shape of a tax code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "amount", rename_all = "snake_case")]
pub enum TaxCodeKind {
    /// An ordinary code carrying an annual tax-free allowance.
    Allowance(Money),
    /// A K code: the (positive) annual amount is added to taxable pay.
    KCode(Money),
    /// A code with no allowance and special treatment.
    Special(SpecialCode),
}

/// A tax code after parsing.
///
/// # Example
///
/// ```
/// use paye_engine::calculation::parse_tax_code;
/// use paye_engine::models::{AccrualBasis, Money, TaxRegime};
///
/// let code = parse_tax_code("s1257l m1", None);
/// assert_eq!(code.regime, TaxRegime::Scottish);
/// assert_eq!(code.basis, AccrualBasis::Week1Month1);
/// assert_eq!(code.allowance_in_pence(), Money::from_pounds(12_570));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedTaxCode {
    /// The normalized code (upper case, whitespace removed).
    pub code: String,
    /// What the code means for the allowance.
    pub kind: TaxCodeKind,
    /// Which band set applies.
    pub regime: TaxRegime,
    /// Cumulative or week 1/month 1.
    pub basis: AccrualBasis,
}

impl ParsedTaxCode {
    /// The signed annual allowance: negative for K codes, zero for special
    /// codes.
    pub fn allowance_in_pence(&self) -> Money {
        match self.kind {
            TaxCodeKind::Allowance(allowance) => allowance,
            TaxCodeKind::KCode(addition) => -addition,
            TaxCodeKind::Special(_) => Money::ZERO,
        }
    }

    /// Returns true for K codes.
    pub fn is_k_code(&self) -> bool {
        matches!(self.kind, TaxCodeKind::KCode(_))
    }

    /// Returns the special code, if any.
    pub fn special_code(&self) -> Option<SpecialCode> {
        match self.kind {
            TaxCodeKind::Special(special) => Some(special),
            _ => None,
        }
    }

    /// Returns true if the code is on a cumulative basis.
    pub fn is_cumulative(&self) -> bool {
        self.basis == AccrualBasis::Cumulative
    }
}

impl fmt::Display for ParsedTaxCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code)
    }
}
