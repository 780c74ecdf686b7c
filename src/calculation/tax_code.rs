//! Tax code parsing.
//!
//! This module turns a raw HMRC tax code into a [`ParsedTaxCode`].

use crate::config::TaxYearRates;
use crate::models::{
    AccrualBasis, AuditStep, Money, ParsedTaxCode, SpecialCode, TaxCodeKind, TaxRegime,
};

/// Parses a raw tax code.
///
/// Parsing never fails. The code is upper-cased and stripped of whitespace,
/// then read as follows:
/// 1. A `W1`, `M1` or trailing `X` suffix selects the week 1/month 1 basis
///    and is removed.
/// 2. `BR`, `D0`, `D1`, `NT` and `0T`, optionally prefixed `S` (Scottish) or
///    `C` (Welsh), are special codes.
/// 3. Otherwise an `S`/`C` prefix selects the regime, a leading `K` marks a
///    K code, and the digits give the allowance in tens of pounds.
///
/// A code with no digits has a zero allowance. A blank code falls back to the
/// standard personal allowance from `rates` on a cumulative basis, or to a
/// zero allowance when no rates are given.
///
/// # Examples
///
/// ```
/// use paye_engine::calculation::parse_tax_code;
/// use paye_engine::models::{AccrualBasis, Money, SpecialCode, TaxRegime};
///
/// let standard = parse_tax_code("1257L", None);
/// assert_eq!(standard.allowance_in_pence(), Money::from_pounds(12_570));
/// assert_eq!(standard.basis, AccrualBasis::Cumulative);
///
/// let k_code = parse_tax_code("K475 W1", None);
/// assert!(k_code.is_k_code());
/// assert_eq!(k_code.allowance_in_pence(), Money::from_pounds(-4_750));
/// assert_eq!(k_code.basis, AccrualBasis::Week1Month1);
///
/// let scottish_br = parse_tax_code("SBR", None);
/// assert_eq!(scottish_br.special_code(), Some(SpecialCode::BasicRate));
/// assert_eq!(scottish_br.regime, TaxRegime::Scottish);
/// ```
pub fn parse_tax_code(raw: &str, rates: Option<&TaxYearRates>) -> ParsedTaxCode {
    let normalized: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_uppercase();

    if normalized.is_empty() {
        return default_code(rates);
    }

    let (body, basis) = strip_emergency_suffix(&normalized);
    let body = body.trim_end_matches('/');
    let (regime, body) = strip_regime_prefix(body);

    if let Some(special) = SpecialCode::from_code(body) {
        return ParsedTaxCode {
            code: normalized,
            kind: TaxCodeKind::Special(special),
            regime,
            basis,
        };
    }

    let kind = match body.strip_prefix('K') {
        Some(rest) => TaxCodeKind::KCode(allowance_from_digits(rest)),
        None => TaxCodeKind::Allowance(allowance_from_digits(body)),
    };

    ParsedTaxCode {
        code: normalized,
        kind,
        regime,
        basis,
    }
}

fn default_code(rates: Option<&TaxYearRates>) -> ParsedTaxCode {
    let tens_of_pounds = rates.map_or(0, |r| r.personal_allowance.pounds() / 10);
    ParsedTaxCode {
        code: format!("{tens_of_pounds}L"),
        kind: TaxCodeKind::Allowance(Money::from_pounds(tens_of_pounds * 10)),
        regime: TaxRegime::Standard,
        basis: AccrualBasis::Cumulative,
    }
}

fn strip_emergency_suffix(code: &str) -> (&str, AccrualBasis) {
    if let Some(body) = code
        .strip_suffix("W1")
        .or_else(|| code.strip_suffix("M1"))
        .or_else(|| code.strip_suffix('X'))
    {
        (body, AccrualBasis::Week1Month1)
    } else {
        (code, AccrualBasis::Cumulative)
    }
}

fn strip_regime_prefix(code: &str) -> (TaxRegime, &str) {
    if let Some(rest) = code.strip_prefix('S') {
        (TaxRegime::Scottish, rest)
    } else if let Some(rest) = code.strip_prefix('C') {
        (TaxRegime::Welsh, rest)
    } else {
        (TaxRegime::Standard, code)
    }
}

/// Digits × £10, in pence. Codes without digits, or too long to be real,
/// give zero.
fn allowance_from_digits(code: &str) -> Money {
    let digits: String = code.chars().filter(char::is_ascii_digit).collect();
    let tens_of_pounds: i64 = digits.parse().unwrap_or(0);
    Money::from_pounds(tens_of_pounds.saturating_mul(10))
}

/// Builds the audit step recording how a code was read.
pub(crate) fn tax_code_audit_step(
    raw: &str,
    parsed: &ParsedTaxCode,
    step_number: u32,
) -> AuditStep {
    let reasoning = match parsed.kind {
        TaxCodeKind::Allowance(allowance) => {
            format!("Code {} gives an annual allowance of {}", parsed.code, allowance)
        }
        TaxCodeKind::KCode(addition) => format!(
            "K code {} adds {} a year to taxable pay",
            parsed.code, addition
        ),
        TaxCodeKind::Special(special) => {
            format!("Special code {} carries no allowance", special)
        }
    };

    AuditStep {
        step_number,
        rule_id: "tax_code".to_string(),
        rule_name: "Tax Code Parsing".to_string(),
        reference: "PAYE Regulations 2003, Part 2".to_string(),
        input: serde_json::json!({ "raw": raw }),
        output: serde_json::to_value(parsed).unwrap_or(serde_json::Value::Null),
        reasoning,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RateTables;
    use crate::models::TaxYear;

    fn rates() -> TaxYearRates {
        RateTables::builtin()
            .unwrap()
            .get(TaxYear::starting(2025))
            .unwrap()
            .clone()
    }

    #[test]
    fn test_standard_code() {
        let code = parse_tax_code("1257L", None);
        assert_eq!(code.kind, TaxCodeKind::Allowance(Money::from_pence(1_257_000)));
        assert_eq!(code.regime, TaxRegime::Standard);
        assert_eq!(code.basis, AccrualBasis::Cumulative);
        assert_eq!(code.code, "1257L");
    }

    #[test]
    fn test_normalizes_case_and_whitespace() {
        let code = parse_tax_code("  1257 l ", None);
        assert_eq!(code.code, "1257L");
        assert_eq!(code.allowance_in_pence(), Money::from_pounds(12_570));
    }

    #[test]
    fn test_emergency_suffixes() {
        for raw in ["1257L W1", "1257LM1", "1257L X", "1257L/M1"] {
            let code = parse_tax_code(raw, None);
            assert_eq!(code.basis, AccrualBasis::Week1Month1, "{raw}");
            assert_eq!(code.allowance_in_pence(), Money::from_pounds(12_570), "{raw}");
        }
    }

    #[test]
    fn test_scottish_and_welsh_prefixes() {
        let scottish = parse_tax_code("S1257L", None);
        assert_eq!(scottish.regime, TaxRegime::Scottish);
        assert_eq!(scottish.allowance_in_pence(), Money::from_pounds(12_570));

        let welsh = parse_tax_code("C1100L", None);
        assert_eq!(welsh.regime, TaxRegime::Welsh);
        assert_eq!(welsh.allowance_in_pence(), Money::from_pounds(11_000));
    }

    #[test]
    fn test_k_code_is_negative_allowance() {
        let code = parse_tax_code("K475", None);
        assert!(code.is_k_code());
        assert_eq!(code.kind, TaxCodeKind::KCode(Money::from_pounds(4_750)));
        assert_eq!(code.allowance_in_pence(), Money::from_pounds(-4_750));
    }

    #[test]
    fn test_scottish_k_code_with_emergency_suffix() {
        let code = parse_tax_code("SK100 M1", None);
        assert_eq!(code.regime, TaxRegime::Scottish);
        assert_eq!(code.basis, AccrualBasis::Week1Month1);
        assert_eq!(code.allowance_in_pence(), Money::from_pounds(-1_000));
    }

    #[test]
    fn test_special_codes() {
        let cases = [
            ("BR", SpecialCode::BasicRate),
            ("D0", SpecialCode::HigherRate),
            ("D1", SpecialCode::AdditionalRate),
            ("NT", SpecialCode::NoTax),
            ("0T", SpecialCode::ZeroAllowance),
        ];
        for (raw, expected) in cases {
            let code = parse_tax_code(raw, None);
            assert_eq!(code.special_code(), Some(expected), "{raw}");
            assert_eq!(code.allowance_in_pence(), Money::ZERO, "{raw}");
            assert_eq!(code.regime, TaxRegime::Standard, "{raw}");
        }
    }

    #[test]
    fn test_prefixed_special_codes() {
        let code = parse_tax_code("sd1", None);
        assert_eq!(code.special_code(), Some(SpecialCode::AdditionalRate));
        assert_eq!(code.regime, TaxRegime::Scottish);

        let code = parse_tax_code("CBR", None);
        assert_eq!(code.special_code(), Some(SpecialCode::BasicRate));
        assert_eq!(code.regime, TaxRegime::Welsh);
    }

    #[test]
    fn test_special_code_with_emergency_suffix() {
        let code = parse_tax_code("0T M1", None);
        assert_eq!(code.special_code(), Some(SpecialCode::ZeroAllowance));
        assert_eq!(code.basis, AccrualBasis::Week1Month1);
    }

    #[test]
    fn test_code_without_digits_has_zero_allowance() {
        let code = parse_tax_code("L", None);
        assert_eq!(code.kind, TaxCodeKind::Allowance(Money::ZERO));
    }

    #[test]
    fn test_absurdly_long_code_has_zero_allowance() {
        let code = parse_tax_code("99999999999999999999999L", None);
        assert_eq!(code.allowance_in_pence(), Money::ZERO);
    }

    #[test]
    fn test_blank_code_falls_back_to_standard_allowance() {
        let rates = rates();
        let code = parse_tax_code("   ", Some(&rates));
        assert_eq!(code.code, "1257L");
        assert_eq!(code.allowance_in_pence(), Money::from_pounds(12_570));
        assert_eq!(code.basis, AccrualBasis::Cumulative);
    }

    #[test]
    fn test_blank_code_without_rates_is_zero_allowance() {
        let code = parse_tax_code("", None);
        assert_eq!(code.allowance_in_pence(), Money::ZERO);
    }

    #[test]
    fn test_rates_are_ignored_when_code_has_digits() {
        let rates = rates();
        assert_eq!(
            parse_tax_code("500L", Some(&rates)).allowance_in_pence(),
            Money::from_pounds(5_000)
        );
    }

    #[test]
    fn test_audit_step_describes_k_code() {
        let parsed = parse_tax_code("K475", None);
        let step = tax_code_audit_step("K475", &parsed, 1);
        assert_eq!(step.rule_id, "tax_code");
        assert_eq!(step.input["raw"], "K475");
        assert!(step.reasoning.contains("adds £4750.00"));
    }
}
