//! Property-based tests for the payroll calculators.

use proptest::prelude::*;

use paye_engine::calculation::{
    calculate_employee_ni, calculate_paye, parse_tax_code, tapered_personal_allowance,
};
use paye_engine::config::{RateTables, TaxYearRates};
use paye_engine::models::{CumulativeState, Money, NiCategory, PayFrequency, TaxYear};

fn rates() -> TaxYearRates {
    RateTables::builtin()
        .unwrap()
        .get(TaxYear::starting(2025))
        .unwrap()
        .clone()
}

fn arb_category() -> impl Strategy<Value = NiCategory> {
    prop::sample::select(NiCategory::ALL.to_vec())
}

fn arb_frequency() -> impl Strategy<Value = PayFrequency> {
    prop::sample::select(vec![
        PayFrequency::Weekly,
        PayFrequency::Biweekly,
        PayFrequency::Monthly,
    ])
}

const THRESHOLD: Money = Money::from_pounds(100_000);

proptest! {
    // =========================================================================
    // Personal allowance taper
    // =========================================================================

    #[test]
    fn test_allowance_unreduced_up_to_threshold(
        allowance in 0i64..=5_000_000,
        income in 0i64..=10_000_000,
    ) {
        let allowance = Money::from_pence(allowance);
        prop_assert_eq!(
            tapered_personal_allowance(allowance, Money::from_pence(income), THRESHOLD),
            allowance
        );
    }

    #[test]
    fn test_allowance_reduced_one_for_two_above_threshold(
        allowance in 0i64..=5_000_000,
        excess in 0i64..=100_000_000,
    ) {
        let allowance = Money::from_pence(allowance);
        let income = THRESHOLD + Money::from_pence(excess);
        let tapered = tapered_personal_allowance(allowance, income, THRESHOLD);

        prop_assert!(tapered >= Money::ZERO);
        prop_assert!(tapered <= allowance);
        prop_assert_eq!(
            tapered,
            (allowance - Money::from_pence(excess / 2)).clamp_non_negative()
        );
    }

    // =========================================================================
    // National Insurance
    // =========================================================================

    #[test]
    fn test_employee_ni_is_non_decreasing_in_pay(
        category in arb_category(),
        frequency in arb_frequency(),
        low in 0i64..=2_000_000,
        step in 0i64..=500_000,
    ) {
        let rates = rates();
        let ni = |pence: i64| {
            calculate_employee_ni(Money::from_pence(pence), frequency, category, &rates, 1)
                .unwrap()
                .contribution
        };
        prop_assert!(ni(low) <= ni(low + step));
    }

    #[test]
    fn test_category_c_never_pays_employee_ni(
        frequency in arb_frequency(),
        pence in 0i64..=10_000_000,
    ) {
        let result =
            calculate_employee_ni(Money::from_pence(pence), frequency, NiCategory::C, &rates(), 1)
                .unwrap();
        prop_assert_eq!(result.contribution, Money::ZERO);
    }

    // =========================================================================
    // PAYE
    // =========================================================================

    #[test]
    fn test_k_code_taxable_income_is_at_least_gross(
        tens_of_pounds in 1u32..=9_999,
        suffix in prop::sample::select(vec!["", " M1"]),
        pence in 0i64..=2_000_000,
        period in 1u32..=12,
    ) {
        let rates = rates();
        let code = parse_tax_code(&format!("K{tens_of_pounds}{suffix}"), Some(&rates));
        let gross = Money::from_pence(pence);
        let result = calculate_paye(
            &code,
            gross,
            PayFrequency::Monthly,
            period,
            &CumulativeState::default(),
            &rates,
            1,
        );
        prop_assert!(result.taxable_income >= gross);
    }

    #[test]
    fn test_period_tax_is_never_negative(
        pence in 0i64..=5_000_000,
        paid in 0i64..=5_000_000,
        period in 1u32..=12,
    ) {
        let rates = rates();
        let code = parse_tax_code("1257L", Some(&rates));
        let state = CumulativeState {
            taxable_pay_to_date: Money::from_pence(pence * i64::from(period - 1)),
            tax_paid_to_date: Money::from_pence(paid),
        };
        let result = calculate_paye(
            &code,
            Money::from_pence(pence),
            PayFrequency::Monthly,
            period,
            &state,
            &rates,
            1,
        );
        prop_assert!(result.tax >= Money::ZERO);
    }

    #[test]
    fn test_cumulative_periods_sum_to_single_calculation(
        pence in 0i64..=2_000_000,
        frequency in arb_frequency(),
        periods in 1u32..=52,
        tax_code in prop::sample::select(vec!["1257L", "S1257L", "K500", "0T"]),
    ) {
        let rates = rates();
        let code = parse_tax_code(tax_code, Some(&rates));
        let gross = Money::from_pence(pence);
        let periods = periods.min(frequency.periods_per_year());

        let mut state = CumulativeState::default();
        let mut total = Money::ZERO;
        for period in 1..=periods {
            let result = calculate_paye(&code, gross, frequency, period, &state, &rates, 1);
            total += result.tax;
            state = result.new_state;
        }

        let single = calculate_paye(
            &code,
            Money::from_pence(pence * i64::from(periods)),
            frequency,
            periods,
            &CumulativeState::default(),
            &rates,
            1,
        );

        let difference = (total - single.tax).abs();
        prop_assert!(
            difference <= Money::from_pence(i64::from(periods)),
            "{} {} over {} periods: periodic total {} vs single {}",
            tax_code,
            frequency,
            periods,
            total,
            single.tax
        );
        prop_assert_eq!(state.tax_paid_to_date, total);
    }
}
