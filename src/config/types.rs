//! Rate table types.
//!
//! This module contains the strongly-typed structures deserialized from the
//! per-tax-year YAML rate tables, and the [`RateTables`] collection that
//! looks them up by tax year.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::models::{
    Money, NiCategory, PayFrequency, QualifyingEarnings, SpecialCode, StudentLoanPlan, TaxRegime,
    TaxYear,
};

/// An annual amount in whole pounds, as authored in the rate table.
///
/// Exposes the annual, weekly and monthly views in pence. Period views are
/// rounded to the nearest penny.
///
/// ```
/// use paye_engine::config::AnnualThreshold;
/// use paye_engine::models::Money;
///
/// let pt = AnnualThreshold::from_pounds(12_570);
/// assert_eq!(pt.annual(), Money::from_pounds(12_570));
/// assert_eq!(pt.monthly(), Money::from_pence(104_750));
/// assert_eq!(pt.weekly(), Money::from_pence(24_173));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnualThreshold(i64);

impl AnnualThreshold {
    /// Creates a threshold from whole pounds.
    pub const fn from_pounds(pounds: i64) -> Self {
        Self(pounds)
    }

    /// The threshold in whole pounds.
    pub const fn pounds(self) -> i64 {
        self.0
    }

    /// The annual amount.
    pub const fn annual(self) -> Money {
        Money::from_pounds(self.0)
    }

    /// The weekly equivalent.
    pub fn weekly(self) -> Money {
        self.per_period(PayFrequency::Weekly)
    }

    /// The monthly equivalent.
    pub fn monthly(self) -> Money {
        self.per_period(PayFrequency::Monthly)
    }

    /// The equivalent for one period of the given frequency.
    pub fn per_period(self, frequency: PayFrequency) -> Money {
        self.annual().prorate(1, frequency.periods_per_year())
    }
}

/// A single income tax band.
///
/// `min` and `max` are inclusive whole-pound boundaries of total income.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBand {
    /// Band name, e.g. "basic".
    pub name: String,
    /// Rate as a fraction.
    pub rate: Decimal,
    /// Lowest pound of income in the band.
    pub min: i64,
    /// Highest pound of income in the band; `None` for the open top band.
    #[serde(default)]
    pub max: Option<i64>,
}

impl TaxBand {
    /// Returns true if the band has no upper limit.
    pub fn is_open_ended(&self) -> bool {
        self.max.is_none()
    }
}

/// Rates for the flat-rate special codes of one regime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatRates {
    /// `BR` rate.
    pub br: Decimal,
    /// `D0` rate.
    pub d0: Decimal,
    /// `D1` rate.
    pub d1: Decimal,
}

impl FlatRates {
    /// The flat rate for a special code, or `None` for codes that are not
    /// flat-rate (`NT`, `0T`).
    pub fn rate_for(&self, code: SpecialCode) -> Option<Decimal> {
        match code {
            SpecialCode::BasicRate => Some(self.br),
            SpecialCode::HigherRate => Some(self.d0),
            SpecialCode::AdditionalRate => Some(self.d1),
            SpecialCode::NoTax | SpecialCode::ZeroAllowance => None,
        }
    }
}

/// The income tax bands of one regime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeTaxSchedule {
    /// The zero-rate band covering the standard personal allowance.
    pub allowance_band: TaxBand,
    /// Charging bands in ascending order; the last is open-ended.
    pub bands: Vec<TaxBand>,
    /// Rates for `BR`, `D0` and `D1`.
    pub flat_rates: FlatRates,
}

impl IncomeTaxSchedule {
    /// Top of the allowance band in whole pounds.
    pub fn allowance_ceiling(&self) -> i64 {
        self.allowance_band.max.unwrap_or(self.allowance_band.min)
    }

    /// Charging bands ordered by `min`.
    pub fn sorted_bands(&self) -> Vec<&TaxBand> {
        let mut bands: Vec<&TaxBand> = self.bands.iter().collect();
        bands.sort_by_key(|band| band.min);
        bands
    }

    fn validate(&self, tax_year: TaxYear, regime: &str) -> EngineResult<()> {
        let invalid = |message: String| EngineError::InvalidRateTable {
            tax_year: tax_year.to_string(),
            message: format!("{regime} income tax: {message}"),
        };

        if !self.allowance_band.rate.is_zero() {
            return Err(invalid("allowance band must have a zero rate".to_string()));
        }
        let Some(allowance_max) = self.allowance_band.max else {
            return Err(invalid("allowance band must have a maximum".to_string()));
        };
        if self.bands.is_empty() {
            return Err(invalid("at least one charging band is required".to_string()));
        }

        let mut previous_max = allowance_max;
        let sorted = self.sorted_bands();
        let last_index = sorted.len() - 1;
        for (index, band) in sorted.into_iter().enumerate() {
            check_rate(band.rate).map_err(|m| invalid(format!("band '{}' {m}", band.name)))?;
            if band.min != previous_max + 1 {
                return Err(invalid(format!(
                    "band '{}' starts at {} but the previous band ends at {}",
                    band.name, band.min, previous_max
                )));
            }
            match (band.max, index == last_index) {
                (None, true) => {}
                (Some(_), true) => {
                    return Err(invalid(format!(
                        "last band '{}' must be open-ended",
                        band.name
                    )));
                }
                (None, false) => {
                    return Err(invalid(format!(
                        "band '{}' must have a maximum",
                        band.name
                    )));
                }
                (Some(max), false) => {
                    if max < band.min {
                        return Err(invalid(format!(
                            "band '{}' ends before it starts",
                            band.name
                        )));
                    }
                    previous_max = max;
                }
            }
        }

        for (code, rate) in [
            ("BR", self.flat_rates.br),
            ("D0", self.flat_rates.d0),
            ("D1", self.flat_rates.d1),
        ] {
            check_rate(rate).map_err(|m| invalid(format!("flat rate {code} {m}")))?;
        }

        Ok(())
    }
}

/// Income tax schedules per regime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeTaxRegimes {
    /// England and Northern Ireland.
    pub standard: IncomeTaxSchedule,
    /// Scotland.
    pub scottish: IncomeTaxSchedule,
    /// Wales; falls back to `standard` when absent.
    #[serde(default)]
    pub welsh: Option<IncomeTaxSchedule>,
}

/// Employee NI rates for one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRates {
    /// Rate between the Primary Threshold and the Upper Earnings Limit.
    pub main: Decimal,
    /// Rate above the Upper Earnings Limit.
    pub reduced: Decimal,
}

/// National Insurance thresholds and rates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NationalInsuranceRates {
    /// Lower Earnings Limit.
    pub lower_earnings_limit: AnnualThreshold,
    /// Primary Threshold (employee).
    pub primary_threshold: AnnualThreshold,
    /// Secondary Threshold (employer).
    pub secondary_threshold: AnnualThreshold,
    /// Upper Earnings Limit.
    pub upper_earnings_limit: AnnualThreshold,
    /// Employer (secondary) rate.
    pub employer_rate: Decimal,
    /// Employee rates by category.
    pub employee_rates: BTreeMap<NiCategory, CategoryRates>,
}

impl NationalInsuranceRates {
    /// Employee rates for a category.
    pub fn employee_rates_for(&self, category: NiCategory) -> Option<&CategoryRates> {
        self.employee_rates.get(&category)
    }
}

/// Repayment terms for one student loan plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentLoanRate {
    /// Annual repayment threshold.
    pub threshold: AnnualThreshold,
    /// Rate applied to pay above the threshold.
    pub rate: Decimal,
}

/// Automatic-enrolment pension thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PensionThresholds {
    /// Lower limit of qualifying earnings.
    pub qualifying_earnings_lower: AnnualThreshold,
    /// Upper limit of qualifying earnings.
    pub qualifying_earnings_upper: AnnualThreshold,
}

/// Everything the engine needs to know about one tax year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxYearRates {
    /// The tax year these rates apply to.
    pub tax_year: TaxYear,
    /// Standard personal allowance, used when no tax code is held.
    pub personal_allowance: AnnualThreshold,
    /// Income above which the personal allowance is withdrawn.
    pub allowance_taper_threshold: AnnualThreshold,
    /// Maximum share of a period's pay that may be taken under a K code.
    pub k_code_overriding_limit: Decimal,
    /// Income tax bands.
    pub income_tax: IncomeTaxRegimes,
    /// National Insurance thresholds and rates.
    pub national_insurance: NationalInsuranceRates,
    /// Student loan plans.
    pub student_loans: BTreeMap<StudentLoanPlan, StudentLoanRate>,
    /// Pension thresholds.
    pub pension: PensionThresholds,
}

impl TaxYearRates {
    /// The income tax schedule for a regime.
    pub fn schedule(&self, regime: TaxRegime) -> &IncomeTaxSchedule {
        match regime {
            TaxRegime::Standard => &self.income_tax.standard,
            TaxRegime::Scottish => &self.income_tax.scottish,
            TaxRegime::Welsh => self
                .income_tax
                .welsh
                .as_ref()
                .unwrap_or(&self.income_tax.standard),
        }
    }

    /// Repayment terms for a student loan plan.
    pub fn student_loan(&self, plan: StudentLoanPlan) -> Option<&StudentLoanRate> {
        self.student_loans.get(&plan)
    }

    /// The statutory qualifying earnings band for the year.
    pub fn statutory_qualifying_earnings(&self) -> QualifyingEarnings {
        QualifyingEarnings {
            lower: self.pension.qualifying_earnings_lower.annual(),
            upper: self.pension.qualifying_earnings_upper.annual(),
        }
    }

    /// Checks the table is internally consistent.
    ///
    /// Bands must be contiguous and ascending with an open-ended top band,
    /// every rate must lie between 0 and 1, every NI category and student
    /// loan plan must be present.
    pub fn validate(&self) -> EngineResult<()> {
        let invalid = |message: String| EngineError::InvalidRateTable {
            tax_year: self.tax_year.to_string(),
            message,
        };

        self.income_tax.standard.validate(self.tax_year, "standard")?;
        self.income_tax.scottish.validate(self.tax_year, "scottish")?;
        if let Some(welsh) = &self.income_tax.welsh {
            welsh.validate(self.tax_year, "welsh")?;
        }

        if self.k_code_overriding_limit <= Decimal::ZERO
            || self.k_code_overriding_limit > Decimal::ONE
        {
            return Err(invalid(
                "k_code_overriding_limit must be above 0 and at most 1".to_string(),
            ));
        }

        let ni = &self.national_insurance;
        if ni.primary_threshold > ni.upper_earnings_limit {
            return Err(invalid(
                "primary threshold is above the upper earnings limit".to_string(),
            ));
        }
        if ni.secondary_threshold > ni.upper_earnings_limit {
            return Err(invalid(
                "secondary threshold is above the upper earnings limit".to_string(),
            ));
        }
        check_rate(ni.employer_rate).map_err(|m| invalid(format!("employer NI rate {m}")))?;
        for category in NiCategory::ALL {
            let rates = ni
                .employee_rates_for(category)
                .ok_or_else(|| invalid(format!("no employee NI rates for category {category}")))?;
            check_rate(rates.main)
                .and_then(|()| check_rate(rates.reduced))
                .map_err(|m| invalid(format!("category {category} NI rate {m}")))?;
        }

        for plan in StudentLoanPlan::ALL {
            let loan = self
                .student_loan(plan)
                .ok_or_else(|| invalid(format!("no student loan terms for {plan}")))?;
            check_rate(loan.rate).map_err(|m| invalid(format!("{plan} rate {m}")))?;
        }

        if self.pension.qualifying_earnings_lower > self.pension.qualifying_earnings_upper {
            return Err(invalid(
                "qualifying earnings lower limit is above the upper limit".to_string(),
            ));
        }

        Ok(())
    }
}

fn check_rate(rate: Decimal) -> Result<(), String> {
    if rate < Decimal::ZERO || rate > Decimal::ONE {
        Err(format!("must be between 0 and 1, got {rate}"))
    } else {
        Ok(())
    }
}

/// Rate tables keyed by tax year.
///
/// There is no implicit "current year": asking for a year that is not loaded
/// is an error.
#[derive(Debug, Clone, Default)]
pub struct RateTables {
    tables: BTreeMap<TaxYear, TaxYearRates>,
}

impl RateTables {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and adds a table, replacing any existing table for the year.
    pub fn insert(&mut self, rates: TaxYearRates) -> EngineResult<()> {
        rates.validate()?;
        self.tables.insert(rates.tax_year, rates);
        Ok(())
    }

    /// Looks up the table for a tax year.
    pub fn get(&self, tax_year: TaxYear) -> EngineResult<&TaxYearRates> {
        self.tables
            .get(&tax_year)
            .ok_or_else(|| EngineError::TaxYearNotFound {
                tax_year: tax_year.to_string(),
            })
    }

    /// The loaded tax years, oldest first.
    pub fn tax_years(&self) -> impl Iterator<Item = TaxYear> + '_ {
        self.tables.keys().copied()
    }

    /// Number of loaded tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Returns true if no tables are loaded.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
