//! Income tax banding helpers.
//!
//! Rate table bands are authored on total annual income in whole pounds. For
//! PAYE they are converted into slices of *taxable* pay for the portion of
//! the year being taxed: the allowance-band ceiling is subtracted from every
//! boundary so the first charging band starts at zero taxable pay.

use rust_decimal::Decimal;

use crate::config::IncomeTaxSchedule;
use crate::models::{BandTax, Money};

/// One charging band expressed over taxable pay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandSlice {
    /// Band name.
    pub name: String,
    /// Rate as a fraction.
    pub rate: Decimal,
    /// Taxable pay at which the band starts.
    pub start: Money,
    /// Taxable pay at which the band ends; `None` for the top band.
    pub end: Option<Money>,
}

/// Bands for year-to-date tax at period `period_number` of `periods_per_year`.
///
/// Each annual boundary is prorated to the elapsed fraction of the year and
/// rounded independently; the prorated allowance ceiling is then subtracted
/// and negative starts are clamped to zero.
pub fn cumulative_bands(
    schedule: &IncomeTaxSchedule,
    period_number: u32,
    periods_per_year: u32,
) -> Vec<BandSlice> {
    let (n, ppy) = (period_number, periods_per_year);
    let prorate = |pounds: i64| Money::from_pounds(pounds).prorate(n, ppy);
    let allowance_used = prorate(schedule.allowance_ceiling());

    let mut previous_max = schedule.allowance_ceiling();
    let sorted = schedule.sorted_bands();
    let last_index = sorted.len().saturating_sub(1);

    sorted
        .into_iter()
        .enumerate()
        .map(|(index, band)| {
            let start = (prorate(previous_max) - allowance_used).clamp_non_negative();
            let end = match band.max {
                Some(max) if index != last_index => {
                    previous_max = max;
                    Some((prorate(max) - allowance_used).clamp_non_negative())
                }
                _ => None,
            };
            BandSlice {
                name: band.name.clone(),
                rate: band.rate,
                start,
                end,
            }
        })
        .collect()
}

/// Bands for a single period taxed on its own (week 1/month 1).
///
/// Each band's annual width is divided by `periods_per_year` and the slices
/// are laid end to end from zero.
pub fn period_bands(schedule: &IncomeTaxSchedule, periods_per_year: u32) -> Vec<BandSlice> {
    let mut previous_max = schedule.allowance_ceiling();
    let mut start = Money::ZERO;
    let sorted = schedule.sorted_bands();
    let last_index = sorted.len().saturating_sub(1);

    sorted
        .into_iter()
        .enumerate()
        .map(|(index, band)| {
            let slice_start = start;
            let end = match band.max {
                Some(max) if index != last_index => {
                    let width = Money::from_pounds(max - previous_max)
                        .clamp_non_negative()
                        .prorate(1, periods_per_year);
                    previous_max = max;
                    start = slice_start + width;
                    Some(start)
                }
                _ => None,
            };
            BandSlice {
                name: band.name.clone(),
                rate: band.rate,
                start: slice_start,
                end,
            }
        })
        .collect()
}

/// Applies band slices to an amount of taxable pay.
///
/// Zero-rate bands and bands the pay does not reach produce no entry. Each
/// band's tax is rounded to the penny before summing.
pub fn tax_on_bands(taxable: Money, slices: &[BandSlice]) -> (Money, Vec<BandTax>) {
    let mut entries = Vec::new();

    for slice in slices {
        if slice.rate.is_zero() {
            continue;
        }
        let top = slice.end.map_or(taxable, |end| end.min(taxable));
        let amount = (top - slice.start).clamp_non_negative();
        if amount.is_zero() {
            continue;
        }
        entries.push(BandTax {
            band: slice.name.clone(),
            taxable_amount: amount,
            rate: slice.rate,
            tax: amount.apply_rate(slice.rate),
        });
    }

    let total = entries.iter().map(|entry| entry.tax).sum();
    (total, entries)
}
