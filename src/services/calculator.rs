use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::models::{
    CategoryTotals, DailySummary, DayReport, MealCounts, MealRates, MealType, RangeReport, Rates,
    SpecialDailyRates,
};

/// Logged catering headcount, or the configured default when none (or zero) was logged.
pub fn catering_count(summary: &DailySummary, rates: &Rates) -> u32 {
    if summary.catering > 0 {
        summary.catering
    } else {
        rates.catering_staff_default
    }
}

pub fn amount(counts: &MealCounts, rates: &MealRates) -> f64 {
    MealType::ALL
        .iter()
        .map(|meal| counts.get(*meal) as f64 * rates.rate(*meal))
        .sum()
}

pub fn guest_amount(counts: &MealCounts, rates: &Rates) -> f64 {
    amount(counts, &rates.meals)
}

/// Special plates are free unless rates were set for that day.
pub fn special_amount(counts: &MealCounts, special: Option<&SpecialDailyRates>) -> f64 {
    match special {
        Some(special) => amount(counts, &special.rates),
        None => 0.0,
    }
}

pub fn day_report(
    summary: &DailySummary,
    rates: &Rates,
    specials: &BTreeMap<NaiveDate, SpecialDailyRates>,
) -> DayReport {
    let guest = CategoryTotals::from_counts(&summary.guest);
    let staff = CategoryTotals::from_counts(&summary.staff);
    let sevak = CategoryTotals::from_counts(&summary.sevak);
    let special = CategoryTotals::from_counts(&summary.special);
    let catering = catering_count(summary, rates);

    let guest_amount = guest_amount(&summary.guest, rates);
    let special_amount = special_amount(&summary.special, specials.get(&summary.date));

    DayReport {
        summary: summary.clone(),
        guest,
        staff,
        sevak,
        special,
        catering,
        grand_total: [guest.total, staff.total, sevak.total, special.total, catering]
            .into_iter()
            .fold(0u32, u32::saturating_add),
        guest_amount,
        special_amount,
        grand_amount: guest_amount + special_amount,
    }
}

pub fn range_report(
    start: NaiveDate,
    end: NaiveDate,
    summaries: &[DailySummary],
    rates: &Rates,
    specials: &BTreeMap<NaiveDate, SpecialDailyRates>,
) -> RangeReport {
    let mut report = RangeReport {
        start,
        end,
        days: Vec::with_capacity(summaries.len()),
        guest: MealCounts::default(),
        staff: MealCounts::default(),
        sevak: MealCounts::default(),
        special: MealCounts::default(),
        catering: 0,
        grand_total: 0,
        guest_amount: 0.0,
        special_amount: 0.0,
        grand_amount: 0.0,
    };

    for summary in summaries {
        let day = day_report(summary, rates, specials);
        report.guest.merge(&summary.guest);
        report.staff.merge(&summary.staff);
        report.sevak.merge(&summary.sevak);
        report.special.merge(&summary.special);
        report.catering = report.catering.saturating_add(day.catering);
        report.grand_total = report.grand_total.saturating_add(day.grand_total);
        report.guest_amount += day.guest_amount;
        report.special_amount += day.special_amount;
        report.grand_amount += day.grand_amount;
        report.days.push(day);
    }

    report
}
