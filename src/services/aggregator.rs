use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::models::{Category, DailySummary, MealType, PlateEntry};

/// Folds log entries into one summary per date present in the input.
///
/// Catering counts go to the per-date scalar regardless of meal type. The fold is
/// a plain sum, so input order does not matter.
pub fn aggregate_entries(entries: &[PlateEntry]) -> BTreeMap<NaiveDate, DailySummary> {
    let mut summaries: BTreeMap<NaiveDate, DailySummary> = BTreeMap::new();

    for entry in entries {
        let summary = summaries
            .entry(entry.date)
            .or_insert_with(|| DailySummary::empty(entry.date));
        match summary.counts_mut(entry.category) {
            Some(counts) => counts.add(entry.meal_type, entry.count),
            None => summary.catering = summary.catering.saturating_add(entry.count),
        }
    }

    summaries
}

pub fn summaries_in_order(entries: &[PlateEntry]) -> Vec<DailySummary> {
    aggregate_entries(entries).into_values().collect()
}

/// Summary for a single date; zero-filled when nothing was logged.
pub fn summarize_day(date: NaiveDate, entries: &[PlateEntry]) -> DailySummary {
    aggregate_entries(entries)
        .remove(&date)
        .unwrap_or_else(|| DailySummary::empty(date))
}

/// Sum of all entries in one summary cell; meal type is ignored for catering.
pub fn cell_total<'a, I>(entries: I, category: Category, meal: MealType) -> u32
where
    I: IntoIterator<Item = &'a PlateEntry>,
{
    entries
        .into_iter()
        .filter(|e| {
            e.category == category && (category == Category::Catering || e.meal_type == meal)
        })
        .fold(0u32, |total, e| total.saturating_add(e.count))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(day: u32, category: Category, meal_type: MealType, count: u32) -> PlateEntry {
        PlateEntry {
            id: format!("{}-{}-{}-{}", day, category, meal_type, count),
            date: NaiveDate::from_ymd_opt(2024, 4, day).unwrap(),
            time: "12:00".to_string(),
            category,
            meal_type,
            count,
            created_at: String::new(),
        }
    }

    fn cell(summary: &DailySummary, category: Category, meal: MealType) -> u32 {
        match category {
            Category::Catering => summary.catering,
            _ => summary.counts(category).map_or(0, |counts| counts.get(meal)),
        }
    }

    fn sample() -> Vec<PlateEntry> {
        vec![
            entry(1, Category::Guest, MealType::Lunch, 3),
            entry(1, Category::Guest, MealType::Lunch, 2),
            entry(1, Category::Guest, MealType::TeaCoffee, 4),
            entry(1, Category::Staff, MealType::Navkarshi, 7),
            entry(1, Category::Catering, MealType::Lunch, 5),
            entry(1, Category::Catering, MealType::Parcel, 1),
            entry(2, Category::Special, MealType::Chovihar, 6),
            entry(2, Category::Sevak, MealType::Parcel, 0),
        ]
    }

    #[test]
    fn sums_every_cell() {
        let entries = sample();
        let summaries = aggregate_entries(&entries);
        assert_eq!(summaries.len(), 2);

        for (date, summary) in &summaries {
            let day_entries: Vec<&PlateEntry> =
                entries.iter().filter(|e| e.date == *date).collect();
            for category in Category::ALL {
                for meal in MealType::ALL {
                    assert_eq!(
                        cell(summary, category, meal),
                        cell_total(day_entries.iter().copied(), category, meal),
                        "{} {} {}",
                        date,
                        category,
                        meal
                    );
                }
            }
        }

        let first = &summaries[&NaiveDate::from_ymd_opt(2024, 4, 1).unwrap()];
        assert_eq!(first.guest.lunch, 5);
        assert_eq!(first.guest.tea_coffee, 4);
        assert_eq!(first.staff.navkarshi, 7);
        assert_eq!(first.catering, 6);
    }

    #[test]
    fn huge_counts_saturate_instead_of_overflowing() {
        let entries = vec![
            entry(3, Category::Guest, MealType::Lunch, 3_000_000_000),
            entry(3, Category::Guest, MealType::Lunch, 3_000_000_000),
            entry(3, Category::Guest, MealType::Parcel, 3_000_000_000),
            entry(3, Category::Catering, MealType::Lunch, 3_000_000_000),
            entry(3, Category::Catering, MealType::Lunch, 3_000_000_000),
        ];
        let summaries = aggregate_entries(&entries);
        let summary = &summaries[&NaiveDate::from_ymd_opt(2024, 4, 3).unwrap()];

        assert_eq!(summary.guest.lunch, u32::MAX);
        assert_eq!(summary.guest.total(), u32::MAX);
        assert_eq!(summary.catering, u32::MAX);
        assert_eq!(cell_total(&entries, Category::Guest, MealType::Lunch), u32::MAX);
    }

    #[test]
    fn order_does_not_matter() {
        let entries = sample();
        let mut reversed = entries.clone();
        reversed.reverse();
        let mut rotated = entries.clone();
        rotated.rotate_left(3);

        let expected = aggregate_entries(&entries);
        assert_eq!(aggregate_entries(&reversed), expected);
        assert_eq!(aggregate_entries(&rotated), expected);
    }

    #[test]
    fn zero_count_entries_still_create_the_day() {
        let summaries = aggregate_entries(&[entry(9, Category::Sevak, MealType::Lunch, 0)]);
        let summary = &summaries[&NaiveDate::from_ymd_opt(2024, 4, 9).unwrap()];
        assert_eq!(summary, &DailySummary::empty(summary.date));
    }

    #[test]
    fn summaries_come_back_sorted_and_days_default_to_zero() {
        let mut entries = sample();
        entries.reverse();
        let dates: Vec<u32> = summaries_in_order(&entries)
            .iter()
            .map(|s| chrono::Datelike::day(&s.date))
            .collect();
        assert_eq!(dates, vec![1, 2]);

        let empty_day = NaiveDate::from_ymd_opt(2024, 4, 20).unwrap();
        assert_eq!(summarize_day(empty_day, &entries), DailySummary::empty(empty_day));
    }
}
