use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;
use umya_spreadsheet::Worksheet;

use crate::models::{
    Category, DailySummary, DayReport, MealCounts, MealType, Rates, SpecialDailyRates,
};
use crate::services::calculator::range_report;

pub const PLATE_SHEET: &str = "Plate Count";
pub const RATES_SHEET: &str = "Rates";
pub const SPECIAL_RATES_SHEET: &str = "Special Rates";

/// Everything a spreadsheet needs: summaries plus the rate tables that price them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportBundle {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub summaries: Vec<DailySummary>,
    pub rates: Rates,
    pub special_rates: BTreeMap<NaiveDate, SpecialDailyRates>,
}

pub fn export_report(bundle: &ReportBundle, path: &Path) -> Result<()> {
    let report = range_report(
        bundle.start,
        bundle.end,
        &bundle.summaries,
        &bundle.rates,
        &bundle.special_rates,
    );

    let mut book = umya_spreadsheet::new_file_empty_worksheet();

    {
        let sheet = book
            .new_sheet(PLATE_SHEET)
            .map_err(|e| anyhow!("Failed to create sheet: {}", e))?;
        write_headers(sheet);
        let mut row = 2;
        for day in &report.days {
            write_day_row(sheet, row, day);
            row += 1;
        }

        let totals = [
            report.guest,
            report.staff,
            report.sevak,
            report.special,
        ];
        set_text(sheet, 1, row, "TOTAL");
        let mut col = write_category_counts(sheet, row, &totals);
        for value in [report.catering, report.grand_total] {
            set_number(sheet, col, row, value as f64);
            col += 1;
        }
        for value in [report.guest_amount, report.special_amount, report.grand_amount] {
            set_number(sheet, col, row, value);
            col += 1;
        }
    }

    {
        let sheet = book
            .new_sheet(RATES_SHEET)
            .map_err(|e| anyhow!("Failed to create sheet: {}", e))?;
        set_text(sheet, 1, 1, "Meal");
        set_text(sheet, 2, 1, "Rate");
        let mut row = 2;
        for meal in MealType::ALL {
            set_text(sheet, 1, row, meal.label());
            set_number(sheet, 2, row, bundle.rates.meals.rate(meal));
            row += 1;
        }
        set_text(sheet, 1, row, "Catering Staff Default");
        set_number(sheet, 2, row, bundle.rates.catering_staff_default as f64);
    }

    {
        let sheet = book
            .new_sheet(SPECIAL_RATES_SHEET)
            .map_err(|e| anyhow!("Failed to create sheet: {}", e))?;
        set_text(sheet, 1, 1, "Date");
        for (idx, meal) in MealType::ALL.iter().enumerate() {
            set_text(sheet, idx as u32 + 2, 1, meal.label());
        }
        let mut row = 2;
        for special in bundle.special_rates.values() {
            set_text(sheet, 1, row, &special.date.to_string());
            for (idx, meal) in MealType::ALL.iter().enumerate() {
                set_number(sheet, idx as u32 + 2, row, special.rates.rate(*meal));
            }
            row += 1;
        }
    }

    umya_spreadsheet::writer::xlsx::write(&book, path)
        .map_err(|e| anyhow!("Failed to write workbook: {}", e))?;
    info!(path = %path.display(), days = report.days.len(), "Exported report");
    Ok(())
}

fn write_headers(sheet: &mut Worksheet) {
    let mut col = 1;
    set_text(sheet, col, 1, "Date");
    col += 1;
    for category in Category::WITH_MEALS {
        for meal in MealType::ALL {
            set_text(sheet, col, 1, &format!("{} {}", category.label(), meal.label()));
            col += 1;
        }
        set_text(sheet, col, 1, &format!("{} Total", category.label()));
        col += 1;
    }
    for header in [
        "Catering",
        "Grand Total",
        "Guest Amount",
        "Special Amount",
        "Total Amount",
    ] {
        set_text(sheet, col, 1, header);
        col += 1;
    }
}

fn write_day_row(sheet: &mut Worksheet, row: u32, day: &DayReport) {
    set_text(sheet, 1, row, &day.summary.date.to_string());
    let counts: Vec<MealCounts> = Category::WITH_MEALS
        .iter()
        .filter_map(|category| day.summary.counts(*category).copied())
        .collect();
    let mut col = write_category_counts(sheet, row, &counts);
    for value in [day.catering, day.grand_total] {
        set_number(sheet, col, row, value as f64);
        col += 1;
    }
    for value in [day.guest_amount, day.special_amount, day.grand_amount] {
        set_number(sheet, col, row, value);
        col += 1;
    }
}

/// Writes meal columns and the category total for each category; returns the next free column.
fn write_category_counts(sheet: &mut Worksheet, row: u32, counts: &[MealCounts]) -> u32 {
    let mut col = 2;
    for meals in counts {
        for meal in MealType::ALL {
            set_number(sheet, col, row, meals.get(meal) as f64);
            col += 1;
        }
        set_number(sheet, col, row, meals.total() as f64);
        col += 1;
    }
    col
}

fn set_text(sheet: &mut Worksheet, col: u32, row: u32, value: &str) {
    sheet.get_cell_mut((col, row)).set_value_string(value);
}

fn set_number(sheet: &mut Worksheet, col: u32, row: u32, value: f64) {
    sheet.get_cell_mut((col, row)).set_value_number(value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MealRates;

    #[test]
    fn writes_plate_and_rate_sheets() {
        let date = NaiveDate::from_ymd_opt(2024, 10, 1).unwrap();
        let mut summary = DailySummary::empty(date);
        summary.guest.lunch = 4;
        summary.special.parcel = 2;

        let mut special_rates = BTreeMap::new();
        special_rates.insert(
            date,
            SpecialDailyRates {
                date,
                rates: MealRates {
                    parcel: 25.0,
                    ..MealRates::default()
                },
            },
        );
        let bundle = ReportBundle {
            start: date,
            end: date,
            summaries: vec![summary],
            rates: Rates::default(),
            special_rates,
        };

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.xlsx");
        export_report(&bundle, &path).unwrap();

        let book = umya_spreadsheet::reader::xlsx::read(&path).unwrap();
        let plates = book.get_sheet_by_name(PLATE_SHEET).unwrap();
        assert_eq!(plates.get_value((1, 1)), "Date");
        assert_eq!(plates.get_value((1, 2)), "2024-10-01");
        assert_eq!(plates.get_value((1, 3)), "TOTAL");

        // Guest lunch, guest total, special parcel, then catering through total amount.
        assert_eq!(plates.get_value((3, 1)), "Guest Lunch");
        assert_eq!(plates.get_value((27, 1)), "Grand Total");
        assert_eq!(plates.get_value((30, 1)), "Total Amount");
        for row in [2, 3] {
            assert_eq!(plates.get_value((3, row)), "4");
            assert_eq!(plates.get_value((7, row)), "4");
            assert_eq!(plates.get_value((24, row)), "2");
            assert_eq!(plates.get_value((26, row)), "10");
            assert_eq!(plates.get_value((27, row)), "16");
            assert_eq!(plates.get_value((28, row)), "400");
            assert_eq!(plates.get_value((29, row)), "50");
            assert_eq!(plates.get_value((30, row)), "450");
        }
        assert!(book.get_sheet_by_name(RATES_SHEET).is_some());
        let specials = book.get_sheet_by_name(SPECIAL_RATES_SHEET).unwrap();
        assert_eq!(specials.get_value((1, 2)), "2024-10-01");
    }
}
