use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::PathBuf;

use crate::models::{Category, DayReport, MealType, RangeReport, ReconcileOutcome};
use crate::services::aggregator::{summaries_in_order, summarize_day};
use crate::services::calculator::{day_report, range_report};
use crate::services::export::{self, ReportBundle};
use crate::services::reconciler::{reconcile_catering, reconcile_cell, CellRef};
use crate::services::state::AppState;
use crate::services::store::{LogStore, RateStore, SpecialRateStore};
use crate::utils::{current_time_hhmm, parse_date, report_filename, validate_count, validate_range};

#[derive(Debug, Clone, Deserialize)]
pub struct SetCellPayload {
    pub date: String,
    pub category: String,
    pub meal_type: Option<String>,
    pub target: i64,
}

pub async fn get_day_summary(state: &AppState, date: &str) -> Result<DayReport> {
    let date = parse_date(date)?;
    let entries = state.store.entries_by_date(date).await?;
    let rates = state.store.load_rates().await?;
    let specials = state.store.special_rates_for_range(date, date).await?;

    let summary = summarize_day(date, &entries);
    Ok(day_report(&summary, &rates, &specials))
}

pub async fn build_bundle(state: &AppState, start: &str, end: &str) -> Result<ReportBundle> {
    let start = parse_date(start)?;
    let end = parse_date(end)?;
    validate_range(start, end)?;

    let entries = state.store.entries_by_range(start, end).await?;
    Ok(ReportBundle {
        start,
        end,
        summaries: summaries_in_order(&entries),
        rates: state.store.load_rates().await?,
        special_rates: state.store.special_rates_for_range(start, end).await?,
    })
}

pub async fn get_report(state: &AppState, start: &str, end: &str) -> Result<RangeReport> {
    let bundle = build_bundle(state, start, end).await?;
    Ok(range_report(
        bundle.start,
        bundle.end,
        &bundle.summaries,
        &bundle.rates,
        &bundle.special_rates,
    ))
}

pub async fn export_report(
    state: &AppState,
    start: &str,
    end: &str,
    output: Option<PathBuf>,
) -> Result<PathBuf> {
    let bundle = build_bundle(state, start, end).await?;
    if bundle.summaries.is_empty() {
        return Err(anyhow!("No data found for {} to {}", bundle.start, bundle.end));
    }
    let path = output.unwrap_or_else(|| PathBuf::from(report_filename(bundle.start, bundle.end)));
    export::export_report(&bundle, &path)?;
    Ok(path)
}

pub async fn set_cell(state: &AppState, payload: SetCellPayload) -> Result<ReconcileOutcome> {
    let date = parse_date(&payload.date)?;
    let category: Category = payload.category.parse()?;
    let target = validate_count(payload.target, true)?;
    let time = current_time_hhmm();

    if category == Category::Catering {
        return Ok(reconcile_catering(&*state.store, date, target, &time).await?);
    }

    let meal_type: MealType = payload
        .meal_type
        .as_deref()
        .ok_or_else(|| anyhow!("Meal type is required for {}", category))?
        .parse()?;
    let cell = CellRef {
        date,
        category,
        meal_type,
    };
    Ok(reconcile_cell(&*state.store, cell, target, &time).await?)
}

pub async fn set_catering(state: &AppState, date: &str, target: i64) -> Result<ReconcileOutcome> {
    set_cell(
        state,
        SetCellPayload {
            date: date.to_string(),
            category: Category::Catering.as_str().to_string(),
            meal_type: None,
            target,
        },
    )
    .await
}
