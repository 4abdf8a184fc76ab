use anyhow::{anyhow, Result};
use serde::Deserialize;

use crate::models::{Category, EntryUpdate, MealType, NewPlateEntry, PlateEntry};
use crate::services::state::AppState;
use crate::services::store::LogStore;
use crate::utils::{current_time_hhmm, normalize_time, parse_date, validate_count};

#[derive(Debug, Clone, Deserialize)]
pub struct AddEntryPayload {
    pub date: String,
    pub time: Option<String>,
    pub category: String,
    pub meal_type: Option<String>,
    pub count: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateEntryPayload {
    pub id: String,
    pub category: Option<String>,
    pub meal_type: Option<String>,
    pub count: Option<i64>,
}

pub async fn add_entry(state: &AppState, payload: AddEntryPayload) -> Result<PlateEntry> {
    let date = parse_date(&payload.date)?;
    let category: Category = payload.category.parse()?;
    let meal_type = match (category, payload.meal_type.as_deref()) {
        (Category::Catering, _) => MealType::CATERING_PLACEHOLDER,
        (_, Some(meal)) => meal.parse()?,
        (_, None) => return Err(anyhow!("Meal type is required for {}", category)),
    };
    let count = validate_count(payload.count, false)?;
    let time = match payload.time.as_deref() {
        Some(time) => normalize_time(time)?,
        None => current_time_hhmm(),
    };

    let entry = state
        .store
        .add_entry(NewPlateEntry {
            date,
            time,
            category,
            meal_type,
            count,
        })
        .await?;
    Ok(entry)
}

pub async fn list_entries(state: &AppState, date: &str) -> Result<Vec<PlateEntry>> {
    let date = parse_date(date)?;
    Ok(state.store.entries_by_date(date).await?)
}

pub async fn update_entry(state: &AppState, payload: UpdateEntryPayload) -> Result<()> {
    let update = EntryUpdate {
        category: payload.category.as_deref().map(str::parse::<Category>).transpose()?,
        meal_type: payload.meal_type.as_deref().map(str::parse::<MealType>).transpose()?,
        count: payload
            .count
            .map(|count| validate_count(count, false))
            .transpose()?,
    };
    if update.is_empty() {
        return Err(anyhow!("Nothing to update"));
    }

    if !state.store.update_entry(&payload.id, &update).await? {
        return Err(anyhow!("Entry not found: {}", payload.id));
    }
    Ok(())
}

pub async fn delete_entry(state: &AppState, id: &str) -> Result<()> {
    if !state.store.delete_entry(id).await? {
        return Err(anyhow!("Entry not found: {}", id));
    }
    Ok(())
}
