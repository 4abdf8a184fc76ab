use anyhow::{anyhow, Result};
use serde::Deserialize;

use crate::models::{MealRates, MealType, Rates, SpecialDailyRates};
use crate::services::state::AppState;
use crate::services::store::{RateStore, SpecialRateStore};
use crate::utils::{parse_date, validate_count, validate_range, validate_rate};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RatesPayload {
    pub navkarshi: Option<f64>,
    pub lunch: Option<f64>,
    pub chovihar: Option<f64>,
    pub tea_coffee: Option<f64>,
    pub parcel: Option<f64>,
    pub catering_staff_default: Option<i64>,
}

impl RatesPayload {
    fn meal_values(&self) -> [(MealType, Option<f64>); 5] {
        [
            (MealType::Navkarshi, self.navkarshi),
            (MealType::Lunch, self.lunch),
            (MealType::Chovihar, self.chovihar),
            (MealType::TeaCoffee, self.tea_coffee),
            (MealType::Parcel, self.parcel),
        ]
    }

    fn apply_meals(&self, rates: &mut MealRates) -> Result<()> {
        for (meal, value) in self.meal_values() {
            if let Some(value) = value {
                rates.set_rate(meal, validate_rate(meal.as_str(), value)?);
            }
        }
        Ok(())
    }
}

pub async fn get_rates(state: &AppState) -> Result<Rates> {
    Ok(state.store.load_rates().await?)
}

/// Applies the given fields on top of the current rates and saves the whole table.
pub async fn save_rates(state: &AppState, payload: RatesPayload) -> Result<Rates> {
    let mut rates = state.store.load_rates().await?;
    payload.apply_meals(&mut rates.meals)?;
    if let Some(default) = payload.catering_staff_default {
        rates.catering_staff_default = validate_count(default, true)?;
    }

    if !state.store.save_rates(&rates).await? {
        return Err(anyhow!("Rates were not saved"));
    }
    Ok(rates)
}

pub async fn get_special_rates(state: &AppState, date: &str) -> Result<Option<SpecialDailyRates>> {
    let date = parse_date(date)?;
    Ok(state.store.special_rates_for_date(date).await?)
}

/// Unset fields keep the day's stored rate, or zero for a new day.
pub async fn save_special_rates(
    state: &AppState,
    date: &str,
    payload: RatesPayload,
) -> Result<SpecialDailyRates> {
    let date = parse_date(date)?;
    let mut rates = state
        .store
        .special_rates_for_date(date)
        .await?
        .map(|existing| existing.rates)
        .unwrap_or_default();
    payload.apply_meals(&mut rates)?;

    if !state.store.save_special_rates(date, &rates).await? {
        return Err(anyhow!("Special rates were not saved"));
    }
    Ok(SpecialDailyRates { date, rates })
}

pub async fn list_special_rates(
    state: &AppState,
    start: &str,
    end: &str,
) -> Result<Vec<SpecialDailyRates>> {
    let start = parse_date(start)?;
    let end = parse_date(end)?;
    validate_range(start, end)?;
    let rates = state.store.special_rates_for_range(start, end).await?;
    Ok(rates.into_values().collect())
}
