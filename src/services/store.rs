//! Persistence seams consumed by the aggregation and reconciliation code.
//!
//! Three collaborators are modelled separately so a backend can implement only
//! what it actually stores. [`DataStore`] bundles them for the application.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::models::{EntryUpdate, MealRates, NewPlateEntry, PlateEntry, Rates, SpecialDailyRates};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Remote store error {status}: {body}")]
    Remote { status: u16, body: String },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("{0} lock poisoned")]
    Lock(&'static str),
}

/// Log of individual plate-count entries.
#[async_trait]
pub trait LogStore: Send + Sync {
    async fn add_entry(&self, entry: NewPlateEntry) -> Result<PlateEntry, StoreError>;

    /// Entries of one date ordered by time, then by insertion.
    async fn entries_by_date(&self, date: NaiveDate) -> Result<Vec<PlateEntry>, StoreError>;

    /// Entries within `start..=end` ordered by date, then time, then insertion.
    async fn entries_by_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PlateEntry>, StoreError>;

    /// Returns `false` when no entry has the given id.
    async fn update_entry(&self, id: &str, update: &EntryUpdate) -> Result<bool, StoreError>;

    async fn delete_entry(&self, id: &str) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait RateStore: Send + Sync {
    /// Falls back to [`Rates::default`] for anything never saved.
    async fn load_rates(&self) -> Result<Rates, StoreError>;

    async fn save_rates(&self, rates: &Rates) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait SpecialRateStore: Send + Sync {
    async fn special_rates_for_date(
        &self,
        date: NaiveDate,
    ) -> Result<Option<SpecialDailyRates>, StoreError>;

    async fn save_special_rates(
        &self,
        date: NaiveDate,
        rates: &MealRates,
    ) -> Result<bool, StoreError>;

    async fn special_rates_for_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BTreeMap<NaiveDate, SpecialDailyRates>, StoreError>;
}

pub trait DataStore: LogStore + RateStore + SpecialRateStore {
    fn backend_name(&self) -> &'static str;
}
