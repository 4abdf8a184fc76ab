use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::db::Database;
use crate::models::{EntryUpdate, MealRates, NewPlateEntry, PlateEntry, Rates, SpecialDailyRates};
use crate::services::store::{DataStore, LogStore, RateStore, SpecialRateStore, StoreError};

/// SQLite-backed store; always available.
#[derive(Clone)]
pub struct LocalStore {
    db: Arc<Mutex<Database>>,
}

impl LocalStore {
    pub fn new(db: Database) -> Self {
        LocalStore {
            db: Arc::new(Mutex::new(db)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Database>, StoreError> {
        self.db.lock().map_err(|_| StoreError::Lock("DB"))
    }

    /// Stores an entry whose id and timestamp were already assigned.
    pub fn insert_entry(&self, entry: &PlateEntry) -> Result<(), StoreError> {
        self.lock()?.insert_entry(entry)?;
        Ok(())
    }
}

#[async_trait]
impl LogStore for LocalStore {
    async fn add_entry(&self, entry: NewPlateEntry) -> Result<PlateEntry, StoreError> {
        let entry = entry.into_entry();
        self.insert_entry(&entry)?;
        Ok(entry)
    }

    async fn entries_by_date(&self, date: NaiveDate) -> Result<Vec<PlateEntry>, StoreError> {
        Ok(self.lock()?.get_entries_by_date(date)?)
    }

    async fn entries_by_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PlateEntry>, StoreError> {
        Ok(self.lock()?.get_entries_by_range(start, end)?)
    }

    async fn update_entry(&self, id: &str, update: &EntryUpdate) -> Result<bool, StoreError> {
        Ok(self.lock()?.update_entry(id, update)?)
    }

    async fn delete_entry(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.lock()?.delete_entry(id)?)
    }
}

#[async_trait]
impl RateStore for LocalStore {
    async fn load_rates(&self) -> Result<Rates, StoreError> {
        Ok(self.lock()?.get_rates()?)
    }

    async fn save_rates(&self, rates: &Rates) -> Result<bool, StoreError> {
        self.lock()?.save_rates(rates)?;
        Ok(true)
    }
}

#[async_trait]
impl SpecialRateStore for LocalStore {
    async fn special_rates_for_date(
        &self,
        date: NaiveDate,
    ) -> Result<Option<SpecialDailyRates>, StoreError> {
        Ok(self.lock()?.get_special_rates(date)?)
    }

    async fn save_special_rates(
        &self,
        date: NaiveDate,
        rates: &MealRates,
    ) -> Result<bool, StoreError> {
        self.lock()?.save_special_rates(date, rates)?;
        Ok(true)
    }

    async fn special_rates_for_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BTreeMap<NaiveDate, SpecialDailyRates>, StoreError> {
        Ok(self.lock()?.get_special_rates_by_range(start, end)?)
    }
}

impl DataStore for LocalStore {
    fn backend_name(&self) -> &'static str {
        "local"
    }
}
