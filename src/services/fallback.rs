use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::warn;

use crate::models::{EntryUpdate, MealRates, NewPlateEntry, PlateEntry, Rates, SpecialDailyRates};
use crate::services::local::LocalStore;
use crate::services::remote::RemoteStore;
use crate::services::store::{DataStore, LogStore, RateStore, SpecialRateStore, StoreError};

/// Tries the hosted tables first and answers from SQLite when a remote call fails.
///
/// A failed call is not retried; that single call is served locally. Special daily
/// rates only ever live in the local store.
pub struct FallbackStore {
    remote: RemoteStore,
    local: LocalStore,
}

impl FallbackStore {
    pub fn new(remote: RemoteStore, local: LocalStore) -> Self {
        FallbackStore { remote, local }
    }
}

fn log_fallback(operation: &str, err: &StoreError) {
    warn!(operation, error = %err, "Remote store failed, using local store");
}

#[async_trait]
impl LogStore for FallbackStore {
    async fn add_entry(&self, entry: NewPlateEntry) -> Result<PlateEntry, StoreError> {
        match self.remote.add_entry(entry.clone()).await {
            Ok(stored) => Ok(stored),
            Err(err) => {
                log_fallback("add_entry", &err);
                self.local.add_entry(entry).await
            }
        }
    }

    async fn entries_by_date(&self, date: NaiveDate) -> Result<Vec<PlateEntry>, StoreError> {
        match self.remote.entries_by_date(date).await {
            Ok(entries) => Ok(entries),
            Err(err) => {
                log_fallback("entries_by_date", &err);
                self.local.entries_by_date(date).await
            }
        }
    }

    async fn entries_by_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PlateEntry>, StoreError> {
        match self.remote.entries_by_range(start, end).await {
            Ok(entries) => Ok(entries),
            Err(err) => {
                log_fallback("entries_by_range", &err);
                self.local.entries_by_range(start, end).await
            }
        }
    }

    async fn update_entry(&self, id: &str, update: &EntryUpdate) -> Result<bool, StoreError> {
        match self.remote.update_entry(id, update).await {
            Ok(updated) => Ok(updated),
            Err(err) => {
                log_fallback("update_entry", &err);
                self.local.update_entry(id, update).await
            }
        }
    }

    async fn delete_entry(&self, id: &str) -> Result<bool, StoreError> {
        match self.remote.delete_entry(id).await {
            Ok(deleted) => Ok(deleted),
            Err(err) => {
                log_fallback("delete_entry", &err);
                self.local.delete_entry(id).await
            }
        }
    }
}

#[async_trait]
impl RateStore for FallbackStore {
    /// Meal rates come from the hosted table when it is reachable; the catering
    /// default is only kept locally.
    async fn load_rates(&self) -> Result<Rates, StoreError> {
        let local = self.local.load_rates().await?;
        match self.remote.load_rates().await {
            Ok(mut rates) => {
                rates.catering_staff_default = local.catering_staff_default;
                Ok(rates)
            }
            Err(err) => {
                log_fallback("load_rates", &err);
                Ok(local)
            }
        }
    }

    async fn save_rates(&self, rates: &Rates) -> Result<bool, StoreError> {
        self.local.save_rates(rates).await?;
        if let Err(err) = self.remote.save_rates(rates).await {
            log_fallback("save_rates", &err);
        }
        Ok(true)
    }
}

#[async_trait]
impl SpecialRateStore for FallbackStore {
    async fn special_rates_for_date(
        &self,
        date: NaiveDate,
    ) -> Result<Option<SpecialDailyRates>, StoreError> {
        self.local.special_rates_for_date(date).await
    }

    async fn save_special_rates(
        &self,
        date: NaiveDate,
        rates: &MealRates,
    ) -> Result<bool, StoreError> {
        self.local.save_special_rates(date, rates).await
    }

    async fn special_rates_for_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BTreeMap<NaiveDate, SpecialDailyRates>, StoreError> {
        self.local.special_rates_for_range(start, end).await
    }
}

impl DataStore for FallbackStore {
    fn backend_name(&self) -> &'static str {
        "remote"
    }
}
