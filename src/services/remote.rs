use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::models::{EntryUpdate, MealType, NewPlateEntry, PlateEntry, Rates, RemoteSettings};
use crate::services::store::{LogStore, RateStore, StoreError};

const PLATE_ENTRIES: &str = "plate_entries";
const RATES: &str = "rates";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateRecord {
    pub meal_type: MealType,
    pub rate: f64,
}

/// Client for the hosted PostgREST (Supabase) tables.
#[derive(Clone)]
pub struct RemoteStore {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RemoteStore {
    pub fn new(settings: &RemoteSettings) -> Self {
        RemoteStore {
            client: Client::new(),
            base_url: settings.url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
        }
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}/rest/v1/{}", self.base_url, table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn insert_entry(&self, entry: &PlateEntry) -> Result<PlateEntry, StoreError> {
        let request = self
            .request(Method::POST, PLATE_ENTRIES)
            .header("Prefer", "return=representation")
            .json(entry);
        let rows: Vec<PlateEntry> = send_json(request).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::Decode("insert returned no rows".to_string()))
    }

    async fn rate_records(&self) -> Result<Vec<RateRecord>, StoreError> {
        let request = self
            .request(Method::GET, RATES)
            .query(&[("select", "meal_type,rate")]);
        send_json(request).await
    }
}

async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, StoreError> {
    let response = request.send().await?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(StoreError::Remote { status, body });
    }

    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| StoreError::Decode(e.to_string()))
}

#[async_trait]
impl LogStore for RemoteStore {
    async fn add_entry(&self, entry: NewPlateEntry) -> Result<PlateEntry, StoreError> {
        self.insert_entry(&entry.into_entry()).await
    }

    async fn entries_by_date(&self, date: NaiveDate) -> Result<Vec<PlateEntry>, StoreError> {
        let request = self.request(Method::GET, PLATE_ENTRIES).query(&[
            ("select", "*".to_string()),
            ("date", format!("eq.{}", date)),
            ("order", "time.asc,created_at.asc".to_string()),
        ]);
        send_json(request).await
    }

    async fn entries_by_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PlateEntry>, StoreError> {
        let request = self.request(Method::GET, PLATE_ENTRIES).query(&[
            ("select", "*".to_string()),
            ("date", format!("gte.{}", start)),
            ("date", format!("lte.{}", end)),
            ("order", "date.asc,time.asc,created_at.asc".to_string()),
        ]);
        send_json(request).await
    }

    async fn update_entry(&self, id: &str, update: &EntryUpdate) -> Result<bool, StoreError> {
        let request = self
            .request(Method::PATCH, PLATE_ENTRIES)
            .query(&[("id", format!("eq.{}", id))])
            .header("Prefer", "return=representation")
            .json(update);
        let rows: Vec<PlateEntry> = send_json(request).await?;
        Ok(!rows.is_empty())
    }

    async fn delete_entry(&self, id: &str) -> Result<bool, StoreError> {
        let request = self
            .request(Method::DELETE, PLATE_ENTRIES)
            .query(&[("id", format!("eq.{}", id))])
            .header("Prefer", "return=representation");
        let rows: Vec<PlateEntry> = send_json(request).await?;
        Ok(!rows.is_empty())
    }
}

#[async_trait]
impl RateStore for RemoteStore {
    /// The hosted table has no catering column, so that value stays at its default.
    async fn load_rates(&self) -> Result<Rates, StoreError> {
        let mut rates = Rates::default();
        for record in self.rate_records().await? {
            rates.meals.set_rate(record.meal_type, record.rate);
        }
        Ok(rates)
    }

    async fn save_rates(&self, rates: &Rates) -> Result<bool, StoreError> {
        let records: Vec<RateRecord> = MealType::ALL
            .iter()
            .map(|meal| RateRecord {
                meal_type: *meal,
                rate: rates.meals.rate(*meal),
            })
            .collect();
        let request = self
            .request(Method::POST, RATES)
            .query(&[("on_conflict", "meal_type")])
            .header("Prefer", "resolution=merge-duplicates")
            .json(&records);
        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Remote { status, body });
        }
        Ok(true)
    }
}
