use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::anyhow;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::utils::now_rfc3339;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Guest,
    Staff,
    Sevak,
    Catering,
    Special,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Guest,
        Category::Staff,
        Category::Sevak,
        Category::Catering,
        Category::Special,
    ];

    /// Categories that carry a meal-type breakdown in a [`DailySummary`].
    pub const WITH_MEALS: [Category; 4] = [
        Category::Guest,
        Category::Staff,
        Category::Sevak,
        Category::Special,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Guest => "guest",
            Category::Staff => "staff",
            Category::Sevak => "sevak",
            Category::Catering => "catering",
            Category::Special => "special",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Guest => "Guest",
            Category::Staff => "Staff",
            Category::Sevak => "Sevak",
            Category::Catering => "Catering",
            Category::Special => "Special",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "guest" => Ok(Category::Guest),
            "staff" => Ok(Category::Staff),
            "sevak" => Ok(Category::Sevak),
            "catering" => Ok(Category::Catering),
            "special" => Ok(Category::Special),
            other => Err(anyhow!("Unknown category: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MealType {
    Navkarshi,
    Lunch,
    Chovihar,
    TeaCoffee,
    Parcel,
}

impl MealType {
    pub const ALL: [MealType; 5] = [
        MealType::Navkarshi,
        MealType::Lunch,
        MealType::Chovihar,
        MealType::TeaCoffee,
        MealType::Parcel,
    ];

    /// Stored on catering rows, which have no meal breakdown.
    pub const CATERING_PLACEHOLDER: MealType = MealType::Lunch;

    pub fn as_str(&self) -> &'static str {
        match self {
            MealType::Navkarshi => "navkarshi",
            MealType::Lunch => "lunch",
            MealType::Chovihar => "chovihar",
            MealType::TeaCoffee => "tea_coffee",
            MealType::Parcel => "parcel",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MealType::Navkarshi => "Navkarshi",
            MealType::Lunch => "Lunch",
            MealType::Chovihar => "Chovihar",
            MealType::TeaCoffee => "Tea/Coffee",
            MealType::Parcel => "Parcel",
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MealType {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "navkarshi" => Ok(MealType::Navkarshi),
            "lunch" => Ok(MealType::Lunch),
            "chovihar" => Ok(MealType::Chovihar),
            "tea_coffee" | "tea" => Ok(MealType::TeaCoffee),
            "parcel" => Ok(MealType::Parcel),
            other => Err(anyhow!("Unknown meal type: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlateEntry {
    pub id: String,
    pub date: NaiveDate,
    pub time: String,
    pub category: Category,
    pub meal_type: MealType,
    pub count: u32,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPlateEntry {
    pub date: NaiveDate,
    pub time: String,
    pub category: Category,
    pub meal_type: MealType,
    pub count: u32,
}

impl NewPlateEntry {
    pub fn into_entry(self) -> PlateEntry {
        PlateEntry {
            id: uuid::Uuid::new_v4().to_string(),
            date: self.date,
            time: self.time,
            category: self.category,
            meal_type: self.meal_type,
            count: self.count,
            created_at: now_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meal_type: Option<MealType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
}

impl EntryUpdate {
    pub fn count(count: u32) -> Self {
        EntryUpdate {
            count: Some(count),
            ..EntryUpdate::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.meal_type.is_none() && self.count.is_none()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealCounts {
    pub navkarshi: u32,
    pub lunch: u32,
    pub chovihar: u32,
    pub tea_coffee: u32,
    pub parcel: u32,
}

impl MealCounts {
    pub fn get(&self, meal: MealType) -> u32 {
        match meal {
            MealType::Navkarshi => self.navkarshi,
            MealType::Lunch => self.lunch,
            MealType::Chovihar => self.chovihar,
            MealType::TeaCoffee => self.tea_coffee,
            MealType::Parcel => self.parcel,
        }
    }

    pub fn add(&mut self, meal: MealType, count: u32) {
        let slot = match meal {
            MealType::Navkarshi => &mut self.navkarshi,
            MealType::Lunch => &mut self.lunch,
            MealType::Chovihar => &mut self.chovihar,
            MealType::TeaCoffee => &mut self.tea_coffee,
            MealType::Parcel => &mut self.parcel,
        };
        *slot = slot.saturating_add(count);
    }

    pub fn merge(&mut self, other: &MealCounts) {
        for meal in MealType::ALL {
            self.add(meal, other.get(meal));
        }
    }

    /// Solid meals only: tea/coffee is counted separately.
    pub fn plate_count(&self) -> u32 {
        self.navkarshi
            .saturating_add(self.lunch)
            .saturating_add(self.chovihar)
            .saturating_add(self.parcel)
    }

    pub fn tea_count(&self) -> u32 {
        self.tea_coffee
    }

    pub fn total(&self) -> u32 {
        self.plate_count().saturating_add(self.tea_count())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub guest: MealCounts,
    pub staff: MealCounts,
    pub sevak: MealCounts,
    pub special: MealCounts,
    pub catering: u32,
}

impl DailySummary {
    pub fn empty(date: NaiveDate) -> Self {
        DailySummary {
            date,
            guest: MealCounts::default(),
            staff: MealCounts::default(),
            sevak: MealCounts::default(),
            special: MealCounts::default(),
            catering: 0,
        }
    }

    pub fn counts(&self, category: Category) -> Option<&MealCounts> {
        match category {
            Category::Guest => Some(&self.guest),
            Category::Staff => Some(&self.staff),
            Category::Sevak => Some(&self.sevak),
            Category::Special => Some(&self.special),
            Category::Catering => None,
        }
    }

    pub fn counts_mut(&mut self, category: Category) -> Option<&mut MealCounts> {
        match category {
            Category::Guest => Some(&mut self.guest),
            Category::Staff => Some(&mut self.staff),
            Category::Sevak => Some(&mut self.sevak),
            Category::Special => Some(&mut self.special),
            Category::Catering => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MealRates {
    pub navkarshi: f64,
    pub lunch: f64,
    pub chovihar: f64,
    pub tea_coffee: f64,
    pub parcel: f64,
}

impl MealRates {
    pub fn rate(&self, meal: MealType) -> f64 {
        match meal {
            MealType::Navkarshi => self.navkarshi,
            MealType::Lunch => self.lunch,
            MealType::Chovihar => self.chovihar,
            MealType::TeaCoffee => self.tea_coffee,
            MealType::Parcel => self.parcel,
        }
    }

    pub fn set_rate(&mut self, meal: MealType, rate: f64) {
        match meal {
            MealType::Navkarshi => self.navkarshi = rate,
            MealType::Lunch => self.lunch = rate,
            MealType::Chovihar => self.chovihar = rate,
            MealType::TeaCoffee => self.tea_coffee = rate,
            MealType::Parcel => self.parcel = rate,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rates {
    #[serde(flatten)]
    pub meals: MealRates,
    pub catering_staff_default: u32,
}

impl Default for Rates {
    fn default() -> Self {
        Rates {
            meals: MealRates {
                navkarshi: 50.0,
                lunch: 100.0,
                chovihar: 50.0,
                tea_coffee: 20.0,
                parcel: 30.0,
            },
            catering_staff_default: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpecialDailyRates {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub rates: MealRates,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteSettings {
    pub url: String,
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub db_path: PathBuf,
    pub remote: Option<RemoteSettings>,
}

impl Settings {
    pub fn new(db_path: PathBuf, url: Option<String>, api_key: Option<String>) -> Self {
        let remote = match (url, api_key) {
            (Some(url), Some(api_key)) if !url.trim().is_empty() && !api_key.trim().is_empty() => {
                Some(RemoteSettings {
                    url: url.trim().trim_end_matches('/').to_string(),
                    api_key: api_key.trim().to_string(),
                })
            }
            _ => None,
        };
        Settings { db_path, remote }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotals {
    pub plates: u32,
    pub tea: u32,
    pub total: u32,
}

impl CategoryTotals {
    pub fn from_counts(counts: &MealCounts) -> Self {
        CategoryTotals {
            plates: counts.plate_count(),
            tea: counts.tea_count(),
            total: counts.total(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayReport {
    pub summary: DailySummary,
    pub guest: CategoryTotals,
    pub staff: CategoryTotals,
    pub sevak: CategoryTotals,
    pub special: CategoryTotals,
    pub catering: u32,
    pub grand_total: u32,
    pub guest_amount: f64,
    pub special_amount: f64,
    pub grand_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeReport {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub days: Vec<DayReport>,
    pub guest: MealCounts,
    pub staff: MealCounts,
    pub sevak: MealCounts,
    pub special: MealCounts,
    pub catering: u32,
    pub grand_total: u32,
    pub guest_amount: f64,
    pub special_amount: f64,
    pub grand_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconcileOutcome {
    pub date: NaiveDate,
    pub category: Category,
    pub meal_type: Option<MealType>,
    pub previous: u32,
    pub target: u32,
    pub created: Option<PlateEntry>,
    pub updated: Vec<String>,
    pub deleted: Vec<String>,
    pub shortfall: u32,
    /// Plates the store refused to add or remove; the cell is off target by this much.
    pub unapplied: u32,
}
