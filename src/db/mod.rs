use chrono::NaiveDate;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, OptionalExtension, Result as SqlResult, Row};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::models::{
    Category, EntryUpdate, MealRates, MealType, PlateEntry, Rates, SpecialDailyRates,
};

const CATERING_DEFAULT_KEY: &str = "catering_staff_default";

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn new(db_path: PathBuf) -> SqlResult<Self> {
        let conn = Connection::open(db_path)?;
        Self::from_connection(conn)
    }

    pub fn in_memory() -> SqlResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> SqlResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let mut db = Database { conn };
        db.run_migrations()?;
        Ok(db)
    }

    fn run_migrations(&mut self) -> SqlResult<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                name TEXT PRIMARY KEY,
                applied_at TEXT NOT NULL
            );",
        )?;

        let migrations = vec![
            (
                "001_create_plate_entries.sql",
                include_str!(concat!(
                    env!("CARGO_MANIFEST_DIR"),
                    "/migrations/001_create_plate_entries.sql"
                )),
            ),
            (
                "002_create_rates.sql",
                include_str!(concat!(
                    env!("CARGO_MANIFEST_DIR"),
                    "/migrations/002_create_rates.sql"
                )),
            ),
            (
                "003_create_special_daily_rates.sql",
                include_str!(concat!(
                    env!("CARGO_MANIFEST_DIR"),
                    "/migrations/003_create_special_daily_rates.sql"
                )),
            ),
        ];

        for (name, sql) in migrations {
            let applied: Option<String> = self
                .conn
                .query_row(
                    "SELECT name FROM schema_migrations WHERE name = ?1",
                    params![name],
                    |row| row.get(0),
                )
                .optional()?;

            if applied.is_none() {
                let tx = self.conn.transaction()?;
                tx.execute_batch(sql)?;
                tx.execute(
                    "INSERT INTO schema_migrations (name, applied_at) VALUES (?1, datetime('now'))",
                    params![name],
                )?;
                tx.commit()?;
            }
        }

        Ok(())
    }

    pub fn insert_entry(&self, entry: &PlateEntry) -> SqlResult<()> {
        self.conn.execute(
            "INSERT INTO plate_entries (id, date, time, category, meal_type, count, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                entry.id,
                entry.date,
                entry.time,
                entry.category,
                entry.meal_type,
                entry.count,
                entry.created_at
            ],
        )?;
        Ok(())
    }

    pub fn get_entries_by_date(&self, date: NaiveDate) -> SqlResult<Vec<PlateEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, date, time, category, meal_type, count, created_at
             FROM plate_entries
             WHERE date = ?1
             ORDER BY time ASC, rowid ASC",
        )?;
        let rows = stmt.query_map(params![date], entry_from_row)?;
        rows.collect()
    }

    pub fn get_entries_by_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> SqlResult<Vec<PlateEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, date, time, category, meal_type, count, created_at
             FROM plate_entries
             WHERE date >= ?1 AND date <= ?2
             ORDER BY date ASC, time ASC, rowid ASC",
        )?;
        let rows = stmt.query_map(params![start, end], entry_from_row)?;
        rows.collect()
    }

    pub fn update_entry(&self, id: &str, update: &EntryUpdate) -> SqlResult<bool> {
        let changed = self.conn.execute(
            "UPDATE plate_entries
             SET category = COALESCE(?2, category),
                 meal_type = COALESCE(?3, meal_type),
                 count = COALESCE(?4, count)
             WHERE id = ?1",
            params![id, update.category, update.meal_type, update.count],
        )?;
        Ok(changed > 0)
    }

    pub fn delete_entry(&self, id: &str) -> SqlResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM plate_entries WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    pub fn get_rates(&self) -> SqlResult<Rates> {
        let mut rates = Rates::default();

        let mut stmt = self.conn.prepare("SELECT meal_type, rate FROM rates")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, MealType>(0)?, row.get::<_, f64>(1)?))
        })?;
        for row in rows {
            let (meal, rate) = row?;
            rates.meals.set_rate(meal, rate);
        }

        if let Some(value) = self.get_setting(CATERING_DEFAULT_KEY)? {
            if let Ok(parsed) = value.parse::<u32>() {
                rates.catering_staff_default = parsed;
            }
        }

        Ok(rates)
    }

    pub fn save_rates(&mut self, rates: &Rates) -> SqlResult<()> {
        let tx = self.conn.transaction()?;
        for meal in MealType::ALL {
            tx.execute(
                "INSERT OR REPLACE INTO rates (meal_type, rate, updated_at)
                 VALUES (?1, ?2, datetime('now'))",
                params![meal, rates.meals.rate(meal)],
            )?;
        }
        tx.execute(
            "INSERT OR REPLACE INTO settings (key, value, updated_at)
             VALUES (?1, ?2, datetime('now'))",
            params![CATERING_DEFAULT_KEY, rates.catering_staff_default.to_string()],
        )?;
        tx.commit()
    }

    pub fn get_special_rates(&self, date: NaiveDate) -> SqlResult<Option<SpecialDailyRates>> {
        let mut stmt = self.conn.prepare(
            "SELECT date, navkarshi, lunch, chovihar, tea_coffee, parcel
             FROM special_daily_rates WHERE date = ?1",
        )?;
        stmt.query_row(params![date], special_rates_from_row).optional()
    }

    pub fn save_special_rates(&self, date: NaiveDate, rates: &MealRates) -> SqlResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO special_daily_rates
                (date, navkarshi, lunch, chovihar, tea_coffee, parcel, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, datetime('now'))",
            params![
                date,
                rates.navkarshi,
                rates.lunch,
                rates.chovihar,
                rates.tea_coffee,
                rates.parcel
            ],
        )?;
        Ok(())
    }

    pub fn get_special_rates_by_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> SqlResult<BTreeMap<NaiveDate, SpecialDailyRates>> {
        let mut stmt = self.conn.prepare(
            "SELECT date, navkarshi, lunch, chovihar, tea_coffee, parcel
             FROM special_daily_rates
             WHERE date >= ?1 AND date <= ?2
             ORDER BY date ASC",
        )?;
        let rows = stmt.query_map(params![start, end], special_rates_from_row)?;
        rows.map(|row| row.map(|rates| (rates.date, rates))).collect()
    }

    pub fn get_setting(&self, key: &str) -> SqlResult<Option<String>> {
        let mut stmt = self.conn.prepare("SELECT value FROM settings WHERE key = ?1")?;
        stmt.query_row(params![key], |row| row.get(0)).optional()
    }
}

fn entry_from_row(row: &Row<'_>) -> SqlResult<PlateEntry> {
    Ok(PlateEntry {
        id: row.get(0)?,
        date: row.get(1)?,
        time: row.get(2)?,
        category: row.get(3)?,
        meal_type: row.get(4)?,
        count: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn special_rates_from_row(row: &Row<'_>) -> SqlResult<SpecialDailyRates> {
    Ok(SpecialDailyRates {
        date: row.get(0)?,
        rates: MealRates {
            navkarshi: row.get(1)?,
            lunch: row.get(2)?,
            chovihar: row.get(3)?,
            tea_coffee: row.get(4)?,
            parcel: row.get(5)?,
        },
    })
}

impl ToSql for Category {
    fn to_sql(&self) -> SqlResult<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Category {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: anyhow::Error| FromSqlError::Other(e.into()))
    }
}

impl ToSql for MealType {
    fn to_sql(&self) -> SqlResult<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for MealType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: anyhow::Error| FromSqlError::Other(e.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn entry(id: &str, date: NaiveDate, time: &str, count: u32) -> PlateEntry {
        PlateEntry {
            id: id.to_string(),
            date,
            time: time.to_string(),
            category: Category::Guest,
            meal_type: MealType::Lunch,
            count,
            created_at: "2024-05-01T00:00:00+00:00".to_string(),
        }
    }

    #[test]
    fn orders_entries_by_time_then_insertion() {
        let db = Database::in_memory().unwrap();
        db.insert_entry(&entry("b", day(1), "12:30", 2)).unwrap();
        db.insert_entry(&entry("a", day(1), "08:00", 1)).unwrap();
        db.insert_entry(&entry("c", day(1), "12:30", 3)).unwrap();
        db.insert_entry(&entry("z", day(2), "07:00", 9)).unwrap();

        let ids: Vec<String> = db
            .get_entries_by_date(day(1))
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);

        let range = db.get_entries_by_range(day(1), day(2)).unwrap();
        assert_eq!(range.len(), 4);
        assert_eq!(range.last().unwrap().id, "z");
        assert!(db.get_entries_by_range(day(3), day(9)).unwrap().is_empty());
    }

    #[test]
    fn partial_update_and_delete() {
        let db = Database::in_memory().unwrap();
        db.insert_entry(&entry("a", day(1), "08:00", 4)).unwrap();

        let update = EntryUpdate {
            meal_type: Some(MealType::Parcel),
            ..EntryUpdate::default()
        };
        assert!(db.update_entry("a", &update).unwrap());
        let stored = db.get_entries_by_date(day(1)).unwrap().remove(0);
        assert_eq!(stored.meal_type, MealType::Parcel);
        assert_eq!(stored.count, 4);
        assert_eq!(stored.category, Category::Guest);

        assert!(!db.update_entry("missing", &EntryUpdate::count(1)).unwrap());
        assert!(db.delete_entry("a").unwrap());
        assert!(!db.delete_entry("a").unwrap());
    }

    #[test]
    fn rates_default_until_saved() {
        let mut db = Database::in_memory().unwrap();
        assert_eq!(db.get_rates().unwrap(), Rates::default());

        let mut rates = Rates::default();
        rates.meals.lunch = 120.0;
        rates.catering_staff_default = 14;
        db.save_rates(&rates).unwrap();
        assert_eq!(db.get_rates().unwrap(), rates);
    }

    #[test]
    fn special_rates_by_date_and_range() {
        let db = Database::in_memory().unwrap();
        assert!(db.get_special_rates(day(3)).unwrap().is_none());

        let rates = MealRates {
            lunch: 75.0,
            ..MealRates::default()
        };
        db.save_special_rates(day(3), &rates).unwrap();
        db.save_special_rates(day(8), &rates).unwrap();

        let stored = db.get_special_rates(day(3)).unwrap().unwrap();
        assert_eq!(stored.rates.lunch, 75.0);
        let range = db.get_special_rates_by_range(day(1), day(5)).unwrap();
        assert_eq!(range.keys().copied().collect::<Vec<_>>(), vec![day(3)]);
    }
}
