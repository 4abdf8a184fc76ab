use anyhow::{anyhow, Result};
use chrono::{Local, NaiveDate, NaiveTime, Utc};

pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

pub fn current_time_hhmm() -> String {
    Local::now().format("%H:%M").to_string()
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|e| anyhow!("Invalid date '{}': {}", value, e))
}

/// Accepts `HH:MM` or `HH:MM:SS` and returns `HH:MM`.
pub fn normalize_time(value: &str) -> Result<String> {
    let raw = value.trim();
    let formats = ["%H:%M", "%H:%M:%S"];
    for fmt in formats.iter() {
        if let Ok(time) = NaiveTime::parse_from_str(raw, fmt) {
            return Ok(time.format("%H:%M").to_string());
        }
    }
    Err(anyhow!("Invalid time '{}', expected HH:MM", value))
}

pub fn validate_rate(name: &str, value: f64) -> Result<f64> {
    if !value.is_finite() || value < 0.0 {
        return Err(anyhow!("Rate for {} must be a non-negative number", name));
    }
    Ok(value)
}

/// Largest count accepted for a single entry, cell target or catering default.
pub const MAX_COUNT: u32 = 100_000;

/// Logged and edited counts must be positive; reconciliation targets may be zero.
pub fn validate_count(value: i64, allow_zero: bool) -> Result<u32> {
    let minimum = if allow_zero { 0 } else { 1 };
    if value < minimum {
        return Err(anyhow!("Count must be at least {}, got {}", minimum, value));
    }
    if value > i64::from(MAX_COUNT) {
        return Err(anyhow!("Count {} is above the limit of {}", value, MAX_COUNT));
    }
    Ok(value as u32)
}

pub fn validate_range(start: NaiveDate, end: NaiveDate) -> Result<()> {
    if start > end {
        return Err(anyhow!("Start date {} is after end date {}", start, end));
    }
    Ok(())
}

pub fn report_filename(start: NaiveDate, end: NaiveDate) -> String {
    format!("bhojnalay_{}_to_{}.xlsx", start, end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_times() {
        assert_eq!(normalize_time("07:05").unwrap(), "07:05");
        assert_eq!(normalize_time("13:45:59").unwrap(), "13:45");
        assert!(normalize_time("25:00").is_err());
        assert!(normalize_time("noon").is_err());
    }

    #[test]
    fn parses_dates() {
        assert_eq!(
            parse_date("2024-03-09").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
        );
        assert!(parse_date("09.03.2024").is_err());
    }

    #[test]
    fn validates_counts() {
        assert_eq!(validate_count(3, false).unwrap(), 3);
        assert!(validate_count(0, false).is_err());
        assert_eq!(validate_count(0, true).unwrap(), 0);
        assert!(validate_count(-2, true).is_err());
        assert_eq!(validate_count(i64::from(MAX_COUNT), false).unwrap(), MAX_COUNT);
        assert!(validate_count(i64::from(MAX_COUNT) + 1, true).is_err());
        assert!(validate_count(3_000_000_000, false).is_err());
        assert!(validate_count(i64::MAX, true).is_err());
    }

    #[test]
    fn rejects_bad_rates_and_ranges() {
        assert!(validate_rate("lunch", -1.0).is_err());
        assert!(validate_rate("lunch", f64::NAN).is_err());
        assert_eq!(validate_rate("lunch", 0.0).unwrap(), 0.0);

        let a = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let b = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!(validate_range(a, b).is_err());
        assert!(validate_range(b, a).is_ok());
        assert_eq!(report_filename(b, a), "bhojnalay_2024-01-01_to_2024-01-02.xlsx");
    }
}
