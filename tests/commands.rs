use bhojnalay::commands::entries::{self, AddEntryPayload, UpdateEntryPayload};
use bhojnalay::commands::reports::{self, SetCellPayload};
use bhojnalay::commands::settings::{self, RatesPayload};
use bhojnalay::models::{Category, MealType, Settings};
use bhojnalay::services::state::AppState;

fn state(dir: &tempfile::TempDir) -> AppState {
    AppState::new(Settings::new(dir.path().join("data/plates.sqlite"), None, None)).unwrap()
}

fn add(category: &str, meal: Option<&str>, count: i64, time: &str) -> AddEntryPayload {
    AddEntryPayload {
        date: "2024-11-05".to_string(),
        time: Some(time.to_string()),
        category: category.to_string(),
        meal_type: meal.map(str::to_string),
        count,
    }
}

#[tokio::test]
async fn logging_and_day_summary() {
    let dir = tempfile::tempdir().unwrap();
    let state = state(&dir);

    entries::add_entry(&state, add("guest", Some("navkarshi"), 2, "07:30")).await.unwrap();
    entries::add_entry(&state, add("guest", Some("lunch"), 1, "12:15")).await.unwrap();
    entries::add_entry(&state, add("guest", Some("tea_coffee"), 3, "16:00")).await.unwrap();
    entries::add_entry(&state, add("staff", Some("lunch"), 8, "12:20")).await.unwrap();
    let catering = entries::add_entry(&state, add("catering", None, 4, "11:00")).await.unwrap();
    assert_eq!(catering.meal_type, MealType::CATERING_PLACEHOLDER);

    let listed = entries::list_entries(&state, "2024-11-05").await.unwrap();
    let times: Vec<&str> = listed.iter().map(|e| e.time.as_str()).collect();
    assert_eq!(times, vec!["07:30", "11:00", "12:15", "12:20", "16:00"]);

    let day = reports::get_day_summary(&state, "2024-11-05").await.unwrap();
    assert_eq!(day.guest.plates, 3);
    assert_eq!(day.guest.tea, 3);
    assert_eq!(day.guest_amount, 260.0);
    assert_eq!(day.staff.total, 8);
    assert_eq!(day.catering, 4);
    assert_eq!(day.grand_total, 6 + 8 + 4);
    assert_eq!(day.grand_amount, 260.0);
}

#[tokio::test]
async fn invalid_input_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let state = state(&dir);

    assert!(entries::add_entry(&state, add("guest", Some("lunch"), 0, "12:00")).await.is_err());
    assert!(entries::add_entry(&state, add("guest", Some("lunch"), -3, "12:00")).await.is_err());
    assert!(entries::add_entry(&state, add("guest", None, 2, "12:00")).await.is_err());
    let huge = add("guest", Some("lunch"), 3_000_000_000, "12:00");
    assert!(entries::add_entry(&state, huge).await.is_err());
    assert!(entries::add_entry(&state, add("visitor", Some("lunch"), 2, "12:00")).await.is_err());
    assert!(entries::add_entry(&state, add("guest", Some("lunch"), 2, "lunchtime")).await.is_err());
    let err = entries::list_entries(&state, "05/11/2024").await.unwrap_err();
    assert!(err.to_string().contains("Invalid date"));
    assert!(reports::get_report(&state, "2024-11-06", "2024-11-05").await.is_err());
    assert!(entries::delete_entry(&state, "missing").await.is_err());
}

#[tokio::test]
async fn editing_entries_and_cells() {
    let dir = tempfile::tempdir().unwrap();
    let state = state(&dir);

    let first = entries::add_entry(&state, add("guest", Some("lunch"), 3, "12:00")).await.unwrap();
    let second = entries::add_entry(&state, add("guest", Some("lunch"), 4, "12:30")).await.unwrap();

    let outcome = reports::set_cell(
        &state,
        SetCellPayload {
            date: "2024-11-05".to_string(),
            category: "guest".to_string(),
            meal_type: Some("lunch".to_string()),
            target: 3,
        },
    )
    .await
    .unwrap();
    assert_eq!(outcome.deleted, vec![first.id.clone()]);
    assert_eq!(outcome.updated, vec![second.id.clone()]);

    entries::update_entry(
        &state,
        UpdateEntryPayload {
            id: second.id.clone(),
            category: Some("special".to_string()),
            ..UpdateEntryPayload::default()
        },
    )
    .await
    .unwrap();
    let listed = entries::list_entries(&state, "2024-11-05").await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].category, Category::Special);
    assert_eq!(listed[0].count, 3);

    reports::set_catering(&state, "2024-11-05", 15).await.unwrap();
    let day = reports::get_day_summary(&state, "2024-11-05").await.unwrap();
    assert_eq!(day.catering, 15);
    assert_eq!(day.special_amount, 0.0);
}

#[tokio::test]
async fn rates_and_range_report() {
    let dir = tempfile::tempdir().unwrap();
    let state = state(&dir);

    let rates = settings::save_rates(
        &state,
        RatesPayload {
            lunch: Some(120.0),
            catering_staff_default: Some(6),
            ..RatesPayload::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(rates.meals.lunch, 120.0);
    assert_eq!(rates.meals.navkarshi, 50.0);
    assert_eq!(settings::get_rates(&state).await.unwrap(), rates);
    assert!(settings::save_rates(
        &state,
        RatesPayload {
            parcel: Some(-5.0),
            ..RatesPayload::default()
        },
    )
    .await
    .is_err());

    settings::save_special_rates(
        &state,
        "2024-11-06",
        RatesPayload {
            lunch: Some(70.0),
            ..RatesPayload::default()
        },
    )
    .await
    .unwrap();
    let special = settings::get_special_rates(&state, "2024-11-06").await.unwrap().unwrap();
    assert_eq!(special.rates.lunch, 70.0);
    assert_eq!(special.rates.navkarshi, 0.0);
    assert!(settings::get_special_rates(&state, "2024-11-05").await.unwrap().is_none());

    entries::add_entry(&state, add("guest", Some("lunch"), 2, "12:00")).await.unwrap();
    let mut next_day = add("special", Some("lunch"), 3, "12:00");
    next_day.date = "2024-11-06".to_string();
    entries::add_entry(&state, next_day).await.unwrap();

    let report = reports::get_report(&state, "2024-11-01", "2024-11-30").await.unwrap();
    assert_eq!(report.days.len(), 2);
    assert_eq!(report.guest.lunch, 2);
    assert_eq!(report.special.lunch, 3);
    assert_eq!(report.catering, 12);
    assert_eq!(report.guest_amount, 240.0);
    assert_eq!(report.special_amount, 210.0);
    assert_eq!(report.grand_amount, 450.0);

    let listed = settings::list_special_rates(&state, "2024-11-01", "2024-11-30").await.unwrap();
    assert_eq!(listed.len(), 1);

    let output = dir.path().join("november.xlsx");
    let path = reports::export_report(&state, "2024-11-01", "2024-11-30", Some(output.clone()))
        .await
        .unwrap();
    assert_eq!(path, output);
    assert!(output.exists());
    assert!(reports::export_report(&state, "2024-12-01", "2024-12-31", None).await.is_err());
}
