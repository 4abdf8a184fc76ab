use std::path::PathBuf;

use anyhow::Result;
use chrono::Datelike;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use bhojnalay::commands::entries::{self, AddEntryPayload, UpdateEntryPayload};
use bhojnalay::commands::reports::{self, SetCellPayload};
use bhojnalay::commands::settings::{self, RatesPayload};
use bhojnalay::models::Settings;
use bhojnalay::services::state::AppState;
use bhojnalay::utils::today;

#[derive(Parser)]
#[command(name = "bhojnalay")]
#[command(about = "Plate-count tracking and reports for the dining hall")]
struct Cli {
    /// Path of the local SQLite database
    #[arg(long, global = true, env = "BHOJNALAY_DB", default_value = "bhojnalay.sqlite")]
    db: PathBuf,

    /// Base URL of the hosted backend; the local database alone is used when unset
    #[arg(long, global = true, env = "SUPABASE_URL")]
    supabase_url: Option<String>,

    /// API key of the hosted backend
    #[arg(long, global = true, env = "SUPABASE_ANON_KEY", hide_env_values = true)]
    supabase_key: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log, list, edit and delete plate entries
    Entry {
        #[command(subcommand)]
        action: EntryCommand,
    },
    /// Totals and amounts for one day
    Summary {
        #[arg(long)]
        date: Option<String>,
    },
    /// Totals and amounts for a date range
    Report {
        #[command(flatten)]
        range: RangeArgs,
    },
    /// Write the range report to an XLSX file
    Export {
        #[command(flatten)]
        range: RangeArgs,
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Set one summary cell to a new total, rewriting the log to match
    SetCell {
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        category: String,
        #[arg(long = "meal")]
        meal_type: Option<String>,
        #[arg(long)]
        target: i64,
    },
    /// Set the catering headcount for a day
    SetCatering {
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        target: i64,
    },
    /// Show or change the global rate table
    Rates {
        #[command(subcommand)]
        action: RatesCommand,
    },
    /// Show or change per-day rates for the special category
    SpecialRates {
        #[command(subcommand)]
        action: SpecialRatesCommand,
    },
}

#[derive(Subcommand)]
enum EntryCommand {
    Add {
        #[arg(long)]
        date: Option<String>,
        /// HH:MM, defaults to now
        #[arg(long)]
        time: Option<String>,
        #[arg(long)]
        category: String,
        #[arg(long = "meal")]
        meal_type: Option<String>,
        #[arg(long)]
        count: i64,
    },
    List {
        #[arg(long)]
        date: Option<String>,
    },
    Update {
        id: String,
        #[arg(long)]
        category: Option<String>,
        #[arg(long = "meal")]
        meal_type: Option<String>,
        #[arg(long)]
        count: Option<i64>,
    },
    Delete {
        id: String,
    },
}

#[derive(Subcommand)]
enum RatesCommand {
    Show,
    Set {
        #[command(flatten)]
        rates: RateArgs,
        #[arg(long)]
        catering_default: Option<i64>,
    },
}

#[derive(Subcommand)]
enum SpecialRatesCommand {
    Show {
        #[arg(long)]
        date: Option<String>,
    },
    Set {
        #[arg(long)]
        date: Option<String>,
        #[command(flatten)]
        rates: RateArgs,
    },
    List {
        #[command(flatten)]
        range: RangeArgs,
    },
}

#[derive(Args)]
struct RangeArgs {
    /// First day, defaults to the first of the current month
    #[arg(long)]
    from: Option<String>,
    /// Last day, defaults to today
    #[arg(long)]
    to: Option<String>,
}

impl RangeArgs {
    fn resolve(self) -> (String, String) {
        let now = today();
        let first = now.with_day(1).unwrap_or(now);
        (
            self.from.unwrap_or_else(|| first.to_string()),
            self.to.unwrap_or_else(|| now.to_string()),
        )
    }
}

#[derive(Args)]
struct RateArgs {
    #[arg(long)]
    navkarshi: Option<f64>,
    #[arg(long)]
    lunch: Option<f64>,
    #[arg(long)]
    chovihar: Option<f64>,
    #[arg(long)]
    tea_coffee: Option<f64>,
    #[arg(long)]
    parcel: Option<f64>,
}

impl RateArgs {
    fn into_payload(self, catering_staff_default: Option<i64>) -> RatesPayload {
        RatesPayload {
            navkarshi: self.navkarshi,
            lunch: self.lunch,
            chovihar: self.chovihar,
            tea_coffee: self.tea_coffee,
            parcel: self.parcel,
            catering_staff_default,
        }
    }
}

fn day_or_today(date: Option<String>) -> String {
    date.unwrap_or_else(|| today().to_string())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("bhojnalay=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Settings::new(cli.db, cli.supabase_url, cli.supabase_key);
    let state = AppState::new(config)?;

    match cli.command {
        Command::Entry { action } => run_entry(&state, action).await,
        Command::Summary { date } => {
            print_json(&reports::get_day_summary(&state, &day_or_today(date)).await?)
        }
        Command::Report { range } => {
            let (from, to) = range.resolve();
            print_json(&reports::get_report(&state, &from, &to).await?)
        }
        Command::Export { range, output } => {
            let (from, to) = range.resolve();
            let path = reports::export_report(&state, &from, &to, output).await?;
            print_json(&path)
        }
        Command::SetCell {
            date,
            category,
            meal_type,
            target,
        } => {
            let payload = SetCellPayload {
                date: day_or_today(date),
                category,
                meal_type,
                target,
            };
            print_json(&reports::set_cell(&state, payload).await?)
        }
        Command::SetCatering { date, target } => {
            print_json(&reports::set_catering(&state, &day_or_today(date), target).await?)
        }
        Command::Rates { action } => match action {
            RatesCommand::Show => print_json(&settings::get_rates(&state).await?),
            RatesCommand::Set {
                rates,
                catering_default,
            } => {
                let payload = rates.into_payload(catering_default);
                print_json(&settings::save_rates(&state, payload).await?)
            }
        },
        Command::SpecialRates { action } => match action {
            SpecialRatesCommand::Show { date } => {
                print_json(&settings::get_special_rates(&state, &day_or_today(date)).await?)
            }
            SpecialRatesCommand::Set { date, rates } => {
                let payload = rates.into_payload(None);
                print_json(
                    &settings::save_special_rates(&state, &day_or_today(date), payload).await?,
                )
            }
            SpecialRatesCommand::List { range } => {
                let (from, to) = range.resolve();
                print_json(&settings::list_special_rates(&state, &from, &to).await?)
            }
        },
    }
}

async fn run_entry(state: &AppState, action: EntryCommand) -> Result<()> {
    match action {
        EntryCommand::Add {
            date,
            time,
            category,
            meal_type,
            count,
        } => {
            let payload = AddEntryPayload {
                date: day_or_today(date),
                time,
                category,
                meal_type,
                count,
            };
            print_json(&entries::add_entry(state, payload).await?)
        }
        EntryCommand::List { date } => {
            print_json(&entries::list_entries(state, &day_or_today(date)).await?)
        }
        EntryCommand::Update {
            id,
            category,
            meal_type,
            count,
        } => {
            let payload = UpdateEntryPayload {
                id,
                category,
                meal_type,
                count,
            };
            entries::update_entry(state, payload).await?;
            print_json(&true)
        }
        EntryCommand::Delete { id } => {
            entries::delete_entry(state, &id).await?;
            print_json(&true)
        }
    }
}
