//! Rewrites log entries so that one summary cell matches an edited total.
//!
//! Growth is always appended as a single new entry. A decrease consumes the
//! existing entries of the cell in stored order: whole entries are deleted while
//! they fit in the remaining reduction, and the first entry that does not fit is
//! shrunk. Updates and deletes are issued one at a time. A step the store reports
//! as not applied is counted in `ReconcileOutcome::unapplied`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::{Category, EntryUpdate, MealType, NewPlateEntry, PlateEntry, ReconcileOutcome};
use crate::services::aggregator::cell_total;
use crate::services::store::{LogStore, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRef {
    pub date: NaiveDate,
    pub category: Category,
    pub meal_type: MealType,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReductionPlan {
    pub deletes: Vec<String>,
    /// Entry id and its new count.
    pub updates: Vec<(String, u32)>,
    /// Part of the reduction the entries could not absorb.
    pub shortfall: u32,
}

pub fn plan_reduction(entries: &[PlateEntry], reduction: u32) -> ReductionPlan {
    let mut plan = ReductionPlan::default();
    let mut remaining = reduction;

    for entry in entries {
        if remaining == 0 {
            break;
        }
        if entry.count <= remaining {
            remaining -= entry.count;
            plan.deletes.push(entry.id.clone());
        } else {
            plan.updates.push((entry.id.clone(), entry.count - remaining));
            remaining = 0;
        }
    }

    plan.shortfall = remaining;
    plan
}

fn matches_cell(entry: &PlateEntry, cell: &CellRef) -> bool {
    entry.date == cell.date && entry.category == cell.category && entry.meal_type == cell.meal_type
}

fn count_of(entries: &[PlateEntry], id: &str) -> u32 {
    entries
        .iter()
        .find(|entry| entry.id == id)
        .map_or(0, |entry| entry.count)
}

fn warn_if_off_target(outcome: &ReconcileOutcome) {
    if outcome.shortfall > 0 {
        warn!(
            date = %outcome.date,
            category = %outcome.category,
            meal_type = ?outcome.meal_type,
            shortfall = outcome.shortfall,
            "Reduction exceeded logged entries"
        );
    }
    if outcome.unapplied > 0 {
        warn!(
            date = %outcome.date,
            category = %outcome.category,
            meal_type = ?outcome.meal_type,
            unapplied = outcome.unapplied,
            "Store did not apply every step, cell is off target"
        );
    }
}

pub async fn reconcile_cell<S>(
    store: &S,
    cell: CellRef,
    target: u32,
    time: &str,
) -> Result<ReconcileOutcome, StoreError>
where
    S: LogStore + ?Sized,
{
    if cell.category == Category::Catering {
        return reconcile_catering(store, cell.date, target, time).await;
    }

    let entries: Vec<PlateEntry> = store
        .entries_by_date(cell.date)
        .await?
        .into_iter()
        .filter(|entry| matches_cell(entry, &cell))
        .collect();
    let current = cell_total(&entries, cell.category, cell.meal_type);

    let mut outcome = ReconcileOutcome {
        date: cell.date,
        category: cell.category,
        meal_type: Some(cell.meal_type),
        previous: current,
        target,
        created: None,
        updated: Vec::new(),
        deleted: Vec::new(),
        shortfall: 0,
        unapplied: 0,
    };

    if target > current {
        let created = store
            .add_entry(NewPlateEntry {
                date: cell.date,
                time: time.to_string(),
                category: cell.category,
                meal_type: cell.meal_type,
                count: target - current,
            })
            .await?;
        debug!(entry_id = %created.id, count = created.count, "Added entry for cell increase");
        outcome.created = Some(created);
    } else if target < current {
        let plan = plan_reduction(&entries, current - target);
        for id in plan.deletes {
            if store.delete_entry(&id).await? {
                outcome.deleted.push(id);
            } else {
                outcome.unapplied = outcome.unapplied.saturating_add(count_of(&entries, &id));
            }
        }
        for (id, count) in plan.updates {
            if store.update_entry(&id, &EntryUpdate::count(count)).await? {
                outcome.updated.push(id);
            } else {
                let missed = count_of(&entries, &id).saturating_sub(count);
                outcome.unapplied = outcome.unapplied.saturating_add(missed);
            }
        }
        outcome.shortfall = plan.shortfall;
    }

    warn_if_off_target(&outcome);
    Ok(outcome)
}

/// Catering has no meal breakdown: the first entry of the date is set to the
/// target and any further catering entries of that date are removed.
pub async fn reconcile_catering<S>(
    store: &S,
    date: NaiveDate,
    target: u32,
    time: &str,
) -> Result<ReconcileOutcome, StoreError>
where
    S: LogStore + ?Sized,
{
    let entries: Vec<PlateEntry> = store
        .entries_by_date(date)
        .await?
        .into_iter()
        .filter(|entry| entry.category == Category::Catering)
        .collect();
    let current = cell_total(&entries, Category::Catering, MealType::CATERING_PLACEHOLDER);

    let mut outcome = ReconcileOutcome {
        date,
        category: Category::Catering,
        meal_type: None,
        previous: current,
        target,
        created: None,
        updated: Vec::new(),
        deleted: Vec::new(),
        shortfall: 0,
        unapplied: 0,
    };

    match entries.split_first() {
        None => {
            if target > 0 {
                let created = store
                    .add_entry(NewPlateEntry {
                        date,
                        time: time.to_string(),
                        category: Category::Catering,
                        meal_type: MealType::CATERING_PLACEHOLDER,
                        count: target,
                    })
                    .await?;
                outcome.created = Some(created);
            }
        }
        Some((first, rest)) => {
            if first.count != target {
                let update = EntryUpdate::count(target);
                if store.update_entry(&first.id, &update).await? {
                    outcome.updated.push(first.id.clone());
                } else {
                    outcome.unapplied = first.count.abs_diff(target);
                }
            }
            for extra in rest {
                if store.delete_entry(&extra.id).await? {
                    outcome.deleted.push(extra.id.clone());
                } else {
                    outcome.unapplied = outcome.unapplied.saturating_add(extra.count);
                }
            }
        }
    }

    warn_if_off_target(&outcome);
    Ok(outcome)
}
