pub mod types;

pub use types::*;

use chrono::NaiveDate;
use serde::Serialize;

use crate::api::types::CardsData;
use crate::error::{Error, Result};

/// Upper bound on the "recent days" display list.
pub const RECENT_DAYS_LIMIT: usize = 7;

const TODAY_PRIORITY: i32 = 1000;
const WORK_DAY_PRIORITY: i32 = 100;

/// Everything the dashboard view needs for one range: the raw per-day
/// records, the derived statistics, the goal cards, and the current streak.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardData {
    pub entries_days: Vec<EntryDay>,
    pub stats: DashboardStats,
    pub cards: CardsData,
    pub streak: i64,
}

/// Derive dashboard statistics from the backend's per-day records.
///
/// Future days are dropped; a record for `today` is synthesized when the
/// backend has not reported one yet, so today is always represented. The
/// recent-days list orders today first, then configured working days, then
/// the rest, most recent first within each tier. Totals are computed over the
/// whole filtered set, not the visible seven.
///
/// An unparsable `day` string fails the whole call: silently dropping a
/// record would corrupt `missing_days` and `total_hours` invisibly.
pub fn compute_stats(
    days: &[EntryDay],
    work_days: &[WeekDay],
    today: NaiveDate,
) -> Result<DashboardStats> {
    let mut dated: Vec<(NaiveDate, EntryDay)> = Vec::with_capacity(days.len() + 1);
    for record in days {
        let date = NaiveDate::parse_from_str(&record.day, "%Y-%m-%d")
            .map_err(|_| Error::InvalidDateRecord(record.day.clone()))?;
        if date <= today {
            dated.push((date, record.clone()));
        }
    }

    if !dated.iter().any(|(date, _)| *date == today) {
        dated.push((
            today,
            EntryDay {
                day: today.format("%Y-%m-%d").to_string(),
                daily_duration: None,
                have_entries: false,
            },
        ));
    }

    let missing_days = dated.iter().filter(|(_, d)| !d.have_entries).count() as u32;
    let total_hours = dated
        .iter()
        .map(|(_, d)| d.daily_duration.unwrap_or(0))
        .sum::<i64>() as f64
        / 3600.0;

    let priority = |date: NaiveDate| -> i32 {
        if date == today {
            TODAY_PRIORITY
        } else if work_days.contains(&WeekDay::of(date)) {
            WORK_DAY_PRIORITY
        } else {
            0
        }
    };

    dated.sort_by(|a, b| priority(b.0).cmp(&priority(a.0)).then(b.0.cmp(&a.0)));

    let mut recent: Vec<(NaiveDate, EntryDay)> =
        dated.iter().take(RECENT_DAYS_LIMIT).cloned().collect();

    // Today must always be visible. The sort puts it first, but keep the
    // explicit correction: a record can only enter the list here, never push
    // the count past the limit.
    if !recent.iter().any(|(date, _)| *date == today) {
        if let Some(today_record) = dated.iter().find(|(date, _)| *date == today).cloned() {
            recent.truncate(RECENT_DAYS_LIMIT - 1);
            recent.insert(0, today_record);
        }
    }

    Ok(DashboardStats {
        missing_days,
        total_hours,
        recent_days: recent.into_iter().map(|(_, d)| d).collect(),
    })
}
