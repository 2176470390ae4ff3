use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Backend-reported aggregate for one calendar day within a range. The
/// backend pads the range with empty days, so `have_entries` distinguishes
/// logged days from gaps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryDay {
    /// ISO calendar date, "YYYY-MM-DD".
    pub day: String,
    /// Total logged seconds for the day, when any entry exists.
    pub daily_duration: Option<i64>,
    pub have_entries: bool,
}

/// Day-of-week name as the profile's working-days list spells it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekDay {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl WeekDay {
    /// Classify a calendar date by its local weekday.
    pub fn of(date: NaiveDate) -> Self {
        match date.weekday() {
            Weekday::Sun => WeekDay::Sunday,
            Weekday::Mon => WeekDay::Monday,
            Weekday::Tue => WeekDay::Tuesday,
            Weekday::Wed => WeekDay::Wednesday,
            Weekday::Thu => WeekDay::Thursday,
            Weekday::Fri => WeekDay::Friday,
            Weekday::Sat => WeekDay::Saturday,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WeekDay::Sunday => "sunday",
            WeekDay::Monday => "monday",
            WeekDay::Tuesday => "tuesday",
            WeekDay::Wednesday => "wednesday",
            WeekDay::Thursday => "thursday",
            WeekDay::Friday => "friday",
            WeekDay::Saturday => "saturday",
        }
    }
}

impl FromStr for WeekDay {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sunday" => Ok(WeekDay::Sunday),
            "monday" => Ok(WeekDay::Monday),
            "tuesday" => Ok(WeekDay::Tuesday),
            "wednesday" => Ok(WeekDay::Wednesday),
            "thursday" => Ok(WeekDay::Thursday),
            "friday" => Ok(WeekDay::Friday),
            "saturday" => Ok(WeekDay::Saturday),
            other => Err(Error::Config(format!("unrecognized week day: {other}"))),
        }
    }
}

impl fmt::Display for WeekDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Derived dashboard statistics for one range. Recomputed on every refresh,
/// never persisted.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardStats {
    /// Days in the range (up to today) without any entry.
    pub missing_days: u32,
    /// Total logged hours over the whole filtered range, not just the
    /// visible recent days.
    pub total_hours: f64,
    /// Priority-ordered display list, at most seven days, today always
    /// included.
    pub recent_days: Vec<EntryDay>,
}
