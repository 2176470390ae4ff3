use std::fmt;
use std::sync::LazyLock;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use regex::Regex;

use crate::date_util::{end_of_day, last_day_of_month, start_of_day};
use crate::error::{Error, Result};

static RE_QUARTER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{4})-Q([1-4])$").unwrap());
static RE_MONTH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{4})-(\d{2})$").unwrap());

const MS_PER_DAY: i64 = 86_400_000;

/// The closed set of period types the dashboard filter offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodKind {
    Daily,
    Weekly,
    Biweekly,
    Monthly,
    Quarterly,
    Yearly,
    Custom,
}

impl PeriodKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodKind::Daily => "daily",
            PeriodKind::Weekly => "weekly",
            PeriodKind::Biweekly => "biweekly",
            PeriodKind::Monthly => "monthly",
            PeriodKind::Quarterly => "quarterly",
            PeriodKind::Yearly => "yearly",
            PeriodKind::Custom => "custom",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(PeriodKind::Daily),
            "weekly" => Ok(PeriodKind::Weekly),
            "biweekly" => Ok(PeriodKind::Biweekly),
            "monthly" => Ok(PeriodKind::Monthly),
            "quarterly" => Ok(PeriodKind::Quarterly),
            "yearly" => Ok(PeriodKind::Yearly),
            "custom" => Ok(PeriodKind::Custom),
            other => Err(Error::PeriodParse(format!("unrecognized period kind: {other}"))),
        }
    }
}

impl fmt::Display for PeriodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// User-selected anchor for month/quarter/year periods. Fields are filled
/// independently by the caller; `Period::from_kind` checks that the fields a
/// given kind needs are present instead of silently defaulting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PeriodAnchor {
    pub year: Option<i32>,
    /// Calendar month, 1-12.
    pub month: Option<u32>,
    /// Calendar quarter, 1-4.
    pub quarter: Option<u8>,
}

/// An inclusive date-time range. For every non-custom period the start sits at
/// local midnight and the end at 23:59:59.999 of the boundary day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Prev,
    Next,
}

impl DateRange {
    /// Build a caller-supplied range. The end must not precede the start.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self> {
        if end < start {
            return Err(Error::PeriodParse(format!(
                "range end {end} precedes start {start}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Number of whole days the range spans, rounded up. A monthly range
    /// reports 28-31, a weekly range 7.
    pub fn span_days(&self) -> i64 {
        let ms = (self.end - self.start).num_milliseconds();
        (ms + MS_PER_DAY - 1) / MS_PER_DAY
    }

    /// Shift the whole range backward or forward by its own span. Navigation
    /// is period-agnostic: it always moves by the current span in whole days,
    /// so the span (and therefore round-tripping prev/next) is preserved
    /// exactly.
    pub fn navigate(&self, direction: Direction) -> DateRange {
        let days = match direction {
            Direction::Prev => -self.span_days(),
            Direction::Next => self.span_days(),
        };
        DateRange {
            start: self.start + Duration::days(days),
            end: self.end + Duration::days(days),
        }
    }
}

/// A concrete period selection: the kind plus whatever anchor it carries.
///
/// Mirrors the dashboard filter: `Daily`/`Weekly`/`Biweekly` float with the
/// reference instant, `Monthly`/`Quarterly`/`Yearly` pin to an explicit
/// anchor chosen by the user, and `Custom` wraps a picker-supplied range.
#[derive(Debug, Clone, PartialEq)]
pub enum Period {
    Daily,
    Weekly,
    Biweekly,
    Monthly { year: i32, month: u32 },
    Quarterly { year: i32, quarter: u8 },
    Yearly { year: i32 },
    Custom(DateRange),
}

impl Period {
    /// Assemble a period from a kind and an anchor, failing loudly when the
    /// kind needs an anchor field the caller did not supply.
    pub fn from_kind(kind: PeriodKind, anchor: &PeriodAnchor) -> Result<Self> {
        match kind {
            PeriodKind::Daily => Ok(Period::Daily),
            PeriodKind::Weekly => Ok(Period::Weekly),
            PeriodKind::Biweekly => Ok(Period::Biweekly),
            PeriodKind::Monthly => {
                let year = anchor.year.ok_or(Error::MissingAnchorField {
                    kind: "monthly",
                    field: "year",
                })?;
                let month = anchor.month.ok_or(Error::MissingAnchorField {
                    kind: "monthly",
                    field: "month",
                })?;
                if !(1..=12).contains(&month) {
                    return Err(Error::PeriodParse(format!("month out of range: {month}")));
                }
                Ok(Period::Monthly { year, month })
            }
            PeriodKind::Quarterly => {
                let year = anchor.year.ok_or(Error::MissingAnchorField {
                    kind: "quarterly",
                    field: "year",
                })?;
                let quarter = anchor.quarter.ok_or(Error::MissingAnchorField {
                    kind: "quarterly",
                    field: "quarter",
                })?;
                if !(1..=4).contains(&quarter) {
                    return Err(Error::PeriodParse(format!(
                        "quarter out of range: {quarter}"
                    )));
                }
                Ok(Period::Quarterly { year, quarter })
            }
            PeriodKind::Yearly => {
                let year = anchor.year.ok_or(Error::MissingAnchorField {
                    kind: "yearly",
                    field: "year",
                })?;
                Ok(Period::Yearly { year })
            }
            PeriodKind::Custom => Err(Error::MissingAnchorField {
                kind: "custom",
                field: "range",
            }),
        }
    }

    /// Parse a period string.
    ///
    /// Supported formats:
    /// - `daily`, `weekly`, `biweekly`: relative to the reference instant
    /// - `monthly`, `quarterly`, `yearly`: anchored to `today`
    /// - `2025`: explicit year
    /// - `2025-02`: explicit month
    /// - `2025-Q3`: explicit quarter
    pub fn parse(s: &str, today: NaiveDate) -> Result<Self> {
        let s = s.trim();

        match s.to_lowercase().as_str() {
            "daily" => return Ok(Period::Daily),
            "weekly" => return Ok(Period::Weekly),
            "biweekly" => return Ok(Period::Biweekly),
            "monthly" => {
                return Ok(Period::Monthly {
                    year: today.year(),
                    month: today.month(),
                })
            }
            "quarterly" => {
                return Ok(Period::Quarterly {
                    year: today.year(),
                    quarter: crate::date_util::quarter_of(today),
                })
            }
            "yearly" => return Ok(Period::Yearly { year: today.year() }),
            _ => {}
        }

        // Year: "2025"
        if s.len() == 4 {
            if let Ok(year) = s.parse::<i32>() {
                return Ok(Period::Yearly { year });
            }
        }

        // Quarter: "2025-Q1" through "2025-Q4"
        if let Some(caps) = RE_QUARTER.captures(s) {
            let year: i32 = caps[1].parse().unwrap();
            let quarter: u8 = caps[2].parse().unwrap();
            return Ok(Period::Quarterly { year, quarter });
        }

        // Month: "2025-01"
        if let Some(caps) = RE_MONTH.captures(s) {
            let year: i32 = caps[1].parse().unwrap();
            let month: u32 = caps[2].parse().unwrap();
            if (1..=12).contains(&month) {
                return Ok(Period::Monthly { year, month });
            }
        }

        Err(Error::PeriodParse(format!("unrecognized period: {s}")))
    }

    pub fn kind(&self) -> PeriodKind {
        match self {
            Period::Daily => PeriodKind::Daily,
            Period::Weekly => PeriodKind::Weekly,
            Period::Biweekly => PeriodKind::Biweekly,
            Period::Monthly { .. } => PeriodKind::Monthly,
            Period::Quarterly { .. } => PeriodKind::Quarterly,
            Period::Yearly { .. } => PeriodKind::Yearly,
            Period::Custom(_) => PeriodKind::Custom,
        }
    }

    /// Convert to a canonical key string for display and logging.
    pub fn to_key(&self) -> String {
        match self {
            Period::Daily => "daily".into(),
            Period::Weekly => "weekly".into(),
            Period::Biweekly => "biweekly".into(),
            Period::Monthly { year, month } => format!("{year}-{month:02}"),
            Period::Quarterly { year, quarter } => format!("{year}-Q{quarter}"),
            Period::Yearly { year } => format!("{year}"),
            Period::Custom(r) => {
                format!("{}..{}", r.start.date(), r.end.date())
            }
        }
    }

    /// Resolve the period to a concrete date-time range, evaluated against an
    /// explicit reference instant so repeated calls within one interaction
    /// stay deterministic.
    ///
    /// Boundary policy: start of day / end of day for every non-custom kind,
    /// including yearly. Weeks start on Sunday.
    pub fn date_range(&self, reference_now: NaiveDateTime) -> DateRange {
        let today = reference_now.date();
        match self {
            Period::Daily => DateRange {
                start: start_of_day(today),
                end: end_of_day(today),
            },
            Period::Weekly => {
                let sunday = today - Duration::days(today.weekday().num_days_from_sunday() as i64);
                DateRange {
                    start: start_of_day(sunday),
                    end: end_of_day(sunday + Duration::days(6)),
                }
            }
            Period::Biweekly => DateRange {
                start: start_of_day(today - Duration::days(14)),
                end: end_of_day(today),
            },
            Period::Monthly { year, month } => {
                let first = NaiveDate::from_ymd_opt(*year, *month, 1).unwrap();
                DateRange {
                    start: start_of_day(first),
                    end: end_of_day(last_day_of_month(*year, *month)),
                }
            }
            Period::Quarterly { year, quarter } => {
                let start_month = (*quarter as u32 - 1) * 3 + 1;
                let first = NaiveDate::from_ymd_opt(*year, start_month, 1).unwrap();
                DateRange {
                    start: start_of_day(first),
                    end: end_of_day(last_day_of_month(*year, start_month + 2)),
                }
            }
            Period::Yearly { year } => DateRange {
                start: start_of_day(NaiveDate::from_ymd_opt(*year, 1, 1).unwrap()),
                end: end_of_day(NaiveDate::from_ymd_opt(*year, 12, 31).unwrap()),
            },
            Period::Custom(range) => *range,
        }
    }

    /// Recompute the range against a fresh reference instant; used to return
    /// to the current period after prev/next navigation has drifted away.
    pub fn reset(&self, reference_now: NaiveDateTime) -> DateRange {
        self.date_range(reference_now)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Timelike, Weekday};

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_kind_names() {
        let today = ymd(2025, 6, 15);
        assert_eq!(Period::parse("daily", today).unwrap(), Period::Daily);
        assert_eq!(Period::parse("weekly", today).unwrap(), Period::Weekly);
        assert_eq!(Period::parse("biweekly", today).unwrap(), Period::Biweekly);
        assert_eq!(
            Period::parse("monthly", today).unwrap(),
            Period::Monthly {
                year: 2025,
                month: 6
            }
        );
        assert_eq!(
            Period::parse("quarterly", today).unwrap(),
            Period::Quarterly {
                year: 2025,
                quarter: 2
            }
        );
        assert_eq!(
            Period::parse("yearly", today).unwrap(),
            Period::Yearly { year: 2025 }
        );
    }

    #[test]
    fn test_parse_anchored() {
        let today = ymd(2025, 6, 15);
        assert_eq!(
            Period::parse("2024", today).unwrap(),
            Period::Yearly { year: 2024 }
        );
        assert_eq!(
            Period::parse("2025-02", today).unwrap(),
            Period::Monthly {
                year: 2025,
                month: 2
            }
        );
        assert_eq!(
            Period::parse("2025-Q3", today).unwrap(),
            Period::Quarterly {
                year: 2025,
                quarter: 3
            }
        );
    }

    #[test]
    fn test_parse_invalid() {
        let today = ymd(2025, 6, 15);
        assert!(Period::parse("garbage", today).is_err());
        assert!(Period::parse("2025-13", today).is_err());
        assert!(Period::parse("2025-Q5", today).is_err());
    }

    #[test]
    fn test_from_kind_missing_anchor() {
        let err = Period::from_kind(PeriodKind::Monthly, &PeriodAnchor::default()).unwrap_err();
        assert!(matches!(
            err,
            Error::MissingAnchorField {
                kind: "monthly",
                ..
            }
        ));

        let err = Period::from_kind(
            PeriodKind::Quarterly,
            &PeriodAnchor {
                year: Some(2025),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::MissingAnchorField {
                kind: "quarterly",
                field: "quarter"
            }
        ));
    }

    #[test]
    fn test_from_kind_valid() {
        let p = Period::from_kind(
            PeriodKind::Monthly,
            &PeriodAnchor {
                year: Some(2025),
                month: Some(2),
                quarter: None,
            },
        )
        .unwrap();
        assert_eq!(
            p,
            Period::Monthly {
                year: 2025,
                month: 2
            }
        );
    }

    #[test]
    fn test_daily_range() {
        let now = at(2025, 6, 15, 13, 45);
        let r = Period::Daily.date_range(now);
        assert_eq!(r.start, at(2025, 6, 15, 0, 0));
        assert_eq!(r.end.date(), ymd(2025, 6, 15));
        assert_eq!(r.end.time().hour(), 23);
        assert_eq!(r.end.time().second(), 59);
    }

    #[test]
    fn test_weekly_starts_on_sunday() {
        // 2025-06-15 is itself a Sunday; 2025-06-18 is a Wednesday.
        for day in 15..=21 {
            let now = at(2025, 6, day, 10, 0);
            let r = Period::Weekly.date_range(now);
            assert_eq!(r.start.date().weekday(), Weekday::Sun);
            assert_eq!(r.start.date(), ymd(2025, 6, 15));
            assert_eq!(r.end.date(), ymd(2025, 6, 21));
            assert_eq!(r.start.time().num_seconds_from_midnight(), 0);
        }
    }

    #[test]
    fn test_biweekly_range() {
        let now = at(2025, 6, 15, 9, 30);
        let r = Period::Biweekly.date_range(now);
        assert_eq!(r.start.date(), ymd(2025, 6, 1));
        assert_eq!(r.end.date(), ymd(2025, 6, 15));
    }

    #[test]
    fn test_monthly_leap_february() {
        let r = Period::Monthly {
            year: 2024,
            month: 2,
        }
        .date_range(at(2025, 6, 15, 0, 0));
        assert_eq!(r.start, at(2024, 2, 1, 0, 0));
        assert_eq!(r.end.date(), ymd(2024, 2, 29));
        assert_eq!(r.end.time().hour(), 23);
    }

    #[test]
    fn test_quarterly_range() {
        let r = Period::Quarterly {
            year: 2025,
            quarter: 3,
        }
        .date_range(at(2025, 1, 1, 0, 0));
        assert_eq!(r.start.date(), ymd(2025, 7, 1));
        assert_eq!(r.end.date(), ymd(2025, 9, 30));

        let r = Period::Quarterly {
            year: 2025,
            quarter: 4,
        }
        .date_range(at(2025, 1, 1, 0, 0));
        assert_eq!(r.start.date(), ymd(2025, 10, 1));
        assert_eq!(r.end.date(), ymd(2025, 12, 31));
    }

    #[test]
    fn test_yearly_end_of_day_normalized() {
        let r = Period::Yearly { year: 2025 }.date_range(at(2024, 3, 3, 12, 0));
        assert_eq!(r.start, at(2025, 1, 1, 0, 0));
        assert_eq!(r.end.date(), ymd(2025, 12, 31));
        assert_eq!(r.end.time().hour(), 23);
        assert_eq!(r.end.time().second(), 59);
    }

    #[test]
    fn test_custom_passthrough() {
        let range = DateRange::new(at(2025, 3, 3, 8, 15), at(2025, 3, 10, 17, 0)).unwrap();
        let r = Period::Custom(range).date_range(at(2025, 6, 1, 0, 0));
        assert_eq!(r, range);
    }

    #[test]
    fn test_range_rejects_inverted_bounds() {
        assert!(DateRange::new(at(2025, 3, 10, 0, 0), at(2025, 3, 3, 0, 0)).is_err());
    }

    #[test]
    fn test_start_never_after_end() {
        let now = at(2025, 6, 15, 16, 20);
        let periods = [
            Period::Daily,
            Period::Weekly,
            Period::Biweekly,
            Period::Monthly {
                year: 2025,
                month: 6,
            },
            Period::Quarterly {
                year: 2025,
                quarter: 2,
            },
            Period::Yearly { year: 2025 },
        ];
        for p in periods {
            let r = p.date_range(now);
            assert!(r.start <= r.end, "{p}: {:?}", r);
        }
    }

    #[test]
    fn test_navigate_preserves_span() {
        let r = Period::Monthly {
            year: 2025,
            month: 2,
        }
        .date_range(at(2025, 2, 10, 0, 0));
        for dir in [Direction::Prev, Direction::Next] {
            let shifted = r.navigate(dir);
            assert_eq!(shifted.end - shifted.start, r.end - r.start);
        }
    }

    #[test]
    fn test_navigate_round_trip() {
        let now = at(2025, 6, 15, 11, 0);
        let periods = [
            Period::Daily,
            Period::Weekly,
            Period::Biweekly,
            Period::Monthly {
                year: 2025,
                month: 6,
            },
            Period::Yearly { year: 2025 },
        ];
        for p in periods {
            let r = p.date_range(now);
            let back = r.navigate(Direction::Prev).navigate(Direction::Next);
            assert_eq!(back, r, "{p}");
            let fwd = r.navigate(Direction::Next).navigate(Direction::Prev);
            assert_eq!(fwd, r, "{p}");
        }
    }

    #[test]
    fn test_navigate_monthly_moves_by_day_count() {
        // A 31-day month shifts by 31 days, not to the previous calendar month.
        let r = Period::Monthly {
            year: 2025,
            month: 1,
        }
        .date_range(at(2025, 1, 10, 0, 0));
        assert_eq!(r.span_days(), 31);
        let prev = r.navigate(Direction::Prev);
        assert_eq!(prev.start.date(), ymd(2024, 12, 1));
        assert_eq!(prev.end.date(), ymd(2024, 12, 31));

        let feb = Period::Monthly {
            year: 2025,
            month: 2,
        }
        .date_range(at(2025, 2, 10, 0, 0));
        assert_eq!(feb.span_days(), 28);
        let next = feb.navigate(Direction::Next);
        // 28 days forward lands on Mar 1..Mar 28, not on calendar March.
        assert_eq!(next.start.date(), ymd(2025, 3, 1));
        assert_eq!(next.end.date(), ymd(2025, 3, 28));
    }

    #[test]
    fn test_reset_matches_date_range() {
        let now = at(2025, 6, 15, 10, 0);
        let p = Period::Weekly;
        let drifted = p
            .date_range(now)
            .navigate(Direction::Prev)
            .navigate(Direction::Prev);
        assert_ne!(drifted, p.date_range(now));
        assert_eq!(p.reset(now), p.date_range(now));
    }

    #[test]
    fn test_to_key() {
        assert_eq!(
            Period::Monthly {
                year: 2025,
                month: 2
            }
            .to_key(),
            "2025-02"
        );
        assert_eq!(
            Period::Quarterly {
                year: 2025,
                quarter: 3
            }
            .to_key(),
            "2025-Q3"
        );
        assert_eq!(Period::Yearly { year: 2025 }.to_key(), "2025");
        assert_eq!(Period::Daily.to_key(), "daily");
    }
}
