//! Period keys for week-scoped files and timesheet rows.
//!
//! The backend stores per-period documents under keys of the form
//! `"<year>-W<isoWeek>"`. The week number is never zero-padded (the backend
//! rejects `"2025-W01"`), and the year is always the year the user selected,
//! even when the ISO week belongs to a neighbouring ISO week-year.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::PeriodError;

/// Highest "Nth week of the month" ordinal a user can pick.
pub const MAX_WEEK_ORDINAL: u32 = 5;

/// Canonical backend key for one reporting week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PeriodKey {
    year: i32,
    week: u32,
}

impl PeriodKey {
    pub fn new(year: i32, week: u32) -> Self {
        Self { year, week }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn week(&self) -> u32 {
        self.week
    }
}

impl Display for PeriodKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{:04}-W{}", self.year, self.week)
    }
}

impl FromStr for PeriodKey {
    type Err = PeriodError;

    /// Accepts `"2025-W1"`; a zero-padded week (`"2025-W01"`) is tolerated on
    /// input but is always written back unpadded.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PeriodError::InvalidKey(s.to_string());
        let (year, week) = s.trim().split_once("-W").ok_or_else(invalid)?;
        let year = parse_year(year).map_err(|_| invalid())?;
        if week.is_empty() || !week.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let week: u32 = week.parse().map_err(|_| invalid())?;
        if !(1..=53).contains(&week) {
            return Err(invalid());
        }
        Ok(Self { year, week })
    }
}

impl TryFrom<String> for PeriodKey {
    type Error = PeriodError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PeriodKey> for String {
    fn from(key: PeriodKey) -> Self {
        key.to_string()
    }
}

/// Calendar month, parsed from its full English name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Month {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

impl Month {
    pub const ALL: [Month; 12] = [
        Month::January,
        Month::February,
        Month::March,
        Month::April,
        Month::May,
        Month::June,
        Month::July,
        Month::August,
        Month::September,
        Month::October,
        Month::November,
        Month::December,
    ];

    /// 1-based month number.
    pub fn number(&self) -> u32 {
        *self as u32 + 1
    }

    pub fn name(&self) -> &'static str {
        match self {
            Month::January => "January",
            Month::February => "February",
            Month::March => "March",
            Month::April => "April",
            Month::May => "May",
            Month::June => "June",
            Month::July => "July",
            Month::August => "August",
            Month::September => "September",
            Month::October => "October",
            Month::November => "November",
            Month::December => "December",
        }
    }

    pub fn from_number(number: u32) -> Option<Self> {
        number
            .checked_sub(1)
            .and_then(|idx| Self::ALL.get(idx as usize).copied())
    }
}

impl Display for Month {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.name())
    }
}

impl FromStr for Month {
    type Err = PeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| PeriodError::UnknownMonth(s.to_string()))
    }
}

/// The year/month/week-of-month triple behind a period picker.
///
/// Each `with_*` method changes one input and re-derives the start date, so
/// `key()` always reflects the latest selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodSelection {
    year: i32,
    month: Month,
    week: u32,
    start: NaiveDate,
}

impl PeriodSelection {
    pub fn new(year: &str, month: &str, week_ordinal: u32) -> Result<Self, PeriodError> {
        let year = parse_year(year)?;
        let month: Month = month.parse()?;
        Self::from_parts(year, month, week_ordinal)
    }

    pub fn from_parts(year: i32, month: Month, week_ordinal: u32) -> Result<Self, PeriodError> {
        let start = week_start(year, month, week_ordinal)?;
        Ok(Self {
            year,
            month,
            week: week_ordinal,
            start,
        })
    }

    pub fn with_year(&self, year: &str) -> Result<Self, PeriodError> {
        Self::from_parts(parse_year(year)?, self.month, self.week)
    }

    pub fn with_month(&self, month: Month) -> Result<Self, PeriodError> {
        Self::from_parts(self.year, month, self.week)
    }

    pub fn with_week(&self, week_ordinal: u32) -> Result<Self, PeriodError> {
        Self::from_parts(self.year, self.month, week_ordinal)
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> Month {
        self.month
    }

    pub fn week(&self) -> u32 {
        self.week
    }

    /// First day of the selected week-of-month.
    pub fn start_date(&self) -> NaiveDate {
        self.start
    }

    pub fn key(&self) -> PeriodKey {
        PeriodKey::new(self.year, self.start.iso_week().week())
    }
}

/// Resolve the backend period key for the Nth week of a month.
pub fn resolve_period_key(
    year: &str,
    month: &str,
    week_ordinal: u32,
) -> Result<PeriodKey, PeriodError> {
    PeriodSelection::new(year, month, week_ordinal).map(|selection| selection.key())
}

/// Number of week ordinals whose start date still falls inside the month.
pub fn weeks_in_month(year: i32, month: Month) -> u32 {
    (1..=MAX_WEEK_ORDINAL)
        .take_while(|ordinal| {
            week_start(year, month, *ordinal)
                .map(|date| date.month() == month.number())
                .unwrap_or(false)
        })
        .count() as u32
}

/// Every period key touched by the inclusive date range, in chronological order.
///
/// Days are keyed by their own calendar year, matching `resolve_period_key`,
/// so the days of an ISO week that straddles New Year fall into two keys.
pub fn period_keys_for_range(start: NaiveDate, end: NaiveDate) -> Vec<PeriodKey> {
    let mut keys: Vec<PeriodKey> = start
        .iter_days()
        .take_while(|day| *day <= end)
        .map(|day| PeriodKey::new(day.year(), day.iso_week().week()))
        .collect();
    keys.dedup();
    keys
}

fn parse_year(year: &str) -> Result<i32, PeriodError> {
    let trimmed = year.trim();
    if trimmed.len() != 4 || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PeriodError::InvalidYear(year.to_string()));
    }
    trimmed
        .parse()
        .map_err(|_| PeriodError::InvalidYear(year.to_string()))
}

fn week_start(year: i32, month: Month, week_ordinal: u32) -> Result<NaiveDate, PeriodError> {
    if !(1..=MAX_WEEK_ORDINAL).contains(&week_ordinal) {
        return Err(PeriodError::WeekOutOfRange(week_ordinal));
    }
    let out_of_range = || PeriodError::DateOutOfRange {
        year,
        month: month.number(),
    };
    NaiveDate::from_ymd_opt(year, month.number(), 1)
        .ok_or_else(out_of_range)?
        .checked_add_days(Days::new(u64::from(week_ordinal - 1) * 7))
        .ok_or_else(out_of_range)
}
