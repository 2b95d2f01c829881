//! Market holiday calendar and trading-day scheduling.
//!
//! The calendar is a JSON object keyed by year:
//!
//! ```json
//! { "2024": [ { "month": 7, "day": 4 },
//!             { "month": 11, "day": 29, "early_close": true } ] }
//! ```
//!
//! Entries without `early_close` are full closures. Years absent from the
//! calendar are treated as having no holidays.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use sessionbars_core::{ClockError, SessionClock, SessionConfig};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum CalendarError {
    #[error("read holiday calendar {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parse holiday calendar JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid holiday {year}-{month:02}-{day:02}")]
    InvalidDate { year: i32, month: u32, day: u32 },
}

/// One calendar entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holiday {
    pub month: u32,
    pub day: u32,
    /// Shortened session instead of a full closure.
    #[serde(default)]
    pub early_close: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HolidayCalendar {
    years: BTreeMap<i32, Vec<Holiday>>,
}

impl HolidayCalendar {
    pub fn from_file(path: &Path) -> Result<Self, CalendarError> {
        let content = std::fs::read_to_string(path).map_err(|source| CalendarError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, CalendarError> {
        let calendar: Self = serde_json::from_str(content)?;
        for (&year, holidays) in &calendar.years {
            for h in holidays {
                if NaiveDate::from_ymd_opt(year, h.month, h.day).is_none() {
                    return Err(CalendarError::InvalidDate {
                        year,
                        month: h.month,
                        day: h.day,
                    });
                }
            }
        }
        Ok(calendar)
    }

    pub fn covers_year(&self, year: i32) -> bool {
        self.years.contains_key(&year)
    }

    fn entry(&self, date: NaiveDate) -> Option<&Holiday> {
        self.years
            .get(&date.year())?
            .iter()
            .find(|h| h.month == date.month() && h.day == date.day())
    }

    /// Full market closure.
    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.entry(date).is_some_and(|h| !h.early_close)
    }

    pub fn is_early_close(&self, date: NaiveDate) -> bool {
        self.entry(date).is_some_and(|h| h.early_close)
    }
}

/// A date with a session to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradingDay {
    pub date: NaiveDate,
    pub early_close: bool,
}

impl TradingDay {
    /// Session clock for this day.
    pub fn clock(&self, config: &SessionConfig) -> Result<SessionClock, ClockError> {
        if self.early_close {
            SessionClock::early_close(self.date, config)
        } else {
            SessionClock::new(self.date, config)
        }
    }
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Trading days in `[start, end]`, skipping weekends and full holidays.
pub fn trading_days(start: NaiveDate, end: NaiveDate, calendar: &HolidayCalendar) -> Vec<TradingDay> {
    let mut warned: BTreeSet<i32> = BTreeSet::new();
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .filter(|d| !is_weekend(*d))
        .filter(|d| {
            if !calendar.covers_year(d.year()) && warned.insert(d.year()) {
                warn!(year = d.year(), "holiday calendar has no entries for year");
            }
            !calendar.is_holiday(*d)
        })
        .map(|date| TradingDay {
            date,
            early_close: calendar.is_early_close(date),
        })
        .collect()
}
