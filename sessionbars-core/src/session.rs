//! Session clock — the minute timeline of one trading day and its anchors.
//!
//! A session runs from a local start time to a local end time (inclusive) in
//! an IANA time zone. Three anchors are defined as minute offsets from the
//! session start:
//!
//! | anchor          | default offset | default wall clock |
//! | --------------- | -------------- | ------------------ |
//! | warm-up start   | +30            | 08:30              |
//! | signal warm-up  | +38            | 08:38              |
//! | session open    | +90            | 09:30              |
//!
//! Anchor instants are derived on demand from the offsets, never stored.
//! Every timestamp handled by the clock is a session-local wall-clock minute;
//! conversion to UTC only happens at the provider boundary.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Session window and anchor configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// IANA zone the session's wall clock is expressed in.
    pub time_zone: Tz,
    /// First minute of the session (local).
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    /// Last minute of the session (local, inclusive).
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
    /// Last minute on early-close days.
    #[serde(with = "hhmm")]
    pub early_close_end: NaiveTime,
    pub warmup_offset_minutes: u32,
    pub signal_warmup_offset_minutes: u32,
    pub market_open_offset_minutes: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            time_zone: chrono_tz::America::New_York,
            start: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or(NaiveTime::MIN),
            end: NaiveTime::from_hms_opt(16, 0, 0).unwrap_or(NaiveTime::MIN),
            early_close_end: NaiveTime::from_hms_opt(13, 0, 0).unwrap_or(NaiveTime::MIN),
            warmup_offset_minutes: 30,
            signal_warmup_offset_minutes: 38,
            market_open_offset_minutes: 90,
        }
    }
}

/// Anchor offsets in minutes from session start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anchors {
    pub warmup_start: usize,
    pub signal_warmup: usize,
    pub session_open: usize,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClockError {
    #[error("session end {end} is not after session start {start}")]
    InvalidWindow { start: NaiveTime, end: NaiveTime },

    #[error("{anchor} anchor at +{offset} min falls outside a {minutes}-minute session")]
    AnchorOutsideSession {
        anchor: &'static str,
        offset: usize,
        minutes: usize,
    },

    #[error("anchors out of order: warm-up +{warmup_start}, signal warm-up +{signal_warmup}")]
    AnchorsOutOfOrder {
        warmup_start: usize,
        signal_warmup: usize,
    },

    #[error("local time {0} does not exist in the session time zone")]
    NonexistentLocalTime(NaiveDateTime),
}

/// Immutable timeline for one trading session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionClock {
    date: NaiveDate,
    time_zone: Tz,
    start: NaiveDateTime,
    end: NaiveDateTime,
    early_close: bool,
    anchors: Anchors,
}

impl SessionClock {
    /// Build the regular-hours session for `date`.
    pub fn new(date: NaiveDate, config: &SessionConfig) -> Result<Self, ClockError> {
        Self::build(date, config, config.end, false)
    }

    /// Build the shortened session for an early-close day.
    pub fn early_close(date: NaiveDate, config: &SessionConfig) -> Result<Self, ClockError> {
        Self::build(date, config, config.early_close_end, true)
    }

    fn build(
        date: NaiveDate,
        config: &SessionConfig,
        end: NaiveTime,
        early_close: bool,
    ) -> Result<Self, ClockError> {
        if end <= config.start {
            return Err(ClockError::InvalidWindow {
                start: config.start,
                end,
            });
        }

        let start = date.and_time(config.start);
        let end = date.and_time(end);
        let minutes = ((end - start).num_minutes() + 1) as usize;

        let anchors = Anchors {
            warmup_start: config.warmup_offset_minutes as usize,
            signal_warmup: config.signal_warmup_offset_minutes as usize,
            session_open: config.market_open_offset_minutes as usize,
        };

        if anchors.signal_warmup <= anchors.warmup_start {
            return Err(ClockError::AnchorsOutOfOrder {
                warmup_start: anchors.warmup_start,
                signal_warmup: anchors.signal_warmup,
            });
        }
        for (anchor, offset) in [
            ("warm-up", anchors.warmup_start),
            ("signal warm-up", anchors.signal_warmup),
            ("session open", anchors.session_open),
        ] {
            if offset >= minutes {
                return Err(ClockError::AnchorOutsideSession {
                    anchor,
                    offset,
                    minutes,
                });
            }
        }

        Ok(Self {
            date,
            time_zone: config.time_zone,
            start,
            end,
            early_close,
            anchors,
        })
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn time_zone(&self) -> Tz {
        self.time_zone
    }

    pub fn is_early_close(&self) -> bool {
        self.early_close
    }

    /// First minute of the session (local).
    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    /// Last minute of the session (local, inclusive).
    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn anchors(&self) -> Anchors {
        self.anchors
    }

    pub fn warmup_start(&self) -> NaiveDateTime {
        self.timestamp_at(self.anchors.warmup_start)
    }

    pub fn signal_warmup(&self) -> NaiveDateTime {
        self.timestamp_at(self.anchors.signal_warmup)
    }

    pub fn session_open(&self) -> NaiveDateTime {
        self.timestamp_at(self.anchors.session_open)
    }

    /// Number of minutes from start to end, inclusive.
    pub fn minute_count(&self) -> usize {
        ((self.end - self.start).num_minutes() + 1) as usize
    }

    /// Wall-clock minute at `offset` minutes after session start.
    pub fn timestamp_at(&self, offset: usize) -> NaiveDateTime {
        self.start + Duration::minutes(offset as i64)
    }

    /// Offset of `timestamp` within the session, if it is a whole minute in range.
    pub fn offset_of(&self, timestamp: NaiveDateTime) -> Option<usize> {
        if timestamp < self.start || timestamp > self.end {
            return None;
        }
        let elapsed = timestamp - self.start;
        if elapsed.num_seconds() % 60 != 0 || elapsed.subsec_nanos() != 0 {
            return None;
        }
        Some(elapsed.num_minutes() as usize)
    }

    /// Every minute of the session, in order.
    pub fn timeline(&self) -> impl Iterator<Item = NaiveDateTime> + '_ {
        (0..self.minute_count()).map(move |offset| self.timestamp_at(offset))
    }

    /// Session start as a UTC instant, for provider requests.
    pub fn start_utc(&self) -> Result<DateTime<Utc>, ClockError> {
        self.to_utc(self.start)
    }

    /// Session end as a UTC instant, for provider requests.
    pub fn end_utc(&self) -> Result<DateTime<Utc>, ClockError> {
        self.to_utc(self.end)
    }

    /// Convert a local wall-clock minute to UTC.
    ///
    /// Ambiguous (fall-back) times resolve to the earlier instant; nonexistent
    /// (spring-forward) times are an error.
    pub fn to_utc(&self, local: NaiveDateTime) -> Result<DateTime<Utc>, ClockError> {
        use chrono::offset::LocalResult;
        match self.time_zone.from_local_datetime(&local) {
            LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
            LocalResult::Ambiguous(earliest, _) => Ok(earliest.with_timezone(&Utc)),
            LocalResult::None => Err(ClockError::NonexistentLocalTime(local)),
        }
    }

    /// Convert a UTC instant to the session-local wall clock.
    pub fn to_local(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        instant.with_timezone(&self.time_zone).naive_local()
    }
}

/// `HH:MM` serde format for session times.
mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }
}
