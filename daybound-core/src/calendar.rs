//! Trading calendar — maps an entry instant to its exit boundary.
//!
//! The exit boundary is the next trading day's session open in the
//! configured zone, pulled back by a small safety buffer so it lands inside
//! the last candle of the prior session rather than exactly on a bar edge.
//! Weekends are the only non-trading days modelled.

use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minutes subtracted from the next session open to form the exit boundary.
pub const DEFAULT_SAFETY_BUFFER_MINUTES: i64 = 2;
pub const DEFAULT_TIMEZONE: &str = "America/New_York";
pub const DEFAULT_SESSION_OPEN: &str = "09:30";

/// Longest DST gap searched when a session-open clock time does not exist.
const MAX_DST_GAP_MINUTES: i64 = 180;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalendarError {
    #[error("unknown time zone '{0}'")]
    UnknownTimezone(String),
    #[error("invalid session open '{0}', expected HH:MM")]
    InvalidSessionOpen(String),
    #[error("safety buffer must be non-negative and under one hour, got {0} minutes")]
    InvalidSafetyBuffer(i64),
    #[error("weekend days must be consecutive, got {0} and {1}")]
    NonConsecutiveWeekend(Weekday, Weekday),
}

/// Serializable calendar settings (the `[calendar]` table of a run config).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    /// IANA zone name of the trading session.
    pub timezone: String,
    /// Local clock time of the session open, `HH:MM`.
    pub session_open: String,
    pub safety_buffer_minutes: i64,
    /// The two consecutive non-trading days, in week order.
    pub weekend: [Weekday; 2],
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            timezone: DEFAULT_TIMEZONE.to_string(),
            session_open: DEFAULT_SESSION_OPEN.to_string(),
            safety_buffer_minutes: DEFAULT_SAFETY_BUFFER_MINUTES,
            weekend: [Weekday::Sat, Weekday::Sun],
        }
    }
}

/// Forward window of one entry: `[entry_utc, exit_utc)`.
///
/// `exit_utc` is `None` when the entry falls on a non-trading day; such rows
/// must be excluded, never treated as a normal day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradingDayBoundary {
    pub entry_utc: DateTime<Utc>,
    pub exit_utc: Option<DateTime<Utc>>,
}

impl TradingDayBoundary {
    pub fn is_defined(&self) -> bool {
        self.exit_utc.is_some()
    }
}

/// Resolved, immutable trading calendar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionCalendar {
    tz: Tz,
    session_open: NaiveTime,
    safety_buffer: Duration,
    weekend: [Weekday; 2],
}

impl Default for SessionCalendar {
    fn default() -> Self {
        Self {
            tz: chrono_tz::America::New_York,
            session_open: NaiveTime::from_hms_opt(9, 30, 0).unwrap_or(NaiveTime::MIN),
            safety_buffer: Duration::minutes(DEFAULT_SAFETY_BUFFER_MINUTES),
            weekend: [Weekday::Sat, Weekday::Sun],
        }
    }
}

impl SessionCalendar {
    /// Saturday/Sunday weekend calendar.
    pub fn new(tz: Tz, session_open: NaiveTime, safety_buffer: Duration) -> Self {
        Self {
            tz,
            session_open,
            safety_buffer,
            weekend: [Weekday::Sat, Weekday::Sun],
        }
    }

    pub fn from_config(config: &CalendarConfig) -> Result<Self, CalendarError> {
        let tz: Tz = config
            .timezone
            .parse()
            .map_err(|_| CalendarError::UnknownTimezone(config.timezone.clone()))?;
        let session_open = NaiveTime::parse_from_str(&config.session_open, "%H:%M")
            .map_err(|_| CalendarError::InvalidSessionOpen(config.session_open.clone()))?;
        if !(0..60).contains(&config.safety_buffer_minutes) {
            return Err(CalendarError::InvalidSafetyBuffer(config.safety_buffer_minutes));
        }
        let [first, second] = config.weekend;
        if first.succ() != second {
            return Err(CalendarError::NonConsecutiveWeekend(first, second));
        }
        Ok(Self {
            tz,
            session_open,
            safety_buffer: Duration::minutes(config.safety_buffer_minutes),
            weekend: config.weekend,
        })
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn safety_buffer(&self) -> Duration {
        self.safety_buffer
    }

    pub fn is_trading_day(&self, date: NaiveDate) -> bool {
        !self.weekend.contains(&date.weekday())
    }

    /// Calendar date of `instant` in the session zone.
    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.tz).date_naive()
    }

    /// Session open on `date`, in UTC.
    ///
    /// An ambiguous local time (DST fall-back) resolves to the earliest
    /// instant. A non-existent local time (DST spring-forward) resolves to
    /// the first valid instant after the gap. `None` only if no valid
    /// instant exists within `MAX_DST_GAP_MINUTES`.
    pub fn session_open_utc(&self, date: NaiveDate) -> Option<DateTime<Utc>> {
        let local = date.and_time(self.session_open);
        for shift in 0..=MAX_DST_GAP_MINUTES {
            match self.tz.from_local_datetime(&(local + Duration::minutes(shift))) {
                LocalResult::Single(dt) => return Some(dt.with_timezone(&Utc)),
                LocalResult::Ambiguous(earliest, _) => return Some(earliest.with_timezone(&Utc)),
                LocalResult::None => continue,
            }
        }
        None
    }

    /// Exit boundary for a trade entered at `entry_utc`.
    pub fn compute_exit_boundary(&self, entry_utc: DateTime<Utc>) -> TradingDayBoundary {
        let undefined = TradingDayBoundary {
            entry_utc,
            exit_utc: None,
        };

        let entry_date = self.local_date(entry_utc);
        if !self.is_trading_day(entry_date) {
            return undefined;
        }

        let Some(candidate) = entry_date.succ_opt() else {
            return undefined;
        };
        let days_forward = match candidate.weekday() {
            d if d == self.weekend[0] => 2,
            d if d == self.weekend[1] => 1,
            _ => 0,
        };
        let exit_date = candidate + Duration::days(days_forward);

        let exit_utc = self
            .session_open_utc(exit_date)
            .map(|open| open - self.safety_buffer)
            .filter(|exit| *exit > entry_utc);

        TradingDayBoundary { entry_utc, exit_utc }
    }
}
