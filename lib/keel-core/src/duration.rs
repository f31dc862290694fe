//! Restricted ISO-8601 durations.
//!
//! [`IsoDuration`] carries calendar fields (years, months, weeks, days) next to
//! clock fields (hours, minutes, seconds, milliseconds). Calendar units have no
//! fixed length, so conversion to a [`std::time::Duration`] refuses months
//! unless the caller says how long a month is.
//!
//! # Example
//!
//! ```
//! use keel_core::IsoDuration;
//!
//! let duration = IsoDuration { hours: 25, ..IsoDuration::default() };
//! assert_eq!(duration.to_string(), "P1DT1H");
//!
//! let parsed: IsoDuration = "P1DT1H".parse().expect("valid duration");
//! assert_eq!(parsed.days, 1);
//! assert_eq!(parsed.hours, 1);
//! ```

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use derive_more::{Display, Error};

const MILLIS_PER_SECOND: u32 = 1000;
const SECONDS_PER_MINUTE: u32 = 60;
const MINUTES_PER_HOUR: u32 = 60;
const HOURS_PER_DAY: u32 = 24;
const DAYS_PER_WEEK: u32 = 7;
const MONTHS_PER_YEAR: u32 = 12;
const DAYS_PER_YEAR: u64 = 365;

/// Validation errors raised by [`IsoDuration`].
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum DurationError {
    /// The text is not a supported ISO-8601 duration.
    #[display("bad ISO-8601 duration format: {_0:?}")]
    BadFormat(#[error(not(source))] String),

    /// Weeks cannot be combined with years or months.
    #[display("weeks are not allowed with years or months")]
    WeeksWithYearsOrMonths,

    /// Months have no fixed length; use the days-per-month overload.
    #[display(
        "months are not allowed with to_std_duration, use to_std_duration_with_months instead"
    )]
    MonthsRequireOverride,
}

/// A restricted ISO-8601 duration (`PnYnMnWnDTnHnMnS`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct IsoDuration {
    /// Years.
    pub years: u32,
    /// Months.
    pub months: u32,
    /// Weeks.
    pub weeks: u32,
    /// Days.
    pub days: u32,
    /// Hours.
    pub hours: u32,
    /// Minutes.
    pub minutes: u32,
    /// Seconds.
    pub seconds: u32,
    /// Milliseconds.
    pub milliseconds: u32,
}

impl IsoDuration {
    /// Build a duration from a fixed-length [`Duration`].
    ///
    /// Sub-millisecond precision is dropped; the result is normalized.
    #[must_use]
    pub fn from_std(duration: Duration) -> Self {
        let part = |value: u64, unit: u32| u32::try_from(value % u64::from(unit)).unwrap_or_default();

        let seconds = duration.as_secs();
        let minutes = seconds / u64::from(SECONDS_PER_MINUTE);
        let hours = minutes / u64::from(MINUTES_PER_HOUR);
        let days = hours / u64::from(HOURS_PER_DAY);
        let weeks = days / u64::from(DAYS_PER_WEEK);

        Self {
            weeks: u32::try_from(weeks).unwrap_or(u32::MAX),
            days: part(days, DAYS_PER_WEEK),
            hours: part(hours, HOURS_PER_DAY),
            minutes: part(minutes, MINUTES_PER_HOUR),
            seconds: part(seconds, SECONDS_PER_MINUTE),
            milliseconds: duration.subsec_millis(),
            ..Self::default()
        }
    }

    /// Carry every field into the next larger unit where the ratio is fixed.
    ///
    /// Days only carry into weeks when there are no months or years, and
    /// months carry into years. Weeks mixed with months or years is an error.
    pub fn normalize(&mut self) -> Result<(), DurationError> {
        if self.milliseconds >= MILLIS_PER_SECOND {
            self.seconds = self
                .seconds
                .saturating_add(self.milliseconds / MILLIS_PER_SECOND);
            self.milliseconds %= MILLIS_PER_SECOND;
        }
        if self.seconds >= SECONDS_PER_MINUTE {
            self.minutes = self
                .minutes
                .saturating_add(self.seconds / SECONDS_PER_MINUTE);
            self.seconds %= SECONDS_PER_MINUTE;
        }
        if self.minutes >= MINUTES_PER_HOUR {
            self.hours = self.hours.saturating_add(self.minutes / MINUTES_PER_HOUR);
            self.minutes %= MINUTES_PER_HOUR;
        }
        if self.hours >= HOURS_PER_DAY {
            self.days = self.days.saturating_add(self.hours / HOURS_PER_DAY);
            self.hours %= HOURS_PER_DAY;
        }
        if self.days >= DAYS_PER_WEEK && self.months == 0 && self.years == 0 {
            self.weeks = self.weeks.saturating_add(self.days / DAYS_PER_WEEK);
            self.days %= DAYS_PER_WEEK;
        }
        if self.months >= MONTHS_PER_YEAR {
            self.years = self.years.saturating_add(self.months / MONTHS_PER_YEAR);
            self.months %= MONTHS_PER_YEAR;
        }

        if self.weeks != 0 && (self.years != 0 || self.months != 0) {
            return Err(DurationError::WeeksWithYearsOrMonths);
        }
        Ok(())
    }

    /// Return a normalized copy.
    pub fn normalized(&self) -> Result<Self, DurationError> {
        let mut copy = *self;
        copy.normalize()?;
        Ok(copy)
    }

    /// Returns `true` if any hour, minute, second or millisecond is set.
    #[must_use]
    pub const fn has_time_part(&self) -> bool {
        self.hours != 0 || self.minutes != 0 || self.seconds != 0 || self.milliseconds != 0
    }

    /// Returns `true` if every field is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.years == 0
            && self.months == 0
            && self.weeks == 0
            && self.days == 0
            && !self.has_time_part()
    }

    /// Convert to a fixed-length [`Duration`].
    ///
    /// Fails with [`DurationError::MonthsRequireOverride`] when months are set.
    pub fn to_std_duration(&self) -> Result<Duration, DurationError> {
        if self.months != 0 {
            return Err(DurationError::MonthsRequireOverride);
        }
        self.to_std_duration_with_months(0)
    }

    /// Convert to a fixed-length [`Duration`], counting `days_per_month` days
    /// for every month. A year is 365 days.
    pub fn to_std_duration_with_months(&self, days_per_month: u32) -> Result<Duration, DurationError> {
        let value = self.normalized()?;

        let days = u64::from(value.years) * DAYS_PER_YEAR
            + u64::from(value.months) * u64::from(days_per_month)
            + u64::from(value.weeks) * u64::from(DAYS_PER_WEEK)
            + u64::from(value.days);
        let hours = days * u64::from(HOURS_PER_DAY) + u64::from(value.hours);
        let minutes = hours * u64::from(MINUTES_PER_HOUR) + u64::from(value.minutes);
        let seconds = minutes * u64::from(SECONDS_PER_MINUTE) + u64::from(value.seconds);

        Ok(Duration::from_secs(seconds) + Duration::from_millis(u64::from(value.milliseconds)))
    }

    fn write_iso(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return f.write_str("PT0S");
        }

        f.write_str("P")?;
        for (amount, designator) in [
            (self.years, 'Y'),
            (self.months, 'M'),
            (self.weeks, 'W'),
            (self.days, 'D'),
        ] {
            if amount > 0 {
                write!(f, "{amount}{designator}")?;
            }
        }

        if self.has_time_part() {
            f.write_str("T")?;
            if self.hours > 0 {
                write!(f, "{}H", self.hours)?;
            }
            if self.minutes > 0 {
                write!(f, "{}M", self.minutes)?;
            }
            if self.milliseconds > 0 {
                let fraction = format!("{:03}", self.milliseconds);
                write!(f, "{}.{}S", self.seconds, fraction.trim_end_matches('0'))?;
            } else if self.seconds > 0 {
                write!(f, "{}S", self.seconds)?;
            }
        }
        Ok(())
    }
}

/// Renders the normalized form.
///
/// A value that cannot be normalized (weeks mixed with months or years) is
/// rendered field by field as stored.
impl fmt::Display for IsoDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.normalized().unwrap_or(*self).write_iso(f)
    }
}

impl FromStr for IsoDuration {
    type Err = DurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad_format = || DurationError::BadFormat(s.to_string());

        let body = s.trim().strip_prefix('P').ok_or_else(bad_format)?;
        let (date, time) = match body.split_once('T') {
            Some((_, "")) => return Err(bad_format()),
            Some((date, time)) => (date, Some(time)),
            None => (body, None),
        };
        if date.is_empty() && time.is_none() {
            return Err(bad_format());
        }

        let mut value = Self::default();

        let mut last = 0;
        for (amount, designator) in components(date).ok_or_else(bad_format)? {
            let (rank, field) = match designator {
                'Y' => (1, &mut value.years),
                'M' => (2, &mut value.months),
                'W' => (3, &mut value.weeks),
                'D' => (4, &mut value.days),
                _ => return Err(bad_format()),
            };
            if rank <= last || amount.contains('.') {
                return Err(bad_format());
            }
            last = rank;
            *field = amount.parse().map_err(|_| bad_format())?;
        }

        let mut last = 0;
        for (amount, designator) in components(time.unwrap_or_default()).ok_or_else(bad_format)? {
            let rank = match designator {
                'H' => 1,
                'M' => 2,
                'S' => 3,
                _ => return Err(bad_format()),
            };
            if rank <= last {
                return Err(bad_format());
            }
            last = rank;
            match designator {
                'H' => value.hours = parse_whole(amount).ok_or_else(bad_format)?,
                'M' => value.minutes = parse_whole(amount).ok_or_else(bad_format)?,
                _ => {
                    let (seconds, millis) = parse_seconds(amount).ok_or_else(bad_format)?;
                    value.seconds = seconds;
                    value.milliseconds = millis;
                }
            }
        }

        Ok(value)
    }
}

/// Split `12Y3M` style text into `(amount, designator)` pairs.
fn components(text: &str) -> Option<Vec<(&str, char)>> {
    let mut parts = Vec::new();
    let mut start = 0;
    for (index, c) in text.char_indices() {
        if c.is_ascii_digit() || c == '.' {
            continue;
        }
        let amount = text.get(start..index)?;
        if amount.is_empty() {
            return None;
        }
        parts.push((amount, c));
        start = index + c.len_utf8();
    }
    (start == text.len()).then_some(parts)
}

fn parse_whole(amount: &str) -> Option<u32> {
    if amount.contains('.') {
        return None;
    }
    amount.parse().ok()
}

fn parse_seconds(amount: &str) -> Option<(u32, u32)> {
    let Some((whole, fraction)) = amount.split_once('.') else {
        return Some((amount.parse().ok()?, 0));
    };
    if whole.is_empty() || fraction.is_empty() || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let millis: String = fraction.chars().chain("000".chars()).take(3).collect();
    Some((whole.parse().ok()?, millis.parse().ok()?))
}
