//! Date-only and time-only values.
//!
//! Both wrap a `chrono` value and carry the wire format used in URIs and
//! payloads: `YYYY-MM-DD` for dates, `HH:MM:SS[.fffffffff]` for times.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
use derive_more::{Display, Error};

const DATE_FORMAT: &str = "%Y-%m-%d";
const NANOS_PER_SECOND: u32 = 1_000_000_000;

/// Maximum number of fractional-second digits a [`TimeOnly`] keeps.
pub const MAX_TIME_PRECISION: u8 = 9;

/// Errors raised while parsing or building [`DateOnly`] and [`TimeOnly`].
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum TemporalError {
    /// The input was empty or whitespace.
    #[display("empty date/time value")]
    Empty,

    /// The text is not a `YYYY-MM-DD` date.
    #[display("invalid date: {_0:?}")]
    InvalidDate(#[error(not(source))] String),

    /// The text is not a `HH:MM:SS[.f]` time.
    #[display("invalid time: {_0:?}")]
    InvalidTime(#[error(not(source))] String),

    /// More fractional digits than nanoseconds can hold.
    #[display("time precision of {precision} exceeds maximum allowed of {max}")]
    PrecisionTooLarge {
        /// Digits found in the input.
        precision: usize,
        /// Largest supported precision.
        max: u8,
    },
}

// ============================================================================
// DateOnly
// ============================================================================

/// A calendar date without time or offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateOnly(NaiveDate);

impl DateOnly {
    /// Wrap a [`NaiveDate`].
    #[must_use]
    pub const fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Build from year, month and day.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Self, TemporalError> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Self)
            .ok_or_else(|| TemporalError::InvalidDate(format!("{year}-{month}-{day}")))
    }

    /// Parse `YYYY-MM-DD`, treating blank input as absent.
    pub fn parse_optional(s: &str) -> Result<Option<Self>, TemporalError> {
        if s.trim().is_empty() {
            return Ok(None);
        }
        s.parse().map(Some)
    }

    /// The wrapped date.
    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        self.0
    }

    /// Year, month and day.
    #[must_use]
    pub fn ymd(&self) -> (i32, u32, u32) {
        (self.0.year(), self.0.month(), self.0.day())
    }
}

impl From<NaiveDate> for DateOnly {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl From<DateOnly> for NaiveDate {
    fn from(date: DateOnly) -> Self {
        date.0
    }
}

impl fmt::Display for DateOnly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_FORMAT))
    }
}

impl FromStr for DateOnly {
    type Err = TemporalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(TemporalError::Empty);
        }
        NaiveDate::parse_from_str(s, DATE_FORMAT)
            .map(Self)
            .map_err(|_| TemporalError::InvalidDate(s.to_string()))
    }
}

// ============================================================================
// TimeOnly
// ============================================================================

/// A time of day without date or offset.
///
/// The number of fractional-second digits is part of the value: parsing
/// `16:20:21.000` renders back as `16:20:21.000`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeOnly {
    time: NaiveTime,
    precision: u8,
}

impl TimeOnly {
    /// Wrap a [`NaiveTime`], keeping as many digits as its nanoseconds need.
    #[must_use]
    pub fn new(time: NaiveTime) -> Self {
        Self {
            time,
            precision: detect_precision(time),
        }
    }

    /// Wrap a [`NaiveTime`] with an explicit precision, capped at
    /// [`MAX_TIME_PRECISION`].
    #[must_use]
    pub fn with_precision(time: NaiveTime, precision: u8) -> Self {
        Self {
            time,
            precision: precision.min(MAX_TIME_PRECISION),
        }
    }

    /// Build from hour, minute and second.
    pub fn from_hms(hour: u32, minute: u32, second: u32) -> Result<Self, TemporalError> {
        NaiveTime::from_hms_opt(hour, minute, second)
            .map(Self::new)
            .ok_or_else(|| TemporalError::InvalidTime(format!("{hour}:{minute}:{second}")))
    }

    /// Parse `HH:MM:SS[.f]`, treating blank input as absent.
    pub fn parse_optional(s: &str) -> Result<Option<Self>, TemporalError> {
        if s.trim().is_empty() {
            return Ok(None);
        }
        s.parse().map(Some)
    }

    /// The wrapped time.
    #[must_use]
    pub const fn time(&self) -> NaiveTime {
        self.time
    }

    /// Number of fractional-second digits rendered by [`fmt::Display`].
    #[must_use]
    pub const fn precision(&self) -> u8 {
        self.precision
    }

    /// Render with `precision` fractional digits.
    ///
    /// A precision above [`MAX_TIME_PRECISION`] renders whole seconds.
    #[must_use]
    pub fn to_string_with_precision(&self, precision: u8) -> String {
        let mut out = format!(
            "{:02}:{:02}:{:02}",
            self.time.hour(),
            self.time.minute(),
            self.time.second()
        );
        if precision > 0 && precision <= MAX_TIME_PRECISION {
            let nanos = format!("{:09}", self.time.nanosecond() % NANOS_PER_SECOND);
            out.push('.');
            out.push_str(nanos.get(..usize::from(precision)).unwrap_or_default());
        }
        out
    }
}

impl From<NaiveTime> for TimeOnly {
    fn from(time: NaiveTime) -> Self {
        Self::new(time)
    }
}

impl From<TimeOnly> for NaiveTime {
    fn from(time: TimeOnly) -> Self {
        time.time
    }
}

impl fmt::Display for TimeOnly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_with_precision(self.precision))
    }
}

impl FromStr for TimeOnly {
    type Err = TemporalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(TemporalError::Empty);
        }
        let invalid = || TemporalError::InvalidTime(s.to_string());

        let (clock, fraction) = match s.split_once('.') {
            Some((clock, fraction)) => (clock, Some(fraction)),
            None => (s, None),
        };

        let mut fields = clock.split(':');
        let (Some(hour), Some(minute), Some(second), None) =
            (fields.next(), fields.next(), fields.next(), fields.next())
        else {
            return Err(invalid());
        };
        let hour = two_digits(hour).ok_or_else(invalid)?;
        let minute = two_digits(minute).ok_or_else(invalid)?;
        let second = two_digits(second).ok_or_else(invalid)?;

        let (nanos, precision) = match fraction {
            None => (0, 0),
            Some(digits) => {
                if digits.len() > usize::from(MAX_TIME_PRECISION) {
                    return Err(TemporalError::PrecisionTooLarge {
                        precision: digits.len(),
                        max: MAX_TIME_PRECISION,
                    });
                }
                if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(invalid());
                }
                let padded = format!("{digits:0<9}");
                let nanos = padded.parse::<u32>().map_err(|_| invalid())?;
                (nanos, u8::try_from(digits.len()).map_err(|_| invalid())?)
            }
        };

        let time = NaiveTime::from_hms_nano_opt(hour, minute, second, nanos).ok_or_else(invalid)?;
        Ok(Self { time, precision })
    }
}

fn two_digits(field: &str) -> Option<u32> {
    if field.len() != 2 || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}

/// Fractional digits needed to render `time` without loss.
#[must_use]
pub fn detect_precision(time: NaiveTime) -> u8 {
    let nanos = time.nanosecond() % NANOS_PER_SECOND;
    if nanos == 0 {
        return 0;
    }
    let digits = format!("{nanos:09}");
    u8::try_from(digits.trim_end_matches('0').len()).unwrap_or(MAX_TIME_PRECISION)
}
