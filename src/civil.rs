//! Naive calendar timestamps used for transition math.
//!
//! A [`CivilInstant`] carries no offset. Comparisons and differences are
//! only meaningful between instants produced by the same resolution pass;
//! the engine enforces this by re-resolving before any cross-year
//! comparison.

use crate::error::{Error, Result};
use getset::CopyGetters;
use strum::Display;
use tz::UtcDateTime;

pub const SECONDS_PER_DAY: i64 = 60 * 60 * 24;

const MONTH_ABBREVS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// A naive calendar timestamp. The derived ordering is the strict
/// lexicographic comparison over year, month, day, hour, minute, second.
#[derive(Clone, Copy, Debug, Default, Eq, Ord, PartialEq, PartialOrd)]
pub struct CivilInstant {
    pub year: i32,
    /// 1 through 12.
    pub month: u8,
    /// 1 through 31.
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl CivilInstant {
    /// The UTC calendar breakdown of a Unix timestamp.
    pub fn from_unix(unix: i64) -> Result<Self> {
        let utc = UtcDateTime::from_timespec(unix, 0).map_err(|e| Error::HostTime(e.to_string()))?;
        Ok(Self {
            year: utc.year(),
            month: utc.month(),
            day: utc.month_day(),
            hour: utc.hour(),
            minute: utc.minute(),
            second: utc.second(),
        })
    }
}

/// Signed difference `end - start` in seconds, defined only for spans below
/// 24 hours: a calendar date difference carries exactly one day, except
/// within one month where the day numbers are compared directly.
pub fn diff_seconds(end: &CivilInstant, start: &CivilInstant) -> i64 {
    let mut end_secs = i64::from(end.second) + 60 * (i64::from(end.minute) + 60 * i64::from(end.hour));
    let mut start_secs =
        i64::from(start.second) + 60 * (i64::from(start.minute) + 60 * i64::from(start.hour));

    if end.year > start.year {
        end_secs += SECONDS_PER_DAY;
    } else if end.year < start.year {
        start_secs += SECONDS_PER_DAY;
    } else if end.month > start.month {
        end_secs += SECONDS_PER_DAY;
    } else if end.month < start.month {
        start_secs += SECONDS_PER_DAY;
    } else {
        end_secs += SECONDS_PER_DAY * i64::from(end.day);
        start_secs += SECONDS_PER_DAY * i64::from(start.day);
    }

    end_secs - start_secs
}

/// The month number (1 through 12) for a `Jan`..`Dec` abbreviation.
pub fn month_from_abbrev(abbrev: &str) -> Option<u8> {
    MONTH_ABBREVS
        .iter()
        .position(|month| *month == abbrev)
        .map(|index| index as u8 + 1)
}

/// Whether an instant falls inside a zone's daylight saving period.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum DaylightStatus {
    InEffect,
    NotInEffect,
    /// The zone has no daylight saving at all.
    NotApplicable,
}

/// A zone local timestamp together with its daylight saving flag.
#[derive(Clone, Copy, CopyGetters, Debug, Eq, PartialEq)]
pub struct LocalTime {
    #[get_copy = "pub"]
    instant: CivilInstant,
    #[get_copy = "pub"]
    daylight: DaylightStatus,
}

impl LocalTime {
    pub(crate) fn new(instant: CivilInstant, daylight: DaylightStatus) -> Self {
        Self { instant, daylight }
    }
}
