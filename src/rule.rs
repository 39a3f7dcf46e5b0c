//! Resolved standard/daylight offsets for one zone and year.

use crate::civil::{CivilInstant, DaylightStatus};
use getset::CopyGetters;

/// The offsets and transition instants a zone observes within one calendar
/// year. Replaced wholesale on re-resolution, never mutated field by field.
///
/// A `daylight_offset` of zero encodes a zone without daylight saving; the
/// two transition instants are meaningless in that case and are never
/// compared against.
#[derive(Clone, Copy, CopyGetters, Debug, Eq, PartialEq)]
pub struct TransitionRule {
    /// UTC offset in seconds outside the daylight period.
    #[get_copy = "pub"]
    standard_offset: i64,

    /// Additional seconds observed while daylight saving is in effect.
    #[get_copy = "pub"]
    daylight_offset: i64,

    /// UTC instant of the standard to daylight switch.
    #[get_copy = "pub"]
    daylight_start_utc: CivilInstant,

    /// UTC instant of the daylight to standard switch.
    #[get_copy = "pub"]
    standard_start_utc: CivilInstant,

    /// The year this rule was resolved for.
    #[get_copy = "pub"]
    year: i32,
}

impl TransitionRule {
    pub fn new(
        standard_offset: i64,
        daylight_offset: i64,
        daylight_start_utc: CivilInstant,
        standard_start_utc: CivilInstant,
        year: i32,
    ) -> Self {
        Self {
            standard_offset,
            daylight_offset,
            daylight_start_utc,
            standard_start_utc,
            year,
        }
    }

    /// A rule for a zone without daylight saving: one fixed offset, no
    /// transition boundaries.
    pub fn fixed(standard_offset: i64, year: i32) -> Self {
        Self::new(
            standard_offset,
            0,
            CivilInstant::default(),
            CivilInstant::default(),
            year,
        )
    }

    pub fn has_daylight_saving(&self) -> bool {
        self.daylight_offset != 0
    }

    /// Daylight status of a UTC instant: in effect inside
    /// `[daylight_start_utc, standard_start_utc)`.
    pub fn daylight_status(&self, utc: &CivilInstant) -> DaylightStatus {
        if !self.has_daylight_saving() {
            return DaylightStatus::NotApplicable;
        }
        if *utc >= self.daylight_start_utc && *utc < self.standard_start_utc {
            DaylightStatus::InEffect
        } else {
            DaylightStatus::NotInEffect
        }
    }

    /// UTC offset in seconds observed at a UTC instant.
    pub fn offset_at(&self, utc: &CivilInstant) -> i64 {
        match self.daylight_status(utc) {
            DaylightStatus::InEffect => self.standard_offset + self.daylight_offset,
            DaylightStatus::NotInEffect | DaylightStatus::NotApplicable => self.standard_offset,
        }
    }
}
