//! The offset engine.
//!
//! Holds at most one resolved zone and the transition rule it observes in
//! one calendar year. Queries outside that year re-resolve before
//! answering; any internal failure degrades to the host's own local time
//! conversion instead of surfacing an error.

use crate::civil::{CivilInstant, DaylightStatus, LocalTime};
use crate::discover::discover_host_zone;
use crate::error::{Error, Result};
use crate::rule::TransitionRule;
use crate::rules::ResolveRules;
use crate::zone::ZoneName;
use tracing::{debug, warn};
use tz::{DateTime, TimeZone, UtcDateTime};

/// Offset computation over one resolved zone, generic over the resolver so
/// tests can drive it without external tools.
pub struct OffsetEngine<R> {
    resolver: R,
    state: State,
}

enum State {
    /// No usable zone; answer from the host's own local time.
    HostFallback,
    Resolved(Resolved),
}

struct Resolved {
    zone: ZoneName,
    rule: TransitionRule,
}

impl<R: ResolveRules> OffsetEngine<R> {
    /// An engine with no zone, answering from the host's local time until
    /// [`set_zone`](Self::set_zone) succeeds.
    pub fn new(resolver: R) -> Self {
        Self {
            resolver,
            state: State::HostFallback,
        }
    }

    /// An engine primed with the discovered host zone. Discovery or
    /// resolution failure is not an error, the engine starts on the host
    /// fallback instead.
    pub fn with_host_zone(resolver: R) -> Self {
        let mut engine = Self::new(resolver);
        match discover_host_zone() {
            Some(zone) => {
                if let Err(e) = engine.apply_zone(zone) {
                    warn!("could not resolve the discovered host zone: {e}");
                }
            }
            None => debug!("host zone unknown, using host local time"),
        }
        engine
    }

    /// The currently resolved zone, if any.
    pub fn zone(&self) -> Option<&ZoneName> {
        match &self.state {
            State::Resolved(resolved) => Some(&resolved.zone),
            State::HostFallback => None,
        }
    }

    /// Switch the engine to the named zone.
    ///
    /// A malformed name fails without touching the current state. A well
    /// formed name that cannot be resolved also fails, but drops any
    /// previously resolved zone, leaving the engine on the host fallback.
    pub fn set_zone(&mut self, name: &str) -> Result<()> {
        let zone = ZoneName::new(name)?;
        self.apply_zone(zone)
            .inspect_err(|_| self.state = State::HostFallback)
    }

    /// UTC offset in seconds the engine's zone observes at a Unix
    /// timestamp.
    pub fn offset_at(&mut self, unix: i64) -> i64 {
        match self.rule_for(unix) {
            Some((rule, utc)) => rule.offset_at(&utc),
            None => host_offset(unix),
        }
    }

    /// Local calendar breakdown of a Unix timestamp in the engine's zone,
    /// with its daylight saving status.
    pub fn local_time_at(&mut self, unix: i64) -> LocalTime {
        if let Some((rule, utc)) = self.rule_for(unix) {
            let offset = rule.offset_at(&utc);
            match CivilInstant::from_unix(unix + offset) {
                Ok(instant) => return LocalTime::new(instant, rule.daylight_status(&utc)),
                Err(e) => warn!("could not shift {unix} by {offset} seconds: {e}"),
            }
        }
        host_local_time(unix)
    }

    /// Resolve the named zone for the current wall clock year and store it.
    fn apply_zone(&mut self, zone: ZoneName) -> Result<()> {
        let year = current_year()?;
        let rule = self.resolver.resolve(&zone, year)?;
        debug!("resolved zone {zone} for year {year}");
        self.state = State::Resolved(Resolved { zone, rule });
        Ok(())
    }

    /// The rule covering `unix`, re-resolving on a calendar year change.
    /// `None` means the host fallback answers this query.
    fn rule_for(&mut self, unix: i64) -> Option<(TransitionRule, CivilInstant)> {
        let State::Resolved(resolved) = &mut self.state else {
            return None;
        };
        let utc = match CivilInstant::from_unix(unix) {
            Ok(utc) => utc,
            Err(e) => {
                warn!("could not break down timestamp {unix}: {e}");
                return None;
            }
        };

        if utc.year != resolved.rule.year() {
            debug!(
                "query year {} differs from resolved year {}, re-resolving {}",
                utc.year,
                resolved.rule.year(),
                resolved.zone
            );
            match self.resolver.resolve(&resolved.zone, utc.year) {
                Ok(rule) => resolved.rule = rule,
                Err(e) => {
                    let e = Error::YearRolloverResolutionFailed {
                        zone: resolved.zone.to_string(),
                        year: utc.year,
                        source: Box::new(e),
                    };
                    warn!("{e}, dropping the zone and using host local time");
                    self.state = State::HostFallback;
                    return None;
                }
            }
        }

        Some((resolved.rule, utc))
    }
}

fn current_year() -> Result<i32> {
    Ok(UtcDateTime::now()
        .map_err(|e| Error::HostTime(e.to_string()))?
        .year())
}

fn host_date_time(unix: i64) -> Result<DateTime> {
    let tz = TimeZone::local().map_err(|e| Error::HostTime(e.to_string()))?;
    DateTime::from_timespec(unix, 0, tz.as_ref()).map_err(|e| Error::HostTime(e.to_string()))
}

/// The host's own UTC offset at a timestamp, with UTC as the last resort.
fn host_offset(unix: i64) -> i64 {
    match host_date_time(unix) {
        Ok(local) => i64::from(local.local_time_type().ut_offset()),
        Err(e) => {
            warn!("host local time conversion failed: {e}, treating the host as UTC");
            0
        }
    }
}

fn host_local_time(unix: i64) -> LocalTime {
    match host_date_time(unix) {
        Ok(local) => {
            let instant = CivilInstant {
                year: local.year(),
                month: local.month(),
                day: local.month_day(),
                hour: local.hour(),
                minute: local.minute(),
                second: local.second(),
            };
            let daylight = if local.local_time_type().is_dst() {
                DaylightStatus::InEffect
            } else {
                DaylightStatus::NotInEffect
            };
            LocalTime::new(instant, daylight)
        }
        Err(e) => {
            warn!("host local time conversion failed: {e}, treating the host as UTC");
            LocalTime::new(
                CivilInstant::from_unix(unix).unwrap_or_default(),
                DaylightStatus::NotApplicable,
            )
        }
    }
}
