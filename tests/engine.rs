use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tzbridge::{
    CivilInstant, DaylightStatus, Error, OffsetEngine, ResolveRules, Result, TransitionRule,
    ZoneName,
};

// 2000-07-01T00:00:00Z and 2000-01-01T00:00:00Z. Rules below are anchored
// in 2000 so every query crosses a year boundary no matter when the suite
// runs.
const MID_2000: i64 = 962_409_600;
const EARLY_2000: i64 = 946_684_800;

/// Serves America/New_York style rules from a fixed table and counts
/// resolutions.
#[derive(Clone, Default)]
struct TableResolver {
    calls: Arc<AtomicUsize>,
}

impl ResolveRules for TableResolver {
    fn resolve(&self, _zone: &ZoneName, year: i32) -> Result<TransitionRule> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if year == 2000 {
            // EDT between Apr 2 07:00 and Oct 29 06:00 UTC.
            Ok(TransitionRule::new(
                -18_000,
                3_600,
                CivilInstant {
                    year: 2000,
                    month: 4,
                    day: 2,
                    hour: 7,
                    ..Default::default()
                },
                CivilInstant {
                    year: 2000,
                    month: 10,
                    day: 29,
                    hour: 6,
                    ..Default::default()
                },
                2000,
            ))
        } else {
            Ok(TransitionRule::fixed(-18_000, year))
        }
    }
}

struct FailingResolver;

impl ResolveRules for FailingResolver {
    fn resolve(&self, _zone: &ZoneName, _year: i32) -> Result<TransitionRule> {
        Err(Error::ExternalToolFailed("resolution unavailable".into()))
    }
}

#[test]
fn offsets_follow_the_daylight_window() -> anyhow::Result<()> {
    let resolver = TableResolver::default();
    let calls = resolver.calls.clone();

    let mut engine = OffsetEngine::new(resolver);
    engine.set_zone("America/New_York")?;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // First query in 2000 re-resolves; the second reuses the cached rule.
    assert_eq!(engine.offset_at(MID_2000), -14_400);
    assert_eq!(engine.offset_at(EARLY_2000), -18_000);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    Ok(())
}

#[test]
fn local_time_shifts_and_flags_daylight_saving() -> anyhow::Result<()> {
    let mut engine = OffsetEngine::new(TableResolver::default());
    engine.set_zone("America/New_York")?;

    let summer = engine.local_time_at(MID_2000);
    assert_eq!(
        summer.instant(),
        CivilInstant {
            year: 2000,
            month: 6,
            day: 30,
            hour: 20,
            ..Default::default()
        }
    );
    assert_eq!(summer.daylight(), DaylightStatus::InEffect);

    let winter = engine.local_time_at(EARLY_2000);
    assert_eq!(
        winter.instant(),
        CivilInstant {
            year: 1999,
            month: 12,
            day: 31,
            hour: 19,
            ..Default::default()
        }
    );
    assert_eq!(winter.daylight(), DaylightStatus::NotInEffect);
    Ok(())
}

#[test]
fn malformed_names_keep_the_current_zone() -> anyhow::Result<()> {
    let mut engine = OffsetEngine::new(TableResolver::default());
    engine.set_zone("America/New_York")?;

    assert!(matches!(
        engine.set_zone("Not_A_Zone"),
        Err(Error::InvalidZoneName(_))
    ));
    assert_eq!(engine.zone().map(ZoneName::as_str), Some("America/New_York"));
    Ok(())
}

#[test]
fn unresolvable_zones_leave_the_engine_without_one() {
    let mut engine = OffsetEngine::new(FailingResolver);
    assert!(engine.set_zone("America/New_York").is_err());
    assert!(engine.zone().is_none());
}
