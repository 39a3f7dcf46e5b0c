//! The process wide zone cache.
//!
//! One lazily initialized engine behind a mutex serves every caller in the
//! process. First use pays for host zone discovery and resolution; later
//! queries reuse the cached rule until the zone or the calendar year
//! changes.

use crate::civil::LocalTime;
use crate::engine::OffsetEngine;
use crate::error::Result;
use crate::rules::HostRuleResolver;
use once_cell::sync::Lazy;
use std::sync::Mutex;

/// Label reported when no zone could be discovered or set.
pub const UNKNOWN_ZONE: &str = "Unknown/Unknown";

static ZONE_CACHE: Lazy<Mutex<OffsetEngine<HostRuleResolver>>> =
    Lazy::new(|| Mutex::new(OffsetEngine::with_host_zone(HostRuleResolver)));

/// Switch the process wide zone. A malformed name fails and keeps the
/// previous zone; a well formed name that cannot be resolved fails and
/// drops it.
pub fn set_zone(name: &str) -> Result<()> {
    lock!(ZONE_CACHE).set_zone(name)
}

/// UTC offset in seconds of the process wide zone at a Unix timestamp.
pub fn offset_seconds(unix: i64) -> i64 {
    lock!(ZONE_CACHE).offset_at(unix)
}

/// Local calendar breakdown of a Unix timestamp in the process wide zone.
pub fn local_time(unix: i64) -> LocalTime {
    lock!(ZONE_CACHE).local_time_at(unix)
}

/// The process wide zone identifier, or [`UNKNOWN_ZONE`] while the engine
/// runs on the host fallback.
pub fn current_zone_label() -> String {
    lock!(ZONE_CACHE)
        .zone()
        .map(|zone| zone.to_string())
        .unwrap_or_else(|| UNKNOWN_ZONE.to_string())
}
