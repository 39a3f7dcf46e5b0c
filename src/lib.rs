#![doc = include_str!("../README.md")]

pub use cache::{UNKNOWN_ZONE, current_zone_label, local_time, offset_seconds, set_zone};
pub use civil::{CivilInstant, DaylightStatus, LocalTime};
pub use engine::OffsetEngine;
pub use error::{Error, Result};
pub use rule::TransitionRule;
pub use rules::{HostRuleResolver, ResolveRules};
pub use zone::{ZoneName, is_zoneinfo_name};

#[macro_use]
mod macros;

mod cache;
mod civil;
mod discover;
mod engine;
mod error;
#[cfg(any(unix, test))]
mod exec;
mod rule;
mod rules;
#[cfg(any(all(unix, not(target_os = "macos")), test))]
mod scan;
pub mod windows_zones;
mod zone;
