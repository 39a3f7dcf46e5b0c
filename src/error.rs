//! Error types for zone discovery and rule resolution.
//!
//! Discovery and resolution failures are never fatal: every internal path
//! falls back to the host's own local time and only logs. The one place an
//! error reaches the caller is an explicit [`set_zone`](crate::set_zone)
//! request.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// The name is not of the form `Area/Location[/SubLocation]`.
    #[error("invalid zone name: {0:?}")]
    InvalidZoneName(String),

    /// The zoneinfo root directory cannot be listed.
    #[error("zoneinfo root not accessible: {}", .0.display())]
    ZoneInfoRootUnavailable(PathBuf),

    /// The byte scan ran to exhaustion without a matching zoneinfo file.
    #[error("no zoneinfo file matches the localtime reference")]
    NoMatchFound,

    /// An external utility exited non-zero, timed out or produced output
    /// that does not parse.
    #[error("external tool failed: {0}")]
    ExternalToolFailed(String),

    /// The Windows timezone registry has no usable record for the zone.
    #[error("registry lookup failed: {0}")]
    RegistryLookupFailed(String),

    /// Re-resolving the stored zone after a calendar year change failed.
    #[error("re-resolving zone {zone} for year {year} failed")]
    YearRolloverResolutionFailed {
        zone: String,
        year: i32,
        #[source]
        source: Box<Error>,
    },

    /// The host's own clock or local time conversion failed.
    #[error("host time conversion failed: {0}")]
    HostTime(String),
}
