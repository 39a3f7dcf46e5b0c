//! Host zone discovery.
//!
//! One strategy per target, chosen at compile time and never mixed at
//! runtime: Linux and the BSDs consult `TZ`, the `/etc/localtime` symlink
//! and finally a byte scan of the zoneinfo root; macOS guarantees the
//! symlink; Windows maps its named timezone through the bundled table.
//!
//! Every failure here means "host zone unknown" and surfaces as `None`;
//! callers fall back to the host's own local time conversion.

use crate::zone::ZoneName;

#[cfg(any(unix, test))]
use crate::zone::is_zoneinfo_name;
#[cfg(any(unix, test))]
use std::path::Path;
#[cfg(unix)]
use tracing::debug;

#[cfg(unix)]
pub const LOCALTIME_FILE: &str = "/etc/localtime";
#[cfg(unix)]
pub const DEFAULT_ZONEINFO_ROOT: &str = "/usr/share/zoneinfo";

/// Zone name encoded in a localtime symlink target, if the target points
/// into the zoneinfo root and the remainder validates.
#[cfg(any(unix, test))]
fn zone_from_link_target(root: &Path, target: &Path) -> Option<String> {
    let name = target.strip_prefix(root).ok()?.to_str()?;
    is_zoneinfo_name(name).then(|| name.to_string())
}

/// A valid zone name taken from the `TZ` environment variable. Set but
/// non-zoneinfo values are ignored, falling through to discovery.
#[cfg(unix)]
fn env_tz() -> Option<ZoneName> {
    let tz = std::env::var("TZ").ok()?;
    match ZoneName::new(&tz) {
        Ok(zone) => Some(zone),
        Err(_) => {
            debug!("ignoring non zoneinfo formatted TZ value {tz:?}");
            None
        }
    }
}

#[cfg(all(unix, not(target_os = "macos")))]
pub use unix::discover_host_zone;

#[cfg(all(unix, not(target_os = "macos")))]
mod unix {
    use super::*;
    use crate::scan::{HostFs, find_zone_by_content};
    use std::fs;
    use std::path::PathBuf;
    use tracing::warn;

    /// Discover the host's zoneinfo identifier: `TZ` first, then the
    /// localtime symlink fast path, then the byte scan.
    pub fn discover_host_zone() -> Option<ZoneName> {
        if let Some(zone) = env_tz() {
            return Some(zone);
        }

        let root = zoneinfo_root()?;
        let reference = localtime_reference(&root)?;

        if let Ok(target) = fs::read_link(&reference) {
            if let Some(name) = zone_from_link_target(&root, &target) {
                debug!("{} links to zone {name}", reference.display());
                return ZoneName::new(&name).ok();
            }
            debug!(
                "{} links to a non-zoneinfo target, comparing contents",
                reference.display()
            );
        }

        match find_zone_by_content(&HostFs, &root, &reference) {
            Ok(name) => ZoneName::new(&name).ok(),
            Err(e) => {
                warn!("unable to determine host timezone: {e}");
                None
            }
        }
    }

    /// The zoneinfo root: `TZDIR` when it points at a readable directory,
    /// the compiled-in default otherwise.
    fn zoneinfo_root() -> Option<PathBuf> {
        if let Some(dir) = std::env::var_os("TZDIR") {
            let dir = PathBuf::from(dir);
            if fs::metadata(&dir).map(|m| m.is_dir()).unwrap_or(false) {
                return Some(dir);
            }
            debug!("TZDIR does not point to a readable directory, using {DEFAULT_ZONEINFO_ROOT}");
        }
        let default = PathBuf::from(DEFAULT_ZONEINFO_ROOT);
        if fs::metadata(&default).is_ok() {
            Some(default)
        } else {
            warn!("could not find {DEFAULT_ZONEINFO_ROOT}, unable to determine host timezone");
            None
        }
    }

    /// `/etc/localtime` is not guaranteed to exist everywhere; fall back to
    /// `localtime` inside the zoneinfo root.
    fn localtime_reference(root: &Path) -> Option<PathBuf> {
        let primary = PathBuf::from(LOCALTIME_FILE);
        if fs::metadata(&primary).is_ok() {
            return Some(primary);
        }
        let fallback = root.join("localtime");
        if fs::metadata(&fallback).is_ok() {
            return Some(fallback);
        }
        warn!(
            "could not find {LOCALTIME_FILE} or {}, unable to determine host timezone",
            fallback.display()
        );
        None
    }
}

#[cfg(target_os = "macos")]
pub use macos::discover_host_zone;

#[cfg(target_os = "macos")]
mod macos {
    use super::*;
    use std::fs;
    use tracing::warn;

    /// On macOS the localtime file is always a symlink into the fixed
    /// zoneinfo directory, so the link target is authoritative.
    pub fn discover_host_zone() -> Option<ZoneName> {
        if let Some(zone) = env_tz() {
            return Some(zone);
        }

        let target = match fs::read_link(LOCALTIME_FILE) {
            Ok(target) => target,
            Err(e) => {
                warn!("could not read {LOCALTIME_FILE}: {e}");
                return None;
            }
        };
        match zone_from_link_target(Path::new(DEFAULT_ZONEINFO_ROOT), &target) {
            Some(name) => ZoneName::new(&name).ok(),
            None => {
                warn!("{LOCALTIME_FILE} does not point into {DEFAULT_ZONEINFO_ROOT}");
                None
            }
        }
    }
}

#[cfg(windows)]
pub use windows::discover_host_zone;

#[cfg(windows)]
mod windows {
    use super::*;
    use crate::windows_zones::zone_for_windows_name;
    use tracing::warn;

    /// Map the host's named timezone through the bundled table.
    pub fn discover_host_zone() -> Option<ZoneName> {
        let name = host_timezone_name()?;
        match zone_for_windows_name(&name) {
            Some(zone) => ZoneName::new(zone).ok(),
            None => {
                warn!("no zoneinfo mapping for host timezone {name:?}");
                None
            }
        }
    }

    fn host_timezone_name() -> Option<String> {
        use windows_sys::Win32::System::Time::{
            GetTimeZoneInformation, TIME_ZONE_ID_INVALID, TIME_ZONE_INFORMATION,
        };

        let mut info: TIME_ZONE_INFORMATION = unsafe { std::mem::zeroed() };
        let rc = unsafe { GetTimeZoneInformation(&mut info) };
        if rc == TIME_ZONE_ID_INVALID {
            warn!("could not determine the host timezone name");
            return None;
        }
        let len = info
            .StandardName
            .iter()
            .position(|c| *c == 0)
            .unwrap_or(info.StandardName.len());
        Some(String::from_utf16_lossy(&info.StandardName[..len]))
    }
}
