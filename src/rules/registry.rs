//! Transition resolution from the Windows timezone registry.
//!
//! Windows keeps one key per named timezone with a fixed-layout binary
//! `TZI` value. The zone identifier is mapped back to its Windows name
//! through the bundled table, then the record is decoded into a rule.

use crate::civil::CivilInstant;
use crate::error::{Error, Result};
use crate::rule::TransitionRule;
use crate::windows_zones::windows_name_for_zone;
use crate::zone::ZoneName;

#[cfg(test)]
use mockall::automock;

/// Registry path holding one key per named Windows timezone.
const TIME_ZONES_KEY: &str = "SOFTWARE\\Microsoft\\Windows NT\\CurrentVersion\\Time Zones";

/// Size of the TZI value: three 32 bit biases plus two SYSTEMTIME
/// transition descriptors.
const TZI_LEN: usize = 44;

/// Binary registry access, as a seam for tests.
#[cfg_attr(test, automock)]
pub trait Registry {
    fn read_binary_record(&self, key_path: &str, value_name: &str) -> Result<Vec<u8>>;
}

pub fn resolve(registry: &impl Registry, zone: &ZoneName, year: i32) -> Result<TransitionRule> {
    let windows_name = windows_name_for_zone(zone.as_str())
        .ok_or_else(|| Error::RegistryLookupFailed(format!("no Windows name for zone {zone}")))?;
    let key_path = format!("{TIME_ZONES_KEY}\\{windows_name}");
    let record = registry.read_binary_record(&key_path, "TZI")?;
    parse_tzi_record(&record, year)
}

/// Decode a REG_TZI_FORMAT record: `Bias`, `StandardBias` and
/// `DaylightBias` as little-endian i32 minutes to add to local time to
/// reach UTC (hence sign-inverted), then the standard and daylight
/// SYSTEMTIME transition descriptors. The base bias applies to both
/// periods.
fn parse_tzi_record(record: &[u8], year: i32) -> Result<TransitionRule> {
    if record.len() != TZI_LEN {
        return Err(Error::RegistryLookupFailed(format!(
            "TZI record has {} bytes, expected {TZI_LEN}",
            record.len()
        )));
    }

    let bias = read_i32(record, 0);
    let standard_bias = read_i32(record, 4);
    let daylight_bias = read_i32(record, 8);
    let standard_start_utc = read_system_time(record, 12, year);
    let daylight_start_utc = read_system_time(record, 28, year);

    let standard_offset = i64::from(-(bias + standard_bias)) * 60;
    let daylight_offset = i64::from(standard_bias - daylight_bias) * 60;

    Ok(TransitionRule::new(
        standard_offset,
        daylight_offset,
        daylight_start_utc,
        standard_start_utc,
        year,
    ))
}

fn read_i32(record: &[u8], at: usize) -> i32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&record[at..at + 4]);
    i32::from_le_bytes(bytes)
}

fn read_u16(record: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([record[at], record[at + 1]])
}

/// A SYSTEMTIME transition descriptor: year, month, day-of-week, day,
/// hour, minute, second, milliseconds as u16 fields. Recurring rules store
/// zero for the year; those are pinned to the resolution year so the
/// instant compares against same-year queries.
fn read_system_time(record: &[u8], at: usize, fallback_year: i32) -> CivilInstant {
    let year = read_u16(record, at);
    CivilInstant {
        year: if year == 0 {
            fallback_year
        } else {
            i32::from(year)
        },
        month: read_u16(record, at + 2) as u8,
        day: read_u16(record, at + 6) as u8,
        hour: read_u16(record, at + 8) as u8,
        minute: read_u16(record, at + 10) as u8,
        second: read_u16(record, at + 12) as u8,
    }
}

#[cfg(windows)]
pub use host::HostRegistry;

#[cfg(windows)]
mod host {
    use super::*;
    use std::ffi::OsStr;
    use std::os::windows::ffi::OsStrExt;
    use windows_sys::Win32::System::Registry::{
        HKEY, HKEY_LOCAL_MACHINE, KEY_READ, REG_BINARY, RegCloseKey, RegOpenKeyExW,
        RegQueryValueExW,
    };

    #[derive(Debug, Default)]
    pub struct HostRegistry;

    fn wide(s: &str) -> Vec<u16> {
        OsStr::new(s).encode_wide().chain(Some(0)).collect()
    }

    impl Registry for HostRegistry {
        fn read_binary_record(&self, key_path: &str, value_name: &str) -> Result<Vec<u8>> {
            let key_wide = wide(key_path);
            let mut key: HKEY = std::ptr::null_mut();
            let rc = unsafe {
                RegOpenKeyExW(HKEY_LOCAL_MACHINE, key_wide.as_ptr(), 0, KEY_READ, &mut key)
            };
            if rc != 0 {
                return Err(Error::RegistryLookupFailed(format!(
                    "open {key_path}: error {rc}"
                )));
            }

            let value_wide = wide(value_name);
            let mut data = vec![0u8; TZI_LEN];
            let mut len = data.len() as u32;
            let mut kind = 0u32;
            let rc = unsafe {
                RegQueryValueExW(
                    key,
                    value_wide.as_ptr(),
                    std::ptr::null_mut(),
                    &mut kind,
                    data.as_mut_ptr(),
                    &mut len,
                )
            };
            unsafe { RegCloseKey(key) };
            if rc != 0 || kind != REG_BINARY {
                return Err(Error::RegistryLookupFailed(format!(
                    "query {value_name} under {key_path}: error {rc}"
                )));
            }
            data.truncate(len as usize);
            Ok(data)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Pacific Standard Time: bias 480, no standard bias, daylight bias
    /// -60; standard switch on the first Sunday of November at 02:00,
    /// daylight switch on the second Sunday of March at 02:00.
    fn pacific_tzi() -> Vec<u8> {
        let mut record = Vec::with_capacity(TZI_LEN);
        record.extend_from_slice(&480i32.to_le_bytes());
        record.extend_from_slice(&0i32.to_le_bytes());
        record.extend_from_slice(&(-60i32).to_le_bytes());
        for field in [0u16, 11, 0, 1, 2, 0, 0, 0] {
            record.extend_from_slice(&field.to_le_bytes());
        }
        for field in [0u16, 3, 0, 2, 2, 0, 0, 0] {
            record.extend_from_slice(&field.to_le_bytes());
        }
        record
    }

    #[test]
    fn decodes_biases_and_both_transition_descriptors() -> anyhow::Result<()> {
        let rule = parse_tzi_record(&pacific_tzi(), 2024)?;
        assert_eq!(rule.standard_offset(), -28_800);
        assert_eq!(rule.daylight_offset(), 3_600);
        assert_eq!(rule.standard_start_utc().year, 2024);
        assert_eq!(rule.standard_start_utc().month, 11);
        assert_eq!(rule.standard_start_utc().hour, 2);
        // The daylight descriptor is captured in its own slot.
        assert_eq!(rule.daylight_start_utc().month, 3);
        assert_eq!(rule.daylight_start_utc().day, 2);
        Ok(())
    }

    #[test]
    fn rejects_short_records() {
        assert!(matches!(
            parse_tzi_record(&[0u8; 20], 2024),
            Err(Error::RegistryLookupFailed(_))
        ));
    }

    #[test]
    fn resolve_maps_the_zone_to_its_windows_key() -> anyhow::Result<()> {
        let zone = ZoneName::new("America/Los_Angeles")?;
        let mut registry = MockRegistry::new();
        registry
            .expect_read_binary_record()
            .withf(|key_path, value_name| {
                key_path
                    == "SOFTWARE\\Microsoft\\Windows NT\\CurrentVersion\\Time Zones\\Pacific Standard Time"
                    && value_name == "TZI"
            })
            .returning(|_, _| Ok(pacific_tzi()));

        let rule = resolve(&registry, &zone, 2024)?;
        assert_eq!(rule.standard_offset(), -28_800);
        Ok(())
    }

    #[test]
    fn resolve_fails_for_unmapped_zones() -> anyhow::Result<()> {
        let zone = ZoneName::new("Mars/Olympus_Mons")?;
        let registry = MockRegistry::new();
        assert!(matches!(
            resolve(&registry, &zone, 2024),
            Err(Error::RegistryLookupFailed(_))
        ));
        Ok(())
    }
}
