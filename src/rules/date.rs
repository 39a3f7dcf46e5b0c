//! Fixed offset fallback through the date utility.
//!
//! Used only after the transition dump fails. `date` cannot describe
//! transitions, so a zone resolved this way carries one fixed offset and
//! reports no daylight saving.

use crate::error::{Error, Result};
use crate::exec::CommandRunner;
use crate::rule::TransitionRule;
use crate::zone::ZoneName;
use std::fs;
use std::time::Duration;
use tempfile::NamedTempFile;

const TIMEOUT: Duration = Duration::from_secs(1);

/// Ask `date` for the zone's current `±HHMM` offset:
///
/// ```text
/// $ TZ=America/New_York date +%z
/// -0400
/// ```
pub fn resolve(runner: &impl CommandRunner, zone: &ZoneName, year: i32) -> Result<TransitionRule> {
    let capture = NamedTempFile::new()
        .map_err(|e| Error::ExternalToolFailed(format!("create capture file: {e}")))?;
    let command_line = format!("TZ={} date +%z", zone.as_str());

    let ok = runner
        .run_captured(&command_line, TIMEOUT, capture.path())
        .map_err(|e| Error::ExternalToolFailed(format!("{command_line}: {e}")))?;
    if !ok {
        return Err(Error::ExternalToolFailed(format!(
            "{command_line}: non-zero exit or timeout"
        )));
    }

    let output = fs::read_to_string(capture.path())
        .map_err(|e| Error::ExternalToolFailed(format!("read captured output: {e}")))?;
    Ok(TransitionRule::fixed(parse_offset(output.trim())?, year))
}

/// Parse a `±HHMM` offset into seconds.
fn parse_offset(token: &str) -> Result<i64> {
    let malformed = || Error::ExternalToolFailed(format!("malformed offset: {token:?}"));

    let bytes = token.as_bytes();
    if bytes.len() != 5 {
        return Err(malformed());
    }
    let sign: i64 = match bytes[0] {
        b'+' => 1,
        b'-' => -1,
        _ => return Err(malformed()),
    };
    let hours: i64 = token[1..3].parse().map_err(|_| malformed())?;
    let minutes: i64 = token[3..5].parse().map_err(|_| malformed())?;

    Ok(sign * (hours * 3600 + minutes * 60))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::MockCommandRunner;

    #[test]
    fn parses_signed_offsets() -> anyhow::Result<()> {
        assert_eq!(parse_offset("+0000")?, 0);
        assert_eq!(parse_offset("-0400")?, -14_400);
        assert_eq!(parse_offset("+0530")?, 19_800);
        assert_eq!(parse_offset("-1000")?, -36_000);
        Ok(())
    }

    #[test]
    fn rejects_malformed_offsets() {
        for token in ["", "0400", "+400", "+04:00", "+ab00", "UTC+4"] {
            assert!(
                matches!(parse_offset(token), Err(Error::ExternalToolFailed(_))),
                "accepted {token:?}"
            );
        }
    }

    #[test]
    fn resolve_builds_a_fixed_rule() -> anyhow::Result<()> {
        let zone = ZoneName::new("Asia/Calcutta")?;
        let mut runner = MockCommandRunner::new();
        runner
            .expect_run_captured()
            .withf(|command_line, timeout, _| {
                command_line == "TZ=Asia/Calcutta date +%z" && *timeout == TIMEOUT
            })
            .returning(|_, _, capture| {
                fs::write(capture, "+0530\n")?;
                Ok(true)
            });

        let rule = resolve(&runner, &zone, 2024)?;
        assert_eq!(rule.standard_offset(), 19_800);
        assert!(!rule.has_daylight_saving());
        assert_eq!(rule.year(), 2024);
        Ok(())
    }

    #[test]
    fn resolve_fails_on_bad_exit() -> anyhow::Result<()> {
        let zone = ZoneName::new("Asia/Calcutta")?;
        let mut runner = MockCommandRunner::new();
        runner.expect_run_captured().returning(|_, _, _| Ok(false));

        assert!(matches!(
            resolve(&runner, &zone, 2024),
            Err(Error::ExternalToolFailed(_))
        ));
        Ok(())
    }
}
