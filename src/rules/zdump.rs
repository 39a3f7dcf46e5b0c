//! Transition resolution through the zdump utility.

use crate::civil::{CivilInstant, diff_seconds, month_from_abbrev};
use crate::error::{Error, Result};
use crate::exec::CommandRunner;
use crate::rule::TransitionRule;
use crate::zone::ZoneName;
use std::fs;
use std::time::Duration;
use tempfile::NamedTempFile;

/// zdump can be slow on loaded machines; the original engine settled on a
/// generous bound here.
const TIMEOUT: Duration = Duration::from_secs(5);

/// Resolve a zone's transitions for one year by dumping them:
///
/// ```text
/// $ zdump -v America/New_York | grep 2016
/// America/New_York  Sun Mar 13 06:59:59 2016 UT = Sun Mar 13 01:59:59 2016 EST isdst=0
/// America/New_York  Sun Mar 13 07:00:00 2016 UT = Sun Mar 13 03:00:00 2016 EDT isdst=1
/// America/New_York  Sun Nov  6 05:59:59 2016 UT = Sun Nov  6 01:59:59 2016 EDT isdst=1
/// America/New_York  Sun Nov  6 06:00:00 2016 UT = Sun Nov  6 01:00:00 2016 EST isdst=0
/// ```
///
/// A zone with one daylight pair prints four lines per year: a pair per
/// switch, one second before it and the instant after it. The instants
/// after each switch (lines 2 and 4) carry the UTC transition moment and
/// the local time it maps to; the offsets fall out of their differences.
pub fn resolve(runner: &impl CommandRunner, zone: &ZoneName, year: i32) -> Result<TransitionRule> {
    let capture = NamedTempFile::new()
        .map_err(|e| Error::ExternalToolFailed(format!("create capture file: {e}")))?;
    let command_line = format!("zdump -v {} | grep {}", zone.as_str(), year);

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
    parse_transitions(&output, year)
}

fn parse_transitions(output: &str, year: i32) -> Result<TransitionRule> {
    let lines: Vec<&str> = output.lines().filter(|line| !line.trim().is_empty()).collect();
    if lines.len() != 4 {
        return Err(Error::ExternalToolFailed(format!(
            "expected 4 transition lines, got {}",
            lines.len()
        )));
    }

    let (daylight_start_utc, daylight_local) = parse_transition_line(lines[1])?;
    let (standard_start_utc, standard_local) = parse_transition_line(lines[3])?;

    let daylight_total = diff_seconds(&daylight_local, &daylight_start_utc);
    let standard_offset = diff_seconds(&standard_local, &standard_start_utc);

    Ok(TransitionRule::new(
        standard_offset,
        daylight_total - standard_offset,
        daylight_start_utc,
        standard_start_utc,
        year,
    ))
}

/// Tokens 2..6 of a transition line are the UTC instant, tokens 9..13 the
/// local instant (token 0 is the zone, 1/8 the weekdays, 6..8 `UT =`).
fn parse_transition_line(line: &str) -> Result<(CivilInstant, CivilInstant)> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < 13 {
        return Err(Error::ExternalToolFailed(format!(
            "malformed transition line: {line:?}"
        )));
    }
    Ok((parse_instant(&tokens[2..6])?, parse_instant(&tokens[9..13])?))
}

/// Parse `Mon day HH:MM:SS year`, e.g. `Mar 13 07:00:00 2016`.
fn parse_instant(tokens: &[&str]) -> Result<CivilInstant> {
    let malformed = || Error::ExternalToolFailed(format!("malformed transition instant: {tokens:?}"));

    let month = month_from_abbrev(tokens[0]).ok_or_else(malformed)?;
    let day = tokens[1].parse().map_err(|_| malformed())?;
    let time = tokens[2];
    if time.len() != 8 {
        return Err(malformed());
    }
    let hour = time[0..2].parse().map_err(|_| malformed())?;
    let minute = time[3..5].parse().map_err(|_| malformed())?;
    let second = time[6..8].parse().map_err(|_| malformed())?;
    let year = tokens[3].parse().map_err(|_| malformed())?;

    Ok(CivilInstant {
        year,
        month,
        day,
        hour,
        minute,
        second,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::MockCommandRunner;

    const NEW_YORK_2016: &str = "\
America/New_York  Sun Mar 13 06:59:59 2016 UT = Sun Mar 13 01:59:59 2016 EST isdst=0
America/New_York  Sun Mar 13 07:00:00 2016 UT = Sun Mar 13 03:00:00 2016 EDT isdst=1
America/New_York  Sun Nov  6 05:59:59 2016 UT = Sun Nov  6 01:59:59 2016 EDT isdst=1
America/New_York  Sun Nov  6 06:00:00 2016 UT = Sun Nov  6 01:00:00 2016 EST isdst=0
";

    #[test]
    fn parses_a_daylight_saving_zone() -> anyhow::Result<()> {
        let rule = parse_transitions(NEW_YORK_2016, 2016)?;
        assert_eq!(rule.standard_offset(), -18_000);
        assert_eq!(rule.daylight_offset(), 3_600);
        assert_eq!(
            rule.daylight_start_utc(),
            CivilInstant {
                year: 2016,
                month: 3,
                day: 13,
                hour: 7,
                minute: 0,
                second: 0,
            }
        );
        assert_eq!(
            rule.standard_start_utc(),
            CivilInstant {
                year: 2016,
                month: 11,
                day: 6,
                hour: 6,
                minute: 0,
                second: 0,
            }
        );
        assert_eq!(rule.year(), 2016);
        Ok(())
    }

    #[test]
    fn eastern_hemisphere_offsets_carry_the_day_boundary() -> anyhow::Result<()> {
        // Local dates run one ahead of the UTC dates.
        let output = "\
Asia/Anadyr  Sat Mar 27 14:59:59 2010 UT = Sun Mar 28 01:59:59 2010 ANAT isdst=0
Asia/Anadyr  Sat Mar 27 15:00:00 2010 UT = Sun Mar 28 03:00:00 2010 ANAST isdst=1
Asia/Anadyr  Sat Oct 30 14:59:59 2010 UT = Sun Oct 31 02:59:59 2010 ANAST isdst=1
Asia/Anadyr  Sat Oct 30 15:00:00 2010 UT = Sun Oct 31 02:00:00 2010 ANAT isdst=0
";
        let rule = parse_transitions(output, 2010)?;
        assert_eq!(rule.standard_offset(), 39_600);
        assert_eq!(rule.daylight_offset(), 3_600);
        Ok(())
    }

    #[test]
    fn wrong_line_count_fails() {
        // A zone without daylight saving prints no transitions at all.
        assert!(matches!(
            parse_transitions("", 2016),
            Err(Error::ExternalToolFailed(_))
        ));
        let truncated: String = NEW_YORK_2016.lines().take(2).collect::<Vec<_>>().join("\n");
        assert!(matches!(
            parse_transitions(&truncated, 2016),
            Err(Error::ExternalToolFailed(_))
        ));
    }

    #[test]
    fn malformed_tokens_fail() {
        let garbled = NEW_YORK_2016.replace("Mar", "Mars").replace("Nov", "Novem");
        assert!(matches!(
            parse_transitions(&garbled, 2016),
            Err(Error::ExternalToolFailed(_))
        ));
    }

    #[test]
    fn resolve_runs_zdump_and_parses_the_capture() -> anyhow::Result<()> {
        let zone = ZoneName::new("America/New_York")?;
        let mut runner = MockCommandRunner::new();
        runner
            .expect_run_captured()
            .withf(|command_line, timeout, _| {
                command_line == "zdump -v America/New_York | grep 2016"
                    && *timeout == TIMEOUT
            })
            .returning(|_, _, capture| {
                fs::write(capture, NEW_YORK_2016)?;
                Ok(true)
            });

        let rule = resolve(&runner, &zone, 2016)?;
        assert_eq!(rule.standard_offset(), -18_000);
        assert_eq!(rule.daylight_offset(), 3_600);
        Ok(())
    }

    #[test]
    fn resolve_fails_on_timeout_or_bad_exit() -> anyhow::Result<()> {
        let zone = ZoneName::new("America/New_York")?;
        let mut runner = MockCommandRunner::new();
        runner.expect_run_captured().returning(|_, _, _| Ok(false));

        assert!(matches!(
            resolve(&runner, &zone, 2016),
            Err(Error::ExternalToolFailed(_))
        ));
        Ok(())
    }
}
