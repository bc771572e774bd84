//! Schedule spec parsing: cron expressions, named descriptors, and
//! `@every <duration>` fixed intervals.

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::error::{Result, SchedulerError};

/// Fixed intervals shorter than this are rounded up.
const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Timezone used when computing cron due times.
///
/// Cron fields are evaluated in this zone; the resulting instants are
/// normalised back to UTC for the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// The host's local timezone (the default).
    Local,
    /// A named IANA zone, e.g. `Asia/Jakarta`.
    Tz(Tz),
}

impl Location {
    /// Resolve an optional IANA zone name from config.
    pub fn resolve(name: Option<&str>) -> Result<Self> {
        match name {
            None => Ok(Location::Local),
            Some(s) => s
                .parse::<Tz>()
                .map(Location::Tz)
                .map_err(|_| SchedulerError::UnknownTimezone(s.to_string())),
        }
    }
}

/// A computable "next run time" function produced by [`parse`].
#[derive(Debug, Clone)]
pub enum Schedule {
    /// Six-field cron expression or named descriptor.
    Cron(cron::Schedule),
    /// Fixed interval between due times.
    Every(Duration),
}

impl Schedule {
    /// The next due time strictly after `after`, or `None` when the
    /// schedule has no future occurrence.
    pub fn next_after(&self, after: DateTime<Utc>, location: Location) -> Option<DateTime<Utc>> {
        match self {
            Schedule::Cron(schedule) => match location {
                Location::Local => schedule
                    .after(&after.with_timezone(&chrono::Local))
                    .next()
                    .map(|dt| dt.with_timezone(&Utc)),
                Location::Tz(tz) => schedule
                    .after(&after.with_timezone(&tz))
                    .next()
                    .map(|dt| dt.with_timezone(&Utc)),
            },
            Schedule::Every(interval) => {
                let interval = chrono::Duration::from_std(*interval).ok()?;
                after.checked_add_signed(interval)
            }
        }
    }
}

/// Parse a schedule expression.
///
/// Accepted forms:
/// - six-field cron syntax with seconds granularity, e.g. `0 */10 * * * *`
/// - named descriptors: `@hourly`, `@daily`, `@weekly`, `@monthly`, `@yearly`
/// - fixed intervals: `@every 5m`, `@every 1h30m`, `@every 90s`
///
/// Pure function, no side effects. Parsing the same string twice yields
/// schedules producing identical due-time sequences.
pub fn parse(spec: &str) -> Result<Schedule> {
    let trimmed = spec.trim();
    if trimmed.is_empty() {
        return Err(SchedulerError::invalid_spec(spec, "empty expression"));
    }

    if let Some(rest) = trimmed.strip_prefix("@every") {
        let interval = parse_duration(rest.trim())
            .map_err(|reason| SchedulerError::invalid_spec(spec, reason))?;
        return Ok(Schedule::Every(interval.max(MIN_INTERVAL)));
    }

    let schedule = cron::Schedule::from_str(trimmed)
        .map_err(|e| SchedulerError::invalid_spec(spec, e))?;
    Ok(Schedule::Cron(schedule))
}

/// Parse a Go-style duration literal: one or more `<integer><unit>`
/// segments where unit is `ms`, `s`, `m`, or `h`. Examples: `90s`,
/// `1h30m`, `500ms`.
fn parse_duration(input: &str) -> std::result::Result<Duration, String> {
    if input.is_empty() {
        return Err("missing duration".to_string());
    }

    let mut total = Duration::ZERO;
    let mut rest = input;
    while !rest.is_empty() {
        let digits_end = rest
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| format!("missing unit in duration {input:?}"))?;
        if digits_end == 0 {
            return Err(format!("expected digit in duration {input:?}"));
        }
        let value: u64 = rest[..digits_end]
            .parse()
            .map_err(|_| format!("bad number in duration {input:?}"))?;
        rest = &rest[digits_end..];

        let (unit_len, unit) = if rest.starts_with("ms") {
            (2, Duration::from_millis(1))
        } else if rest.starts_with('s') {
            (1, Duration::from_secs(1))
        } else if rest.starts_with('m') {
            (1, Duration::from_secs(60))
        } else if rest.starts_with('h') {
            (1, Duration::from_secs(3600))
        } else {
            return Err(format!("unknown unit in duration {input:?}"));
        };
        rest = &rest[unit_len..];

        total = total
            .checked_add(unit.saturating_mul(value.min(u32::MAX as u64) as u32))
            .ok_or_else(|| format!("duration {input:?} overflows"))?;
    }

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn six_field_cron_parses() {
        assert!(matches!(parse("0 */10 * * * *"), Ok(Schedule::Cron(_))));
        assert!(matches!(parse("0 0 1 * * *"), Ok(Schedule::Cron(_))));
    }

    #[test]
    fn descriptors_parse() {
        for spec in ["@hourly", "@daily", "@weekly", "@monthly", "@yearly"] {
            assert!(matches!(parse(spec), Ok(Schedule::Cron(_))), "{spec}");
        }
    }

    #[test]
    fn every_parses_compound_durations() {
        match parse("@every 1h30m") {
            Ok(Schedule::Every(d)) => assert_eq!(d, Duration::from_secs(5400)),
            other => panic!("unexpected: {other:?}"),
        }
        match parse("@every 90s") {
            Ok(Schedule::Every(d)) => assert_eq!(d, Duration::from_secs(90)),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn every_rounds_up_to_one_second() {
        match parse("@every 500ms") {
            Ok(Schedule::Every(d)) => assert_eq!(d, Duration::from_secs(1)),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn invalid_specs_carry_the_original_string() {
        for spec in ["this is not cron", "@every", "@every tomorrow", ""] {
            match parse(spec) {
                Err(SchedulerError::InvalidSpec { spec: s, .. }) => assert_eq!(s, spec),
                other => panic!("expected InvalidSpec for {spec:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn parsing_is_deterministic() {
        let a = parse("0 30 4 1 * *").unwrap();
        let b = parse("0 30 4 1 * *").unwrap();
        let start = Utc::now();

        let mut next_a = start;
        let mut next_b = start;
        for _ in 0..5 {
            next_a = a.next_after(next_a, Location::Local).unwrap();
            next_b = b.next_after(next_b, Location::Local).unwrap();
            assert_eq!(next_a, next_b);
        }
    }

    #[test]
    fn cron_due_times_follow_the_configured_zone() {
        let schedule = parse("0 0 3 * * *").unwrap();
        let after = Utc::now();
        let jakarta = Location::resolve(Some("Asia/Jakarta")).unwrap();

        let next = schedule.next_after(after, jakarta).unwrap();
        // 03:00 in UTC+7 is 20:00 UTC.
        assert_eq!(next.format("%H:%M").to_string(), "20:00");
    }

    #[test]
    fn unknown_timezone_is_rejected() {
        assert!(matches!(
            Location::resolve(Some("Not/AZone")),
            Err(SchedulerError::UnknownTimezone(_))
        ));
    }

    #[test]
    fn every_advances_by_the_interval() {
        let schedule = parse("@every 5m").unwrap();
        let start = Utc::now();
        let next = schedule.next_after(start, Location::Local).unwrap();
        assert_eq!(next - start, chrono::Duration::minutes(5));
    }
}
