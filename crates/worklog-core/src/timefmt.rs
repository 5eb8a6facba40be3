//! Timestamp and duration formats.
//!
//! Display formats shift the epoch by the profile's hour offset
//! instead of constructing a fixed-offset timezone, so out-of-range
//! offsets still render something sensible. The ISO-8601 duration
//! codec is the wire format the store uses for pause totals.

use chrono::{DateTime, Utc};

use crate::clock::Timestamp;

/// `DD-MM-YYYY HH:MM` shifted by `tz_hours`.
pub fn format_stamp(ts: Timestamp, tz_hours: i64) -> String {
    shifted(ts, tz_hours).format("%d-%m-%Y %H:%M").to_string()
}

/// `DD.MM.YYYY HH:MM:SS` shifted by `tz_hours`, used on live timer
/// screens.
pub fn format_stamp_full(ts: Timestamp, tz_hours: i64) -> String {
    shifted(ts, tz_hours).format("%d.%m.%Y %H:%M:%S").to_string()
}

fn shifted(ts: Timestamp, tz_hours: i64) -> DateTime<Utc> {
    let secs = ts.saturating_add(tz_hours.saturating_mul(3600));
    DateTime::from_timestamp(secs, 0)
        .or_else(|| DateTime::from_timestamp(0, 0))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// `H:MM:SS` with unbounded hours. Negative inputs render as zero.
pub fn format_duration(total_secs: i64) -> String {
    let total = total_secs.max(0);
    format!("{}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}

/// ISO-8601 duration in whole seconds, e.g. `PT75S`.
pub fn encode_duration(total_secs: i64) -> String {
    format!("PT{}S", total_secs.max(0))
}

/// Parse the `PTnHnMnS` subset of ISO-8601 durations into seconds.
pub fn parse_duration(s: &str) -> Option<i64> {
    let rest = s.strip_prefix("PT")?;
    if rest.is_empty() {
        return None;
    }
    let mut total: i64 = 0;
    let mut digits = String::new();
    for ch in rest.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
            continue;
        }
        let value: i64 = digits.parse().ok()?;
        digits.clear();
        let scaled = match ch {
            'H' => value.checked_mul(3600)?,
            'M' => value.checked_mul(60)?,
            'S' => value,
            _ => return None,
        };
        total = total.checked_add(scaled)?;
    }
    if !digits.is_empty() {
        return None;
    }
    Some(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stamps_shift_by_hour_offset() {
        assert_eq!(format_stamp(0, 0), "01-01-1970 00:00");
        assert_eq!(format_stamp(0, 3), "01-01-1970 03:00");
        assert_eq!(format_stamp(0, -1), "31-12-1969 23:00");
    }

    #[test]
    fn full_stamp_has_seconds() {
        assert_eq!(format_stamp_full(59, 0), "01.01.1970 00:00:59");
    }

    #[test]
    fn durations_render_with_unbounded_hours() {
        assert_eq!(format_duration(0), "0:00:00");
        assert_eq!(format_duration(75), "0:01:15");
        assert_eq!(format_duration(26 * 3600 + 61), "26:01:01");
        assert_eq!(format_duration(-5), "0:00:00");
    }

    #[test]
    fn iso_durations_round_trip() {
        assert_eq!(encode_duration(75), "PT75S");
        assert_eq!(parse_duration("PT75S"), Some(75));
        assert_eq!(parse_duration("PT1H2M3S"), Some(3723));
        assert_eq!(parse_duration("PT0S"), Some(0));
    }

    #[test]
    fn malformed_durations_are_rejected() {
        assert_eq!(parse_duration("75"), None);
        assert_eq!(parse_duration("PT"), None);
        assert_eq!(parse_duration("PT5"), None);
        assert_eq!(parse_duration("PT5X"), None);
    }

    #[test]
    fn extreme_offsets_do_not_panic() {
        let _ = format_stamp(i64::MAX, i64::MAX);
        let _ = format_stamp(i64::MIN, -9999);
    }
}
