//! UTC formatting of capture timestamps.

use chrono::{DateTime, SecondsFormat, Utc};

fn utc(timestamp_micros: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_micros(timestamp_micros).unwrap_or_default()
}

/// Formats a timestamp as `2024-05-01 12:00:00.000001 UTC`, the form stored
/// in container headers.
#[must_use]
pub fn format_header_time(timestamp_micros: i64) -> String {
    utc(timestamp_micros)
        .format("%Y-%m-%d %H:%M:%S%.6f UTC")
        .to_string()
}

/// Formats a timestamp as RFC 3339 with trailing fractional zeros removed,
/// as used in time-sliced file names.
#[must_use]
pub fn format_rfc3339(timestamp_micros: i64) -> String {
    let text = utc(timestamp_micros).to_rfc3339_opts(SecondsFormat::Micros, true);
    let seconds = text.trim_end_matches('Z');
    let seconds = seconds.trim_end_matches('0').trim_end_matches('.');
    format!("{seconds}Z")
}

#[cfg(test)]
mod tests {
    use super::*;

    const MICROS_PER_SECOND: i64 = 1_000_000;

    #[test]
    fn epoch() {
        assert_eq!(format_header_time(0), "1970-01-01 00:00:00.000000 UTC");
        assert_eq!(format_rfc3339(0), "1970-01-01T00:00:00Z");
    }

    #[test]
    fn known_instant() {
        // 2024-05-01T12:00:00Z
        let micros = 1_714_564_800 * MICROS_PER_SECOND + 1;
        assert_eq!(format_header_time(micros), "2024-05-01 12:00:00.000001 UTC");
        assert_eq!(format_rfc3339(micros), "2024-05-01T12:00:00.000001Z");
    }

    #[test]
    fn leap_day_and_fraction_trim() {
        // 2020-02-29T23:59:59.5Z
        let micros = 1_583_020_799 * MICROS_PER_SECOND + 500_000;
        assert_eq!(format_rfc3339(micros), "2020-02-29T23:59:59.5Z");
        assert_eq!(format_header_time(micros), "2020-02-29 23:59:59.500000 UTC");
    }

    #[test]
    fn whole_seconds_keep_their_zeros() {
        // 2000-01-01T00:00:10Z
        let micros = 946_684_810 * MICROS_PER_SECOND;
        assert_eq!(format_rfc3339(micros), "2000-01-01T00:00:10Z");
    }

    #[test]
    fn before_epoch() {
        assert_eq!(format_header_time(-1), "1969-12-31 23:59:59.999999 UTC");
    }
}
