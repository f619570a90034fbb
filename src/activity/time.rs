//! Wire format of activity timestamps.
//!
//! The service stores naive date-times with microsecond precision and no
//! offset, e.g. `2016-08-01T12:30:45.123456`. It interprets them as UTC.

use jiff::RoundMode;
use jiff::Timestamp;
use jiff::Unit;
use jiff::civil::{DateTime, DateTimeRound};
use jiff::tz::TimeZone;

const FORMAT: &str = "%Y-%m-%dT%H:%M:%S.%6f";
const PARSE_FMT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Always six fractional digits, zero padded.
pub fn format(time: DateTime) -> String {
    truncate_to_micros(time).strftime(FORMAT).to_string()
}

/// Parse a wire timestamp. The fraction is optional on input; digits past
/// microseconds are dropped.
pub fn parse(input: &str) -> Option<DateTime> {
    DateTime::strptime(PARSE_FMT, input)
        .ok()
        .map(truncate_to_micros)
}

/// Current UTC wall-clock time, truncated to what the wire format carries.
pub(crate) fn now() -> DateTime {
    truncate_to_micros(Timestamp::now().to_zoned(TimeZone::UTC).datetime())
}

pub(crate) fn truncate_to_micros(time: DateTime) -> DateTime {
    let micros = DateTimeRound::new()
        .smallest(Unit::Microsecond)
        .mode(RoundMode::Trunc);
    time.round(micros).unwrap_or(time)
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;

    use super::{format, parse, truncate_to_micros};

    #[test]
    fn format_pads_microseconds() {
        let time = date(2016, 8, 1).at(12, 30, 45, 0);
        assert_eq!(format(time), "2016-08-01T12:30:45.000000");

        let time = date(2016, 8, 1).at(9, 5, 7, 123_456_789);
        assert_eq!(format(time), "2016-08-01T09:05:07.123456");
    }

    #[test]
    fn parse_with_and_without_fraction() {
        assert_eq!(
            parse("2016-08-01T12:30:45.123456"),
            Some(date(2016, 8, 1).at(12, 30, 45, 123_456_000))
        );
        assert_eq!(
            parse("2016-08-01T12:30:45"),
            Some(date(2016, 8, 1).at(12, 30, 45, 0))
        );
    }

    #[test]
    fn parse_drops_sub_microsecond_digits() {
        let parsed = parse("2016-08-01T12:30:45.123456789");
        assert_eq!(parsed, Some(date(2016, 8, 1).at(12, 30, 45, 123_456_000)));
        assert_eq!(parsed.map(format).as_deref(), Some("2016-08-01T12:30:45.123456"));
    }

    #[test]
    fn truncation_never_rounds_up() {
        let time = date(2021, 12, 31).at(23, 59, 59, 999_999_999);
        assert_eq!(
            truncate_to_micros(time),
            date(2021, 12, 31).at(23, 59, 59, 999_999_000)
        );
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(parse("abc"), None);
        assert_eq!(parse(""), None);
        assert_eq!(parse("2016-13-01T12:30:45"), None);
    }

    #[test]
    fn format_then_parse_keeps_microseconds() {
        let time = truncate_to_micros(date(2021, 2, 28).at(23, 59, 59, 999_999_999));
        assert_eq!(parse(&format(time)), Some(time));
    }
}
