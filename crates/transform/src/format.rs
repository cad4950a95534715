//! Typed field formatters

use chrono::{DateTime, Local, Utc};
use logfold_config::TimeZoneSetting;

/// Date-time layout for request and event timestamps
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// How an event attribute is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldFormat {
    /// Verbatim
    Text,
    /// Decimal; zero renders empty
    Integer,
    /// Epoch milliseconds; positive renders as a date-time, zero empty,
    /// negative as the raw decimal
    MillisTimestamp,
}

/// Borrowed value of one event attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventValue<'a> {
    Text(&'a str),
    Integer(i64),
}

/// Renders epoch timestamps in the configured zone
#[derive(Debug, Clone, Copy, Default)]
pub struct DateTimeFormatter {
    zone: TimeZoneSetting,
}

impl DateTimeFormatter {
    pub fn new(zone: TimeZoneSetting) -> Self {
        Self { zone }
    }

    pub fn zone(&self) -> TimeZoneSetting {
        self.zone
    }

    /// Format epoch milliseconds
    ///
    /// Values outside the representable range fall back to the raw decimal.
    pub fn format_millis(&self, millis: i64) -> String {
        match DateTime::<Utc>::from_timestamp_millis(millis) {
            Some(utc) => match self.zone {
                TimeZoneSetting::Local => utc
                    .with_timezone(&Local)
                    .format(DATE_TIME_FORMAT)
                    .to_string(),
                TimeZoneSetting::Utc => utc.format(DATE_TIME_FORMAT).to_string(),
                TimeZoneSetting::Fixed(offset) => utc
                    .with_timezone(&offset)
                    .format(DATE_TIME_FORMAT)
                    .to_string(),
            },
            None => millis.to_string(),
        }
    }

    /// Format epoch seconds carried as a float
    ///
    /// The millisecond part is clamped to `0..=999` so rounding never moves
    /// the value into the next second, and so never into the next day.
    pub fn format_seconds(&self, seconds: f64) -> String {
        let whole = seconds.floor();
        if !whole.is_finite() || whole.abs() >= (i64::MAX / 1000) as f64 {
            return seconds.to_string();
        }
        let fraction = ((seconds - whole) * 1000.0).round().clamp(0.0, 999.0);
        self.format_millis(whole as i64 * 1000 + fraction as i64)
    }
}

impl FieldFormat {
    /// Render one value
    ///
    /// A text value under a numeric format (or the reverse) is a schema
    /// bug; it renders verbatim.
    pub fn render(&self, value: EventValue<'_>, clock: &DateTimeFormatter) -> String {
        match (self, value) {
            (_, EventValue::Text(s)) => s.to_string(),
            (Self::Text, EventValue::Integer(n)) => n.to_string(),
            (Self::Integer, EventValue::Integer(0)) => String::new(),
            (Self::Integer, EventValue::Integer(n)) => n.to_string(),
            (Self::MillisTimestamp, EventValue::Integer(0)) => String::new(),
            (Self::MillisTimestamp, EventValue::Integer(n)) if n > 0 => clock.format_millis(n),
            (Self::MillisTimestamp, EventValue::Integer(n)) => n.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn utc() -> DateTimeFormatter {
        DateTimeFormatter::new(TimeZoneSetting::Utc)
    }

    #[test]
    fn test_integer_format() {
        let clock = utc();
        assert_eq!(FieldFormat::Integer.render(EventValue::Integer(42), &clock), "42");
        assert_eq!(FieldFormat::Integer.render(EventValue::Integer(-7), &clock), "-7");
        assert_eq!(FieldFormat::Integer.render(EventValue::Integer(0), &clock), "");
    }

    #[test]
    fn test_text_format() {
        let clock = utc();
        assert_eq!(FieldFormat::Text.render(EventValue::Text("a,b"), &clock), "a,b");
        assert_eq!(FieldFormat::Text.render(EventValue::Text(""), &clock), "");
    }

    #[test]
    fn test_millis_timestamp_format() {
        let clock = utc();
        let fmt = FieldFormat::MillisTimestamp;

        assert_eq!(
            fmt.render(EventValue::Integer(1_614_855_600_123), &clock),
            "2021-03-04 11:00:00.123"
        );
        assert_eq!(fmt.render(EventValue::Integer(0), &clock), "");
        assert_eq!(fmt.render(EventValue::Integer(-5), &clock), "-5");
    }

    #[test]
    fn test_fixed_offset() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let clock = DateTimeFormatter::new(TimeZoneSetting::Fixed(offset));

        assert_eq!(clock.format_millis(1_614_855_600_000), "2021-03-04 13:00:00.000");
    }

    #[test]
    fn test_format_seconds() {
        let clock = utc();

        assert_eq!(clock.format_seconds(1_614_855_600.25), "2021-03-04 11:00:00.250");
        assert_eq!(clock.format_seconds(0.0), "1970-01-01 00:00:00.000");
        assert_eq!(clock.format_seconds(-0.25), "1969-12-31 23:59:59.750");
    }

    #[test]
    fn test_format_seconds_stays_within_the_day() {
        let clock = utc();

        // 2021-03-04 23:59:59.9996
        assert_eq!(clock.format_seconds(1_614_902_399.9996), "2021-03-04 23:59:59.999");
        assert_eq!(clock.format_seconds(1_614_902_399.9994), "2021-03-04 23:59:59.999");
        assert_eq!(clock.format_seconds(1_614_902_400.0), "2021-03-05 00:00:00.000");
    }

    #[test]
    fn test_out_of_range_falls_back() {
        let clock = utc();
        assert_eq!(clock.format_millis(i64::MAX), i64::MAX.to_string());
        assert_eq!(clock.format_seconds(1e300), 1e300f64.to_string());
    }
}
