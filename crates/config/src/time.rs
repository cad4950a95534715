//! Time zone used when rendering timestamps

use std::fmt;
use std::str::FromStr;

use chrono::FixedOffset;
use serde::{Deserialize, Deserializer};

use crate::error::ConfigError;

/// Zone applied to epoch timestamps before formatting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimeZoneSetting {
    /// The host's local zone, DST aware (default)
    #[default]
    Local,
    Utc,
    /// A fixed offset such as `+02:00` or `-05:30`
    Fixed(FixedOffset),
}

impl FromStr for TimeZoneSetting {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("local") {
            return Ok(Self::Local);
        }
        if s.eq_ignore_ascii_case("utc") || s == "Z" {
            return Ok(Self::Utc);
        }
        parse_offset(s).map(Self::Fixed).ok_or_else(|| {
            ConfigError::rejected(
                "time",
                "timezone",
                format!("expected local, utc or ±HH:MM, got '{}'", s),
            )
        })
    }
}

impl fmt::Display for TimeZoneSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.write_str("local"),
            Self::Utc => f.write_str("utc"),
            Self::Fixed(offset) => write!(f, "{}", offset),
        }
    }
}

impl<'de> Deserialize<'de> for TimeZoneSetting {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Parse `±HH:MM` or `±HHMM`
fn parse_offset(s: &str) -> Option<FixedOffset> {
    let (sign, rest) = match s.as_bytes().first()? {
        b'+' => (1, &s[1..]),
        b'-' => (-1, &s[1..]),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// ```toml
/// [time]
/// timezone = "utc"
/// ```
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct TimeConfig {
    pub timezone: TimeZoneSetting,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_named_zones() {
        assert_eq!("local".parse::<TimeZoneSetting>().unwrap(), TimeZoneSetting::Local);
        assert_eq!("UTC".parse::<TimeZoneSetting>().unwrap(), TimeZoneSetting::Utc);
    }

    #[test]
    fn test_parse_offsets() {
        let plus = "+02:00".parse::<TimeZoneSetting>().unwrap();
        assert_eq!(plus, TimeZoneSetting::Fixed(FixedOffset::east_opt(7200).unwrap()));

        let minus = "-0530".parse::<TimeZoneSetting>().unwrap();
        assert_eq!(
            minus,
            TimeZoneSetting::Fixed(FixedOffset::west_opt(5 * 3600 + 30 * 60).unwrap())
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("Europe/Paris".parse::<TimeZoneSetting>().is_err());
        assert!("+25:00".parse::<TimeZoneSetting>().is_err());
        assert!("+2".parse::<TimeZoneSetting>().is_err());
    }

    #[test]
    fn test_deserialize() {
        let config: TimeConfig = toml::from_str(r#"timezone = "utc""#).unwrap();
        assert_eq!(config.timezone, TimeZoneSetting::Utc);

        let config: TimeConfig = toml::from_str("").unwrap();
        assert_eq!(config.timezone, TimeZoneSetting::Local);

        assert!(toml::from_str::<TimeConfig>(r#"timezone = "mars""#).is_err());
    }
}
