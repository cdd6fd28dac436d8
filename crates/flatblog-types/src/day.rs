use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// A calendar day (UTC), the key of the by-day time index.
///
/// Rendered as `YYYY-MM-DD`, which is also the index file name.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DayKey(NaiveDate);

impl DayKey {
    pub const FORMAT: &'static str = "%Y-%m-%d";

    /// The UTC day containing `timestamp`.
    pub fn of(timestamp: &DateTime<Utc>) -> Self {
        Self(timestamp.date_naive())
    }

    /// Parse a `YYYY-MM-DD` string.
    pub fn parse(input: &str) -> Result<Self, TypeError> {
        NaiveDate::parse_from_str(input, Self::FORMAT)
            .map(Self)
            .map_err(|e| TypeError::InvalidDay {
                input: input.to_string(),
                reason: e.to_string(),
            })
    }
}

impl fmt::Debug for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DayKey({self})")
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(Self::FORMAT))
    }
}

impl FromStr for DayKey {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for DayKey {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DayKey> for String {
    fn from(day: DayKey) -> Self {
        day.to_string()
    }
}

impl From<DateTime<Utc>> for DayKey {
    fn from(timestamp: DateTime<Utc>) -> Self {
        Self::of(&timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn formats_with_padding() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 7, 23, 59, 59).unwrap();
        assert_eq!(DayKey::of(&ts).to_string(), "2024-03-07");
    }

    #[test]
    fn same_day_different_times_share_a_key() {
        let morning = Utc.with_ymd_and_hms(2024, 3, 7, 0, 0, 0).unwrap();
        let night = Utc.with_ymd_and_hms(2024, 3, 7, 23, 59, 59).unwrap();
        assert_eq!(DayKey::of(&morning), DayKey::of(&night));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(DayKey::parse("2024-02-30").is_err());
        assert!(DayKey::parse("yesterday").is_err());
        let day = DayKey::parse("2024-02-29").unwrap();
        assert_eq!(day.to_string(), "2024-02-29");
    }

    #[test]
    fn serde_uses_string_form() {
        let day = DayKey::parse("2023-12-31").unwrap();
        let json = serde_json::to_string(&day).unwrap();
        assert_eq!(json, "\"2023-12-31\"");
        let back: DayKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, day);
    }
}
