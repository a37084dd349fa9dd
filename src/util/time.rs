//! Day-granularity time arithmetic over store timestamps.
//!
//! There is exactly one timestamp type in the crate. Inside document trees it
//! appears as an opaque leaf (`DocValue::Time`) that the patch engine passes
//! through whole; here it is a millisecond instant with the few arithmetic
//! helpers the derivation pipeline needs.

use chrono::{DateTime, TimeZone, Utc};
use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Milliseconds in one day.
pub const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Key used when a timestamp leaf crosses the JSON boundary.
pub(crate) const TIME_KEY: &str = "$time";

/// An opaque store timestamp, millisecond precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp {
    millis: i64,
}

impl Timestamp {
    /// Current wall-clock time.
    #[must_use]
    pub fn now() -> Self {
        Self {
            millis: Utc::now().timestamp_millis(),
        }
    }

    #[must_use]
    pub const fn from_millis(millis: i64) -> Self {
        Self { millis }
    }

    #[must_use]
    pub const fn to_millis(self) -> i64 {
        self.millis
    }

    /// Convert to a `chrono` instant (saturating on overflow).
    #[must_use]
    pub fn to_datetime(self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.millis)
            .single()
            .unwrap_or_default()
    }

    #[must_use]
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self {
            millis: dt.timestamp_millis(),
        }
    }

    /// This instant shifted forward by whole days (negative shifts back).
    #[must_use]
    pub const fn add_days(self, days: i64) -> Self {
        Self {
            millis: self.millis + days * DAY_MS,
        }
    }
}

/// Whole days between two instants, direction-insensitive.
#[must_use]
pub const fn days_between(a: Timestamp, b: Timestamp) -> i64 {
    (a.millis - b.millis).abs() / DAY_MS
}

// Serialized as a single-key map so the JSON bridge can tell a timestamp
// apart from plain data and re-wrap it as an opaque leaf.
impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(TIME_KEY, &self.millis)?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TimestampVisitor;

        impl<'de> Visitor<'de> for TimestampVisitor {
            type Value = Timestamp;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "a map {{\"{TIME_KEY}\": millis}}")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Timestamp, A::Error> {
                let mut millis: Option<i64> = None;
                while let Some(key) = access.next_key::<String>()? {
                    if key == TIME_KEY {
                        millis = Some(access.next_value()?);
                    } else {
                        return Err(de::Error::unknown_field(&key, &[TIME_KEY]));
                    }
                }
                millis
                    .map(Timestamp::from_millis)
                    .ok_or_else(|| de::Error::missing_field(TIME_KEY))
            }
        }

        deserializer.deserialize_map(TimestampVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_days_and_days_between() {
        let t = Timestamp::from_millis(1_700_000_000_000);
        let later = t.add_days(31);
        assert_eq!(days_between(t, later), 31);
        assert_eq!(days_between(later, t), 31);
    }

    #[test]
    fn days_between_floors_partial_days() {
        let t = Timestamp::from_millis(0);
        let almost_week = Timestamp::from_millis(7 * DAY_MS - 1);
        assert_eq!(days_between(t, almost_week), 6);
    }

    #[test]
    fn serde_roundtrip() {
        let t = Timestamp::from_millis(123_456_789);
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(json, r#"{"$time":123456789}"#);
        let back: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn datetime_roundtrip() {
        let now = Timestamp::now();
        assert_eq!(Timestamp::from_datetime(now.to_datetime()), now);
    }
}
