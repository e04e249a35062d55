//! # Snowflake Identifiers
//!
//! Every remote object is addressed by a 64-bit id assigned by the platform. The
//! upper 42 bits hold the creation time in milliseconds since the platform epoch,
//! so an id alone is enough to know when its entity was created.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{self, Display};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Milliseconds between the Unix epoch and the platform epoch (2015-01-01T00:00:00Z).
pub const PLATFORM_EPOCH_MS: u64 = 1_420_070_400_000;

/// Type-safe, externally assigned identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Id(pub u64);

impl Id {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    /// Milliseconds since the Unix epoch at which this id was minted.
    pub const fn timestamp_millis(self) -> u64 {
        (self.0 >> 22) + PLATFORM_EPOCH_MS
    }

    /// The creation time embedded in the id.
    pub fn created_at(self) -> SystemTime {
        UNIX_EPOCH + Duration::from_millis(self.timestamp_millis())
    }

    /// Smallest id that could have been minted at `millis` (Unix epoch). Useful as a
    /// pagination cursor.
    pub const fn from_timestamp_millis(millis: u64) -> Self {
        Self(millis.saturating_sub(PLATFORM_EPOCH_MS) << 22)
    }
}

impl From<u64> for Id {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// The wire carries ids as decimal strings so they survive 53-bit JSON readers.
impl Serialize for Id {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct IdVisitor;

        impl Visitor<'_> for IdVisitor {
            type Value = Id;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a snowflake as a decimal string or an unsigned integer")
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<Id, E> {
                Ok(Id(value))
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<Id, E> {
                u64::try_from(value)
                    .map(Id)
                    .map_err(|_| E::custom("snowflake must not be negative"))
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Id, E> {
                value.parse::<u64>().map(Id).map_err(E::custom)
            }
        }

        deserializer.deserialize_any(IdVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_created_at_uses_platform_epoch() {
        // 175928847299117063 was minted at 1462015105796 ms.
        let id = Id(175_928_847_299_117_063);
        assert_eq!(id.timestamp_millis(), 1_462_015_105_796);
        assert_eq!(
            id.created_at(),
            UNIX_EPOCH + Duration::from_millis(1_462_015_105_796)
        );
    }

    #[test]
    fn test_from_timestamp_is_lower_bound() {
        let id = Id(175_928_847_299_117_063);
        let floor = Id::from_timestamp_millis(id.timestamp_millis());
        assert!(floor <= id);
        assert_eq!(floor.timestamp_millis(), id.timestamp_millis());
    }

    #[test]
    fn test_serde_accepts_strings_and_numbers() {
        let from_str: Id = serde_json::from_str("\"42\"").unwrap();
        let from_num: Id = serde_json::from_str("42").unwrap();
        assert_eq!(from_str, Id(42));
        assert_eq!(from_num, Id(42));
        assert_eq!(serde_json::to_string(&Id(42)).unwrap(), "\"42\"");
        assert!(serde_json::from_str::<Id>("\"nope\"").is_err());
    }
}
