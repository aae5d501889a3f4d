//! UTC timestamps shared by the wire and cache representations.
//!
//! A [`Timestamp`] is always UTC and always held at millisecond precision:
//! - ISO-8601 text is the exchange form. [`Timestamp::to_iso8601`] emits a `Z`
//!   suffix and prints `.sss` only when the milliseconds are non-zero, so text
//!   produced here parses back to the same text.
//! - Epoch conversion truncates to whole seconds in both directions.
//! - Instants are limited to four-digit years (0000 to 9999), the range whose
//!   ISO-8601 text parses back.

use crate::{Error, Result};
use chrono::{DateTime, SecondsFormat, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Offset formats seen in older payloads (`+0000` without a colon).
const FALLBACK_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%dT%H:%M:%S%z"];

/// `0000-01-01T00:00:00Z`
const MIN_EPOCH_SECS: i64 = -62_167_219_200;
/// `9999-12-31T23:59:59Z`
const MAX_EPOCH_SECS: i64 = 253_402_300_799;

/// A UTC instant truncated to millisecond precision.
///
/// The default value is the Unix epoch, which the cache codec uses as the
/// zero value for required timestamps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a timestamp at the current time.
    #[must_use]
    pub fn now() -> Self {
        Self::from_utc(Utc::now())
    }

    /// Creates a timestamp from a `DateTime<Utc>`, dropping sub-millisecond digits.
    ///
    /// Instants before year 0000 or after year 9999 are clamped to the
    /// nearest bound.
    #[must_use]
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(truncate_to_millis(clamp_to_four_digit_years(dt)))
    }

    /// The Unix epoch.
    #[must_use]
    pub fn unix_epoch() -> Self {
        Self::default()
    }

    /// Parses an RFC 3339 / ISO-8601 string with any UTC offset.
    ///
    /// Offsets are normalized to UTC.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTimestamp`] if the text is not a recognised
    /// ISO-8601 date-time.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(Self::from_utc(dt.with_timezone(&Utc)));
        }
        FALLBACK_FORMATS
            .iter()
            .find_map(|fmt| DateTime::parse_from_str(s, fmt).ok())
            .map(|dt| Self::from_utc(dt.with_timezone(&Utc)))
            .ok_or_else(|| Error::InvalidTimestamp(s.to_string()))
    }

    /// Parses an ISO-8601 string, accepting only the `Z` suffix.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NonUtcTimestamp`] for explicit offsets (even `+00:00`)
    /// and [`Error::InvalidTimestamp`] for anything unparseable.
    pub fn parse_utc(s: &str) -> Result<Self> {
        let s = s.trim();
        if !s.ends_with('Z') {
            return Err(Error::NonUtcTimestamp(s.to_string()));
        }
        Self::parse(s)
    }

    /// Parses ISO-8601 text, returning `None` on failure.
    #[must_use]
    pub fn parse_iso8601(s: &str) -> Option<Self> {
        Self::parse(s).ok()
    }

    /// Renders as ISO-8601 UTC, e.g. `2026-01-15T12:00:00Z` or
    /// `2026-01-15T12:00:00.250Z`.
    #[must_use]
    pub fn to_iso8601(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }

    /// Converts epoch milliseconds, truncating to whole seconds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EpochOutOfRange`] when the value falls outside years
    /// 0000 to 9999.
    pub fn from_epoch_millis(millis: i64) -> Result<Self> {
        let secs = millis.div_euclid(1000);
        if !(MIN_EPOCH_SECS..=MAX_EPOCH_SECS).contains(&secs) {
            return Err(Error::EpochOutOfRange(millis));
        }
        DateTime::from_timestamp(secs, 0)
            .map(Self)
            .ok_or(Error::EpochOutOfRange(millis))
    }

    /// Returns epoch milliseconds with the sub-second part truncated.
    #[must_use]
    pub fn epoch_millis(&self) -> i64 {
        self.0.timestamp() * 1000
    }

    /// Returns whole seconds since the Unix epoch.
    #[must_use]
    pub fn epoch_secs(&self) -> i64 {
        self.0.timestamp()
    }

    /// Access the inner `DateTime<Utc>`.
    #[must_use]
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Returns true if this timestamp is strictly before the other.
    #[must_use]
    pub fn is_before(&self, other: &Self) -> bool {
        self < other
    }

    /// Returns true if this timestamp is strictly after the other.
    #[must_use]
    pub fn is_after(&self, other: &Self) -> bool {
        self > other
    }
}

fn clamp_to_four_digit_years(dt: DateTime<Utc>) -> DateTime<Utc> {
    let bound = match dt.timestamp() {
        secs if secs < MIN_EPOCH_SECS => DateTime::from_timestamp(MIN_EPOCH_SECS, 0),
        secs if secs > MAX_EPOCH_SECS => DateTime::from_timestamp(MAX_EPOCH_SECS, 999_000_000),
        _ => None,
    };
    bound.unwrap_or(dt)
}

fn truncate_to_millis(dt: DateTime<Utc>) -> DateTime<Utc> {
    let nanos = dt.nanosecond() / 1_000_000 * 1_000_000;
    dt.with_nanosecond(nanos).unwrap_or(dt)
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::from_utc(dt)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

impl FromStr for Timestamp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_iso8601())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}
