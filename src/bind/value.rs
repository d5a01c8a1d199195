//! Config value types written with units: `"5 sec"`, `"10 kb"`, `"30%"`
//!
//! Each type parses from its text form and binds from either a string or a
//! plain number, so values set through string overrides bind the same way
//! as values written natively in a document.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::{self, Deserialize, Deserializer, Unexpected, Visitor};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

static DURATION_TOKENS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9_]+)\s*([a-z]+)$").expect("valid regex"));

static BYTES_TOKENS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]+)\s*([a-zA-Z]+)$").expect("valid regex"));

const MILLIS_PER_UNIT: [(u128, &str); 5] =
    [(86_400_000, "d"), (3_600_000, "hr"), (60_000, "min"), (1_000, "s"), (1, "ms")];

/// Failure to parse a unit value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    #[error("empty {kind} value")]
    Empty { kind: &'static str },

    #[error("invalid {kind} format: '{value}'")]
    Format { kind: &'static str, value: String },

    #[error("invalid {kind} unit: '{unit}'")]
    Unit { kind: &'static str, unit: String },

    #[error("{kind} value out of range: '{value}'")]
    Range { kind: &'static str, value: String },
}

/// A time span: a whole amount followed by a unit (`ms`, `s`/`sec`/`second(s)`,
/// `min`/`minute(s)`, `hr`/`hour(s)`, `d`/`day(s)`). Underscores may group
/// digits. A bare number binds as milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Duration(std::time::Duration);

impl Duration {
    pub const ZERO: Duration = Duration(std::time::Duration::ZERO);

    pub fn from_millis(millis: u64) -> Self {
        Duration(std::time::Duration::from_millis(millis))
    }

    pub fn as_std(&self) -> std::time::Duration {
        self.0
    }
}

impl From<Duration> for std::time::Duration {
    fn from(value: Duration) -> Self {
        value.0
    }
}

fn millis_per(unit: &str) -> Option<u64> {
    let millis = match unit {
        "ms" => 1,
        "s" | "sec" | "second" | "seconds" => 1_000,
        "min" | "minute" | "minutes" => 60_000,
        "hr" | "hour" | "hours" => 3_600_000,
        "d" | "day" | "days" => 86_400_000,
        _ => return None,
    };
    Some(millis)
}

impl FromStr for Duration {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        const KIND: &str = "duration";
        let s = s.trim();
        if s.is_empty() {
            return Err(ValueError::Empty { kind: KIND });
        }
        let caps = DURATION_TOKENS
            .captures(s)
            .ok_or_else(|| ValueError::Format { kind: KIND, value: s.to_string() })?;
        let unit = millis_per(&caps[2])
            .ok_or_else(|| ValueError::Unit { kind: KIND, unit: caps[2].to_string() })?;
        let out_of_range = || ValueError::Range { kind: KIND, value: s.to_string() };
        let amount: u64 = caps[1].replace('_', "").parse().map_err(|_| out_of_range())?;
        amount.checked_mul(unit).map(Duration::from_millis).ok_or_else(out_of_range)
    }
}

impl fmt::Display for Duration {
    /// Largest unit that represents the span exactly.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let millis = self.0.as_millis();
        let (per, unit) = MILLIS_PER_UNIT
            .iter()
            .copied()
            .find(|(per, _)| millis != 0 && millis % per == 0)
            .unwrap_or((1, "ms"));
        write!(f, "{}{}", millis / per, unit)
    }
}

struct DurationVisitor;

impl<'de> Visitor<'de> for DurationVisitor {
    type Value = Duration;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a duration such as \"5 sec\", or a number of milliseconds")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Duration, E> {
        v.parse().map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Duration, E> {
        Ok(Duration::from_millis(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Duration, E> {
        u64::try_from(v)
            .map(Duration::from_millis)
            .map_err(|_| E::invalid_value(Unexpected::Signed(v), &self))
    }
}

impl<'de> Deserialize<'de> for Duration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(DurationVisitor)
    }
}

/// Unit of a [`Bytes`] value. Multiples are powers of 1024.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BytesUnit {
    Bytes,
    Kb,
    Mb,
    Gb,
}

impl BytesUnit {
    pub fn multiplier(self) -> u64 {
        match self {
            BytesUnit::Bytes => 1,
            BytesUnit::Kb => 1 << 10,
            BytesUnit::Mb => 1 << 20,
            BytesUnit::Gb => 1 << 30,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BytesUnit::Bytes => "b",
            BytesUnit::Kb => "kb",
            BytesUnit::Mb => "mb",
            BytesUnit::Gb => "gb",
        }
    }

    fn parse(unit: &str) -> Option<Self> {
        let unit = match unit.to_ascii_lowercase().as_str() {
            "b" | "byte" | "bytes" => BytesUnit::Bytes,
            "kb" | "kilobyte" | "kilobytes" => BytesUnit::Kb,
            "mb" | "megabyte" | "megabytes" => BytesUnit::Mb,
            "gb" | "gigabyte" | "gigabytes" => BytesUnit::Gb,
            _ => return None,
        };
        Some(unit)
    }
}

/// A size: a whole amount followed by a case-insensitive unit (`b`/`byte(s)`,
/// `kb`/`kilobyte(s)`, `mb`/`megabyte(s)`, `gb`/`gigabyte(s)`).
///
/// Equality and ordering look at the byte count only; the unit is kept for
/// display.
#[derive(Debug, Clone, Copy)]
pub struct Bytes {
    bytes: u64,
    unit: BytesUnit,
}

impl Bytes {
    pub fn new(amount: u64, unit: BytesUnit) -> Option<Self> {
        amount.checked_mul(unit.multiplier()).map(|bytes| Bytes { bytes, unit })
    }

    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    /// The size in whole `unit`s, rounded down.
    pub fn value_of(&self, unit: BytesUnit) -> u64 {
        self.bytes / unit.multiplier()
    }
}

impl PartialEq for Bytes {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl Eq for Bytes {}

impl PartialOrd for Bytes {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Bytes {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.bytes.cmp(&other.bytes)
    }
}

impl FromStr for Bytes {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        const KIND: &str = "bytes";
        let s = s.trim();
        if s.is_empty() {
            return Err(ValueError::Empty { kind: KIND });
        }
        let caps = BYTES_TOKENS
            .captures(s)
            .ok_or_else(|| ValueError::Format { kind: KIND, value: s.to_string() })?;
        let unit = BytesUnit::parse(&caps[2])
            .ok_or_else(|| ValueError::Unit { kind: KIND, unit: caps[2].to_string() })?;
        caps[1]
            .parse()
            .ok()
            .and_then(|amount| Bytes::new(amount, unit))
            .ok_or_else(|| ValueError::Range { kind: KIND, value: s.to_string() })
    }
}

impl fmt::Display for Bytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value_of(self.unit), self.unit.name())
    }
}

struct BytesVisitor;

impl<'de> Visitor<'de> for BytesVisitor {
    type Value = Bytes;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a size such as \"10 kb\"")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Bytes, E> {
        v.parse().map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Bytes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(BytesVisitor)
    }
}

/// A percentage. Text is read as percent with an optional trailing `%`
/// (`"30%"` and `"30"` are both thirty percent); a plain number is a fraction
/// of one (`0.3` is thirty percent).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Percent(f64);

impl Percent {
    pub const ZERO: Percent = Percent(0.0);
    pub const HUNDRED: Percent = Percent(100.0);

    pub fn from_percent(percent: f64) -> Self {
        Percent(percent)
    }

    pub fn from_fraction(fraction: f64) -> Self {
        Percent(fraction * 100.0)
    }

    pub fn percent(&self) -> f64 {
        self.0
    }

    /// The value as a fraction of one: `0.05` for 5%.
    pub fn fraction(&self) -> f64 {
        self.0 / 100.0
    }
}

impl FromStr for Percent {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        const KIND: &str = "percent";
        let s = s.trim();
        if s.is_empty() {
            return Err(ValueError::Empty { kind: KIND });
        }
        let number = s.strip_suffix('%').unwrap_or(s).trim_end();
        number
            .parse()
            .map(Percent)
            .map_err(|_| ValueError::Format { kind: KIND, value: s.to_string() })
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

struct PercentVisitor;

impl<'de> Visitor<'de> for PercentVisitor {
    type Value = Percent;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a percentage such as \"30%\", or a fraction of one")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Percent, E> {
        v.parse().map_err(E::custom)
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Percent, E> {
        Ok(Percent::from_fraction(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Percent, E> {
        Ok(Percent::from_fraction(v as f64))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Percent, E> {
        Ok(Percent::from_fraction(v as f64))
    }
}

impl<'de> Deserialize<'de> for Percent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(PercentVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bind::NodeDeserializer;
    use crate::error::ConfigError;
    use crate::node::ConfigNode;
    use serde_json::json;

    fn bind<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> crate::Result<T> {
        let node = ConfigNode::from(value);
        T::deserialize(NodeDeserializer::new(&node))
    }

    #[test]
    fn test_duration_units() {
        let secs = std::time::Duration::from_secs;
        assert_eq!("4ms".parse::<Duration>().unwrap().as_std().as_millis(), 4);
        assert_eq!("4000   ms".parse::<Duration>().unwrap().as_std(), secs(4));
        assert_eq!("1_800_000ms".parse::<Duration>().unwrap().as_std(), secs(1800));
        assert_eq!("4 sec".parse::<Duration>().unwrap().as_std(), secs(4));
        assert_eq!("40 seconds".parse::<Duration>().unwrap().as_std(), secs(40));
        assert_eq!("60 minutes".parse::<Duration>().unwrap().as_std(), secs(3600));
        assert_eq!("1 hr".parse::<Duration>().unwrap().as_std(), secs(3600));
        assert_eq!("1 day".parse::<Duration>().unwrap().as_std(), secs(86_400));
    }

    #[test]
    fn test_duration_rejects_bad_text() {
        assert_eq!("".parse::<Duration>(), Err(ValueError::Empty { kind: "duration" }));
        assert!(matches!("4".parse::<Duration>(), Err(ValueError::Format { .. })));
        assert!(matches!("4 SEC".parse::<Duration>(), Err(ValueError::Format { .. })));
        assert!(matches!("4 weeks".parse::<Duration>(), Err(ValueError::Unit { .. })));
        assert!(matches!(
            "99999999999999999999 d".parse::<Duration>(),
            Err(ValueError::Range { .. })
        ));
    }

    #[test]
    fn test_duration_display_uses_exact_unit() {
        assert_eq!("60 minutes".parse::<Duration>().unwrap().to_string(), "1hr");
        assert_eq!("1500ms".parse::<Duration>().unwrap().to_string(), "1500ms");
        assert_eq!(Duration::ZERO.to_string(), "0ms");
    }

    #[test]
    fn test_duration_binds_from_string_or_millis() {
        let d: Duration = bind(json!("5 sec")).unwrap();
        assert_eq!(d, Duration::from_millis(5_000));
        let d: Duration = bind(json!(250)).unwrap();
        assert_eq!(d, Duration::from_millis(250));
        assert!(matches!(bind::<Duration>(json!(-1)), Err(ConfigError::Deserialize(_))));
    }

    #[test]
    fn test_bytes_units() {
        assert_eq!("5b".parse::<Bytes>().unwrap().bytes(), 5);
        assert_eq!("5 bytes".parse::<Bytes>().unwrap().bytes(), 5);
        assert_eq!("5kb".parse::<Bytes>().unwrap().bytes(), 5120);
        assert_eq!("5KB".parse::<Bytes>().unwrap().bytes(), 5120);
        assert_eq!("5 kilobytes".parse::<Bytes>().unwrap().bytes(), 5120);
        assert_eq!("5 megabyte".parse::<Bytes>().unwrap().bytes(), 5_242_880);
        assert_eq!("5gb".parse::<Bytes>().unwrap().bytes(), 5_368_709_120);
        assert!(matches!("5 tb".parse::<Bytes>(), Err(ValueError::Unit { .. })));
        assert!(matches!("kb".parse::<Bytes>(), Err(ValueError::Format { .. })));
    }

    #[test]
    fn test_bytes_compare_by_size_and_display_in_own_unit() {
        let kb: Bytes = "1 kb".parse().unwrap();
        let b: Bytes = "1024 b".parse().unwrap();
        assert_eq!(kb, b);
        assert!(kb < "2 kb".parse().unwrap());
        assert_eq!(kb.to_string(), "1 kb");
        assert_eq!(b.to_string(), "1024 b");
        assert_eq!("3 mb".parse::<Bytes>().unwrap().value_of(BytesUnit::Kb), 3072);
    }

    #[test]
    fn test_bytes_binds_from_string_only() {
        let size: Bytes = bind(json!("10 KB")).unwrap();
        assert_eq!(size.bytes(), 10_240);
        assert!(bind::<Bytes>(json!(10)).is_err());
    }

    #[test]
    fn test_percent_text_and_numbers() {
        assert_eq!("30%".parse::<Percent>().unwrap().percent(), 30.0);
        assert_eq!("4".parse::<Percent>().unwrap().percent(), 4.0);
        assert_eq!("4.".parse::<Percent>().unwrap().percent(), 4.0);
        assert_eq!("-7.5%".parse::<Percent>().unwrap().fraction(), -0.075);
        assert!(matches!("%".parse::<Percent>(), Err(ValueError::Format { .. })));
        assert!(matches!("abc%".parse::<Percent>(), Err(ValueError::Format { .. })));

        let p: Percent = bind(json!("50%")).unwrap();
        assert_eq!(p.fraction(), 0.5);
        let p: Percent = bind(json!(0.25)).unwrap();
        assert_eq!(p.percent(), 25.0);
        let p: Percent = bind(json!(1)).unwrap();
        assert_eq!(p, Percent::HUNDRED);
        assert_eq!(p.to_string(), "100%");
    }
}
