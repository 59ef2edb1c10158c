//! Date-string conversion for payloads decoded from untrusted JSON.
//!
//! JSON has no timestamp type, so clients send dates as ISO-8601 strings
//! (`YYYY-MM-DDTHH:MM:SS.sssZ`, what `Date.prototype.toJSON` produces).
//! [`convert_dates`] walks a decoded payload and turns every such string into
//! a native [`DateTime<Utc>`], at any depth, arrays included.

use std::{collections::BTreeMap, sync::LazyLock};

use {
    chrono::{DateTime, SecondsFormat, Utc},
    regex::Regex,
    serde::{Serialize, Serializer, ser::SerializeMap, ser::SerializeSeq},
};

static DATE_STRING: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\.\d{3}Z$").expect("valid date regex")
});

/// A decoded JSON tree in which date strings have been replaced by timestamps.
#[derive(Debug, Clone, PartialEq)]
pub enum DateAwareValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    DateTime(DateTime<Utc>),
    Array(Vec<DateAwareValue>),
    Object(BTreeMap<String, DateAwareValue>),
}

impl DateAwareValue {
    pub fn get(&self, key: &str) -> Option<&DateAwareValue> {
        match self {
            Self::Object(map) => map.get(key),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_date_time(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Self::Object(_))
    }

    /// Short type name used in validation messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::DateTime(_) => "date",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
        }
    }

    /// Back to plain JSON; timestamps become their canonical string form.
    pub fn into_json(self) -> serde_json::Value {
        use serde_json::Value;
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(b),
            Self::Number(n) => Value::Number(n),
            Self::String(s) => Value::String(s),
            Self::DateTime(dt) => Value::String(format_date_time(&dt)),
            Self::Array(items) => Value::Array(items.into_iter().map(Self::into_json).collect()),
            Self::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, v.into_json()))
                    .collect(),
            ),
        }
    }
}

impl Serialize for DateAwareValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Number(n) => n.serialize(serializer),
            Self::String(s) => serializer.serialize_str(s),
            Self::DateTime(dt) => serializer.serialize_str(&format_date_time(dt)),
            Self::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            },
            Self::Object(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            },
        }
    }
}

/// Whether `val` is exactly a JSON date/time string that parses as a valid
/// instant. Strings that merely contain such a date are not date strings.
pub fn is_date_string(val: &str) -> bool {
    parse_date_string(val).is_some()
}

fn parse_date_string(val: &str) -> Option<DateTime<Utc>> {
    if !DATE_STRING.is_match(val) {
        return None;
    }
    DateTime::parse_from_rfc3339(val)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Convert every date string in `value`, recursing into arrays and objects.
/// Non-matching strings and non-string values are carried over unchanged.
pub fn convert_dates(value: serde_json::Value) -> DateAwareValue {
    use serde_json::Value;
    match value {
        Value::Null => DateAwareValue::Null,
        Value::Bool(b) => DateAwareValue::Bool(b),
        Value::Number(n) => DateAwareValue::Number(n),
        Value::String(s) => match parse_date_string(&s) {
            Some(dt) => DateAwareValue::DateTime(dt),
            None => DateAwareValue::String(s),
        },
        Value::Array(items) => DateAwareValue::Array(items.into_iter().map(convert_dates).collect()),
        Value::Object(map) => DateAwareValue::Object(
            map.into_iter()
                .map(|(k, v)| (k, convert_dates(v)))
                .collect(),
        ),
    }
}

/// Canonical wire form: millisecond precision, `Z` suffix.
pub fn format_date_time(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// `#[serde(with = "parley_protocol::dates::wire_format")]` for timestamp fields.
pub mod wire_format {
    use {
        chrono::{DateTime, Utc},
        serde::{Deserialize, Deserializer, Serializer, de::Error},
    };

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_date_time(dt))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| D::Error::custom(format!("invalid dateTime '{raw}': {e}")))
    }
}
