//! The chat message, the only domain entity.

use std::fmt;

use {
    chrono::{DateTime, Utc},
    serde::{Deserialize, Deserializer, Serialize, Serializer, de},
};

use crate::dates::{DateAwareValue, format_date_time, wire_format};

// ── Message id ───────────────────────────────────────────────────────────────

/// Store-assigned message identifier.
///
/// Always a string on the wire; clients never see the store's native type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(i64);

impl MessageId {
    pub fn new(raw: i64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for MessageId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

impl Serialize for MessageId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MessageId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct IdVisitor;

        impl de::Visitor<'_> for IdVisitor {
            type Value = MessageId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a message id string")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<MessageId, E> {
                v.parse().map_err(E::custom)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<MessageId, E> {
                Ok(MessageId(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<MessageId, E> {
                i64::try_from(v).map(MessageId).map_err(E::custom)
            }
        }

        deserializer.deserialize_any(IdVisitor)
    }
}

// ── Messages ─────────────────────────────────────────────────────────────────

/// A chat message as stored and broadcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<MessageId>,
    #[serde(with = "wire_format")]
    pub date_time: DateTime<Utc>,
    pub sender_name: String,
    #[serde(rename = "message")]
    pub body: String,
}

/// A validated message that has not been persisted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewChatMessage {
    pub date_time: DateTime<Utc>,
    pub sender_name: String,
    pub body: String,
}

impl NewChatMessage {
    pub fn new(
        sender_name: impl Into<String>,
        body: impl Into<String>,
        date_time: DateTime<Utc>,
    ) -> Self {
        Self {
            date_time,
            sender_name: sender_name.into(),
            body: body.into(),
        }
    }

    /// Attach the store-assigned id.
    pub fn with_id(self, id: MessageId) -> ChatMessage {
        ChatMessage {
            id: Some(id),
            date_time: self.date_time,
            sender_name: self.sender_name,
            body: self.body,
        }
    }

    /// Decode, date-convert and validate a raw JSON payload in one step.
    pub fn from_json(value: serde_json::Value) -> Result<Self, ValidationError> {
        Self::try_from(crate::dates::convert_dates(value))
    }
}

// ── Validation ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("message payload must be an object, got {found}")]
    NotAnObject { found: &'static str },

    #[error("missing field '{field}'")]
    MissingField { field: &'static str },

    #[error("field '{field}' must be {expected}, got {found}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },
}

impl TryFrom<DateAwareValue> for NewChatMessage {
    type Error = ValidationError;

    fn try_from(value: DateAwareValue) -> Result<Self, Self::Error> {
        if !value.is_object() {
            return Err(ValidationError::NotAnObject {
                found: value.kind(),
            });
        }

        let field = |name: &'static str| value.get(name).ok_or(ValidationError::MissingField {
            field: name,
        });
        // Text that happens to look like a timestamp was converted along with
        // every other date string; turn it back into the text that was sent.
        let string_field = |name: &'static str| match field(name)? {
            DateAwareValue::String(s) => Ok(s.clone()),
            DateAwareValue::DateTime(dt) => Ok(format_date_time(dt)),
            other => Err(ValidationError::InvalidField {
                field: name,
                expected: "a string",
                found: other.kind(),
            }),
        };

        let sender_name = string_field("senderName")?;
        let body = string_field("message")?;
        let date_value = field("dateTime")?;
        let date_time = date_value
            .as_date_time()
            .ok_or(ValidationError::InvalidField {
                field: "dateTime",
                expected: "a date string (YYYY-MM-DDTHH:MM:SS.sssZ)",
                found: date_value.kind(),
            })?;

        Ok(Self {
            date_time,
            sender_name,
            body,
        })
    }
}
