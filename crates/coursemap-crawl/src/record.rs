//! Crawled records.
//!
//! A record is an opaque JSON payload. The only structure the crawler relies
//! on is the top-level `id` member, which defines record identity; everything
//! else is carried through untouched so downstream joins see the provider's
//! full listing.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Identity key of a record, as its `id` member was typed.
///
/// Numeric and string ids never collide: `1` and `"1"` are distinct records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(serde_json::Number),
    Text(String),
}

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self::Text(id.into())
    }

    /// The id when it was given as a string.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Number(_) => None,
        }
    }

    /// Read the identity key out of a payload.
    ///
    /// Anything other than a number or a non-blank string (missing, null,
    /// nested value) has no identity.
    pub fn from_payload(payload: &Value) -> Option<Self> {
        match payload.get("id")? {
            Value::String(s) if !s.trim().is_empty() => Some(Self::Text(s.clone())),
            Value::Number(n) => Some(Self::Number(n.clone())),
            _ => None,
        }
    }
}

impl From<i64> for RecordId {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// One structured listing extracted from an exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    id: RecordId,
    payload: Value,
}

impl Record {
    /// Wrap a payload, returning `None` when it carries no identity key.
    pub fn from_payload(payload: Value) -> Option<Self> {
        let id = RecordId::from_payload(&payload)?;
        Some(Self { id, payload })
    }

    pub fn id(&self) -> &RecordId {
        &self.id
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn into_payload(self) -> Value {
        self.payload
    }
}

impl Serialize for Record {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.payload.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let payload = Value::deserialize(deserializer)?;
        Record::from_payload(payload)
            .ok_or_else(|| serde::de::Error::custom("record is missing a usable `id` member"))
    }
}
