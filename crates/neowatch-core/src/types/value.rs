//! Dynamic values for filter conditions and record data.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::types::schema::ColumnKind;

/// A dynamic value that can represent any supported column type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// A string value.
    Text(String),
    /// An integer value.
    Integer(i64),
    /// A floating-point value.
    Float(f64),
    /// A boolean value.
    Boolean(bool),
    /// A UTC timestamp.
    Timestamp(DateTime<Utc>),
    /// A list of values (for the `In` operator).
    List(Vec<Value>),
    /// Null / no value.
    Null,
}

impl Value {
    /// Human-readable name of the variant, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Boolean(_) => "boolean",
            Self::Timestamp(_) => "timestamp",
            Self::List(_) => "list",
            Self::Null => "null",
        }
    }

    /// Whether this value is `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Coerce this value to the given column kind.
    ///
    /// Exact matches pass through; integers widen to floats; text parses
    /// into numbers, booleans, and timestamps (RFC 3339 or `YYYY-MM-DD`).
    /// `Null` coerces to any kind. Anything else is rejected with a message
    /// describing the mismatch.
    pub fn coerce_to(&self, kind: ColumnKind) -> Result<Value, String> {
        match (self, kind) {
            (Self::Null, _) => Ok(Self::Null),
            (Self::Text(s), ColumnKind::Text) => Ok(Self::Text(s.clone())),
            (Self::Integer(i), ColumnKind::Integer) => Ok(Self::Integer(*i)),
            (Self::Float(f), ColumnKind::Float) => Ok(Self::Float(*f)),
            (Self::Integer(i), ColumnKind::Float) => Ok(Self::Float(*i as f64)),
            (Self::Boolean(b), ColumnKind::Boolean) => Ok(Self::Boolean(*b)),
            (Self::Timestamp(t), ColumnKind::Timestamp) => Ok(Self::Timestamp(*t)),
            (Self::Text(s), ColumnKind::Integer) => s
                .trim()
                .parse::<i64>()
                .map(Self::Integer)
                .map_err(|_| format!("cannot parse '{s}' as an integer")),
            (Self::Text(s), ColumnKind::Float) => s
                .trim()
                .parse::<f64>()
                .map(Self::Float)
                .map_err(|_| format!("cannot parse '{s}' as a float")),
            (Self::Text(s), ColumnKind::Boolean) => match s.trim() {
                "true" | "1" => Ok(Self::Boolean(true)),
                "false" | "0" => Ok(Self::Boolean(false)),
                _ => Err(format!("cannot parse '{s}' as a boolean")),
            },
            (Self::Text(s), ColumnKind::Timestamp) => parse_timestamp(s)
                .map(Self::Timestamp)
                .ok_or_else(|| format!("cannot parse '{s}' as a timestamp")),
            (other, kind) => Err(format!(
                "cannot coerce {} value to {} column",
                other.kind_name(),
                kind
            )),
        }
    }
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // Bare dates are treated as midnight UTC.
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }
    None
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Integer(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Timestamp(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => Self::Null,
        }
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}
