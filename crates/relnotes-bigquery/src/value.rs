//! Typed cell values

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::{BigQueryError, Result};
use crate::schema::FieldType;

/// One cell of a result row.
///
/// The REST API transports every scalar as a JSON string; the column type
/// from the result schema decides how it is parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    String(String),
    Int64(i64),
    Float64(f64),
    Bool(bool),
    Timestamp(DateTime<Utc>),
    /// Civil date, kept in its canonical `YYYY-MM-DD` form
    Date(String),
    /// Repeated or nested values, and types without a dedicated variant
    Other(serde_json::Value),
}

impl Value {
    /// Parse a raw `v` cell according to its column type.
    pub fn from_cell(raw: &serde_json::Value, field_type: &FieldType) -> Result<Self> {
        let text = match raw {
            serde_json::Value::Null => return Ok(Self::Null),
            serde_json::Value::String(s) => s,
            other => return Ok(Self::Other(other.clone())),
        };

        let value = match field_type {
            FieldType::Int64 => Self::Int64(
                text.parse()
                    .map_err(|e| BigQueryError::decode(format!("INT64 cell '{text}': {e}")))?,
            ),
            FieldType::Float64 => Self::Float64(
                text.parse()
                    .map_err(|e| BigQueryError::decode(format!("FLOAT64 cell '{text}': {e}")))?,
            ),
            FieldType::Bool => match text.as_str() {
                "true" => Self::Bool(true),
                "false" => Self::Bool(false),
                _ => return Err(BigQueryError::decode(format!("BOOL cell '{text}'"))),
            },
            FieldType::Timestamp => Self::Timestamp(parse_timestamp(text)?),
            FieldType::Date => Self::Date(text.clone()),
            _ => Self::String(text.clone()),
        };
        Ok(value)
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Borrow the text of `String` and `Date` cells.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::Date(s) => Some(s),
            _ => None,
        }
    }
}

/// Timestamps arrive as integer microseconds (`useInt64Timestamp`) or, from
/// older endpoints and emulators, as floating-point seconds.
fn parse_timestamp(text: &str) -> Result<DateTime<Utc>> {
    let micros = match text.parse::<i64>() {
        Ok(micros) => micros,
        Err(_) => {
            let seconds: f64 = text
                .parse()
                .map_err(|e| BigQueryError::decode(format!("TIMESTAMP cell '{text}': {e}")))?;
            (seconds * 1_000_000.0).round() as i64
        }
    };
    DateTime::from_timestamp_micros(micros)
        .ok_or_else(|| BigQueryError::decode(format!("TIMESTAMP cell '{text}' out of range")))
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::String(s) | Self::Date(s) => f.write_str(s),
            Self::Int64(v) => write!(f, "{v}"),
            Self::Float64(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Timestamp(ts) => f.write_str(&ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Self::Other(v) => write!(f, "{v}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_null_cell() {
        let value = Value::from_cell(&json!(null), &FieldType::String).unwrap();
        assert!(value.is_null());
        assert_eq!(value.to_string(), "NULL");
    }

    #[test]
    fn test_string_cell() {
        let value = Value::from_cell(&json!("Compute Engine"), &FieldType::String).unwrap();
        assert_eq!(value.as_str(), Some("Compute Engine"));
        assert_eq!(value.to_string(), "Compute Engine");
    }

    #[test]
    fn test_empty_string_is_not_null() {
        let value = Value::from_cell(&json!(""), &FieldType::String).unwrap();
        assert!(!value.is_null());
        assert_eq!(value.to_string(), "");
    }

    #[test]
    fn test_int64_cell() {
        let value = Value::from_cell(&json!("-42"), &FieldType::Int64).unwrap();
        assert_eq!(value, Value::Int64(-42));
    }

    #[test]
    fn test_invalid_int64_cell() {
        let err = Value::from_cell(&json!("4x"), &FieldType::Int64).unwrap_err();
        assert!(err.is_decode());
    }

    #[test]
    fn test_bool_cell() {
        assert_eq!(
            Value::from_cell(&json!("true"), &FieldType::Bool).unwrap(),
            Value::Bool(true)
        );
        assert!(Value::from_cell(&json!("yes"), &FieldType::Bool).is_err());
    }

    #[test]
    fn test_timestamp_micros() {
        let value = Value::from_cell(&json!("1704067200000000"), &FieldType::Timestamp).unwrap();
        assert_eq!(value.to_string(), "2024-01-01T00:00:00Z");
    }

    #[test]
    fn test_timestamp_float_seconds() {
        let value = Value::from_cell(&json!("1.7040672005E9"), &FieldType::Timestamp).unwrap();
        assert_eq!(value.to_string(), "2024-01-01T00:00:00.500Z");
    }

    #[test]
    fn test_date_cell() {
        let value = Value::from_cell(&json!("2024-03-05"), &FieldType::Date).unwrap();
        assert_eq!(value, Value::Date("2024-03-05".into()));
        assert_eq!(value.to_string(), "2024-03-05");
    }

    #[test]
    fn test_repeated_cell_kept_as_json() {
        let raw = json!([{"v": "a"}]);
        let value = Value::from_cell(&raw, &FieldType::String).unwrap();
        assert_eq!(value, Value::Other(raw));
    }
}
