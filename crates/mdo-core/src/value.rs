//! Typed field values produced by column coercion.

use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::enums::FieldType;

/// A coerced canonical field value.
///
/// Serialized adjacently tagged (`{"type": "date", "value": "2024-03-15"}`) so
/// that text and enum values stay distinguishable after a roundtrip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    String(String),
    Number(f64),
    Date(NaiveDate),
    Enum(String),
}

impl FieldValue {
    #[must_use]
    pub const fn field_type(&self) -> FieldType {
        match self {
            Self::String(_) => FieldType::String,
            Self::Number(_) => FieldType::Number,
            Self::Date(_) => FieldType::Date,
            Self::Enum(_) => FieldType::Enum,
        }
    }

    /// Text content for string and enum values.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::Enum(s) => Some(s),
            Self::Number(_) | Self::Date(_) => None,
        }
    }

    #[must_use]
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Canonical text form used for identity keys, uniqueness keys, and
    /// message rendering. Dates render as ISO-8601; integral numbers drop the
    /// fractional part so `"12"` and `"12.0"` produce the same key.
    #[must_use]
    pub fn key_text(&self) -> String {
        match self {
            Self::String(s) | Self::Enum(s) => s.clone(),
            Self::Date(d) => d.format("%Y-%m-%d").to_string(),
            #[allow(clippy::cast_possible_truncation)]
            Self::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjacently_tagged_serialization() {
        let value = FieldValue::Date(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, r#"{"type":"date","value":"2024-03-15"}"#);
        let recovered: FieldValue = serde_json::from_str(&json).unwrap();
        assert_eq!(recovered, value);
    }

    #[test]
    fn enum_and_string_stay_distinct() {
        let e = FieldValue::Enum("FFPE".into());
        let s = FieldValue::String("FFPE".into());
        let e2: FieldValue = serde_json::from_str(&serde_json::to_string(&e).unwrap()).unwrap();
        assert_eq!(e2, e);
        assert_ne!(e2, s);
    }

    #[test]
    fn key_text_normalizes_integral_numbers() {
        assert_eq!(FieldValue::Number(12.0).key_text(), "12");
        assert_eq!(FieldValue::Number(12.5).key_text(), "12.5");
    }

    #[test]
    fn accessors_match_variant() {
        assert_eq!(FieldValue::Number(2.0).as_number(), Some(2.0));
        assert_eq!(FieldValue::String("x".into()).as_number(), None);
        assert_eq!(FieldValue::Enum("x".into()).as_text(), Some("x"));
        assert_eq!(FieldValue::Number(1.0).field_type(), FieldType::Number);
    }
}
