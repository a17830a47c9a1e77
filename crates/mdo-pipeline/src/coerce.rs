//! Text → typed value coercion for mapped cells.

use chrono::NaiveDate;
use mdo_core::enums::FieldType;
use mdo_core::value::FieldValue;

/// Successful coercion. `reformatted` is set when the input was accepted in a
/// non-canonical spelling (currently `MM/DD/YYYY` dates).
#[derive(Debug, Clone, PartialEq)]
pub struct Coercion {
    pub value: FieldValue,
    pub reformatted: bool,
}

impl Coercion {
    const fn exact(value: FieldValue) -> Self {
        Self {
            value,
            reformatted: false,
        }
    }
}

/// Coerce already-trimmed, non-empty cell text to `field_type`.
///
/// Returns `None` when the text cannot represent a value of that type.
#[must_use]
pub fn coerce(text: &str, field_type: FieldType) -> Option<Coercion> {
    match field_type {
        FieldType::String => Some(Coercion::exact(FieldValue::String(text.to_string()))),
        FieldType::Enum => Some(Coercion::exact(FieldValue::Enum(text.to_string()))),
        FieldType::Number => text
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(|n| Coercion::exact(FieldValue::Number(n))),
        FieldType::Date => {
            if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
                return Some(Coercion::exact(FieldValue::Date(date)));
            }
            NaiveDate::parse_from_str(text, "%m/%d/%Y")
                .ok()
                .map(|date| Coercion {
                    value: FieldValue::Date(date),
                    reformatted: true,
                })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> FieldValue {
        FieldValue::Date(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    #[rstest]
    #[case("12", FieldValue::Number(12.0))]
    #[case("-0.5", FieldValue::Number(-0.5))]
    #[case("1e3", FieldValue::Number(1000.0))]
    fn numbers(#[case] text: &str, #[case] expected: FieldValue) {
        assert_eq!(coerce(text, FieldType::Number).unwrap().value, expected);
    }

    #[rstest]
    #[case("twelve")]
    #[case("NaN")]
    #[case("inf")]
    #[case("1,000")]
    fn rejected_numbers(#[case] text: &str) {
        assert!(coerce(text, FieldType::Number).is_none());
    }

    #[test]
    fn iso_date_is_exact() {
        let c = coerce("2024-03-15", FieldType::Date).unwrap();
        assert_eq!(c.value, date(2024, 3, 15));
        assert!(!c.reformatted);
    }

    #[test]
    fn us_date_is_reformatted() {
        let c = coerce("03/15/2024", FieldType::Date).unwrap();
        assert_eq!(c.value, date(2024, 3, 15));
        assert!(c.reformatted);
    }

    #[rstest]
    #[case("2024-02-30")]
    #[case("15/03/2024")]
    #[case("yesterday")]
    fn rejected_dates(#[case] text: &str) {
        assert!(coerce(text, FieldType::Date).is_none());
    }

    #[test]
    fn enum_keeps_text() {
        let c = coerce("ffpe_tumor", FieldType::Enum).unwrap();
        assert_eq!(c.value, FieldValue::Enum("ffpe_tumor".into()));
    }
}
