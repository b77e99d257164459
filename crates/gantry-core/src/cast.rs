//! Type caster: wire values to typed values.
//!
//! Text scalars are checked against the same rules the path patterns use
//! before they are parsed, so `"12.5"` is never an integer and `"7abc"` never a
//! float. JSON numbers are taken by value. Integers span `i64::MIN..=u64::MAX`.
//! Casting has no side effects.

use crate::serialize::DeserializeError;
use crate::types::{TypeTag, TypedValue, BOOLEAN_PATTERN, FLOAT_PATTERN, INTEGER_PATTERN};
use crate::value::{display_value, kind_of, scalar_text, Number, Value};
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

/// Cast failure
#[derive(Debug, Error)]
pub enum CastError {
    #[error("Value \"{value}\" is not a valid {expected}.")]
    Mismatch { expected: String, value: String },

    #[error("Value \"{value}\" is out of range for {target}.")]
    OutOfRange { target: &'static str, value: String },

    #[error(transparent)]
    Deserialize(#[from] DeserializeError),
}

impl CastError {
    pub fn mismatch(expected: impl Into<String>, value: impl Into<String>) -> Self {
        CastError::Mismatch {
            expected: expected.into(),
            value: value.into(),
        }
    }

    fn wire_mismatch(expected: &str, value: &Value) -> Self {
        Self::mismatch(expected, display_value(value))
    }
}

fn anchored(pattern: &str) -> Regex {
    Regex::new(&format!("^(?:{})$", pattern)).expect("built-in type patterns are valid")
}

fn integer_rule() -> &'static Regex {
    static RULE: OnceLock<Regex> = OnceLock::new();
    RULE.get_or_init(|| anchored(INTEGER_PATTERN))
}

fn float_rule() -> &'static Regex {
    static RULE: OnceLock<Regex> = OnceLock::new();
    RULE.get_or_init(|| anchored(FLOAT_PATTERN))
}

fn boolean_rule() -> &'static Regex {
    static RULE: OnceLock<Regex> = OnceLock::new();
    RULE.get_or_init(|| anchored(BOOLEAN_PATTERN))
}

/// Text of a scalar wire value that satisfies `rule`.
fn matching_text(rule: &Regex, expected: &str, value: &Value) -> Result<String, CastError> {
    scalar_text(value)
        .filter(|text| rule.is_match(text))
        .ok_or_else(|| CastError::wire_mismatch(expected, value))
}

/// Largest float magnitude below which every integral `f64` is exact.
const EXACT_FLOAT_LIMIT: f64 = 9_007_199_254_740_992.0;

fn integer_in_range(wide: i128, text: String) -> Result<TypedValue, CastError> {
    if wide < i128::from(i64::MIN) || wide > i128::from(u64::MAX) {
        return Err(CastError::OutOfRange {
            target: "integer",
            value: text,
        });
    }
    Ok(TypedValue::Integer(wide))
}

fn integer_of_number(number: &Number, value: &Value) -> Result<TypedValue, CastError> {
    if let Some(v) = number.as_i64() {
        return Ok(TypedValue::Integer(i128::from(v)));
    }
    if let Some(v) = number.as_u64() {
        return Ok(TypedValue::Integer(i128::from(v)));
    }
    match number.as_f64() {
        Some(v) if v.fract() == 0.0 && v.abs() <= EXACT_FLOAT_LIMIT => {
            Ok(TypedValue::Integer(v as i128))
        }
        _ => Err(CastError::wire_mismatch("integer", value)),
    }
}

/// Cast a wire value against a type tag.
pub fn cast(tag: &TypeTag, value: Value) -> Result<TypedValue, CastError> {
    match tag {
        TypeTag::Integer => match &value {
            Value::Number(number) => integer_of_number(number, &value),
            Value::String(text) if integer_rule().is_match(text) => match text.parse::<i128>() {
                Ok(wide) => integer_in_range(wide, text.clone()),
                Err(_) => Err(CastError::OutOfRange {
                    target: "integer",
                    value: text.clone(),
                }),
            },
            _ => Err(CastError::wire_mismatch("integer", &value)),
        },
        TypeTag::Float => match &value {
            Value::Number(number) => number
                .as_f64()
                .map(TypedValue::Float)
                .ok_or_else(|| CastError::wire_mismatch("float", &value)),
            Value::String(text) if float_rule().is_match(text) => text
                .parse::<f64>()
                .map(TypedValue::Float)
                .map_err(|_| CastError::wire_mismatch("float", &value)),
            _ => Err(CastError::wire_mismatch("float", &value)),
        },
        TypeTag::Boolean => {
            let text = matching_text(boolean_rule(), "boolean", &value)?;
            let flag = matches!(text.to_ascii_lowercase().as_str(), "1" | "true");
            Ok(TypedValue::Boolean(flag))
        }
        TypeTag::Object(object) => match &value {
            Value::Object(data) => Ok(TypedValue::Object(object.deserialize(data)?)),
            other => Err(DeserializeError::NotAMapping {
                type_name: object.name(),
                found: kind_of(other),
            }
            .into()),
        },
        TypeTag::Untyped => Ok(TypedValue::Raw(value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn integer(value: Value) -> Option<i128> {
        match cast(&TypeTag::Integer, value) {
            Ok(TypedValue::Integer(v)) => Some(v),
            _ => None,
        }
    }

    #[test]
    fn test_integer_accepts_signed_digits() {
        assert_eq!(integer(json!("0")), Some(0));
        assert_eq!(integer(json!("-7")), Some(-7));
        assert_eq!(integer(json!("+3")), Some(3));
        assert_eq!(integer(json!(42)), Some(42));
    }

    #[test]
    fn test_integer_rejects_non_integers() {
        assert_eq!(integer(json!("12.5")), None);
        assert_eq!(integer(json!("abc")), None);
        assert_eq!(integer(json!("")), None);
        assert_eq!(integer(json!(12.5)), None);
        assert_eq!(integer(json!(null)), None);
    }

    #[test]
    fn test_integer_overflow_is_reported() {
        let err = cast(&TypeTag::Integer, json!("99999999999999999999")).unwrap_err();
        assert!(matches!(err, CastError::OutOfRange { .. }));
        let err = cast(&TypeTag::Integer, json!("-9223372036854775809")).unwrap_err();
        assert!(matches!(err, CastError::OutOfRange { .. }));
    }

    #[test]
    fn test_integer_spans_unsigned_range() {
        assert_eq!(integer(json!(u64::MAX)), Some(i128::from(u64::MAX)));
        assert_eq!(integer(json!("18446744073709551615")), Some(i128::from(u64::MAX)));
        assert_eq!(integer(json!(i64::MIN)), Some(i128::from(i64::MIN)));
    }

    #[test]
    fn test_integral_json_float_is_an_integer() {
        assert_eq!(integer(json!(30000.0)), Some(30000));
        assert_eq!(integer(json!(1e300)), None);
        assert_eq!(integer(json!(true)), None);
    }

    #[test]
    fn test_mismatch_message() {
        let err = cast(&TypeTag::Integer, json!("abc")).unwrap_err();
        assert_eq!(err.to_string(), "Value \"abc\" is not a valid integer.");
    }

    #[test]
    fn test_float() {
        match cast(&TypeTag::Float, json!("-2.5")).unwrap() {
            TypedValue::Float(v) => assert_eq!(v, -2.5),
            other => panic!("unexpected {:?}", other),
        }
        match cast(&TypeTag::Float, json!("3")).unwrap() {
            TypedValue::Float(v) => assert_eq!(v, 3.0),
            other => panic!("unexpected {:?}", other),
        }
        assert!(cast(&TypeTag::Float, json!("1e5")).is_err());
        assert!(cast(&TypeTag::Float, json!(".5")).is_err());
        assert!(cast(&TypeTag::Float, json!(true)).is_err());
    }

    #[test]
    fn test_float_numbers_are_taken_by_value() {
        for v in [1e16, 1.5e-7, -2.5e300, 42.0] {
            match cast(&TypeTag::Float, json!(v)).unwrap() {
                TypedValue::Float(got) => assert_eq!(got, v),
                other => panic!("unexpected {:?}", other),
            }
        }
        match cast(&TypeTag::Float, json!(7)).unwrap() {
            TypedValue::Float(v) => assert_eq!(v, 7.0),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_boolean_is_case_insensitive() {
        for (raw, expected) in [("1", true), ("TRUE", true), ("false", false), ("0", false)] {
            match cast(&TypeTag::Boolean, json!(raw)).unwrap() {
                TypedValue::Boolean(v) => assert_eq!(v, expected, "{}", raw),
                other => panic!("unexpected {:?}", other),
            }
        }
        assert!(cast(&TypeTag::Boolean, json!("yes")).is_err());
        assert!(matches!(
            cast(&TypeTag::Boolean, json!(true)).unwrap(),
            TypedValue::Boolean(true)
        ));
    }

    #[test]
    fn test_untyped_passes_through() {
        match cast(&TypeTag::Untyped, json!({"a": [1]})).unwrap() {
            TypedValue::Raw(v) => assert_eq!(v, json!({"a": [1]})),
            other => panic!("unexpected {:?}", other),
        }
    }
}
