//! Extraction of Rust values from `sea_query::Value`.
//!
//! Rows coming back from a connection carry `sea_query::Value`s. Entities fill
//! their fields through [`FromValue`], which is lenient about integer width
//! (an `INT8` column can fill an `i32` field when the value fits) but strict
//! about everything else.

use sea_query::Value;

/// Error type for value extraction failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValueError {
    /// The value is null (None variant)
    #[error("value is null")]
    NullValue,
    /// The value type doesn't match the expected type
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },
    /// The value does not fit the target type
    #[error("value {0} is out of range for the target type")]
    OutOfRange(String),
}

/// Conversion from a row value into a Rust type.
///
/// ```
/// use quarry::FromValue;
/// use sea_query::Value;
///
/// assert_eq!(i32::from_value(Value::BigInt(Some(42))), Ok(42));
/// assert_eq!(Option::<i32>::from_value(Value::Int(None)), Ok(None));
/// ```
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, ValueError>;
}

/// Integer payload of any integer variant, `None` for non-integers.
/// Null integers yield `Some(None)`.
pub(crate) fn integer(value: &Value) -> Option<Option<i128>> {
    Some(match value {
        Value::TinyInt(v) => v.map(i128::from),
        Value::SmallInt(v) => v.map(i128::from),
        Value::Int(v) => v.map(i128::from),
        Value::BigInt(v) => v.map(i128::from),
        Value::TinyUnsigned(v) => v.map(i128::from),
        Value::SmallUnsigned(v) => v.map(i128::from),
        Value::Unsigned(v) => v.map(i128::from),
        Value::BigUnsigned(v) => v.map(i128::from),
        _ => return None,
    })
}

/// Whether the value is a typed SQL NULL
pub fn is_null(value: &Value) -> bool {
    if let Some(int) = integer(value) {
        return int.is_none();
    }
    match value {
        Value::Bool(v) => v.is_none(),
        Value::Float(v) => v.is_none(),
        Value::Double(v) => v.is_none(),
        Value::String(v) => v.is_none(),
        Value::Char(v) => v.is_none(),
        Value::Bytes(v) => v.is_none(),
        Value::Json(v) => v.is_none(),
        _ => false,
    }
}

/// Key used to compare primary and foreign key values across integer widths.
///
/// Returns `None` for nulls, which never match anything.
pub(crate) fn match_key(value: &Value) -> Option<String> {
    if is_null(value) {
        return None;
    }
    match integer(value) {
        Some(Some(n)) => Some(n.to_string()),
        _ => Some(format!("{value:?}")),
    }
}

fn mismatch(expected: &str, value: &Value) -> ValueError {
    ValueError::TypeMismatch {
        expected: expected.to_string(),
        actual: format!("{value:?}"),
    }
}

macro_rules! impl_from_integer {
    ($($type:ty),*) => {
        $(
            impl FromValue for $type {
                fn from_value(value: Value) -> Result<Self, ValueError> {
                    match integer(&value) {
                        Some(Some(n)) => <$type>::try_from(n)
                            .map_err(|_| ValueError::OutOfRange(n.to_string())),
                        Some(None) => Err(ValueError::NullValue),
                        None => Err(mismatch(stringify!($type), &value)),
                    }
                }
            }
        )*
    };
}

impl_from_integer!(i8, i16, i32, i64, u8, u16, u32, u64);

// Non-integer types go through sea-query's own `ValueType` conversion.
macro_rules! impl_from_value_type {
    ($($type:ty),*) => {
        $(
            impl FromValue for $type {
                fn from_value(value: Value) -> Result<Self, ValueError> {
                    if is_null(&value) {
                        return Err(ValueError::NullValue);
                    }
                    let shown = format!("{value:?}");
                    <$type as sea_query::ValueType>::try_from(value).map_err(|_| {
                        ValueError::TypeMismatch {
                            expected: stringify!($type).to_string(),
                            actual: shown,
                        }
                    })
                }
            }
        )*
    };
}

impl_from_value_type!(bool, String, Vec<u8>, serde_json::Value);

impl FromValue for f32 {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Float(Some(f)) => Ok(f),
            Value::Float(None) | Value::Double(None) => Err(ValueError::NullValue),
            other => Err(mismatch("f32", &other)),
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Double(Some(d)) => Ok(d),
            Value::Float(Some(f)) => Ok(f64::from(f)),
            Value::Float(None) | Value::Double(None) => Err(ValueError::NullValue),
            other => match integer(&other) {
                Some(Some(n)) => Ok(n as f64),
                Some(None) => Err(ValueError::NullValue),
                None => Err(mismatch("f64", &other)),
            },
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match T::from_value(value) {
            Ok(v) => Ok(Some(v)),
            Err(ValueError::NullValue) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Render a value as JSON, used by `Row::to_json`
pub(crate) fn to_json(value: &Value) -> serde_json::Value {
    use serde_json::Value as Json;

    if is_null(value) {
        return Json::Null;
    }
    if let Some(Some(n)) = integer(value) {
        return i64::try_from(n)
            .map(Json::from)
            .unwrap_or_else(|_| Json::String(n.to_string()));
    }
    match value {
        Value::Bool(Some(b)) => Json::Bool(*b),
        Value::Float(Some(f)) => Json::from(f64::from(*f)),
        Value::Double(Some(d)) => Json::from(*d),
        Value::Char(Some(c)) => Json::String(c.to_string()),
        other => match String::from_value(other.clone()) {
            Ok(s) => Json::String(s),
            Err(_) => serde_json::Value::from_value(other.clone())
                .unwrap_or_else(|_| Json::String(format!("{other:?}"))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_widening() {
        assert_eq!(i64::from_value(Value::Int(Some(7))), Ok(7));
        assert_eq!(i32::from_value(Value::BigInt(Some(7))), Ok(7));
        assert_eq!(u8::from_value(Value::SmallInt(Some(255))), Ok(255));
    }

    #[test]
    fn test_integer_out_of_range() {
        assert_eq!(
            i8::from_value(Value::BigInt(Some(300))),
            Err(ValueError::OutOfRange("300".to_string()))
        );
        assert!(matches!(
            u32::from_value(Value::Int(Some(-1))),
            Err(ValueError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_null_handling() {
        assert_eq!(i32::from_value(Value::Int(None)), Err(ValueError::NullValue));
        assert_eq!(Option::<i32>::from_value(Value::Int(None)), Ok(None));
        assert_eq!(Option::<String>::from_value(Value::String(None)), Ok(None));
        assert_eq!(
            Option::<String>::from_value(Value::from("Ann")),
            Ok(Some("Ann".to_string()))
        );
    }

    #[test]
    fn test_type_mismatch() {
        assert!(matches!(
            i32::from_value(Value::from("nope")),
            Err(ValueError::TypeMismatch { .. })
        ));
        assert!(matches!(
            String::from_value(Value::Int(Some(1))),
            Err(ValueError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_floats_and_bools() {
        assert_eq!(f64::from_value(Value::Float(Some(1.5))), Ok(1.5));
        assert_eq!(f64::from_value(Value::Int(Some(2))), Ok(2.0));
        assert_eq!(bool::from_value(Value::Bool(Some(true))), Ok(true));
    }

    #[test]
    fn test_match_key_ignores_integer_width() {
        assert_eq!(match_key(&Value::Int(Some(3))), match_key(&Value::BigInt(Some(3))));
        assert_ne!(match_key(&Value::Int(Some(3))), match_key(&Value::from("3")));
        assert_eq!(match_key(&Value::Int(None)), None);
    }

    #[test]
    fn test_to_json() {
        assert_eq!(to_json(&Value::Int(Some(1))), serde_json::json!(1));
        assert_eq!(to_json(&Value::from("x")), serde_json::json!("x"));
        assert_eq!(to_json(&Value::String(None)), serde_json::Value::Null);
        assert_eq!(to_json(&Value::Bool(Some(false))), serde_json::json!(false));
    }
}
