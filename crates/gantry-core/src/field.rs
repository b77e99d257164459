//! Rust types that parameters and attributes can be declared as.

use crate::cast::{cast, CastError};
use crate::serialize::{deserialize, DeserializeError, Serializable, NAIVE_TIMESTAMP_FORMAT};
use crate::types::{TypeTag, TypedValue};
use crate::value::{display_value, kind_of, Number, Value};
use chrono::{DateTime, NaiveDateTime, Utc};
use std::collections::{BTreeMap, HashMap};

/// A type with a declared [`TypeTag`] that can be built from a typed value.
pub trait Field: Sized + Send + 'static {
    /// Tag used for pattern compilation and casting.
    fn type_tag() -> TypeTag;

    /// Name used in error messages.
    fn type_name() -> &'static str {
        Self::type_tag().name().unwrap_or("value")
    }

    /// Whether `null` converts to a value of this type.
    fn accepts_null() -> bool {
        false
    }

    /// Convert an already cast value.
    fn from_typed(value: TypedValue) -> Result<Self, CastError>;

    /// Cast a wire value against [`Field::type_tag`], then convert it.
    ///
    /// `null` is handed over as-is so optional fields can accept it.
    fn from_wire(value: Value) -> Result<Self, CastError> {
        if value.is_null() {
            Self::from_typed(TypedValue::Raw(Value::Null))
        } else {
            Self::from_typed(cast(&Self::type_tag(), value)?)
        }
    }
}

fn mismatch<T: Field>(value: &TypedValue) -> CastError {
    CastError::mismatch(T::type_name(), value.describe())
}

fn integer_of(value: TypedValue) -> Result<i128, CastError> {
    match value {
        TypedValue::Integer(v) => Ok(v),
        TypedValue::Raw(raw) => match cast(&TypeTag::Integer, raw)? {
            TypedValue::Integer(v) => Ok(v),
            other => Err(CastError::mismatch("integer", other.describe())),
        },
        other => Err(CastError::mismatch("integer", other.describe())),
    }
}

macro_rules! integer_field {
    ($($ty:ty),*) => {
        $(
            impl Field for $ty {
                fn type_tag() -> TypeTag {
                    TypeTag::Integer
                }

                fn from_typed(value: TypedValue) -> Result<Self, CastError> {
                    let wide = integer_of(value)?;
                    <$ty>::try_from(wide).map_err(|_| CastError::OutOfRange {
                        target: stringify!($ty),
                        value: wide.to_string(),
                    })
                }
            }
        )*
    };
}

integer_field!(i8, i16, i32, i64, u8, u16, u32, u64, usize);

impl Field for f64 {
    fn type_tag() -> TypeTag {
        TypeTag::Float
    }

    fn from_typed(value: TypedValue) -> Result<Self, CastError> {
        match value {
            TypedValue::Float(v) => Ok(v),
            TypedValue::Integer(v) => Ok(v as f64),
            TypedValue::Raw(raw) if !raw.is_null() => Self::from_typed(cast(&TypeTag::Float, raw)?),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl Field for bool {
    fn type_tag() -> TypeTag {
        TypeTag::Boolean
    }

    fn from_typed(value: TypedValue) -> Result<Self, CastError> {
        match value {
            TypedValue::Boolean(v) => Ok(v),
            TypedValue::Raw(raw) if !raw.is_null() => {
                Self::from_typed(cast(&TypeTag::Boolean, raw)?)
            }
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl Field for String {
    fn type_tag() -> TypeTag {
        TypeTag::Untyped
    }

    fn type_name() -> &'static str {
        "string"
    }

    fn from_typed(value: TypedValue) -> Result<Self, CastError> {
        match value {
            TypedValue::Raw(Value::String(text)) => Ok(text),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl Field for Value {
    fn type_tag() -> TypeTag {
        TypeTag::Untyped
    }

    fn accepts_null() -> bool {
        true
    }

    fn from_typed(value: TypedValue) -> Result<Self, CastError> {
        match value {
            TypedValue::Raw(raw) => Ok(raw),
            TypedValue::Integer(v) => i64::try_from(v)
                .map(Value::from)
                .or_else(|_| u64::try_from(v).map(Value::from))
                .map_err(|_| CastError::OutOfRange {
                    target: "integer",
                    value: v.to_string(),
                }),
            TypedValue::Boolean(v) => Ok(Value::Bool(v)),
            TypedValue::Float(v) => Number::from_f64(v)
                .map(Value::Number)
                .ok_or_else(|| CastError::mismatch("number", v.to_string())),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl<F: Field> Field for Option<F> {
    fn type_tag() -> TypeTag {
        F::type_tag()
    }

    fn type_name() -> &'static str {
        F::type_name()
    }

    fn accepts_null() -> bool {
        true
    }

    fn from_typed(value: TypedValue) -> Result<Self, CastError> {
        match value {
            TypedValue::Raw(Value::Null) => Ok(None),
            other => F::from_typed(other).map(Some),
        }
    }
}

/// Sequences are untyped as a whole; each element is cast against `F`.
impl<F: Field> Field for Vec<F> {
    fn type_tag() -> TypeTag {
        TypeTag::Untyped
    }

    fn type_name() -> &'static str {
        "sequence"
    }

    fn from_typed(value: TypedValue) -> Result<Self, CastError> {
        match value {
            TypedValue::Raw(Value::Array(items)) => items.into_iter().map(F::from_wire).collect(),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

/// Mappings are untyped as a whole; each value is cast against `F`.
fn entries_of<F, C>(value: TypedValue) -> Result<C, CastError>
where
    F: Field,
    C: FromIterator<(String, F)>,
{
    match value {
        TypedValue::Raw(Value::Object(entries)) => entries
            .into_iter()
            .map(|(key, value)| F::from_wire(value).map(|field| (key, field)))
            .collect(),
        other => Err(CastError::mismatch("mapping", other.describe())),
    }
}

impl<F: Field> Field for BTreeMap<String, F> {
    fn type_tag() -> TypeTag {
        TypeTag::Untyped
    }

    fn type_name() -> &'static str {
        "mapping"
    }

    fn from_typed(value: TypedValue) -> Result<Self, CastError> {
        entries_of(value)
    }
}

impl<F: Field> Field for HashMap<String, F> {
    fn type_tag() -> TypeTag {
        TypeTag::Untyped
    }

    fn type_name() -> &'static str {
        "mapping"
    }

    fn from_typed(value: TypedValue) -> Result<Self, CastError> {
        entries_of(value)
    }
}

impl<T: Serializable> Field for T {
    fn type_tag() -> TypeTag {
        TypeTag::object::<T>()
    }

    fn type_name() -> &'static str {
        T::NAME
    }

    fn from_typed(value: TypedValue) -> Result<Self, CastError> {
        match value {
            TypedValue::Object(object) => object
                .downcast::<T>()
                .map(|instance| *instance)
                .map_err(|_| CastError::mismatch(T::NAME, "object")),
            TypedValue::Raw(Value::Object(data)) => Ok(deserialize::<T>(&data)?),
            TypedValue::Raw(other) => Err(DeserializeError::NotAMapping {
                type_name: T::NAME,
                found: kind_of(&other),
            }
            .into()),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl Field for DateTime<Utc> {
    fn type_tag() -> TypeTag {
        TypeTag::Untyped
    }

    fn type_name() -> &'static str {
        "timestamp"
    }

    fn from_typed(value: TypedValue) -> Result<Self, CastError> {
        match value {
            TypedValue::Raw(Value::String(text)) => DateTime::parse_from_rfc3339(&text)
                .map(|parsed| parsed.with_timezone(&Utc))
                .map_err(|_| CastError::mismatch("timestamp", text)),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl Field for NaiveDateTime {
    fn type_tag() -> TypeTag {
        TypeTag::Untyped
    }

    fn type_name() -> &'static str {
        "timestamp"
    }

    fn from_typed(value: TypedValue) -> Result<Self, CastError> {
        match value {
            TypedValue::Raw(Value::String(text)) => {
                NaiveDateTime::parse_from_str(&text, NAIVE_TIMESTAMP_FORMAT)
                    .map_err(|_| CastError::mismatch("timestamp", text))
            }
            TypedValue::Raw(other) => Err(CastError::mismatch("timestamp", display_value(&other))),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}
