//! Type tags and typed values.
//!
//! A [`TypeTag`] drives both path pattern compilation and value casting.
//! A [`TypedValue`] is the result of casting a wire value against a tag.

use crate::serialize::{deserialize, DeserializeError, Schema, Serializable};
use crate::value::{display_value, Map, Value};
use std::any::{Any, TypeId};
use std::fmt;

/// Integer rule: optional sign then digits.
pub const INTEGER_PATTERN: &str = "[-+]?[0-9]+";
/// Float rule: optional sign, digits, optional fraction.
pub const FLOAT_PATTERN: &str = r"[-+]?[0-9]+(?:\.[0-9]+)?";
/// Boolean rule, case-insensitive.
pub const BOOLEAN_PATTERN: &str = "(?i:0|1|true|false)";
/// Any run of characters up to the next path separator.
pub const SEGMENT_PATTERN: &str = "[^/]+";

/// Semantic type of a parameter or attribute.
#[derive(Clone)]
pub enum TypeTag {
    Integer,
    Float,
    Boolean,
    Object(ObjectType),
    Untyped,
}

impl TypeTag {
    /// Tag for a serializable domain type
    pub fn object<T: Serializable>() -> Self {
        TypeTag::Object(ObjectType::of::<T>())
    }

    /// Type name used in documentation and error messages; `None` when untyped.
    pub fn name(&self) -> Option<&'static str> {
        match self {
            TypeTag::Integer => Some("integer"),
            TypeTag::Float => Some("float"),
            TypeTag::Boolean => Some("boolean"),
            TypeTag::Object(object) => Some(object.name()),
            TypeTag::Untyped => None,
        }
    }

    /// Regex fragment a path placeholder of this type must match.
    pub fn pattern(&self) -> &'static str {
        match self {
            TypeTag::Integer => INTEGER_PATTERN,
            TypeTag::Float => FLOAT_PATTERN,
            TypeTag::Boolean => BOOLEAN_PATTERN,
            TypeTag::Object(_) | TypeTag::Untyped => SEGMENT_PATTERN,
        }
    }

    pub fn is_untyped(&self) -> bool {
        matches!(self, TypeTag::Untyped)
    }
}

impl PartialEq for TypeTag {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (TypeTag::Object(a), TypeTag::Object(b)) => a == b,
            (a, b) => std::mem::discriminant(a) == std::mem::discriminant(b),
        }
    }
}

impl Eq for TypeTag {}

impl fmt::Debug for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTag::Integer => write!(f, "Integer"),
            TypeTag::Float => write!(f, "Float"),
            TypeTag::Boolean => write!(f, "Boolean"),
            TypeTag::Object(object) => write!(f, "Object({})", object.name()),
            TypeTag::Untyped => write!(f, "Untyped"),
        }
    }
}

/// Name and type of one serializable attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeInfo {
    pub name: &'static str,
    pub type_tag: TypeTag,
}

/// Type-erased handle on a [`Serializable`] domain type.
#[derive(Clone, Copy)]
pub struct ObjectType {
    name: &'static str,
    type_id: fn() -> TypeId,
    deserialize: fn(&Map<String, Value>) -> Result<Box<dyn Any + Send>, DeserializeError>,
    attributes: fn() -> Vec<AttributeInfo>,
}

impl ObjectType {
    pub fn of<T: Serializable>() -> Self {
        Self {
            name: T::NAME,
            type_id: TypeId::of::<T>,
            deserialize: deserialize_erased::<T>,
            attributes: attributes_of::<T>,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn type_id(&self) -> TypeId {
        (self.type_id)()
    }

    /// Declared attributes, in wire order.
    pub fn attributes(&self) -> Vec<AttributeInfo> {
        (self.attributes)()
    }

    /// Build a fresh instance from a wire mapping.
    pub fn deserialize(&self, data: &Map<String, Value>) -> Result<Box<dyn Any + Send>, DeserializeError> {
        (self.deserialize)(data)
    }
}

impl PartialEq for ObjectType {
    fn eq(&self, other: &Self) -> bool {
        self.type_id() == other.type_id()
    }
}

impl fmt::Debug for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectType").field("name", &self.name).finish()
    }
}

fn deserialize_erased<T: Serializable>(
    data: &Map<String, Value>,
) -> Result<Box<dyn Any + Send>, DeserializeError> {
    deserialize::<T>(data).map(|instance| Box::new(instance) as Box<dyn Any + Send>)
}

fn attributes_of<T: Serializable>() -> Vec<AttributeInfo> {
    Schema::<T>::of()
        .attributes()
        .iter()
        .map(|attribute| AttributeInfo {
            name: attribute.name(),
            type_tag: attribute.type_tag().clone(),
        })
        .collect()
}

/// A wire value after casting.
pub enum TypedValue {
    /// Any integer from `i64::MIN` to `u64::MAX`
    Integer(i128),
    Float(f64),
    Boolean(bool),
    /// A freshly deserialized domain object
    Object(Box<dyn Any + Send>),
    /// Untyped values pass through unchanged
    Raw(Value),
}

impl TypedValue {
    /// Render the value the way it appears in error messages.
    pub fn describe(&self) -> String {
        match self {
            TypedValue::Integer(value) => value.to_string(),
            TypedValue::Float(value) => value.to_string(),
            TypedValue::Boolean(value) => value.to_string(),
            TypedValue::Object(_) => "object".to_string(),
            TypedValue::Raw(value) => display_value(value),
        }
    }
}

impl fmt::Debug for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypedValue::Integer(value) => f.debug_tuple("Integer").field(value).finish(),
            TypedValue::Float(value) => f.debug_tuple("Float").field(value).finish(),
            TypedValue::Boolean(value) => f.debug_tuple("Boolean").field(value).finish(),
            TypedValue::Object(_) => f.write_str("Object(..)"),
            TypedValue::Raw(value) => f.debug_tuple("Raw").field(value).finish(),
        }
    }
}
