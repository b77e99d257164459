//! Schema-driven serialization of domain objects.
//!
//! A domain type implements [`Serializable`] by declaring its attributes once;
//! the resulting [`Schema`] is cached per type and drives both directions:
//!
//! - [`serialize`] turns an object (or a collection of them) into a wire value,
//!   keyed by every declared attribute and recursing into nested objects.
//! - [`deserialize`] builds a `Default` instance and assigns every declared
//!   attribute present in the input, cast against the attribute's type tag.
//!
//! Object graphs are assumed to be acyclic. A cycle between serializable
//! attributes recurses without bound.

use crate::cache::TypeCache;
use crate::cast::CastError;
use crate::field::Field;
use crate::types::TypeTag;
use crate::value::{Map, Number, Value};
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use thiserror::Error;

/// Format used for naive timestamps on the wire.
pub const NAIVE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// A domain type with declared, serializable attributes.
///
/// ```
/// use gantry_core::{Schema, SchemaBuilder, Serializable};
///
/// #[derive(Debug, Default, PartialEq)]
/// struct Point {
///     x: i64,
///     y: i64,
/// }
///
/// impl Serializable for Point {
///     const NAME: &'static str = "Point";
///
///     fn describe(schema: &mut SchemaBuilder<Self>) {
///         schema
///             .attribute("x", |p| &p.x, |p| &mut p.x)
///             .attribute("y", |p| &p.y, |p| &mut p.y);
///     }
/// }
///
/// assert_eq!(Schema::<Point>::of().attributes().len(), 2);
/// ```
pub trait Serializable: Default + Send + Sync + 'static {
    /// Type name used in documentation and error messages.
    const NAME: &'static str;

    /// Declare the serializable attributes, in wire order.
    fn describe(schema: &mut SchemaBuilder<Self>);
}

/// Serialization failure
#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("Value {0} cannot be represented on the wire.")]
    NonFinite(f64),

    #[error("Attribute \"{attribute}\" of {type_name} could not be serialized.")]
    Attribute {
        type_name: &'static str,
        attribute: &'static str,
        #[source]
        source: Box<SerializeError>,
    },
}

/// Deserialization failure
#[derive(Debug, Error)]
pub enum DeserializeError {
    #[error("Expected a mapping for {type_name}, found {found}.")]
    NotAMapping {
        type_name: &'static str,
        found: &'static str,
    },

    #[error("Attribute \"{attribute}\" of {type_name} is invalid.")]
    Attribute {
        type_name: &'static str,
        attribute: &'static str,
        #[source]
        source: Box<CastError>,
    },
}

type Reader<T> = Box<dyn Fn(&T) -> Result<Value, SerializeError> + Send + Sync>;
type Writer<T> = Box<dyn Fn(&mut T, Value) -> Result<(), CastError> + Send + Sync>;

/// One declared attribute with its accessors.
pub struct Attribute<T> {
    name: &'static str,
    type_tag: TypeTag,
    read: Reader<T>,
    write: Writer<T>,
}

impl<T> Attribute<T> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn type_tag(&self) -> &TypeTag {
        &self.type_tag
    }
}

/// Attribute metadata of a serializable type.
pub struct Schema<T> {
    name: &'static str,
    attributes: Vec<Attribute<T>>,
}

impl<T: Serializable> Schema<T> {
    /// Cached schema of `T`, built on first use.
    pub fn of() -> Arc<Schema<T>> {
        TypeCache::global().get_or_insert_with(|| {
            let mut builder = SchemaBuilder::new();
            T::describe(&mut builder);
            Schema {
                name: T::NAME,
                attributes: builder.attributes,
            }
        })
    }
}

impl<T> Schema<T> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn attributes(&self) -> &[Attribute<T>] {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute<T>> {
        self.attributes.iter().find(|attribute| attribute.name == name)
    }
}

/// Collects attribute declarations for a [`Schema`].
pub struct SchemaBuilder<T> {
    attributes: Vec<Attribute<T>>,
}

impl<T: 'static> SchemaBuilder<T> {
    fn new() -> Self {
        Self {
            attributes: Vec::new(),
        }
    }

    /// Declare an attribute through its shared and mutable accessors.
    ///
    /// The attribute's type tag is derived from the field type. Declaring the
    /// same name twice replaces the earlier declaration.
    pub fn attribute<F, G, M>(&mut self, name: &'static str, get: G, get_mut: M) -> &mut Self
    where
        F: Field + ToWire,
        G: Fn(&T) -> &F + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut F + Send + Sync + 'static,
    {
        let attribute = Attribute {
            name,
            type_tag: F::type_tag(),
            read: Box::new(move |target: &T| get(target).to_wire()),
            write: Box::new(move |target: &mut T, raw: Value| {
                *get_mut(target) = F::from_wire(raw)?;
                Ok(())
            }),
        };

        match self.attributes.iter_mut().find(|existing| existing.name == name) {
            Some(existing) => *existing = attribute,
            None => self.attributes.push(attribute),
        }
        self
    }
}

/// Conversion into the wire value domain.
pub trait ToWire {
    fn to_wire(&self) -> Result<Value, SerializeError>;
}

/// Serialize any wire-convertible value.
pub fn serialize<T: ToWire + ?Sized>(value: &T) -> Result<Value, SerializeError> {
    value.to_wire()
}

/// Build a fresh `T` from a wire mapping.
///
/// No constructor runs: the instance starts from `T::default()` and only the
/// declared attributes present in `data` are assigned. Unknown keys are ignored.
pub fn deserialize<T: Serializable>(data: &Map<String, Value>) -> Result<T, DeserializeError> {
    let schema = Schema::<T>::of();
    let mut instance = T::default();

    for attribute in schema.attributes() {
        if let Some(raw) = data.get(attribute.name) {
            (attribute.write)(&mut instance, raw.clone()).map_err(|source| {
                DeserializeError::Attribute {
                    type_name: T::NAME,
                    attribute: attribute.name,
                    source: Box::new(source),
                }
            })?;
        }
    }

    Ok(instance)
}

impl<T: Serializable> ToWire for T {
    fn to_wire(&self) -> Result<Value, SerializeError> {
        let schema = Schema::<T>::of();
        let mut data = Map::new();

        for attribute in schema.attributes() {
            let value = (attribute.read)(self).map_err(|source| SerializeError::Attribute {
                type_name: T::NAME,
                attribute: attribute.name,
                source: Box::new(source),
            })?;
            data.insert(attribute.name.to_string(), value);
        }

        Ok(Value::Object(data))
    }
}

macro_rules! integer_to_wire {
    ($($ty:ty),*) => {
        $(
            impl ToWire for $ty {
                fn to_wire(&self) -> Result<Value, SerializeError> {
                    Ok(Value::from(*self))
                }
            }
        )*
    };
}

integer_to_wire!(i8, i16, i32, i64, u8, u16, u32, u64, usize);

impl ToWire for f64 {
    fn to_wire(&self) -> Result<Value, SerializeError> {
        Number::from_f64(*self)
            .map(Value::Number)
            .ok_or(SerializeError::NonFinite(*self))
    }
}

impl ToWire for f32 {
    fn to_wire(&self) -> Result<Value, SerializeError> {
        f64::from(*self).to_wire()
    }
}

impl ToWire for bool {
    fn to_wire(&self) -> Result<Value, SerializeError> {
        Ok(Value::Bool(*self))
    }
}

impl ToWire for String {
    fn to_wire(&self) -> Result<Value, SerializeError> {
        Ok(Value::String(self.clone()))
    }
}

impl ToWire for str {
    fn to_wire(&self) -> Result<Value, SerializeError> {
        Ok(Value::String(self.to_string()))
    }
}

impl ToWire for () {
    fn to_wire(&self) -> Result<Value, SerializeError> {
        Ok(Value::Null)
    }
}

impl ToWire for Value {
    fn to_wire(&self) -> Result<Value, SerializeError> {
        Ok(self.clone())
    }
}

impl<T: ToWire> ToWire for Option<T> {
    fn to_wire(&self) -> Result<Value, SerializeError> {
        match self {
            Some(value) => value.to_wire(),
            None => Ok(Value::Null),
        }
    }
}

impl<T: ToWire> ToWire for [T] {
    fn to_wire(&self) -> Result<Value, SerializeError> {
        self.iter()
            .map(ToWire::to_wire)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array)
    }
}

impl<T: ToWire> ToWire for Vec<T> {
    fn to_wire(&self) -> Result<Value, SerializeError> {
        self.as_slice().to_wire()
    }
}

impl<T: ToWire> ToWire for BTreeMap<String, T> {
    fn to_wire(&self) -> Result<Value, SerializeError> {
        map_to_wire(self.iter())
    }
}

impl<T: ToWire> ToWire for HashMap<String, T> {
    fn to_wire(&self) -> Result<Value, SerializeError> {
        // Sorted so repeated serialization yields identical output.
        let sorted: BTreeMap<&String, &T> = self.iter().collect();
        map_to_wire(sorted.into_iter())
    }
}

fn map_to_wire<'a, T, I>(entries: I) -> Result<Value, SerializeError>
where
    T: ToWire + 'a,
    I: Iterator<Item = (&'a String, &'a T)>,
{
    let mut data = Map::new();
    for (key, value) in entries {
        data.insert(key.clone(), value.to_wire()?);
    }
    Ok(Value::Object(data))
}

impl ToWire for DateTime<Utc> {
    fn to_wire(&self) -> Result<Value, SerializeError> {
        Ok(Value::String(self.to_rfc3339_opts(SecondsFormat::Secs, true)))
    }
}

impl ToWire for NaiveDateTime {
    fn to_wire(&self) -> Result<Value, SerializeError> {
        Ok(Value::String(self.format(NAIVE_TIMESTAMP_FORMAT).to_string()))
    }
}
