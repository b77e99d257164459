//! Core types for the Gantry gateway.
//!
//! This crate provides the data-binding layer shared by the routing engine:
//! - Wire values and the flat parameter bag
//! - Type tags and the type caster
//! - Schema-driven serialization of domain objects
//! - The error taxonomy and its HTTP status mapping
//! - Per-type memoization

pub mod cache;
pub mod cast;
pub mod error;
pub mod field;
pub mod serialize;
pub mod types;
pub mod value;

pub use cache::TypeCache;
pub use cast::{cast, CastError};
pub use error::{ApiError, ApiResult, BoxError};
pub use field::Field;
pub use serialize::{
    deserialize, serialize, Attribute, DeserializeError, Schema, SchemaBuilder, Serializable,
    SerializeError, ToWire,
};
pub use types::{AttributeInfo, ObjectType, TypeTag, TypedValue};
pub use value::{Map, Parameters, Value};
