//! Parameter metadata

use gantry_core::{Field, TypeTag, Value};
use serde_json::{json, Map};

/// Metadata for one handler parameter.
///
/// An optional parameter always carries a default, possibly `null`. Path
/// parameters are always required and never have a default.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSpec {
    name: String,
    type_tag: TypeTag,
    type_name: &'static str,
    required: bool,
    default: Option<Value>,
    nullable: bool,
    description: String,
    path_parameter: bool,
}

impl ParameterSpec {
    /// Path parameter typed after `F`
    pub fn path<F: Field>(name: impl Into<String>) -> Self {
        Self::typed::<F>(name, true, None, true)
    }

    /// Required body/query parameter typed after `F`
    pub fn required<F: Field>(name: impl Into<String>) -> Self {
        Self::typed::<F>(name, true, None, false)
    }

    /// Optional body/query parameter typed after `F`, with its default
    pub fn optional<F: Field>(name: impl Into<String>, default: impl Into<Value>) -> Self {
        Self::typed::<F>(name, false, Some(default.into()), false)
    }

    /// Parameter with no declared type: values pass through unchanged
    pub fn untyped(name: impl Into<String>, default: Option<Value>) -> Self {
        Self {
            name: name.into(),
            type_tag: TypeTag::Untyped,
            type_name: "value",
            required: default.is_none(),
            default,
            nullable: true,
            description: String::new(),
            path_parameter: false,
        }
    }

    fn typed<F: Field>(
        name: impl Into<String>,
        required: bool,
        default: Option<Value>,
        path_parameter: bool,
    ) -> Self {
        Self {
            name: name.into(),
            type_tag: F::type_tag(),
            type_name: F::type_name(),
            required,
            default,
            nullable: F::accepts_null(),
            description: String::new(),
            path_parameter,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_tag(&self) -> &TypeTag {
        &self.type_tag
    }

    /// Name of the expected type in error messages
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Whether `null` is a valid value, and so a valid default
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_path_parameter(&self) -> bool {
        self.path_parameter
    }

    /// Documentation entry: `{type, required, default, description}`
    ///
    /// `type` is null for parameters passed through unchanged.
    pub fn to_document(&self) -> Value {
        let mut document = Map::new();
        let type_name = match self.type_tag {
            TypeTag::Untyped if self.type_name == "value" => Value::Null,
            _ => json!(self.type_name),
        };
        document.insert("type".to_string(), type_name);
        document.insert("required".to_string(), json!(self.required));
        document.insert(
            "default".to_string(),
            self.default.clone().unwrap_or(Value::Null),
        );
        document.insert("description".to_string(), json!(self.description));
        if self.path_parameter {
            document.insert("pathParameter".to_string(), json!(true));
        }
        Value::Object(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_parameter_is_required() {
        let spec = ParameterSpec::path::<i64>("id");
        assert!(spec.is_required());
        assert!(spec.is_path_parameter());
        assert_eq!(spec.default(), None);
        assert_eq!(spec.type_tag(), &TypeTag::Integer);
    }

    #[test]
    fn test_optional_carries_default() {
        let spec = ParameterSpec::optional::<Option<i64>>("maxPrice", Value::Null);
        assert!(!spec.is_required());
        assert!(spec.is_nullable());
        assert!(!ParameterSpec::optional::<i64>("minPrice", 0).is_nullable());
        assert_eq!(spec.default(), Some(&Value::Null));
        assert_eq!(spec.type_tag(), &TypeTag::Integer);
    }

    #[test]
    fn test_document_type_names() {
        assert_eq!(ParameterSpec::required::<String>("brand").to_document()["type"], json!("string"));
        assert_eq!(ParameterSpec::untyped("payload", None).to_document()["type"], Value::Null);
    }

    #[test]
    fn test_untyped_requiredness_follows_default() {
        assert!(ParameterSpec::untyped("payload", None).is_required());
        assert!(!ParameterSpec::untyped("payload", Some(json!({}))).is_required());
    }

    #[test]
    fn test_document() {
        let spec = ParameterSpec::optional::<i64>("minPrice", 0)
            .with_description("The minimal price of the returned cars.");
        assert_eq!(
            spec.to_document(),
            json!({
                "type": "integer",
                "required": false,
                "default": 0,
                "description": "The minimal price of the returned cars.",
            })
        );
    }
}
