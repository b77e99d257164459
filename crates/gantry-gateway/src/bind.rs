//! Binding of path captures and the parameter bag to typed arguments.

use crate::definition::MethodDefinition;
use crate::param::ParameterSpec;
use crate::route::{Arguments, UnboundArgument};
use gantry_core::{cast, ApiError, ApiResult, Parameters, TypedValue, Value};
use std::collections::HashMap;

/// Cast the captured placeholder values of a matched path.
pub(crate) fn path_arguments(
    specs: &[ParameterSpec],
    mut captures: HashMap<String, String>,
) -> ApiResult<Arguments> {
    let mut arguments = Arguments::default();

    for spec in specs {
        let raw = captures
            .remove(spec.name())
            .ok_or_else(|| ApiError::internal(UnboundArgument(spec.name().to_string())))?;

        let value = cast(spec.type_tag(), Value::String(raw))
            .map_err(|cause| ApiError::invalid_type(spec.name(), spec.type_name(), cause))?;
        arguments.push(spec.name(), value);
    }

    Ok(arguments)
}

/// Bind the non-path parameters of `method` from the parameter bag.
///
/// A `null` value counts as absent: a required parameter is then missing, an
/// optional one takes its default.
pub(crate) fn method_arguments(
    method: &MethodDefinition,
    parameters: &Parameters,
) -> ApiResult<Arguments> {
    let mut arguments = Arguments::default();

    for spec in method.bag_parameters() {
        let supplied = parameters
            .get(spec.name())
            .filter(|value| !value.is_null())
            .cloned();

        let value = match supplied {
            Some(value) => cast(spec.type_tag(), value)
                .map_err(|cause| ApiError::invalid_type(spec.name(), spec.type_name(), cause))?,
            None if spec.is_required() => return Err(ApiError::missing_parameter(spec.name())),
            None => default_value(spec)?,
        };
        arguments.push(spec.name(), value);
    }

    Ok(arguments)
}

fn default_value(spec: &ParameterSpec) -> ApiResult<TypedValue> {
    match spec.default() {
        Some(default) if !default.is_null() => {
            cast(spec.type_tag(), default.clone()).map_err(ApiError::internal)
        }
        _ => Ok(TypedValue::Raw(Value::Null)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{MethodDeclaration, RouteDefinition};
    use crate::method::HttpMethod;
    use serde_json::json;

    fn list_cars() -> RouteDefinition {
        RouteDefinition::build(
            "/car",
            1,
            "",
            vec![],
            vec![MethodDeclaration {
                method: HttpMethod::Get,
                doc: String::new(),
                parameters: vec![
                    ParameterSpec::optional::<i64>("minPrice", 0),
                    ParameterSpec::optional::<Option<i64>>("maxPrice", Value::Null),
                    ParameterSpec::required::<String>("brand"),
                ],
            }],
        )
        .unwrap()
    }

    fn bag(value: Value) -> Parameters {
        match value {
            Value::Object(map) => map,
            _ => Parameters::new(),
        }
    }

    #[test]
    fn test_defaults_are_cast() {
        let definition = list_cars();
        let get = definition.method(HttpMethod::Get).unwrap();

        let mut args = method_arguments(get, &bag(json!({"brand": "Ford"}))).unwrap();
        assert_eq!(args.take::<i64>("minPrice").unwrap(), 0);
        assert_eq!(args.take::<Option<i64>>("maxPrice").unwrap(), None);
        assert_eq!(args.take::<String>("brand").unwrap(), "Ford");
    }

    #[test]
    fn test_null_counts_as_absent() {
        let definition = list_cars();
        let get = definition.method(HttpMethod::Get).unwrap();

        let err = method_arguments(get, &bag(json!({"brand": null}))).unwrap_err();
        assert!(matches!(err, ApiError::MissingParameter { .. }));

        let mut args =
            method_arguments(get, &bag(json!({"brand": "Ford", "minPrice": null}))).unwrap();
        assert_eq!(args.take::<i64>("minPrice").unwrap(), 0);
    }

    #[test]
    fn test_unknown_parameters_are_ignored() {
        let definition = list_cars();
        let get = definition.method(HttpMethod::Get).unwrap();

        let args = method_arguments(get, &bag(json!({"brand": "Ford", "color": "red"}))).unwrap();
        assert_eq!(args.names().collect::<Vec<_>>(), vec!["minPrice", "maxPrice", "brand"]);
    }

    #[test]
    fn test_invalid_value() {
        let definition = list_cars();
        let get = definition.method(HttpMethod::Get).unwrap();

        let err =
            method_arguments(get, &bag(json!({"brand": "Ford", "minPrice": "cheap"}))).unwrap_err();
        assert_eq!(
            err.messages(),
            vec![
                "Parameter \"minPrice\" value is not a valid integer.".to_string(),
                "Value \"cheap\" is not a valid integer.".to_string(),
            ]
        );
    }

    #[test]
    fn test_path_arguments() {
        let specs = vec![ParameterSpec::path::<i64>("id")];

        let captures = HashMap::from([("id".to_string(), "-7".to_string())]);
        let mut args = path_arguments(&specs, captures).unwrap();
        assert_eq!(args.take::<i64>("id").unwrap(), -7);

        let captures = HashMap::from([("id".to_string(), "99999999999999999999".to_string())]);
        let err = path_arguments(&specs, captures).unwrap_err();
        assert_eq!(err.status_code(), http::StatusCode::BAD_REQUEST);
    }
}
