//! Route definitions: static metadata of a route and its methods.
//!
//! A definition is built once per route type from its declaration, and is
//! used both for dispatch and for documentation.

use crate::docs::Descriptions;
use crate::error::{DefinitionResult, RouteDefinitionError};
use crate::method::HttpMethod;
use crate::param::ParameterSpec;
use gantry_core::{cast, Value};
use serde_json::{json, Map};
use std::collections::BTreeMap;

/// Declared method before validation: doc text and parameters
#[derive(Debug, Clone)]
pub struct MethodDeclaration {
    pub method: HttpMethod,
    pub doc: String,
    pub parameters: Vec<ParameterSpec>,
}

/// Metadata of one HTTP method of a route
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDefinition {
    method: HttpMethod,
    description: String,
    /// Path parameters first, then the method's own parameters
    parameters: Vec<ParameterSpec>,
}

impl MethodDefinition {
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn parameters(&self) -> &[ParameterSpec] {
        &self.parameters
    }

    /// Parameters taken from the parameter bag
    pub fn bag_parameters(&self) -> impl Iterator<Item = &ParameterSpec> {
        self.parameters
            .iter()
            .filter(|parameter| !parameter.is_path_parameter())
    }

    pub fn parameter(&self, name: &str) -> Option<&ParameterSpec> {
        self.parameters
            .iter()
            .find(|parameter| parameter.name() == name)
    }

    pub fn to_document(&self) -> Value {
        let parameters: Map<String, Value> = self
            .parameters
            .iter()
            .map(|parameter| (parameter.name().to_string(), parameter.to_document()))
            .collect();

        json!({
            "description": self.description,
            "parameters": parameters,
        })
    }
}

/// Static metadata of one route
#[derive(Debug, Clone, PartialEq)]
pub struct RouteDefinition {
    path: String,
    version: u32,
    description: String,
    path_parameters: Vec<ParameterSpec>,
    methods: BTreeMap<HttpMethod, MethodDefinition>,
}

impl RouteDefinition {
    /// Validate a route declaration and build its definition.
    ///
    /// Descriptions of path parameters come from the route doc text, those of
    /// method parameters from the method doc text.
    pub fn build(
        path: &str,
        version: u32,
        doc: &str,
        path_parameters: Vec<ParameterSpec>,
        methods: Vec<MethodDeclaration>,
    ) -> DefinitionResult<Self> {
        let route_docs = Descriptions::parse(doc);

        let mut described_path_parameters: Vec<ParameterSpec> = Vec::new();
        for parameter in path_parameters {
            if described_path_parameters
                .iter()
                .any(|existing| existing.name() == parameter.name())
            {
                return Err(RouteDefinitionError::DuplicateParameter {
                    path: path.to_string(),
                    name: parameter.name().to_string(),
                });
            }
            let description = route_docs.parameter(parameter.name()).to_string();
            described_path_parameters.push(parameter.with_description(description));
        }

        let mut definitions = BTreeMap::new();
        for declaration in methods {
            if definitions.contains_key(&declaration.method) {
                return Err(RouteDefinitionError::DuplicateMethod {
                    path: path.to_string(),
                    method: declaration.method.to_string(),
                });
            }

            let definition = Self::build_method(path, &described_path_parameters, declaration)?;
            definitions.insert(definition.method, definition);
        }

        Ok(Self {
            path: path.to_string(),
            version,
            description: route_docs.summary().to_string(),
            path_parameters: described_path_parameters,
            methods: definitions,
        })
    }

    fn build_method(
        path: &str,
        path_parameters: &[ParameterSpec],
        declaration: MethodDeclaration,
    ) -> DefinitionResult<MethodDefinition> {
        let docs = Descriptions::parse(&declaration.doc);
        let mut parameters = path_parameters.to_vec();

        for parameter in declaration.parameters {
            if path_parameters
                .iter()
                .any(|existing| existing.name() == parameter.name())
            {
                return Err(RouteDefinitionError::PathParameterCollision {
                    path: path.to_string(),
                    name: parameter.name().to_string(),
                    method: declaration.method.to_string(),
                });
            }
            if parameters
                .iter()
                .any(|existing| existing.name() == parameter.name())
            {
                return Err(RouteDefinitionError::DuplicateParameter {
                    path: path.to_string(),
                    name: parameter.name().to_string(),
                });
            }

            check_default(path, &parameter)?;

            let description = docs.parameter(parameter.name()).to_string();
            parameters.push(parameter.with_description(description));
        }

        Ok(MethodDefinition {
            method: declaration.method,
            description: docs.summary().to_string(),
            parameters,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Route summary from its doc text
    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn path_parameters(&self) -> &[ParameterSpec] {
        &self.path_parameters
    }

    pub fn method(&self, method: HttpMethod) -> Option<&MethodDefinition> {
        self.methods.get(&method)
    }

    pub fn methods(&self) -> impl Iterator<Item = &MethodDefinition> {
        self.methods.values()
    }

    pub fn supports(&self, method: HttpMethod) -> bool {
        self.methods.contains_key(&method)
    }

    /// Documentation form:
    /// `{path, methods: {method: {description, parameters: {name: {type, required, default, description}}}}}`
    pub fn to_document(&self) -> Value {
        let methods: Map<String, Value> = self
            .methods
            .values()
            .map(|method| (method.method.to_string(), method.to_document()))
            .collect();

        json!({
            "path": self.path,
            "methods": methods,
        })
    }
}

/// A non-null default must satisfy the declared type of its parameter.
fn check_default(path: &str, parameter: &ParameterSpec) -> DefinitionResult<()> {
    let valid = match parameter.default() {
        Some(Value::Null) => parameter.is_nullable(),
        Some(default) => cast(parameter.type_tag(), default.clone()).is_ok(),
        None => true,
    };

    if valid {
        Ok(())
    } else {
        Err(RouteDefinitionError::InvalidDefault {
            path: path.to_string(),
            name: parameter.name().to_string(),
            expected: parameter.type_name().to_string(),
        })
    }
}
