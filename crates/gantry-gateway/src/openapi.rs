//! OpenAPI 3.0 specification generation

use crate::definition::{MethodDefinition, RouteDefinition};
use crate::method::HttpMethod;
use crate::param::ParameterSpec;
use gantry_core::{ObjectType, TypeTag, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const JSON_MEDIA_TYPE: &str = "application/json";

/// OpenAPI 3.0 specification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenApiSpec {
    pub openapi: String,
    pub info: OpenApiInfo,
    pub servers: Vec<OpenApiServer>,
    pub paths: BTreeMap<String, OpenApiPathItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<OpenApiComponents>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenApiInfo {
    pub title: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenApiServer {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OpenApiPathItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get: Option<OpenApiOperation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<OpenApiOperation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub put: Option<OpenApiOperation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<OpenApiOperation>,
}

impl OpenApiPathItem {
    pub fn operation(&self, method: HttpMethod) -> Option<&OpenApiOperation> {
        match method {
            HttpMethod::Get => self.get.as_ref(),
            HttpMethod::Post => self.post.as_ref(),
            HttpMethod::Put => self.put.as_ref(),
            HttpMethod::Patch => self.patch.as_ref(),
        }
    }

    fn set(&mut self, method: HttpMethod, operation: OpenApiOperation) {
        let slot = match method {
            HttpMethod::Get => &mut self.get,
            HttpMethod::Post => &mut self.post,
            HttpMethod::Put => &mut self.put,
            HttpMethod::Patch => &mut self.patch,
        };
        *slot = Some(operation);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenApiOperation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub parameters: Vec<OpenApiParameter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_body: Option<OpenApiRequestBody>,
    pub responses: BTreeMap<String, OpenApiResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenApiParameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: String, // "path" or "query"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub required: bool,
    pub schema: OpenApiSchema,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenApiRequestBody {
    pub required: bool,
    pub content: BTreeMap<String, OpenApiMediaType>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenApiResponse {
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<BTreeMap<String, OpenApiMediaType>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenApiMediaType {
    pub schema: OpenApiSchema,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpenApiSchema {
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<OpenApiSchema>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub properties: BTreeMap<String, OpenApiSchema>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub required: Vec<String>,
}

impl OpenApiSchema {
    fn typed(schema_type: &str, format: Option<&str>) -> Self {
        Self {
            schema_type: Some(schema_type.to_string()),
            format: format.map(str::to_string),
            ..Self::default()
        }
    }

    fn reference(name: &str) -> Self {
        Self {
            reference: Some(format!("#/components/schemas/{}", name)),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OpenApiComponents {
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub schemas: BTreeMap<String, OpenApiSchema>,
}

/// OpenAPI spec builder
pub struct OpenApiSpecBuilder {
    title: String,
    version: String,
    description: Option<String>,
    servers: Vec<OpenApiServer>,
    routes: Vec<RouteDefinition>,
}

impl OpenApiSpecBuilder {
    /// Create a new OpenAPI spec builder
    pub fn new(title: &str, version: &str) -> Self {
        Self {
            title: title.to_string(),
            version: version.to_string(),
            description: None,
            servers: Vec::new(),
            routes: Vec::new(),
        }
    }

    /// Set description
    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Add a server
    pub fn server(mut self, url: &str, description: Option<&str>) -> Self {
        self.servers.push(OpenApiServer {
            url: url.to_string(),
            description: description.map(|s| s.to_string()),
        });
        self
    }

    /// Add routes
    pub fn routes<'a>(mut self, routes: impl IntoIterator<Item = &'a RouteDefinition>) -> Self {
        self.routes.extend(routes.into_iter().cloned());
        self
    }

    /// Build the OpenAPI specification
    pub fn build(self) -> OpenApiSpec {
        let mut paths: BTreeMap<String, OpenApiPathItem> = BTreeMap::new();
        let mut schemas = BTreeMap::new();

        for route in &self.routes {
            let path_item = paths.entry(route.path().to_string()).or_default();
            for method in route.methods() {
                path_item.set(method.method(), operation(route, method, &mut schemas));
            }
        }

        OpenApiSpec {
            openapi: "3.0.0".to_string(),
            info: OpenApiInfo {
                title: self.title,
                version: self.version,
                description: self.description,
            },
            servers: self.servers,
            paths,
            components: if schemas.is_empty() {
                None
            } else {
                Some(OpenApiComponents { schemas })
            },
        }
    }
}

impl OpenApiSpec {
    /// Convert to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// One operation: path and scalar parameters as `in: path`/`in: query`,
/// domain-object parameters in a JSON request body.
fn operation(
    route: &RouteDefinition,
    method: &MethodDefinition,
    schemas: &mut BTreeMap<String, OpenApiSchema>,
) -> OpenApiOperation {
    let mut parameters = Vec::new();
    let mut body = OpenApiSchema::typed("object", None);

    for parameter in method.parameters() {
        let schema = parameter_schema(parameter, schemas);

        if matches!(parameter.type_tag(), TypeTag::Object(_)) {
            if parameter.is_required() {
                body.required.push(parameter.name().to_string());
            }
            body.properties.insert(parameter.name().to_string(), schema);
            continue;
        }

        parameters.push(OpenApiParameter {
            name: parameter.name().to_string(),
            location: if parameter.is_path_parameter() { "path" } else { "query" }.to_string(),
            description: non_empty(parameter.description()),
            required: parameter.is_required(),
            schema,
        });
    }

    let request_body = if body.properties.is_empty() {
        None
    } else {
        Some(OpenApiRequestBody {
            required: !body.required.is_empty(),
            content: BTreeMap::from([(JSON_MEDIA_TYPE.to_string(), OpenApiMediaType { schema: body })]),
        })
    };

    OpenApiOperation {
        summary: non_empty(method.description()),
        operation_id: Some(operation_id(method.method(), route.path())),
        parameters,
        request_body,
        responses: responses(),
    }
}

fn responses() -> BTreeMap<String, OpenApiResponse> {
    let mut errors = OpenApiSchema::typed("object", None);
    errors.properties.insert(
        "errors".to_string(),
        OpenApiSchema {
            items: Some(Box::new(OpenApiSchema::typed("string", None))),
            ..OpenApiSchema::typed("array", None)
        },
    );

    BTreeMap::from([
        (
            "200".to_string(),
            OpenApiResponse {
                description: "Successful response".to_string(),
                content: Some(BTreeMap::from([(
                    JSON_MEDIA_TYPE.to_string(),
                    OpenApiMediaType {
                        schema: OpenApiSchema::default(),
                    },
                )])),
            },
        ),
        (
            "default".to_string(),
            OpenApiResponse {
                description: "Error response".to_string(),
                content: Some(BTreeMap::from([(
                    JSON_MEDIA_TYPE.to_string(),
                    OpenApiMediaType { schema: errors },
                )])),
            },
        ),
    ])
}

fn parameter_schema(
    parameter: &ParameterSpec,
    schemas: &mut BTreeMap<String, OpenApiSchema>,
) -> OpenApiSchema {
    let mut schema = match parameter.type_tag() {
        TypeTag::Untyped => named_schema(parameter.type_name()),
        tag => tag_schema(tag, schemas),
    };
    schema.description = non_empty(parameter.description());
    schema.default = parameter.default().filter(|value| !value.is_null()).cloned();
    schema
}

/// Schema of an untyped parameter, from the name of its Rust type
fn named_schema(type_name: &str) -> OpenApiSchema {
    match type_name {
        "string" => OpenApiSchema::typed("string", None),
        "timestamp" => OpenApiSchema::typed("string", Some("date-time")),
        "sequence" => OpenApiSchema {
            items: Some(Box::default()),
            ..OpenApiSchema::typed("array", None)
        },
        "mapping" => OpenApiSchema::typed("object", None),
        _ => OpenApiSchema::default(),
    }
}

fn tag_schema(tag: &TypeTag, schemas: &mut BTreeMap<String, OpenApiSchema>) -> OpenApiSchema {
    match tag {
        TypeTag::Integer => OpenApiSchema::typed("integer", Some("int64")),
        TypeTag::Float => OpenApiSchema::typed("number", Some("double")),
        TypeTag::Boolean => OpenApiSchema::typed("boolean", None),
        TypeTag::Object(object) => {
            register_component(object, schemas);
            OpenApiSchema::reference(object.name())
        }
        TypeTag::Untyped => OpenApiSchema::default(),
    }
}

/// Add the component schema of `object`, and of the objects it nests.
fn register_component(object: &ObjectType, schemas: &mut BTreeMap<String, OpenApiSchema>) {
    if schemas.contains_key(object.name()) {
        return;
    }
    // Placeholder first so recursive attribute types terminate
    schemas.insert(object.name().to_string(), OpenApiSchema::default());

    let mut schema = OpenApiSchema::typed("object", None);
    for attribute in object.attributes() {
        schema
            .properties
            .insert(attribute.name.to_string(), tag_schema(&attribute.type_tag, schemas));
    }
    schemas.insert(object.name().to_string(), schema);
}

fn operation_id(method: HttpMethod, path: &str) -> String {
    let mut id = method.as_str().to_string();
    for segment in path
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|segment| !segment.is_empty())
    {
        id.push('_');
        id.push_str(segment);
    }
    id
}

fn non_empty(text: &str) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}
