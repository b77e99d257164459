//! Versioned gateway over a route registry.
//!
//! Request URIs look like `<prefix>/v<version>/<path>`. A URI without the
//! version prefix is dispatched under the default version.

use crate::openapi::{OpenApiSpec, OpenApiSpecBuilder};
use crate::registry::RouteRegistry;
use crate::response::GatewayResponse;
use crate::router::Router;
use gantry_core::{ApiResult, Parameters, Value};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Gateway configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Prefix of every versioned URI
    pub api_prefix: String,
    /// Version used for URIs without a version segment
    pub default_version: u32,
    /// Title of the generated documentation
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_prefix: "/api".to_string(),
            default_version: 1,
            title: "API Documentation".to_string(),
            description: None,
        }
    }
}

/// Request gateway: one router per published version
pub struct Gateway {
    config: GatewayConfig,
    routers: BTreeMap<u32, Router>,
    /// Router of versions without routes
    empty: Router,
    uri_pattern: Regex,
}

impl Gateway {
    pub fn builder() -> GatewayBuilder {
        GatewayBuilder::default()
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Published versions, ascending
    pub fn versions(&self) -> impl Iterator<Item = u32> + '_ {
        self.routers.keys().copied()
    }

    /// Router of `version`; an unknown version has no routes
    pub fn router(&self, version: u32) -> &Router {
        self.routers.get(&version).unwrap_or(&self.empty)
    }

    /// Dispatch a request under an explicit version
    pub fn dispatch(
        &self,
        version: u32,
        method: &str,
        path: &str,
        parameters: &Parameters,
    ) -> ApiResult<Value> {
        self.router(version).dispatch(method, path, parameters)
    }

    /// Handle a request whose URI may carry the prefix and version
    pub fn handle_request(&self, method: &str, uri: &str, parameters: &Parameters) -> GatewayResponse {
        let (version, path) = self.resolve(uri);
        debug!(method, uri, version, path, "Resolved request");
        self.router(version).handle(method, path, parameters)
    }

    /// Split a request URI into version and route path
    pub fn resolve<'a>(&self, uri: &'a str) -> (u32, &'a str) {
        let resolved = self.uri_pattern.captures(uri).and_then(|captures| {
            let version = captures.name("version")?.as_str().parse::<u32>().ok()?;
            Some((version, captures.name("uri")?.as_str()))
        });

        resolved.unwrap_or_else(|| {
            let path = uri.split_once('?').map_or(uri, |(path, _)| path);
            (self.config.default_version, path)
        })
    }

    /// OpenAPI document of `version`
    pub fn openapi(&self, version: u32) -> OpenApiSpec {
        let mut builder = OpenApiSpecBuilder::new(&self.config.title, &version.to_string())
            .server(&format!("{}/v{}", self.config.api_prefix, version), None)
            .routes(self.router(version).route_definitions());

        if let Some(description) = &self.config.description {
            builder = builder.description(description);
        }
        builder.build()
    }

    /// Documentation index of `version`: route documents keyed by path
    pub fn route_documents(&self, version: u32) -> Value {
        let documents: serde_json::Map<String, Value> = self
            .router(version)
            .route_definitions()
            .map(|definition| (definition.path().to_string(), definition.to_document()))
            .collect();
        Value::Object(documents)
    }
}

/// Gateway builder
#[derive(Default)]
pub struct GatewayBuilder {
    config: GatewayConfig,
    registry: RouteRegistry,
}

impl GatewayBuilder {
    /// Replace the whole configuration
    pub fn config(mut self, config: GatewayConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the URI prefix, e.g. `/api`
    pub fn api_prefix(mut self, api_prefix: &str) -> Self {
        self.config.api_prefix = api_prefix.to_string();
        self
    }

    pub fn default_version(mut self, version: u32) -> Self {
        self.config.default_version = version;
        self
    }

    /// Set documentation title
    pub fn title(mut self, title: &str) -> Self {
        self.config.title = title.to_string();
        self
    }

    /// Set documentation description
    pub fn description(mut self, description: &str) -> Self {
        self.config.description = Some(description.to_string());
        self
    }

    pub fn registry(mut self, registry: RouteRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Build the gateway
    ///
    /// Trailing slashes of the prefix are dropped, so `/api/` and `/api` match
    /// the same URIs.
    pub fn build(mut self) -> Result<Gateway, regex::Error> {
        self.config.api_prefix = self.config.api_prefix.trim_end_matches('/').to_string();
        let uri_pattern = Regex::new(&format!(
            r"^{}/v(?P<version>[0-9]+)(?P<uri>/[^?]*)",
            regex::escape(&self.config.api_prefix)
        ))?;

        let routers: BTreeMap<u32, Router> = self
            .registry
            .versions()
            .into_iter()
            .map(|version| (version, Router::new(&self.registry, version)))
            .collect();

        for router in routers.values() {
            info!(
                version = router.version(),
                routes = router.routes().len(),
                prefix = %self.config.api_prefix,
                "Built router"
            );
        }

        let empty = Router::new(&RouteRegistry::default(), 0);

        Ok(Gateway {
            config: self.config,
            routers,
            empty,
            uri_pattern,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::{Arguments, HandlerResult, Route, RouteBuilder, Signature};
    use gantry_core::BoxError;
    use http::StatusCode;
    use serde_json::json;

    struct Echo {
        word: String,
    }

    impl Echo {
        fn get(&self, args: &mut Arguments) -> HandlerResult<String> {
            let times: i64 = args.take("times")?;
            Ok(self.word.repeat(times as usize))
        }
    }

    impl Route for Echo {
        const PATH: &'static str = "/echo/{word}";

        fn declare(route: &mut RouteBuilder<Self>) {
            route
                .doc("Echo a word.\n\n* `word` - Word to repeat.")
                .path_parameter::<String>("word")
                .get(Signature::new().optional::<i64>("times", 1), Self::get);
        }

        fn from_path(path: &mut Arguments) -> Result<Self, BoxError> {
            Ok(Echo {
                word: path.take("word")?,
            })
        }
    }

    struct EchoV2;

    impl Route for EchoV2 {
        const PATH: &'static str = "/echo/{word}";
        const VERSION: u32 = 2;

        fn declare(route: &mut RouteBuilder<Self>) {
            route
                .path_parameter::<String>("word")
                .get(Signature::new(), |_: &EchoV2, _: &mut Arguments| Ok("v2".to_string()));
        }

        fn from_path(_path: &mut Arguments) -> Result<Self, BoxError> {
            Ok(EchoV2)
        }
    }

    fn gateway() -> Gateway {
        let registry = RouteRegistry::builder()
            .route::<Echo>()
            .route::<EchoV2>()
            .build()
            .unwrap();
        Gateway::builder().registry(registry).build().unwrap()
    }

    fn times(n: i64) -> Parameters {
        let mut parameters = Parameters::new();
        parameters.insert("times".to_string(), json!(n));
        parameters
    }

    #[test]
    fn test_config_defaults() {
        let config: GatewayConfig = serde_json::from_value(json!({"title": "Cars"})).unwrap();
        assert_eq!(config.api_prefix, "/api");
        assert_eq!(config.default_version, 1);
        assert_eq!(config.title, "Cars");
        assert_eq!(config.description, None);
    }

    #[test]
    fn test_configured_prefix_is_normalized() {
        let config: GatewayConfig =
            serde_json::from_value(json!({"api_prefix": "/rest//"})).unwrap();
        let registry = RouteRegistry::builder().route::<EchoV2>().build().unwrap();
        let gateway = Gateway::builder()
            .config(config)
            .registry(registry)
            .build()
            .unwrap();

        assert_eq!(gateway.config().api_prefix, "/rest");
        assert_eq!(gateway.resolve("/rest/v2/echo/hi"), (2, "/echo/hi"));
        let response = gateway.handle_request("get", "/rest/v2/echo/hi", &Parameters::new());
        assert_eq!(response.body, json!("v2"));
    }

    #[test]
    fn test_resolve() {
        let gateway = gateway();
        assert_eq!(gateway.resolve("/api/v2/echo/hi"), (2, "/echo/hi"));
        assert_eq!(gateway.resolve("/api/v1/echo/hi?times=2"), (1, "/echo/hi"));
        assert_eq!(gateway.resolve("/echo/hi?times=2"), (1, "/echo/hi"));
    }

    #[test]
    fn test_handle_request_versions() {
        let gateway = gateway();

        let response = gateway.handle_request("get", "/api/v1/echo/ab", &times(2));
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body, json!("abab"));

        let response = gateway.handle_request("get", "/api/v2/echo/ab", &Parameters::new());
        assert_eq!(response.body, json!("v2"));

        let response = gateway.handle_request("get", "/echo/ab", &Parameters::new());
        assert_eq!(response.body, json!("ab"));

        let response = gateway.handle_request("get", "/api/v9/echo/ab", &Parameters::new());
        assert_eq!(response.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_default_version_setting() {
        let registry = RouteRegistry::builder()
            .route::<Echo>()
            .route::<EchoV2>()
            .build()
            .unwrap();
        let gateway = Gateway::builder()
            .api_prefix("/rest/")
            .default_version(2)
            .registry(registry)
            .build()
            .unwrap();

        assert_eq!(gateway.config().api_prefix, "/rest");
        assert_eq!(gateway.dispatch(2, "get", "/echo/x", &Parameters::new()).unwrap(), json!("v2"));

        let response = gateway.handle_request("get", "/echo/x", &Parameters::new());
        assert_eq!(response.body, json!("v2"));
        let response = gateway.handle_request("get", "/rest/v1/echo/x", &Parameters::new());
        assert_eq!(response.body, json!("x"));
    }

    #[test]
    fn test_openapi_per_version() {
        let gateway = gateway();
        let spec = gateway.openapi(1);
        assert_eq!(spec.info.title, "API Documentation");
        assert_eq!(spec.servers[0].url, "/api/v1");
        assert!(spec.paths.contains_key("/echo/{word}"));

        assert!(gateway.openapi(7).paths.is_empty());
        assert_eq!(gateway.versions().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_route_documents() {
        let documents = gateway().route_documents(1);
        assert_eq!(
            documents["/echo/{word}"]["methods"]["get"]["parameters"]["word"]["description"],
            json!("Word to repeat.")
        );
    }
}
