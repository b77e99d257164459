//! Request dispatch for one API version.
//!
//! A request goes through matching, binding, invoking and serializing. Any
//! failure ends it with an error response.

use crate::definition::RouteDefinition;
use crate::method::HttpMethod;
use crate::registry::RouteRegistry;
use crate::response::GatewayResponse;
use crate::route::Endpoint;
use gantry_core::{ApiError, ApiResult, Parameters, Value};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Dispatcher over the routes of one API version
#[derive(Clone)]
pub struct Router {
    version: u32,
    endpoints: Vec<Arc<dyn Endpoint>>,
}

impl Router {
    /// Router over the routes `registry` publishes under `version`
    pub fn new(registry: &RouteRegistry, version: u32) -> Self {
        Self {
            version,
            endpoints: registry.routes_for(version).cloned().collect(),
        }
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Routes, in match order
    pub fn routes(&self) -> &[Arc<dyn Endpoint>] {
        &self.endpoints
    }

    pub fn route_definitions(&self) -> impl Iterator<Item = &RouteDefinition> {
        self.endpoints.iter().map(|endpoint| endpoint.definition())
    }

    /// Dispatch a request and return the serialized handler result.
    ///
    /// `path` is relative to the API prefix and version. `method` is matched
    /// case-insensitively; a method the matched route does not implement is
    /// rejected with 405, a path no route matches with 404.
    pub fn dispatch(&self, method: &str, path: &str, parameters: &Parameters) -> ApiResult<Value> {
        let (endpoint, captures) = self
            .endpoints
            .iter()
            .find_map(|endpoint| {
                endpoint
                    .pattern()
                    .match_path(path)
                    .map(|captures| (endpoint, captures))
            })
            .ok_or_else(ApiError::not_found)?;

        debug!(
            version = self.version,
            method,
            path,
            route = endpoint.definition().path(),
            "Matched route"
        );

        let method = method
            .parse::<HttpMethod>()
            .map_err(|err| ApiError::method_not_allowed().with_cause(err))?;

        endpoint.dispatch(method, captures, parameters)
    }

    /// Dispatch a request and render the outcome as a response.
    pub fn handle(&self, method: &str, path: &str, parameters: &Parameters) -> GatewayResponse {
        match self.dispatch(method, path, parameters) {
            Ok(body) => GatewayResponse::ok(body),
            Err(err) => {
                if err.is_client_error() {
                    warn!(method, path, status = err.status_code().as_u16(), "{}", err);
                } else {
                    error!(
                        method,
                        path,
                        causes = ?err.cause_chain(),
                        "Request failed"
                    );
                }
                GatewayResponse::from(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::{Arguments, HandlerResult, Route, RouteBuilder, Signature};
    use gantry_core::BoxError;
    use http::StatusCode;
    use serde_json::json;
    use std::fmt;

    #[derive(Debug)]
    struct Disconnected;

    impl fmt::Display for Disconnected {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "database disconnected")
        }
    }

    impl std::error::Error for Disconnected {}

    struct Item {
        id: i64,
    }

    impl Item {
        fn get(&self, _args: &mut Arguments) -> HandlerResult<Value> {
            Ok(json!({"id": self.id}))
        }

        fn patch(&self, _args: &mut Arguments) -> HandlerResult<Value> {
            Err(Box::new(Disconnected))
        }
    }

    impl Route for Item {
        const PATH: &'static str = "/item/{id}";

        fn declare(route: &mut RouteBuilder<Self>) {
            route
                .path_parameter::<i64>("id")
                .get(Signature::new(), Self::get)
                .patch(Signature::new(), Self::patch);
        }

        fn from_path(path: &mut Arguments) -> Result<Self, BoxError> {
            let id: i64 = path.take("id")?;
            if id == 0 {
                return Err(ApiError::not_found().into());
            }
            Ok(Item { id })
        }
    }

    /// Overlaps `/item/{id}` and is registered after it
    struct ItemByName {
        name: String,
    }

    impl Route for ItemByName {
        const PATH: &'static str = "/item/{name}";

        fn declare(route: &mut RouteBuilder<Self>) {
            route
                .path_parameter::<String>("name")
                .get(Signature::new(), |item: &ItemByName, _: &mut Arguments| {
                    Ok(item.name.clone())
                });
        }

        fn from_path(path: &mut Arguments) -> Result<Self, BoxError> {
            Ok(ItemByName {
                name: path.take("name")?,
            })
        }
    }

    fn router() -> Router {
        let _ = tracing_subscriber::fmt::try_init();

        let registry = RouteRegistry::builder()
            .route::<Item>()
            .route::<ItemByName>()
            .build()
            .unwrap();
        Router::new(&registry, 1)
    }

    #[test]
    fn test_first_registered_match_wins() {
        let router = router();
        assert_eq!(
            router.dispatch("GET", "/item/7", &Parameters::new()).unwrap(),
            json!({"id": 7})
        );
        assert_eq!(
            router.dispatch("get", "/item/seven", &Parameters::new()).unwrap(),
            json!("seven")
        );
    }

    #[test]
    fn test_not_found() {
        let response = router().handle("get", "/nothing", &Parameters::new());
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(response.body, json!({"errors": ["Not found."]}));
    }

    #[test]
    fn test_route_construction_can_reject() {
        let response = router().handle("get", "/item/0", &Parameters::new());
        assert_eq!(response.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_method_not_allowed() {
        let router = router();

        let response = router.handle("put", "/item/3", &Parameters::new());
        assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);

        let response = router.handle("DELETE", "/item/3", &Parameters::new());
        assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            response.body,
            json!({"errors": ["Method not allowed.", "Unsupported HTTP method: DELETE"]})
        );
    }

    #[test]
    fn test_handler_failure_is_internal() {
        let response = router().handle("patch", "/item/3", &Parameters::new());
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.body,
            json!({"errors": ["An internal server error occurred."]})
        );
    }

    #[test]
    fn test_versions_are_separate() {
        let registry = RouteRegistry::builder().route::<Item>().build().unwrap();
        let router = Router::new(&registry, 2);

        assert!(router.routes().is_empty());
        let err = router.dispatch("get", "/item/3", &Parameters::new()).unwrap_err();
        assert!(matches!(err, ApiError::NotFound { .. }));
    }

    #[test]
    fn test_route_definitions() {
        let router = router();
        let paths: Vec<&str> = router.route_definitions().map(|d| d.path()).collect();
        assert_eq!(paths, vec!["/item/{id}", "/item/{name}"]);
    }
}
