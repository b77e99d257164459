//! HTTP transport over axum
//!
//! Every request not served by a documentation endpoint is handed to the
//! gateway. The parameter bag is the query string merged with the JSON body
//! object; body values win over query values.

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{Method, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use gantry_core::{ApiError, Parameters, Value};
use gantry_gateway::{Gateway, GatewayResponse};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Build the axum router serving `gateway`
pub fn app(gateway: Arc<Gateway>) -> Router {
    Router::new()
        .route("/openapi.json", get(openapi))
        .route("/docs.json", get(docs))
        .fallback(dispatch)
        .with_state(gateway)
}

async fn dispatch(
    State(gateway): State<Arc<Gateway>>,
    method: Method,
    uri: Uri,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> JsonReply {
    let parameters = match parameters(query, &body) {
        Ok(parameters) => parameters,
        Err(err) => return JsonReply(GatewayResponse::from(err)),
    };

    debug!(%method, %uri, parameters = parameters.len(), "Dispatching request");
    JsonReply(gateway.handle_request(method.as_str(), uri.path(), &parameters))
}

/// Merge the query string and the JSON body into one parameter bag
fn parameters(query: HashMap<String, String>, body: &[u8]) -> Result<Parameters, ApiError> {
    let mut parameters: Parameters = query
        .into_iter()
        .map(|(name, value)| (name, Value::String(value)))
        .collect();

    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(parameters);
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(fields)) => {
            parameters.extend(fields);
            Ok(parameters)
        }
        Ok(_) => Err(ApiError::invalid_parameter("body")),
        Err(err) => Err(ApiError::invalid_parameter("body").with_cause(err)),
    }
}

/// Version selector of the documentation endpoints
fn requested_version(gateway: &Gateway, query: &HashMap<String, String>) -> u32 {
    query
        .get("version")
        .and_then(|version| version.parse().ok())
        .unwrap_or(gateway.config().default_version)
}

async fn openapi(
    State(gateway): State<Arc<Gateway>>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let version = requested_version(&gateway, &query);
    Json(gateway.openapi(version)).into_response()
}

async fn docs(
    State(gateway): State<Arc<Gateway>>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let version = requested_version(&gateway, &query);
    Json(gateway.route_documents(version)).into_response()
}

/// Gateway response wrapper for axum
pub struct JsonReply(pub GatewayResponse);

impl IntoResponse for JsonReply {
    fn into_response(self) -> Response {
        (self.0.status, Json(self.0.body)).into_response()
    }
}
