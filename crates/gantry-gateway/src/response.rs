//! Transport-neutral gateway response

use gantry_core::{ApiError, Value};
use http::StatusCode;

/// Status and JSON body handed back to the transport
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl GatewayResponse {
    /// 200 response carrying a serialized handler result
    pub fn ok(body: Value) -> Self {
        Self {
            status: StatusCode::OK,
            body,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Body as JSON text
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.body)
    }
}

impl From<ApiError> for GatewayResponse {
    fn from(err: ApiError) -> Self {
        Self {
            status: err.status_code(),
            body: err.to_body(),
        }
    }
}

impl From<&ApiError> for GatewayResponse {
    fn from(err: &ApiError) -> Self {
        Self {
            status: err.status_code(),
            body: err.to_body(),
        }
    }
}
