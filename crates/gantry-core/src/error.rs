//! Error taxonomy and error bodies.

use http::StatusCode;
use serde_json::{json, Value};
use std::error::Error as StdError;
use thiserror::Error;

/// Boxed error used for chained causes and handler failures.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Request-level failure surfaced to the transport as a status and an error body.
///
/// Every variant can chain a cause. The body lists the message of the error and
/// of each cause, outermost first: `{"errors": ["...", "..."]}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found.")]
    NotFound {
        #[source]
        cause: Option<BoxError>,
    },

    #[error("Method not allowed.")]
    MethodNotAllowed {
        #[source]
        cause: Option<BoxError>,
    },

    #[error("Parameter \"{name}\" is required for this request.")]
    MissingParameter { name: String },

    #[error("Parameter \"{name}\" value is not a valid {expected}.")]
    InvalidParameterType {
        name: String,
        expected: String,
        #[source]
        cause: Option<BoxError>,
    },

    #[error("Parameter \"{name}\" value is invalid.")]
    InvalidParameter {
        name: String,
        #[source]
        cause: Option<BoxError>,
    },

    #[error("An internal server error occurred.")]
    Internal {
        #[source]
        cause: Option<BoxError>,
    },
}

/// Result type for request handling
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn not_found() -> Self {
        ApiError::NotFound { cause: None }
    }

    pub fn method_not_allowed() -> Self {
        ApiError::MethodNotAllowed { cause: None }
    }

    pub fn missing_parameter(name: impl Into<String>) -> Self {
        ApiError::MissingParameter { name: name.into() }
    }

    /// A present value that failed to cast to the declared type.
    pub fn invalid_type(
        name: impl Into<String>,
        expected: impl Into<String>,
        cause: impl Into<BoxError>,
    ) -> Self {
        ApiError::InvalidParameterType {
            name: name.into(),
            expected: expected.into(),
            cause: Some(cause.into()),
        }
    }

    pub fn invalid_parameter(name: impl Into<String>) -> Self {
        ApiError::InvalidParameter {
            name: name.into(),
            cause: None,
        }
    }

    pub fn internal(cause: impl Into<BoxError>) -> Self {
        ApiError::Internal {
            cause: Some(cause.into()),
        }
    }

    /// Attach a cause, replacing any previous one.
    ///
    /// `MissingParameter` carries no cause and is returned unchanged.
    pub fn with_cause(mut self, error: impl Into<BoxError>) -> Self {
        match &mut self {
            ApiError::NotFound { cause }
            | ApiError::MethodNotAllowed { cause }
            | ApiError::InvalidParameterType { cause, .. }
            | ApiError::InvalidParameter { cause, .. }
            | ApiError::Internal { cause } => *cause = Some(error.into()),
            ApiError::MissingParameter { .. } => {}
        }
        self
    }

    /// Recover an `ApiError` from a handler failure, or wrap it as an internal error.
    pub fn from_handler(error: BoxError) -> Self {
        match error.downcast::<ApiError>() {
            Ok(api_error) => *api_error,
            Err(other) => ApiError::Internal { cause: Some(other) },
        }
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::MissingParameter { .. }
            | ApiError::InvalidParameterType { .. }
            | ApiError::InvalidParameter { .. } => StatusCode::BAD_REQUEST,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// Messages of this error and its whole cause chain, outermost first.
    pub fn cause_chain(&self) -> Vec<String> {
        let mut messages = vec![self.to_string()];
        let mut current = self.source();
        while let Some(cause) = current {
            messages.push(cause.to_string());
            current = cause.source();
        }
        messages
    }

    /// Messages exposed to the caller.
    ///
    /// Internal errors only expose their generic message; the chain stays
    /// available through [`ApiError::cause_chain`] for logging.
    pub fn messages(&self) -> Vec<String> {
        match self {
            ApiError::Internal { .. } => vec![self.to_string()],
            _ => self.cause_chain(),
        }
    }

    /// Error body: `{"errors": [message, ...causes]}`
    pub fn to_body(&self) -> Value {
        json!({ "errors": self.messages() })
    }
}
