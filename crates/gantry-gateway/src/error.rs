//! Route definition errors
//!
//! These are raised while a registry is built and abort its construction.
//! Request-time failures use [`gantry_core::ApiError`].

use thiserror::Error;

/// Malformed route declaration
#[derive(Debug, Error)]
pub enum RouteDefinitionError {
    #[error("Bad path definition in {path}: parameter \"{name}\" is not defined in the route.")]
    UnknownPlaceholder { path: String, name: String },

    #[error("Bad path definition in {path}: parameter \"{name}\" is used more than once.")]
    DuplicatePlaceholder { path: String, name: String },

    #[error("Bad path definition in {path}: \"{name}\" is not a valid parameter name.")]
    InvalidPlaceholder { path: String, name: String },

    #[error("Bad path definition in {path}: unbalanced braces.")]
    UnbalancedBraces { path: String },

    #[error("Path definition of {path} is not complete: missing \"{name}\" parameter.")]
    MissingPlaceholder { path: String, name: String },

    #[error("Bad route definition in {path}: parameter \"{name}\" is defined both in the path and in the {method} method.")]
    PathParameterCollision {
        path: String,
        name: String,
        method: String,
    },

    #[error("Bad route definition in {path}: parameter \"{name}\" is declared twice.")]
    DuplicateParameter { path: String, name: String },

    #[error("Bad route definition in {path}: method {method} is declared twice.")]
    DuplicateMethod { path: String, method: String },

    #[error("Bad route definition in {path}: default value of \"{name}\" is not a valid {expected}.")]
    InvalidDefault {
        path: String,
        name: String,
        expected: String,
    },

    #[error("Bad path definition in {path}: {source}")]
    Pattern {
        path: String,
        #[source]
        source: regex::Error,
    },
}

/// Result type for route registration
pub type DefinitionResult<T> = Result<T, RouteDefinitionError>;
