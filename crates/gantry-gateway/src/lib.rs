//! Declarative routing and dispatch for the Gantry API gateway.
//!
//! Routes are plain Rust types bound to path templates. This crate provides:
//! - Route declaration with typed path and method parameters
//! - Path templates compiled into typed matchers
//! - Request dispatch: matching, binding, invoking and serializing
//! - Versioned request handling under an API prefix
//! - Route documentation and OpenAPI 3.0 specification generation
//!
//! A request fails with the status and `{"errors": [...]}` body of its
//! [`gantry_core::ApiError`].

mod bind;
pub mod definition;
pub mod docs;
pub mod error;
pub mod gateway;
pub mod method;
pub mod openapi;
pub mod param;
pub mod pattern;
pub mod registry;
pub mod response;
pub mod route;
pub mod router;

pub use definition::{MethodDeclaration, MethodDefinition, RouteDefinition};
pub use error::{DefinitionResult, RouteDefinitionError};
pub use gateway::{Gateway, GatewayBuilder, GatewayConfig};
pub use method::{HttpMethod, UnsupportedMethod};
pub use openapi::{OpenApiSpec, OpenApiSpecBuilder};
pub use param::ParameterSpec;
pub use pattern::CompiledPattern;
pub use registry::{RouteRegistry, RouteRegistryBuilder};
pub use response::GatewayResponse;
pub use route::{
    route_definition, Arguments, CompiledRoute, Endpoint, HandlerResult, Route, RouteBuilder,
    Signature, UnboundArgument,
};
pub use router::Router;
