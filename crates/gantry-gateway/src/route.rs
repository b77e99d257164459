//! Route declarations.
//!
//! A route is a Rust type bound to a path template. Its path parameters are
//! used to build an instance of the type for every request, and each HTTP
//! method it implements is a handler taking that instance plus the bound
//! method arguments:
//!
//! ```
//! use gantry_gateway::{Arguments, HandlerResult, Route, RouteBuilder, Signature};
//! use gantry_core::BoxError;
//!
//! struct Greeting {
//!     name: String,
//! }
//!
//! impl Greeting {
//!     fn get(&self, args: &mut Arguments) -> HandlerResult<String> {
//!         let punctuation: String = args.take("punctuation")?;
//!         Ok(format!("Hello {}{}", self.name, punctuation))
//!     }
//! }
//!
//! impl Route for Greeting {
//!     const PATH: &'static str = "/hello/{name}";
//!
//!     fn declare(route: &mut RouteBuilder<Self>) {
//!         route
//!             .path_parameter::<String>("name")
//!             .get(Signature::new().optional::<String>("punctuation", "!"), Self::get);
//!     }
//!
//!     fn from_path(path: &mut Arguments) -> Result<Self, BoxError> {
//!         Ok(Greeting { name: path.take("name")? })
//!     }
//! }
//! ```

use crate::bind;
use crate::definition::{MethodDeclaration, RouteDefinition};
use crate::error::DefinitionResult;
use crate::method::HttpMethod;
use crate::param::ParameterSpec;
use crate::pattern::CompiledPattern;
use gantry_core::{
    ApiError, ApiResult, BoxError, Field, Parameters, ToWire, TypeCache, TypedValue, Value,
};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Result of a route handler
pub type HandlerResult<T> = Result<T, BoxError>;

type Handler<R> =
    Box<dyn Fn(&R, &mut Arguments) -> HandlerResult<Box<dyn ToWire>> + Send + Sync + 'static>;

/// A routable resource.
pub trait Route: Sized + Send + Sync + 'static {
    /// Path template, relative to the API prefix, e.g. `/car/{id}`
    const PATH: &'static str;

    /// API version the route is published under
    const VERSION: u32 = 1;

    /// Declare path parameters and method handlers.
    fn declare(route: &mut RouteBuilder<Self>);

    /// Build the resource from its bound path parameters.
    ///
    /// An [`ApiError`] returned here (e.g. [`ApiError::not_found`]) reaches the
    /// caller unchanged; any other error becomes an internal error.
    fn from_path(path: &mut Arguments) -> Result<Self, BoxError>;
}

/// Argument looked up by a handler but never declared
#[derive(Debug, Error)]
#[error("Argument \"{0}\" is not bound for this request.")]
pub struct UnboundArgument(pub String);

/// Bound arguments of a request, in declaration order.
#[derive(Debug, Default)]
pub struct Arguments {
    values: Vec<(String, TypedValue)>,
}

impl Arguments {
    pub(crate) fn push(&mut self, name: impl Into<String>, value: TypedValue) {
        self.values.push((name.into(), value));
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(name, _)| name.as_str())
    }

    /// Remove the argument `name` and convert it to `F`.
    ///
    /// A value that does not fit `F` is an invalid parameter type; a name that
    /// was never bound is an internal error.
    pub fn take<F: Field>(&mut self, name: &str) -> ApiResult<F> {
        let index = self
            .values
            .iter()
            .position(|(bound, _)| bound == name)
            .ok_or_else(|| ApiError::internal(UnboundArgument(name.to_string())))?;

        let (_, value) = self.values.remove(index);
        F::from_typed(value).map_err(|cause| ApiError::invalid_type(name, F::type_name(), cause))
    }
}

/// Parameters and documentation of one method handler
#[derive(Debug, Clone, Default)]
pub struct Signature {
    doc: String,
    parameters: Vec<ParameterSpec>,
}

impl Signature {
    pub fn new() -> Self {
        Self::default()
    }

    /// Doc text: a summary, then one ``* `name` - description`` line per parameter
    pub fn doc(mut self, doc: &str) -> Self {
        self.doc = doc.to_string();
        self
    }

    /// Required parameter typed after `F`
    pub fn required<F: Field>(mut self, name: &str) -> Self {
        self.parameters.push(ParameterSpec::required::<F>(name));
        self
    }

    /// Optional parameter typed after `F`; `Value::Null` is a valid default when `F` accepts null
    pub fn optional<F: Field>(mut self, name: &str, default: impl Into<Value>) -> Self {
        self.parameters
            .push(ParameterSpec::optional::<F>(name, default));
        self
    }

    /// Parameter passed through without casting
    pub fn untyped(mut self, name: &str, default: Option<Value>) -> Self {
        self.parameters.push(ParameterSpec::untyped(name, default));
        self
    }

    pub fn parameters(&self) -> &[ParameterSpec] {
        &self.parameters
    }
}

/// Collects the declaration of route `R`
pub struct RouteBuilder<R> {
    doc: String,
    path_parameters: Vec<ParameterSpec>,
    methods: Vec<(MethodDeclaration, Handler<R>)>,
}

impl<R: Route> RouteBuilder<R> {
    fn new() -> Self {
        Self {
            doc: String::new(),
            path_parameters: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Route doc text; path parameters are described here
    pub fn doc(&mut self, doc: &str) -> &mut Self {
        self.doc = doc.to_string();
        self
    }

    /// Path parameter typed after `F`, bound from the `{name}` placeholder
    pub fn path_parameter<F: Field>(&mut self, name: &str) -> &mut Self {
        self.path_parameters.push(ParameterSpec::path::<F>(name));
        self
    }

    /// Implement `method` with `handler`
    pub fn method<T, H>(&mut self, method: HttpMethod, signature: Signature, handler: H) -> &mut Self
    where
        T: ToWire + 'static,
        H: Fn(&R, &mut Arguments) -> HandlerResult<T> + Send + Sync + 'static,
    {
        let declaration = MethodDeclaration {
            method,
            doc: signature.doc,
            parameters: signature.parameters,
        };
        let handler: Handler<R> = Box::new(move |route, args| {
            handler(route, args).map(|result| Box::new(result) as Box<dyn ToWire>)
        });

        self.methods.push((declaration, handler));
        self
    }

    pub fn get<T, H>(&mut self, signature: Signature, handler: H) -> &mut Self
    where
        T: ToWire + 'static,
        H: Fn(&R, &mut Arguments) -> HandlerResult<T> + Send + Sync + 'static,
    {
        self.method(HttpMethod::Get, signature, handler)
    }

    pub fn post<T, H>(&mut self, signature: Signature, handler: H) -> &mut Self
    where
        T: ToWire + 'static,
        H: Fn(&R, &mut Arguments) -> HandlerResult<T> + Send + Sync + 'static,
    {
        self.method(HttpMethod::Post, signature, handler)
    }

    pub fn put<T, H>(&mut self, signature: Signature, handler: H) -> &mut Self
    where
        T: ToWire + 'static,
        H: Fn(&R, &mut Arguments) -> HandlerResult<T> + Send + Sync + 'static,
    {
        self.method(HttpMethod::Put, signature, handler)
    }

    pub fn patch<T, H>(&mut self, signature: Signature, handler: H) -> &mut Self
    where
        T: ToWire + 'static,
        H: Fn(&R, &mut Arguments) -> HandlerResult<T> + Send + Sync + 'static,
    {
        self.method(HttpMethod::Patch, signature, handler)
    }
}

/// Validated definition, path matcher and handlers of route `R`
pub struct CompiledRoute<R> {
    definition: RouteDefinition,
    pattern: CompiledPattern,
    handlers: HashMap<HttpMethod, Handler<R>>,
    _route: PhantomData<fn() -> R>,
}

impl<R: Route> CompiledRoute<R> {
    /// Compile the declaration of `R`.
    pub fn compile() -> DefinitionResult<Self> {
        let mut builder = RouteBuilder::<R>::new();
        R::declare(&mut builder);

        let (declarations, handlers): (Vec<_>, Vec<_>) = builder.methods.into_iter().unzip();
        let methods: Vec<HttpMethod> = declarations.iter().map(|d| d.method).collect();

        let definition = RouteDefinition::build(
            R::PATH,
            R::VERSION,
            &builder.doc,
            builder.path_parameters,
            declarations,
        )?;
        let pattern = CompiledPattern::compile(R::PATH, definition.path_parameters())?;

        debug!(
            path = R::PATH,
            version = R::VERSION,
            regex = pattern.as_regex().as_str(),
            "Compiled route"
        );

        Ok(Self {
            definition,
            pattern,
            handlers: methods.into_iter().zip(handlers).collect(),
            _route: PhantomData,
        })
    }

    /// Compiled route of `R`, computed once per process.
    pub fn shared() -> DefinitionResult<Arc<Self>> {
        TypeCache::global().get_or_try_insert_with(Self::compile)
    }
}

/// Definition of route `R`, from the shared compiled route
pub fn route_definition<R: Route>() -> DefinitionResult<RouteDefinition> {
    CompiledRoute::<R>::shared().map(|route| route.definition.clone())
}

/// A compiled route with its resource type erased
pub trait Endpoint: Send + Sync {
    fn definition(&self) -> &RouteDefinition;

    fn pattern(&self) -> &CompiledPattern;

    /// Bind, invoke and serialize a request whose path matched this route.
    fn dispatch(
        &self,
        method: HttpMethod,
        captures: HashMap<String, String>,
        parameters: &Parameters,
    ) -> ApiResult<Value>;
}

impl<R: Route> Endpoint for CompiledRoute<R> {
    fn definition(&self) -> &RouteDefinition {
        &self.definition
    }

    fn pattern(&self) -> &CompiledPattern {
        &self.pattern
    }

    fn dispatch(
        &self,
        method: HttpMethod,
        captures: HashMap<String, String>,
        parameters: &Parameters,
    ) -> ApiResult<Value> {
        let mut path = bind::path_arguments(self.definition.path_parameters(), captures)?;
        let route = R::from_path(&mut path).map_err(ApiError::from_handler)?;

        let (handler, signature) = match (self.handlers.get(&method), self.definition.method(method)) {
            (Some(handler), Some(signature)) => (handler, signature),
            _ => return Err(ApiError::method_not_allowed()),
        };

        let mut args = bind::method_arguments(signature, parameters)?;
        debug!(
            path = R::PATH,
            %method,
            arguments = ?args.names().collect::<Vec<_>>(),
            "Invoking handler"
        );

        let result = handler(&route, &mut args).map_err(ApiError::from_handler)?;
        result.to_wire().map_err(ApiError::internal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Counter {
        start: i64,
    }

    impl Counter {
        fn count(&self, args: &mut Arguments) -> HandlerResult<Vec<i64>> {
            let step: i64 = args.take("step")?;
            let limit: Option<i64> = args.take("limit")?;
            Ok((0..limit.unwrap_or(3)).map(|i| self.start + i * step).collect())
        }
    }

    impl Route for Counter {
        const PATH: &'static str = "/count/{start}";
        const VERSION: u32 = 2;

        fn declare(route: &mut RouteBuilder<Self>) {
            route
                .doc("Counting.\n\n* `start` - First value.")
                .path_parameter::<i64>("start")
                .get(
                    Signature::new()
                        .doc("Count up.\n\n* `step` - Increment.")
                        .required::<i64>("step")
                        .optional::<Option<i64>>("limit", Value::Null),
                    Self::count,
                );
        }

        fn from_path(path: &mut Arguments) -> Result<Self, BoxError> {
            Ok(Counter {
                start: path.take("start")?,
            })
        }
    }

    fn captures(start: &str) -> HashMap<String, String> {
        HashMap::from([("start".to_string(), start.to_string())])
    }

    fn params(value: Value) -> Parameters {
        match value {
            Value::Object(map) => map,
            _ => Parameters::new(),
        }
    }

    #[test]
    fn test_compile_builds_definition() {
        let route = CompiledRoute::<Counter>::compile().unwrap();
        let definition = route.definition();

        assert_eq!(definition.path(), "/count/{start}");
        assert_eq!(definition.version(), 2);
        assert_eq!(definition.description(), "Counting.");
        assert_eq!(definition.path_parameters()[0].description(), "First value.");

        let get = definition.method(HttpMethod::Get).unwrap();
        assert_eq!(get.description(), "Count up.");
        assert_eq!(get.parameters().len(), 3);
        assert!(route.pattern().is_match("/count/5"));
    }

    #[test]
    fn test_shared_route_is_cached() {
        let first = CompiledRoute::<Counter>::shared().unwrap();
        let second = CompiledRoute::<Counter>::shared().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(route_definition::<Counter>().unwrap().path(), "/count/{start}");
    }

    #[test]
    fn test_dispatch() {
        let route = CompiledRoute::<Counter>::compile().unwrap();

        let value = route
            .dispatch(HttpMethod::Get, captures("10"), &params(json!({"step": "5"})))
            .unwrap();
        assert_eq!(value, json!([10, 15, 20]));

        let value = route
            .dispatch(
                HttpMethod::Get,
                captures("0"),
                &params(json!({"step": 1, "limit": 2})),
            )
            .unwrap();
        assert_eq!(value, json!([0, 1]));
    }

    #[test]
    fn test_dispatch_errors() {
        let route = CompiledRoute::<Counter>::compile().unwrap();

        let err = route
            .dispatch(HttpMethod::Put, captures("1"), &Parameters::new())
            .unwrap_err();
        assert!(matches!(err, ApiError::MethodNotAllowed { .. }));

        let err = route
            .dispatch(HttpMethod::Get, captures("1"), &Parameters::new())
            .unwrap_err();
        assert_eq!(err.to_string(), "Parameter \"step\" is required for this request.");

        let err = route
            .dispatch(HttpMethod::Get, captures("1"), &params(json!({"step": "x"})))
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidParameterType { .. }));
    }

    #[test]
    fn test_take_unbound_argument_is_internal() {
        let mut args = Arguments::default();
        let err = args.take::<i64>("missing").unwrap_err();
        assert!(matches!(err, ApiError::Internal { .. }));
    }

    #[test]
    fn test_take_converts_value() {
        let mut args = Arguments::default();
        args.push("count", TypedValue::Integer(300));

        let err = args.take::<u8>("count").unwrap_err();
        assert_eq!(err.to_string(), "Parameter \"count\" value is not a valid integer.");
        assert!(args.is_empty());
    }
}
