//! Route registry
//!
//! Routes are registered explicitly, in order. When two templates match the
//! same path the route registered first wins.

use crate::definition::RouteDefinition;
use crate::error::{DefinitionResult, RouteDefinitionError};
use crate::route::{CompiledRoute, Endpoint, Route};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::info;

/// Ordered set of compiled routes, across every API version
#[derive(Clone, Default)]
pub struct RouteRegistry {
    endpoints: Vec<Arc<dyn Endpoint>>,
}

impl RouteRegistry {
    pub fn builder() -> RouteRegistryBuilder {
        RouteRegistryBuilder::default()
    }

    /// Every registered route, in registration order
    pub fn endpoints(&self) -> &[Arc<dyn Endpoint>] {
        &self.endpoints
    }

    /// Routes published under `version`, in registration order
    pub fn routes_for(&self, version: u32) -> impl Iterator<Item = &Arc<dyn Endpoint>> {
        self.endpoints
            .iter()
            .filter(move |endpoint| endpoint.definition().version() == version)
    }

    /// Versions with at least one route, ascending
    pub fn versions(&self) -> BTreeSet<u32> {
        self.endpoints
            .iter()
            .map(|endpoint| endpoint.definition().version())
            .collect()
    }

    pub fn definitions(&self) -> impl Iterator<Item = &RouteDefinition> {
        self.endpoints.iter().map(|endpoint| endpoint.definition())
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

/// Registry builder; the first definition error aborts the build
#[derive(Default)]
pub struct RouteRegistryBuilder {
    endpoints: Vec<Arc<dyn Endpoint>>,
    error: Option<RouteDefinitionError>,
}

impl RouteRegistryBuilder {
    /// Register route `R`
    pub fn route<R: Route>(mut self) -> Self {
        if self.error.is_some() {
            return self;
        }

        match CompiledRoute::<R>::shared() {
            Ok(route) => self.endpoints.push(route),
            Err(err) => self.error = Some(err),
        }
        self
    }

    /// Build the registry
    pub fn build(self) -> DefinitionResult<RouteRegistry> {
        if let Some(err) = self.error {
            return Err(err);
        }

        for endpoint in &self.endpoints {
            let definition = endpoint.definition();
            info!(
                path = definition.path(),
                version = definition.version(),
                methods = ?definition.methods().map(|m| m.method().as_str()).collect::<Vec<_>>(),
                "Registered route"
            );
        }

        Ok(RouteRegistry {
            endpoints: self.endpoints,
        })
    }
}
