//! The Messenger service object.
//!
//! Owns the configuration, the handler registry and the Graph API client.
//! Handlers are registered first; [`Messenger::router`] then freezes the
//! registry behind an `Arc` for the lifetime of the server.

use std::sync::Arc;

use axum::Router;

use crate::error::GraphError;
use crate::events::HandlerRegistry;
use crate::graph::GraphClient;
use crate::web::{self, AppState};
use crate::Config;

#[derive(Debug)]
pub struct Messenger {
    config: Arc<Config>,
    handlers: Arc<HandlerRegistry>,
    graph: GraphClient,
}

impl Messenger {
    /// Create a service with no handlers registered.
    pub fn new(config: Config) -> Result<Self, GraphError> {
        let graph = GraphClient::new(&config)?;
        Ok(Self {
            config: Arc::new(config),
            handlers: Arc::new(HandlerRegistry::new()),
            graph,
        })
    }

    /// Replace the handler registry.
    pub fn with_handlers(mut self, handlers: HandlerRegistry) -> Self {
        self.handlers = Arc::new(handlers);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    /// Outbound Graph API client sharing this service's configuration.
    pub fn graph(&self) -> &GraphClient {
        &self.graph
    }

    /// Build the HTTP router serving the webhook endpoint.
    pub fn router(&self) -> Router {
        web::router(AppState {
            config: self.config.clone(),
            handlers: self.handlers.clone(),
        })
    }
}
