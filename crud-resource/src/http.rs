//! Transport-neutral request and response types for endpoint handlers.
//!
//! No server is bound here. A web framework adapter converts its own request
//! into a [`HandlerRequest`], calls [`EndpointHandler::handle`] and writes the
//! [`HandlerResponse`] back.

use async_trait::async_trait;
use crud_acl::Actor;
use serde_json::Value;
use std::collections::HashMap;

use crate::config::HttpMethod;
use crate::error::ResourceError;

/// An inbound request, already authenticated.
#[derive(Debug, Clone)]
pub struct HandlerRequest {
    /// HTTP method
    pub method: HttpMethod,
    /// Request path
    pub path: String,
    /// Query string parameters
    pub query: HashMap<String, String>,
    /// Path parameters (e.g. `id`)
    pub params: HashMap<String, String>,
    /// JSON body (`null` when absent)
    pub body: Value,
    /// Request headers
    pub headers: HashMap<String, String>,
    /// Authenticated actor, if any
    pub actor: Option<Actor>,
}

impl HandlerRequest {
    /// Create an empty request.
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: HashMap::new(),
            params: HashMap::new(),
            body: Value::Null,
            headers: HashMap::new(),
            actor: None,
        }
    }

    /// Add a query string parameter.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Add a path parameter.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Set the body.
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    /// Add a header.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set the actor.
    pub fn with_actor(mut self, actor: Actor) -> Self {
        self.actor = Some(actor);
        self
    }
}

/// An outbound response.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerResponse {
    /// Extra response headers
    pub headers: HashMap<String, String>,
    /// HTTP status
    pub status_code: u16,
    /// JSON body
    pub body: Value,
}

impl HandlerResponse {
    /// Response with the given status and body.
    pub fn new(status_code: u16, body: Value) -> Self {
        Self {
            headers: HashMap::new(),
            status_code,
            body,
        }
    }

    /// `200 OK`.
    pub fn ok(body: Value) -> Self {
        Self::new(200, body)
    }

    /// `201 Created`.
    pub fn created(body: Value) -> Self {
        Self::new(201, body)
    }

    /// Translate an error into its status and body.
    pub fn from_error(error: &ResourceError) -> Self {
        Self::new(error.status_code(), error.body())
    }

    /// Add headers.
    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Check if the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

impl From<ResourceError> for HandlerResponse {
    fn from(error: ResourceError) -> Self {
        Self::from_error(&error)
    }
}

/// Handles requests routed to one endpoint.
///
/// Failures are part of the response; the handler itself never errors.
#[async_trait]
pub trait EndpointHandler: Send + Sync {
    /// Handle a request.
    async fn handle(&self, request: HandlerRequest) -> HandlerResponse;
}
