//! # CRUD Resource
//!
//! Resource orchestration on top of [`crud_schema`].
//!
//! ## Overview
//!
//! The crud-resource crate handles:
//! - **Resources**: Gated get/list/create/update/replace/delete over a schema
//! - **Database models**: The async storage seam, plus an in-memory model
//! - **List queries**: Filter/range/sort parameters and their adaptors
//! - **Endpoints**: Route descriptors with JSON schemas and handlers
//! - **Configuration**: Base path, verb mapping and tags
//!
//! ## Usage
//!
//! ```rust
//! use crud_acl::Actor;
//! use crud_resource::{MemoryModel, ModelBinding, Resource};
//! use crud_schema::{FieldDescriptor, ResourceSchema};
//! use serde_json::json;
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let schema = ResourceSchema::builder("post")
//!     .field(FieldDescriptor::integer("id").read_only())
//!     .field(FieldDescriptor::string("title").required())
//!     .build()
//!     .unwrap();
//!
//! let posts = Resource::builder(schema)
//!     .model(ModelBinding::fixed(MemoryModel::new()))
//!     .build()
//!     .unwrap();
//!
//! let editor = Actor::with_permissions(["create.post", "view.post"]);
//! let created = posts.create(Some(&editor), &json!({"title": "Hello"})).await.unwrap();
//! assert_eq!(serde_json::Value::Object(created), json!({"id": 1, "title": "Hello"}));
//! # });
//! ```

pub mod config;
pub mod endpoints;
pub mod error;
pub mod http;
pub mod memory;
pub mod model;
pub mod query;
pub mod resource;

// Re-export main types for convenience
pub use config::{ActionTable, ConfigError, HttpMethod, ResourceConfig};
pub use endpoints::ResourceEndpoint;
pub use error::{ModelError, ModelResult, ResourceError, ResourceResult};
pub use http::{EndpointHandler, HandlerRequest, HandlerResponse};
pub use memory::MemoryModel;
pub use model::{DatabaseModel, ListResult, ModelBinding, ModelRef, ModelResolver};
pub use query::{
    FilterOperator, ListOutput, ListResponse, QueryAdaptor, QueryFilter, QueryParam, QueryRange,
    QuerySort, ReactAdminQueryAdaptor, RefineQueryAdaptor, SortDirection, StandardQueryAdaptor,
};
pub use resource::{PersistHooks, Resource, ResourceBuilder};
