//! # CRUD Schema
//!
//! Field-level resource schemas for the CRUD resource crates.
//!
//! ## Overview
//!
//! A [`ResourceSchema`] owns an ordered list of [`FieldDescriptor`]s. Each
//! field carries one policy per action:
//!
//! ```text
//! create / replace / update:  Always | Never | RequiresPermission(token)
//! view:                       Always | Never | RequiresPermission(token) | Transform(fn)
//! ```
//!
//! From these the schema derives one [`ActionSchema`] per shaped action,
//! validates inbound data with [`ResourceSchema::validate`] and projects
//! stored records with [`ResourceSchema::view_as`].
//!
//! ## Validation pipeline
//!
//! 1. Structural check against the derived action schema (400)
//! 2. Resource gate `<action>.<permission name>` (403)
//! 3. Per supplied key: field policy and field token (403)
//! 4. Virtual fields are dropped from the output
//! 5. The action's `before_*` hook, if any, has the final word
//!
//! ## Usage
//!
//! ```rust
//! use crud_schema::{FieldDescriptor, ResourceSchema, SchemaAction};
//!
//! let schema = ResourceSchema::builder("post")
//!     .field(FieldDescriptor::integer("id").read_only())
//!     .field(FieldDescriptor::string("title").required())
//!     .field(FieldDescriptor::text("draft").view("view.post.draft"))
//!     .build()
//!     .unwrap();
//!
//! let create = schema.json_schema(SchemaAction::Create).unwrap();
//! assert_eq!(create["required"][0], "title");
//! assert!(create["properties"].get("id").is_none());
//! ```

pub mod action;
pub mod error;
pub mod field;
pub mod hook;
pub mod policy;
pub mod record;
pub mod schema;
pub mod validator;

// Re-export main types for convenience
pub use action::SchemaAction;
pub use error::{ConfigError, FieldError, SchemaError, SchemaResult};
pub use field::{FieldDescriptor, FieldType, StringFormat, DEFAULT_STRING_MAX_LENGTH};
pub use hook::{async_hook, hook_fn, HookParams, HookRef, SchemaHook, SchemaHooks};
pub use policy::{Access, FieldPolicy, ViewPolicy, ViewTransform};
pub use record::{Record, RecordId};
pub use schema::{ResourceSchema, SchemaBuilder};
pub use validator::ActionSchema;
