//! # CRUD ACL
//!
//! Permission oracle and actor identity shared by the CRUD resource crates.
//!
//! ## Overview
//!
//! The crud-acl crate handles:
//! - **Actors**: Pre-authenticated identities carrying permission tokens
//! - **Permission Sets**: Exact-match token sets
//! - **Oracle**: The `mayi` membership decision
//! - **Actions**: The operations a resource exposes
//!
//! ## Permission Tokens
//!
//! ```text
//! Token = <verb>.<permission name>[.<anything>]
//!
//! Examples:
//!   "create.post"          - Create posts
//!   "view.post"            - Get or list posts
//!   "view.post.draft"      - See the `draft` field of posts
//! ```
//!
//! Tokens are compared by exact string equality. `view.post` does not imply
//! `view.post.draft` and vice versa.
//!
//! ## Usage
//!
//! ```rust
//! use crud_acl::{mayi, Action, Actor};
//!
//! let actor = Actor::with_permissions(["view.post", "create.post"]);
//!
//! assert!(mayi(Some(&actor), &Action::List.permission_token("post")));
//! assert!(!mayi(Some(&actor), "delete.post"));
//! ```

pub mod actions;
pub mod actor;
pub mod oracle;
pub mod permissions;

// Re-export main types for convenience
pub use actions::{permission_token, Action, ActionSet};
pub use actor::Actor;
pub use oracle::mayi;
pub use permissions::{PermissionQuery, PermissionSet};
