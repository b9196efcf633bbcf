//! Lifecycle hooks.
//!
//! Hooks receive the sanitized record plus [`HookParams`] and return the
//! record that continues down the pipeline. They may suspend, and they may
//! reject the operation by returning an error.
//!
//! ```
//! use crud_schema::{hook_fn, SchemaError};
//!
//! let hook = hook_fn(|mut data, params| {
//!     if params.raw.get("password") != params.raw.get("confirm") {
//!         return Err(SchemaError::rejected("Passwords do not match"));
//!     }
//!     data.insert("created_by".into(), params.actor_id());
//!     Ok(data)
//! });
//! # let _ = hook;
//! ```

use async_trait::async_trait;
use crud_acl::Actor;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::action::SchemaAction;
use crate::error::SchemaResult;
use crate::record::{Record, RecordId};

/// Context passed to every hook.
#[derive(Debug, Clone)]
pub struct HookParams {
    /// Resource the call belongs to
    pub resource_name: String,
    /// Action being performed
    pub action: SchemaAction,
    /// Acting identity
    pub actor: Option<Actor>,
    /// Unsanitized input (or the stored record, for `after_view`)
    pub raw: Record,
    /// Target id, when the action has one
    pub id: Option<RecordId>,
}

impl HookParams {
    /// Create params with an empty `raw` map.
    pub fn new(resource_name: impl Into<String>, action: SchemaAction) -> Self {
        Self {
            resource_name: resource_name.into(),
            action,
            actor: None,
            raw: Record::new(),
            id: None,
        }
    }

    /// Set the actor.
    pub fn with_actor(mut self, actor: Option<&Actor>) -> Self {
        self.actor = actor.cloned();
        self
    }

    /// Set the raw input.
    pub fn with_raw(mut self, raw: Record) -> Self {
        self.raw = raw;
        self
    }

    /// Set the target id.
    pub fn with_id(mut self, id: Option<RecordId>) -> Self {
        self.id = id;
        self
    }

    /// Id of the acting identity as JSON, `null` when unknown.
    pub fn actor_id(&self) -> Value {
        self.actor
            .as_ref()
            .and_then(|a| a.id.clone())
            .map(Value::String)
            .unwrap_or(Value::Null)
    }
}

/// A lifecycle hook.
#[async_trait]
pub trait SchemaHook: Send + Sync {
    /// Transform `data`, or reject the operation.
    async fn call(&self, data: Record, params: HookParams) -> SchemaResult<Record>;
}

/// Shared hook handle.
pub type HookRef = Arc<dyn SchemaHook>;

struct FnHook<F>(F);

#[async_trait]
impl<F> SchemaHook for FnHook<F>
where
    F: Fn(Record, &HookParams) -> SchemaResult<Record> + Send + Sync,
{
    async fn call(&self, data: Record, params: HookParams) -> SchemaResult<Record> {
        (self.0)(data, &params)
    }
}

struct AsyncFnHook<F>(F);

#[async_trait]
impl<F, Fut> SchemaHook for AsyncFnHook<F>
where
    F: Fn(Record, HookParams) -> Fut + Send + Sync,
    Fut: Future<Output = SchemaResult<Record>> + Send + 'static,
{
    async fn call(&self, data: Record, params: HookParams) -> SchemaResult<Record> {
        (self.0)(data, params).await
    }
}

/// Wrap a synchronous closure as a hook.
pub fn hook_fn<F>(f: F) -> HookRef
where
    F: Fn(Record, &HookParams) -> SchemaResult<Record> + Send + Sync + 'static,
{
    Arc::new(FnHook(f))
}

/// Wrap an async closure as a hook.
pub fn async_hook<F, Fut>(f: F) -> HookRef
where
    F: Fn(Record, HookParams) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = SchemaResult<Record>> + Send + 'static,
{
    Arc::new(AsyncFnHook(f))
}

/// Pre-persistence and view hooks of a schema.
#[derive(Clone, Default)]
pub struct SchemaHooks {
    /// Runs after create input is sanitized
    pub before_create: Option<HookRef>,
    /// Runs after replace input is sanitized
    pub before_replace: Option<HookRef>,
    /// Runs after update input is sanitized
    pub before_update: Option<HookRef>,
    /// Runs before a record is deleted
    pub before_delete: Option<HookRef>,
    /// Runs on every projection
    pub after_view: Option<HookRef>,
}

impl SchemaHooks {
    /// Pre-persistence hook for `action`, if any.
    pub fn before(&self, action: SchemaAction) -> Option<&HookRef> {
        match action {
            SchemaAction::Create => self.before_create.as_ref(),
            SchemaAction::Replace => self.before_replace.as_ref(),
            SchemaAction::Update => self.before_update.as_ref(),
            SchemaAction::Delete => self.before_delete.as_ref(),
            SchemaAction::View => None,
        }
    }
}

impl fmt::Debug for SchemaHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaHooks")
            .field("before_create", &self.before_create.is_some())
            .field("before_replace", &self.before_replace.is_some())
            .field("before_update", &self.before_update.is_some())
            .field("before_delete", &self.before_delete.is_some())
            .field("after_view", &self.after_view.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SchemaError;
    use serde_json::json;

    #[tokio::test]
    async fn test_sync_hook_sees_params() {
        let hook = hook_fn(|mut data, params| {
            data.insert("by".into(), params.actor_id());
            data.insert("action".into(), json!(params.action.as_str()));
            Ok(data)
        });

        let actor = Actor::anonymous().with_id("u1");
        let params = HookParams::new("post", SchemaAction::Create).with_actor(Some(&actor));
        let out = hook.call(Record::new(), params).await.unwrap();

        assert_eq!(out["by"], "u1");
        assert_eq!(out["action"], "create");
    }

    #[tokio::test]
    async fn test_async_hook_can_reject() {
        let hook = async_hook(|_data, params| async move {
            tokio::task::yield_now().await;
            Err(SchemaError::Rejected {
                status: 409,
                message: format!("{} exists", params.resource_name),
            })
        });

        let err = hook
            .call(Record::new(), HookParams::new("user", SchemaAction::Create))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.to_string(), "user exists");
    }

    #[test]
    fn test_hooks_lookup_and_debug() {
        let hooks = SchemaHooks {
            before_update: Some(hook_fn(|d, _| Ok(d))),
            ..Default::default()
        };
        assert!(hooks.before(SchemaAction::Update).is_some());
        assert!(hooks.before(SchemaAction::Create).is_none());
        assert!(hooks.before(SchemaAction::View).is_none());
        assert!(format!("{:?}", hooks).contains("before_update: true"));
    }
}
