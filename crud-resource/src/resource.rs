//! The resource orchestrator.
//!
//! A [`Resource`] ties a [`ResourceSchema`] to a database model. Every
//! action runs the same pipeline, stopping at the first error:
//!
//! ```text
//! model capability -> resource gate -> schema.validate -> model call
//!                  -> after_* hook -> schema.view_as
//! ```

use crud_acl::{mayi, Action, Actor};
use crud_schema::{HookParams, HookRef, Record, RecordId, ResourceSchema, SchemaAction};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::config::{ConfigError, HttpMethod, ResourceConfig};
use crate::endpoints::{self, ResourceEndpoint};
use crate::error::{ResourceError, ResourceResult};
use crate::model::{ModelBinding, ModelRef};
use crate::query::{ListOutput, QueryAdaptor, QueryParam, StandardQueryAdaptor};

/// Post-persistence hooks of a resource.
#[derive(Clone, Default)]
pub struct PersistHooks {
    /// Runs after a record is created
    pub after_create: Option<HookRef>,
    /// Runs after a record is replaced
    pub after_replace: Option<HookRef>,
    /// Runs after a record is updated
    pub after_update: Option<HookRef>,
    /// Runs after a record is deleted
    pub after_delete: Option<HookRef>,
}

impl PersistHooks {
    /// Hook for `action`, if any.
    pub fn after(&self, action: Action) -> Option<&HookRef> {
        match action {
            Action::Create => self.after_create.as_ref(),
            Action::Replace => self.after_replace.as_ref(),
            Action::Update => self.after_update.as_ref(),
            Action::Delete => self.after_delete.as_ref(),
            Action::Get | Action::List => None,
        }
    }
}

impl fmt::Debug for PersistHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistHooks")
            .field("after_create", &self.after_create.is_some())
            .field("after_replace", &self.after_replace.is_some())
            .field("after_update", &self.after_update.is_some())
            .field("after_delete", &self.after_delete.is_some())
            .finish()
    }
}

/// A CRUD resource.
pub struct Resource {
    resource_name: String,
    permission_name: String,
    schema: ResourceSchema,
    model: Option<ModelBinding>,
    config: ResourceConfig,
    adaptor: Arc<dyn QueryAdaptor>,
    hooks: PersistHooks,
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("resource_name", &self.resource_name)
            .field("permission_name", &self.permission_name)
            .field("model", &self.model)
            .field("config", &self.config)
            .field("hooks", &self.hooks)
            .finish_non_exhaustive()
    }
}

impl Resource {
    /// Start building a resource around `schema`.
    pub fn builder(schema: ResourceSchema) -> ResourceBuilder {
        ResourceBuilder::new(schema)
    }

    /// Resource name.
    pub fn resource_name(&self) -> &str {
        &self.resource_name
    }

    /// Name used in permission tokens.
    pub fn permission_name(&self) -> &str {
        &self.permission_name
    }

    /// The schema.
    pub fn schema(&self) -> &ResourceSchema {
        &self.schema
    }

    /// Endpoint configuration.
    pub fn config(&self) -> &ResourceConfig {
        &self.config
    }

    /// Adaptor used by the list endpoint.
    pub fn query_adaptor(&self) -> &dyn QueryAdaptor {
        self.adaptor.as_ref()
    }

    /// Parse list query string parameters with the configured adaptor.
    pub fn parse_query(&self, query: &HashMap<String, String>) -> ResourceResult<QueryParam> {
        self.adaptor.parse(&self.resource_name, query)
    }

    fn model_for(&self, action: Action) -> ResourceResult<ModelRef> {
        let model = self
            .model
            .as_ref()
            .and_then(|binding| binding.resolve(&self.resource_name, action))
            .ok_or_else(|| ResourceError::no_database(&self.resource_name))?;

        if !model.capabilities().contains(action) {
            debug!(resource = %self.resource_name, %action, "Model capability missing");
            return Err(ResourceError::model_not_defined(&self.resource_name, action));
        }
        Ok(model)
    }

    fn gate(&self, actor: Option<&Actor>, action: Action) -> ResourceResult<()> {
        let token = action.permission_token(&self.permission_name);
        if mayi(actor, &token) {
            Ok(())
        } else {
            debug!(resource = %self.resource_name, %token, "Resource gate denied");
            Err(ResourceError::Permission { token })
        }
    }

    async fn run_after(
        &self,
        action: Action,
        data: Record,
        actor: Option<&Actor>,
        raw: Record,
        id: Option<RecordId>,
    ) -> ResourceResult<()> {
        if let Some(hook) = self.hooks.after(action) {
            let params = HookParams::new(&self.resource_name, SchemaAction::from(action))
                .with_actor(actor)
                .with_raw(raw)
                .with_id(id);
            hook.call(data, params).await?;
        }
        Ok(())
    }

    async fn project(&self, record: &Record, actor: Option<&Actor>) -> ResourceResult<Record> {
        Ok(self.schema.view_record(record, actor).await?)
    }

    /// Fetch and project one record. `None` when the model has no such row.
    #[instrument(skip_all, fields(resource = %self.resource_name, id = %id))]
    pub async fn get(&self, actor: Option<&Actor>, id: &RecordId) -> ResourceResult<Option<Record>> {
        let model = self.model_for(Action::Get)?;
        self.gate(actor, Action::Get)?;

        let record = model.get(id).await?;
        Ok(self.schema.view_as(record.as_ref(), actor).await?)
    }

    /// Query and project a page of records.
    #[instrument(skip_all, fields(resource = %self.resource_name))]
    pub async fn list(&self, actor: Option<&Actor>, query: &QueryParam) -> ResourceResult<ListOutput> {
        let model = self.model_for(Action::List)?;
        self.gate(actor, Action::List)?;

        let result = model.list(query).await?;
        let mut data = Vec::with_capacity(result.rows.len());
        for row in &result.rows {
            data.push(self.project(row, actor).await?);
        }

        Ok(ListOutput {
            total: result.total,
            data,
        })
    }

    /// Validate, store and project a new record.
    #[instrument(skip_all, fields(resource = %self.resource_name))]
    pub async fn create(&self, actor: Option<&Actor>, payload: &Value) -> ResourceResult<Record> {
        let model = self.model_for(Action::Create)?;
        self.gate(actor, Action::Create)?;

        let data = self
            .schema
            .validate(SchemaAction::Create, payload, actor, None)
            .await?;
        let stored = model.create(data.clone()).await?;

        self.run_after(Action::Create, stored.clone(), actor, data, RecordId::of(&stored))
            .await?;
        self.project(&stored, actor).await
    }

    /// Validate, patch and project a record.
    #[instrument(skip_all, fields(resource = %self.resource_name, id = %id))]
    pub async fn update(
        &self,
        actor: Option<&Actor>,
        id: &RecordId,
        payload: &Value,
    ) -> ResourceResult<Record> {
        self.write(Action::Update, actor, id, payload).await
    }

    /// Validate, overwrite and project a record.
    #[instrument(skip_all, fields(resource = %self.resource_name, id = %id))]
    pub async fn replace(
        &self,
        actor: Option<&Actor>,
        id: &RecordId,
        payload: &Value,
    ) -> ResourceResult<Record> {
        self.write(Action::Replace, actor, id, payload).await
    }

    async fn write(
        &self,
        action: Action,
        actor: Option<&Actor>,
        id: &RecordId,
        payload: &Value,
    ) -> ResourceResult<Record> {
        let model = self.model_for(action)?;
        self.gate(actor, action)?;

        let data = self
            .schema
            .validate(SchemaAction::from(action), payload, actor, Some(id))
            .await?;
        let stored = match action {
            Action::Replace => model.replace(id, data.clone()).await?,
            _ => model.update(id, data.clone()).await?,
        };

        self.run_after(action, stored.clone(), actor, data, RecordId::of(&stored))
            .await?;
        self.project(&stored, actor).await
    }

    /// Delete a record, returning the model's count of removed rows.
    #[instrument(skip_all, fields(resource = %self.resource_name, id = %id))]
    pub async fn delete(&self, actor: Option<&Actor>, id: &RecordId) -> ResourceResult<u64> {
        let model = self.model_for(Action::Delete)?;
        self.gate(actor, Action::Delete)?;

        self.schema
            .validate(SchemaAction::Delete, &json!({}), actor, Some(id))
            .await?;
        let deleted = model.delete(id).await?;

        let mut raw = Record::new();
        raw.insert("id".into(), id.to_value());
        self.run_after(Action::Delete, raw.clone(), actor, raw, Some(id.clone()))
            .await?;
        Ok(deleted)
    }

    /// Compile endpoint descriptors for every enabled action.
    pub fn endpoints(self: &Arc<Self>) -> Vec<ResourceEndpoint> {
        endpoints::compile(self)
    }
}

/// Builder for [`Resource`].
pub struct ResourceBuilder {
    schema: ResourceSchema,
    model: Option<ModelBinding>,
    config: ResourceConfig,
    adaptor: Arc<dyn QueryAdaptor>,
    hooks: PersistHooks,
    error: Option<ConfigError>,
}

impl ResourceBuilder {
    fn new(schema: ResourceSchema) -> Self {
        Self {
            schema,
            model: None,
            config: ResourceConfig::default(),
            adaptor: Arc::new(StandardQueryAdaptor),
            hooks: PersistHooks::default(),
            error: None,
        }
    }

    /// Bind the database model.
    pub fn model(mut self, binding: impl Into<ModelBinding>) -> Self {
        self.model = Some(binding.into());
        self
    }

    /// Use endpoint configuration.
    pub fn config(mut self, config: ResourceConfig) -> Self {
        self.config = config;
        self
    }

    /// Override the permission name of the resource and its schema.
    pub fn permission_name(mut self, name: impl Into<String>) -> Self {
        self.config.permission_name = Some(name.into());
        self
    }

    /// Use another list query adaptor.
    pub fn query_adaptor(mut self, adaptor: impl QueryAdaptor + 'static) -> Self {
        self.adaptor = Arc::new(adaptor);
        self
    }

    /// Map `action` to `method`.
    pub fn method(mut self, action: Action, method: HttpMethod) -> Self {
        self.config.actions.set(action, Some(method));
        self
    }

    /// Disable the endpoint for `action`.
    pub fn disable(mut self, action: Action) -> Self {
        self.config.actions.set(action, None);
        self
    }

    /// Set the `after_create` hook.
    pub fn after_create(mut self, hook: HookRef) -> Self {
        self.set_hook("after_create", |h| &mut h.after_create, hook);
        self
    }

    /// Set the `after_replace` hook.
    pub fn after_replace(mut self, hook: HookRef) -> Self {
        self.set_hook("after_replace", |h| &mut h.after_replace, hook);
        self
    }

    /// Set the `after_update` hook.
    pub fn after_update(mut self, hook: HookRef) -> Self {
        self.set_hook("after_update", |h| &mut h.after_update, hook);
        self
    }

    /// Set the `after_delete` hook.
    pub fn after_delete(mut self, hook: HookRef) -> Self {
        self.set_hook("after_delete", |h| &mut h.after_delete, hook);
        self
    }

    fn set_hook(
        &mut self,
        name: &'static str,
        slot: fn(&mut PersistHooks) -> &mut Option<HookRef>,
        hook: HookRef,
    ) {
        let slot = slot(&mut self.hooks);
        if slot.is_some() {
            self.error.get_or_insert(ConfigError::HookAlreadySet(name));
        } else {
            *slot = Some(hook);
        }
    }

    /// Validate the configuration and build the resource.
    pub fn build(self) -> Result<Resource, ConfigError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        self.config.validate()?;

        let schema = match &self.config.permission_name {
            Some(name) => self.schema.with_permission_name(name.clone()),
            None => self.schema,
        };

        Ok(Resource {
            resource_name: schema.resource_name().to_string(),
            permission_name: schema.permission_name().to_string(),
            schema,
            model: self.model,
            config: self.config,
            adaptor: self.adaptor,
            hooks: self.hooks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryModel;
    use crud_acl::ActionSet;
    use crud_schema::{hook_fn, FieldDescriptor};

    fn schema() -> ResourceSchema {
        ResourceSchema::builder("post")
            .field(FieldDescriptor::integer("id").read_only())
            .field(FieldDescriptor::string("title").required())
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_missing_binding_is_not_found() {
        let resource = Resource::builder(schema()).build().unwrap();
        let actor = Actor::unrestricted();
        let err = resource
            .get(Some(&actor), &RecordId::Int(1))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.to_string(), "No database defined for resource post");
    }

    #[tokio::test]
    async fn test_capability_checked_before_gate() {
        let model = MemoryModel::new().with_capabilities(ActionSet::read_only());
        let resource = Resource::builder(schema())
            .model(ModelBinding::fixed(model))
            .build()
            .unwrap();

        let err = resource.delete(None, &RecordId::Int(1)).await.unwrap_err();
        assert_eq!(err.to_string(), "Model not defined post.delete");
    }

    #[tokio::test]
    async fn test_permission_name_override_applies_to_schema() {
        let resource = Resource::builder(schema())
            .model(ModelBinding::fixed(MemoryModel::new()))
            .permission_name("article")
            .build()
            .unwrap();
        assert_eq!(resource.permission_name(), "article");
        assert_eq!(resource.schema().permission_name(), "article");

        let actor = Actor::with_permissions(["create.article", "view.article"]);
        let created = resource
            .create(Some(&actor), &json!({"title": "t"}))
            .await
            .unwrap();
        assert_eq!(created["id"], 1);
    }

    #[test]
    fn test_hook_set_twice() {
        let err = Resource::builder(schema())
            .after_delete(hook_fn(|d, _| Ok(d)))
            .after_delete(hook_fn(|d, _| Ok(d)))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::HookAlreadySet("after_delete")));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = Resource::builder(schema())
            .method(Action::Update, HttpMethod::Put)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::RouteCollision { .. }));
    }
}
