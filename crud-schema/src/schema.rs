//! Resource schemas: validation of inbound data and projection of views.

use crud_acl::{mayi, Actor};
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

use crate::action::SchemaAction;
use crate::error::{ConfigError, FieldError, SchemaError, SchemaResult};
use crate::field::FieldDescriptor;
use crate::hook::{HookParams, HookRef, SchemaHooks};
use crate::policy::{Access, ViewPolicy};
use crate::record::{Record, RecordId};
use crate::validator::ActionSchema;

/// The schema of one resource.
///
/// Built once through [`ResourceSchema::builder`] and immutable afterwards.
///
/// # Example
///
/// ```
/// use crud_acl::Actor;
/// use crud_schema::{FieldDescriptor, ResourceSchema, SchemaAction};
/// use serde_json::json;
///
/// # tokio_test_block(async {
/// let schema = ResourceSchema::builder("post")
///     .field(FieldDescriptor::string("title").required())
///     .field(FieldDescriptor::text("notes").view("view.post.notes"))
///     .build()
///     .unwrap();
///
/// let actor = Actor::with_permissions(["create.post", "view.post"]);
/// let record = schema
///     .validate(SchemaAction::Create, &json!({"title": "Hi", "notes": "n"}), Some(&actor), None)
///     .await
///     .unwrap();
///
/// let view = schema.view_record(&record, Some(&actor)).await.unwrap();
/// assert_eq!(serde_json::Value::Object(view), json!({"title": "Hi"}));
/// # });
/// # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    resource_name: String,
    permission_name: String,
    fields: Vec<FieldDescriptor>,
    index: HashMap<String, usize>,
    create: ActionSchema,
    replace: ActionSchema,
    update: ActionSchema,
    view: ActionSchema,
    hooks: SchemaHooks,
    scope_field: Option<String>,
}

impl ResourceSchema {
    /// Start building a schema for `resource_name`.
    pub fn builder(resource_name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::new(resource_name)
    }

    /// Resource name.
    pub fn resource_name(&self) -> &str {
        &self.resource_name
    }

    /// Name used in permission tokens.
    pub fn permission_name(&self) -> &str {
        &self.permission_name
    }

    /// Return a copy using another permission name.
    pub fn with_permission_name(mut self, permission_name: impl Into<String>) -> Self {
        self.permission_name = permission_name.into();
        self
    }

    /// Declared fields, in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Look up a declared field.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    /// Registered hooks.
    pub fn hooks(&self) -> &SchemaHooks {
        &self.hooks
    }

    /// Field stamped from the actor's scope, if configured.
    pub fn scope_field(&self) -> Option<&str> {
        self.scope_field.as_deref()
    }

    /// Derived schema for a shaped action; `None` for delete.
    pub fn action_schema(&self, action: SchemaAction) -> Option<&ActionSchema> {
        match action {
            SchemaAction::Create => Some(&self.create),
            SchemaAction::Replace => Some(&self.replace),
            SchemaAction::Update => Some(&self.update),
            SchemaAction::View => Some(&self.view),
            SchemaAction::Delete => None,
        }
    }

    /// JSON-Schema document for a shaped action.
    pub fn json_schema(&self, action: SchemaAction) -> Option<Value> {
        self.action_schema(action).map(ActionSchema::json_schema)
    }

    /// Validate and sanitize inbound data for `action`.
    ///
    /// Returns the record to persist. For [`SchemaAction::Delete`] only the
    /// `before_delete` hook runs and an empty record is returned.
    pub async fn validate(
        &self,
        action: SchemaAction,
        raw: &Value,
        actor: Option<&Actor>,
        id: Option<&RecordId>,
    ) -> SchemaResult<Record> {
        let params = HookParams::new(&self.resource_name, action)
            .with_actor(actor)
            .with_id(id.cloned());

        let Some(schema) = self.action_schema(action) else {
            if let Some(hook) = &self.hooks.before_delete {
                hook.call(Record::new(), params).await?;
            }
            return Ok(Record::new());
        };

        schema
            .validate(raw)
            .map_err(|errors| SchemaError::Validation { errors })?;
        let input = raw.as_object().cloned().unwrap_or_default();

        let token = action.permission_token(&self.permission_name);
        if !mayi(actor, &token) {
            debug!(resource = %self.resource_name, %token, "Schema gate denied");
            return Err(SchemaError::Permission { token });
        }

        let mut output = Record::new();
        for (key, value) in &input {
            let field = self
                .field(key)
                .ok_or_else(|| SchemaError::UnknownField(key.clone()))?;

            let scoped = self.scope_field.as_deref() == Some(key.as_str());
            if scoped && action.enforces_required() {
                return Err(SchemaError::FieldForbidden {
                    field: key.clone(),
                    action,
                });
            }

            match field.access(action) {
                Access::Closed => {
                    return Err(SchemaError::FieldForbidden {
                        field: key.clone(),
                        action,
                    })
                }
                Access::Token(token) if !mayi(actor, token) => {
                    debug!(field = %key, %token, "Field permission denied");
                    return Err(SchemaError::FieldPermission {
                        field: key.clone(),
                        action,
                    });
                }
                _ => {}
            }

            if !field.is_virtual {
                output.insert(key.clone(), value.clone());
            }
        }

        if action.enforces_required() {
            self.stamp_scope(&mut output, actor);
        }

        match self.hooks.before(action) {
            Some(hook) => hook.call(output, params.with_raw(input)).await,
            None => Ok(output),
        }
    }

    fn stamp_scope(&self, output: &mut Record, actor: Option<&Actor>) {
        let Some(field) = &self.scope_field else {
            return;
        };
        if let Some(scope) = actor.and_then(|a| a.scope.clone()) {
            output.insert(field.clone(), scope);
        }
    }

    /// Project an optional stored record for `actor`.
    ///
    /// `None` passes through untouched.
    pub async fn view_as(
        &self,
        record: Option<&Record>,
        actor: Option<&Actor>,
    ) -> SchemaResult<Option<Record>> {
        match record {
            Some(record) => self.view_record(record, actor).await.map(Some),
            None => Ok(None),
        }
    }

    /// Project a stored record for `actor`.
    pub async fn view_record(&self, record: &Record, actor: Option<&Actor>) -> SchemaResult<Record> {
        let token = SchemaAction::View.permission_token(&self.permission_name);
        let Some(actor) = actor.filter(|a| a.may(token.as_str())) else {
            debug!(resource = %self.resource_name, %token, "View gate denied");
            return Err(SchemaError::Permission { token });
        };

        let mut projection = Record::new();
        for field in &self.fields {
            let stored = record.get(&field.name);
            // Transforms also compute virtual fields.
            let value = match &field.view {
                ViewPolicy::Transform(f) => Some(f(stored.unwrap_or(&Value::Null), actor, record)),
                _ if field.is_virtual => None,
                ViewPolicy::Never => None,
                ViewPolicy::RequiresPermission(t) if !actor.may(t.as_str()) => None,
                _ => stored.cloned(),
            };
            if let Some(value) = value {
                projection.insert(field.name.clone(), value);
            }
        }

        match &self.hooks.after_view {
            Some(hook) => {
                let params = HookParams::new(&self.resource_name, SchemaAction::View)
                    .with_actor(Some(actor))
                    .with_raw(record.clone())
                    .with_id(RecordId::of(record));
                hook.call(projection, params).await
            }
            None => Ok(projection),
        }
    }

    /// Structural check only, without gates or hooks.
    pub fn check(&self, action: SchemaAction, raw: &Value) -> Result<(), Vec<FieldError>> {
        match self.action_schema(action) {
            Some(schema) => schema.validate(raw),
            None => Ok(()),
        }
    }
}

/// Builder for [`ResourceSchema`].
///
/// Every hook may be set once; a second assignment surfaces as
/// [`ConfigError::HookAlreadySet`] from [`SchemaBuilder::build`].
pub struct SchemaBuilder {
    resource_name: String,
    permission_name: Option<String>,
    fields: Vec<FieldDescriptor>,
    hooks: SchemaHooks,
    scope_field: Option<String>,
    error: Option<ConfigError>,
}

impl SchemaBuilder {
    fn new(resource_name: impl Into<String>) -> Self {
        Self {
            resource_name: resource_name.into(),
            permission_name: None,
            fields: Vec::new(),
            hooks: SchemaHooks::default(),
            scope_field: None,
            error: None,
        }
    }

    /// Use a permission name other than the resource name.
    pub fn permission_name(mut self, name: impl Into<String>) -> Self {
        self.permission_name = Some(name.into());
        self
    }

    /// Declare a field.
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Declare several fields.
    pub fn fields(mut self, fields: impl IntoIterator<Item = FieldDescriptor>) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Stamp the actor's scope into this field on create and replace.
    pub fn scope_field(mut self, name: impl Into<String>) -> Self {
        self.scope_field = Some(name.into());
        self
    }

    /// Set the `before_create` hook.
    pub fn before_create(mut self, hook: HookRef) -> Self {
        self.set_hook("before_create", |h| &mut h.before_create, hook);
        self
    }

    /// Set the `before_replace` hook.
    pub fn before_replace(mut self, hook: HookRef) -> Self {
        self.set_hook("before_replace", |h| &mut h.before_replace, hook);
        self
    }

    /// Set the `before_update` hook.
    pub fn before_update(mut self, hook: HookRef) -> Self {
        self.set_hook("before_update", |h| &mut h.before_update, hook);
        self
    }

    /// Set the `before_delete` hook.
    pub fn before_delete(mut self, hook: HookRef) -> Self {
        self.set_hook("before_delete", |h| &mut h.before_delete, hook);
        self
    }

    /// Set the `after_view` hook.
    pub fn after_view(mut self, hook: HookRef) -> Self {
        self.set_hook("after_view", |h| &mut h.after_view, hook);
        self
    }

    fn set_hook(
        &mut self,
        name: &'static str,
        slot: fn(&mut SchemaHooks) -> &mut Option<HookRef>,
        hook: HookRef,
    ) {
        let slot = slot(&mut self.hooks);
        if slot.is_some() {
            self.error.get_or_insert(ConfigError::HookAlreadySet(name));
        } else {
            *slot = Some(hook);
        }
    }

    /// Compile the schema.
    pub fn build(self) -> Result<ResourceSchema, ConfigError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        if self.resource_name.is_empty() {
            return Err(ConfigError::EmptyResourceName);
        }

        let mut index = HashMap::with_capacity(self.fields.len());
        for (i, field) in self.fields.iter().enumerate() {
            if index.insert(field.name.clone(), i).is_some() {
                return Err(ConfigError::DuplicateField(field.name.clone()));
            }
        }

        if let Some(scope) = &self.scope_field {
            if !index.contains_key(scope) {
                return Err(ConfigError::UnknownScopeField(scope.clone()));
            }
        }

        let permission_name = self
            .permission_name
            .unwrap_or_else(|| self.resource_name.clone());

        Ok(ResourceSchema {
            create: ActionSchema::derive(SchemaAction::Create, &self.fields)?,
            replace: ActionSchema::derive(SchemaAction::Replace, &self.fields)?,
            update: ActionSchema::derive(SchemaAction::Update, &self.fields)?,
            view: ActionSchema::derive(SchemaAction::View, &self.fields)?,
            resource_name: self.resource_name,
            permission_name,
            fields: self.fields,
            index,
            hooks: self.hooks,
            scope_field: self.scope_field,
        })
    }
}
