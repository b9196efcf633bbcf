//! Derived action schemas and their validators.
//!
//! An [`ActionSchema`] is compiled once per shaped action when a
//! [`ResourceSchema`](crate::ResourceSchema) is built. It holds the fields
//! whose policy for the action is not `Never`, in declaration order, and a
//! draft 2020-12 validator compiled from the derived JSON-Schema document,
//! with `format` assertions switched on.

use jsonschema::{ValidationError, Validator};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::action::SchemaAction;
use crate::error::{ConfigError, FieldError};
use crate::field::FieldDescriptor;

/// Compiled shape of one action.
#[derive(Clone)]
pub struct ActionSchema {
    action: SchemaAction,
    properties: Vec<FieldDescriptor>,
    required: Vec<String>,
    index: HashMap<String, usize>,
    validator: Arc<Validator>,
}

impl fmt::Debug for ActionSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionSchema")
            .field("action", &self.action)
            .field("fields", &self.field_names().collect::<Vec<_>>())
            .field("required", &self.required)
            .finish()
    }
}

impl ActionSchema {
    /// Derive the schema for `action` from the declared fields and compile
    /// its validator.
    pub fn derive(action: SchemaAction, fields: &[FieldDescriptor]) -> Result<Self, ConfigError> {
        let properties: Vec<FieldDescriptor> = fields
            .iter()
            .filter(|f| f.included_in(action))
            .cloned()
            .collect();

        let required = if action.enforces_required() {
            properties
                .iter()
                .filter(|f| f.required)
                .map(|f| f.name.clone())
                .collect()
        } else {
            Vec::new()
        };

        let index = properties
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name.clone(), i))
            .collect();

        let document = schema_document(action, &properties, &required);
        let validator = jsonschema::draft202012::options()
            .should_validate_formats(true)
            .build(&document)
            .map_err(|e| ConfigError::InvalidSchema {
                action: action.as_str(),
                message: e.to_string(),
            })?;

        Ok(Self {
            action,
            properties,
            required,
            index,
            validator: Arc::new(validator),
        })
    }

    /// The action this schema was derived for.
    pub fn action(&self) -> SchemaAction {
        self.action
    }

    /// Included field names, in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.properties.iter().map(|f| f.name.as_str())
    }

    /// Required field names.
    pub fn required(&self) -> &[String] {
        &self.required
    }

    /// Check whether a field is part of this schema.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// JSON-Schema document for this action.
    ///
    /// Object type with `additionalProperties: false`; `required` is only
    /// emitted for create and replace.
    pub fn json_schema(&self) -> Value {
        schema_document(self.action, &self.properties, &self.required)
    }

    /// Validate raw input against this schema.
    ///
    /// All mismatches are collected; an empty error list never occurs on
    /// `Err`.
    pub fn validate(&self, input: &Value) -> Result<(), Vec<FieldError>> {
        let errors: Vec<FieldError> = self.validator.iter_errors(input).map(field_error).collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn schema_document(action: SchemaAction, properties: &[FieldDescriptor], required: &[String]) -> Value {
    let mut props = Map::new();
    for field in properties {
        props.insert(field.name.clone(), field.json_schema());
    }

    let mut schema = Map::new();
    schema.insert("type".into(), json!("object"));
    schema.insert("additionalProperties".into(), json!(false));
    schema.insert("properties".into(), Value::Object(props));
    if action.enforces_required() {
        schema.insert("required".into(), json!(required));
    }
    Value::Object(schema)
}

/// The keyword is the last segment of the failing schema location.
fn field_error(error: ValidationError<'_>) -> FieldError {
    let schema_path = error.schema_path.to_string();
    let keyword = schema_path.rsplit('/').next().unwrap_or_default().to_string();
    FieldError::new(error.instance_path.to_string(), keyword, error.to_string())
}
