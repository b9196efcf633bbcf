//! # Field Descriptors
//!
//! A [`FieldDescriptor`] declares one field of a resource: its base type and
//! constraints, one policy per action, and the `required`, `virtual` and
//! `allow_empty` flags.
//!
//! ## Usage
//!
//! ```rust
//! use crud_schema::{FieldDescriptor, FieldPolicy};
//!
//! let title = FieldDescriptor::string("title").required();
//! let status = FieldDescriptor::enumeration("status", ["draft", "live"])
//!     .create(false)
//!     .update("update.post.status");
//! let password = FieldDescriptor::text("password").virtual_field().required();
//!
//! assert_eq!(status.create, FieldPolicy::Never);
//! assert!(password.is_virtual);
//! assert_eq!(title.max_length, Some(255));
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::action::SchemaAction;
use crate::policy::{Access, FieldPolicy, ViewPolicy, ViewTransform};

/// Default maximum length of [`FieldDescriptor::string`] fields.
pub const DEFAULT_STRING_MAX_LENGTH: usize = 255;

/// Base type of a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// UTF-8 string
    String,
    /// Whole number
    Integer,
    /// Any JSON number
    Number,
    /// `true` / `false`
    Boolean,
    /// RFC 3339 timestamp carried as a string
    DateTime,
    /// One of a fixed set of strings
    Enum(Vec<String>),
}

impl FieldType {
    /// JSON-Schema `type` keyword for this base type.
    pub fn json_type(&self) -> &'static str {
        match self {
            FieldType::String | FieldType::DateTime | FieldType::Enum(_) => "string",
            FieldType::Integer => "integer",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
        }
    }
}

/// String formats checked by the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StringFormat {
    /// RFC 3339 date-time
    DateTime,
    /// `local@domain.tld`
    Email,
    /// `scheme:rest`
    Uri,
}

impl StringFormat {
    /// JSON-Schema `format` keyword.
    pub fn as_str(&self) -> &'static str {
        match self {
            StringFormat::DateTime => "date-time",
            StringFormat::Email => "email",
            StringFormat::Uri => "uri",
        }
    }
}

/// Declaration of one resource field.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    /// Field name, unique within a resource.
    pub name: String,
    /// Base type.
    pub field_type: FieldType,
    /// Optional string format.
    pub format: Option<StringFormat>,
    /// Minimum string length, in characters.
    pub min_length: Option<usize>,
    /// Maximum string length, in characters.
    pub max_length: Option<usize>,
    /// Inclusive numeric lower bound.
    pub minimum: Option<f64>,
    /// Inclusive numeric upper bound.
    pub maximum: Option<f64>,
    /// Policy when creating.
    pub create: FieldPolicy,
    /// Policy when replacing.
    pub replace: FieldPolicy,
    /// Policy when updating.
    pub update: FieldPolicy,
    /// Policy when viewing.
    pub view: ViewPolicy,
    /// Must be present on create and replace.
    pub required: bool,
    /// Accepted as input for hooks but never stored or shown.
    pub is_virtual: bool,
    /// Also accepts `null` and `""`.
    pub allow_empty: bool,
    /// Free-form description carried into derived schemas.
    pub description: Option<String>,
}

impl FieldDescriptor {
    /// Create a field of the given type with every policy `Always`.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            format: None,
            min_length: None,
            max_length: None,
            minimum: None,
            maximum: None,
            create: FieldPolicy::Always,
            replace: FieldPolicy::Always,
            update: FieldPolicy::Always,
            view: ViewPolicy::Always,
            required: false,
            is_virtual: false,
            allow_empty: false,
            description: None,
        }
    }

    /// A string of at most 255 characters.
    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::String).max_length(DEFAULT_STRING_MAX_LENGTH)
    }

    /// An unbounded string.
    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::String)
    }

    /// A whole number.
    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Integer)
    }

    /// Any number.
    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Number)
    }

    /// A boolean.
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Boolean)
    }

    /// An RFC 3339 timestamp.
    pub fn date_time(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::DateTime)
    }

    /// An e-mail address.
    pub fn email(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::String).format(StringFormat::Email)
    }

    /// A URL.
    pub fn url(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::String).format(StringFormat::Uri)
    }

    /// One of a fixed set of strings.
    pub fn enumeration<I, T>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self::new(name, FieldType::Enum(values.into_iter().map(Into::into).collect()))
    }

    /// Mark the field required for create and replace.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Mark the field virtual.
    pub fn virtual_field(mut self) -> Self {
        self.is_virtual = true;
        self
    }

    /// Accept `null` and `""` in addition to the declared type.
    pub fn allow_empty(mut self) -> Self {
        self.allow_empty = true;
        self
    }

    /// Set the create policy.
    pub fn create(mut self, policy: impl Into<FieldPolicy>) -> Self {
        self.create = policy.into();
        self
    }

    /// Set the replace policy.
    pub fn replace(mut self, policy: impl Into<FieldPolicy>) -> Self {
        self.replace = policy.into();
        self
    }

    /// Set the update policy.
    pub fn update(mut self, policy: impl Into<FieldPolicy>) -> Self {
        self.update = policy.into();
        self
    }

    /// Set create, replace and update policies at once.
    pub fn editable(self, policy: impl Into<FieldPolicy>) -> Self {
        let policy = policy.into();
        self.create(policy.clone()).replace(policy.clone()).update(policy)
    }

    /// Exclude the field from every write action.
    pub fn read_only(self) -> Self {
        self.editable(FieldPolicy::Never)
    }

    /// Set the view policy.
    pub fn view(mut self, policy: impl Into<ViewPolicy>) -> Self {
        self.view = policy.into();
        self
    }

    /// Show a computed value instead of the stored one.
    pub fn view_with<F>(self, transform: F) -> Self
    where
        F: Fn(&Value, &crud_acl::Actor, &crate::record::Record) -> Value + Send + Sync + 'static,
    {
        self.view(ViewPolicy::transform(transform))
    }

    /// Show a computed value using a shared transform.
    pub fn view_transform(self, transform: ViewTransform) -> Self {
        self.view(ViewPolicy::Transform(transform))
    }

    /// Never show the field.
    pub fn hidden(self) -> Self {
        self.view(ViewPolicy::Never)
    }

    /// Set the string format.
    pub fn format(mut self, format: StringFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Set the minimum string length.
    pub fn min_length(mut self, len: usize) -> Self {
        self.min_length = Some(len);
        self
    }

    /// Set the maximum string length.
    pub fn max_length(mut self, len: usize) -> Self {
        self.max_length = Some(len);
        self
    }

    /// Set the numeric lower bound.
    pub fn minimum(mut self, min: f64) -> Self {
        self.minimum = Some(min);
        self
    }

    /// Set the numeric upper bound.
    pub fn maximum(mut self, max: f64) -> Self {
        self.maximum = Some(max);
        self
    }

    /// Attach a description.
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// How this field participates in `action`.
    ///
    /// Deletion has no input shape, so every field is open for it.
    pub fn access(&self, action: SchemaAction) -> Access<'_> {
        match action {
            SchemaAction::Create => self.create.access(),
            SchemaAction::Replace => self.replace.access(),
            SchemaAction::Update => self.update.access(),
            SchemaAction::View => self.view.access(),
            SchemaAction::Delete => Access::Open,
        }
    }

    /// Whether this field is part of the derived schema for `action`.
    pub fn included_in(&self, action: SchemaAction) -> bool {
        self.access(action) != Access::Closed
    }

    /// Effective format: date-time fields always carry one.
    pub fn effective_format(&self) -> Option<StringFormat> {
        match self.field_type {
            FieldType::DateTime => Some(StringFormat::DateTime),
            _ => self.format,
        }
    }

    /// JSON-Schema fragment describing the value of this field.
    ///
    /// # Example
    ///
    /// ```
    /// use crud_schema::FieldDescriptor;
    /// use serde_json::json;
    ///
    /// assert_eq!(
    ///     FieldDescriptor::string("name").json_schema(),
    ///     json!({"type": "string", "maxLength": 255})
    /// );
    /// assert_eq!(
    ///     FieldDescriptor::integer("age").allow_empty().json_schema(),
    ///     json!({"anyOf": [
    ///         {"type": "integer"},
    ///         {"type": "null"},
    ///         {"type": "string", "maxLength": 0}
    ///     ]})
    /// );
    /// ```
    pub fn json_schema(&self) -> Value {
        let mut typed = Map::new();
        typed.insert("type".into(), json!(self.field_type.json_type()));

        if let Some(format) = self.effective_format() {
            typed.insert("format".into(), json!(format.as_str()));
        }
        if let FieldType::Enum(values) = &self.field_type {
            typed.insert("enum".into(), json!(values));
        }
        if let Some(min) = self.min_length {
            typed.insert("minLength".into(), json!(min));
        }
        if let Some(max) = self.max_length {
            typed.insert("maxLength".into(), json!(max));
        }
        if let Some(min) = self.minimum {
            typed.insert("minimum".into(), json!(min));
        }
        if let Some(max) = self.maximum {
            typed.insert("maximum".into(), json!(max));
        }

        let mut schema = if self.allow_empty {
            let mut any = Map::new();
            any.insert(
                "anyOf".into(),
                json!([
                    Value::Object(typed),
                    {"type": "null"},
                    {"type": "string", "maxLength": 0}
                ]),
            );
            any
        } else {
            typed
        };

        if let Some(description) = &self.description {
            schema.insert("description".into(), json!(description));
        }

        Value::Object(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helper_types() {
        assert_eq!(
            FieldDescriptor::date_time("at").json_schema(),
            json!({"type": "string", "format": "date-time"})
        );
        assert_eq!(
            FieldDescriptor::email("mail").json_schema(),
            json!({"type": "string", "format": "email"})
        );
        assert_eq!(
            FieldDescriptor::url("home").json_schema(),
            json!({"type": "string", "format": "uri"})
        );
        assert_eq!(
            FieldDescriptor::enumeration("s", ["a", "b"]).json_schema(),
            json!({"type": "string", "enum": ["a", "b"]})
        );
        assert_eq!(FieldDescriptor::boolean("b").json_schema(), json!({"type": "boolean"}));
        assert_eq!(FieldDescriptor::text("t").json_schema(), json!({"type": "string"}));
    }

    #[test]
    fn test_numeric_bounds_in_schema() {
        let schema = FieldDescriptor::number("score")
            .minimum(0.0)
            .maximum(10.0)
            .json_schema();
        assert_eq!(schema["minimum"], json!(0.0));
        assert_eq!(schema["maximum"], json!(10.0));
    }

    #[test]
    fn test_description_outside_any_of() {
        let schema = FieldDescriptor::text("bio")
            .allow_empty()
            .describe("About me")
            .json_schema();
        assert_eq!(schema["description"], "About me");
        assert!(schema["anyOf"].is_array());
    }

    #[test]
    fn test_policies_and_access() {
        let field = FieldDescriptor::string("owner")
            .read_only()
            .view("view.post.owner");

        assert!(!field.included_in(SchemaAction::Create));
        assert!(!field.included_in(SchemaAction::Replace));
        assert!(!field.included_in(SchemaAction::Update));
        assert_eq!(field.access(SchemaAction::View), Access::Token("view.post.owner"));
        assert_eq!(field.access(SchemaAction::Delete), Access::Open);
    }

    #[test]
    fn test_editable_sets_all_write_policies() {
        let field = FieldDescriptor::integer("rank").editable("edit.rank");
        for action in [SchemaAction::Create, SchemaAction::Replace, SchemaAction::Update] {
            assert_eq!(field.access(action), Access::Token("edit.rank"));
        }
        assert_eq!(field.access(SchemaAction::View), Access::Open);
    }

    #[test]
    fn test_hidden_and_transform() {
        assert!(FieldDescriptor::text("secret").hidden().view.is_never());
        let upper = FieldDescriptor::text("name")
            .view_with(|v, _, _| json!(v.as_str().unwrap_or_default().to_uppercase()));
        assert!(matches!(upper.view, ViewPolicy::Transform(_)));
    }
}
