//! Resource configuration.
//!
//! Controls where a resource's endpoints are mounted, which actions are
//! exposed and under which HTTP method. Configuration can be built in code,
//! loaded from JSON or read from environment variables.

use crud_acl::Action;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid configuration value.
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue {
        /// Configuration key.
        key: String,
        /// Error message.
        message: String,
    },

    /// Two actions share a method and path.
    #[error("Route collision: {method} {path} is used by {first} and {second}")]
    RouteCollision {
        /// HTTP method
        method: HttpMethod,
        /// Route path
        path: String,
        /// First action on the route
        first: Action,
        /// Second action on the route
        second: Action,
    },

    /// A post-persistence hook was set more than once.
    #[error("Hook already set: {0}")]
    HookAlreadySet(&'static str),

    /// JSON could not be parsed.
    #[error("Invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// HTTP methods an action can be mounted under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
}

impl HttpMethod {
    /// Get the string representation of the method.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// Parse a method name, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "GET" => Some(HttpMethod::Get),
            "POST" => Some(HttpMethod::Post),
            "PUT" => Some(HttpMethod::Put),
            "PATCH" => Some(HttpMethod::Patch),
            "DELETE" => Some(HttpMethod::Delete),
            _ => None,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verb mapping per action. `None` disables the action's endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionTable {
    /// Method for create
    pub create: Option<HttpMethod>,
    /// Method for get
    pub get: Option<HttpMethod>,
    /// Method for update
    pub update: Option<HttpMethod>,
    /// Method for replace
    pub replace: Option<HttpMethod>,
    /// Method for delete
    pub delete: Option<HttpMethod>,
    /// Method for list
    pub list: Option<HttpMethod>,
}

impl Default for ActionTable {
    fn default() -> Self {
        Self {
            create: Some(HttpMethod::Post),
            get: Some(HttpMethod::Get),
            update: Some(HttpMethod::Patch),
            replace: Some(HttpMethod::Put),
            delete: Some(HttpMethod::Delete),
            list: Some(HttpMethod::Get),
        }
    }
}

impl ActionTable {
    /// Method mapped to `action`, if enabled.
    pub fn method(&self, action: Action) -> Option<HttpMethod> {
        match action {
            Action::Create => self.create,
            Action::Get => self.get,
            Action::Update => self.update,
            Action::Replace => self.replace,
            Action::Delete => self.delete,
            Action::List => self.list,
        }
    }

    /// Map `action` to `method`, or disable it with `None`.
    pub fn set(&mut self, action: Action, method: Option<HttpMethod>) {
        let slot = match action {
            Action::Create => &mut self.create,
            Action::Get => &mut self.get,
            Action::Update => &mut self.update,
            Action::Replace => &mut self.replace,
            Action::Delete => &mut self.delete,
            Action::List => &mut self.list,
        };
        *slot = method;
    }

    /// Builder form of [`ActionTable::set`].
    pub fn with(mut self, action: Action, method: Option<HttpMethod>) -> Self {
        self.set(action, method);
        self
    }

    /// Enabled actions with their methods, in [`Action::all`] order.
    pub fn enabled(&self) -> Vec<(Action, HttpMethod)> {
        Action::all()
            .into_iter()
            .filter_map(|a| self.method(a).map(|m| (a, m)))
            .collect()
    }
}

/// Endpoint configuration for one resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceConfig {
    /// Prefix for every endpoint path (e.g. "/api").
    pub base_path: String,

    /// Overrides the permission name of the resource.
    pub permission_name: Option<String>,

    /// Verb mapping per action.
    pub actions: ActionTable,

    /// Tags attached to every endpoint descriptor.
    pub tags: Vec<String>,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            base_path: "/".to_string(),
            permission_name: None,
            actions: ActionTable::default(),
            tags: Vec::new(),
        }
    }
}

impl ResourceConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `CRUD_BASE_PATH`: Endpoint prefix (default: /)
    /// - `CRUD_DISABLED_ACTIONS`: Comma-separated actions to disable
    ///   (e.g. `delete,replace`); unknown names are ignored
    pub fn from_env() -> Self {
        let default = Self::default();

        let mut actions = default.actions;
        if let Ok(disabled) = std::env::var("CRUD_DISABLED_ACTIONS") {
            for action in disabled.split(',').filter_map(|s| Action::parse(s.trim())) {
                actions.set(action, None);
            }
        }

        Self {
            base_path: std::env::var("CRUD_BASE_PATH").unwrap_or(default.base_path),
            actions,
            ..default
        }
    }

    /// Parse configuration from JSON. Missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the endpoint prefix.
    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    /// Set the permission name override.
    pub fn with_permission_name(mut self, name: impl Into<String>) -> Self {
        self.permission_name = Some(name.into());
        self
    }

    /// Set the verb mapping.
    pub fn with_actions(mut self, actions: ActionTable) -> Self {
        self.actions = actions;
        self
    }

    /// Add a tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Path for an action of `resource_name`.
    ///
    /// ```
    /// use crud_acl::Action;
    /// use crud_resource::ResourceConfig;
    ///
    /// let config = ResourceConfig::default().with_base_path("/api/");
    /// assert_eq!(config.path("post", Action::List), "/api/post");
    /// assert_eq!(config.path("post", Action::Get), "/api/post/:id");
    /// ```
    pub fn path(&self, resource_name: &str, action: Action) -> String {
        let base = self.base_path.trim_end_matches('/');
        if action.targets_record() {
            format!("{}/{}/:id", base, resource_name)
        } else {
            format!("{}/{}", base, resource_name)
        }
    }

    /// Check the configuration for mistakes.
    ///
    /// Rejects a base path without a leading `/` and two enabled actions
    /// sharing a method on the same path.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.base_path.starts_with('/') {
            return Err(ConfigError::InvalidValue {
                key: "base_path".to_string(),
                message: format!("must start with '/', got {:?}", self.base_path),
            });
        }

        if let Some(name) = &self.permission_name {
            if name.is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: "permission_name".to_string(),
                    message: "must not be empty".to_string(),
                });
            }
        }

        let mut seen: Vec<(HttpMethod, bool, Action)> = Vec::new();
        for (action, method) in self.actions.enabled() {
            let on_record = action.targets_record();
            if let Some((_, _, first)) = seen
                .iter()
                .find(|(m, r, _)| *m == method && *r == on_record)
            {
                return Err(ConfigError::RouteCollision {
                    method,
                    path: self.path(":resource", action),
                    first: *first,
                    second: action,
                });
            }
            seen.push((method, on_record, action));
        }

        let mut tags = HashSet::new();
        for tag in &self.tags {
            if !tags.insert(tag) {
                return Err(ConfigError::InvalidValue {
                    key: "tags".to_string(),
                    message: format!("duplicate tag {:?}", tag),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ResourceConfig::default();
        assert_eq!(config.base_path, "/");
        assert!(config.validate().is_ok());
        assert_eq!(config.actions.enabled().len(), 6);
        assert_eq!(config.actions.method(Action::Update), Some(HttpMethod::Patch));
    }

    #[test]
    fn test_from_json_partial() {
        let config = ResourceConfig::from_json(
            r#"{"base_path": "/api", "actions": {"delete": null, "update": "PUT", "replace": null}}"#,
        )
        .unwrap();

        assert_eq!(config.base_path, "/api");
        assert_eq!(config.actions.delete, None);
        assert_eq!(config.actions.update, Some(HttpMethod::Put));
        assert_eq!(config.actions.create, Some(HttpMethod::Post));
    }

    #[test]
    fn test_route_collision() {
        let actions = ActionTable::default().with(Action::Update, Some(HttpMethod::Put));
        let err = ResourceConfig::default()
            .with_actions(actions)
            .validate()
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::RouteCollision {
                method: HttpMethod::Put,
                first: Action::Update,
                second: Action::Replace,
                ..
            }
        ));
    }

    #[test]
    fn test_same_method_different_paths_is_fine() {
        // GET / for list and GET /:id for get
        let config = ResourceConfig::default();
        assert_eq!(config.actions.get, config.actions.list);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_base_path() {
        let err = ResourceConfig::default()
            .with_base_path("api")
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("base_path"));
        assert!(ResourceConfig::from_json(r#"{"base_path": "v1"}"#).is_err());
    }

    #[test]
    fn test_method_parse() {
        assert_eq!(HttpMethod::parse("patch"), Some(HttpMethod::Patch));
        assert_eq!(HttpMethod::parse("TRACE"), None);
        assert_eq!(HttpMethod::Delete.to_string(), "DELETE");
    }
}
