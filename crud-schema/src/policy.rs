//! Per-action field policies.

use crud_acl::Actor;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::record::Record;

/// Policy governing whether a field may be written by an action.
///
/// # Example
///
/// ```
/// use crud_schema::FieldPolicy;
///
/// assert_eq!(FieldPolicy::from(true), FieldPolicy::Always);
/// assert_eq!(FieldPolicy::from(false), FieldPolicy::Never);
/// assert_eq!(
///     FieldPolicy::from("update.post.owner"),
///     FieldPolicy::RequiresPermission("update.post.owner".into())
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FieldPolicy {
    /// Any actor passing the resource gate may write the field.
    #[default]
    Always,
    /// The field is excluded from the action.
    Never,
    /// The actor must additionally hold this token.
    RequiresPermission(String),
}

impl FieldPolicy {
    /// Shorthand for [`FieldPolicy::RequiresPermission`].
    pub fn requires(token: impl Into<String>) -> Self {
        FieldPolicy::RequiresPermission(token.into())
    }

    /// Check if the policy excludes the field.
    pub fn is_never(&self) -> bool {
        matches!(self, FieldPolicy::Never)
    }
}

impl From<bool> for FieldPolicy {
    fn from(allowed: bool) -> Self {
        if allowed {
            FieldPolicy::Always
        } else {
            FieldPolicy::Never
        }
    }
}

impl From<&str> for FieldPolicy {
    fn from(token: &str) -> Self {
        FieldPolicy::RequiresPermission(token.to_string())
    }
}

impl From<String> for FieldPolicy {
    fn from(token: String) -> Self {
        FieldPolicy::RequiresPermission(token)
    }
}

/// Computes the projected value of a field from its stored value, the
/// viewing actor and the whole stored record.
pub type ViewTransform = Arc<dyn Fn(&Value, &Actor, &Record) -> Value + Send + Sync>;

/// Policy governing how a field appears in views.
#[derive(Clone, Default)]
pub enum ViewPolicy {
    /// Shown to any actor passing the view gate.
    #[default]
    Always,
    /// Never shown.
    Never,
    /// Shown only to actors holding this token.
    RequiresPermission(String),
    /// Always shown, with the value computed by the transform.
    Transform(ViewTransform),
}

impl ViewPolicy {
    /// Shorthand for [`ViewPolicy::RequiresPermission`].
    pub fn requires(token: impl Into<String>) -> Self {
        ViewPolicy::RequiresPermission(token.into())
    }

    /// Build a [`ViewPolicy::Transform`] from a closure.
    pub fn transform<F>(f: F) -> Self
    where
        F: Fn(&Value, &Actor, &Record) -> Value + Send + Sync + 'static,
    {
        ViewPolicy::Transform(Arc::new(f))
    }

    /// Check if the policy hides the field.
    pub fn is_never(&self) -> bool {
        matches!(self, ViewPolicy::Never)
    }
}

impl fmt::Debug for ViewPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewPolicy::Always => f.write_str("Always"),
            ViewPolicy::Never => f.write_str("Never"),
            ViewPolicy::RequiresPermission(token) => {
                f.debug_tuple("RequiresPermission").field(token).finish()
            }
            ViewPolicy::Transform(_) => f.write_str("Transform(..)"),
        }
    }
}

impl From<FieldPolicy> for ViewPolicy {
    fn from(policy: FieldPolicy) -> Self {
        match policy {
            FieldPolicy::Always => ViewPolicy::Always,
            FieldPolicy::Never => ViewPolicy::Never,
            FieldPolicy::RequiresPermission(token) => ViewPolicy::RequiresPermission(token),
        }
    }
}

impl From<bool> for ViewPolicy {
    fn from(allowed: bool) -> Self {
        FieldPolicy::from(allowed).into()
    }
}

impl From<&str> for ViewPolicy {
    fn from(token: &str) -> Self {
        ViewPolicy::RequiresPermission(token.to_string())
    }
}

/// How a field participates in a given action, independent of policy kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access<'a> {
    /// Participates without further checks.
    Open,
    /// Excluded from the action.
    Closed,
    /// Participates if the actor holds the token.
    Token(&'a str),
}

impl FieldPolicy {
    /// Resolve the policy into an [`Access`].
    pub fn access(&self) -> Access<'_> {
        match self {
            FieldPolicy::Always => Access::Open,
            FieldPolicy::Never => Access::Closed,
            FieldPolicy::RequiresPermission(token) => Access::Token(token),
        }
    }
}

impl ViewPolicy {
    /// Resolve the policy into an [`Access`]. Transforms are open.
    pub fn access(&self) -> Access<'_> {
        match self {
            ViewPolicy::Always | ViewPolicy::Transform(_) => Access::Open,
            ViewPolicy::Never => Access::Closed,
            ViewPolicy::RequiresPermission(token) => Access::Token(token),
        }
    }
}
