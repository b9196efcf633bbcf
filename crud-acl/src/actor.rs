//! Actor identity
//!
//! An [`Actor`] is the pre-authenticated identity on whose behalf a
//! resource operation runs. It is produced by an auth strategy and is
//! otherwise opaque to the engine: only its permission set, its optional
//! scope and its `unrestricted` capability are consulted.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::permissions::{PermissionQuery, PermissionSet};

/// An authenticated identity.
///
/// An actor without a permission set (`permissions: None`) is
/// permission-less and fails every check.
///
/// # Example
///
/// ```
/// use crud_acl::Actor;
///
/// let actor = Actor::with_permissions(["view.post"]);
/// assert!(actor.may("view.post"));
/// assert!(!actor.may("create.post"));
///
/// assert!(!Actor::anonymous().may("view.post"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    /// Identity of the actor, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Permission tokens held by the actor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<PermissionSet>,

    /// Tenant or ownership scope the actor operates in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<Value>,

    /// Bypasses every permission check. Never read from the wire.
    #[serde(skip)]
    unrestricted: bool,
}

impl Actor {
    /// An actor with no permission set at all.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// An actor holding the given tokens.
    pub fn with_permissions<I, T>(tokens: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            permissions: Some(tokens.into_iter().collect()),
            ..Self::default()
        }
    }

    /// An actor that passes every permission check.
    ///
    /// This capability cannot be forged through deserialization; it must be
    /// granted explicitly in code.
    pub fn unrestricted() -> Self {
        Self {
            permissions: Some(PermissionSet::new()),
            unrestricted: true,
            ..Self::default()
        }
    }

    /// Set the actor id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the actor scope.
    pub fn with_scope(mut self, scope: impl Into<Value>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Check whether this actor bypasses permission checks.
    pub fn is_unrestricted(&self) -> bool {
        self.unrestricted
    }

    /// Decide a permission query for this actor.
    ///
    /// Equivalent to [`mayi`](crate::mayi) with `Some(self)`.
    pub fn may<Q: PermissionQuery + ?Sized>(&self, query: &Q) -> bool {
        if self.unrestricted {
            return true;
        }
        match &self.permissions {
            Some(set) => query.granted_by(set),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unrestricted_is_not_deserialized() {
        let actor: Actor =
            serde_json::from_str(r#"{"permissions":[],"unrestricted":true}"#).unwrap();
        assert!(!actor.is_unrestricted());
        assert!(!actor.may("create.x"));
    }

    #[test]
    fn test_unrestricted_passes_everything() {
        let actor = Actor::unrestricted();
        assert!(actor.may("create.anything"));
        assert!(actor.may(&["a", "b"]));
    }

    #[test]
    fn test_missing_permission_set_fails_closed() {
        let actor: Actor = serde_json::from_str(r#"{"id":"u1"}"#).unwrap();
        assert_eq!(actor.id.as_deref(), Some("u1"));
        assert!(actor.permissions.is_none());
        assert!(!actor.may("view.x"));
    }

    #[test]
    fn test_scope_roundtrip() {
        let actor = Actor::with_permissions(["view.x"]).with_scope(42);
        let json = serde_json::to_value(&actor).unwrap();
        assert_eq!(json["scope"], serde_json::json!(42));
        assert!(json.get("id").is_none());
    }
}
