//! Schema actions.

use crud_acl::{permission_token, Action};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The actions a schema validates or projects for.
///
/// `Get` and `List` resource actions both map to [`SchemaAction::View`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SchemaAction {
    /// Input for a new record.
    Create,
    /// Input that overwrites a record.
    Replace,
    /// Partial input patching a record.
    Update,
    /// Output projection of a record.
    View,
    /// Deletion (no input shape).
    Delete,
}

impl SchemaAction {
    /// Get the string representation of the action.
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaAction::Create => "create",
            SchemaAction::Replace => "replace",
            SchemaAction::Update => "update",
            SchemaAction::View => "view",
            SchemaAction::Delete => "delete",
        }
    }

    /// Resource-level permission token, e.g. `update.post`.
    pub fn permission_token(&self, permission_name: &str) -> String {
        permission_token(self.as_str(), permission_name)
    }

    /// Actions that carry an input or output shape.
    pub fn shaped() -> [SchemaAction; 4] {
        [
            SchemaAction::Create,
            SchemaAction::Replace,
            SchemaAction::Update,
            SchemaAction::View,
        ]
    }

    /// Whether required-field lists apply to this action.
    pub fn enforces_required(&self) -> bool {
        matches!(self, SchemaAction::Create | SchemaAction::Replace)
    }
}

impl From<Action> for SchemaAction {
    fn from(action: Action) -> Self {
        match action {
            Action::Create => SchemaAction::Create,
            Action::Replace => SchemaAction::Replace,
            Action::Update => SchemaAction::Update,
            Action::Delete => SchemaAction::Delete,
            Action::Get | Action::List => SchemaAction::View,
        }
    }
}

impl fmt::Display for SchemaAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_resource_action() {
        assert_eq!(SchemaAction::from(Action::Get), SchemaAction::View);
        assert_eq!(SchemaAction::from(Action::List), SchemaAction::View);
        assert_eq!(SchemaAction::from(Action::Replace), SchemaAction::Replace);
    }

    #[test]
    fn test_tokens_match_resource_tokens() {
        for action in Action::all() {
            assert_eq!(
                SchemaAction::from(action).permission_token("post"),
                action.permission_token("post")
            );
        }
    }
}
