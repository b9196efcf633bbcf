//! # Actions
//!
//! Defines the actions a resource exposes and the small set type used to
//! enable, disable and advertise them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Actions that can be performed on a resource.
///
/// - **Create**: Insert a new record
/// - **Get**: Fetch a single record by id
/// - **Update**: Patch an existing record
/// - **Replace**: Overwrite an existing record
/// - **Delete**: Remove a record
/// - **List**: Query a page of records
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Create a new record.
    Create,
    /// Fetch one record.
    Get,
    /// Partially update a record.
    Update,
    /// Fully replace a record.
    Replace,
    /// Delete a record.
    Delete,
    /// List records.
    List,
}

impl Action {
    /// Get the string representation of the action.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Get => "get",
            Action::Update => "update",
            Action::Replace => "replace",
            Action::Delete => "delete",
            Action::List => "list",
        }
    }

    /// Verb used in the permission token guarding this action.
    ///
    /// Reads (`get`, `list`) are both guarded by `view.<permission>`; every
    /// other action is guarded by its own name.
    ///
    /// # Example
    ///
    /// ```
    /// use crud_acl::Action;
    ///
    /// assert_eq!(Action::List.permission_verb(), "view");
    /// assert_eq!(Action::Replace.permission_verb(), "replace");
    /// ```
    pub fn permission_verb(&self) -> &'static str {
        match self {
            Action::Get | Action::List => "view",
            other => other.as_str(),
        }
    }

    /// Build the resource-level permission token for this action.
    ///
    /// # Example
    ///
    /// ```
    /// use crud_acl::Action;
    ///
    /// assert_eq!(Action::Get.permission_token("posts"), "view.posts");
    /// assert_eq!(Action::Create.permission_token("posts"), "create.posts");
    /// ```
    pub fn permission_token(&self, permission_name: &str) -> String {
        permission_token(self.permission_verb(), permission_name)
    }

    /// Parse action from string representation.
    ///
    /// # Arguments
    ///
    /// * `s` - String to parse (case-insensitive, supports aliases)
    ///
    /// # Example
    ///
    /// ```
    /// use crud_acl::Action;
    ///
    /// assert_eq!(Action::parse("get"), Some(Action::Get));
    /// assert_eq!(Action::parse("view"), Some(Action::Get));
    /// assert_eq!(Action::parse("patch"), Some(Action::Update));
    /// assert_eq!(Action::parse("invalid"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "create" | "add" | "new" => Some(Action::Create),
            "get" | "view" | "read" => Some(Action::Get),
            "update" | "patch" | "edit" => Some(Action::Update),
            "replace" | "put" => Some(Action::Replace),
            "delete" | "remove" | "destroy" => Some(Action::Delete),
            "list" | "query" | "index" => Some(Action::List),
            _ => None,
        }
    }

    /// Get all actions.
    pub fn all() -> Vec<Self> {
        vec![
            Action::Create,
            Action::Get,
            Action::Update,
            Action::Replace,
            Action::Delete,
            Action::List,
        ]
    }

    /// Check if this is a read-only action.
    pub fn is_read_only(&self) -> bool {
        matches!(self, Action::Get | Action::List)
    }

    /// Check if this action addresses a single record by id.
    pub fn targets_record(&self) -> bool {
        matches!(
            self,
            Action::Get | Action::Update | Action::Replace | Action::Delete
        )
    }

    fn bit(&self) -> u8 {
        match self {
            Action::Create => 1,
            Action::Get => 1 << 1,
            Action::Update => 1 << 2,
            Action::Replace => 1 << 3,
            Action::Delete => 1 << 4,
            Action::List => 1 << 5,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Join a verb and a permission name into a permission token.
pub fn permission_token(verb: &str, permission_name: &str) -> String {
    format!("{}.{}", verb, permission_name)
}

/// A compact set of [`Action`]s.
///
/// Used both for the actions a resource advertises and for the
/// capabilities a database model exposes.
///
/// # Example
///
/// ```
/// use crud_acl::{Action, ActionSet};
///
/// let set = ActionSet::read_only();
/// assert!(set.contains(Action::List));
/// assert!(!set.contains(Action::Create));
/// ```
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ActionSet(u8);

impl ActionSet {
    /// The empty set.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Every action.
    pub fn all() -> Self {
        Action::all().into_iter().collect()
    }

    /// `get` and `list` only.
    pub fn read_only() -> Self {
        [Action::Get, Action::List].into_iter().collect()
    }

    /// Add an action, returning the updated set.
    pub fn with(mut self, action: Action) -> Self {
        self.insert(action);
        self
    }

    /// Remove an action, returning the updated set.
    pub fn without(mut self, action: Action) -> Self {
        self.remove(action);
        self
    }

    /// Add an action.
    pub fn insert(&mut self, action: Action) {
        self.0 |= action.bit();
    }

    /// Remove an action.
    pub fn remove(&mut self, action: Action) {
        self.0 &= !action.bit();
    }

    /// Check membership.
    pub fn contains(&self, action: Action) -> bool {
        self.0 & action.bit() != 0
    }

    /// Check if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Iterate members in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = Action> + '_ {
        Action::all().into_iter().filter(move |a| self.contains(*a))
    }
}

impl fmt::Debug for ActionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl FromIterator<Action> for ActionSet {
    fn from_iter<T: IntoIterator<Item = Action>>(iter: T) -> Self {
        let mut set = ActionSet::empty();
        for action in iter {
            set.insert(action);
        }
        set
    }
}

impl Serialize for ActionSet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de> Deserialize<'de> for ActionSet {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let actions = Vec::<Action>::deserialize(deserializer)?;
        Ok(actions.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_parsing() {
        assert_eq!(Action::parse("create"), Some(Action::Create));
        assert_eq!(Action::parse("CREATE"), Some(Action::Create));
        assert_eq!(Action::parse("read"), Some(Action::Get));
        assert_eq!(Action::parse("put"), Some(Action::Replace));
        assert_eq!(Action::parse("patch"), Some(Action::Update));
        assert_eq!(Action::parse("remove"), Some(Action::Delete));
        assert_eq!(Action::parse("index"), Some(Action::List));
        assert_eq!(Action::parse("manage"), None);
    }

    #[test]
    fn test_permission_tokens() {
        assert_eq!(Action::Get.permission_token("user"), "view.user");
        assert_eq!(Action::List.permission_token("user"), "view.user");
        assert_eq!(Action::Update.permission_token("user"), "update.user");
        assert_eq!(Action::Delete.permission_token("user"), "delete.user");
    }

    #[test]
    fn test_targets_record() {
        assert!(Action::Get.targets_record());
        assert!(Action::Delete.targets_record());
        assert!(!Action::Create.targets_record());
        assert!(!Action::List.targets_record());
    }

    #[test]
    fn test_action_set_membership() {
        let set = ActionSet::all().without(Action::Delete);
        assert!(set.contains(Action::Create));
        assert!(!set.contains(Action::Delete));
        assert_eq!(set.iter().count(), 5);

        let empty = ActionSet::empty();
        assert!(empty.is_empty());
        assert!(!empty.with(Action::Get).is_empty());
    }

    #[test]
    fn test_action_set_serde() {
        let set = ActionSet::empty().with(Action::List).with(Action::Create);
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["create","list"]"#);

        let parsed: ActionSet = serde_json::from_str(r#"["get","get","list"]"#).unwrap();
        assert_eq!(parsed, ActionSet::read_only());
    }

    #[test]
    fn test_all_actions_count() {
        assert_eq!(Action::all().len(), 6);
    }
}
