//! # Permissions
//!
//! Permission tokens are opaque strings such as `"create.post"` or
//! `"view.post.draft"`. A [`PermissionSet`] answers membership by exact
//! string equality: there is no hierarchy and no wildcard matching.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A set of permission tokens held by an actor.
///
/// Order and duplicates are irrelevant.
///
/// # Example
///
/// ```
/// use crud_acl::PermissionSet;
///
/// let set = PermissionSet::from_strings(&["view.post", "create.post"]);
/// assert!(set.has("view.post"));
/// assert!(!set.has("view"));
/// assert!(!set.has("view.post.draft"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet {
    permissions: HashSet<String>,
}

impl PermissionSet {
    /// Create a new empty permission set.
    pub fn new() -> Self {
        Self {
            permissions: HashSet::new(),
        }
    }

    /// Add a token to the set.
    pub fn add(&mut self, token: impl Into<String>) {
        self.permissions.insert(token.into());
    }

    /// Add multiple tokens to the set.
    pub fn add_all<I, T>(&mut self, tokens: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        for token in tokens {
            self.add(token);
        }
    }

    /// Remove a token from the set.
    ///
    /// # Returns
    ///
    /// `true` if the token was present, `false` otherwise
    pub fn remove(&mut self, token: &str) -> bool {
        self.permissions.remove(token)
    }

    /// Check if the set contains the literal token.
    pub fn has(&self, token: &str) -> bool {
        self.permissions.contains(token)
    }

    /// Check if the set contains at least one of the tokens.
    pub fn has_any<T: AsRef<str>>(&self, tokens: &[T]) -> bool {
        tokens.iter().any(|t| self.has(t.as_ref()))
    }

    /// Merge another permission set into this one.
    pub fn merge(&mut self, other: &PermissionSet) {
        for token in &other.permissions {
            self.permissions.insert(token.clone());
        }
    }

    /// Create from a list of token strings.
    pub fn from_strings(tokens: &[&str]) -> Self {
        tokens.iter().copied().collect()
    }

    /// Iterate the tokens (unordered).
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.permissions.iter().map(String::as_str)
    }

    /// Get the count of tokens.
    pub fn len(&self) -> usize {
        self.permissions.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }
}

impl<T: Into<String>> FromIterator<T> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = PermissionSet::new();
        set.add_all(iter);
        set
    }
}

/// Something that can be answered against a [`PermissionSet`].
///
/// A single token is granted when it is a member of the set; a collection
/// of tokens is granted when **any** of them is a member.
pub trait PermissionQuery {
    /// Decide the query against the given set.
    fn granted_by(&self, set: &PermissionSet) -> bool;
}

impl PermissionQuery for str {
    fn granted_by(&self, set: &PermissionSet) -> bool {
        set.has(self)
    }
}

impl PermissionQuery for String {
    fn granted_by(&self, set: &PermissionSet) -> bool {
        set.has(self)
    }
}

impl<T: AsRef<str>> PermissionQuery for [T] {
    fn granted_by(&self, set: &PermissionSet) -> bool {
        set.has_any(self)
    }
}

impl<T: AsRef<str>, const N: usize> PermissionQuery for [T; N] {
    fn granted_by(&self, set: &PermissionSet) -> bool {
        set.has_any(self.as_slice())
    }
}

impl<T: AsRef<str>> PermissionQuery for Vec<T> {
    fn granted_by(&self, set: &PermissionSet) -> bool {
        set.has_any(self.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_membership() {
        let set = PermissionSet::from_strings(&["view.res"]);
        assert!(set.has("view.res"));
        assert!(!set.has("view.res.restricted"));
        assert!(!set.has("view.re"));
        assert!(!set.has("VIEW.RES"));
    }

    #[test]
    fn test_duplicates_collapse() {
        let set: PermissionSet = ["a", "a", "b"].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_remove_and_merge() {
        let mut set = PermissionSet::from_strings(&["a"]);
        assert!(set.remove("a"));
        assert!(!set.remove("a"));
        assert!(set.is_empty());

        set.merge(&PermissionSet::from_strings(&["b", "c"]));
        assert_eq!(set.len(), 2);
        assert!(set.has("c"));
    }

    #[test]
    fn test_queries() {
        let set = PermissionSet::from_strings(&["create.x", "view.x"]);
        assert!("create.x".granted_by(&set));
        assert!(String::from("view.x").granted_by(&set));
        assert!(["nope", "view.x"].granted_by(&set));
        assert!(!["nope", "other"].granted_by(&set));
        assert!(!Vec::<String>::new().granted_by(&set));
    }

    #[test]
    fn test_serde_is_a_plain_list() {
        let set: PermissionSet = serde_json::from_str(r#"["a","b"]"#).unwrap();
        assert!(set.has("a"));
        assert!(set.has("b"));

        let json = serde_json::to_value(PermissionSet::from_strings(&["only"])).unwrap();
        assert_eq!(json, serde_json::json!(["only"]));
    }
}
