//! Permission oracle.

use crate::actor::Actor;
use crate::permissions::PermissionQuery;

/// Decide whether `actor` holds the queried permission.
///
/// - An absent actor, or one without a permission set, is denied.
/// - A single token is granted by literal membership.
/// - A list of tokens is granted if any one of them is held.
/// - An [`unrestricted`](Actor::unrestricted) actor is always granted.
///
/// # Example
///
/// ```
/// use crud_acl::{mayi, Actor};
///
/// let actor = Actor::with_permissions(["create.x"]);
/// assert!(mayi(Some(&actor), "create.x"));
/// assert!(mayi(Some(&actor), &["view.x", "create.x"]));
/// assert!(!mayi(Some(&Actor::with_permissions(Vec::<String>::new())), "create.x"));
/// assert!(!mayi(None, "create.x"));
/// ```
pub fn mayi<Q: PermissionQuery + ?Sized>(actor: Option<&Actor>, query: &Q) -> bool {
    match actor {
        Some(actor) => actor.may(query),
        None => false,
    }
}
