//! Authentication switched off
//!
//! [`NoneAuth`] hands out the bearer token `none` and resolves every token
//! to the same actor. That actor is unrestricted only when the strategy was
//! built with [`CONFIRMATION_PHRASE`] verbatim; any other phrase yields a
//! permission-less actor, so a typo locks everything down instead of
//! opening it up.

use async_trait::async_trait;
use crud_acl::{Actor, PermissionSet};
use serde_json::json;
use std::collections::HashMap;
use tracing::warn;

use crate::authenticator::{AuthResponse, Authenticator};
use crate::error::{AuthError, AuthResult};

/// Phrase that must be passed to [`NoneAuth::new`] to disable checks.
pub const CONFIRMATION_PHRASE: &str = "I allow this guy to do what ever he want!!";

/// Bearer token issued by [`NoneAuth`].
pub const NONE_TOKEN: &str = "none";

/// Strategy that performs no authentication.
///
/// # Example
///
/// ```
/// use crud_auth::{Authenticator, NoneAuth, CONFIRMATION_PHRASE};
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let auth = NoneAuth::new(CONFIRMATION_PHRASE);
/// let actor = auth.verify("none").await.unwrap();
/// assert!(actor.may("delete.anything"));
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct NoneAuth {
    enabled: bool,
}

impl NoneAuth {
    /// Create the strategy. Only [`CONFIRMATION_PHRASE`] lifts restrictions.
    pub fn new(phrase: &str) -> Self {
        let enabled = phrase == CONFIRMATION_PHRASE;
        if enabled {
            warn!("Authentication disabled: every request runs unrestricted");
        }
        Self { enabled }
    }

    /// Whether verified actors are unrestricted.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

#[async_trait]
impl Authenticator for NoneAuth {
    async fn authenticate(&self, _actor: &Actor) -> AuthResult<AuthResponse> {
        Ok(AuthResponse {
            headers: HashMap::new(),
            body: json!({ "bearerToken": NONE_TOKEN }),
        })
    }

    async fn verify(&self, _token: &str) -> AuthResult<Actor> {
        if self.enabled {
            Ok(Actor::unrestricted())
        } else {
            let mut actor = Actor::anonymous();
            actor.permissions = Some(PermissionSet::new());
            Ok(actor)
        }
    }

    async fn logout(&self, _token: &str) -> AuthResult<()> {
        Err(AuthError::LogoutUnsupported("none"))
    }
}
