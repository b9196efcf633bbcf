//! The authentication seam.

use async_trait::async_trait;
use crud_acl::Actor;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::error::AuthResult;

/// What a strategy hands back after authenticating an actor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    /// Headers to set on the response
    pub headers: HashMap<String, String>,
    /// JSON body, carrying at least `bearerToken`
    pub body: Value,
}

/// An authentication strategy.
///
/// Strategies turn an already-identified actor into a bearer token and a
/// bearer token back into an actor. How the actor was identified in the
/// first place (passwords, OAuth, ...) is the caller's business.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Issue credentials for `actor`.
    async fn authenticate(&self, actor: &Actor) -> AuthResult<AuthResponse>;

    /// Resolve a bearer token to an actor.
    async fn verify(&self, token: &str) -> AuthResult<Actor>;

    /// End the session behind `token`.
    async fn logout(&self, token: &str) -> AuthResult<()>;
}
