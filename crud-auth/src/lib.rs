//! # CRUD Auth
//!
//! Authentication strategies that turn bearer tokens into [`crud_acl::Actor`]s.
//!
//! ## Overview
//!
//! The crud-auth crate handles:
//! - **Authenticator**: The strategy trait (`authenticate`, `verify`, `logout`)
//! - **JWT**: Actor identity, permissions and scope signed into a JWT
//! - **None**: Authentication switched off, behind a confirmation phrase
//!
//! ## Feature Flags
//!
//! - `jwt` (default): JWT strategy
//!
//! ## Usage
//!
//! ```rust
//! use crud_acl::Actor;
//! use crud_auth::{Authenticator, JwtAuth};
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let auth = JwtAuth::with_secret("a-long-enough-secret-for-hmac-signing").unwrap();
//! let response = auth
//!     .authenticate(&Actor::with_permissions(["view.post"]))
//!     .await
//!     .unwrap();
//!
//! let token = response.body["bearerToken"].as_str().unwrap();
//! let actor = auth.verify(token).await.unwrap();
//! assert!(actor.may("view.post"));
//! # });
//! ```

pub mod authenticator;
pub mod error;
#[cfg(feature = "jwt")]
pub mod jwt;
pub mod none;

// Re-export main types for convenience
pub use authenticator::{AuthResponse, Authenticator};
pub use error::{AuthError, AuthResult};
#[cfg(feature = "jwt")]
pub use jwt::{ActorClaims, JwtAlgorithm, JwtAuth, JwtConfig};
pub use none::{NoneAuth, CONFIRMATION_PHRASE, NONE_TOKEN};
