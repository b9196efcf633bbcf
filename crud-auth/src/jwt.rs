//! JWT authentication
//!
//! Signs the actor's identity, permission tokens and scope into a JWT and
//! reads them back on verification. HMAC (HS256/384/512), RSA (RS256/384/512)
//! and EC (ES256/384) keys are supported.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use crud_acl::{Actor, PermissionSet};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::authenticator::{AuthResponse, Authenticator};
use crate::error::{AuthError, AuthResult};

/// JWT configuration for token generation and validation.
#[derive(Clone)]
pub struct JwtConfig {
    /// Secret key for HMAC algorithms
    pub secret: Option<String>,

    /// Private key (PEM) for RSA/EC algorithms
    pub private_key: Option<String>,

    /// Public key (PEM) for RSA/EC algorithms
    pub public_key: Option<String>,

    /// Algorithm to use
    pub algorithm: JwtAlgorithm,

    /// Issuer to stamp and require. `None` skips the check.
    pub issuer: Option<String>,

    /// Audience to stamp and require. Empty skips the check.
    pub audience: Vec<String>,

    /// Lifetime of issued tokens
    pub token_duration: Duration,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: None,
            private_key: None,
            public_key: None,
            algorithm: JwtAlgorithm::HS256,
            issuer: None,
            audience: Vec::new(),
            token_duration: Duration::hours(1),
        }
    }
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("JwtConfig")
            .field("secret", &redact(&self.secret))
            .field("private_key", &redact(&self.private_key))
            .field("public_key", &self.public_key.is_some())
            .field("algorithm", &self.algorithm)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("token_duration", &self.token_duration)
            .finish()
    }
}

impl JwtConfig {
    /// HS256 configuration around `secret`.
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            secret: Some(secret.into()),
            ..Default::default()
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `CRUD_JWT_SECRET`: HMAC secret (required)
    /// - `CRUD_JWT_ISSUER`: Issuer to stamp and require
    /// - `CRUD_JWT_TTL_SECS`: Token lifetime in seconds (default: 3600)
    pub fn from_env() -> AuthResult<Self> {
        let secret = std::env::var("CRUD_JWT_SECRET")
            .map_err(|_| AuthError::ConfigError("CRUD_JWT_SECRET is not set".to_string()))?;

        let mut config = Self::with_secret(secret);
        config.issuer = std::env::var("CRUD_JWT_ISSUER").ok();

        if let Ok(ttl) = std::env::var("CRUD_JWT_TTL_SECS") {
            let secs: i64 = ttl.parse().map_err(|_| {
                AuthError::ConfigError(format!("CRUD_JWT_TTL_SECS must be an integer, got {:?}", ttl))
            })?;
            config.token_duration = Duration::seconds(secs);
        }

        Ok(config)
    }

    /// Set the issuer.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Add an audience.
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience.push(audience.into());
        self
    }

    /// Set the token lifetime.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.token_duration = duration;
        self
    }
}

/// Supported JWT algorithms.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum JwtAlgorithm {
    /// HMAC using SHA-256
    HS256,
    /// HMAC using SHA-384
    HS384,
    /// HMAC using SHA-512
    HS512,
    /// RSASSA-PKCS1-v1_5 using SHA-256
    RS256,
    /// RSASSA-PKCS1-v1_5 using SHA-384
    RS384,
    /// RSASSA-PKCS1-v1_5 using SHA-512
    RS512,
    /// ECDSA using P-256 and SHA-256
    ES256,
    /// ECDSA using P-384 and SHA-384
    ES384,
}

impl From<JwtAlgorithm> for Algorithm {
    fn from(alg: JwtAlgorithm) -> Self {
        match alg {
            JwtAlgorithm::HS256 => Algorithm::HS256,
            JwtAlgorithm::HS384 => Algorithm::HS384,
            JwtAlgorithm::HS512 => Algorithm::HS512,
            JwtAlgorithm::RS256 => Algorithm::RS256,
            JwtAlgorithm::RS384 => Algorithm::RS384,
            JwtAlgorithm::RS512 => Algorithm::RS512,
            JwtAlgorithm::ES256 => Algorithm::ES256,
            JwtAlgorithm::ES384 => Algorithm::ES384,
        }
    }
}

/// Claims carried by an actor token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorClaims {
    /// Actor id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Issuer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Audience
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aud: Vec<String>,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Unique token id
    pub jti: String,

    /// Permission tokens; absent for a permission-less actor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<PermissionSet>,

    /// Actor scope
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<Value>,
}

impl ActorClaims {
    /// Claims for `actor` as configured by `config`.
    pub fn new(actor: &Actor, config: &JwtConfig) -> Self {
        let now = Utc::now();
        Self {
            sub: actor.id.clone(),
            iss: config.issuer.clone(),
            aud: config.audience.clone(),
            exp: (now + config.token_duration).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::now_v7().to_string(),
            permissions: actor.permissions.clone(),
            scope: actor.scope.clone(),
        }
    }

    /// Rebuild the actor. Tokens never grant `unrestricted`.
    pub fn into_actor(self) -> Actor {
        let mut actor = Actor::anonymous();
        actor.id = self.sub;
        actor.permissions = self.permissions;
        actor.scope = self.scope;
        actor
    }
}

fn pem<'a>(key: &'a Option<String>, which: &str, family: &str) -> AuthResult<&'a str> {
    key.as_deref()
        .ok_or_else(|| AuthError::ConfigError(format!("{} key required for {}", which, family)))
}

fn strip_bearer(token: &str) -> &str {
    match token.get(..7) {
        Some(prefix) if prefix.eq_ignore_ascii_case("bearer ") => &token[7..],
        _ => token,
    }
}

/// JWT authentication strategy.
pub struct JwtAuth {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl fmt::Debug for JwtAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtAuth")
            .field("config", &self.config)
            .field("encoding_key", &"[REDACTED]")
            .field("decoding_key", &"[REDACTED]")
            .finish()
    }
}

impl JwtAuth {
    /// Create the strategy, loading the keys `config` names.
    pub fn new(config: JwtConfig) -> AuthResult<Self> {
        let (encoding_key, decoding_key) = Self::keys(&config)?;
        Ok(Self {
            config,
            encoding_key,
            decoding_key,
        })
    }

    /// HS256 strategy around `secret`.
    pub fn with_secret(secret: impl Into<String>) -> AuthResult<Self> {
        Self::new(JwtConfig::with_secret(secret))
    }

    /// Get the configuration.
    pub fn config(&self) -> &JwtConfig {
        &self.config
    }

    fn keys(config: &JwtConfig) -> AuthResult<(EncodingKey, DecodingKey)> {
        let invalid = |family: &str, e: jsonwebtoken::errors::Error| {
            AuthError::ConfigError(format!("Invalid {} key: {}", family, e))
        };

        match config.algorithm {
            JwtAlgorithm::HS256 | JwtAlgorithm::HS384 | JwtAlgorithm::HS512 => {
                let secret = config
                    .secret
                    .as_deref()
                    .filter(|s| !s.is_empty())
                    .ok_or_else(|| AuthError::ConfigError("Secret required for HMAC".to_string()))?;
                Ok((
                    EncodingKey::from_secret(secret.as_bytes()),
                    DecodingKey::from_secret(secret.as_bytes()),
                ))
            }
            JwtAlgorithm::RS256 | JwtAlgorithm::RS384 | JwtAlgorithm::RS512 => {
                let private = pem(&config.private_key, "Private", "RSA")?;
                let public = pem(&config.public_key, "Public", "RSA")?;
                Ok((
                    EncodingKey::from_rsa_pem(private.as_bytes()).map_err(|e| invalid("RSA", e))?,
                    DecodingKey::from_rsa_pem(public.as_bytes()).map_err(|e| invalid("RSA", e))?,
                ))
            }
            JwtAlgorithm::ES256 | JwtAlgorithm::ES384 => {
                let private = pem(&config.private_key, "Private", "EC")?;
                let public = pem(&config.public_key, "Public", "EC")?;
                Ok((
                    EncodingKey::from_ec_pem(private.as_bytes()).map_err(|e| invalid("EC", e))?,
                    DecodingKey::from_ec_pem(public.as_bytes()).map_err(|e| invalid("EC", e))?,
                ))
            }
        }
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(self.config.algorithm.into());
        if let Some(issuer) = &self.config.issuer {
            validation.set_issuer(&[issuer]);
        }
        if self.config.audience.is_empty() {
            validation.validate_aud = false;
        } else {
            validation.set_audience(&self.config.audience);
        }
        validation
    }

    /// Sign `claims` into a token.
    pub fn encode_claims(&self, claims: &ActorClaims) -> AuthResult<String> {
        let header = Header::new(self.config.algorithm.into());
        encode(&header, claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("Token encoding failed: {}", e)))
    }

    /// Validate and decode a token, with or without the `Bearer ` prefix.
    pub fn decode_claims(&self, token: &str) -> AuthResult<ActorClaims> {
        decode::<ActorClaims>(strip_bearer(token), &self.decoding_key, &self.validation())
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(error = %e, "JWT verification failed");
                match e.kind() {
                    ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                    ErrorKind::InvalidToken => AuthError::InvalidToken("Malformed token".to_string()),
                    ErrorKind::InvalidSignature => {
                        AuthError::InvalidToken("Invalid signature".to_string())
                    }
                    ErrorKind::InvalidIssuer => AuthError::InvalidToken("Invalid issuer".to_string()),
                    ErrorKind::InvalidAudience => {
                        AuthError::InvalidToken("Invalid audience".to_string())
                    }
                    _ => AuthError::InvalidToken(e.to_string()),
                }
            })
    }
}

#[async_trait]
impl Authenticator for JwtAuth {
    #[instrument(skip_all, fields(actor = ?actor.id))]
    async fn authenticate(&self, actor: &Actor) -> AuthResult<AuthResponse> {
        if actor.is_unrestricted() {
            warn!("Unrestricted access is not carried by JWT tokens");
        }

        let token = self.encode_claims(&ActorClaims::new(actor, &self.config))?;
        Ok(AuthResponse {
            headers: HashMap::new(),
            body: json!({
                "jwtToken": token,
                "bearerToken": format!("Bearer {}", token),
            }),
        })
    }

    async fn verify(&self, token: &str) -> AuthResult<Actor> {
        Ok(self.decode_claims(token)?.into_actor())
    }

    async fn logout(&self, _token: &str) -> AuthResult<()> {
        Err(AuthError::LogoutUnsupported("JWT"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_secret() -> String {
        "test-secret-key-for-jwt-signing-minimum-32-chars".to_string()
    }

    fn bearer(response: &AuthResponse) -> &str {
        response.body["bearerToken"].as_str().unwrap()
    }

    #[tokio::test]
    async fn test_round_trip_carries_identity() {
        let auth = JwtAuth::with_secret(test_secret()).unwrap();
        let actor = Actor::with_permissions(["view.post", "create.post"])
            .with_id("u-1")
            .with_scope(json!({"org": 7}));

        let response = auth.authenticate(&actor).await.unwrap();
        let token = response.body["jwtToken"].as_str().unwrap();
        assert_eq!(bearer(&response), format!("Bearer {}", token));

        let verified = auth.verify(bearer(&response)).await.unwrap();
        assert_eq!(verified, actor);

        // Prefix is optional and case-insensitive
        assert_eq!(auth.verify(token).await.unwrap(), actor);
        let lower = format!("bearer {}", token);
        assert_eq!(auth.verify(&lower).await.unwrap(), actor);
    }

    #[tokio::test]
    async fn test_unrestricted_not_carried() {
        let auth = JwtAuth::with_secret(test_secret()).unwrap();
        let response = auth.authenticate(&Actor::unrestricted()).await.unwrap();
        let verified = auth.verify(bearer(&response)).await.unwrap();

        assert!(!verified.is_unrestricted());
        assert!(!verified.may("delete.post"));
    }

    #[tokio::test]
    async fn test_expired_token() {
        let config = JwtConfig::with_secret(test_secret()).with_duration(Duration::hours(-1));
        let auth = JwtAuth::new(config).unwrap();
        let response = auth.authenticate(&Actor::anonymous()).await.unwrap();

        let err = auth.verify(bearer(&response)).await.unwrap_err();
        assert!(matches!(err, AuthError::TokenExpired));
        assert_eq!(err.status_code(), 401);
        assert_eq!(err.body(), json!({"message": "Session invalid or expires"}));
    }

    #[tokio::test]
    async fn test_rejects_foreign_and_malformed_tokens() {
        let auth = JwtAuth::with_secret(test_secret()).unwrap();
        let other = JwtAuth::with_secret("another-secret-key-of-reasonable-length").unwrap();
        let response = other.authenticate(&Actor::anonymous()).await.unwrap();

        let err = auth.verify(bearer(&response)).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken(ref m) if m == "Invalid signature"));

        let err = auth.verify("invalid-token").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken(_)));
    }

    #[tokio::test]
    async fn test_issuer_and_audience_checked() {
        let config = JwtConfig::with_secret(test_secret())
            .with_issuer("crud")
            .with_audience("admin-ui");
        let auth = JwtAuth::new(config.clone()).unwrap();
        let response = auth.authenticate(&Actor::anonymous()).await.unwrap();
        assert!(auth.verify(bearer(&response)).await.is_ok());

        let strict = JwtAuth::new(config.clone().with_issuer("elsewhere")).unwrap();
        let err = strict.verify(bearer(&response)).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken(ref m) if m == "Invalid issuer"));

        let mut other_audience = config;
        other_audience.audience = vec!["public-api".to_string()];
        let strict = JwtAuth::new(other_audience).unwrap();
        let err = strict.verify(bearer(&response)).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken(ref m) if m == "Invalid audience"));
    }

    #[tokio::test]
    async fn test_logout_unsupported() {
        let auth = JwtAuth::with_secret(test_secret()).unwrap();
        let err = auth.logout("whatever").await.unwrap_err();
        assert_eq!(err.status_code(), 403);
        assert_eq!(err.body(), json!({"message": "Logout failed"}));
    }

    #[test]
    fn test_key_configuration() {
        let err = JwtAuth::new(JwtConfig::default()).unwrap_err();
        assert!(matches!(err, AuthError::ConfigError(_)));

        let config = JwtConfig {
            algorithm: JwtAlgorithm::RS256,
            ..JwtConfig::with_secret(test_secret())
        };
        let err = JwtAuth::new(config).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration error: Private key required for RSA"
        );
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let auth = JwtAuth::with_secret(test_secret()).unwrap();
        let debug = format!("{:?}", auth);
        assert!(!debug.contains(&test_secret()));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_from_env() {
        std::env::set_var("CRUD_JWT_SECRET", "env-secret");
        std::env::set_var("CRUD_JWT_ISSUER", "crud-env");
        std::env::set_var("CRUD_JWT_TTL_SECS", "120");

        let config = JwtConfig::from_env().unwrap();
        assert_eq!(config.secret.as_deref(), Some("env-secret"));
        assert_eq!(config.issuer.as_deref(), Some("crud-env"));
        assert_eq!(config.token_duration, Duration::seconds(120));

        std::env::set_var("CRUD_JWT_TTL_SECS", "two minutes");
        assert!(JwtConfig::from_env().is_err());

        std::env::remove_var("CRUD_JWT_SECRET");
        std::env::remove_var("CRUD_JWT_ISSUER");
        std::env::remove_var("CRUD_JWT_TTL_SECS");
        assert!(JwtConfig::from_env().is_err());
    }
}
