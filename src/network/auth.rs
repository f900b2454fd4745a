//! Credential Identity
//!
//! Extracts the local player's identifier from the bearer token the server
//! issued. The client does not own the token format: it reads the claims
//! segment of a compact JWT and tries a list of known claim names.
//!
//! When a key is configured the token is also validated with `jsonwebtoken`
//! (signature, issuer, audience, expiry) before its claims are trusted.

use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use jsonwebtoken::{decode, Algorithm, DecodingKey, TokenData, Validation};
use serde_json::Value;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::debug;

use crate::game::state::PlayerId;

/// Claim names tried in order; the first present value wins.
pub const DEFAULT_IDENTITY_CLAIMS: &[&str] = &["userId", "sub", "id", "_id"];

/// Decoded claims object.
pub type Claims = serde_json::Map<String, Value>;

/// Verification configuration.
#[derive(Clone, Debug, Default)]
pub struct AuthConfig {
    /// Expected issuer claim ("iss"). If None, any issuer accepted.
    pub issuer: Option<String>,
    /// Expected audience claim ("aud"). If None, any audience accepted.
    pub audience: Option<String>,
    /// RS256 public key in PEM format.
    pub public_key_pem: Option<String>,
    /// HS256 secret.
    pub secret: Option<String>,
    /// Whether to skip expiry validation (for testing only).
    pub skip_expiry: bool,
}

impl AuthConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            issuer: std::env::var("AUTH_ISSUER").ok(),
            audience: std::env::var("AUTH_AUDIENCE").ok(),
            public_key_pem: std::env::var("AUTH_PUBLIC_KEY_PEM").ok(),
            secret: std::env::var("AUTH_SECRET").ok(),
            skip_expiry: std::env::var("AUTH_SKIP_EXPIRY")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        }
    }

    /// Check if a verification key is configured.
    pub fn is_configured(&self) -> bool {
        self.public_key_pem.is_some() || self.secret.is_some()
    }
}

/// Authentication errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No credential available.
    #[error("no credential available")]
    MissingCredential,
    /// Token format is invalid.
    #[error("invalid token format")]
    InvalidFormat,
    /// Token signature verification failed.
    #[error("invalid signature")]
    InvalidSignature,
    /// Token has expired.
    #[error("token expired")]
    Expired,
    /// Issuer claim doesn't match expected value.
    #[error("invalid issuer")]
    InvalidIssuer,
    /// Audience claim doesn't match expected value.
    #[error("invalid audience")]
    InvalidAudience,
    /// None of the identity claims is present.
    #[error("missing identity claim (tried {0})")]
    MissingClaim(String),
    /// Server refused the credential.
    #[error("credential rejected by server (status {0})")]
    Rejected(u16),
    /// Decoding error.
    #[error("decode error: {0}")]
    DecodeError(String),
}

/// Resolves the local player identity from a credential.
#[derive(Clone, Debug)]
pub struct IdentityResolver {
    claim_names: Vec<String>,
    verification: Option<AuthConfig>,
}

impl Default for IdentityResolver {
    fn default() -> Self {
        Self::with_claims(DEFAULT_IDENTITY_CLAIMS.iter().copied())
    }
}

impl IdentityResolver {
    /// Resolver with the default claim priority.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolver with a custom claim priority.
    pub fn with_claims<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            claim_names: names.into_iter().map(Into::into).collect(),
            verification: None,
        }
    }

    /// Validate tokens before reading claims. Ignored when no key is set.
    #[must_use]
    pub fn with_verification(mut self, config: AuthConfig) -> Self {
        self.verification = config.is_configured().then_some(config);
        self
    }

    /// Claim names in priority order.
    pub fn claim_names(&self) -> &[String] {
        &self.claim_names
    }

    /// Resolve the player identity. Any failure means "role unknown".
    pub fn resolve(&self, credential: &str) -> Option<PlayerId> {
        match self.identify(credential) {
            Ok(id) => Some(id),
            Err(e) => {
                debug!(error = %e, "could not resolve identity from credential");
                None
            }
        }
    }

    /// Resolve the player identity, keeping the failure reason.
    pub fn identify(&self, credential: &str) -> Result<PlayerId, AuthError> {
        let claims = self.claims(credential)?;
        self.subject(&claims)
    }

    /// Decode (and, if configured, verify) the claims object.
    pub fn claims(&self, credential: &str) -> Result<Claims, AuthError> {
        let credential = credential.trim();
        if credential.is_empty() {
            return Err(AuthError::MissingCredential);
        }
        match &self.verification {
            Some(config) => verify_token(credential, config),
            None => decode_claims(credential),
        }
    }

    /// Pick the identity out of a claims object.
    pub fn subject(&self, claims: &Claims) -> Result<PlayerId, AuthError> {
        self.claim_names
            .iter()
            .filter_map(|name| claims.get(name))
            .find_map(claim_text)
            .map(PlayerId::new)
            .ok_or_else(|| AuthError::MissingClaim(self.claim_names.join(", ")))
    }
}

/// Render a claim value as identifier text. Blank strings don't count.
fn claim_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Decode the claims segment without checking the signature.
fn decode_claims(token: &str) -> Result<Claims, AuthError> {
    let mut segments = token.split('.');
    let payload = match (segments.next(), segments.next()) {
        (Some(_header), Some(payload)) if !payload.is_empty() => payload,
        _ => return Err(AuthError::InvalidFormat),
    };

    let bytes = decode_segment(payload)?;
    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(claims)) => Ok(claims),
        Ok(_) => Err(AuthError::InvalidFormat),
        Err(e) => Err(AuthError::DecodeError(e.to_string())),
    }
}

/// Base64 segment, URL-safe or standard alphabet, padding optional.
fn decode_segment(segment: &str) -> Result<Vec<u8>, AuthError> {
    let trimmed = segment.trim_end_matches('=');
    URL_SAFE_NO_PAD
        .decode(trimmed)
        .or_else(|_| STANDARD_NO_PAD.decode(trimmed))
        .map_err(|_| AuthError::InvalidFormat)
}

/// Validate a JWT and extract its claims.
fn verify_token(token: &str, config: &AuthConfig) -> Result<Claims, AuthError> {
    let algorithm = if config.public_key_pem.is_some() {
        Algorithm::RS256
    } else {
        Algorithm::HS256
    };

    let mut validation = Validation::new(algorithm);
    validation.required_spec_claims = std::collections::HashSet::new();

    if let Some(ref issuer) = config.issuer {
        validation.set_issuer(&[issuer]);
    }
    if let Some(ref audience) = config.audience {
        validation.set_audience(&[audience]);
    } else {
        validation.validate_aud = false;
    }
    if config.skip_expiry {
        validation.validate_exp = false;
    }

    let token_data: TokenData<Claims> = if let Some(ref pem) = config.public_key_pem {
        let key = DecodingKey::from_rsa_pem(pem.as_bytes())
            .map_err(|e| AuthError::DecodeError(format!("invalid public key: {}", e)))?;
        decode(token, &key, &validation).map_err(map_jwt_error)?
    } else if let Some(ref secret) = config.secret {
        let key = DecodingKey::from_secret(secret.as_bytes());
        decode(token, &key, &validation).map_err(map_jwt_error)?
    } else {
        return decode_claims(token);
    };

    let claims = token_data.claims;

    // The library tolerates leeway; we don't.
    if !config.skip_expiry {
        if let Some(exp) = claims.get("exp").and_then(Value::as_u64) {
            let now = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs();
            if exp > 0 && now > exp {
                return Err(AuthError::Expired);
            }
        }
    }

    Ok(claims)
}

/// Map JWT library errors to our error type.
fn map_jwt_error(err: jsonwebtoken::errors::Error) -> AuthError {
    use jsonwebtoken::errors::ErrorKind;
    match err.kind() {
        ErrorKind::ExpiredSignature => AuthError::Expired,
        ErrorKind::InvalidSignature => AuthError::InvalidSignature,
        ErrorKind::InvalidIssuer => AuthError::InvalidIssuer,
        ErrorKind::InvalidAudience => AuthError::InvalidAudience,
        ErrorKind::InvalidToken | ErrorKind::Base64(_) => AuthError::InvalidFormat,
        _ => AuthError::DecodeError(err.to_string()),
    }
}

// =============================================================================
// TESTS
// =============================================================================
