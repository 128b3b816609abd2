//! JWT token generation and validation
//!
//! Implements JWT-based authentication with HMAC-SHA256 signing.
//! Two kinds of token are issued at signin: a short-lived access token that
//! gates every protected request, and a longer-lived refresh token that can
//! only be exchanged for a new access token. Neither is stored server-side.

use carebook_core::AuthConfig;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use uuid::Uuid;

/// Token kind, carried in the `token_type` claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT Claims structure containing user information
///
/// These claims are embedded in both token kinds and extracted during validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Token issuer
    pub iss: String,
    /// Subject - user ID
    pub sub: String,
    /// JWT ID - unique per token
    pub jti: String,
    /// Issued at timestamp (Unix epoch)
    pub iat: u64,
    /// Expiration timestamp (Unix epoch)
    pub exp: u64,
    /// User's display name
    pub name: String,
    /// User's email address
    pub email: String,
    /// Access or refresh
    pub token_type: TokenType,
}

/// JWT token generation and validation errors
///
/// The display text of each variant is what clients see when the token is rejected.
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Failed to encode JWT: {0}")]
    EncodingError(#[from] jsonwebtoken::errors::Error),

    #[error("Invalid token format")]
    InvalidToken,

    #[error("Token has expired")]
    ExpiredToken,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Invalid token issuer")]
    InvalidIssuer,

    #[error("Invalid token type")]
    WrongTokenType,

    #[error("System time error: {0}")]
    SystemTimeError(#[from] std::time::SystemTimeError),
}

/// JWT Configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret key for HMAC signing
    pub secret: String,
    /// Access token lifetime in seconds
    pub access_expiration_secs: u64,
    /// Refresh token lifetime in seconds
    pub refresh_expiration_secs: u64,
    /// Token issuer identifier
    pub issuer: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self::from(&AuthConfig::default())
    }
}

impl From<&AuthConfig> for JwtConfig {
    fn from(auth: &AuthConfig) -> Self {
        Self {
            secret: auth.jwt_secret.clone(),
            access_expiration_secs: auth.access_token_ttl_secs,
            refresh_expiration_secs: auth.refresh_token_ttl_secs,
            issuer: auth.jwt_issuer.clone(),
        }
    }
}

impl JwtConfig {
    fn lifetime(&self, kind: TokenType) -> u64 {
        match kind {
            TokenType::Access => self.access_expiration_secs,
            TokenType::Refresh => self.refresh_expiration_secs,
        }
    }
}

/// Identity embedded in issued tokens
#[derive(Debug, Clone, Copy)]
pub struct TokenSubject<'a> {
    pub user_id: &'a str,
    pub name: &'a str,
    pub email: &'a str,
}

/// Freshly minted access/refresh pair
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Sign a token of the given kind for a user
///
/// Every call produces a distinct token: `jti` is a fresh UUID.
///
/// # Example
///
/// ```no_run
/// use carebook_api::auth::jwt::{generate_token, JwtConfig, TokenSubject, TokenType};
///
/// let config = JwtConfig::default();
/// let subject = TokenSubject {
///     user_id: "12345",
///     name: "John Doe",
///     email: "johndoe@example.com",
/// };
/// let token = generate_token(&config, subject, TokenType::Access)
///     .expect("Failed to generate token");
/// ```
pub fn generate_token(
    config: &JwtConfig,
    subject: TokenSubject<'_>,
    kind: TokenType,
) -> Result<String, JwtError> {
    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();

    let claims = Claims {
        iss: config.issuer.clone(),
        sub: subject.user_id.to_string(),
        jti: Uuid::new_v4().to_string(),
        iat: now,
        exp: now + config.lifetime(kind),
        name: subject.name.to_string(),
        email: subject.email.to_string(),
        token_type: kind,
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )?;

    Ok(token)
}

/// Sign an access token and a refresh token for the same user
pub fn generate_token_pair(
    config: &JwtConfig,
    subject: TokenSubject<'_>,
) -> Result<TokenPair, JwtError> {
    Ok(TokenPair {
        access_token: generate_token(config, subject, TokenType::Access)?,
        refresh_token: generate_token(config, subject, TokenType::Refresh)?,
    })
}

/// Validate a token and extract claims
///
/// Checks signature, issuer and expiry, then that the token is of the
/// expected kind. A refresh token is never accepted where an access token is
/// required, and vice versa.
pub fn validate_token(
    config: &JwtConfig,
    token: &str,
    expected: TokenType,
) -> Result<Claims, JwtError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[&config.issuer]);
    // Expiry is exact; no clock tolerance
    validation.leeway = 0;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::ExpiredToken,
        jsonwebtoken::errors::ErrorKind::InvalidSignature => JwtError::InvalidSignature,
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => JwtError::InvalidIssuer,
        _ => JwtError::InvalidToken,
    })?;

    if token_data.claims.token_type != expected {
        return Err(JwtError::WrongTokenType);
    }

    Ok(token_data.claims)
}

/// Validate an access token
pub fn validate_access_token(config: &JwtConfig, token: &str) -> Result<Claims, JwtError> {
    validate_token(config, token, TokenType::Access)
}

/// Validate a refresh token
pub fn validate_refresh_token(config: &JwtConfig, token: &str) -> Result<Claims, JwtError> {
    validate_token(config, token, TokenType::Refresh)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subject() -> TokenSubject<'static> {
        TokenSubject {
            user_id: "12345",
            name: "John Doe",
            email: "johndoe@example.com",
        }
    }

    fn encode_claims(config: &JwtConfig, claims: &Claims) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_generate_and_validate_access_token() {
        let config = JwtConfig::default();

        let token = generate_token(&config, subject(), TokenType::Access)
            .expect("Failed to generate token");

        let claims = validate_access_token(&config, &token).expect("Failed to validate token");

        assert_eq!(claims.sub, "12345");
        assert_eq!(claims.name, "John Doe");
        assert_eq!(claims.email, "johndoe@example.com");
        assert_eq!(claims.iss, "carebook-api");
        assert_eq!(claims.token_type, TokenType::Access);
        assert_eq!(claims.exp - claims.iat, config.access_expiration_secs);
    }

    #[test]
    fn test_token_pair_is_distinct() {
        let config = JwtConfig::default();
        let pair = generate_token_pair(&config, subject()).unwrap();

        assert_ne!(pair.access_token, pair.refresh_token);

        let access = validate_access_token(&config, &pair.access_token).unwrap();
        let refresh = validate_refresh_token(&config, &pair.refresh_token).unwrap();
        assert_ne!(access.jti, refresh.jti);
        assert!(refresh.exp > access.exp);
    }

    #[test]
    fn test_token_type_is_enforced() {
        let config = JwtConfig::default();
        let pair = generate_token_pair(&config, subject()).unwrap();

        assert!(matches!(
            validate_access_token(&config, &pair.refresh_token),
            Err(JwtError::WrongTokenType)
        ));
        assert!(matches!(
            validate_refresh_token(&config, &pair.access_token),
            Err(JwtError::WrongTokenType)
        ));
    }

    #[test]
    fn test_invalid_token() {
        let config = JwtConfig::default();
        let result = validate_access_token(&config, "invalid.token.here");
        assert!(matches!(result, Err(JwtError::InvalidToken)));
    }

    #[test]
    fn test_wrong_secret() {
        let config1 = JwtConfig {
            secret: "secret1".to_string(),
            ..Default::default()
        };
        let config2 = JwtConfig {
            secret: "secret2".to_string(),
            ..Default::default()
        };

        let token = generate_token(&config1, subject(), TokenType::Access).unwrap();

        let result = validate_access_token(&config2, &token);
        assert!(matches!(result, Err(JwtError::InvalidSignature)));
    }

    #[test]
    fn test_wrong_issuer() {
        let issuer_a = JwtConfig {
            issuer: "someone-else".to_string(),
            ..Default::default()
        };
        let token = generate_token(&issuer_a, subject(), TokenType::Access).unwrap();

        let result = validate_access_token(&JwtConfig::default(), &token);
        assert!(matches!(result, Err(JwtError::InvalidIssuer)));
    }

    #[test]
    fn test_expired_token() {
        let config = JwtConfig::default();
        let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs();

        // Expired 1 hour ago
        let claims = Claims {
            iss: config.issuer.clone(),
            sub: "12345".to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now - 7200,
            exp: now - 3600,
            name: "John Doe".to_string(),
            email: "johndoe@example.com".to_string(),
            token_type: TokenType::Access,
        };

        let token = encode_claims(&config, &claims);

        let result = validate_access_token(&config, &token);
        assert!(matches!(result, Err(JwtError::ExpiredToken)));
    }

    #[test]
    fn test_token_expired_moments_ago_is_rejected() {
        let config = JwtConfig::default();
        let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs();

        for token_type in [TokenType::Access, TokenType::Refresh] {
            let claims = Claims {
                iss: config.issuer.clone(),
                sub: "12345".to_string(),
                jti: Uuid::new_v4().to_string(),
                iat: now - 60,
                exp: now - 1,
                name: "John Doe".to_string(),
                email: "johndoe@example.com".to_string(),
                token_type,
            };

            let token = encode_claims(&config, &claims);

            let result = validate_token(&config, &token, token_type);
            assert!(matches!(result, Err(JwtError::ExpiredToken)));
        }
    }

    #[test]
    fn test_config_from_auth_config() {
        let auth = AuthConfig {
            jwt_secret: "s3cret".to_string(),
            access_token_ttl_secs: 60,
            refresh_token_ttl_secs: 600,
            ..Default::default()
        };
        let config = JwtConfig::from(&auth);

        assert_eq!(config.secret, "s3cret");
        assert_eq!(config.lifetime(TokenType::Access), 60);
        assert_eq!(config.lifetime(TokenType::Refresh), 600);
    }
}
