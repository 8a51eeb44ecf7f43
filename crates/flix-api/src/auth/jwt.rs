//! JWT token issuance and verification
//!
//! Implements stateless bearer tokens signed with HMAC-SHA256.
//! Tokens carry only the username and validity window; nothing is
//! stored server-side, so a token stays valid until it expires.

use flix_core::AuthConfig;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// JWT Claims structure
///
/// The identity claim embedded in every token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Token issuer
    pub iss: String,
    /// Subject - the username
    pub sub: String,
    /// Issued at timestamp (Unix epoch)
    pub iat: u64,
    /// Expiration timestamp (Unix epoch)
    pub exp: u64,
}

/// JWT token issuance and verification errors
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

    #[error("Token lifetime of {0} seconds overflows the expiry timestamp")]
    TtlOverflow(u64),

    #[error("System time error: {0}")]
    SystemTimeError(#[from] std::time::SystemTimeError),
}

/// JWT Configuration
///
/// Built once at startup from [`AuthConfig`] and shared read-only.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret key for HMAC signing
    pub secret: String,
    /// Token lifetime in seconds
    pub ttl_secs: u64,
    /// Token issuer identifier
    pub issuer: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self::from(&AuthConfig::default())
    }
}

impl From<&AuthConfig> for JwtConfig {
    fn from(config: &AuthConfig) -> Self {
        Self {
            secret: config.jwt_secret.clone(),
            ttl_secs: config.token_ttl_secs,
            issuer: config.jwt_issuer.clone(),
        }
    }
}

/// A freshly signed token
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    /// Seconds until expiry
    pub expires_in: u64,
}

/// Current Unix time in seconds
pub fn unix_now() -> Result<u64, JwtError> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs())
}

/// Issue a token for `username`, valid from now for `config.ttl_secs`
///
/// # Example
///
/// ```no_run
/// use flix_api::auth::jwt::{issue_token, JwtConfig};
///
/// let config = JwtConfig::default();
/// let issued = issue_token(&config, "alice01").expect("Failed to issue token");
/// println!("Bearer {}", issued.token);
/// ```
pub fn issue_token(config: &JwtConfig, username: &str) -> Result<IssuedToken, JwtError> {
    issue_token_at(config, username, unix_now()?)
}

/// Issue a token as if the current time were `now`
pub fn issue_token_at(
    config: &JwtConfig,
    username: &str,
    now: u64,
) -> Result<IssuedToken, JwtError> {
    let exp = now
        .checked_add(config.ttl_secs)
        .ok_or(JwtError::TtlOverflow(config.ttl_secs))?;

    let claims = Claims {
        iss: config.issuer.clone(),
        sub: username.to_string(),
        iat: now,
        exp,
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )?;

    Ok(IssuedToken {
        token,
        expires_in: config.ttl_secs,
    })
}

/// Verify a token and extract its claims
///
/// The signature is checked before the expiry, so a tampered token is
/// reported as invalid even when it is also expired. No clock leeway is
/// granted.
pub fn verify_token(config: &JwtConfig, token: &str) -> Result<Claims, JwtError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[&config.issuer]);
    validation.set_required_spec_claims(&["exp", "iss", "sub"]);
    validation.leeway = 0;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::ExpiredToken,
        jsonwebtoken::errors::ErrorKind::InvalidSignature => JwtError::InvalidSignature,
        _ => JwtError::InvalidToken,
    })?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret".to_string(),
            ttl_secs: 3600,
            issuer: "flix-api".to_string(),
        }
    }

    #[test]
    fn test_issue_and_verify_token() {
        let config = config();
        let issued = issue_token(&config, "alice01").expect("Failed to issue token");
        assert_eq!(issued.expires_in, 3600);

        let claims = verify_token(&config, &issued.token).expect("Failed to verify token");
        assert_eq!(claims.sub, "alice01");
        assert_eq!(claims.iss, "flix-api");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_invalid_token() {
        let result = verify_token(&config(), "invalid.token.here");
        assert!(matches!(result, Err(JwtError::InvalidToken)));
    }

    #[test]
    fn test_wrong_secret() {
        let config1 = JwtConfig {
            secret: "secret1".to_string(),
            ..config()
        };
        let config2 = JwtConfig {
            secret: "secret2".to_string(),
            ..config()
        };

        let issued = issue_token(&config1, "alice01").unwrap();
        let result = verify_token(&config2, &issued.token);
        assert!(matches!(result, Err(JwtError::InvalidSignature)));
    }

    #[test]
    fn test_wrong_issuer() {
        let other = JwtConfig {
            issuer: "someone-else".to_string(),
            ..config()
        };
        let issued = issue_token(&other, "alice01").unwrap();

        let result = verify_token(&config(), &issued.token);
        assert!(matches!(result, Err(JwtError::InvalidToken)));
    }

    #[test]
    fn test_expired_token() {
        let config = config();
        let now = unix_now().unwrap();

        // Issued two hours ago with a one hour lifetime
        let issued = issue_token_at(&config, "alice01", now - 7200).unwrap();

        let result = verify_token(&config, &issued.token);
        assert!(matches!(result, Err(JwtError::ExpiredToken)));
    }

    #[test]
    fn test_expired_by_one_second() {
        let config = JwtConfig {
            ttl_secs: 10,
            ..config()
        };
        let now = unix_now().unwrap();
        let issued = issue_token_at(&config, "alice01", now - 11).unwrap();

        assert!(matches!(
            verify_token(&config, &issued.token),
            Err(JwtError::ExpiredToken)
        ));
    }

    #[test]
    fn test_expired_and_forged_reports_signature() {
        let config = config();
        let now = unix_now().unwrap();
        let forger = JwtConfig {
            secret: "forged".to_string(),
            ..config.clone()
        };
        let issued = issue_token_at(&forger, "alice01", now - 7200).unwrap();

        assert!(matches!(
            verify_token(&config, &issued.token),
            Err(JwtError::InvalidSignature)
        ));
    }

    #[test]
    fn test_oversized_ttl_is_an_error() {
        let config = JwtConfig {
            ttl_secs: u64::MAX,
            ..config()
        };

        let result = issue_token(&config, "alice01");
        assert!(matches!(result, Err(JwtError::TtlOverflow(u64::MAX))));
    }

    #[test]
    fn test_unsigned_token_rejected() {
        // {"alg":"none"} header with a valid-looking payload
        let config = config();
        let issued = issue_token(&config, "alice01").unwrap();
        let payload = issued.token.split('.').nth(1).unwrap();
        let forged = format!("eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0.{payload}.");

        assert!(verify_token(&config, &forged).is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_token_roundtrips_username(username in "[A-Za-z0-9]{5,24}") {
            let config = config();
            let issued = issue_token(&config, &username).unwrap();
            let claims = verify_token(&config, &issued.token).unwrap();
            prop_assert_eq!(claims.sub, username);
        }

        #[test]
        fn prop_any_flipped_byte_fails(index in any::<prop::sample::Index>()) {
            let config = config();
            let issued = issue_token(&config, "alice01").unwrap();

            let mut bytes = issued.token.into_bytes();
            let i = index.index(bytes.len());
            bytes[i] ^= 0x01;
            let tampered = String::from_utf8(bytes).unwrap();

            prop_assert!(verify_token(&config, &tampered).is_err());
        }
    }
}
