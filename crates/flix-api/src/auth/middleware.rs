//! Request gate and ownership check
//!
//! Protected requests pass through two stages, each either handing the
//! request on or ending it with an [`AuthError`]:
//!
//! 1. [`auth_middleware`]: bearer token -> signature -> expiry -> [`Identity`]
//! 2. [`require_owner`]: `Identity` must equal the `:Username` path segment
use super::jwt::{verify_token, Claims, JwtConfig, JwtError};
use crate::audit::{audit_log, extract_ip_address, extract_user_agent, AuditEvent};
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Path, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Path parameter naming the account a `/users/...` route acts on
pub const USERNAME_PARAM: &str = "Username";

/// Body of every 403 response
pub const NOT_AUTHORIZED: &str = "Not authorized.";

/// Identity resolved from a verified token
///
/// Added to request extensions by [`auth_middleware`] and extracted in
/// handlers with `Extension<Identity>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub username: String,
    pub issued_at: u64,
    pub expires_at: u64,
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Self {
            username: claims.sub,
            issued_at: claims.iat,
            expires_at: claims.exp,
        }
    }
}

/// Authentication and authorization failures
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no credentials")]
    MissingCredentials,

    #[error("invalid token")]
    InvalidToken,

    #[error("token expired")]
    TokenExpired,

    #[error("{username} may not act on {target}")]
    NotOwner { username: String, target: String },
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::ExpiredToken => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        }
    }
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::NotOwner { .. } => StatusCode::FORBIDDEN,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::FORBIDDEN {
            return (status, Json(NOT_AUTHORIZED)).into_response();
        }

        let body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });

        (status, Json(body)).into_response()
    }
}

/// Pull the token out of `Authorization: Bearer <token>`
pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingCredentials)?
        .to_str()
        .map_err(|_| AuthError::MissingCredentials)?;

    let token = value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .ok_or(AuthError::MissingCredentials)?;

    if token.is_empty() {
        return Err(AuthError::MissingCredentials);
    }
    Ok(token)
}

/// Run the full gate over request headers
pub fn authenticate(headers: &HeaderMap, config: &JwtConfig) -> Result<Identity, AuthError> {
    let token = extract_bearer(headers)?;
    let claims = verify_token(config, token)?;
    Ok(Identity::from(claims))
}

/// Ownership check: an identity may only act on its own account
pub fn authorize(identity: &Identity, target_username: &str) -> Result<(), AuthError> {
    if identity.username == target_username {
        Ok(())
    } else {
        Err(AuthError::NotOwner {
            username: identity.username.clone(),
            target: target_username.to_string(),
        })
    }
}

/// Authentication middleware that requires a valid bearer token
///
/// # Usage
///
/// ```ignore
/// use axum::{middleware, routing::get, Router};
/// use flix_api::auth::middleware::auth_middleware;
///
/// let app = Router::new()
///     .route("/movies", get(list_movies))
///     .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));
/// ```
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let identity = match authenticate(request.headers(), &state.jwt) {
        Ok(identity) => identity,
        Err(e) => {
            audit_log(&AuditEvent::InvalidToken {
                ip_address: extract_ip_address(request.headers()),
                user_agent: extract_user_agent(request.headers()),
                path: request.uri().path().to_string(),
                reason: e.to_string(),
            });
            return Err(e);
        }
    };

    tracing::debug!(username = %identity.username, "request authenticated");
    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}

/// Ownership middleware for `/users/:Username...` routes
///
/// Must be layered inside [`auth_middleware`].
pub async fn require_owner(
    Path(params): Path<HashMap<String, String>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let identity = request
        .extensions()
        .get::<Identity>()
        .ok_or(AuthError::MissingCredentials)?;

    let target = params
        .get(USERNAME_PARAM)
        .map(String::as_str)
        .unwrap_or_default();

    if let Err(e) = authorize(identity, target) {
        audit_log(&AuditEvent::AccessDenied {
            username: identity.username.clone(),
            resource: request.uri().path().to_string(),
            ip_address: extract_ip_address(request.headers()),
            user_agent: extract_user_agent(request.headers()),
        });
        return Err(e);
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{issue_token, issue_token_at, unix_now};
    use axum::http::HeaderValue;
    use proptest::prelude::*;

    fn identity(username: &str) -> Identity {
        Identity {
            username: username.to_string(),
            issued_at: 1000,
            expires_at: 2000,
        }
    }

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_identity_from_claims() {
        let claims = Claims {
            iss: "flix-api".to_string(),
            sub: "alice01".to_string(),
            iat: 1000,
            exp: 2000,
        };

        assert_eq!(Identity::from(claims), identity("alice01"));
    }

    #[test]
    fn test_missing_header() {
        let result = authenticate(&HeaderMap::new(), &JwtConfig::default());
        assert!(matches!(result, Err(AuthError::MissingCredentials)));
    }

    #[test]
    fn test_wrong_scheme() {
        for value in ["Basic YWxpY2U6cGFzcw==", "bearer abc", "Bearer ", "Token abc"] {
            let headers = headers_with(value);
            let result = extract_bearer(&headers);
            assert!(
                matches!(result, Err(AuthError::MissingCredentials)),
                "header: {value}"
            );
        }
    }

    #[test]
    fn test_gate_states() {
        let config = JwtConfig::default();

        let issued = issue_token(&config, "alice01").unwrap();
        let identity = authenticate(&headers_with(&format!("Bearer {}", issued.token)), &config)
            .expect("valid token");
        assert_eq!(identity.username, "alice01");

        let garbage = authenticate(&headers_with("Bearer not-a-jwt"), &config);
        assert!(matches!(garbage, Err(AuthError::InvalidToken)));

        let stale = issue_token_at(&config, "alice01", unix_now().unwrap() - 2 * config.ttl_secs)
            .unwrap();
        let expired = authenticate(&headers_with(&format!("Bearer {}", stale.token)), &config);
        assert!(matches!(expired, Err(AuthError::TokenExpired)));
    }

    #[test]
    fn test_error_statuses() {
        assert_eq!(AuthError::MissingCredentials.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::InvalidToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::TokenExpired.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            authorize(&identity("alice01"), "bob02").unwrap_err().status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_authorize_is_case_sensitive() {
        assert!(authorize(&identity("alice01"), "alice01").is_ok());
        assert!(authorize(&identity("alice01"), "Alice01").is_err());
        assert!(authorize(&identity("alice01"), "").is_err());
    }

    proptest! {
        #[test]
        fn prop_authorize_allows_only_self(a in "[A-Za-z0-9]{5,16}", b in "[A-Za-z0-9]{5,16}") {
            prop_assert!(authorize(&identity(&a), &a).is_ok());
            if a != b {
                prop_assert!(authorize(&identity(&a), &b).is_err());
            }
        }
    }
}
