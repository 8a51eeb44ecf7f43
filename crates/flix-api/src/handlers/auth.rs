//! Login handler

use crate::audit::{audit_log, extract_ip_address, extract_user_agent, AuditEvent};
use crate::auth::{AuthService, LoginResponse};
use crate::error::AppError;
use crate::state::AppState;
use crate::validation::LoginPayload;
use axum::{extract::State, http::HeaderMap, Json};
use std::sync::Arc;

/// Exchange credentials for a signed token
///
/// # Responses
///
/// * `200 OK` - `{ user, token, expires_in }`
/// * `401 Unauthorized` - Unknown user, wrong password or empty fields
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<LoginResponse>, AppError> {
    let username = payload.username.clone();
    let ip_address = extract_ip_address(&headers);
    let user_agent = extract_user_agent(&headers);

    match AuthService::new(&state).login(payload).await {
        Ok(response) => {
            audit_log(&AuditEvent::LoginSuccess {
                username,
                ip_address,
                user_agent,
            });
            Ok(Json(response))
        }
        Err(e) => {
            if let AppError::Unauthorized(reason) = &e {
                audit_log(&AuditEvent::LoginFailure {
                    username,
                    reason: reason.clone(),
                    ip_address,
                    user_agent,
                });
            }
            Err(e)
        }
    }
}
