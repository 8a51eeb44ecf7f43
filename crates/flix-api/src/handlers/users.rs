//! Account and favorites handlers
//!
//! Registration is public. Every other route here is mounted behind
//! `auth_middleware` and `require_owner`, so by the time a handler runs
//! the caller is known to own the `:Username` in the path.

use crate::audit::{audit_log, extract_ip_address, extract_user_agent, AuditEvent};
use crate::auth::AuthService;
use crate::error::AppError;
use crate::state::AppState;
use crate::validation::UserPayload;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use flix_core::User;
use std::sync::Arc;
use uuid::Uuid;

/// Register a new account
///
/// # Responses
///
/// * `201 Created` - The stored user, without the password digest
/// * `422 Unprocessable Entity` - Every violated field rule
/// * `400 Bad Request` - Username already taken
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<UserPayload>,
) -> Result<impl IntoResponse, AppError> {
    let username = payload.username.clone();
    let ip_address = extract_ip_address(&headers);
    let user_agent = extract_user_agent(&headers);

    match AuthService::new(&state).register(payload).await {
        Ok(user) => {
            audit_log(&AuditEvent::RegistrationSuccess {
                user_id: user.id,
                username: user.username.clone(),
                ip_address,
                user_agent,
            });
            Ok((StatusCode::CREATED, Json(user)))
        }
        Err(e) => {
            let reason = match &e {
                AppError::Validation(violations) => {
                    Some(format!("{} invalid field(s)", violations.len()))
                }
                AppError::UsernameTaken(_) => Some("username taken".to_string()),
                _ => None,
            };
            if let Some(reason) = reason {
                audit_log(&AuditEvent::RegistrationFailure {
                    username,
                    reason,
                    ip_address,
                    user_agent,
                });
            }
            Err(e)
        }
    }
}

/// Get the caller's own profile
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> Result<Json<User>, AppError> {
    state
        .users
        .find_by_username(&username)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("User {username}")))
}

/// Overwrite the caller's profile
///
/// A rename invalidates nothing server-side, but tokens carry the old
/// username, so the client must log in again to act on the new name.
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<UserPayload>,
) -> Result<Json<User>, AppError> {
    let user = AuthService::new(&state)
        .update_profile(&username, payload)
        .await?;

    audit_log(&AuditEvent::ProfileUpdated {
        username,
        new_username: user.username.clone(),
        ip_address: extract_ip_address(&headers),
    });

    Ok(Json(user))
}

/// Delete the caller's account
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    state.users.delete(&username).await?;

    audit_log(&AuditEvent::AccountDeleted {
        username: username.clone(),
        ip_address: extract_ip_address(&headers),
    });

    Ok((StatusCode::OK, format!("{username} was deleted.")))
}

/// Add a catalog movie to the caller's favorites
pub async fn add_favorite(
    State(state): State<Arc<AppState>>,
    Path((username, movie_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let movie_id = parse_movie_id(&movie_id)?;

    if state.movies.find_by_id(movie_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Movie {movie_id}")));
    }

    state.users.add_favorite(&username, movie_id).await?;
    tracing::debug!(username = %username, movie_id = %movie_id, "favorite added");

    Ok((
        StatusCode::CREATED,
        format!("Favorite movie successfully added to {username}"),
    ))
}

/// Remove a movie from the caller's favorites
pub async fn remove_favorite(
    State(state): State<Arc<AppState>>,
    Path((username, movie_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let movie_id = parse_movie_id(&movie_id)?;

    state.users.remove_favorite(&username, movie_id).await?;
    tracing::debug!(username = %username, movie_id = %movie_id, "favorite removed");

    Ok((
        StatusCode::OK,
        format!("Favorite movie successfully removed from {username}"),
    ))
}

/// Ids that are not UUIDs cannot name a catalog movie
fn parse_movie_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound(format!("Movie {raw}")))
}
