//! Authentication service layer
//!
//! Business logic for registration, login and profile updates. Hashing
//! is CPU-bound and runs on the blocking pool.

use super::jwt::issue_token;
use super::password::{hash_password, verify_password, PasswordConfig};
use crate::error::AppError;
use crate::state::AppState;
use crate::validation::{LoginPayload, UserPayload, ValidatedUser};
use flix_core::{User, UserProfile};
use serde::Serialize;

/// Reason reported for any rejected login
pub const INVALID_CREDENTIALS: &str = "invalid credentials";

/// Successful login response
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub user: User,
    pub token: String,
    pub expires_in: u64,
}

/// Authentication service
///
/// Borrowed from [`AppState`] for the duration of one request.
pub struct AuthService<'a> {
    state: &'a AppState,
}

impl<'a> AuthService<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// Validate, hash and store a new account
    ///
    /// # Returns
    ///
    /// * `Ok(User)` - Newly created user
    /// * `Err(AppError::Validation)` - One or more rules failed
    /// * `Err(AppError::UsernameTaken)` - The username exists
    pub async fn register(&self, payload: UserPayload) -> Result<User, AppError> {
        let validated = payload.into_validated().map_err(AppError::Validation)?;
        let profile = self.to_profile(validated).await?;

        let user = self.state.users.insert_if_absent(profile).await?;
        tracing::info!(username = %user.username, "user registered");
        Ok(user)
    }

    /// Check credentials and issue a token
    ///
    /// Unknown usernames and wrong passwords fail identically.
    pub async fn login(&self, payload: LoginPayload) -> Result<LoginResponse, AppError> {
        if payload.username.is_empty() || payload.password.is_empty() {
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        let user = self
            .state
            .users
            .find_by_username(&payload.username)
            .await?
            .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

        let digest = user.password_hash.clone();
        let password = payload.password;
        let matches = tokio::task::spawn_blocking(move || verify_password(&password, &digest))
            .await?
            .map_err(|e| AppError::Internal(e.to_string()))?;

        if !matches {
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        let issued = issue_token(&self.state.jwt, &user.username)
            .map_err(|e| AppError::Internal(format!("Failed to issue token: {e}")))?;

        Ok(LoginResponse {
            user,
            token: issued.token,
            expires_in: issued.expires_in,
        })
    }

    /// Overwrite the profile of `username`
    ///
    /// The new username may equal the current one; it conflicts only with
    /// a different existing account.
    pub async fn update_profile(
        &self,
        username: &str,
        payload: UserPayload,
    ) -> Result<User, AppError> {
        let validated = payload.into_validated().map_err(AppError::Validation)?;
        let profile = self.to_profile(validated).await?;

        let user = self.state.users.update(username, profile).await?;
        tracing::info!(username = %username, new_username = %user.username, "profile updated");
        Ok(user)
    }

    async fn to_profile(&self, validated: ValidatedUser) -> Result<UserProfile, AppError> {
        let password_hash = hash_blocking(validated.password, self.state.password.clone()).await?;

        Ok(UserProfile {
            username: validated.username,
            password_hash,
            email: validated.email,
            birthday: validated.birthday,
        })
    }
}

async fn hash_blocking(password: String, config: PasswordConfig) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || hash_password(&password, &config))
        .await?
        .map_err(|e| AppError::Internal(e.to_string()))
}
