//! Flix API - REST server for the movie catalog
//!
//! Provides registration and login, token-gated catalog reads, and
//! owner-only account and favorites management.

pub mod audit;
pub mod auth;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod validation;

pub use routes::create_router;

#[cfg(any(test, feature = "test-utils"))]
use std::sync::Arc;

/// Router over an in-memory store with the sample catalog and cheap hashing
#[cfg(any(test, feature = "test-utils"))]
pub fn create_router_for_testing() -> axum::Router {
    create_router(Arc::new(test_state()))
}

/// State behind [`create_router_for_testing`], for tests that need the
/// signing config or direct store access
#[cfg(any(test, feature = "test-utils"))]
pub fn test_state() -> state::AppState {
    let mut config = flix_core::AppConfig::default();
    config.auth.jwt_secret = "flix-test-secret".to_string();

    state::AppState::in_memory(
        config,
        flix_core::MemoryStore::with_movies(flix_core::store::sample_catalog()),
    )
    .with_password_config(auth::PasswordConfig::insecure_fast())
}
