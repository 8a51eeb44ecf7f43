//! Application state management

use crate::auth::jwt::JwtConfig;
use crate::auth::password::PasswordConfig;
use flix_core::config::AppConfig;
use flix_core::{MemoryStore, MovieStore, UserStore};
use std::sync::Arc;
use std::time::Instant;

/// Application state shared across handlers
///
/// Everything except the stores is immutable after startup.
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Token signing settings, derived from `config.auth`
    pub jwt: JwtConfig,
    /// Argon2 cost parameters, derived from `config.auth`
    pub password: PasswordConfig,
    /// Account storage
    pub users: Arc<dyn UserStore>,
    /// Catalog storage
    pub movies: Arc<dyn MovieStore>,
    /// Server start time
    pub start_time: Instant,
}

impl AppState {
    /// Create state over the given stores
    pub fn new(
        config: AppConfig,
        users: Arc<dyn UserStore>,
        movies: Arc<dyn MovieStore>,
    ) -> Self {
        Self {
            jwt: JwtConfig::from(&config.auth),
            password: PasswordConfig::from(&config.auth),
            config,
            users,
            movies,
            start_time: Instant::now(),
        }
    }

    /// Create state backed by one in-memory store
    pub fn in_memory(config: AppConfig, store: MemoryStore) -> Self {
        let store = Arc::new(store);
        Self::new(config, store.clone(), store)
    }

    /// Replace the hashing parameters
    pub fn with_password_config(mut self, password: PasswordConfig) -> Self {
        self.password = password;
        self
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
