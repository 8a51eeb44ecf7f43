//! Flix Core - Domain models, traits, and shared types
//!
//! This crate defines the core abstractions used throughout flix:
//! - Catalog models (movies, genres, directors)
//! - User accounts and favorite lists
//! - Common error types
//! - Store traits for users and movies, with in-memory and PostgreSQL backends
//! - Configuration management

pub mod config;
pub mod models;
pub mod store;

pub use config::{AppConfig, AuthConfig, ConfigError, DatabaseConfig, LoggingConfig, ServerConfig};
pub use models::{Director, Genre, Movie, User, UserProfile};
pub use store::{MemoryStore, MovieStore, PgStore, UserStore};

use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for flix operations
#[derive(Error, Debug)]
pub enum FlixError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Username {0} already taken.")]
    UsernameTaken(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, FlixError>;

impl From<sqlx::Error> for FlixError {
    fn from(err: sqlx::Error) -> Self {
        FlixError::DatabaseError(err.to_string())
    }
}
