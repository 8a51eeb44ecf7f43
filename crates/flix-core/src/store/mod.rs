//! Storage traits for accounts and the movie catalog
//!
//! Handlers only talk to these traits. Two backends are provided:
//! [`MemoryStore`] for development and tests, and [`PgStore`] for PostgreSQL.

mod memory;
mod postgres;

pub use memory::{sample_catalog, MemoryStore};
pub use postgres::PgStore;

use crate::models::{Director, Genre, Movie, User, UserProfile};
use crate::Result;
use async_trait::async_trait;
use uuid::Uuid;

/// Account storage
///
/// Every mutating method is a single atomic operation on the backend.
/// In particular `insert_if_absent` and `update` never leave a window
/// between the duplicate-username check and the write.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Look up an account by its exact (case-sensitive) username
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Create an account unless the username exists.
    ///
    /// Fails with `FlixError::UsernameTaken` on a duplicate.
    async fn insert_if_absent(&self, profile: UserProfile) -> Result<User>;

    /// Overwrite the profile of `username`.
    ///
    /// Fails with `FlixError::NotFound` when the account is gone and with
    /// `FlixError::UsernameTaken` when renaming onto another account.
    async fn update(&self, username: &str, profile: UserProfile) -> Result<User>;

    /// Remove an account. Fails with `FlixError::NotFound` if absent.
    async fn delete(&self, username: &str) -> Result<()>;

    /// Add a movie to the favorites list. Adding twice is a no-op.
    async fn add_favorite(&self, username: &str, movie_id: Uuid) -> Result<User>;

    /// Remove a movie from the favorites list. Removing an absent id is a no-op.
    async fn remove_favorite(&self, username: &str, movie_id: Uuid) -> Result<User>;

    /// Cheap liveness probe of the backend
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

/// Read access to the movie catalog
#[async_trait]
pub trait MovieStore: Send + Sync {
    async fn list_movies(&self) -> Result<Vec<Movie>>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Movie>>;

    async fn find_by_title(&self, title: &str) -> Result<Option<Movie>>;

    /// Genre of the first movie tagged with `name`
    async fn find_genre(&self, name: &str) -> Result<Option<Genre>>;

    /// Director of the first movie directed by `name`
    async fn find_director(&self, name: &str) -> Result<Option<Director>>;
}
