//! In-memory store
//!
//! Backs development runs without a database and every API test. Each
//! mutation holds the write lock for its whole check-and-write.

use super::{MovieStore, UserStore};
use crate::models::{Director, Genre, Movie, User, UserProfile};
use crate::{FlixError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Users keyed by username plus an ordered movie list
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<String, User>>,
    movies: RwLock<Vec<Movie>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store preloaded with a catalog
    pub fn with_movies(movies: Vec<Movie>) -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            movies: RwLock::new(movies),
        }
    }

    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }
}

fn user_not_found(username: &str) -> FlixError {
    FlixError::NotFound(format!("User {username}"))
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self.users.read().await.get(username).cloned())
    }

    async fn insert_if_absent(&self, profile: UserProfile) -> Result<User> {
        let mut users = self.users.write().await;
        if users.contains_key(&profile.username) {
            return Err(FlixError::UsernameTaken(profile.username));
        }

        let user = User::from_profile(profile);
        users.insert(user.username.clone(), user.clone());
        Ok(user)
    }

    async fn update(&self, username: &str, profile: UserProfile) -> Result<User> {
        let mut users = self.users.write().await;
        if !users.contains_key(username) {
            return Err(user_not_found(username));
        }
        if profile.username != username && users.contains_key(&profile.username) {
            return Err(FlixError::UsernameTaken(profile.username));
        }

        let mut user = users.remove(username).ok_or_else(|| user_not_found(username))?;
        user.apply(profile);
        users.insert(user.username.clone(), user.clone());
        Ok(user)
    }

    async fn delete(&self, username: &str) -> Result<()> {
        self.users
            .write()
            .await
            .remove(username)
            .map(|_| ())
            .ok_or_else(|| user_not_found(username))
    }

    async fn add_favorite(&self, username: &str, movie_id: Uuid) -> Result<User> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(username)
            .ok_or_else(|| user_not_found(username))?;
        if !user.has_favorite(movie_id) {
            user.favorite_movies.push(movie_id);
        }
        Ok(user.clone())
    }

    async fn remove_favorite(&self, username: &str, movie_id: Uuid) -> Result<User> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(username)
            .ok_or_else(|| user_not_found(username))?;
        user.favorite_movies.retain(|id| *id != movie_id);
        Ok(user.clone())
    }
}

#[async_trait]
impl MovieStore for MemoryStore {
    async fn list_movies(&self) -> Result<Vec<Movie>> {
        Ok(self.movies.read().await.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Movie>> {
        Ok(self.movies.read().await.iter().find(|m| m.id == id).cloned())
    }

    async fn find_by_title(&self, title: &str) -> Result<Option<Movie>> {
        Ok(self
            .movies
            .read()
            .await
            .iter()
            .find(|m| m.title == title)
            .cloned())
    }

    async fn find_genre(&self, name: &str) -> Result<Option<Genre>> {
        Ok(self
            .movies
            .read()
            .await
            .iter()
            .find(|m| m.genre.name == name)
            .map(|m| m.genre.clone()))
    }

    async fn find_director(&self, name: &str) -> Result<Option<Director>> {
        Ok(self
            .movies
            .read()
            .await
            .iter()
            .find(|m| m.director.name == name)
            .map(|m| m.director.clone()))
    }
}

/// Small starter catalog used when no database is configured
pub fn sample_catalog() -> Vec<Movie> {
    let drama = Genre {
        name: "Drama".to_string(),
        description: "Character-driven stories with serious, realistic themes.".to_string(),
    };
    let science_fiction = Genre {
        name: "Science Fiction".to_string(),
        description: "Speculative stories built around science and technology.".to_string(),
    };

    let mut shawshank = Movie::new(
        "The Shawshank Redemption",
        "Two imprisoned men bond over a number of years, finding solace and eventual redemption through acts of common decency.",
        drama.clone(),
        Director {
            name: "Frank Darabont".to_string(),
            bio: "French-born American film director, screenwriter and producer.".to_string(),
            birth: Some(1959),
            death: None,
        },
    );
    shawshank.actors = vec!["Tim Robbins".to_string(), "Morgan Freeman".to_string()];
    shawshank.featured = true;

    let mut godfather = Movie::new(
        "The Godfather",
        "The aging patriarch of an organized crime dynasty transfers control of his empire to his reluctant son.",
        drama,
        Director {
            name: "Francis Ford Coppola".to_string(),
            bio: "American film director, producer and screenwriter.".to_string(),
            birth: Some(1939),
            death: None,
        },
    );
    godfather.actors = vec!["Marlon Brando".to_string(), "Al Pacino".to_string()];

    let mut blade_runner = Movie::new(
        "Blade Runner",
        "A blade runner must pursue and terminate four replicants who have returned to Earth.",
        science_fiction,
        Director {
            name: "Ridley Scott".to_string(),
            bio: "English film director and producer.".to_string(),
            birth: Some(1937),
            death: None,
        },
    );
    blade_runner.actors = vec!["Harrison Ford".to_string(), "Rutger Hauer".to_string()];

    vec![shawshank, godfather, blade_runner]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn profile(username: &str) -> UserProfile {
        UserProfile {
            username: username.to_string(),
            password_hash: "digest".to_string(),
            email: format!("{username}@example.com"),
            birthday: NaiveDate::from_ymd_opt(1991, 1, 1).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_insert_if_absent_rejects_duplicate() {
        let store = MemoryStore::new();
        store.insert_if_absent(profile("alice01")).await.unwrap();

        let result = store.insert_if_absent(profile("alice01")).await;
        assert!(matches!(result, Err(FlixError::UsernameTaken(u)) if u == "alice01"));
        assert_eq!(store.user_count().await, 1);
    }

    #[tokio::test]
    async fn test_usernames_are_case_sensitive() {
        let store = MemoryStore::new();
        store.insert_if_absent(profile("alice01")).await.unwrap();
        store.insert_if_absent(profile("Alice01")).await.unwrap();

        assert_eq!(store.user_count().await, 2);
        assert!(store.find_by_username("ALICE01").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_registration_single_winner() {
        let store = std::sync::Arc::new(MemoryStore::new());
        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.insert_if_absent(profile("racer01")).await.is_ok()
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn test_update_rename_and_conflicts() {
        let store = MemoryStore::new();
        store.insert_if_absent(profile("alice01")).await.unwrap();
        store.insert_if_absent(profile("bob02")).await.unwrap();

        // same username is not a conflict
        let same = store.update("alice01", profile("alice01")).await.unwrap();
        assert_eq!(same.username, "alice01");

        let taken = store.update("alice01", profile("bob02")).await;
        assert!(matches!(taken, Err(FlixError::UsernameTaken(_))));

        let renamed = store.update("alice01", profile("alice99")).await.unwrap();
        assert_eq!(renamed.username, "alice99");
        assert!(store.find_by_username("alice01").await.unwrap().is_none());
        assert!(store.find_by_username("alice99").await.unwrap().is_some());

        let missing = store.update("ghost1", profile("ghost2")).await;
        assert!(matches!(missing, Err(FlixError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_favorites_are_a_set() {
        let store = MemoryStore::new();
        store.insert_if_absent(profile("alice01")).await.unwrap();
        let movie = Uuid::new_v4();

        store.add_favorite("alice01", movie).await.unwrap();
        let user = store.add_favorite("alice01", movie).await.unwrap();
        assert_eq!(user.favorite_movies, vec![movie]);

        let user = store.remove_favorite("alice01", movie).await.unwrap();
        assert!(user.favorite_movies.is_empty());

        let missing = store.add_favorite("nobody1", movie).await;
        assert!(matches!(missing, Err(FlixError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MemoryStore::new();
        store.insert_if_absent(profile("alice01")).await.unwrap();

        store.delete("alice01").await.unwrap();
        assert!(store.find_by_username("alice01").await.unwrap().is_none());
        assert!(matches!(
            store.delete("alice01").await,
            Err(FlixError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_catalog_lookups() {
        let store = MemoryStore::with_movies(sample_catalog());

        assert_eq!(store.list_movies().await.unwrap().len(), 3);

        let movie = store.find_by_title("Blade Runner").await.unwrap().unwrap();
        assert_eq!(movie.director.name, "Ridley Scott");
        assert_eq!(store.find_by_id(movie.id).await.unwrap(), Some(movie));

        let genre = store.find_genre("Drama").await.unwrap().unwrap();
        assert_eq!(genre.name, "Drama");

        let director = store.find_director("Frank Darabont").await.unwrap().unwrap();
        assert_eq!(director.birth, Some(1959));

        assert!(store.find_by_title("blade runner").await.unwrap().is_none());
        assert!(store.find_genre("Western").await.unwrap().is_none());
        assert!(store.find_director("Nobody").await.unwrap().is_none());
    }
}
