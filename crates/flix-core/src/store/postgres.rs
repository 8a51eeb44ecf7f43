//! PostgreSQL store
//!
//! Expects two tables:
//! - `users (id UUID PK, username TEXT UNIQUE, password_hash TEXT, email TEXT,
//!   birthday DATE, favorite_movies UUID[] NOT NULL DEFAULT '{}')`
//! - `movies (id UUID PK, title TEXT, description TEXT, genre_name TEXT,
//!   genre_description TEXT, director_name TEXT, director_bio TEXT,
//!   director_birth INT, director_death INT, actors TEXT[], image_path TEXT,
//!   featured BOOL)`

use super::{MovieStore, UserStore};
use crate::models::{Director, Genre, Movie, User, UserProfile};
use crate::{FlixError, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, username, password_hash, email, birthday, favorite_movies";

const MOVIE_COLUMNS: &str = "id, title, description, genre_name, genre_description, \
     director_name, director_bio, director_birth, director_death, actors, image_path, featured";

/// PostgreSQL-backed user and movie store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a new store connection
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| FlixError::DatabaseError(format!("PostgreSQL connection failed: {e}")))?;

        Ok(Self { pool })
    }
}

/// User row from database
#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    password_hash: String,
    email: String,
    birthday: NaiveDate,
    favorite_movies: Vec<Uuid>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            password_hash: row.password_hash,
            email: row.email,
            birthday: row.birthday,
            favorite_movies: row.favorite_movies,
        }
    }
}

/// Movie row from database
#[derive(Debug, FromRow)]
struct MovieRow {
    id: Uuid,
    title: String,
    description: String,
    genre_name: String,
    genre_description: String,
    director_name: String,
    director_bio: String,
    director_birth: Option<i32>,
    director_death: Option<i32>,
    actors: Vec<String>,
    image_path: Option<String>,
    featured: bool,
}

impl From<MovieRow> for Movie {
    fn from(row: MovieRow) -> Self {
        Movie {
            id: row.id,
            title: row.title,
            description: row.description,
            genre: Genre {
                name: row.genre_name,
                description: row.genre_description,
            },
            director: Director {
                name: row.director_name,
                bio: row.director_bio,
                birth: row.director_birth,
                death: row.director_death,
            },
            actors: row.actors,
            image_path: row.image_path,
            featured: row.featured,
        }
    }
}

/// Map a write error, turning a unique violation on `username` into a conflict
fn write_error(err: sqlx::Error, username: &str, action: &str) -> FlixError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return FlixError::UsernameTaken(username.to_string());
        }
    }
    FlixError::DatabaseError(format!("Failed to {action}: {err}"))
}

fn user_not_found(username: &str) -> FlixError {
    FlixError::NotFound(format!("User {username}"))
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1"))
                .bind(username)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| FlixError::DatabaseError(format!("Failed to fetch user: {e}")))?;

        Ok(row.map(User::from))
    }

    async fn insert_if_absent(&self, profile: UserProfile) -> Result<User> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            r#"
            INSERT INTO users (id, username, password_hash, email, birthday, favorite_movies)
            VALUES ($1, $2, $3, $4, $5, '{{}}')
            ON CONFLICT (username) DO NOTHING
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&profile.username)
        .bind(&profile.password_hash)
        .bind(&profile.email)
        .bind(profile.birthday)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| write_error(e, &profile.username, "create user"))?;

        row.map(User::from)
            .ok_or(FlixError::UsernameTaken(profile.username))
    }

    async fn update(&self, username: &str, profile: UserProfile) -> Result<User> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            r#"
            UPDATE users SET
                username = $2,
                password_hash = $3,
                email = $4,
                birthday = $5
            WHERE username = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(username)
        .bind(&profile.username)
        .bind(&profile.password_hash)
        .bind(&profile.email)
        .bind(profile.birthday)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| write_error(e, &profile.username, "update user"))?;

        row.map(User::from).ok_or_else(|| user_not_found(username))
    }

    async fn delete(&self, username: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM users WHERE username = $1")
            .bind(username)
            .execute(&self.pool)
            .await
            .map_err(|e| FlixError::DatabaseError(format!("Failed to delete user: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(user_not_found(username));
        }
        Ok(())
    }

    async fn add_favorite(&self, username: &str, movie_id: Uuid) -> Result<User> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            r#"
            UPDATE users SET favorite_movies = CASE
                WHEN $2 = ANY(favorite_movies) THEN favorite_movies
                ELSE array_append(favorite_movies, $2)
            END
            WHERE username = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(username)
        .bind(movie_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| FlixError::DatabaseError(format!("Failed to add favorite: {e}")))?;

        row.map(User::from).ok_or_else(|| user_not_found(username))
    }

    async fn remove_favorite(&self, username: &str, movie_id: Uuid) -> Result<User> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            r#"
            UPDATE users SET favorite_movies = array_remove(favorite_movies, $2)
            WHERE username = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(username)
        .bind(movie_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| FlixError::DatabaseError(format!("Failed to remove favorite: {e}")))?;

        row.map(User::from).ok_or_else(|| user_not_found(username))
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| FlixError::DatabaseError(format!("Ping failed: {e}")))?;
        Ok(())
    }
}

#[async_trait]
impl MovieStore for PgStore {
    async fn list_movies(&self) -> Result<Vec<Movie>> {
        let rows: Vec<MovieRow> =
            sqlx::query_as(&format!("SELECT {MOVIE_COLUMNS} FROM movies ORDER BY title"))
                .fetch_all(&self.pool)
                .await
                .map_err(|e| FlixError::DatabaseError(format!("Failed to list movies: {e}")))?;

        Ok(rows.into_iter().map(Movie::from).collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Movie>> {
        let row: Option<MovieRow> =
            sqlx::query_as(&format!("SELECT {MOVIE_COLUMNS} FROM movies WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| FlixError::DatabaseError(format!("Failed to get movie: {e}")))?;

        Ok(row.map(Movie::from))
    }

    async fn find_by_title(&self, title: &str) -> Result<Option<Movie>> {
        let row: Option<MovieRow> = sqlx::query_as(&format!(
            "SELECT {MOVIE_COLUMNS} FROM movies WHERE title = $1 LIMIT 1"
        ))
        .bind(title)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| FlixError::DatabaseError(format!("Failed to get movie: {e}")))?;

        Ok(row.map(Movie::from))
    }

    async fn find_genre(&self, name: &str) -> Result<Option<Genre>> {
        let row: Option<(String, String)> = sqlx::query_as(
            "SELECT genre_name, genre_description FROM movies WHERE genre_name = $1 LIMIT 1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| FlixError::DatabaseError(format!("Failed to get genre: {e}")))?;

        Ok(row.map(|(name, description)| Genre { name, description }))
    }

    async fn find_director(&self, name: &str) -> Result<Option<Director>> {
        let row: Option<(String, String, Option<i32>, Option<i32>)> = sqlx::query_as(
            r#"
            SELECT director_name, director_bio, director_birth, director_death
            FROM movies
            WHERE director_name = $1
            LIMIT 1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| FlixError::DatabaseError(format!("Failed to get director: {e}")))?;

        Ok(row.map(|(name, bio, birth, death)| Director {
            name,
            bio,
            birth,
            death,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movie_row_conversion() {
        let id = Uuid::new_v4();
        let movie = Movie::from(MovieRow {
            id,
            title: "Alien".to_string(),
            description: "In space no one can hear you scream.".to_string(),
            genre_name: "Horror".to_string(),
            genre_description: "Scary.".to_string(),
            director_name: "Ridley Scott".to_string(),
            director_bio: "English director.".to_string(),
            director_birth: Some(1937),
            director_death: None,
            actors: vec!["Sigourney Weaver".to_string()],
            image_path: None,
            featured: true,
        });

        assert_eq!(movie.id, id);
        assert_eq!(movie.genre.name, "Horror");
        assert_eq!(movie.director.birth, Some(1937));
        assert!(movie.featured);
    }

    #[test]
    fn test_user_row_conversion() {
        let favorite = Uuid::new_v4();
        let user = User::from(UserRow {
            id: Uuid::new_v4(),
            username: "alice01".to_string(),
            password_hash: "digest".to_string(),
            email: "alice@example.com".to_string(),
            birthday: NaiveDate::from_ymd_opt(1990, 1, 2).unwrap(),
            favorite_movies: vec![favorite],
        });

        assert_eq!(user.username, "alice01");
        assert!(user.has_favorite(favorite));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn test_insert_if_absent_against_postgres() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL");
        let store = PgStore::connect(&url, 2).await.unwrap();
        let username = format!("pg{}", Uuid::new_v4().simple());
        let profile = UserProfile {
            username: username.clone(),
            password_hash: "digest".to_string(),
            email: "pg@example.com".to_string(),
            birthday: NaiveDate::from_ymd_opt(1990, 1, 2).unwrap(),
        };

        store.insert_if_absent(profile.clone()).await.unwrap();
        let duplicate = store.insert_if_absent(profile).await;
        assert!(matches!(duplicate, Err(FlixError::UsernameTaken(_))));

        store.delete(&username).await.unwrap();
    }
}
