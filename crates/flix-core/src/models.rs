//! Catalog and account models
//!
//! JSON field names follow the public API (`Title`, `Username`, ...), which
//! predates this crate and is relied upon by existing clients.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Movie genre
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Genre {
    pub name: String,
    pub description: String,
}

/// Movie director
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Director {
    pub name: String,
    pub bio: String,
    /// Birth year
    pub birth: Option<i32>,
    /// Death year, absent while alive
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub death: Option<i32>,
}

/// A catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Movie {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub genre: Genre,
    pub director: Director,
    #[serde(default)]
    pub actors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    #[serde(default)]
    pub featured: bool,
}

impl Movie {
    /// Create a movie with a fresh id and no actors or image
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        genre: Genre,
        director: Director,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: description.into(),
            genre,
            director,
            actors: Vec::new(),
            image_path: None,
            featured: false,
        }
    }
}

/// Registered user account
///
/// The password digest is never serialized, so a `User` can be returned
/// from handlers as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Uuid,

    pub username: String,

    /// Argon2id PHC string
    #[serde(skip_serializing)]
    pub password_hash: String,

    pub email: String,

    pub birthday: NaiveDate,

    /// Ids of favorite movies, without duplicates, in insertion order
    pub favorite_movies: Vec<Uuid>,
}

impl User {
    /// Build a new account from a validated profile
    pub fn from_profile(profile: UserProfile) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: profile.username,
            password_hash: profile.password_hash,
            email: profile.email,
            birthday: profile.birthday,
            favorite_movies: Vec::new(),
        }
    }

    /// Replace the mutable account fields, keeping id and favorites
    pub fn apply(&mut self, profile: UserProfile) {
        self.username = profile.username;
        self.password_hash = profile.password_hash;
        self.email = profile.email;
        self.birthday = profile.birthday;
    }

    pub fn has_favorite(&self, movie_id: Uuid) -> bool {
        self.favorite_movies.contains(&movie_id)
    }
}

/// Account fields written on registration and profile update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub username: String,
    pub password_hash: String,
    pub email: String,
    pub birthday: NaiveDate,
}
