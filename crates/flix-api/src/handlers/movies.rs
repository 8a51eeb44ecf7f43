//! Movie catalog handlers
//!
//! All routes here sit behind the request gate but need no ownership check.

use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use flix_core::{Director, Genre, Movie};
use std::sync::Arc;

/// List the whole catalog
pub async fn list_movies(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Movie>>, AppError> {
    let movies = state.movies.list_movies().await?;
    Ok(Json(movies))
}

/// Get one movie by exact title
pub async fn get_movie(
    State(state): State<Arc<AppState>>,
    Path(title): Path<String>,
) -> Result<Json<Movie>, AppError> {
    state
        .movies
        .find_by_title(&title)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Movie {title}")))
}

/// Get a genre by name
pub async fn get_genre(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<Genre>, AppError> {
    state
        .movies
        .find_genre(&name)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Genre {name}")))
}

/// Get a director by name
pub async fn get_director(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<Director>, AppError> {
    state
        .movies
        .find_director(&name)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Director {name}")))
}
