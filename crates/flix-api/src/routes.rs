//! API route definitions
//!
//! Layer order matters: with `route_layer`, the layer added last runs
//! first, so `auth_middleware` wraps `require_owner` on the user routes.

use crate::auth::middleware::{auth_middleware, require_owner};
use crate::handlers::{auth, health, movies, users};
use crate::state::AppState;
use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

/// Build the full application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = build_cors_layer(&state.config.server.cors_origins);

    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .merge(api_routes(state.clone()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Public, token-gated and owner-gated routes
pub fn api_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/login", post(auth::login_handler))
        .route("/users", post(users::register_handler));

    // Catalog reads: any authenticated user
    let movie_routes = Router::new()
        .route("/movies", get(movies::list_movies))
        .route("/movies/:Title", get(movies::get_movie))
        .route("/movies/genres/:Name", get(movies::get_genre))
        .route("/movies/directors/:Name", get(movies::get_director))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Account routes: authenticated and acting on one's own username
    let user_routes = Router::new()
        .route(
            "/users/:Username",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route(
            "/users/:Username/movies/:MovieID",
            post(users::add_favorite).delete(users::remove_favorite),
        )
        .route_layer(middleware::from_fn(require_owner))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(movie_routes)
        .merge(user_routes)
}

/// Any origin when none are configured, otherwise an explicit allow-list
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT]);

    if origins.is_empty() {
        return base.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    base.allow_origin(AllowOrigin::list(allowed))
}
