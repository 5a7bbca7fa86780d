use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints that need no credential. Nothing served here may include an admin token,
/// except the creation response handed to the bundle's creator.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /api
        // Liveness check for monitoring and load balancers.
        .route("/api", get(handlers::health))
        // POST /api/bundle
        // Creates a bundle (and optional initial links) and returns its admin token once.
        .route("/api/bundle", post(handlers::create_bundle))
        // GET /api/bundle/{slug}
        // Public, read-only view of a bundle and its links.
        .route("/api/bundle/{slug}", get(handlers::get_bundle))
}
