use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post, put},
};

/// Admin Router Module
///
/// Mutations and the admin read of a single bundle. The caller proves ownership with the
/// bundle's admin token; `create_router` wraps this router in
/// `auth::require_admin_token`, which resolves the `{slug}` segment before any handler runs.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /api/bundle/{slug}/admin
        // Full bundle for the administrator (token still omitted).
        .route("/api/bundle/{slug}/admin", get(handlers::get_admin_bundle))
        // PUT/DELETE /api/bundle/{slug}
        // Title edit, and terminal deletion cascading to all links.
        .route(
            "/api/bundle/{slug}",
            put(handlers::update_bundle).delete(handlers::delete_bundle),
        )
        // POST /api/bundle/{slug}/links
        .route("/api/bundle/{slug}/links", post(handlers::add_link))
        // PUT/DELETE /api/bundle/{slug}/links/{link_id}
        // Both re-check that the link belongs to the authorized bundle.
        .route(
            "/api/bundle/{slug}/links/{link_id}",
            put(handlers::update_link).delete(handlers::delete_link),
        )
}
