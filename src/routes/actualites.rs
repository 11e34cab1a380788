use crate::{AppState, handlers::actualites};
use axum::{Router, routing::get};

/// Actualite Router Module
///
/// Reads are public. POST, PUT and DELETE handlers take `AdminUser`, so the admin gate
/// runs before any of them touches the store.
pub fn actualite_routes() -> Router<AppState> {
    Router::new()
        // GET/POST /api/actualites
        .route(
            "/",
            get(actualites::list_actualites).post(actualites::create_actualite),
        )
        // GET /api/actualites/latest
        // Static segments win over `{id}`, so this never reaches get_actualite.
        .route("/latest", get(actualites::latest_actualites))
        // GET /api/actualites/category/{category}
        .route(
            "/category/{category}",
            get(actualites::actualites_by_category),
        )
        // GET/PUT/DELETE /api/actualites/{id}
        .route(
            "/{id}",
            get(actualites::get_actualite)
                .put(actualites::update_actualite)
                .delete(actualites::delete_actualite),
        )
}
