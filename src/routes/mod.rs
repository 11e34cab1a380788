//! Router Module Index
//!
//! One router per resource, all nested under `/api`. Access control is not a layer
//! here: each handler declares it through its extractors (`AuthUser` for the
//! authentication gate, `AdminUser` for the admin gate), so a public read and an
//! admin-only write can share a path.

/// `/api/auth`: session, registration, role management, profile.
pub mod auth;

/// `/api/actualites`: public reads, admin writes.
pub mod actualites;

/// `/api/events`: public reads, admin writes.
pub mod events;

use crate::AppState;
use axum::{Router, routing::get};

/// Assembles the API surface plus the liveness probe.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers; never touches the store.
        .route("/health", get(|| async { "ok" }))
        .nest(
            "/api",
            Router::new()
                .nest("/auth", auth::auth_routes())
                .nest("/actualites", actualites::actualite_routes())
                .nest("/events", events::event_routes()),
        )
}
