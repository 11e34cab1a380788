use crate::{AppState, handlers::events};
use axum::{Router, routing::get};

/// Event Router Module
///
/// Same access shape as actualites: public reads, admin-gated writes.
pub fn event_routes() -> Router<AppState> {
    Router::new()
        // GET/POST /api/events
        .route("/", get(events::list_events).post(events::create_event))
        // GET /api/events/upcoming
        // Evaluated against the clock at request time.
        .route("/upcoming", get(events::upcoming_events))
        // GET /api/events/category/{category}
        .route("/category/{category}", get(events::events_by_category))
        // GET/PUT/DELETE /api/events/{id}
        .route(
            "/{id}",
            get(events::get_event)
                .put(events::update_event)
                .delete(events::delete_event),
        )
}
