use crate::{AppState, handlers::auth};
use axum::{
    Router,
    routing::{get, post, put},
};

/// Auth Router Module
///
/// Mixed access: registration, login and the store probe are public; `/` and
/// `/profile` require a token; `/users`, `/make-admin` and `/remove-admin` sit behind
/// the admin gate.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        // GET /api/auth
        // The caller's own account.
        .route("/", get(auth::get_me))
        // GET /api/auth/test
        // Store connectivity probe with the account count.
        .route("/test", get(auth::store_probe))
        // GET /api/auth/users
        .route("/users", get(auth::list_users))
        // POST /api/auth/register
        // Role is decided server-side (allow-list, then first account).
        .route("/register", post(auth::register))
        // POST /api/auth/login
        .route("/login", post(auth::login))
        // POST /api/auth/make-admin
        .route("/make-admin", post(auth::make_admin))
        // POST /api/auth/remove-admin
        // Self-demotion is refused.
        .route("/remove-admin", post(auth::remove_admin))
        // PUT /api/auth/profile
        .route("/profile", put(auth::update_profile))
}
