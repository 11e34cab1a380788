use axum::{Router, extract::FromRef, http::HeaderName};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Server side.
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod routes;

// Client side: typed API client, per-resource state containers, event countdown.
pub mod client;
pub mod countdown;

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::{ApiError, RepoError};
pub use repository::{InMemoryRepository, PostgresRepository, RepositoryState};

/// ApiDoc
///
/// Aggregates every `#[utoipa::path]` handler and every wire schema into the OpenAPI
/// document served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::get_me, handlers::auth::store_probe, handlers::auth::list_users,
        handlers::auth::register, handlers::auth::login, handlers::auth::make_admin,
        handlers::auth::remove_admin, handlers::auth::update_profile,
        handlers::actualites::list_actualites, handlers::actualites::latest_actualites,
        handlers::actualites::actualites_by_category, handlers::actualites::get_actualite,
        handlers::actualites::create_actualite, handlers::actualites::update_actualite,
        handlers::actualites::delete_actualite,
        handlers::events::list_events, handlers::events::upcoming_events,
        handlers::events::events_by_category, handlers::events::get_event,
        handlers::events::create_event, handlers::events::update_event,
        handlers::events::delete_event,
    ),
    components(
        schemas(
            models::Role, models::Category, models::PublicUser, models::UserSummary,
            models::AuthorRef, models::ActualiteView, models::EventView,
            models::TokenResponse, models::MessageResponse, models::RoleChangeResponse,
            models::StoreProbe, models::RegisterRequest, models::LoginRequest,
            models::RoleChangeRequest, models::ProfileUpdateRequest,
            models::ActualitePayload, models::EventPayload,
        )
    ),
    tags(
        (name = "campus-journal", description = "School news and events API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single, immutable container shared by every request: the store handle and the
/// loaded configuration. There is no other in-process shared state.
#[derive(Clone)]
pub struct AppState {
    /// Repository Layer: Postgres in production, in-memory in tests.
    pub repo: RepositoryState,
    /// Configuration: The loaded, immutable environment configuration.
    pub config: AppConfig,
}

impl AppState {
    pub fn new(repo: RepositoryState, config: AppConfig) -> Self {
        Self { repo, config }
    }
}

// --- Axum FromRef Extractor Implementations ---

// These let the `AuthUser` / `AdminUser` extractors pull just what they need.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the routing structure, applies the global layers and registers the state.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        // Documentation: Serve the auto-generated Swagger UI.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(routes::api_routes())
        .with_state(state);

    // 3. Observability and Correlation Layers
    base_router
        .layer(
            ServiceBuilder::new()
                // 3a. Request ID Generation: a UUID for every incoming request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 3b. Request Tracing: one span per request, tagged with the request ID.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. Request ID Propagation: echo x-request-id back to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS Layer
        .layer(cors)
}

/// trace_span_logger
///
/// Span factory for `TraceLayer`: method, URI and the `x-request-id` set above, so
/// every log line of one request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
